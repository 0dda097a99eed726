use anyhow::{bail, Context};
use reqwest::header::{ETAG, IF_MATCH, LOCATION};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_tracing::TracingMiddleware;
use serde_json::Value;

use crate::api::{Author, AuthorDetails, AuthorId, BookId, PrizeId, AUTHORS_PATH};
use crate::etag::{normalize_etag, WILDCARD};
use crate::resource::{FetchedResource, ResourceApi, WriteOutcome};

pub struct AuthorServiceClient {
    url: String,
    client: ClientWithMiddleware,
}

impl AuthorServiceClient {
    pub fn new(url: &str) -> anyhow::Result<Self> {
        let reqwest_client = reqwest::Client::builder()
            .build()
            .context("Failed to build reqwest client")?;
        let client = ClientBuilder::new(reqwest_client)
            // Insert the tracing middleware
            .with(TracingMiddleware::default())
            .build();

        Ok(Self {
            url: url.to_string(),
            client,
        })
    }

    /// Calls GET /api/authors endpoint
    pub async fn list_authors(&self) -> anyhow::Result<Vec<Author>> {
        let response = self
            .client
            .get(format!("{}{}", self.url, AUTHORS_PATH))
            .send()
            .await?;
        if response.status().is_success() {
            Ok(response.json().await?)
        } else {
            let error: String = response.text().await.unwrap_or_default();
            bail!("Failed to list authors {}", error)
        }
    }

    /// Calls POST /api/authors endpoint
    /// Returns the id of the added author in response
    pub async fn add_author(&self, details: AuthorDetails) -> anyhow::Result<AuthorId> {
        let location = self
            .create(AUTHORS_PATH, &serde_json::to_value(details)?)
            .await?;
        location
            .strip_prefix("/api/authors/")
            .context("Invalid location header")?
            .parse()
            .context("Failed to parse author id")
    }

    /// Calls GET /api/authors/{author_id} endpoint
    /// Returns author details if the author was present
    /// None if the author was not in the catalog
    /// and error in case of any other failure
    pub async fn get_author(&self, author_id: AuthorId) -> anyhow::Result<Option<Author>> {
        let response = self
            .client
            .get(format!("{}/api/authors/{}", self.url, author_id))
            .send()
            .await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            Ok(None)
        } else if response.status().is_success() {
            Ok(Some(response.json().await?))
        } else {
            let error: String = response.text().await.unwrap_or_default();
            bail!("Failed to get author {}", error)
        }
    }

    /// Calls POST /api/books endpoint with a raw book document
    pub async fn add_book(&self, book: &Value) -> anyhow::Result<BookId> {
        let location = self.create("/api/books", book).await?;
        location
            .strip_prefix("/api/books/")
            .context("Invalid location header")?
            .parse()
            .context("Failed to parse book id")
    }

    /// Calls POST /api/prizes endpoint with a raw prize document
    pub async fn add_prize(&self, prize: &Value) -> anyhow::Result<PrizeId> {
        let location = self.create("/api/prizes", prize).await?;
        location
            .strip_prefix("/api/prizes/")
            .context("Invalid location header")?
            .parse()
            .context("Failed to parse prize id")
    }
}

#[async_trait::async_trait]
impl ResourceApi for AuthorServiceClient {
    async fn fetch(&self, path: &str) -> anyhow::Result<FetchedResource> {
        let response = self
            .client
            .get(format!("{}{}", self.url, path))
            .send()
            .await?;
        if !response.status().is_success() {
            let error: String = response.text().await.unwrap_or_default();
            bail!("Failed to fetch {} {}", path, error)
        }
        let etag = normalize_etag(
            response
                .headers()
                .get(ETAG)
                .and_then(|value| value.to_str().ok()),
        );
        let body = response.json().await?;
        Ok(FetchedResource { body, etag })
    }

    async fn head_etag(&self, path: &str) -> anyhow::Result<Option<String>> {
        let response = self
            .client
            .head(format!("{}{}", self.url, path))
            .send()
            .await?;
        if !response.status().is_success() {
            bail!("HEAD {} rejected with status {}", path, response.status())
        }
        Ok(normalize_etag(
            response
                .headers()
                .get(ETAG)
                .and_then(|value| value.to_str().ok()),
        ))
    }

    async fn conditional_put(
        &self,
        path: &str,
        body: &Value,
        etag: Option<&str>,
    ) -> anyhow::Result<WriteOutcome> {
        let response = self
            .client
            .put(format!("{}{}", self.url, path))
            .header(IF_MATCH, etag.unwrap_or(WILDCARD))
            .json(body)
            .send()
            .await?;
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Ok(WriteOutcome { status, body })
    }

    async fn conditional_delete(
        &self,
        path: &str,
        etag: Option<&str>,
    ) -> anyhow::Result<WriteOutcome> {
        let response = self
            .client
            .delete(format!("{}{}", self.url, path))
            .header(IF_MATCH, etag.unwrap_or(WILDCARD))
            .send()
            .await?;
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Ok(WriteOutcome { status, body })
    }

    async fn create(&self, path: &str, body: &Value) -> anyhow::Result<String> {
        let response = self
            .client
            .post(format!("{}{}", self.url, path))
            .json(body)
            .send()
            .await?;

        if !response.status().is_success() {
            let error: String = response.text().await.unwrap_or_default();
            bail!("Failed to create resource under {} {}", path, error)
        }

        let location_header = response
            .headers()
            .get(LOCATION)
            .context("No location header")?;

        Ok(location_header
            .to_str()
            .context("Failed to convert header to str")?
            .to_string())
    }
}
