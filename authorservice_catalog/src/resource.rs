//! The transport seam every conditional flow goes through.
//!
//! [`ResourceApi`] is what the HTTP client implements and what the console
//! orchestration is written against, so the update and cascade logic can be
//! exercised without a server.

use serde_json::Value;

/// A resource representation together with the concurrency token it was
/// served with
#[derive(Debug, Clone)]
pub struct FetchedResource {
    pub body: Value,
    /// Normalized token, `None` when the server did not send one
    pub etag: Option<String>,
}

/// Raw result of a conditional write. Rejections (including token
/// mismatches) are data, not errors; only transport failures error.
#[derive(Debug, Clone)]
pub struct WriteOutcome {
    pub status: u16,
    pub body: String,
}

impl WriteOutcome {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait::async_trait]
pub trait ResourceApi {
    /// Full read of the resource at `path`. Errors on any non-success status.
    async fn fetch(&self, path: &str) -> anyhow::Result<FetchedResource>;

    /// Metadata-only read of the current token. Errors when the resource
    /// rejects the request; callers are expected to fall back to [`fetch`].
    ///
    /// [`fetch`]: ResourceApi::fetch
    async fn head_etag(&self, path: &str) -> anyhow::Result<Option<String>>;

    /// Conditional write of `body` to `path`. A `None` token means the
    /// wildcard "apply regardless of the current version".
    async fn conditional_put(
        &self,
        path: &str,
        body: &Value,
        etag: Option<&str>,
    ) -> anyhow::Result<WriteOutcome>;

    /// Conditional delete of the resource at `path`, same token semantics as
    /// [`conditional_put`].
    ///
    /// [`conditional_put`]: ResourceApi::conditional_put
    async fn conditional_delete(&self, path: &str, etag: Option<&str>)
        -> anyhow::Result<WriteOutcome>;

    /// POST `body` to the collection at `path`, returns the path of the
    /// created resource.
    async fn create(&self, path: &str, body: &Value) -> anyhow::Result<String>;

    /// Freshest obtainable token for `path`: metadata-only request first,
    /// full read when that is rejected, `None` when neither succeeds.
    async fn fetch_etag(&self, path: &str) -> Option<String> {
        match self.head_etag(path).await {
            Ok(etag) => etag,
            Err(err) => {
                tracing::debug!("HEAD {} rejected ({:#}), falling back to GET", path, err);
                match self.fetch(path).await {
                    Ok(fetched) => fetched.etag,
                    Err(err) => {
                        tracing::debug!("GET {} failed ({:#}), no token known", path, err);
                        None
                    }
                }
            }
        }
    }
}

/// Reads the resource at `path`, applies `transform` to an independent copy
/// of the representation and writes the copy back conditionally, using the
/// token captured by the read or the wildcard when there was none.
///
/// Exactly one read and one write. A failed read errors; a rejected write is
/// returned as a [`WriteOutcome`] for the caller to judge.
pub async fn update_resource_with<A, F>(
    api: &A,
    path: &str,
    transform: F,
) -> anyhow::Result<WriteOutcome>
where
    A: ResourceApi + ?Sized,
    F: FnOnce(&mut Value),
{
    let fetched = api.fetch(path).await?;
    let mut draft = fetched.body.clone();
    transform(&mut draft);
    api.conditional_put(path, &draft, fetched.etag.as_deref())
        .await
}
