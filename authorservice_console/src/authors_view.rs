//! Headless state of the authors screen.
//!
//! [`AuthorsView`] owns exactly what the widgets would render: the author
//! list, a per-author idle/in-flight marker and the last error message.
//! Every operation awaits its whole call sequence before returning, so there
//! is never more than one request in flight per user action; re-triggering a
//! delete that is still running is ignored, which is what disabling the
//! button does in a real front end.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Context;

use authorservice_catalog::api::{author_path, Author, AuthorDetails, AuthorId, AUTHORS_PATH};
use authorservice_catalog::resource::{update_resource_with, ResourceApi};

use crate::cascade::delete_author_cascade;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemState {
    Idle,
    InFlight,
}

pub struct AuthorsView {
    api: Arc<dyn ResourceApi + Send + Sync>,
    authors: Vec<Author>,
    busy: HashMap<AuthorId, ItemState>,
    error: Option<String>,
}

impl AuthorsView {
    pub fn new(api: Arc<dyn ResourceApi + Send + Sync>) -> Self {
        Self {
            api,
            authors: vec![],
            busy: HashMap::new(),
            error: None,
        }
    }

    pub fn authors(&self) -> &[Author] {
        &self.authors
    }

    pub fn last_error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn item_state(&self, author_id: AuthorId) -> ItemState {
        self.busy
            .get(&author_id)
            .copied()
            .unwrap_or(ItemState::Idle)
    }

    /// Reloads the author list from the API
    pub async fn refresh(&mut self) {
        match self.load_authors().await {
            Ok(authors) => {
                self.authors = authors;
                self.error = None;
            }
            Err(err) => self.error = Some(format!("{:#}", err)),
        }
    }

    async fn load_authors(&self) -> anyhow::Result<Vec<Author>> {
        let fetched = self.api.fetch(AUTHORS_PATH).await?;
        serde_json::from_value(fetched.body).context("Failed to deserialize author list")
    }

    /// Creates a new author and reloads the list
    pub async fn create(&mut self, details: AuthorDetails) {
        let body = match serde_json::to_value(&details) {
            Ok(body) => body,
            Err(err) => {
                self.error = Some(err.to_string());
                return;
            }
        };
        match self.api.create(AUTHORS_PATH, &body).await {
            Ok(_) => self.refresh().await,
            Err(err) => self.error = Some(format!("{:#}", err)),
        }
    }

    /// Writes edited author fields back conditionally. A rejected write,
    /// token conflicts included, surfaces as a plain message like every
    /// other failure.
    pub async fn save(&mut self, author_id: AuthorId, details: AuthorDetails) {
        let patch = match serde_json::to_value(&details) {
            Ok(patch) => patch,
            Err(err) => {
                self.error = Some(err.to_string());
                return;
            }
        };
        let result = update_resource_with(&*self.api, &author_path(author_id), |doc| {
            json_patch::merge(doc, &patch)
        })
        .await;
        match result {
            Ok(outcome) if outcome.is_success() => self.refresh().await,
            Ok(outcome) => {
                self.error = Some(format!(
                    "Failed to save author {}: status {} body {}",
                    author_id, outcome.status, outcome.body
                ))
            }
            Err(err) => self.error = Some(format!("{:#}", err)),
        }
    }

    /// Runs the cascading delete for the author and drops it from the list
    /// on success. Ignored when a delete for this author is already in
    /// flight.
    pub async fn delete(&mut self, author_id: AuthorId) {
        if self.item_state(author_id) == ItemState::InFlight {
            return;
        }
        self.busy.insert(author_id, ItemState::InFlight);
        match delete_author_cascade(&*self.api, author_id).await {
            Ok(()) => {
                self.authors.retain(|author| author.id != author_id);
                self.error = None;
            }
            Err(err) => self.error = Some(format!("{:#}", err)),
        }
        self.busy.remove(&author_id);
    }
}
