pub use in_memory_documents_repository::InMemoryDocumentsRepository;
pub use postgres_documents_repository::{
    PostgresDocumentsRepository, PostgresDocumentsRepositoryConfig,
};

use serde_json::Value;

mod in_memory_documents_repository;
mod postgres_documents_repository;

pub type DocumentId = i32;
pub type Revision = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Authors,
    Books,
    Prizes,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Authors => "authors",
            Collection::Books => "books",
            Collection::Prizes => "prizes",
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
/// A stored JSON document together with its revision counter. The revision
/// starts at 1 and is bumped by every accepted write; it is what the
/// handlers serve as the concurrency token.
pub struct VersionedDocument {
    pub body: Value,
    pub revision: Revision,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Revision requirement attached to a write or delete
pub enum Precondition {
    /// Apply regardless of the current revision
    Any,
    /// Apply only when the document is still at this revision
    Revision(Revision),
}

impl Precondition {
    pub fn matches(&self, revision: Revision) -> bool {
        match self {
            Precondition::Any => true,
            Precondition::Revision(required) => *required == revision,
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum DocumentsRepositoryError {
    #[error("Document {1} not found in {0}")]
    NotFound(Collection, DocumentId),

    #[error("Document {id} in {collection} is at revision {current}, precondition failed")]
    RevisionMismatch {
        collection: Collection,
        id: DocumentId,
        current: Revision,
    },

    #[error("Failed to deserialize document: {0}")]
    DeserializationError(#[from] serde_json::Error),

    #[error("DatabaseFailure failure {0}")]
    DatabaseFailure(#[from] tokio_postgres::Error),

    #[error("Other error {0}")]
    Other(String),
}

#[async_trait::async_trait]
pub trait DocumentsRepository {
    /// Stores a new document, assigns an id, injects it into the body under
    /// the `id` key and returns it
    async fn add_document(
        &self,
        collection: Collection,
        body: Value,
    ) -> Result<DocumentId, DocumentsRepositoryError>;

    /// Retrieves the document and its current revision
    async fn get_document(
        &self,
        collection: Collection,
        id: DocumentId,
    ) -> Result<VersionedDocument, DocumentsRepositoryError>;

    /// Replaces the document body when the precondition holds, bumps the
    /// revision and returns the new one
    async fn put_document(
        &self,
        collection: Collection,
        id: DocumentId,
        body: Value,
        precondition: Precondition,
    ) -> Result<Revision, DocumentsRepositoryError>;

    /// Removes the document when the precondition holds
    async fn delete_document(
        &self,
        collection: Collection,
        id: DocumentId,
        precondition: Precondition,
    ) -> Result<(), DocumentsRepositoryError>;

    /// Lists all documents of the collection ordered by id
    async fn list_documents(
        &self,
        collection: Collection,
    ) -> Result<Vec<VersionedDocument>, DocumentsRepositoryError>;
}
