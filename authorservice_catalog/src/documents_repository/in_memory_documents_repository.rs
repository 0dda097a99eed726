use std::collections::HashMap;
use std::sync::atomic::{AtomicI32, Ordering};

use serde_json::{json, Value};

use crate::documents_repository::{
    Collection, DocumentId, DocumentsRepository, DocumentsRepositoryError, Precondition, Revision,
    VersionedDocument,
};

pub struct InMemoryDocumentsRepository {
    document_sequence_generator: AtomicI32,
    documents: parking_lot::RwLock<HashMap<(Collection, DocumentId), VersionedDocument>>,
}

impl Default for InMemoryDocumentsRepository {
    fn default() -> Self {
        Self {
            document_sequence_generator: Default::default(),
            documents: Default::default(),
        }
    }
}

#[async_trait::async_trait]
impl DocumentsRepository for InMemoryDocumentsRepository {
    async fn add_document(
        &self,
        collection: Collection,
        mut body: Value,
    ) -> Result<DocumentId, DocumentsRepositoryError> {
        // Ids start at 1 to match the SERIAL column of the postgres backend
        let id = self.document_sequence_generator.fetch_add(1, Ordering::Relaxed) + 1;
        if let Some(map) = body.as_object_mut() {
            map.insert("id".to_string(), json!(id));
        }
        self.documents
            .write()
            .insert((collection, id), VersionedDocument { body, revision: 1 });
        Ok(id)
    }

    async fn get_document(
        &self,
        collection: Collection,
        id: DocumentId,
    ) -> Result<VersionedDocument, DocumentsRepositoryError> {
        self.documents
            .read()
            .get(&(collection, id))
            .cloned()
            .ok_or(DocumentsRepositoryError::NotFound(collection, id))
    }

    async fn put_document(
        &self,
        collection: Collection,
        id: DocumentId,
        body: Value,
        precondition: Precondition,
    ) -> Result<Revision, DocumentsRepositoryError> {
        let mut locked_documents = self.documents.write();
        let document = locked_documents
            .get_mut(&(collection, id))
            .ok_or(DocumentsRepositoryError::NotFound(collection, id))?;
        if !precondition.matches(document.revision) {
            return Err(DocumentsRepositoryError::RevisionMismatch {
                collection,
                id,
                current: document.revision,
            });
        }
        document.body = body;
        document.revision += 1;
        Ok(document.revision)
    }

    async fn delete_document(
        &self,
        collection: Collection,
        id: DocumentId,
        precondition: Precondition,
    ) -> Result<(), DocumentsRepositoryError> {
        let mut locked_documents = self.documents.write();
        let document = locked_documents
            .get(&(collection, id))
            .ok_or(DocumentsRepositoryError::NotFound(collection, id))?;
        if !precondition.matches(document.revision) {
            return Err(DocumentsRepositoryError::RevisionMismatch {
                collection,
                id,
                current: document.revision,
            });
        }
        locked_documents.remove(&(collection, id));
        Ok(())
    }

    async fn list_documents(
        &self,
        collection: Collection,
    ) -> Result<Vec<VersionedDocument>, DocumentsRepositoryError> {
        let mut documents: Vec<VersionedDocument> = self
            .documents
            .read()
            .iter()
            .filter(|(key, _)| key.0 == collection)
            .map(|(_, document)| document.clone())
            .collect();
        documents.sort_by_key(|document| {
            document
                .body
                .get("id")
                .and_then(Value::as_i64)
                .unwrap_or_default()
        });
        Ok(documents)
    }
}
