use anyhow::Context;
use serde_json::Value;
use tokio_postgres::{Client, NoTls, Statement};

use crate::documents_repository::{
    Collection, DocumentId, DocumentsRepository, DocumentsRepositoryError, Precondition, Revision,
    VersionedDocument,
};

pub struct PostgresDocumentsRepository {
    client: Client,
}

pub struct PostgresDocumentsRepositoryConfig {
    pub hostname: String,
    pub username: String,
    pub password: String,
}

impl PostgresDocumentsRepository {
    pub async fn init(config: PostgresDocumentsRepositoryConfig) -> anyhow::Result<Self> {
        let connection_str = format!(
            "postgresql://{}:{}@{}",
            config.username, config.password, config.hostname
        );
        tracing::info!("Postgres connection_str: {}", connection_str);
        let (client, connection) = tokio_postgres::connect(&connection_str, NoTls)
            .await
            .context("Failed to start postgres")?;

        tokio::spawn(async move {
            if let Err(e) = connection.await {
                eprintln!("connection error: {}", e);
            }
        });

        client
            .batch_execute(
                "
        CREATE TABLE IF NOT EXISTS documents (
            collection      TEXT NOT NULL,
            id              SERIAL,
            revision        BIGINT NOT NULL DEFAULT 1,
            params          JSONB,
            PRIMARY KEY (collection, id)
            )
        ",
            )
            .await
            .context("Failed to setup table")?;
        Ok(Self { client })
    }

    async fn current_revision(
        &self,
        collection: Collection,
        id: DocumentId,
    ) -> Result<Option<Revision>, DocumentsRepositoryError> {
        let stmt: Statement = self
            .client
            .prepare("SELECT revision FROM documents WHERE collection = ($1) AND id = ($2)")
            .await?;
        let rows = self.client.query(&stmt, &[&collection.as_str(), &id]).await?;
        rows.first().map(|row| row.try_get(0)).transpose().map_err(Into::into)
    }
}

#[async_trait::async_trait]
impl DocumentsRepository for PostgresDocumentsRepository {
    async fn add_document(
        &self,
        collection: Collection,
        body: Value,
    ) -> Result<DocumentId, DocumentsRepositoryError> {
        let stmt: Statement = self
            .client
            .prepare("INSERT INTO documents (collection, params) VALUES ($1, $2) RETURNING id")
            .await?;

        let rows = self
            .client
            .query(&stmt, &[&collection.as_str(), &body])
            .await?;

        let id: DocumentId = rows
            .first()
            .ok_or_else(|| DocumentsRepositoryError::Other("Id not returned".to_string()))?
            .try_get(0)?;

        let stmt: Statement = self
            .client
            .prepare(
                "UPDATE documents SET params = params || jsonb_build_object('id', id) \
                 WHERE collection = ($1) AND id = ($2)",
            )
            .await?;
        self.client.execute(&stmt, &[&collection.as_str(), &id]).await?;

        Ok(id)
    }

    async fn get_document(
        &self,
        collection: Collection,
        id: DocumentId,
    ) -> Result<VersionedDocument, DocumentsRepositoryError> {
        let stmt: Statement = self
            .client
            .prepare("SELECT params, revision FROM documents WHERE collection = ($1) AND id = ($2)")
            .await?;

        let rows = self.client.query(&stmt, &[&collection.as_str(), &id]).await?;

        let row = rows
            .first()
            .ok_or(DocumentsRepositoryError::NotFound(collection, id))?;
        Ok(VersionedDocument {
            body: row.try_get(0)?,
            revision: row.try_get(1)?,
        })
    }

    async fn put_document(
        &self,
        collection: Collection,
        id: DocumentId,
        body: Value,
        precondition: Precondition,
    ) -> Result<Revision, DocumentsRepositoryError> {
        let rows = match precondition {
            Precondition::Any => {
                let stmt: Statement = self
                    .client
                    .prepare(
                        "UPDATE documents SET params = ($3), revision = revision + 1 \
                         WHERE collection = ($1) AND id = ($2) RETURNING revision",
                    )
                    .await?;
                self.client
                    .query(&stmt, &[&collection.as_str(), &id, &body])
                    .await?
            }
            Precondition::Revision(revision) => {
                let stmt: Statement = self
                    .client
                    .prepare(
                        "UPDATE documents SET params = ($3), revision = revision + 1 \
                         WHERE collection = ($1) AND id = ($2) AND revision = ($4) \
                         RETURNING revision",
                    )
                    .await?;
                self.client
                    .query(&stmt, &[&collection.as_str(), &id, &body, &revision])
                    .await?
            }
        };

        if let Some(row) = rows.first() {
            return Ok(row.try_get(0)?);
        }
        match self.current_revision(collection, id).await? {
            Some(current) => Err(DocumentsRepositoryError::RevisionMismatch {
                collection,
                id,
                current,
            }),
            None => Err(DocumentsRepositoryError::NotFound(collection, id)),
        }
    }

    async fn delete_document(
        &self,
        collection: Collection,
        id: DocumentId,
        precondition: Precondition,
    ) -> Result<(), DocumentsRepositoryError> {
        let rows = match precondition {
            Precondition::Any => {
                let stmt: Statement = self
                    .client
                    .prepare(
                        "DELETE FROM documents WHERE collection = ($1) AND id = ($2) \
                         RETURNING id",
                    )
                    .await?;
                self.client.query(&stmt, &[&collection.as_str(), &id]).await?
            }
            Precondition::Revision(revision) => {
                let stmt: Statement = self
                    .client
                    .prepare(
                        "DELETE FROM documents WHERE collection = ($1) AND id = ($2) \
                         AND revision = ($3) RETURNING id",
                    )
                    .await?;
                self.client
                    .query(&stmt, &[&collection.as_str(), &id, &revision])
                    .await?
            }
        };

        if !rows.is_empty() {
            return Ok(());
        }
        match self.current_revision(collection, id).await? {
            Some(current) => Err(DocumentsRepositoryError::RevisionMismatch {
                collection,
                id,
                current,
            }),
            None => Err(DocumentsRepositoryError::NotFound(collection, id)),
        }
    }

    async fn list_documents(
        &self,
        collection: Collection,
    ) -> Result<Vec<VersionedDocument>, DocumentsRepositoryError> {
        let stmt: Statement = self
            .client
            .prepare(
                "SELECT params, revision FROM documents WHERE collection = ($1) ORDER BY id",
            )
            .await?;

        let rows = self.client.query(&stmt, &[&collection.as_str()]).await?;

        rows.iter()
            .map(|row| {
                Ok(VersionedDocument {
                    body: row.try_get(0)?,
                    revision: row.try_get(1)?,
                })
            })
            .collect()
    }
}
