//! Document metadata repository.

use async_trait::async_trait;
use sqlx::{postgres::PgRow, Pool, Postgres, Row};
use tracing::debug;

use searchive_core::{Document, DocumentRepository, Error, NewDocument, Result};

const DOCUMENT_COLUMNS: &str = "document_id, user_id, original_filename, storage_path, \
     file_type, file_size_kb, uploaded_at, updated_at";

/// PostgreSQL implementation of DocumentRepository.
#[derive(Clone)]
pub struct PgDocumentRepository {
    pool: Pool<Postgres>,
}

impl PgDocumentRepository {
    /// Create a new PgDocumentRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

fn document_from_row(row: &PgRow) -> Document {
    Document {
        document_id: row.get("document_id"),
        user_id: row.get("user_id"),
        original_filename: row.get("original_filename"),
        storage_path: row.get("storage_path"),
        file_type: row.get("file_type"),
        file_size_kb: row.get("file_size_kb"),
        uploaded_at: row.get("uploaded_at"),
        updated_at: row.get("updated_at"),
    }
}

#[async_trait]
impl DocumentRepository for PgDocumentRepository {
    async fn insert(&self, doc: NewDocument) -> Result<Document> {
        let row = sqlx::query(&format!(
            "INSERT INTO documents (user_id, original_filename, storage_path, file_type, file_size_kb)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {DOCUMENT_COLUMNS}"
        ))
        .bind(doc.user_id)
        .bind(&doc.original_filename)
        .bind(&doc.storage_path)
        .bind(&doc.file_type)
        .bind(doc.file_size_kb)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        let document = document_from_row(&row);
        debug!(
            subsystem = "db",
            component = "documents",
            op = "insert",
            document_id = document.document_id,
            user_id = document.user_id,
            "Document row created"
        );
        Ok(document)
    }

    async fn find_for_owner(&self, document_id: i64, user_id: i64) -> Result<Option<Document>> {
        let row = sqlx::query(&format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents WHERE document_id = $1 AND user_id = $2"
        ))
        .bind(document_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.as_ref().map(document_from_row))
    }

    async fn list_for_owner(&self, user_id: i64) -> Result<Vec<Document>> {
        let rows = sqlx::query(&format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents
             WHERE user_id = $1
             ORDER BY uploaded_at DESC, document_id DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.iter().map(document_from_row).collect())
    }

    async fn list_all(&self) -> Result<Vec<Document>> {
        let rows = sqlx::query(&format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents ORDER BY document_id"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.iter().map(document_from_row).collect())
    }

    async fn delete(&self, document_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM documents WHERE document_id = $1")
            .bind(document_id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(result.rows_affected() > 0)
    }
}
