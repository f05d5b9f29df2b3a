use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::time::Duration;
use uuid::Uuid;

use crate::database::DatabasePool;
use crate::error::StoreError;
use crate::models::{FileDescriptor, FileId};
use crate::services::bounded;
use crate::utils::date::stored_now;

/// Blob store for attachments. Size and MIME policy is enforced by the upload route,
/// not here.
#[async_trait]
pub trait FileStore: Send + Sync {
    async fn store(
        &self,
        content: Vec<u8>,
        filename: &str,
        mime_type: &str,
    ) -> Result<FileDescriptor, StoreError>;

    async fn list_all(&self) -> Result<Vec<FileDescriptor>, StoreError>;

    async fn find(&self, id: FileId) -> Result<Option<FileDescriptor>, StoreError>;

    /// Fails with `NotFound` when the blob was removed after the descriptor was read.
    async fn fetch_content(&self, descriptor: &FileDescriptor) -> Result<Vec<u8>, StoreError>;

    async fn delete_all(&self) -> Result<(), StoreError>;
}

pub fn sha256_hex(content: &[u8]) -> String {
    format!("{:x}", Sha256::digest(content))
}

pub struct PgFileStore {
    pool: DatabasePool,
    timeout: Duration,
}

impl PgFileStore {
    pub fn new(pool: DatabasePool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }
}

#[async_trait]
impl FileStore for PgFileStore {
    async fn store(
        &self,
        content: Vec<u8>,
        filename: &str,
        mime_type: &str,
    ) -> Result<FileDescriptor, StoreError> {
        let sha256 = sha256_hex(&content);
        let length = content.len() as i64;

        let query = sqlx::query_as::<_, FileDescriptor>(
            r#"
            INSERT INTO files (id, filename, mime_type, length, sha256, content, uploaded_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, filename, mime_type, length, sha256, uploaded_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(filename)
        .bind(mime_type)
        .bind(length)
        .bind(&sha256)
        .bind(&content)
        .bind(stored_now())
        .fetch_one(&*self.pool);

        let descriptor = bounded(self.timeout, query).await?;
        tracing::info!(
            "Stored file {} ({}, {} bytes) as {}",
            descriptor.filename,
            descriptor.mime_type,
            descriptor.length,
            descriptor.id
        );
        Ok(descriptor)
    }

    async fn list_all(&self) -> Result<Vec<FileDescriptor>, StoreError> {
        let query = sqlx::query_as::<_, FileDescriptor>(
            "SELECT id, filename, mime_type, length, sha256, uploaded_at FROM files ORDER BY uploaded_at, id",
        )
        .fetch_all(&*self.pool);

        bounded(self.timeout, query).await
    }

    async fn find(&self, id: FileId) -> Result<Option<FileDescriptor>, StoreError> {
        let query = sqlx::query_as::<_, FileDescriptor>(
            "SELECT id, filename, mime_type, length, sha256, uploaded_at FROM files WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&*self.pool);

        bounded(self.timeout, query).await
    }

    async fn fetch_content(&self, descriptor: &FileDescriptor) -> Result<Vec<u8>, StoreError> {
        let query = sqlx::query_scalar::<_, Vec<u8>>("SELECT content FROM files WHERE id = $1")
            .bind(descriptor.id)
            .fetch_optional(&*self.pool);

        bounded(self.timeout, query)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("File {}", descriptor.filename)))
    }

    async fn delete_all(&self) -> Result<(), StoreError> {
        let query = sqlx::query("DELETE FROM files").execute(&*self.pool);

        let result = bounded(self.timeout, query).await?;
        tracing::info!("Deleted {} files", result.rows_affected());
        Ok(())
    }
}
