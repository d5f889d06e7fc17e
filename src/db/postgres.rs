use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use super::{FileStore, StoreError};
use crate::intake::AcceptedFile;
use crate::models::file::{FileSummary, StoredFile};

const SUMMARY_COLUMNS: &str = "id, display_name, created_at, size_bytes, version";

#[derive(Clone)]
pub struct PgFileStore {
    pool: PgPool,
}

impl PgFileStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FileStore for PgFileStore {
    async fn insert(&self, file: AcceptedFile) -> Result<StoredFile, StoreError> {
        let id = Uuid::new_v4();
        let now = Utc::now();

        let stored = sqlx::query_as::<_, StoredFile>(
            "INSERT INTO files (id, display_name, created_at, size_bytes, content, version) \
             VALUES ($1, $2, $3, $4, $5, 0) \
             RETURNING id, display_name, created_at, size_bytes, content, version",
        )
        .bind(id)
        .bind(&file.display_name)
        .bind(now)
        .bind(file.size_bytes as i64)
        .bind(file.content)
        .fetch_one(&self.pool)
        .await?;

        Ok(stored)
    }

    async fn list(&self) -> Result<Vec<FileSummary>, StoreError> {
        let sql = format!("SELECT {} FROM files ORDER BY created_at DESC", SUMMARY_COLUMNS);
        let files = sqlx::query_as::<_, FileSummary>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(files)
    }

    async fn fetch(&self, id: Uuid) -> Result<StoredFile, StoreError> {
        sqlx::query_as::<_, StoredFile>(
            "SELECT id, display_name, created_at, size_bytes, content, version FROM files WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound)
    }

    async fn summary(&self, id: Uuid) -> Result<FileSummary, StoreError> {
        let sql = format!("SELECT {} FROM files WHERE id = $1", SUMMARY_COLUMNS);
        sqlx::query_as::<_, FileSummary>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound)
    }

    async fn update_display_name(
        &self,
        id: Uuid,
        expected_version: i32,
        display_name: &str,
    ) -> Result<FileSummary, StoreError> {
        let sql = format!(
            "UPDATE files SET display_name = $1, version = version + 1 \
             WHERE id = $2 AND version = $3 RETURNING {}",
            SUMMARY_COLUMNS
        );
        sqlx::query_as::<_, FileSummary>(&sql)
            .bind(display_name)
            .bind(id)
            .bind(expected_version)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::ConcurrentUpdateConflict)
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM files WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn exists(&self, id: Uuid) -> Result<bool, StoreError> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM files WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }
}
