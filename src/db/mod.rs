pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::intake::AcceptedFile;
use crate::models::file::{FileSummary, StoredFile};

pub use memory::MemoryFileStore;
pub use postgres::PgFileStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("file not found")]
    NotFound,
    /// The row changed or vanished between read and write.
    #[error("file was modified or deleted concurrently")]
    ConcurrentUpdateConflict,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

/// Persistence for accepted uploads.
///
/// `insert` assigns the id and creation time; nothing the client sent is used
/// for either.
#[async_trait]
pub trait FileStore: Send + Sync {
    async fn insert(&self, file: AcceptedFile) -> Result<StoredFile, StoreError>;

    /// Newest first, without content.
    async fn list(&self) -> Result<Vec<FileSummary>, StoreError>;

    async fn fetch(&self, id: Uuid) -> Result<StoredFile, StoreError>;

    async fn summary(&self, id: Uuid) -> Result<FileSummary, StoreError>;

    /// Renames the file if its version still equals `expected_version`.
    /// A stale version or a missing row both give `ConcurrentUpdateConflict`;
    /// callers tell the two apart with [`FileStore::exists`].
    async fn update_display_name(
        &self,
        id: Uuid,
        expected_version: i32,
        display_name: &str,
    ) -> Result<FileSummary, StoreError>;

    async fn delete(&self, id: Uuid) -> Result<(), StoreError>;

    async fn exists(&self, id: Uuid) -> Result<bool, StoreError>;
}

pub async fn create_pool(database_url: &str) -> Result<PgPool, StoreError> {
    let pool = PgPool::connect(database_url).await?;
    sqlx::migrate!().run(&pool).await?;
    Ok(pool)
}
