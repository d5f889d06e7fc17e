use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{FileStore, StoreError};
use crate::intake::AcceptedFile;
use crate::models::file::{FileSummary, StoredFile};

/// Volatile store with the same semantics as the Postgres one.
#[derive(Default)]
pub struct MemoryFileStore {
    files: RwLock<HashMap<Uuid, StoredFile>>,
}

impl MemoryFileStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FileStore for MemoryFileStore {
    async fn insert(&self, file: AcceptedFile) -> Result<StoredFile, StoreError> {
        let stored = StoredFile {
            id: Uuid::new_v4(),
            display_name: file.display_name,
            created_at: Utc::now(),
            size_bytes: file.size_bytes as i64,
            content: file.content,
            version: 0,
        };
        self.files.write().await.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn list(&self) -> Result<Vec<FileSummary>, StoreError> {
        let files = self.files.read().await;
        let mut summaries: Vec<FileSummary> = files.values().map(FileSummary::from).collect();
        summaries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(summaries)
    }

    async fn fetch(&self, id: Uuid) -> Result<StoredFile, StoreError> {
        self.files
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn summary(&self, id: Uuid) -> Result<FileSummary, StoreError> {
        self.files
            .read()
            .await
            .get(&id)
            .map(FileSummary::from)
            .ok_or(StoreError::NotFound)
    }

    async fn update_display_name(
        &self,
        id: Uuid,
        expected_version: i32,
        display_name: &str,
    ) -> Result<FileSummary, StoreError> {
        let mut files = self.files.write().await;
        match files.get_mut(&id) {
            Some(file) if file.version == expected_version => {
                file.display_name = display_name.to_string();
                file.version += 1;
                Ok(FileSummary::from(&*file))
            }
            _ => Err(StoreError::ConcurrentUpdateConflict),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        match self.files.write().await.remove(&id) {
            Some(_) => Ok(()),
            None => Err(StoreError::NotFound),
        }
    }

    async fn exists(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.files.read().await.contains_key(&id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn accepted(name: &str, bytes: &[u8]) -> AcceptedFile {
        AcceptedFile {
            display_name: name.to_string(),
            size_bytes: bytes.len(),
            content: bytes.to_vec(),
        }
    }

    #[actix_web::test]
    async fn insert_assigns_id_and_keeps_size() {
        let store = MemoryFileStore::new();
        let a = store.insert(accepted("a.jpg", b"abc")).await.unwrap();
        let b = store.insert(accepted("a.jpg", b"abc")).await.unwrap();

        assert_ne!(a.id, b.id);
        assert_eq!(a.size_bytes, 3);
        assert_eq!(a.version, 0);
        assert_eq!(store.fetch(a.id).await.unwrap().content, b"abc");
        assert_eq!(store.list().await.unwrap().len(), 2);
    }

    #[actix_web::test]
    async fn stale_version_conflicts() {
        let store = MemoryFileStore::new();
        let file = store.insert(accepted("a.png", b"x")).await.unwrap();

        let renamed = store.update_display_name(file.id, 0, "b.png").await.unwrap();
        assert_eq!(renamed.version, 1);
        assert_eq!(renamed.display_name, "b.png");

        let stale = store.update_display_name(file.id, 0, "c.png").await;
        assert!(matches!(stale, Err(StoreError::ConcurrentUpdateConflict)));
        assert!(store.exists(file.id).await.unwrap());
    }

    #[actix_web::test]
    async fn update_after_delete_conflicts_and_row_is_gone() {
        let store = MemoryFileStore::new();
        let file = store.insert(accepted("a.pdf", b"%PDF")).await.unwrap();
        store.delete(file.id).await.unwrap();

        let result = store.update_display_name(file.id, 0, "b.pdf").await;
        assert!(matches!(result, Err(StoreError::ConcurrentUpdateConflict)));
        assert!(!store.exists(file.id).await.unwrap());
        assert!(matches!(store.delete(file.id).await, Err(StoreError::NotFound)));
        assert!(matches!(store.fetch(file.id).await, Err(StoreError::NotFound)));
    }
}
