use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::Utc;

/// Full row including file bytes. Only the download path needs this.
#[derive(sqlx::FromRow, Debug, Clone)]
pub struct StoredFile {
    pub id: Uuid,
    pub display_name: String,
    pub created_at: chrono::DateTime<Utc>,
    pub size_bytes: i64,
    pub content: Vec<u8>,
    pub version: i32,
}

#[derive(sqlx::FromRow, Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FileSummary {
    pub id: Uuid,
    pub display_name: String,
    pub created_at: chrono::DateTime<Utc>,
    pub size_bytes: i64,
    pub version: i32,
}

impl From<&StoredFile> for FileSummary {
    fn from(file: &StoredFile) -> Self {
        FileSummary {
            id: file.id,
            display_name: file.display_name.clone(),
            created_at: file.created_at,
            size_bytes: file.size_bytes,
            version: file.version,
        }
    }
}
