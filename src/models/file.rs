use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct StoredFile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub filename: String,
    pub size_bytes: i64,
    pub storage_path: String,
    pub sha256: String,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub message: String,
    pub filename: String,
    #[serde(rename = "userID")]
    pub user_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct FileListResponse {
    pub user_id: Uuid,
    pub files: Vec<StoredFile>,
}
