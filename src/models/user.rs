use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub name: String,
    pub password_hash: String,
    pub quota_bytes: i64,
    pub used_bytes: i64,
    pub created_at: DateTime<Utc>,
}

/// Identity snapshot attached to every authenticated request.
#[derive(Debug, Clone)]
pub struct UserContext {
    pub id: Uuid,
    pub name: String,
    pub username: String,
    pub quota_bytes: i64,
    pub used_bytes: i64,
}

impl From<&User> for UserContext {
    fn from(user: &User) -> Self {
        UserContext {
            id: user.id,
            name: user.name.clone(),
            username: user.username.clone(),
            quota_bytes: user.quota_bytes,
            used_bytes: user.used_bytes,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    #[serde(rename = "userID")]
    pub user_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct StorageResponse {
    pub total: i64,
    pub used: i64,
    pub remaining: i64,
}
