use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A user session. `token` is an opaque random value distinct from the
/// session id; it is what issued bearer tokens embed and what every
/// authenticated request is resolved against.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token: String,
    pub started_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
}

impl Session {
    /// A session exactly at its expiry boundary is inactive. Every check
    /// path goes through this one comparison so they cannot disagree.
    pub fn is_active_at(&self, at: DateTime<Utc>) -> bool {
        self.ends_at > at
    }
}
