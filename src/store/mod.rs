use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::errors::Result;
use crate::models::{Session, StoredFile, User};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

/// Narrow query/update contract over the persisted collections: users,
/// sessions and file metadata. The multi-record invariants live here so the
/// backend can enforce them atomically:
///
/// - `replace_user_sessions` terminates every active session of the user and
///   inserts the replacement as one unit, so two racing logins cannot leave
///   two live sessions behind.
/// - `add_used_storage` increments at the store, never read-modify-write in
///   the caller, so concurrent uploads cannot lose an increment.
/// - `insert_file` signals a `(user_id, sha256)` uniqueness violation as the
///   duplicate-file error.
#[async_trait]
pub trait DataStore: Send + Sync {
    async fn create_user(&self, user: &User) -> Result<()>;
    async fn user_by_username(&self, username: &str) -> Result<Option<User>>;
    async fn user_by_id(&self, id: Uuid) -> Result<Option<User>>;
    async fn add_used_storage(&self, id: Uuid, delta: i64) -> Result<i64>;

    async fn replace_user_sessions(&self, session: &Session) -> Result<()>;
    async fn session_by_id(&self, id: Uuid) -> Result<Option<Session>>;
    async fn session_by_token(&self, token: &str) -> Result<Option<Session>>;
    async fn extend_session(&self, id: Uuid, new_end: DateTime<Utc>) -> Result<bool>;
    async fn end_session(&self, id: Uuid) -> Result<()>;

    async fn file_by_hash(&self, user_id: Uuid, sha256: &str) -> Result<Option<StoredFile>>;
    async fn insert_file(&self, file: &StoredFile) -> Result<()>;
    async fn files_by_user(&self, user_id: Uuid) -> Result<Vec<StoredFile>>;
}
