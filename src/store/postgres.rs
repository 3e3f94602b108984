use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPoolOptions, PgPool};
use uuid::Uuid;

use crate::errors::{AppError, Result};
use crate::models::{Session, StoredFile, User};
use crate::store::DataStore;

// Per-operation deadlines. Expiry is an operation failure, not a retry
// trigger.
const SHORT_OP_DEADLINE: Duration = Duration::from_secs(5);
const FILE_OP_DEADLINE: Duration = Duration::from_secs(10);

pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(20)
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("migration failed: {}", e)))?;
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn deadline<T, F>(limit: Duration, fut: F) -> Result<T>
    where
        F: Future<Output = std::result::Result<T, sqlx::Error>>,
    {
        match tokio::time::timeout(limit, fut).await {
            Ok(res) => res.map_err(AppError::from),
            Err(_) => Err(AppError::StoreTimeout),
        }
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Database(db_err)
            if matches!(db_err.kind(), sqlx::error::ErrorKind::UniqueViolation)
    )
}

#[async_trait]
impl DataStore for PostgresStore {
    async fn create_user(&self, user: &User) -> Result<()> {
        Self::deadline(
            SHORT_OP_DEADLINE,
            sqlx::query(
                r#"
                INSERT INTO users (id, username, name, password_hash, quota_bytes, used_bytes, created_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(user.id)
            .bind(&user.username)
            .bind(&user.name)
            .bind(&user.password_hash)
            .bind(user.quota_bytes)
            .bind(user.used_bytes)
            .bind(user.created_at)
            .execute(&self.pool),
        )
        .await?;

        Ok(())
    }

    async fn user_by_username(&self, username: &str) -> Result<Option<User>> {
        Self::deadline(
            SHORT_OP_DEADLINE,
            sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
                .bind(username)
                .fetch_optional(&self.pool),
        )
        .await
    }

    async fn user_by_id(&self, id: Uuid) -> Result<Option<User>> {
        Self::deadline(
            SHORT_OP_DEADLINE,
            sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool),
        )
        .await
    }

    async fn add_used_storage(&self, id: Uuid, delta: i64) -> Result<i64> {
        // Single-statement increment; concurrent uploads serialize on the row
        // instead of overwriting each other's sums.
        Self::deadline(
            SHORT_OP_DEADLINE,
            sqlx::query_scalar::<_, i64>(
                "UPDATE users SET used_bytes = used_bytes + $1 WHERE id = $2 RETURNING used_bytes",
            )
            .bind(delta)
            .bind(id)
            .fetch_one(&self.pool),
        )
        .await
    }

    async fn replace_user_sessions(&self, session: &Session) -> Result<()> {
        let pool = self.pool.clone();
        let session = session.clone();

        Self::deadline(SHORT_OP_DEADLINE, async move {
            let mut tx = pool.begin().await?;

            sqlx::query("UPDATE sessions SET ends_at = NOW() WHERE user_id = $1 AND ends_at > NOW()")
                .bind(session.user_id)
                .execute(&mut *tx)
                .await?;

            sqlx::query(
                r#"
                INSERT INTO sessions (id, user_id, token, started_at, ends_at)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(session.id)
            .bind(session.user_id)
            .bind(&session.token)
            .bind(session.started_at)
            .bind(session.ends_at)
            .execute(&mut *tx)
            .await?;

            tx.commit().await
        })
        .await
    }

    async fn session_by_id(&self, id: Uuid) -> Result<Option<Session>> {
        Self::deadline(
            SHORT_OP_DEADLINE,
            sqlx::query_as::<_, Session>("SELECT * FROM sessions WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool),
        )
        .await
    }

    async fn session_by_token(&self, token: &str) -> Result<Option<Session>> {
        Self::deadline(
            SHORT_OP_DEADLINE,
            sqlx::query_as::<_, Session>("SELECT * FROM sessions WHERE token = $1")
                .bind(token)
                .fetch_optional(&self.pool),
        )
        .await
    }

    async fn extend_session(&self, id: Uuid, new_end: DateTime<Utc>) -> Result<bool> {
        let result = Self::deadline(
            SHORT_OP_DEADLINE,
            sqlx::query("UPDATE sessions SET ends_at = $1 WHERE id = $2")
                .bind(new_end)
                .bind(id)
                .execute(&self.pool),
        )
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn end_session(&self, id: Uuid) -> Result<()> {
        // Terminating a session that does not exist is a success.
        Self::deadline(
            SHORT_OP_DEADLINE,
            sqlx::query("UPDATE sessions SET ends_at = NOW() WHERE id = $1")
                .bind(id)
                .execute(&self.pool),
        )
        .await?;

        Ok(())
    }

    async fn file_by_hash(&self, user_id: Uuid, sha256: &str) -> Result<Option<StoredFile>> {
        Self::deadline(
            FILE_OP_DEADLINE,
            sqlx::query_as::<_, StoredFile>(
                "SELECT * FROM files WHERE user_id = $1 AND sha256 = $2",
            )
            .bind(user_id)
            .bind(sha256)
            .fetch_optional(&self.pool),
        )
        .await
    }

    async fn insert_file(&self, file: &StoredFile) -> Result<()> {
        let result = Self::deadline(
            FILE_OP_DEADLINE,
            sqlx::query(
                r#"
                INSERT INTO files (id, user_id, filename, size_bytes, storage_path, sha256, uploaded_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(file.id)
            .bind(file.user_id)
            .bind(&file.filename)
            .bind(file.size_bytes)
            .bind(&file.storage_path)
            .bind(&file.sha256)
            .bind(file.uploaded_at)
            .execute(&self.pool),
        )
        .await;

        match result {
            Ok(_) => Ok(()),
            // The (user_id, sha256) constraint is the Conflict signal when
            // two identical uploads race past the dedup pre-check.
            Err(AppError::Database(ref e)) if is_unique_violation(e) => {
                Err(AppError::DuplicateFile)
            }
            Err(e) => Err(e),
        }
    }

    async fn files_by_user(&self, user_id: Uuid) -> Result<Vec<StoredFile>> {
        Self::deadline(
            FILE_OP_DEADLINE,
            sqlx::query_as::<_, StoredFile>(
                "SELECT * FROM files WHERE user_id = $1 ORDER BY uploaded_at",
            )
            .bind(user_id)
            .fetch_all(&self.pool),
        )
        .await
    }
}
