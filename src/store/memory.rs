use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::errors::{AppError, Result};
use crate::models::{Session, StoredFile, User};
use crate::store::DataStore;

/// In-memory store. Backs the integration tests and ephemeral runs; each
/// multi-record operation holds the one lock for its whole critical section,
/// giving it the same atomicity the Postgres backend gets from transactions.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    users: HashMap<Uuid, User>,
    sessions: HashMap<Uuid, Session>,
    files: Vec<StoredFile>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DataStore for MemoryStore {
    async fn create_user(&self, user: &User) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if inner.users.values().any(|u| u.username == user.username) {
            return Err(AppError::Internal(anyhow::anyhow!(
                "user with username '{}' already exists",
                user.username
            )));
        }
        inner.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn user_by_username(&self, username: &str) -> Result<Option<User>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.users.values().find(|u| u.username == username).cloned())
    }

    async fn user_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.users.get(&id).cloned())
    }

    async fn add_used_storage(&self, id: Uuid, delta: i64) -> Result<i64> {
        let mut inner = self.inner.lock().unwrap();
        let user = inner
            .users
            .get_mut(&id)
            .ok_or_else(|| AppError::Database(sqlx::Error::RowNotFound))?;
        user.used_bytes += delta;
        Ok(user.used_bytes)
    }

    async fn replace_user_sessions(&self, session: &Session) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        let now = Utc::now();
        for existing in inner.sessions.values_mut() {
            if existing.user_id == session.user_id && existing.is_active_at(now) {
                existing.ends_at = now;
            }
        }
        inner.sessions.insert(session.id, session.clone());
        Ok(())
    }

    async fn session_by_id(&self, id: Uuid) -> Result<Option<Session>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.sessions.get(&id).cloned())
    }

    async fn session_by_token(&self, token: &str) -> Result<Option<Session>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.sessions.values().find(|s| s.token == token).cloned())
    }

    async fn extend_session(&self, id: Uuid, new_end: DateTime<Utc>) -> Result<bool> {
        let mut inner = self.inner.lock().unwrap();
        match inner.sessions.get_mut(&id) {
            Some(session) => {
                session.ends_at = new_end;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn end_session(&self, id: Uuid) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(session) = inner.sessions.get_mut(&id) {
            session.ends_at = Utc::now();
        }
        Ok(())
    }

    async fn file_by_hash(&self, user_id: Uuid, sha256: &str) -> Result<Option<StoredFile>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .files
            .iter()
            .find(|f| f.user_id == user_id && f.sha256 == sha256)
            .cloned())
    }

    async fn insert_file(&self, file: &StoredFile) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if inner
            .files
            .iter()
            .any(|f| f.user_id == file.user_id && f.sha256 == file.sha256)
        {
            return Err(AppError::DuplicateFile);
        }
        inner.files.push(file.clone());
        Ok(())
    }

    async fn files_by_user(&self, user_id: Uuid) -> Result<Vec<StoredFile>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .files
            .iter()
            .filter(|f| f.user_id == user_id)
            .cloned()
            .collect())
    }
}
