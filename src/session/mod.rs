use std::sync::Arc;

use chrono::{Duration, Utc};
use rand::{thread_rng, Rng};
use uuid::Uuid;

use crate::errors::Result;
use crate::models::Session;
use crate::store::DataStore;

/// Owns session records and the single-active-session-per-user invariant.
/// The expiry window slides: every authenticated request pushes the end time
/// to `now + window`, so active users stay logged in and idle sessions
/// expire one window after last use.
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn DataStore>,
    window: Duration,
}

impl SessionManager {
    pub fn new(store: Arc<dyn DataStore>, window_secs: i64) -> Self {
        Self {
            store,
            window: Duration::seconds(window_secs),
        }
    }

    /// Mints a new session for the user. Any still-active sessions are
    /// terminated together with the insert of the new record; a failure
    /// fails the whole creation.
    pub async fn create(&self, user_id: Uuid) -> Result<Session> {
        let now = Utc::now();
        let session = Session {
            id: Uuid::new_v4(),
            user_id,
            token: generate_session_token(),
            started_at: now,
            ends_at: now + self.window,
        };

        self.store.replace_user_sessions(&session).await?;
        tracing::info!(session_id = %session.id, user_id = %user_id, "created session");

        Ok(session)
    }

    /// Slides the expiry window. Returns `false` ("not active") when the
    /// session does not exist; that is not a hard error.
    pub async fn renew(&self, id: Uuid) -> Result<bool> {
        let new_end = Utc::now() + self.window;
        self.store.extend_session(id, new_end).await
    }

    pub async fn is_active(&self, id: Uuid) -> Result<bool> {
        let now = Utc::now();
        Ok(self
            .store
            .session_by_id(id)
            .await?
            .map(|s| s.is_active_at(now))
            .unwrap_or(false))
    }

    /// Sets the end time to now. A session that is already gone counts as
    /// terminated.
    pub async fn terminate(&self, id: Uuid) -> Result<()> {
        self.store.end_session(id).await
    }

    /// Looks up the session owning an opaque session token, the value
    /// embedded in issued bearer tokens.
    pub async fn resolve(&self, token: &str) -> Result<Option<Session>> {
        self.store.session_by_token(token).await
    }
}

fn generate_session_token() -> String {
    let mut rng = thread_rng();
    (0..32)
        .map(|_| {
            let idx = rng.gen_range(0..62);
            match idx {
                0..=25 => (b'a' + idx) as char,
                26..=51 => (b'A' + (idx - 26)) as char,
                _ => (b'0' + (idx - 52)) as char,
            }
        })
        .collect()
}
