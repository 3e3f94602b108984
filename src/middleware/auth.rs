use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use chrono::Utc;
use uuid::Uuid;

use crate::{errors::AppError, handlers::AppState, models::UserContext, store::DataStore};

/// The sole gate in front of protected handlers. Verifies the bearer token,
/// resolves its embedded session token to a live session, slides the session
/// window, and re-loads the user record. Handlers receive the resulting
/// identity as an explicit argument.
///
/// Every failure maps to the same 401 response; callers never learn whether
/// the signature, the expiry, the session or the user lookup rejected them.
#[async_trait]
impl FromRequestParts<AppState> for UserContext {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|header| header.to_str().ok())
            .ok_or_else(|| AppError::Auth("missing Authorization header".to_string()))?;

        let mut parts_iter = auth_header.splitn(2, ' ');
        let scheme = parts_iter.next().unwrap_or_default();
        let token = parts_iter
            .next()
            .ok_or_else(|| AppError::Auth("token not Bearer".to_string()))?;
        if !scheme.eq_ignore_ascii_case("bearer") {
            return Err(AppError::Auth("token not Bearer".to_string()));
        }

        let claims = state.tokens.verify(token)?;

        // Store failures during authentication are reported as 401 like any
        // other auth failure, not as server errors.
        let session = state
            .sessions
            .resolve(&claims.data.token)
            .await
            .map_err(|e| AppError::Auth(format!("session resolution failed: {}", e)))?
            .ok_or_else(|| AppError::Auth("session not found for token".to_string()))?;

        if !session.is_active_at(Utc::now()) {
            return Err(AppError::Auth("user session is not active".to_string()));
        }

        // Every successful authentication extends the session.
        let renewed = state
            .sessions
            .renew(session.id)
            .await
            .map_err(|e| AppError::Auth(format!("session renewal failed: {}", e)))?;
        if !renewed {
            return Err(AppError::Auth("session expired during renewal".to_string()));
        }

        let user_id = Uuid::parse_str(&claims.iss)
            .map_err(|_| AppError::Auth("invalid issuer in token".to_string()))?;

        let user = state
            .store
            .user_by_id(user_id)
            .await
            .map_err(|e| AppError::Auth(format!("user lookup failed: {}", e)))?
            .ok_or_else(|| AppError::Auth("user not found".to_string()))?;

        Ok(UserContext::from(&user))
    }
}
