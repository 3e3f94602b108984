use axum::{
    extract::{rejection::JsonRejection, State},
    response::Json,
};
use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use crate::{
    auth::PasswordService,
    errors::{AppError, Result},
    handlers::AppState,
    models::{CreateUserRequest, LoginRequest, LoginResponse, User},
    store::DataStore,
};

pub async fn register(
    State(state): State<AppState>,
    payload: std::result::Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<Json<serde_json::Value>> {
    let Json(request) = payload
        .map_err(|e| AppError::Validation(format!("error decoding request body: {}", e)))?;

    if request.username.is_empty() || request.password.is_empty() {
        return Err(AppError::Validation(
            "username and password are required".to_string(),
        ));
    }

    // A taken username surfaces as a generic server error, not a 4xx.
    if state
        .store
        .user_by_username(&request.username)
        .await?
        .is_some()
    {
        return Err(AppError::Internal(anyhow::anyhow!(
            "user with username '{}' already exists",
            request.username
        )));
    }

    let user = User {
        id: Uuid::new_v4(),
        username: request.username,
        name: request.name,
        password_hash: PasswordService::hash_password(&request.password)?,
        quota_bytes: state.config.default_quota_bytes,
        used_bytes: 0,
        created_at: Utc::now(),
    };

    state.store.create_user(&user).await?;
    tracing::info!(user_id = %user.id, username = %user.username, "registered user");

    Ok(Json(json!({
        "message": "successfully added user"
    })))
}

pub async fn login(
    State(state): State<AppState>,
    payload: std::result::Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>> {
    let Json(request) = payload
        .map_err(|e| AppError::Validation(format!("error decoding request body: {}", e)))?;

    let user = state
        .store
        .user_by_username(&request.username)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    if !PasswordService::verify_password(&request.password, &user.password_hash)? {
        return Err(AppError::InvalidCredentials);
    }

    let session = state.sessions.create(user.id).await?;
    let token = state.tokens.issue(&user, &session.token)?;

    Ok(Json(LoginResponse {
        token,
        user_id: user.id,
    }))
}
