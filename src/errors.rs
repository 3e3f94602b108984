use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Data store deadline exceeded")]
    StoreTimeout,

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Duplicate file")]
    DuplicateFile,

    #[error("Insufficient storage")]
    InsufficientStorage,

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Not found")]
    NotFound,

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Client errors carry a user-safe message plus a developer detail;
        // server errors return a generic message and log the real cause.
        let (status, error_message, detail) = match self {
            AppError::Database(ref e) => {
                tracing::error!("Database error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error", None)
            }
            AppError::StoreTimeout => {
                tracing::error!("Data store operation exceeded its deadline");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error", None)
            }
            AppError::Auth(ref msg) => {
                // Uniform body regardless of which check failed.
                tracing::debug!("Authentication rejected: {}", msg);
                (StatusCode::UNAUTHORIZED, "invalid token", None)
            }
            AppError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, "invalid username or password", None)
            }
            AppError::Validation(ref msg) => {
                (StatusCode::BAD_REQUEST, "invalid request", Some(msg.clone()))
            }
            AppError::DuplicateFile => (
                StatusCode::CONFLICT,
                "file already uploaded",
                Some("a file with identical content already exists for this user".to_string()),
            ),
            AppError::InsufficientStorage => (
                StatusCode::BAD_REQUEST,
                "insufficient storage",
                Some("upload exceeds the remaining storage quota".to_string()),
            ),
            AppError::Storage(ref msg) => {
                tracing::error!("Storage error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error", None)
            }
            AppError::NotFound => (StatusCode::NOT_FOUND, "Resource not found", None),
            AppError::Internal(ref e) => {
                tracing::error!("Internal error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error", None)
            }
        };

        let body = match detail {
            Some(detail) => Json(json!({
                "error": error_message,
                "detail": detail,
                "status": status.as_u16()
            })),
            None => Json(json!({
                "error": error_message,
                "status": status.as_u16()
            })),
        };

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
