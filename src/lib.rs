use std::time::Duration;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

pub mod auth;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod session;
pub mod storage;
pub mod store;
pub mod upload;

pub use handlers::AppState;

pub fn create_app(state: AppState) -> Router {
    let request_timeout = Duration::from_secs(state.config.request_timeout_secs);

    Router::new()
        .route("/login", post(handlers::auth::login))
        .route("/register", post(handlers::auth::register))
        .route("/storage/remaining", get(handlers::user::remaining_storage))
        .route("/upload", post(handlers::upload::upload_file))
        .route("/files", get(handlers::files::list_files))
        .layer((
            TraceLayer::new_for_http(),
            // Bounds in-flight work so graceful shutdown drains within the
            // grace period instead of waiting on stuck requests.
            TimeoutLayer::new(request_timeout),
        ))
        .with_state(state)
}
