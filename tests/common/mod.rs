#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, Response, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use file_vault_server::{
    config::Config, create_app, handlers::AppState, storage::LocalStorage, store::MemoryStore,
};

pub const TEST_QUOTA_BYTES: i64 = 1_048_576;

pub fn test_app() -> (Router, TempDir) {
    let dir = TempDir::new().unwrap();
    let config = Config {
        port: 0,
        database_url: String::new(),
        jwt_secret: "test-secret".to_string(),
        storage_dir: dir.path().to_string_lossy().to_string(),
        default_quota_bytes: TEST_QUOTA_BYTES,
        session_window_secs: 3600,
        request_timeout_secs: 30,
    };

    let store = Arc::new(MemoryStore::new());
    let files = Arc::new(LocalStorage::new(dir.path()).unwrap());
    let state = AppState::new(store, files, config);

    (create_app(state), dir)
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn post_json(app: &Router, uri: &str, body: Value) -> Response<Body> {
    app.clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap()
}

pub async fn get_authed(app: &Router, uri: &str, token: &str) -> Response<Body> {
    app.clone()
        .oneshot(
            Request::builder()
                .uri(uri)
                .header("authorization", format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
}

pub async fn register(app: &Router, username: &str, password: &str) -> Response<Body> {
    post_json(
        app,
        "/register",
        json!({"username": username, "password": password, "name": username}),
    )
    .await
}

pub async fn login(app: &Router, username: &str, password: &str) -> String {
    let response = post_json(
        app,
        "/login",
        json!({"username": username, "password": password}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    body["token"].as_str().unwrap().to_string()
}

pub async fn upload(app: &Router, token: &str, filename: &str, content: &[u8]) -> Response<Body> {
    let boundary = "test-boundary-7MA4YWxkTrZu0gW";

    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; \
             filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    app.clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/upload")
                .header(
                    "content-type",
                    format!("multipart/form-data; boundary={boundary}"),
                )
                .header("authorization", format!("Bearer {}", token))
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap()
}
