use anyhow::Result;
use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub jwt_secret: String,
    pub storage_dir: String,
    pub default_quota_bytes: i64,
    pub session_window_secs: i64,
    pub request_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Config {
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()?,
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgresql://localhost/file_vault".to_string()),
            jwt_secret: env::var("JWT_SECRET")
                .unwrap_or_else(|_| "supersecretkey".to_string()),
            storage_dir: env::var("STORAGE_DIR")
                .unwrap_or_else(|_| "./storage".to_string()),
            default_quota_bytes: env::var("DEFAULT_QUOTA_BYTES")
                .unwrap_or_else(|_| "1073741824".to_string()) // 1GB
                .parse()?,
            session_window_secs: env::var("SESSION_WINDOW_SECS")
                .unwrap_or_else(|_| "3600".to_string()) // 1 hour
                .parse()?,
            request_timeout_secs: env::var("REQUEST_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()?,
        })
    }
}
