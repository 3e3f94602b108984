use std::sync::Arc;

use crate::{
    auth::TokenService, config::Config, session::SessionManager, storage::FileStore,
    store::DataStore, upload::UploadPipeline,
};

pub mod auth;
pub mod files;
pub mod upload;
pub mod user;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DataStore>,
    pub files: Arc<dyn FileStore>,
    pub sessions: SessionManager,
    pub tokens: TokenService,
    pub uploads: UploadPipeline,
    pub config: Config,
}

impl AppState {
    pub fn new(store: Arc<dyn DataStore>, files: Arc<dyn FileStore>, config: Config) -> Self {
        let sessions = SessionManager::new(store.clone(), config.session_window_secs);
        let tokens = TokenService::new(&config.jwt_secret, config.session_window_secs);
        let uploads = UploadPipeline::new(store.clone(), files.clone());

        AppState {
            store,
            files,
            sessions,
            tokens,
            uploads,
            config,
        }
    }
}
