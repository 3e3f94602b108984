use axum::{extract::State, response::Json};

use crate::{
    errors::Result,
    handlers::AppState,
    models::{FileListResponse, UserContext},
    store::DataStore,
};

pub async fn list_files(
    State(state): State<AppState>,
    user: UserContext,
) -> Result<Json<FileListResponse>> {
    let files = state.store.files_by_user(user.id).await?;

    Ok(Json(FileListResponse {
        user_id: user.id,
        files,
    }))
}
