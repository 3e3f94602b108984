use axum::{
    extract::{Multipart, State},
    response::Json,
};

use crate::{
    errors::{AppError, Result},
    handlers::AppState,
    models::{UploadResponse, UserContext},
    upload::HashingBuffer,
};

/// Accepts one multipart `file` field, buffering and hashing it in a single
/// pass before handing off to the upload pipeline.
pub async fn upload_file(
    State(state): State<AppState>,
    user: UserContext,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>> {
    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("invalid multipart form: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field
            .file_name()
            .map(|s| s.to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AppError::Validation("file field has no filename".to_string()))?;

        let mut data = HashingBuffer::new();
        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| AppError::Validation(format!("error reading file data: {}", e)))?
        {
            data.push(&chunk);
        }

        let file = state.uploads.ingest(&user, &filename, data).await?;

        return Ok(Json(UploadResponse {
            message: "file uploaded successfully".to_string(),
            filename: file.filename,
            user_id: user.id,
        }));
    }

    Err(AppError::Validation(
        "file not found in form data".to_string(),
    ))
}
