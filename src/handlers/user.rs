use axum::response::Json;

use crate::{
    errors::Result,
    models::{StorageResponse, UserContext},
};

pub async fn remaining_storage(user: UserContext) -> Result<Json<StorageResponse>> {
    Ok(Json(StorageResponse {
        total: user.quota_bytes,
        used: user.used_bytes,
        remaining: user.quota_bytes - user.used_bytes,
    }))
}
