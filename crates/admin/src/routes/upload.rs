//! Image upload handler.

use axum::{
    Json,
    extract::{Multipart, State},
};
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::models::UploadResponse;
use crate::state::AppState;

/// Store the multipart `file` field and return its URL.
#[instrument(skip(state, multipart))]
pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().unwrap_or("image").to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("Failed to read upload: {e}")))?;

        let url = state.uploader().store(&file_name, bytes.to_vec()).await?;
        return Ok(Json(UploadResponse { success: true, url }));
    }

    Err(AppError::BadRequest("No file uploaded".to_string()))
}
