//! Media route handlers.
//!
//! Staff upload catalog images as multipart form data; the payload is checked
//! locally (content type, size) and forwarded to the media-storage service,
//! whose asset ID and public URL come back in the response.

use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::StatusCode,
};
use serde::Serialize;
use tracing::instrument;

use crate::error::{ApiError, Result};
use crate::middleware::RequireStaff;
use crate::services::media::validate_upload;
use crate::state::AppState;

/// Response for a stored image.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    /// Stable asset identifier, used for deletion.
    pub asset_id: String,
    /// Public URL serving the asset.
    pub url: String,
}

/// Upload an image.
///
/// POST /api/v1/media/images (multipart, `file` part)
#[instrument(skip(state, multipart))]
pub async fn upload(
    RequireStaff(_): RequireStaff,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>)> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("malformed multipart body: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().unwrap_or("upload").to_owned();
        let content_type = field
            .content_type()
            .ok_or_else(|| ApiError::BadRequest("file part has no content type".to_owned()))?
            .to_owned();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("failed to read file part: {e}")))?;

        validate_upload(&content_type, bytes.len()).map_err(ApiError::BadRequest)?;

        let asset = state
            .media()
            .upload_image(&file_name, &content_type, bytes.to_vec())
            .await?;

        tracing::info!(asset_id = %asset.asset_id, "Image uploaded");
        return Ok((
            StatusCode::CREATED,
            Json(UploadResponse {
                asset_id: asset.asset_id,
                url: asset.url,
            }),
        ));
    }

    Err(ApiError::BadRequest("missing 'file' part".to_owned()))
}

/// Delete an image by asset ID.
///
/// DELETE /api/v1/media/images/{asset_id}
#[instrument(skip(state))]
pub async fn remove(
    RequireStaff(_): RequireStaff,
    State(state): State<AppState>,
    Path(asset_id): Path<String>,
) -> Result<StatusCode> {
    state.media().delete_image(&asset_id).await?;
    tracing::info!(%asset_id, "Image deleted");
    Ok(StatusCode::NO_CONTENT)
}
