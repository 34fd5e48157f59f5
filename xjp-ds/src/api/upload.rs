//! Media upload endpoints
//!
//! - `POST /upload` (multipart field `image`): downscaled JPEG, `{url}`
//! - `POST /upload-audio` (multipart field `audio`): stored verbatim, `{url}`

use axum::{
    body::Bytes,
    extract::{multipart::MultipartError, Multipart, State},
    Json,
};
use serde::Serialize;
use tracing::warn;

use crate::error::{ApiError, ApiResult};
use crate::uploads;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub url: String,
}

struct UploadedFile {
    file_name: Option<String>,
    bytes: Bytes,
}

fn multipart_error(err: MultipartError) -> ApiError {
    ApiError::from_rejection(err.status(), err.body_text())
}

/// Pull the named file field out of the form; other fields are skipped.
async fn take_field(multipart: &mut Multipart, name: &str) -> ApiResult<UploadedFile> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(name) {
            continue;
        }
        let file_name = field.file_name().map(str::to_string);
        let bytes = field.bytes().await.map_err(multipart_error)?;
        if bytes.is_empty() {
            return Err(ApiError::NoFile);
        }
        return Ok(UploadedFile { file_name, bytes });
    }
    Err(ApiError::NoFile)
}

/// POST /upload
pub async fn upload_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<UploadResponse>> {
    let file = take_field(&mut multipart, "image").await?;
    let max_width = state.config.image_max_width;
    let quality = state.config.jpeg_quality;

    let jpeg = tokio::task::spawn_blocking(move || {
        uploads::reencode_jpeg(&file.bytes, max_width, quality)
    })
    .await
    .map_err(|e| ApiError::Internal(format!("image task failed: {}", e)))?
    .map_err(|e| {
        warn!("Rejected image upload: {}", e);
        ApiError::BadRequest(format!("invalid image: {}", e))
    })?;

    let url = uploads::store_image(&state.config.uploads_dir(), &jpeg).await?;
    Ok(Json(UploadResponse { url }))
}

/// POST /upload-audio
pub async fn upload_audio(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<UploadResponse>> {
    let file = take_field(&mut multipart, "audio").await?;
    let url = uploads::store_audio(
        &state.config.uploads_dir(),
        file.file_name.as_deref(),
        &file.bytes,
    )
    .await?;
    Ok(Json(UploadResponse { url }))
}
