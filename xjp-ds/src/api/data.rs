//! Document read/write endpoints
//!
//! `GET /data` returns the stored document and `POST /data` overwrites it.
//! Media fields are cut back to relative `/uploads/...` paths in both
//! directions, so stale absolute URLs in old documents never reach clients.

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    Json,
};
use serde_json::{json, Value};
use tracing::info;
use xjp_common::media::relativize_document;
use xjp_common::Document;

use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// GET /data
pub async fn get_data(State(state): State<AppState>) -> ApiResult<Json<Document>> {
    let mut document = state.repository.read().await?;
    relativize_document(&mut document);
    Ok(Json(document))
}

/// POST /data
///
/// The body must be a JSON object; individual malformed records are dropped
/// by the lenient decoder rather than failing the save.
pub async fn post_data(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> ApiResult<Json<Value>> {
    let body = body.map_err(|r| ApiError::from_rejection(r.status(), r.body_text()))?;
    let value: Value = serde_json::from_slice(&body)
        .map_err(|e| ApiError::BadRequest(format!("invalid JSON: {}", e)))?;
    if !value.is_object() {
        return Err(ApiError::BadRequest(
            "document must be a JSON object".to_string(),
        ));
    }

    let mut document = Document::from_value_lenient(value);
    relativize_document(&mut document);
    state.repository.write(&document).await?;

    info!(
        members = document.members.len(),
        singles = document.singles.len(),
        posts = document.posts.len(),
        "Document saved"
    );
    Ok(Json(json!({ "ok": true })))
}
