//! Product image upload and removal.
//!
//! Uploads are the raw request body; the extension comes from the query
//! string (`?ext=png`). The returned URL is what the client stores as the
//! product's `imageUrl`.

use axum::body::Bytes;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use stockly_core::Session;
use tracing::warn;

use crate::error::ApiResult;
use crate::session::CurrentUser;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct UploadParams {
    pub ext: String,
}

#[derive(Debug, Deserialize)]
pub struct DeleteParams {
    pub url: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedImageDto {
    pub url: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedImageDto {
    pub deleted: bool,
}

/// `POST /api/products/images?ext=png`
pub async fn upload_image(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    params: Result<Query<UploadParams>, QueryRejection>,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<UploadedImageDto>)> {
    let Query(params) = params?;
    let url = state.blobs.upload(&session, &params.ext, &body).await?;
    Ok((StatusCode::CREATED, Json(UploadedImageDto { url })))
}

/// `DELETE /api/products/images?url=...`
pub async fn delete_image(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    params: Result<Query<DeleteParams>, QueryRejection>,
) -> ApiResult<Json<DeletedImageDto>> {
    let Query(params) = params?;
    let deleted = state.blobs.delete(&session, &params.url).await?;
    Ok(Json(DeletedImageDto { deleted }))
}

/// Removes an image that no product points at any more. Failures are logged.
pub(crate) async fn discard_image(state: &AppState, session: &Session, url: &str) {
    if let Err(e) = state.blobs.delete(session, url).await {
        warn!(user_id = %session.user_id, url = %url, error = %e, "Failed to delete product image");
    }
}
