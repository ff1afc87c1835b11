//! Photo upload and signing endpoints
//!
//! POST /api/photos/sign, POST /api/photos/:owner_id
//!
//! `sign` is matched before the owner route, so "sign" is not usable as an
//! owner id over HTTP.

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{ApiError, ApiResult};
use crate::storage::{ObjectStore, SignedUrl};
use crate::upload::{PhotoFile, UploadProgress};
use crate::AppState;

/// Request body limit for multipart uploads (64 MB)
pub const MAX_UPLOAD_BODY_BYTES: usize = 64 * 1024 * 1024;

/// POST /api/photos/:owner_id response
#[derive(Debug, Serialize)]
pub struct UploadPhotosResponse {
    /// Storage paths in upload order
    pub paths: Vec<String>,
    /// Snapshots reported while uploading
    pub progress: Vec<UploadProgress>,
}

/// POST /api/photos/sign request
#[derive(Debug, Deserialize)]
pub struct SignRequest {
    pub path: String,
    /// Defaults to the configured TTL
    pub ttl_seconds: Option<u64>,
}

/// POST /api/photos/:owner_id
///
/// Every multipart field carrying a file name is uploaded; other fields
/// are ignored.
pub async fn upload_photos(
    State(state): State<AppState>,
    Path(owner_id): Path<String>,
    mut multipart: Multipart,
) -> ApiResult<Json<UploadPhotosResponse>> {
    let mut files = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Malformed multipart body: {}", e)))?
    {
        let Some(file_name) = field.file_name().map(str::to_string) else {
            continue;
        };
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Failed to read {}: {}", file_name, e)))?;

        let mut file = PhotoFile::new(file_name, bytes.to_vec());
        if let Some(content_type) = content_type {
            file = file.with_content_type(content_type);
        }
        files.push(file);
    }

    tracing::info!(owner_id = %owner_id, files = files.len(), "Photo upload request received");

    let mut progress = Vec::new();
    let result = state
        .uploader
        .upload_photos_with(files, &owner_id, &state.shutdown, |snapshot| {
            progress.push(*snapshot)
        })
        .await;

    match result {
        Ok(paths) => {
            *state.last_error.write().await = None;
            Ok(Json(UploadPhotosResponse { paths, progress }))
        }
        Err(e) => {
            *state.last_error.write().await = Some(e.to_string());
            Err(e.into())
        }
    }
}

/// POST /api/photos/sign
pub async fn sign_photo(
    State(state): State<AppState>,
    Json(request): Json<SignRequest>,
) -> ApiResult<Json<SignedUrl>> {
    let ttl = request
        .ttl_seconds
        .map(Duration::from_secs)
        .unwrap_or(state.default_ttl);
    if ttl.is_zero() {
        return Err(ApiError::BadRequest("ttl_seconds must be positive".to_string()));
    }

    let signed = state.store.sign(&request.path, ttl).await?;
    Ok(Json(signed))
}

/// Build photo routes
pub fn photo_routes() -> Router<AppState> {
    Router::new()
        .route("/api/photos/sign", post(sign_photo))
        .route(
            "/api/photos/:owner_id",
            post(upload_photos).layer(DefaultBodyLimit::max(MAX_UPLOAD_BODY_BYTES)),
        )
}
