//! Signed object download
//!
//! GET /objects/*path?expires=..&signature=..

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
    routing::get,
    Router,
};
use chrono::Utc;
use serde::Deserialize;

use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SignedQuery {
    pub expires: i64,
    pub signature: String,
}

/// GET /objects/*path
///
/// Bad, expired and missing links all answer 404 so a caller cannot test
/// which objects exist.
pub async fn get_object(
    State(state): State<AppState>,
    Path(path): Path<String>,
    Query(query): Query<SignedQuery>,
) -> ApiResult<impl IntoResponse> {
    if !state
        .store
        .verify(&path, query.expires, &query.signature, Utc::now())
    {
        tracing::debug!(path = %path, "Rejected unsigned or expired object request");
        return Err(ApiError::NotFound(path));
    }

    let bytes = state.store.read(&path).await.map_err(|e| {
        tracing::debug!(path = %path, error = %e, "Signed object unavailable");
        ApiError::NotFound(path.clone())
    })?;

    Ok(([(header::CONTENT_TYPE, content_type_for(&path))], bytes))
}

/// Content type guessed from the file extension
fn content_type_for(path: &str) -> &'static str {
    let extension = path
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "heic" => "image/heic",
        _ => "application/octet-stream",
    }
}

/// Build object download routes
pub fn object_routes() -> Router<AppState> {
    Router::new().route("/objects/*path", get(get_object))
}
