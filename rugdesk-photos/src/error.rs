//! Error types for rugdesk-photos HTTP handlers

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::storage::StorageError;
use crate::upload::UploadError;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Conflict (409) - object already exists
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// Upload pipeline failure
    #[error(transparent)]
    Upload(#[from] UploadError),

    /// Object storage failure
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// rugdesk-common error
    #[error("Common error: {0}")]
    Common(#[from] rugdesk_common::Error),
}

fn storage_status(err: &StorageError) -> (StatusCode, &'static str) {
    match err {
        StorageError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
        StorageError::InvalidPath(_) => (StatusCode::BAD_REQUEST, "INVALID_PATH"),
        StorageError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
        StorageError::Network(_) => (StatusCode::BAD_GATEWAY, "STORAGE_UNAVAILABLE"),
        StorageError::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "IO_ERROR"),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg),
            ApiError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                msg,
            ),
            ApiError::Upload(ref err) => {
                let (status, code) = match err {
                    UploadError::InvalidOwner(_) => (StatusCode::BAD_REQUEST, "INVALID_OWNER"),
                    UploadError::Compression { .. } => {
                        (StatusCode::UNPROCESSABLE_ENTITY, "COMPRESSION_FAILED")
                    }
                    UploadError::Storage { source, .. } => storage_status(source),
                    UploadError::Cancelled { .. } => {
                        (StatusCode::SERVICE_UNAVAILABLE, "UPLOAD_CANCELLED")
                    }
                };
                (status, code, err.to_string())
            }
            ApiError::Storage(ref err) => {
                let (status, code) = storage_status(err);
                (status, code, err.to_string())
            }
            ApiError::Common(ref err) => {
                let (status, code) = match err {
                    rugdesk_common::Error::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
                    rugdesk_common::Error::InvalidInput(_) => {
                        (StatusCode::BAD_REQUEST, "BAD_REQUEST")
                    }
                    _ => (StatusCode::INTERNAL_SERVER_ERROR, "COMMON_ERROR"),
                };
                (status, code, err.to_string())
            }
        };

        if status.is_server_error() {
            tracing::error!(code = error_code, message = %message, "Request failed");
        }

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
