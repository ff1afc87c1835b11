//! Object storage collaborator
//!
//! The upload pipeline only needs `put` with no-overwrite semantics. The
//! read side resolves stable object paths into time-limited signed URLs on
//! demand, so URL expiry never depends on when a photo was uploaded.

pub mod local;

pub use local::LocalObjectStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

/// Object storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    /// An object already exists at the path and overwrite was not allowed
    #[error("Object already exists: {0}")]
    Conflict(String),

    /// Transient transport failure talking to the store
    #[error("Network error: {0}")]
    Network(String),

    /// Path is empty, absolute, or escapes the store
    #[error("Invalid object path: {0}")]
    InvalidPath(String),

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Options for a single put
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PutOptions {
    /// Replace an existing object instead of failing with `Conflict`
    pub overwrite: bool,
}

impl PutOptions {
    pub fn no_overwrite() -> Self {
        Self { overwrite: false }
    }
}

/// Time-limited URL to a stored object
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignedUrl {
    pub url: String,
    pub expires_at: DateTime<Utc>,
}

/// Object storage collaborator contract
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `bytes` at `path`, returning the stored path
    async fn put(
        &self,
        path: &str,
        bytes: Vec<u8>,
        options: PutOptions,
    ) -> Result<String, StorageError>;

    /// Produce a URL granting read access to `path` for `ttl`
    async fn sign(&self, path: &str, ttl: Duration) -> Result<SignedUrl, StorageError>;
}

/// Reject paths that are empty, absolute, or contain `.`/`..` segments.
///
/// Returns the path split into its segments.
pub fn validate_object_path(path: &str) -> Result<Vec<&str>, StorageError> {
    if path.is_empty() || path.starts_with('/') || path.contains('\\') {
        return Err(StorageError::InvalidPath(path.to_string()));
    }

    let segments: Vec<&str> = path.split('/').collect();
    if segments
        .iter()
        .any(|segment| segment.is_empty() || *segment == "." || *segment == "..")
    {
        return Err(StorageError::InvalidPath(path.to_string()));
    }

    Ok(segments)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_accepts_nested_paths() {
        let segments = validate_object_path("acme/1700000000000-abc123-rug.jpg").unwrap();
        assert_eq!(segments, vec!["acme", "1700000000000-abc123-rug.jpg"]);
    }

    #[test]
    fn test_validate_rejects_escapes() {
        for path in ["", "/etc/passwd", "acme/../secret", "acme//rug.jpg", "./rug.jpg", "a\\b"] {
            assert!(
                matches!(validate_object_path(path), Err(StorageError::InvalidPath(_))),
                "accepted {path:?}"
            );
        }
    }
}
