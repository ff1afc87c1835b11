//! Batched photo upload pipeline
//!
//! Uploads a list of images to object storage:
//! 1. Partition the files into sequential batches of `batch_size`
//! 2. Within a batch, compress and upload every file concurrently
//! 3. Wrap each storage write in exponential backoff retry
//! 4. Report progress after every completed batch
//!
//! The call returns stable storage paths, not signed URLs. Signed URLs are
//! resolved later by the read side, so upload time never bounds URL expiry.
//!
//! # Failure semantics
//! A failed file fails the whole call. Its batch is allowed to settle, then
//! the first failure in input order is returned and no later batch starts.
//! Files from the failed batch that did upload are logged as orphaned and
//! not returned.

pub mod naming;
pub mod progress;

pub use naming::{build_object_path, new_object_path, sanitize_file_name, validate_owner_id};
pub use progress::{batch_count, UploadProgress};

use crate::compression::ImageCompressor;
use crate::retry::{retry_with_backoff, RetryPolicy};
use crate::storage::{ObjectStore, PutOptions, StorageError};
use futures::future::join_all;
use rugdesk_common::config::UploadConfig;
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Default number of concurrent uploads per batch
pub const DEFAULT_BATCH_SIZE: usize = 4;

/// One source image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoFile {
    /// Original file name as provided by the client
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl PhotoFile {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: None,
            bytes,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

/// Upload pipeline errors
#[derive(Debug, Error)]
pub enum UploadError {
    /// Owner id cannot be used as a storage path segment
    #[error("Invalid owner id: {0:?}")]
    InvalidOwner(String),

    #[error("Compression failed for {file_name}: {message}")]
    Compression { file_name: String, message: String },

    /// Storage write failed after retries
    #[error("Upload failed for {file_name}: {source}")]
    Storage {
        file_name: String,
        source: StorageError,
    },

    /// Cancellation observed before launching the next batch
    #[error("Upload cancelled after {completed} of {total} files")]
    Cancelled { completed: usize, total: usize },
}

/// Batched, retrying photo uploader
pub struct PhotoUploader {
    store: Arc<dyn ObjectStore>,
    compressor: Arc<dyn ImageCompressor>,
    batch_size: usize,
    retry_policy: RetryPolicy,
}

impl PhotoUploader {
    pub fn new(store: Arc<dyn ObjectStore>, compressor: Arc<dyn ImageCompressor>) -> Self {
        Self {
            store,
            compressor,
            batch_size: DEFAULT_BATCH_SIZE,
            retry_policy: RetryPolicy::default(),
        }
    }

    pub fn from_config(
        store: Arc<dyn ObjectStore>,
        compressor: Arc<dyn ImageCompressor>,
        config: &UploadConfig,
    ) -> Self {
        Self::new(store, compressor)
            .with_batch_size(config.batch_size)
            .with_retry_policy(RetryPolicy::from_config(config))
    }

    /// Batch size, at least 1
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }

    /// Upload `files` for `owner_id`, logging progress.
    ///
    /// Empty input returns immediately without touching any collaborator.
    pub async fn upload_photos(
        &self,
        files: Vec<PhotoFile>,
        owner_id: &str,
    ) -> Result<Vec<String>, UploadError> {
        let never_cancelled = CancellationToken::new();
        self.upload_photos_with(files, owner_id, &never_cancelled, |progress| {
            debug!(
                completed = progress.completed,
                total = progress.total,
                batch = progress.current_batch,
                total_batches = progress.total_batches,
                "Upload progress"
            );
        })
        .await
    }

    /// Upload `files` for `owner_id`.
    ///
    /// # Arguments
    /// * `cancel` - Checked before each batch launches; in-flight batches
    ///   always settle
    /// * `on_progress` - Receives the initial snapshot and one snapshot per
    ///   completed batch
    ///
    /// # Returns
    /// Storage paths in input order
    pub async fn upload_photos_with<F>(
        &self,
        files: Vec<PhotoFile>,
        owner_id: &str,
        cancel: &CancellationToken,
        mut on_progress: F,
    ) -> Result<Vec<String>, UploadError>
    where
        F: FnMut(&UploadProgress),
    {
        if files.is_empty() {
            return Ok(Vec::new());
        }
        validate_owner_id(owner_id)?;

        let total = files.len();
        let total_batches = batch_count(total, self.batch_size);
        let mut progress = UploadProgress::start(total, total_batches);
        on_progress(&progress);

        info!(
            owner_id,
            total,
            total_batches,
            batch_size = self.batch_size,
            "Starting photo upload"
        );

        let mut paths = Vec::with_capacity(total);
        let mut remaining = files.into_iter().peekable();
        let mut batch_index = 0;

        while remaining.peek().is_some() {
            if cancel.is_cancelled() {
                warn!(
                    owner_id,
                    completed = progress.completed,
                    total,
                    "Photo upload cancelled before next batch"
                );
                return Err(UploadError::Cancelled {
                    completed: progress.completed,
                    total,
                });
            }

            let batch: Vec<PhotoFile> = remaining.by_ref().take(self.batch_size).collect();
            let batch_len = batch.len();
            batch_index += 1;

            let results = join_all(batch.into_iter().map(|file| self.upload_one(file, owner_id))).await;

            let mut batch_paths = Vec::with_capacity(batch_len);
            let mut first_error = None;
            for result in results {
                match result {
                    Ok(path) => batch_paths.push(path),
                    Err(e) => {
                        if first_error.is_none() {
                            first_error = Some(e);
                        }
                    }
                }
            }

            if let Some(err) = first_error {
                if !batch_paths.is_empty() {
                    warn!(
                        owner_id,
                        batch = batch_index,
                        orphaned = ?batch_paths,
                        "Objects uploaded by the failed batch are not returned"
                    );
                }
                error!(
                    owner_id,
                    batch = batch_index,
                    total_batches,
                    error = %err,
                    "Photo upload failed, aborting remaining batches"
                );
                return Err(err);
            }

            paths.extend(batch_paths);
            progress.record_batch(batch_index, batch_len);
            on_progress(&progress);
        }

        info!(owner_id, uploaded = paths.len(), "Photo upload complete");
        Ok(paths)
    }

    /// Compress then store one file under a fresh object path
    async fn upload_one(&self, file: PhotoFile, owner_id: &str) -> Result<String, UploadError> {
        let file_name = file.file_name.clone();

        let compressed = self
            .compressor
            .compress(file)
            .await
            .map_err(|e| UploadError::Compression {
                file_name: file_name.clone(),
                message: e.to_string(),
            })?;

        let path = new_object_path(owner_id, &compressed.file_name);
        let store = self.store.as_ref();
        let object_path = path.as_str();
        let bytes = &compressed.bytes;

        retry_with_backoff("object put", &self.retry_policy, move || {
            store.put(object_path, bytes.clone(), PutOptions::no_overwrite())
        })
        .await
        .map_err(|source| UploadError::Storage { file_name, source })
    }
}
