//! Test Helper Utilities
//!
//! Shared collaborators for testing rugdesk-photos

#![allow(dead_code)]

pub mod compressors;
pub mod stores;

pub use compressors::RecordingCompressor;
pub use stores::MemoryStore;

use rugdesk_photos::retry::RetryPolicy;
use rugdesk_photos::upload::PhotoFile;
use std::time::Duration;

/// `count` small fake photos named `photo-0.jpg`, `photo-1.jpg`, ...
pub fn photos(count: usize) -> Vec<PhotoFile> {
    (0..count)
        .map(|i| PhotoFile::new(format!("photo-{}.jpg", i), vec![i as u8; 16]))
        .collect()
}

/// Retry policy with millisecond backoff and no jitter
pub fn fast_retry(max_retries: u32) -> RetryPolicy {
    RetryPolicy::new(max_retries, Duration::from_millis(1)).with_max_jitter(Duration::ZERO)
}
