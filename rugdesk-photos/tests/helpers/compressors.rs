//! Compressor that records what it was asked to compress

use async_trait::async_trait;
use rugdesk_photos::compression::{CompressionError, ImageCompressor};
use rugdesk_photos::upload::PhotoFile;
use std::sync::Mutex;

/// Returns files unchanged and remembers their names
#[derive(Default)]
pub struct RecordingCompressor {
    seen: Mutex<Vec<String>>,
    fail_on: Option<String>,
}

impl RecordingCompressor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail for the file with exactly this name
    pub fn failing_on(file_name: &str) -> Self {
        Self {
            seen: Mutex::new(Vec::new()),
            fail_on: Some(file_name.to_string()),
        }
    }

    /// File names compressed so far, in call order
    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageCompressor for RecordingCompressor {
    async fn compress(&self, file: PhotoFile) -> Result<PhotoFile, CompressionError> {
        self.seen.lock().unwrap().push(file.file_name.clone());

        if self.fail_on.as_deref() == Some(file.file_name.as_str()) {
            return Err(CompressionError::Encode {
                file_name: file.file_name,
                message: "scripted failure".to_string(),
            });
        }
        Ok(file)
    }
}
