//! Pre-upload image compression
//!
//! Phone photos of rugs routinely arrive at 12+ megapixels. Before upload
//! they are downscaled to a bounded longest side and re-encoded as JPEG at a
//! fixed quality target. A compressor never makes a file bigger: if the
//! re-encoded output is not smaller, the original is kept.

use async_trait::async_trait;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use rugdesk_common::config::CompressionConfig;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

use crate::upload::PhotoFile;

/// Compression errors
#[derive(Debug, Error)]
pub enum CompressionError {
    /// Encoding the downscaled image failed
    #[error("Encode failed for {file_name}: {message}")]
    Encode { file_name: String, message: String },

    /// Blocking worker panicked or was cancelled
    #[error("Compression task failed: {0}")]
    Task(String),
}

/// Image compression collaborator contract
///
/// Returns a file with the same logical content that is never larger than
/// the input.
#[async_trait]
pub trait ImageCompressor: Send + Sync {
    async fn compress(&self, file: PhotoFile) -> Result<PhotoFile, CompressionError>;
}

/// Returns every file unchanged
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughCompressor;

#[async_trait]
impl ImageCompressor for PassthroughCompressor {
    async fn compress(&self, file: PhotoFile) -> Result<PhotoFile, CompressionError> {
        Ok(file)
    }
}

/// Downscale + JPEG re-encode compressor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JpegCompressor {
    /// Longest side after downscaling, in pixels
    pub max_dimension: u32,
    /// JPEG quality (1-100)
    pub quality: u8,
}

impl Default for JpegCompressor {
    fn default() -> Self {
        Self {
            max_dimension: 2048,
            quality: 80,
        }
    }
}

impl JpegCompressor {
    pub fn new(max_dimension: u32, quality: u8) -> Self {
        Self {
            max_dimension: max_dimension.max(1),
            quality: quality.clamp(1, 100),
        }
    }

    /// Synchronous compression; CPU bound, call from a blocking context
    pub fn compress_blocking(&self, file: PhotoFile) -> Result<PhotoFile, CompressionError> {
        let image = match image::load_from_memory(&file.bytes) {
            Ok(image) => image,
            Err(e) => {
                warn!(
                    file_name = %file.file_name,
                    error = %e,
                    "Could not decode image, uploading original"
                );
                return Ok(file);
            }
        };

        let (width, height) = (image.width(), image.height());
        let image = if width.max(height) > self.max_dimension {
            image.resize(self.max_dimension, self.max_dimension, FilterType::Lanczos3)
        } else {
            image
        };

        let mut encoded = Vec::new();
        JpegEncoder::new_with_quality(&mut encoded, self.quality)
            .encode_image(&image.to_rgb8())
            .map_err(|e| CompressionError::Encode {
                file_name: file.file_name.clone(),
                message: e.to_string(),
            })?;

        if encoded.len() >= file.bytes.len() {
            debug!(
                file_name = %file.file_name,
                original = file.bytes.len(),
                compressed = encoded.len(),
                "Compressed output not smaller, keeping original"
            );
            return Ok(file);
        }

        debug!(
            file_name = %file.file_name,
            original = file.bytes.len(),
            compressed = encoded.len(),
            width = image.width(),
            height = image.height(),
            "Image compressed"
        );

        Ok(PhotoFile {
            file_name: with_jpeg_extension(&file.file_name),
            content_type: Some("image/jpeg".to_string()),
            bytes: encoded,
        })
    }
}

#[async_trait]
impl ImageCompressor for JpegCompressor {
    async fn compress(&self, file: PhotoFile) -> Result<PhotoFile, CompressionError> {
        let compressor = *self;
        tokio::task::spawn_blocking(move || compressor.compress_blocking(file))
            .await
            .map_err(|e| CompressionError::Task(e.to_string()))?
    }
}

/// Build the compressor described by the configuration
pub fn compressor_from_config(config: &CompressionConfig) -> Arc<dyn ImageCompressor> {
    if config.enabled {
        Arc::new(JpegCompressor::new(config.max_dimension, config.jpeg_quality))
    } else {
        Arc::new(PassthroughCompressor)
    }
}

/// Replace the extension of `file_name` with `.jpg`
fn with_jpeg_extension(file_name: &str) -> String {
    let stem = match file_name.rfind('.') {
        Some(index) if index > 0 => &file_name[..index],
        _ => file_name,
    };
    format!("{stem}.jpg")
}
