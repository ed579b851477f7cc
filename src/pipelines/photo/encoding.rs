// SPDX-License-Identifier: GPL-3.0-only

//! JPEG encoding for booth photos
//!
//! Stills are always JPEG: the gallery backend only accepts `image/jpeg`.
//! Encoding runs on the blocking pool so the preview keeps flowing.

use super::processing::ProcessedImage;
use crate::errors::PhotoError;
use image::RgbImage;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Encoding quality settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EncodingQuality {
    /// Medium quality (balanced)
    Medium,
    /// High quality, what the booth uploads
    #[default]
    High,
    /// Maximum quality (minimal compression)
    Maximum,
    /// Explicit JPEG quality, clamped to 1-100
    Custom(u8),
}

impl EncodingQuality {
    /// Get JPEG quality value (1-100)
    pub fn jpeg_quality(&self) -> u8 {
        match self {
            EncodingQuality::Medium => 80,
            EncodingQuality::High => crate::constants::capture::JPEG_QUALITY,
            EncodingQuality::Maximum => 98,
            EncodingQuality::Custom(q) => (*q).clamp(1, 100),
        }
    }
}

impl From<u8> for EncodingQuality {
    fn from(quality: u8) -> Self {
        if quality == crate::constants::capture::JPEG_QUALITY {
            EncodingQuality::High
        } else {
            EncodingQuality::Custom(quality)
        }
    }
}

/// Encoded image data ready for upload or saving
#[derive(Debug, Clone)]
pub struct EncodedImage {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Filename for a photo captured at `millis` since the Unix epoch
pub fn photo_filename(millis: i64) -> String {
    format!("photo_{}.jpg", millis)
}

/// Filename for a photo captured now
pub fn timestamped_filename() -> String {
    photo_filename(chrono::Utc::now().timestamp_millis())
}

/// Photo encoder
#[derive(Debug, Clone, Default)]
pub struct PhotoEncoder {
    quality: EncodingQuality,
}

impl PhotoEncoder {
    /// Create a new encoder at high quality
    pub fn new() -> Self {
        Self::default()
    }

    /// Set encoding quality
    pub fn set_quality(&mut self, quality: EncodingQuality) {
        self.quality = quality;
    }

    pub fn quality(&self) -> EncodingQuality {
        self.quality
    }

    /// Encode a processed image asynchronously
    pub async fn encode(&self, processed: ProcessedImage) -> Result<EncodedImage, PhotoError> {
        info!(
            width = processed.width,
            height = processed.height,
            quality = self.quality.jpeg_quality(),
            "Starting encoding"
        );

        let quality = self.quality;
        tokio::task::spawn_blocking(move || Self::encode_blocking(processed, quality))
            .await
            .map_err(|e| PhotoError::EncodingFailed(format!("Encoding task error: {}", e)))?
    }

    /// Synchronous body of [`PhotoEncoder::encode`]
    pub fn encode_blocking(
        processed: ProcessedImage,
        quality: EncodingQuality,
    ) -> Result<EncodedImage, PhotoError> {
        let data = Self::encode_jpeg(&processed.image, quality)?;
        debug!(size = data.len(), "Encoding complete");

        Ok(EncodedImage {
            data,
            width: processed.width,
            height: processed.height,
        })
    }

    /// Save an encoded image into `output_dir` under a timestamped name
    pub async fn save(encoded: &EncodedImage, output_dir: &Path) -> Result<PathBuf, PhotoError> {
        let filepath = output_dir.join(timestamped_filename());
        Self::save_as(encoded, &filepath).await?;
        Ok(filepath)
    }

    /// Save an encoded image to an exact path
    pub async fn save_as(encoded: &EncodedImage, path: &Path) -> Result<(), PhotoError> {
        info!(path = %path.display(), "Saving photo");

        tokio::fs::write(path, &encoded.data)
            .await
            .map_err(|e| PhotoError::SaveFailed(format!("{}: {}", path.display(), e)))?;

        info!(path = %path.display(), bytes = encoded.data.len(), "Photo saved successfully");
        Ok(())
    }

    fn encode_jpeg(image: &RgbImage, quality: EncodingQuality) -> Result<Vec<u8>, PhotoError> {
        let mut buffer = Vec::new();
        let mut cursor = std::io::Cursor::new(&mut buffer);

        let mut encoder =
            image::codecs::jpeg::JpegEncoder::new_with_quality(&mut cursor, quality.jpeg_quality());

        encoder
            .encode(
                image.as_raw(),
                image.width(),
                image.height(),
                image::ExtendedColorType::Rgb8,
            )
            .map_err(|e| PhotoError::EncodingFailed(format!("JPEG encoding failed: {}", e)))?;

        Ok(buffer)
    }
}
