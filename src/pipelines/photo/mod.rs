// SPDX-License-Identifier: MPL-2.0

//! Async photo capture pipeline
//!
//! ```text
//! Camera frame (RGBA) → Post-Processing → JPEG Encoding → upload / disk
//!       ↓
//! Preview continues uninterrupted
//! ```
//!
//! # Pipeline Stages
//!
//! 1. **Post-Processing**: strip stride and alpha, mirror to match the preview
//! 2. **Encoding**: JPEG at the configured quality
//! 3. **Disk I/O**: only for the `probe` command; the booth uploads bytes

pub mod encoding;
pub mod processing;

pub use encoding::{EncodedImage, EncodingQuality, PhotoEncoder, photo_filename, timestamped_filename};
pub use processing::{PostProcessingConfig, PostProcessor};

use crate::backends::camera::types::CameraFrame;
use crate::errors::PhotoError;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Complete photo pipeline: process then encode
#[derive(Clone)]
pub struct PhotoPipeline {
    processing: PostProcessingConfig,
    encoder: PhotoEncoder,
}

impl PhotoPipeline {
    /// Create a new photo pipeline with default settings (mirrored, quality 92)
    pub fn new() -> Self {
        Self::with_config(PostProcessingConfig::default(), EncodingQuality::default())
    }

    /// Create a new photo pipeline with custom settings
    pub fn with_config(processing: PostProcessingConfig, quality: EncodingQuality) -> Self {
        let mut encoder = PhotoEncoder::new();
        encoder.set_quality(quality);
        Self { processing, encoder }
    }

    /// Turn a raw frame into JPEG bytes
    pub async fn encode_frame(&self, frame: Arc<CameraFrame>) -> Result<EncodedImage, PhotoError> {
        let processed = PostProcessor::new(self.processing.clone()).process(frame).await?;
        self.encoder.encode(processed).await
    }

    /// Encode a frame and write it into `output_dir`
    pub async fn capture_and_save(
        &self,
        frame: Arc<CameraFrame>,
        output_dir: &Path,
    ) -> Result<PathBuf, PhotoError> {
        let encoded = self.encode_frame(frame).await?;
        PhotoEncoder::save(&encoded, output_dir).await
    }

    pub fn mirror(&self) -> bool {
        self.processing.mirror
    }

    pub fn quality(&self) -> EncodingQuality {
        self.encoder.quality()
    }
}

impl Default for PhotoPipeline {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    fn solid_frame(width: u32, height: u32) -> Arc<CameraFrame> {
        Arc::new(CameraFrame {
            width,
            height,
            stride: width * 4,
            data: Arc::from(vec![128u8; (width * height * 4) as usize]),
            captured_at: Instant::now(),
        })
    }

    #[test]
    fn test_default_pipeline() {
        let pipeline = PhotoPipeline::new();
        assert!(pipeline.mirror());
        assert_eq!(pipeline.quality().jpeg_quality(), 92);
    }

    #[tokio::test]
    async fn test_encode_frame() {
        let encoded = PhotoPipeline::new().encode_frame(solid_frame(16, 8)).await.unwrap();
        assert_eq!((encoded.width, encoded.height), (16, 8));
        assert_eq!(&encoded.data[..2], &[0xFF, 0xD8]);
    }

    #[tokio::test]
    async fn test_capture_and_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = PhotoPipeline::new()
            .capture_and_save(solid_frame(4, 4), dir.path())
            .await
            .unwrap();
        assert!(path.exists());
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("jpg"));
    }
}
