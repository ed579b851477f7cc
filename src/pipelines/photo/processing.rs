// SPDX-License-Identifier: MPL-2.0

//! Post-processing for captured frames
//!
//! Turns a strided RGBA camera frame into a tightly packed RGB image and,
//! when the preview is shown mirrored, flips it so the still matches what the
//! guest saw on screen.

use crate::backends::camera::types::CameraFrame;
use crate::errors::PhotoError;
use image::RgbImage;
use std::sync::Arc;
use tracing::{debug, info};

/// Post-processing configuration
#[derive(Debug, Clone)]
pub struct PostProcessingConfig {
    /// Flip horizontally to match a mirrored live preview
    pub mirror: bool,
}

impl Default for PostProcessingConfig {
    fn default() -> Self {
        Self { mirror: true }
    }
}

/// Processed image data
pub struct ProcessedImage {
    pub image: RgbImage,
    pub width: u32,
    pub height: u32,
}

/// Post-processor for captured frames
pub struct PostProcessor {
    config: PostProcessingConfig,
}

impl PostProcessor {
    /// Create a new post-processor with the given configuration
    pub fn new(config: PostProcessingConfig) -> Self {
        Self { config }
    }

    /// Process a captured frame on the blocking pool
    pub async fn process(&self, frame: Arc<CameraFrame>) -> Result<ProcessedImage, PhotoError> {
        info!(
            width = frame.width,
            height = frame.height,
            mirror = self.config.mirror,
            "Starting post-processing"
        );

        let config = self.config.clone();
        tokio::task::spawn_blocking(move || Self::process_blocking(&frame, &config))
            .await
            .map_err(|e| PhotoError::EncodingFailed(format!("Post-processing task error: {}", e)))?
    }

    /// Synchronous body of [`PostProcessor::process`]
    pub fn process_blocking(
        frame: &CameraFrame,
        config: &PostProcessingConfig,
    ) -> Result<ProcessedImage, PhotoError> {
        if !frame.has_dimensions() {
            return Err(PhotoError::NoFrameAvailable);
        }

        let mut image = Self::convert_rgba_to_rgb(&frame.data, frame.width, frame.height, frame.stride)?;
        if config.mirror {
            image::imageops::flip_horizontal_in_place(&mut image);
        }

        debug!("Post-processing complete");
        Ok(ProcessedImage {
            width: frame.width,
            height: frame.height,
            image,
        })
    }

    /// Convert strided RGBA data to an RGB image (drop alpha channel)
    fn convert_rgba_to_rgb(
        rgba_data: &[u8],
        width: u32,
        height: u32,
        stride: u32,
    ) -> Result<RgbImage, PhotoError> {
        let row_bytes = width as usize * 4;
        let stride = (stride as usize).max(row_bytes);
        let expected_size = stride * (height as usize - 1) + row_bytes;
        if rgba_data.len() < expected_size {
            return Err(PhotoError::InvalidFrame(format!(
                "RGBA data too small: expected {}, got {}",
                expected_size,
                rgba_data.len()
            )));
        }

        let rgb_data: Vec<u8> = rgba_data
            .chunks(stride)
            .take(height as usize)
            .flat_map(|row| {
                row[..row_bytes]
                    .chunks_exact(4)
                    .flat_map(|rgba| [rgba[0], rgba[1], rgba[2]])
            })
            .collect();

        RgbImage::from_raw(width, height, rgb_data).ok_or_else(|| {
            PhotoError::InvalidFrame("Failed to create RGB image from converted data".into())
        })
    }
}
