// SPDX-License-Identifier: GPL-3.0-only

//! Camera device lifecycle manager
//!
//! The manager provides:
//! - Exclusive ownership of the single device handle
//! - Acquire/release as scoped operations (acquiring again releases first)
//! - Still capture: mirrored JPEG from the live frame
//!
//! Backend failures are classified into [`CameraErrorKind`] here and never
//! escape as errors; callers read them from [`CameraState`].

use super::types::*;
use super::{CameraBackend, CameraStream, get_backend_for_type};
use crate::config::Config;
use crate::errors::PhotoError;
use crate::pipelines::photo::{EncodedImage, PhotoPipeline, PostProcessingConfig};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Observable camera state
///
/// `ready` implies the manager holds an open stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CameraState {
    pub ready: bool,
    pub last_error: Option<CameraErrorKind>,
}

/// Camera device manager
pub struct CameraManager {
    backend: Arc<dyn CameraBackend>,
    request: StreamRequest,
    pipeline: PhotoPipeline,
    stream: Option<Box<dyn CameraStream>>,
    state: CameraState,
}

impl CameraManager {
    /// Create a manager for the camera described by `config`
    pub fn new(config: &Config) -> Self {
        let request = StreamRequest::new(config.camera_source)
            .with_device_path(config.device_path.clone());
        let pipeline = PhotoPipeline::with_config(
            PostProcessingConfig {
                mirror: config.mirror_capture,
            },
            config.jpeg_quality.into(),
        );

        Self::with_backend(get_backend_for_type(config.camera_source), request).with_pipeline(pipeline)
    }

    /// Create a manager around an explicit backend
    pub fn with_backend(backend: Arc<dyn CameraBackend>, request: StreamRequest) -> Self {
        info!(backend = %backend.backend_type(), "Creating camera manager");
        Self {
            backend,
            request,
            pipeline: PhotoPipeline::new(),
            stream: None,
            state: CameraState::default(),
        }
    }

    /// Replace the still-capture pipeline
    pub fn with_pipeline(mut self, pipeline: PhotoPipeline) -> Self {
        self.pipeline = pipeline;
        self
    }

    /// Open the capture device
    ///
    /// Any stream already held is released first. Opening runs on the
    /// blocking pool since it may wait on negotiation or a permission prompt.
    pub async fn acquire(&mut self) -> CameraState {
        self.release();

        let backend = Arc::clone(&self.backend);
        let request = self.request.clone();
        let result = tokio::task::spawn_blocking(move || backend.open(&request))
            .await
            .unwrap_or_else(|e| Err(BackendError::Other(format!("Camera open task error: {}", e))));

        match result {
            Ok(stream) => {
                info!(source = %self.backend.backend_type(), "Camera acquired");
                self.stream = Some(stream);
                self.state = CameraState {
                    ready: true,
                    last_error: None,
                };
            }
            Err(e) => {
                let kind = e.kind();
                warn!(error = %e, ?kind, "Camera acquisition failed");
                self.state = CameraState {
                    ready: false,
                    last_error: Some(kind),
                };
            }
        }

        self.state
    }

    /// Stop the device and clear the handle; no-op when nothing is held
    pub fn release(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            if let Err(e) = stream.stop() {
                warn!(error = %e, "Error stopping camera stream");
            }
            info!("Camera released");
        }
        self.state.ready = false;
    }

    /// Capture the current frame as a mirrored JPEG
    ///
    /// `Ok(None)` means the device has not produced a sized frame yet.
    pub async fn capture_frame(&self) -> Result<Option<EncodedImage>, PhotoError> {
        let Some(frame) = self.stream.as_ref().and_then(|s| s.latest_frame()) else {
            debug!("No frame available yet");
            return Ok(None);
        };
        if !frame.has_dimensions() {
            debug!("Frame has no dimensions yet");
            return Ok(None);
        }

        self.pipeline.encode_frame(frame).await.map(Some)
    }

    /// Receiver for a live preview surface, while the device is held
    pub fn preview_receiver(&self) -> Option<FrameReceiver> {
        self.stream.as_ref().map(|s| s.preview_receiver())
    }

    pub fn state(&self) -> CameraState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state.ready && self.stream.is_some()
    }

    pub fn source(&self) -> CameraSourceType {
        self.backend.backend_type()
    }
}

impl Drop for CameraManager {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for CameraManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CameraManager")
            .field("source", &self.backend.backend_type())
            .field("state", &self.state)
            .finish()
    }
}
