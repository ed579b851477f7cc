// SPDX-License-Identifier: MPL-2.0

//! Camera backend abstraction
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────┐
//! │ CaptureOrchestrator │
//! └──────────┬──────────┘
//!            │
//!            ▼
//! ┌─────────────────────┐
//! │    CameraManager    │  ← Owns the single device handle, acquire/release
//! └──────────┬──────────┘
//!            │
//!            ▼
//! ┌─────────────────────┐
//! │ CameraBackend Trait │  ← Opens a stream for a request
//! └──────────┬──────────┘
//!            │
//!            ▼
//!     ┌─────────────┐
//!     │  GStreamer  │  ← pipewiresrc / v4l2src / videotestsrc
//!     └─────────────┘
//! ```

pub mod gst_pipeline;
pub mod manager;
pub mod types;

pub use manager::{CameraManager, CameraState};
pub use types::*;

use std::sync::Arc;

/// Camera backend trait
///
/// A backend knows how to turn a [`StreamRequest`] into a running
/// [`CameraStream`]. Opening is blocking: it may wait on format negotiation
/// or a desktop permission prompt, so callers run it off the async thread.
pub trait CameraBackend: Send + Sync {
    /// Source this backend was created for
    fn backend_type(&self) -> CameraSourceType;

    /// Check if the backend can work on this system at all
    fn is_available(&self) -> bool;

    /// Open the capture device and start streaming
    ///
    /// # Returns
    /// * `Ok(stream)` - Device open, frames will start arriving
    /// * `Err(BackendError)` - Tagged failure (permission, not found, busy, ...)
    fn open(&self, request: &StreamRequest) -> BackendResult<Box<dyn CameraStream>>;
}

/// A running capture stream: the device handle
///
/// Dropping a stream must release the device.
pub trait CameraStream: Send + Sync {
    /// Most recent frame, if any has arrived yet
    fn latest_frame(&self) -> Option<Arc<CameraFrame>>;

    /// Receiver for live preview surfaces
    fn preview_receiver(&self) -> FrameReceiver;

    /// Stop all tracks and release the device
    fn stop(&mut self) -> BackendResult<()>;
}

/// Get a backend instance for a source type
pub fn get_backend_for_type(source: CameraSourceType) -> Arc<dyn CameraBackend> {
    Arc::new(gst_pipeline::GStreamerBackend::new(source))
}
