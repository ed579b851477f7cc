// SPDX-License-Identifier: GPL-3.0-only
// Shared types for camera backend abstraction

//! Shared types for camera backends

use crate::constants::resolution;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

/// Where camera frames come from
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum CameraSourceType {
    /// PipeWire if available, otherwise V4L2
    #[default]
    Auto,
    /// PipeWire camera portal (`pipewiresrc`)
    #[serde(rename = "pipewire")]
    #[value(name = "pipewire")]
    PipeWire,
    /// Direct V4L2 device access (`v4l2src`)
    V4l2,
    /// Synthetic test pattern (`videotestsrc`), for kiosks without a camera
    TestPattern,
}

impl CameraSourceType {
    /// Concrete sources in the order `Auto` tries them
    pub const AUTO_ORDER: [CameraSourceType; 2] =
        [CameraSourceType::PipeWire, CameraSourceType::V4l2];

    /// GStreamer element implementing this source (None for `Auto`)
    pub fn element_name(&self) -> Option<&'static str> {
        match self {
            CameraSourceType::Auto => None,
            CameraSourceType::PipeWire => Some("pipewiresrc"),
            CameraSourceType::V4l2 => Some("v4l2src"),
            CameraSourceType::TestPattern => Some("videotestsrc"),
        }
    }
}

impl std::fmt::Display for CameraSourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CameraSourceType::Auto => write!(f, "auto"),
            CameraSourceType::PipeWire => write!(f, "PipeWire"),
            CameraSourceType::V4l2 => write!(f, "V4L2"),
            CameraSourceType::TestPattern => write!(f, "test pattern"),
        }
    }
}

/// Frame dimensions in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// True when both dimensions are at least those of `other`
    pub fn covers(&self, other: &Resolution) -> bool {
        self.width >= other.width && self.height >= other.height
    }
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// What the kiosk asks of the capture device
///
/// Video only; the booth never records audio.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamRequest {
    pub source: CameraSourceType,
    /// Specific device (PipeWire serial/node or `/dev/videoN`); None = default camera
    pub device_path: Option<String>,
    pub ideal: Resolution,
    pub minimum: Resolution,
}

impl StreamRequest {
    /// Default request for the given source: ideal 1280x720, at least 640x480
    pub fn new(source: CameraSourceType) -> Self {
        Self {
            source,
            device_path: None,
            ideal: Resolution::new(resolution::IDEAL_WIDTH, resolution::IDEAL_HEIGHT),
            minimum: Resolution::new(resolution::MIN_WIDTH, resolution::MIN_HEIGHT),
        }
    }

    pub fn with_device_path(mut self, device_path: Option<String>) -> Self {
        self.device_path = device_path.filter(|p| !p.is_empty());
        self
    }
}

/// A single RGBA frame from the camera
#[derive(Debug, Clone)]
pub struct CameraFrame {
    pub width: u32,
    pub height: u32,
    /// Row stride in bytes (may include padding)
    pub stride: u32,
    /// RGBA pixel data
    pub data: Arc<[u8]>,
    /// When the frame left the pipeline
    pub captured_at: Instant,
}

impl CameraFrame {
    /// A frame without dimensions cannot be captured yet
    pub fn has_dimensions(&self) -> bool {
        self.width > 0 && self.height > 0
    }
}

/// Latest-frame receiver for live preview surfaces
pub type FrameReceiver = tokio::sync::watch::Receiver<Option<Arc<CameraFrame>>>;

/// Latest-frame sender owned by a running stream
pub type FrameSender = tokio::sync::watch::Sender<Option<Arc<CameraFrame>>>;

/// Why the camera could not be acquired
///
/// Closed set; every backend failure is mapped onto one of these once, at the
/// camera manager boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CameraErrorKind {
    /// Access refused; needs user action
    PermissionDenied,
    /// No capture device present
    DeviceNotFound,
    /// Held by another consumer; retry after it lets go
    DeviceBusy,
    /// Host lacks any usable capture source
    Unsupported,
    /// Anything else
    Unknown,
}

impl CameraErrorKind {
    /// Message shown on the greeting screen
    pub fn user_message(&self) -> &'static str {
        match self {
            CameraErrorKind::PermissionDenied => {
                "Camera access was denied. Please allow camera permission and refresh."
            }
            CameraErrorKind::DeviceNotFound => {
                "No camera found. Please connect a camera and try again."
            }
            CameraErrorKind::DeviceBusy => {
                "Camera is in use by another app. Close other apps using the camera."
            }
            CameraErrorKind::Unsupported => {
                "Camera capture is not supported on this system. Install the GStreamer PipeWire or V4L2 plugins."
            }
            CameraErrorKind::Unknown => {
                "Could not access camera. Please allow camera access and try again."
            }
        }
    }

    /// Whether retrying without outside intervention can succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, CameraErrorKind::DeviceBusy | CameraErrorKind::Unknown)
    }
}

impl std::fmt::Display for CameraErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CameraErrorKind::PermissionDenied => write!(f, "permission denied"),
            CameraErrorKind::DeviceNotFound => write!(f, "device not found"),
            CameraErrorKind::DeviceBusy => write!(f, "device busy"),
            CameraErrorKind::Unsupported => write!(f, "unsupported"),
            CameraErrorKind::Unknown => write!(f, "unknown"),
        }
    }
}

/// Result type for backend operations
pub type BackendResult<T> = Result<T, BackendError>;

/// Error types for backend operations
#[derive(Debug, Clone, thiserror::Error)]
pub enum BackendError {
    /// No source element for the requested backend
    #[error("Backend not available: {0}")]
    NotAvailable(String),
    /// Device refused access
    #[error("Permission denied: {0}")]
    PermissionDenied(String),
    /// Camera device not found
    #[error("Device not found: {0}")]
    DeviceNotFound(String),
    /// Device is held by someone else
    #[error("Device busy: {0}")]
    DeviceBusy(String),
    /// Failed to initialize the stream
    #[error("Initialization failed: {0}")]
    InitializationFailed(String),
    /// Other errors
    #[error("Error: {0}")]
    Other(String),
}

impl BackendError {
    /// Map onto the closed acquisition error set
    pub fn kind(&self) -> CameraErrorKind {
        match self {
            BackendError::NotAvailable(_) => CameraErrorKind::Unsupported,
            BackendError::PermissionDenied(_) => CameraErrorKind::PermissionDenied,
            BackendError::DeviceNotFound(_) => CameraErrorKind::DeviceNotFound,
            BackendError::DeviceBusy(_) => CameraErrorKind::DeviceBusy,
            BackendError::InitializationFailed(_) | BackendError::Other(_) => {
                CameraErrorKind::Unknown
            }
        }
    }
}
