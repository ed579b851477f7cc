// SPDX-License-Identifier: MPL-2.0

//! Read-only state handed to presentation surfaces

use crate::api::CaptureSession;
use crate::backends::camera::CameraErrorKind;
use crate::pipelines::photo::EncodedImage;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Top-level flow phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// Idle, camera live, waiting for a guest
    #[default]
    Greeting,
    /// A run is in progress
    Capturing,
    /// Run finished, photos and gallery link shown
    Review,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Greeting => write!(f, "greeting"),
            Stage::Capturing => write!(f, "capturing"),
            Stage::Review => write!(f, "review"),
        }
    }
}

/// Why the booth is not where the guest expected
///
/// Closed set shown in snapshots. Camera kinds come from the camera manager's
/// classification; the rest are raised by the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
pub enum BoothError {
    #[error("camera permission denied")]
    PermissionDenied,
    #[error("no camera found")]
    DeviceNotFound,
    #[error("camera busy")]
    DeviceBusy,
    #[error("camera capture unsupported")]
    Unsupported,
    #[error("camera unavailable")]
    CameraUnavailable,
    #[error("capture failed")]
    CaptureFailed,
    #[error("session creation failed")]
    SessionCreateFailed,
    #[error("upload failed")]
    UploadFailed,
    /// A run is already in progress
    #[error("capture already in progress")]
    Busy,
    #[error("capture cancelled")]
    Cancelled,
}

impl BoothError {
    /// Text for the guest
    pub fn user_message(&self) -> &'static str {
        match self {
            BoothError::PermissionDenied => CameraErrorKind::PermissionDenied.user_message(),
            BoothError::DeviceNotFound => CameraErrorKind::DeviceNotFound.user_message(),
            BoothError::DeviceBusy => CameraErrorKind::DeviceBusy.user_message(),
            BoothError::Unsupported => CameraErrorKind::Unsupported.user_message(),
            BoothError::CameraUnavailable => CameraErrorKind::Unknown.user_message(),
            BoothError::CaptureFailed => "Failed to capture photo. Please try again.",
            BoothError::SessionCreateFailed => "Failed to start session. Please try again.",
            BoothError::UploadFailed => "Failed to save photo. Please try again.",
            BoothError::Busy => "Photos are already being taken.",
            BoothError::Cancelled => "Photo session cancelled.",
        }
    }

    /// Whether pressing the button again can work without outside help
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            BoothError::PermissionDenied | BoothError::DeviceNotFound | BoothError::Unsupported
        )
    }

    /// True for failures raised while acquiring the camera
    pub fn is_camera_error(&self) -> bool {
        matches!(
            self,
            BoothError::PermissionDenied
                | BoothError::DeviceNotFound
                | BoothError::DeviceBusy
                | BoothError::Unsupported
                | BoothError::CameraUnavailable
        )
    }
}

impl From<CameraErrorKind> for BoothError {
    fn from(kind: CameraErrorKind) -> Self {
        match kind {
            CameraErrorKind::PermissionDenied => BoothError::PermissionDenied,
            CameraErrorKind::DeviceNotFound => BoothError::DeviceNotFound,
            CameraErrorKind::DeviceBusy => BoothError::DeviceBusy,
            CameraErrorKind::Unsupported => BoothError::Unsupported,
            CameraErrorKind::Unknown => BoothError::CameraUnavailable,
        }
    }
}

/// Everything a screen needs to render the booth
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BoothSnapshot {
    pub stage: Stage,
    pub camera_ready: bool,
    pub error: Option<BoothError>,
    /// Value currently shown by the countdown
    pub countdown: Option<u32>,
    /// 1-based round in progress, 0 outside a run
    pub capture_index: u32,
    pub photo_count: u32,
    /// Remote URLs of uploaded photos, in capture order
    pub photos: Vec<String>,
    pub gallery_url: Option<String>,
}

impl BoothSnapshot {
    pub fn new(photo_count: u32) -> Self {
        Self {
            photo_count,
            ..Self::default()
        }
    }

    /// Drop everything a previous run left behind
    pub(crate) fn clear_run(&mut self) {
        self.error = None;
        self.countdown = None;
        self.capture_index = 0;
        self.photos.clear();
        self.gallery_url = None;
    }
}

/// One captured and uploaded photo
#[derive(Debug, Clone)]
pub struct Photo {
    /// 1-based position in the run
    pub index: u32,
    pub image: EncodedImage,
    pub remote_url: Option<String>,
}

/// State of a run while the booth is capturing
#[derive(Debug)]
pub struct CaptureRun {
    pub session: CaptureSession,
    pub photos: Vec<Photo>,
    pub current_index: u32,
    pub countdown_value: Option<u32>,
}

impl CaptureRun {
    pub fn new(session: CaptureSession) -> Self {
        Self {
            session,
            photos: Vec::new(),
            current_index: 0,
            countdown_value: None,
        }
    }

    /// Remote URLs of the photos taken so far
    pub fn photo_urls(&self) -> Vec<String> {
        self.photos
            .iter()
            .filter_map(|p| p.remote_url.clone())
            .collect()
    }
}
