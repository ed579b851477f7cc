// SPDX-License-Identifier: MPL-2.0

//! Error types for the photo booth
//!
//! The booth itself reports failures as closed [`BoothError`] kinds inside
//! snapshots; the types here are for the layers around it (photo pipeline,
//! configuration, CLI).

use crate::api::ApiError;
use crate::backends::camera::BackendError;
use crate::booth::BoothError;
use thiserror::Error;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Main application error type
#[derive(Debug, Error)]
pub enum AppError {
    /// Camera backend errors
    #[error("Camera error: {0}")]
    Camera(#[from] BackendError),
    /// Photo capture errors
    #[error("Photo error: {0}")]
    Photo(#[from] PhotoError),
    /// A capture run ended in an error
    #[error("Capture run failed: {0}")]
    Booth(#[from] BoothError),
    /// Remote backend errors
    #[error("Backend request failed: {0}")]
    Api(#[from] ApiError),
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
    /// Storage/filesystem errors
    #[error("Storage error: {0}")]
    Storage(String),
    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

/// Photo capture errors
#[derive(Debug, Clone, Error)]
pub enum PhotoError {
    /// No frame available for capture
    #[error("No frame available for capture")]
    NoFrameAvailable,
    /// Frame data does not match its dimensions
    #[error("Invalid frame: {0}")]
    InvalidFrame(String),
    /// Encoding failed
    #[error("Encoding failed: {0}")]
    EncodingFailed(String),
    /// Save failed
    #[error("Save failed: {0}")]
    SaveFailed(String),
}

impl From<String> for AppError {
    fn from(msg: String) -> Self {
        AppError::Other(msg)
    }
}

impl From<&str> for AppError {
    fn from(msg: &str) -> Self {
        AppError::Other(msg.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Storage(err.to_string())
    }
}

impl From<std::io::Error> for PhotoError {
    fn from(err: std::io::Error) -> Self {
        PhotoError::SaveFailed(err.to_string())
    }
}
