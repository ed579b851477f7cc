// SPDX-License-Identifier: MPL-2.0

//! Gallery backend collaborators
//!
//! The booth only needs three things from the backend: a session to group a
//! run's photos, a place to upload each photo, and the default event. Each is
//! a trait so the orchestrator can run against fakes.

pub mod http;

pub use http::BackendClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A backend-issued session grouping the photos of one run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureSession {
    pub id: String,
    pub gallery_url: String,
    /// Gallery access token; kept but not shown
    #[serde(default)]
    pub token: String,
}

/// Errors from the gallery backend
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// Request never got a response
    #[error("Request failed: {0}")]
    Transport(String),
    /// Backend answered with a non-success status
    #[error("Backend returned {status}: {body}")]
    Status { status: u16, body: String },
    /// Response body was not what we expected
    #[error("Invalid response: {0}")]
    Decode(String),
}

/// Creates capture sessions
#[async_trait]
pub trait SessionClient: Send + Sync {
    async fn create_session(&self, event_slug: &str) -> Result<CaptureSession, ApiError>;
}

/// Uploads encoded photos
#[async_trait]
pub trait UploadClient: Send + Sync {
    /// Upload one JPEG and return its retrieval URL
    async fn upload_photo(
        &self,
        data: Vec<u8>,
        filename: &str,
        session_id: Option<&str>,
    ) -> Result<String, ApiError>;
}

/// Read-only kiosk settings
#[async_trait]
pub trait SettingsSource: Send + Sync {
    /// Event to create sessions under; None when unset or unreachable
    async fn default_event_slug(&self) -> Option<String>;
}

/// Settings source that always answers with a fixed event
#[derive(Debug, Clone)]
pub struct StaticSettings(pub String);

#[async_trait]
impl SettingsSource for StaticSettings {
    async fn default_event_slug(&self) -> Option<String> {
        Some(self.0.clone())
    }
}
