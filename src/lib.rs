// SPDX-License-Identifier: MPL-2.0

//! Photo booth - capture orchestration for an unattended photo kiosk
//!
//! A guest presses a button, the booth counts down and takes a fixed number
//! of photos, uploads each one to the gallery backend and shows the results
//! with a shareable link.
//!
//! # Architecture
//!
//! - [`booth`]: Run state machine, countdown, stage and snapshots
//! - [`backends`]: Camera device access (GStreamer)
//! - [`pipelines`]: Still processing and JPEG encoding
//! - [`api`]: Gallery backend collaborators (sessions, uploads, settings)
//! - [`config`]: User configuration handling
//!
//! # Example
//!
//! ```ignore
//! let config = Config::load();
//! let client = Arc::new(BackendClient::new(&config.backend_url));
//! let booth = CaptureOrchestrator::new(
//!     CameraManager::new(&config),
//!     client.clone(),
//!     client.clone(),
//!     client,
//!     CaptureOptions::from(&config),
//! );
//! booth.enter_greeting().await?;
//! let snapshot = booth.take_photos().await?;
//! ```

pub mod api;
pub mod backends;
pub mod booth;
pub mod config;
pub mod constants;
pub mod errors;
pub mod pipelines;

// Re-export commonly used types
pub use api::{BackendClient, CaptureSession, SessionClient, SettingsSource, UploadClient};
pub use backends::camera::{CameraManager, CameraState};
pub use booth::{BoothError, BoothSnapshot, CaptureOptions, CaptureOrchestrator, Stage};
pub use config::Config;
pub use errors::{AppError, AppResult};
