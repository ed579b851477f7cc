// SPDX-License-Identifier: GPL-3.0-only

use crate::backends::camera::CameraSourceType;
use crate::constants::{api, capture};
use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

const APP_DIR: &str = "photobooth";
const CONFIG_FILE: &str = "config.json";

/// Kiosk configuration
///
/// Read from `config.json` in the user config directory. Missing keys take
/// their defaults, so a file only needs the values it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the gallery backend
    pub backend_url: String,
    /// Event used when the backend settings carry none
    pub default_event_slug: String,
    /// Photos per run
    pub photo_count: u32,
    /// Countdown length before each photo
    pub countdown_seconds: u32,
    /// Pause between countdown end and capture
    pub settle_delay_ms: u64,
    /// JPEG quality for uploaded stills (1-100)
    pub jpeg_quality: u8,
    pub camera_source: CameraSourceType,
    /// Specific device (PipeWire node/serial or `/dev/videoN`)
    pub device_path: Option<String>,
    /// Mirror stills to match the mirrored preview
    pub mirror_capture: bool,
    /// Bound on each backend request; None waits indefinitely
    pub network_timeout_secs: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend_url: api::DEFAULT_BASE_URL.to_string(),
            default_event_slug: capture::DEFAULT_EVENT_SLUG.to_string(),
            photo_count: capture::PHOTO_COUNT,
            countdown_seconds: capture::COUNTDOWN_SECONDS,
            settle_delay_ms: capture::SETTLE_DELAY_MS,
            jpeg_quality: capture::JPEG_QUALITY,
            camera_source: CameraSourceType::default(),
            device_path: None,
            mirror_capture: true,
            network_timeout_secs: None,
        }
    }
}

impl Config {
    /// Default location: `<config dir>/photobooth/config.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
    }

    /// Load from the default location, falling back to defaults
    pub fn load() -> Self {
        let Some(path) = Self::default_path() else {
            return Self::default();
        };
        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Self::default();
        }
        match Self::load_from(&path) {
            Ok(config) => config,
            Err(e) => {
                warn!(error = %e, "Ignoring unreadable config file");
                Self::default()
            }
        }
    }

    /// Load from an explicit path; errors if it is missing or malformed
    pub fn load_from(path: &Path) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("{}: {}", path.display(), e)))?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| AppError::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        debug!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    /// Write to `path`, creating parent directories
    pub fn save_to(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            serde_json::to_string_pretty(self).map_err(|e| AppError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject values the booth cannot run with
    pub fn validate(&self) -> AppResult<()> {
        if self.photo_count == 0 {
            return Err(AppError::Config("photo_count must be at least 1".into()));
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(AppError::Config("jpeg_quality must be within 1-100".into()));
        }
        if self.backend_url.trim().is_empty() {
            return Err(AppError::Config("backend_url must not be empty".into()));
        }
        Ok(())
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn network_timeout(&self) -> Option<Duration> {
        self.network_timeout_secs.map(Duration::from_secs)
    }
}
