// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use std::time::Duration;

/// Capture sequence defaults
///
/// These are the compiled-in values used when the configuration file does not
/// override them.
pub mod capture {
    use super::Duration;

    /// Number of photos taken per run
    pub const PHOTO_COUNT: u32 = 3;

    /// Countdown length before each photo, in seconds
    pub const COUNTDOWN_SECONDS: u32 = 3;

    /// Countdown tick period
    pub const COUNTDOWN_TICK: Duration = Duration::from_millis(1000);

    /// Pause after the countdown reaches zero so the still does not catch
    /// the countdown overlay fading out
    pub const SETTLE_DELAY_MS: u64 = 800;

    /// JPEG quality for uploaded stills (0-100)
    pub const JPEG_QUALITY: u8 = 92;

    /// Event identifier used when the settings lookup yields nothing
    pub const DEFAULT_EVENT_SLUG: &str = "onlocation";
}

/// Requested capture resolution
pub mod resolution {
    /// Ideal width
    pub const IDEAL_WIDTH: u32 = 1280;

    /// Ideal height
    pub const IDEAL_HEIGHT: u32 = 720;

    /// Minimum acceptable width
    pub const MIN_WIDTH: u32 = 640;

    /// Minimum acceptable height
    pub const MIN_HEIGHT: u32 = 480;
}

/// Remote backend endpoints
pub mod api {
    /// Default backend base URL
    pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

    /// Session creation
    pub const SESSIONS_PATH: &str = "/api/v1/sessions";

    /// Photo upload (multipart)
    pub const PHOTO_UPLOAD_PATH: &str = "/api/v1/photos/upload";

    /// Read-only kiosk settings
    pub const SETTINGS_PATH: &str = "/api/v1/settings";

    /// MIME type of uploaded stills
    pub const PHOTO_CONTENT_TYPE: &str = "image/jpeg";
}

/// GStreamer pipeline constants
pub mod pipeline {
    /// Maximum buffer queue size (keep small for low latency)
    pub const MAX_BUFFERS: u32 = 2;

    /// Get number of threads for videoconvert based on available CPU threads
    pub fn videoconvert_threads() -> u32 {
        std::thread::available_parallelism()
            .map(|n| n.get() as u32)
            .unwrap_or(4)
    }

    /// Output pixel format for appsink
    pub const OUTPUT_FORMAT: &str = "RGBA";

    /// Name of the appsink element in every pipeline description
    pub const SINK_NAME: &str = "sink";
}

/// Timing constants
pub mod timing {
    /// Frame counter modulo for periodic logging
    pub const FRAME_LOG_INTERVAL: u64 = 30;

    /// Pipeline state change timeout on stop
    pub const STOP_TIMEOUT_SECS: u64 = 2;

    /// Pipeline playing state timeout on start
    ///
    /// PipeWire may show a permission prompt during negotiation, so this is
    /// generous compared to a plain V4L2 open.
    pub const START_TIMEOUT_SECS: u64 = 10;

    /// How long `probe` waits for the first frames before giving up
    pub const PROBE_TIMEOUT_SECS: u64 = 5;

    /// Warm-up period discarded by `probe` (auto exposure settling)
    pub const PROBE_WARMUP_MS: u64 = 500;
}
