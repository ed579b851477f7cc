// SPDX-License-Identifier: MPL-2.0

//! Integration tests for constants module

use photobooth::constants::{api, capture, resolution};
use std::time::Duration;

#[test]
fn test_capture_defaults() {
    assert_eq!(capture::PHOTO_COUNT, 3);
    assert_eq!(capture::COUNTDOWN_SECONDS, 3);
    assert_eq!(capture::COUNTDOWN_TICK, Duration::from_secs(1));
    assert_eq!(capture::SETTLE_DELAY_MS, 800);
    assert_eq!(capture::DEFAULT_EVENT_SLUG, "onlocation");
}

#[test]
fn test_jpeg_quality_in_range() {
    assert!((1..=100).contains(&capture::JPEG_QUALITY));
}

#[test]
fn test_minimum_resolution_below_ideal() {
    assert!(resolution::MIN_WIDTH <= resolution::IDEAL_WIDTH);
    assert!(resolution::MIN_HEIGHT <= resolution::IDEAL_HEIGHT);
}

#[test]
fn test_api_paths_are_absolute() {
    for path in [api::SESSIONS_PATH, api::PHOTO_UPLOAD_PATH, api::SETTINGS_PATH] {
        assert!(path.starts_with("/api/v1/"), "{} should be versioned", path);
    }
    assert_eq!(api::PHOTO_CONTENT_TYPE, "image/jpeg");
}
