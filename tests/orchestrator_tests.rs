// SPDX-License-Identifier: MPL-2.0

//! Integration tests for the capture run state machine
//!
//! All tests run on a paused clock, so countdowns and settle delays cost no
//! wall time.

mod common;

use common::{FakeCamera, FakeSessions, FakeUploads, HarnessBuilder};
use photobooth::backends::camera::BackendError;
use photobooth::booth::{BoothError, CaptureOptions, Stage};
use std::time::Duration;
use tokio::time::Instant;

#[tokio::test(start_paused = true)]
async fn test_all_rounds_succeed() {
    let h = HarnessBuilder::new().build();
    h.booth.enter_greeting().await.unwrap();
    assert!(h.booth.snapshot().camera_ready);

    let snapshot = h.booth.take_photos().await.unwrap();

    assert_eq!(snapshot.stage, Stage::Review);
    assert_eq!(snapshot.photos, vec!["url1", "url2", "url3"]);
    assert_eq!(
        snapshot.gallery_url.as_deref(),
        Some("https://gallery.test/s/sess-1")
    );
    assert_eq!(snapshot.photo_count, 3);
    assert_eq!(snapshot.error, None);
    assert_eq!(snapshot.countdown, None);
    assert!(!snapshot.camera_ready);
    assert_eq!(h.camera.live(), 0, "camera must be released in review");
    assert_eq!(h.booth.stage().current_stage(), Stage::Review);
}

#[tokio::test(start_paused = true)]
async fn test_uploads_tagged_with_session() {
    let h = HarnessBuilder::new().build();
    h.booth.take_photos().await.unwrap();

    let calls = h.uploads.calls();
    assert_eq!(calls.len(), 3);
    for call in &calls {
        assert_eq!(call.session_id.as_deref(), Some("sess-1"));
        assert!(call.filename.starts_with("photo_"));
        assert!(call.filename.ends_with(".jpg"));
        assert!(call.size > 0);
    }
}

#[tokio::test(start_paused = true)]
async fn test_session_created_once_before_uploads() {
    let h = HarnessBuilder::new().build();
    h.booth.take_photos().await.unwrap();

    assert_eq!(
        *h.log.lock().unwrap(),
        vec!["session", "upload", "upload", "upload"]
    );
}

#[tokio::test(start_paused = true)]
async fn test_permission_denied_blocks_run() {
    let h = HarnessBuilder::new()
        .camera(FakeCamera::failing(BackendError::PermissionDenied(
            "portal refused".into(),
        )))
        .build();
    h.booth.enter_greeting().await.unwrap();
    assert_eq!(h.booth.snapshot().error, Some(BoothError::PermissionDenied));

    let err = h.booth.take_photos().await.unwrap_err();

    assert_eq!(err, BoothError::PermissionDenied);
    let snapshot = h.booth.snapshot();
    assert_eq!(snapshot.stage, Stage::Greeting);
    assert_eq!(snapshot.error, Some(BoothError::PermissionDenied));
    assert!(!snapshot.camera_ready);
    assert!(h.sessions.slugs().is_empty(), "no session without a camera");
}

#[tokio::test(start_paused = true)]
async fn test_upload_failure_keeps_earlier_photos() {
    let builder = HarnessBuilder::new();
    let uploads = FakeUploads::failing_on(builder.log(), 2);
    let h = builder.uploads(uploads).build();
    h.booth.enter_greeting().await.unwrap();

    let err = h.booth.take_photos().await.unwrap_err();

    assert_eq!(err, BoothError::UploadFailed);
    let snapshot = h.booth.snapshot();
    assert_eq!(snapshot.stage, Stage::Greeting);
    assert_eq!(snapshot.photos, vec!["url1"]);
    assert_eq!(snapshot.error, Some(BoothError::UploadFailed));
    assert_eq!(snapshot.gallery_url, None);
    assert!(!snapshot.camera_ready);
    assert_eq!(h.camera.live(), 0);
    assert_eq!(h.uploads.calls().len(), 2, "round 3 must not start");
}

#[tokio::test(start_paused = true)]
async fn test_cold_camera_fails_capture() {
    let h = HarnessBuilder::new().camera(FakeCamera::cold()).build();
    h.booth.enter_greeting().await.unwrap();

    let err = h.booth.take_photos().await.unwrap_err();

    assert_eq!(err, BoothError::CaptureFailed);
    let snapshot = h.booth.snapshot();
    assert_eq!(snapshot.stage, Stage::Greeting);
    assert!(snapshot.photos.is_empty());
    assert_eq!(snapshot.error, Some(BoothError::CaptureFailed));
    assert!(h.uploads.calls().is_empty());
    assert_eq!(h.camera.live(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_capture_failure_in_later_round_keeps_earlier_photos() {
    let h = HarnessBuilder::new().camera(FakeCamera::cooling_after(1)).build();
    h.booth.enter_greeting().await.unwrap();

    let err = h.booth.take_photos().await.unwrap_err();

    assert_eq!(err, BoothError::CaptureFailed);
    let snapshot = h.booth.snapshot();
    assert_eq!(snapshot.stage, Stage::Greeting);
    assert_eq!(snapshot.photos, vec!["url1"]);
    assert_eq!(snapshot.error, Some(BoothError::CaptureFailed));
    assert_eq!(snapshot.gallery_url, None);
    assert_eq!(h.uploads.calls().len(), 1);
    assert_eq!(h.camera.live(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_take_photos_from_review_starts_new_run() {
    let h = HarnessBuilder::new().build();
    h.booth.take_photos().await.unwrap();
    assert_eq!(h.booth.stage().current_stage(), Stage::Review);

    let snapshot = h.booth.take_photos().await.unwrap();

    assert_eq!(snapshot.stage, Stage::Review);
    assert_eq!(snapshot.photos, vec!["url4", "url5", "url6"]);
    assert_eq!(
        snapshot.gallery_url.as_deref(),
        Some("https://gallery.test/s/sess-2")
    );
    assert_eq!(h.camera.live(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_camera_failure_from_review_returns_to_greeting() {
    let h = HarnessBuilder::new()
        .camera(FakeCamera::failing_after(
            1,
            BackendError::DeviceBusy("/dev/video0".into()),
        ))
        .build();
    h.booth.enter_greeting().await.unwrap();
    h.booth.take_photos().await.unwrap();
    assert_eq!(h.booth.snapshot().stage, Stage::Review);

    let err = h.booth.take_photos().await.unwrap_err();

    assert_eq!(err, BoothError::DeviceBusy);
    let snapshot = h.booth.snapshot();
    assert_eq!(snapshot.stage, Stage::Greeting);
    assert_eq!(h.booth.stage().current_stage(), Stage::Greeting);
    assert!(snapshot.photos.is_empty());
    assert_eq!(snapshot.gallery_url, None);
    assert_eq!(snapshot.error, Some(BoothError::DeviceBusy));
    assert!(!snapshot.camera_ready);
    assert_eq!(h.sessions.slugs().len(), 1, "no session without a camera");
    assert_eq!(h.camera.live(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_session_failure_skips_rounds() {
    let builder = HarnessBuilder::new();
    let sessions = FakeSessions::failing(builder.log());
    let h = builder.sessions(sessions).build();

    let err = h.booth.take_photos().await.unwrap_err();

    assert_eq!(err, BoothError::SessionCreateFailed);
    let snapshot = h.booth.snapshot();
    assert_eq!(snapshot.stage, Stage::Greeting);
    assert_eq!(snapshot.capture_index, 0);
    assert!(h.uploads.calls().is_empty());
    assert_eq!(h.camera.live(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_retake_is_idempotent() {
    let h = HarnessBuilder::new().build();
    h.booth.take_photos().await.unwrap();

    for _ in 0..2 {
        h.booth.retake().await.unwrap();
        let snapshot = h.booth.snapshot();
        assert_eq!(snapshot.stage, Stage::Greeting);
        assert!(snapshot.photos.is_empty());
        assert_eq!(snapshot.gallery_url, None);
        assert_eq!(snapshot.error, None);
        assert!(snapshot.camera_ready);
    }
    assert_eq!(h.camera.live(), 1, "reacquiring must release the old handle");
}

#[tokio::test(start_paused = true)]
async fn test_retake_clears_failed_run() {
    let builder = HarnessBuilder::new();
    let uploads = FakeUploads::failing_on(builder.log(), 2);
    let h = builder.uploads(uploads).build();
    h.booth.take_photos().await.unwrap_err();

    h.booth.retake().await.unwrap();

    let snapshot = h.booth.snapshot();
    assert_eq!(snapshot.stage, Stage::Greeting);
    assert!(snapshot.photos.is_empty());
    assert_eq!(snapshot.error, None);
}

#[tokio::test(start_paused = true)]
async fn test_next_run_starts_fresh_after_failure() {
    let builder = HarnessBuilder::new();
    let uploads = FakeUploads::failing_on(builder.log(), 2);
    let h = builder.uploads(uploads).build();
    h.booth.take_photos().await.unwrap_err();

    let snapshot = h.booth.take_photos().await.unwrap();

    assert_eq!(snapshot.stage, Stage::Review);
    assert_eq!(snapshot.photos, vec!["url3", "url4", "url5"]);
    assert_eq!(
        snapshot.gallery_url.as_deref(),
        Some("https://gallery.test/s/sess-2")
    );
    assert_eq!(snapshot.error, None);
    assert_eq!(h.camera.opened(), 2);
    assert_eq!(h.camera.live(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_second_trigger_is_busy() {
    let h = HarnessBuilder::new().build();
    let booth = h.booth.clone();
    let run = tokio::spawn(async move { booth.take_photos().await });

    tokio::time::sleep(Duration::from_millis(1500)).await;
    let during = h.booth.snapshot();
    assert_eq!(during.stage, Stage::Capturing);

    assert_eq!(h.booth.take_photos().await.unwrap_err(), BoothError::Busy);
    assert_eq!(h.booth.retake().await.unwrap_err(), BoothError::Busy);
    assert_eq!(h.booth.snapshot(), during, "busy rejection must not touch state");

    let snapshot = run.await.unwrap().unwrap();
    assert_eq!(snapshot.photos.len(), 3);
    assert_eq!(h.sessions.slugs().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_aborts_run() {
    let h = HarnessBuilder::new().build();
    let booth = h.booth.clone();
    let run = tokio::spawn(async move { booth.take_photos().await });

    // Round 2 countdown
    tokio::time::sleep(Duration::from_millis(5000)).await;
    assert_eq!(h.booth.snapshot().capture_index, 2);
    h.booth.cancel();

    assert_eq!(run.await.unwrap().unwrap_err(), BoothError::Cancelled);
    let snapshot = h.booth.snapshot();
    assert_eq!(snapshot.stage, Stage::Greeting);
    assert_eq!(snapshot.error, Some(BoothError::Cancelled));
    assert_eq!(snapshot.countdown, None);
    assert_eq!(snapshot.photos, vec!["url1"]);
    assert_eq!(h.camera.live(), 0);
    assert_eq!(h.uploads.calls().len(), 1);

    // The booth accepts a new run afterwards
    assert!(h.booth.take_photos().await.is_ok());
}

#[tokio::test(start_paused = true)]
async fn test_cancel_when_idle_is_noop() {
    let h = HarnessBuilder::new().build();
    h.booth.enter_greeting().await.unwrap();
    h.booth.cancel();

    let snapshot = h.booth.take_photos().await.unwrap();
    assert_eq!(snapshot.stage, Stage::Review);
}

#[tokio::test(start_paused = true)]
async fn test_upload_timeout_fails_run() {
    let builder = HarnessBuilder::new();
    let uploads = FakeUploads::hanging(builder.log());
    let h = builder
        .uploads(uploads)
        .options(CaptureOptions {
            network_timeout: Some(Duration::from_secs(5)),
            ..CaptureOptions::default()
        })
        .build();

    let err = h.booth.take_photos().await.unwrap_err();

    assert_eq!(err, BoothError::UploadFailed);
    assert_eq!(h.booth.snapshot().stage, Stage::Greeting);
    assert_eq!(h.camera.live(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_countdown_values_per_round() {
    let h = HarnessBuilder::new().build();
    let mut rx = h.booth.subscribe();
    let watcher = tokio::spawn(async move {
        let mut shown = Vec::new();
        while rx.changed().await.is_ok() {
            let snapshot = rx.borrow_and_update().clone();
            if let Some(value) = snapshot.countdown
                && shown.last() != Some(&(snapshot.capture_index, value))
            {
                shown.push((snapshot.capture_index, value));
            }
            if snapshot.stage == Stage::Review {
                break;
            }
        }
        shown
    });

    h.booth.take_photos().await.unwrap();
    let shown = watcher.await.unwrap();

    let expected: Vec<(u32, u32)> = (1..=3)
        .flat_map(|round| [(round, 3), (round, 2), (round, 1)])
        .collect();
    assert_eq!(shown, expected);
}

#[tokio::test(start_paused = true)]
async fn test_run_timing() {
    let h = HarnessBuilder::new()
        .options(CaptureOptions {
            photo_count: 2,
            countdown_seconds: 2,
            settle_delay: Duration::from_millis(500),
            ..CaptureOptions::default()
        })
        .build();
    let start = Instant::now();

    let snapshot = h.booth.take_photos().await.unwrap();

    assert_eq!(snapshot.photos.len(), 2);
    // Two rounds of 2s countdown + 0.5s settle
    assert_eq!(start.elapsed(), Duration::from_millis(5000));
}

#[tokio::test(start_paused = true)]
async fn test_event_slug_from_settings() {
    let h = HarnessBuilder::new().settings(Some("wedding")).build();
    h.booth.take_photos().await.unwrap();
    assert_eq!(h.sessions.slugs(), vec!["wedding"]);

    let h = HarnessBuilder::new().settings(None).build();
    h.booth.take_photos().await.unwrap();
    assert_eq!(h.sessions.slugs(), vec!["onlocation"]);
}

#[tokio::test(start_paused = true)]
async fn test_busy_device_reported_on_greeting() {
    let h = HarnessBuilder::new()
        .camera(FakeCamera::failing(BackendError::DeviceBusy("/dev/video0".into())))
        .build();
    h.booth.enter_greeting().await.unwrap();

    let snapshot = h.booth.snapshot();
    assert_eq!(snapshot.error, Some(BoothError::DeviceBusy));
    assert!(!snapshot.camera_ready);
    assert!(snapshot.error.unwrap().is_retryable());
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_releases_camera() {
    let h = HarnessBuilder::new().build();
    h.booth.enter_greeting().await.unwrap();
    assert_eq!(h.camera.live(), 1);
    assert!(h.booth.preview_receiver().await.is_some());

    h.booth.shutdown().await;

    assert_eq!(h.camera.live(), 0);
    assert!(!h.booth.snapshot().camera_ready);
    assert!(h.booth.preview_receiver().await.is_none());
}
