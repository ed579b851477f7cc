// SPDX-License-Identifier: MPL-2.0

//! Capture run state machine
//!
//! ```text
//!            take_photos()                 all rounds uploaded
//! Greeting ───────────────▶ Capturing ───────────────────────▶ Review
//!    ▲                          │                                 │
//!    │   capture/upload failure │                                 │
//!    └──────────────────────────┘◀────────── retake() ────────────┘
//! ```
//!
//! Each round is countdown, settle delay, capture, upload. Rounds never
//! overlap: round i+1 starts only after round i's upload returned.

use super::countdown::CountdownTimer;
use super::snapshot::{BoothError, BoothSnapshot, CaptureRun, Photo, Stage};
use super::stage::StageController;
use crate::api::{CaptureSession, SessionClient, SettingsSource, UploadClient};
use crate::backends::camera::CameraManager;
use crate::config::Config;
use crate::constants::capture;
use crate::pipelines::photo::timestamped_filename;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Timing and sizing of a run
#[derive(Debug, Clone)]
pub struct CaptureOptions {
    pub photo_count: u32,
    pub countdown_seconds: u32,
    pub countdown_tick: Duration,
    pub settle_delay: Duration,
    /// Bound on each backend call; None waits indefinitely
    pub network_timeout: Option<Duration>,
    /// Event used when settings carry none
    pub fallback_event_slug: String,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self {
            photo_count: capture::PHOTO_COUNT,
            countdown_seconds: capture::COUNTDOWN_SECONDS,
            countdown_tick: capture::COUNTDOWN_TICK,
            settle_delay: Duration::from_millis(capture::SETTLE_DELAY_MS),
            network_timeout: None,
            fallback_event_slug: capture::DEFAULT_EVENT_SLUG.to_string(),
        }
    }
}

impl From<&Config> for CaptureOptions {
    fn from(config: &Config) -> Self {
        Self {
            photo_count: config.photo_count,
            countdown_seconds: config.countdown_seconds,
            settle_delay: config.settle_delay(),
            network_timeout: config.network_timeout(),
            fallback_event_slug: config.default_event_slug.clone(),
            ..Self::default()
        }
    }
}

impl CaptureOptions {
    /// Clamp values a run cannot work with
    ///
    /// A run takes at least one photo, and a zero network timeout means no
    /// timeout rather than failing every call.
    pub fn sanitized(mut self) -> Self {
        if self.photo_count == 0 {
            warn!("Photo count of 0 raised to 1");
            self.photo_count = 1;
        }
        if self.network_timeout == Some(Duration::ZERO) {
            warn!("Zero network timeout disabled");
            self.network_timeout = None;
        }
        self
    }
}

/// Clears the busy flag however a run ends, including when its future is dropped
struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Drives the booth through greeting, capturing and review
pub struct CaptureOrchestrator {
    camera: Mutex<CameraManager>,
    sessions: Arc<dyn SessionClient>,
    uploads: Arc<dyn UploadClient>,
    settings: Arc<dyn SettingsSource>,
    options: CaptureOptions,
    countdown: CountdownTimer,
    stage: StageController,
    snapshot: watch::Sender<BoothSnapshot>,
    busy: AtomicBool,
    cancel: std::sync::Mutex<CancellationToken>,
}

impl CaptureOrchestrator {
    pub fn new(
        camera: CameraManager,
        sessions: Arc<dyn SessionClient>,
        uploads: Arc<dyn UploadClient>,
        settings: Arc<dyn SettingsSource>,
        options: CaptureOptions,
    ) -> Self {
        let options = options.sanitized();
        let (snapshot, _) = watch::channel(BoothSnapshot::new(options.photo_count));
        Self {
            camera: Mutex::new(camera),
            sessions,
            uploads,
            settings,
            countdown: CountdownTimer::new(options.countdown_tick),
            options,
            stage: StageController::new(),
            snapshot,
            busy: AtomicBool::new(false),
            cancel: std::sync::Mutex::new(CancellationToken::new()),
        }
    }

    /// Current state for presentation
    pub fn snapshot(&self) -> BoothSnapshot {
        self.snapshot.borrow().clone()
    }

    /// Follow every snapshot change
    pub fn subscribe(&self) -> watch::Receiver<BoothSnapshot> {
        self.snapshot.subscribe()
    }

    pub fn stage(&self) -> &StageController {
        &self.stage
    }

    pub fn options(&self) -> &CaptureOptions {
        &self.options
    }

    /// Live preview frames while the camera is held
    pub async fn preview_receiver(&self) -> Option<crate::backends::camera::FrameReceiver> {
        self.camera.lock().await.preview_receiver()
    }

    /// Show the greeting screen and acquire the camera
    pub async fn enter_greeting(&self) -> Result<(), BoothError> {
        let _guard = self.try_begin()?;
        self.greet().await;
        Ok(())
    }

    /// Run one full capture sequence
    ///
    /// Returns the final snapshot on success. On failure the booth is back
    /// in greeting with the camera released, and the error is both returned
    /// and recorded in the snapshot. `Busy` is returned without touching the
    /// snapshot. Called from review, the previous run is discarded first.
    pub async fn take_photos(&self) -> Result<BoothSnapshot, BoothError> {
        let _guard = self.try_begin()?;
        let token = self.fresh_token();

        self.publish(|s| {
            s.clear_run();
            s.photo_count = self.options.photo_count;
        });

        if let Err(kind) = self.ensure_camera().await {
            warn!(error = %kind, "Cannot start run without camera");
            self.abort(kind).await;
            return Err(kind);
        }

        self.set_stage(Stage::Capturing);
        info!(photo_count = self.options.photo_count, "Capture run started");

        let result = tokio::select! {
            biased;
            _ = token.cancelled() => Err(BoothError::Cancelled),
            result = self.run() => result,
        };

        match result {
            Ok(run) => {
                self.camera.lock().await.release();
                self.publish(|s| {
                    s.camera_ready = false;
                    s.countdown = None;
                    s.photos = run.photo_urls();
                    s.gallery_url = Some(run.session.gallery_url.clone());
                });
                self.set_stage(Stage::Review);
                info!(session_id = %run.session.id, photos = run.photos.len(), "Capture run complete");
                Ok(self.snapshot())
            }
            Err(kind) => {
                self.abort(kind).await;
                Err(kind)
            }
        }
    }

    /// Clear the last run and return to greeting
    ///
    /// Rejected with `Busy` while a run is in progress; use [`Self::cancel`].
    pub async fn retake(&self) -> Result<(), BoothError> {
        let _guard = self.try_begin()?;
        info!("Retake requested");
        self.publish(|s| s.clear_run());
        self.greet().await;
        Ok(())
    }

    /// Abort the run in progress at its next suspension point
    pub fn cancel(&self) {
        if !self.busy.load(Ordering::Acquire) {
            debug!("Cancel with no run in progress");
            return;
        }
        info!("Cancelling capture run");
        self.current_token().cancel();
    }

    /// Stop any run and release the camera
    pub async fn shutdown(&self) {
        self.current_token().cancel();
        self.camera.lock().await.release();
        self.publish(|s| {
            s.camera_ready = false;
            s.countdown = None;
        });
        info!("Booth shut down");
    }

    /// Session creation followed by every round
    async fn run(&self) -> Result<CaptureRun, BoothError> {
        let session = self.create_session().await?;
        let mut run = CaptureRun::new(session);
        for index in 1..=self.options.photo_count {
            self.round(&mut run, index).await?;
        }
        Ok(run)
    }

    async fn create_session(&self) -> Result<CaptureSession, BoothError> {
        let event_slug = match self
            .with_timeout(self.settings.default_event_slug())
            .await
            .flatten()
        {
            Some(slug) => slug,
            None => {
                debug!(fallback = %self.options.fallback_event_slug, "Using fallback event");
                self.options.fallback_event_slug.clone()
            }
        };

        match self.with_timeout(self.sessions.create_session(&event_slug)).await {
            Some(Ok(session)) => Ok(session),
            Some(Err(e)) => {
                error!(error = %e, event_slug = %event_slug, "Session creation failed");
                Err(BoothError::SessionCreateFailed)
            }
            None => {
                error!(event_slug = %event_slug, "Session creation timed out");
                Err(BoothError::SessionCreateFailed)
            }
        }
    }

    async fn round(&self, run: &mut CaptureRun, index: u32) -> Result<(), BoothError> {
        run.current_index = index;
        debug!(index, "Round started");
        self.publish(|s| s.capture_index = index);

        self.countdown
            .run(self.options.countdown_seconds, |value| {
                run.countdown_value = Some(value);
                self.publish(|s| s.countdown = Some(value));
            })
            .await;
        run.countdown_value = None;
        self.publish(|s| s.countdown = None);

        tokio::time::sleep(self.options.settle_delay).await;

        let image = match self.camera.lock().await.capture_frame().await {
            Ok(Some(image)) => image,
            Ok(None) => {
                warn!(index, "No frame available");
                return Err(BoothError::CaptureFailed);
            }
            Err(e) => {
                error!(index, error = %e, "Frame capture failed");
                return Err(BoothError::CaptureFailed);
            }
        };

        let filename = timestamped_filename();
        let upload = self.uploads.upload_photo(
            image.data.clone(),
            &filename,
            Some(run.session.id.as_str()),
        );
        let url = match self.with_timeout(upload).await {
            Some(Ok(url)) => url,
            Some(Err(e)) => {
                error!(index, error = %e, "Upload failed");
                return Err(BoothError::UploadFailed);
            }
            None => {
                error!(index, "Upload timed out");
                return Err(BoothError::UploadFailed);
            }
        };

        info!(index, url = %url, "Photo stored");
        run.photos.push(Photo {
            index,
            image,
            remote_url: Some(url),
        });
        let urls = run.photo_urls();
        self.publish(|s| s.photos = urls);
        Ok(())
    }

    /// Failure path: release, back to greeting, keep the error
    ///
    /// Photos uploaded before the failure stay in the snapshot until the next
    /// run or retake clears them. The camera is not re-acquired here; the
    /// next `take_photos` or `retake` does that, so the error stays on screen.
    async fn abort(&self, kind: BoothError) {
        warn!(error = %kind, "Capture run aborted");
        self.camera.lock().await.release();
        self.publish(|s| {
            s.camera_ready = false;
            s.countdown = None;
            s.capture_index = 0;
            s.error = Some(kind);
        });
        self.set_stage(Stage::Greeting);
    }

    async fn greet(&self) {
        self.set_stage(Stage::Greeting);
        let state = self.camera.lock().await.acquire().await;
        self.publish(|s| {
            s.camera_ready = state.ready;
            s.error = state.last_error.map(BoothError::from);
        });
    }

    /// Acquire the camera unless it is already live
    async fn ensure_camera(&self) -> Result<(), BoothError> {
        let mut camera = self.camera.lock().await;
        if camera.is_ready() {
            return Ok(());
        }
        let state = camera.acquire().await;
        drop(camera);

        self.publish(|s| s.camera_ready = state.ready);
        match state.last_error {
            None if state.ready => Ok(()),
            Some(kind) => Err(kind.into()),
            None => Err(BoothError::CameraUnavailable),
        }
    }

    async fn with_timeout<F: Future>(&self, fut: F) -> Option<F::Output> {
        match self.options.network_timeout {
            Some(limit) => tokio::time::timeout(limit, fut).await.ok(),
            None => Some(fut.await),
        }
    }

    fn try_begin(&self) -> Result<BusyGuard<'_>, BoothError> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| BusyGuard(&self.busy))
            .map_err(|_| {
                debug!("Rejecting command, run in progress");
                BoothError::Busy
            })
    }

    fn fresh_token(&self) -> CancellationToken {
        let token = CancellationToken::new();
        *self.cancel.lock().unwrap_or_else(|e| e.into_inner()) = token.clone();
        token
    }

    fn current_token(&self) -> CancellationToken {
        self.cancel.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn set_stage(&self, stage: Stage) {
        self.stage.set_stage(stage);
        self.publish(|s| s.stage = stage);
    }

    fn publish(&self, update: impl FnOnce(&mut BoothSnapshot)) {
        self.snapshot.send_modify(update);
    }
}

impl std::fmt::Debug for CaptureOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureOrchestrator")
            .field("stage", &self.stage.current_stage())
            .field("busy", &self.busy.load(Ordering::Relaxed))
            .field("options", &self.options)
            .finish()
    }
}
