// SPDX-License-Identifier: MPL-2.0

//! In-memory camera and backend fakes shared by integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use photobooth::api::{ApiError, CaptureSession, SessionClient, SettingsSource, UploadClient};
use photobooth::backends::camera::{
    BackendError, BackendResult, CameraBackend, CameraFrame, CameraManager, CameraSourceType,
    CameraStream, FrameReceiver, StreamRequest,
};
use photobooth::booth::{CaptureOptions, CaptureOrchestrator};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

/// Ordered record of backend calls across all fakes
pub type CallLog = Arc<Mutex<Vec<String>>>;

/// Counts device opens and stops
#[derive(Default)]
pub struct CameraProbe {
    opened: AtomicUsize,
    stopped: AtomicUsize,
}

impl CameraProbe {
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    /// Streams opened and not yet stopped
    pub fn live(&self) -> usize {
        self.opened() - self.stopped.load(Ordering::SeqCst)
    }
}

struct FakeStream {
    frame: Arc<CameraFrame>,
    /// Sized frames served before the stream goes cold; None never does
    sized_frames: Option<usize>,
    served: AtomicUsize,
    probe: Arc<CameraProbe>,
}

impl CameraStream for FakeStream {
    fn latest_frame(&self) -> Option<Arc<CameraFrame>> {
        let served = self.served.fetch_add(1, Ordering::SeqCst);
        match self.sized_frames {
            Some(limit) if served >= limit => Some(blank_frame(0, 0)),
            _ => Some(Arc::clone(&self.frame)),
        }
    }

    fn preview_receiver(&self) -> FrameReceiver {
        tokio::sync::watch::channel(Some(Arc::clone(&self.frame))).1
    }

    fn stop(&mut self) -> BackendResult<()> {
        self.probe.stopped.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn blank_frame(width: u32, height: u32) -> Arc<CameraFrame> {
    Arc::new(CameraFrame {
        width,
        height,
        stride: width * 4,
        data: Arc::from(vec![120u8; (width * height * 4) as usize]),
        captured_at: Instant::now(),
    })
}

/// Camera that opens instantly and always shows the same frame
pub struct FakeCamera {
    failure: Option<BackendError>,
    /// Successful opens before `failure` kicks in
    opens_before_failure: usize,
    sized_frames: Option<usize>,
    frame: Arc<CameraFrame>,
    probe: Arc<CameraProbe>,
}

impl FakeCamera {
    pub fn working() -> Self {
        Self::with_frame(8, 6)
    }

    /// Device opens but has not produced a sized frame yet
    pub fn cold() -> Self {
        Self::with_frame(0, 0)
    }

    pub fn failing(error: BackendError) -> Self {
        Self::failing_after(0, error)
    }

    /// Opens `opens` times, then fails every later open with `error`
    pub fn failing_after(opens: usize, error: BackendError) -> Self {
        Self {
            failure: Some(error),
            opens_before_failure: opens,
            ..Self::working()
        }
    }

    /// Each stream serves `frames` sized frames, then only unsized ones
    pub fn cooling_after(frames: usize) -> Self {
        Self {
            sized_frames: Some(frames),
            ..Self::working()
        }
    }

    fn with_frame(width: u32, height: u32) -> Self {
        Self {
            failure: None,
            opens_before_failure: 0,
            sized_frames: None,
            frame: blank_frame(width, height),
            probe: Arc::new(CameraProbe::default()),
        }
    }

    pub fn probe(&self) -> Arc<CameraProbe> {
        Arc::clone(&self.probe)
    }
}

impl CameraBackend for FakeCamera {
    fn backend_type(&self) -> CameraSourceType {
        CameraSourceType::TestPattern
    }

    fn is_available(&self) -> bool {
        true
    }

    fn open(&self, _request: &StreamRequest) -> BackendResult<Box<dyn CameraStream>> {
        if let Some(err) = &self.failure {
            if self.probe.opened() >= self.opens_before_failure {
                return Err(err.clone());
            }
        }
        self.probe.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeStream {
            frame: Arc::clone(&self.frame),
            sized_frames: self.sized_frames,
            served: AtomicUsize::new(0),
            probe: Arc::clone(&self.probe),
        }))
    }
}

/// Session backend handing out `sess-<n>`
pub struct FakeSessions {
    log: CallLog,
    fail: bool,
    slugs: Mutex<Vec<String>>,
}

impl FakeSessions {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            fail: false,
            slugs: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(log: CallLog) -> Self {
        Self {
            fail: true,
            ..Self::new(log)
        }
    }

    /// Event slugs sessions were requested for
    pub fn slugs(&self) -> Vec<String> {
        self.slugs.lock().unwrap().clone()
    }
}

#[async_trait]
impl SessionClient for FakeSessions {
    async fn create_session(&self, event_slug: &str) -> Result<CaptureSession, ApiError> {
        self.log.lock().unwrap().push("session".to_string());
        let n = {
            let mut slugs = self.slugs.lock().unwrap();
            slugs.push(event_slug.to_string());
            slugs.len()
        };
        if self.fail {
            return Err(ApiError::Status {
                status: 500,
                body: "boom".into(),
            });
        }
        Ok(CaptureSession {
            id: format!("sess-{}", n),
            gallery_url: format!("https://gallery.test/s/sess-{}", n),
            token: "tok".into(),
        })
    }
}

/// One recorded upload call
#[derive(Debug, Clone)]
pub struct UploadCall {
    pub filename: String,
    pub session_id: Option<String>,
    pub size: usize,
}

/// Upload backend answering `url<n>` for the n-th call overall
pub struct FakeUploads {
    log: CallLog,
    fail_on: Mutex<Option<usize>>,
    hang: bool,
    calls: Mutex<Vec<UploadCall>>,
}

impl FakeUploads {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            fail_on: Mutex::new(None),
            hang: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Fail the `call`-th upload (1-based, counted across runs)
    pub fn failing_on(log: CallLog, call: usize) -> Self {
        let uploads = Self::new(log);
        *uploads.fail_on.lock().unwrap() = Some(call);
        uploads
    }

    /// Never answer
    pub fn hanging(log: CallLog) -> Self {
        Self {
            hang: true,
            ..Self::new(log)
        }
    }

    pub fn calls(&self) -> Vec<UploadCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl UploadClient for FakeUploads {
    async fn upload_photo(
        &self,
        data: Vec<u8>,
        filename: &str,
        session_id: Option<&str>,
    ) -> Result<String, ApiError> {
        self.log.lock().unwrap().push("upload".to_string());
        let n = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(UploadCall {
                filename: filename.to_string(),
                session_id: session_id.map(str::to_string),
                size: data.len(),
            });
            calls.len()
        };
        if self.hang {
            return std::future::pending().await;
        }
        if *self.fail_on.lock().unwrap() == Some(n) {
            return Err(ApiError::Transport("connection reset".into()));
        }
        Ok(format!("url{}", n))
    }
}

/// Settings source with a fixed answer
pub struct FakeSettings(pub Option<String>);

#[async_trait]
impl SettingsSource for FakeSettings {
    async fn default_event_slug(&self) -> Option<String> {
        self.0.clone()
    }
}

/// Everything a test needs to drive and inspect a booth
pub struct Harness {
    pub booth: Arc<CaptureOrchestrator>,
    pub camera: Arc<CameraProbe>,
    pub sessions: Arc<FakeSessions>,
    pub uploads: Arc<FakeUploads>,
    pub log: CallLog,
}

pub struct HarnessBuilder {
    camera: FakeCamera,
    log: CallLog,
    sessions: Option<FakeSessions>,
    uploads: Option<FakeUploads>,
    settings: Option<String>,
    options: CaptureOptions,
}

impl HarnessBuilder {
    pub fn new() -> Self {
        Self {
            camera: FakeCamera::working(),
            log: CallLog::default(),
            sessions: None,
            uploads: None,
            settings: None,
            options: CaptureOptions::default(),
        }
    }

    pub fn log(&self) -> CallLog {
        Arc::clone(&self.log)
    }

    pub fn camera(mut self, camera: FakeCamera) -> Self {
        self.camera = camera;
        self
    }

    pub fn sessions(mut self, sessions: FakeSessions) -> Self {
        self.sessions = Some(sessions);
        self
    }

    pub fn uploads(mut self, uploads: FakeUploads) -> Self {
        self.uploads = Some(uploads);
        self
    }

    pub fn settings(mut self, slug: Option<&str>) -> Self {
        self.settings = slug.map(str::to_string);
        self
    }

    pub fn options(mut self, options: CaptureOptions) -> Self {
        self.options = options;
        self
    }

    pub fn build(self) -> Harness {
        let probe = self.camera.probe();
        let sessions = Arc::new(
            self.sessions
                .unwrap_or_else(|| FakeSessions::new(Arc::clone(&self.log))),
        );
        let uploads = Arc::new(
            self.uploads
                .unwrap_or_else(|| FakeUploads::new(Arc::clone(&self.log))),
        );
        let camera = CameraManager::with_backend(
            Arc::new(self.camera),
            StreamRequest::new(CameraSourceType::TestPattern),
        );
        let booth = Arc::new(CaptureOrchestrator::new(
            camera,
            sessions.clone(),
            uploads.clone(),
            Arc::new(FakeSettings(self.settings)),
            self.options,
        ));

        Harness {
            booth,
            camera: probe,
            sessions,
            uploads,
            log: self.log,
        }
    }
}

impl Default for HarnessBuilder {
    fn default() -> Self {
        Self::new()
    }
}
