// SPDX-License-Identifier: MPL-2.0

//! GStreamer pipeline for live camera capture
//!
//! Every source ends in the same tail: decode if needed, convert to RGBA and
//! hand the newest frame to an appsink. The appsink callback publishes each
//! frame into a `watch` channel, so the stream always knows the latest frame
//! and preview surfaces can subscribe.

use super::super::types::*;
use super::super::CameraStream;
use crate::constants::{pipeline, timing};
use gstreamer::prelude::*;
use gstreamer_app::AppSink;
use gstreamer_video::VideoInfo;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::{debug, error, info, warn};

static FRAME_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Resolution constraint for one negotiation attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionConstraint {
    /// Exactly this size
    Exact(Resolution),
    /// Anything between `min` and `max` inclusive
    Range { min: Resolution, max: Resolution },
}

impl ResolutionConstraint {
    /// Attempts for a request: the ideal size first, then the acceptable range
    ///
    /// The range only exists when the ideal size covers the minimum.
    pub fn attempts(request: &StreamRequest) -> Vec<ResolutionConstraint> {
        let mut attempts = vec![ResolutionConstraint::Exact(request.ideal)];
        if request.ideal != request.minimum && request.ideal.covers(&request.minimum) {
            attempts.push(ResolutionConstraint::Range {
                min: request.minimum,
                max: request.ideal,
            });
        }
        attempts
    }

    fn fields(&self) -> String {
        match self {
            ResolutionConstraint::Exact(res) => {
                format!("width=(int){},height=(int){}", res.width, res.height)
            }
            ResolutionConstraint::Range { min, max } => format!(
                "width=(int)[{},{}],height=(int)[{},{}]",
                min.width, max.width, min.height, max.height
            ),
        }
    }

    /// Caps accepted from the source: raw video or MJPEG at this size
    pub fn source_caps(&self) -> String {
        let fields = self.fields();
        format!("video/x-raw,{};image/jpeg,{}", fields, fields)
    }
}

impl std::fmt::Display for ResolutionConstraint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResolutionConstraint::Exact(res) => write!(f, "{}", res),
            ResolutionConstraint::Range { min, max } => write!(f, "{}..{}", min, max),
        }
    }
}

/// Source element description for a concrete source type
pub fn source_description(source: CameraSourceType, device_path: Option<&str>) -> String {
    match source {
        CameraSourceType::PipeWire => {
            format!("pipewiresrc {}do-timestamp=true", pipewire_target(device_path))
        }
        CameraSourceType::V4l2 => match device_path {
            Some(path) => {
                let path = path.strip_prefix("v4l2:").unwrap_or(path);
                format!("v4l2src device={}", path)
            }
            None => "v4l2src".to_string(),
        },
        CameraSourceType::TestPattern => "videotestsrc is-live=true pattern=smpte".to_string(),
        CameraSourceType::Auto => {
            warn!("Auto source has no element of its own, using PipeWire");
            source_description(CameraSourceType::PipeWire, device_path)
        }
    }
}

/// Determine the PipeWire target property from a device path
fn pipewire_target(device_path: Option<&str>) -> String {
    match device_path {
        None => String::new(),
        Some(path) if path.starts_with("v4l2:") => format!("path={} ", path),
        Some(path) if path.starts_with("pipewire-serial-") => {
            let serial = path.strip_prefix("pipewire-serial-").unwrap_or(path);
            format!("target-object={} ", serial)
        }
        Some(path) if path.starts_with("pipewire-") => {
            let node_id = path.strip_prefix("pipewire-").unwrap_or(path);
            format!("target-object={} ", node_id)
        }
        Some(path) if path.starts_with("/dev/video") => format!("path=v4l2:{} ", path),
        Some(path) => {
            warn!(path, "Unknown device path format, using as PipeWire target");
            format!("target-object={} ", path)
        }
    }
}

/// Full launch description: source → size filter → decode → RGBA → appsink
pub fn build_pipeline_string(source_desc: &str, constraint: &ResolutionConstraint) -> String {
    format!(
        "{} ! capsfilter caps=\"{}\" ! \
         queue max-size-buffers={} leaky=downstream ! \
         decodebin ! \
         videoconvert n-threads={} ! \
         video/x-raw,format={} ! \
         appsink name={}",
        source_desc,
        constraint.source_caps(),
        pipeline::MAX_BUFFERS,
        pipeline::videoconvert_threads(),
        pipeline::OUTPUT_FORMAT,
        pipeline::SINK_NAME
    )
}

/// Map a GStreamer resource error code onto a tagged backend error
///
/// v4l2src reports EACCES as a failed open rather than `NotAuthorized`, so
/// open failures count as a permission problem.
pub fn classify_resource_error(
    code: Option<gstreamer::ResourceError>,
    detail: String,
) -> BackendError {
    use gstreamer::ResourceError;

    match code {
        Some(ResourceError::NotAuthorized)
        | Some(ResourceError::OpenRead)
        | Some(ResourceError::OpenReadWrite) => BackendError::PermissionDenied(detail),
        Some(ResourceError::NotFound) => BackendError::DeviceNotFound(detail),
        Some(ResourceError::Busy) => BackendError::DeviceBusy(detail),
        _ => BackendError::InitializationFailed(detail),
    }
}

/// Pop the first error from the bus and classify it
fn take_bus_error(pipeline: &gstreamer::Pipeline) -> Option<BackendError> {
    let bus = pipeline.bus()?;
    let msg = bus.timed_pop_filtered(
        gstreamer::ClockTime::from_mseconds(100),
        &[gstreamer::MessageType::Error],
    )?;

    match msg.view() {
        gstreamer::MessageView::Error(err) => {
            let glib_error = err.error();
            error!(
                error = %glib_error,
                debug = ?err.debug(),
                source = ?err.src().map(|s| s.name()),
                "GStreamer ERROR during pipeline start"
            );
            let detail = match err.debug() {
                Some(debug) => format!("{} ({})", glib_error, debug),
                None => glib_error.to_string(),
            };
            Some(classify_resource_error(
                glib_error.kind::<gstreamer::ResourceError>(),
                detail,
            ))
        }
        _ => None,
    }
}

/// Tear a pipeline down and wait until the device is closed
fn shutdown_pipeline(pipeline: &gstreamer::Pipeline) {
    let _ = pipeline.set_state(gstreamer::State::Null);
    let (result, state, _) = pipeline.state(gstreamer::ClockTime::from_seconds(
        timing::STOP_TIMEOUT_SECS,
    ));
    match result {
        Ok(_) => debug!(state = ?state, "Pipeline stopped"),
        Err(e) => debug!(error = ?e, state = ?state, "Pipeline state change had issues"),
    }
}

/// Running GStreamer capture stream
pub struct GStreamerStream {
    pipeline: gstreamer::Pipeline,
    appsink: AppSink,
    frames: Arc<FrameSender>,
    stopped: bool,
}

impl GStreamerStream {
    /// Launch a pipeline and wait until the device is streaming
    pub fn launch(source_desc: &str, constraint: &ResolutionConstraint) -> BackendResult<Self> {
        let description = build_pipeline_string(source_desc, constraint);
        info!(pipeline = %description, %constraint, "Launching capture pipeline");

        let pipeline = gstreamer::parse::launch(&description)
            .map_err(|e| BackendError::InitializationFailed(e.to_string()))?
            .dynamic_cast::<gstreamer::Pipeline>()
            .map_err(|_| BackendError::InitializationFailed("Failed to cast to pipeline".into()))?;

        let appsink = pipeline
            .by_name(pipeline::SINK_NAME)
            .ok_or_else(|| BackendError::InitializationFailed("Failed to get appsink".into()))?
            .dynamic_cast::<AppSink>()
            .map_err(|_| BackendError::InitializationFailed("Failed to cast appsink".into()))?;

        appsink.set_property("sync", false);
        appsink.set_property("max-buffers", pipeline::MAX_BUFFERS);
        appsink.set_property("drop", true);
        appsink.set_property("enable-last-sample", false);

        let (sender, _) = tokio::sync::watch::channel(None);
        let frames = Arc::new(sender);
        let callback_frames = Arc::clone(&frames);

        appsink.set_callbacks(
            gstreamer_app::AppSinkCallbacks::builder()
                .new_sample(move |appsink| {
                    let frame_num = FRAME_COUNTER.fetch_add(1, Ordering::Relaxed);
                    let sample = appsink.pull_sample().map_err(|_| gstreamer::FlowError::Eos)?;
                    let buffer = sample.buffer().ok_or(gstreamer::FlowError::Error)?;
                    let caps = sample.caps().ok_or(gstreamer::FlowError::Error)?;
                    let video_info =
                        VideoInfo::from_caps(caps).map_err(|_| gstreamer::FlowError::Error)?;
                    let map = buffer
                        .map_readable()
                        .map_err(|_| gstreamer::FlowError::Error)?;

                    let frame = CameraFrame {
                        width: video_info.width(),
                        height: video_info.height(),
                        stride: video_info.stride()[0] as u32,
                        data: Arc::from(map.as_slice()),
                        captured_at: Instant::now(),
                    };

                    if frame_num % timing::FRAME_LOG_INTERVAL == 0 {
                        debug!(
                            frame = frame_num,
                            width = frame.width,
                            height = frame.height,
                            stride = frame.stride,
                            "Frame received"
                        );
                    }

                    callback_frames.send_replace(Some(Arc::new(frame)));
                    Ok(gstreamer::FlowSuccess::Ok)
                })
                .build(),
        );

        if let Err(e) = pipeline.set_state(gstreamer::State::Playing) {
            let err = take_bus_error(&pipeline).unwrap_or_else(|| {
                BackendError::InitializationFailed(format!("Failed to start pipeline: {}", e))
            });
            shutdown_pipeline(&pipeline);
            return Err(err);
        }

        let (result, state, pending) = pipeline.state(gstreamer::ClockTime::from_seconds(
            timing::START_TIMEOUT_SECS,
        ));
        debug!(?result, ?state, ?pending, "Pipeline state");

        if let Some(err) = take_bus_error(&pipeline) {
            shutdown_pipeline(&pipeline);
            return Err(err);
        }
        if result.is_err() {
            shutdown_pipeline(&pipeline);
            return Err(BackendError::InitializationFailed(format!(
                "Pipeline failed to start (state: {:?})",
                state
            )));
        }
        if state != gstreamer::State::Playing {
            // Live sources may still be negotiating; frames arrive once ready
            warn!(?state, ?pending, "Pipeline is not in PLAYING state yet");
        }

        info!("Capture pipeline running");
        Ok(Self {
            pipeline,
            appsink,
            frames,
            stopped: false,
        })
    }
}

impl CameraStream for GStreamerStream {
    fn latest_frame(&self) -> Option<Arc<CameraFrame>> {
        self.frames.borrow().clone()
    }

    fn preview_receiver(&self) -> FrameReceiver {
        self.frames.subscribe()
    }

    fn stop(&mut self) -> BackendResult<()> {
        if self.stopped {
            return Ok(());
        }
        info!("Stopping capture pipeline");
        self.appsink
            .set_callbacks(gstreamer_app::AppSinkCallbacks::builder().build());
        self.pipeline
            .set_state(gstreamer::State::Null)
            .map_err(|e| BackendError::Other(format!("Failed to stop pipeline: {}", e)))?;
        shutdown_pipeline(&self.pipeline);
        self.frames.send_replace(None);
        self.stopped = true;
        Ok(())
    }
}

impl Drop for GStreamerStream {
    fn drop(&mut self) {
        if !self.stopped {
            debug!("Dropping capture pipeline - explicitly stopping");
            self.appsink
                .set_callbacks(gstreamer_app::AppSinkCallbacks::builder().build());
            let _ = self.pipeline.set_state(gstreamer::State::Null);
        }
    }
}
