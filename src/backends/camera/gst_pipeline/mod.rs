// SPDX-License-Identifier: GPL-3.0-only

//! GStreamer camera backend
//!
//! Handles PipeWire, V4L2 and the synthetic test pattern through one pipeline
//! shape. `Auto` tries PipeWire first and falls back to V4L2.

mod pipeline;

pub use pipeline::{
    GStreamerStream, ResolutionConstraint, build_pipeline_string, classify_resource_error,
    source_description,
};

use super::types::*;
use super::{CameraBackend, CameraStream};
use tracing::{debug, info, warn};

/// GStreamer-backed camera source
#[derive(Debug, Clone)]
pub struct GStreamerBackend {
    source: CameraSourceType,
}

impl GStreamerBackend {
    pub fn new(source: CameraSourceType) -> Self {
        Self { source }
    }

    /// Concrete sources to try for this backend, in order
    fn candidates(&self) -> Vec<CameraSourceType> {
        match self.source {
            CameraSourceType::Auto => CameraSourceType::AUTO_ORDER.to_vec(),
            other => vec![other],
        }
    }

    fn element_available(source: CameraSourceType) -> bool {
        source
            .element_name()
            .is_some_and(|name| gstreamer::ElementFactory::find(name).is_some())
    }

    /// Open one concrete source, trying each resolution constraint in turn
    ///
    /// Only negotiation failures move on to the next constraint; permission,
    /// busy and missing-device errors are final.
    fn open_source(
        source: CameraSourceType,
        request: &StreamRequest,
    ) -> BackendResult<GStreamerStream> {
        let source_desc = source_description(source, request.device_path.as_deref());
        let mut last_error = None;

        for constraint in ResolutionConstraint::attempts(request) {
            match GStreamerStream::launch(&source_desc, &constraint) {
                Ok(stream) => {
                    info!(%source, %constraint, "Camera stream opened");
                    return Ok(stream);
                }
                Err(BackendError::InitializationFailed(msg)) => {
                    debug!(%source, %constraint, error = %msg, "Negotiation failed, relaxing constraint");
                    last_error = Some(BackendError::InitializationFailed(msg));
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or_else(|| {
            BackendError::InitializationFailed("No resolution constraint to try".into())
        }))
    }
}

impl CameraBackend for GStreamerBackend {
    fn backend_type(&self) -> CameraSourceType {
        self.source
    }

    fn is_available(&self) -> bool {
        if gstreamer::init().is_err() {
            return false;
        }
        self.candidates().into_iter().any(Self::element_available)
    }

    fn open(&self, request: &StreamRequest) -> BackendResult<Box<dyn CameraStream>> {
        gstreamer::init().map_err(|e| BackendError::NotAvailable(e.to_string()))?;

        let available: Vec<_> = self
            .candidates()
            .into_iter()
            .filter(|s| Self::element_available(*s))
            .collect();
        if available.is_empty() {
            return Err(BackendError::NotAvailable(format!(
                "no GStreamer source element for {}",
                self.source
            )));
        }

        let mut last_error = None;
        for source in available {
            match Self::open_source(source, request) {
                Ok(stream) => return Ok(Box::new(stream)),
                Err(e @ (BackendError::PermissionDenied(_) | BackendError::DeviceBusy(_))) => {
                    return Err(e);
                }
                Err(e) => {
                    warn!(%source, error = %e, "Camera source failed");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| BackendError::DeviceNotFound("no camera".into())))
    }
}
