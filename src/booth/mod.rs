// SPDX-License-Identifier: MPL-2.0

//! Capture orchestration
//!
//! - [`orchestrator`]: the run state machine and its commands
//! - [`countdown`]: per-photo tick-down
//! - [`stage`]: holder of the current stage
//! - [`snapshot`]: read-only state and closed error kinds for screens

pub mod countdown;
pub mod orchestrator;
pub mod snapshot;
pub mod stage;

pub use countdown::CountdownTimer;
pub use orchestrator::{CaptureOptions, CaptureOrchestrator};
pub use snapshot::{BoothError, BoothSnapshot, CaptureRun, Photo, Stage};
pub use stage::StageController;
