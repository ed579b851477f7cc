// SPDX-License-Identifier: MPL-2.0

use super::snapshot::Stage;
use tokio::sync::watch;
use tracing::info;

/// Holder of the current stage
///
/// Only the orchestrator calls [`StageController::set_stage`]; anything else
/// subscribes.
#[derive(Debug)]
pub struct StageController {
    stage: watch::Sender<Stage>,
}

impl StageController {
    pub fn new() -> Self {
        let (stage, _) = watch::channel(Stage::Greeting);
        Self { stage }
    }

    /// Move to `stage`; returns false when already there
    pub fn set_stage(&self, stage: Stage) -> bool {
        self.stage.send_if_modified(|current| {
            if *current == stage {
                return false;
            }
            info!(from = %current, to = %stage, "Stage transition");
            *current = stage;
            true
        })
    }

    pub fn current_stage(&self) -> Stage {
        *self.stage.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<Stage> {
        self.stage.subscribe()
    }
}

impl Default for StageController {
    fn default() -> Self {
        Self::new()
    }
}
