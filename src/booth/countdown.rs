// SPDX-License-Identifier: MPL-2.0

//! Per-photo countdown

use crate::constants::capture::COUNTDOWN_TICK;
use futures::{Stream, StreamExt};
use std::time::Duration;
use tracing::debug;

/// Whole-second tick-down
///
/// `run(3)` shows 3 immediately, 2 after one tick, 1 after two, and resolves
/// after three. It never yields 0.
#[derive(Debug, Clone, Copy)]
pub struct CountdownTimer {
    tick: Duration,
}

impl CountdownTimer {
    pub fn new(tick: Duration) -> Self {
        Self { tick }
    }

    /// Values `seconds..=1`, one per tick; the stream ends one tick after 1
    pub fn ticks(&self, seconds: u32) -> impl Stream<Item = u32> + Send + 'static {
        let period = self.tick;
        async_stream::stream! {
            if seconds > 0 {
                let mut interval = tokio::time::interval(period);
                for value in (1..=seconds).rev() {
                    interval.tick().await;
                    yield value;
                }
                interval.tick().await;
            }
        }
    }

    /// Run to completion, calling `on_tick` with each value shown
    pub async fn run<F>(&self, seconds: u32, mut on_tick: F)
    where
        F: FnMut(u32),
    {
        let ticks = self.ticks(seconds);
        futures::pin_mut!(ticks);
        while let Some(value) = ticks.next().await {
            debug!(value, "Countdown tick");
            on_tick(value);
        }
    }
}

impl Default for CountdownTimer {
    fn default() -> Self {
        Self::new(COUNTDOWN_TICK)
    }
}
