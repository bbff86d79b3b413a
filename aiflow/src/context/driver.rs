//! Async driver: steps a context on a tokio interval.

use std::time::Duration;

use tokio::time::{self, MissedTickBehavior};

use super::execution::{ContextStatus, ExecutionContext};

impl ExecutionContext {
    /// Ticks every `period` until the context is finished or cancelled.
    ///
    /// Each step receives `period` as its delta time, so a run is reproducible
    /// regardless of scheduling jitter.
    pub async fn drive(&mut self, period: Duration) -> ContextStatus {
        self.drive_for(period, u64::MAX).await
    }

    /// Like [`drive`](Self::drive) but stops after `max_ticks` steps; the
    /// returned status is `Running` when the limit was hit first.
    pub async fn drive_for(&mut self, period: Duration, max_ticks: u64) -> ContextStatus {
        let mut interval = time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // the first tick completes immediately
        interval.tick().await;

        let dt = period.as_secs_f32();
        let mut ticks = 0;
        while !self.is_terminal() && ticks < max_ticks {
            interval.tick().await;
            self.tick(dt);
            ticks += 1;
        }
        self.status()
    }
}
