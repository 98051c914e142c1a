// SPDX-FileCopyrightText: 2026 Wabot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Repeating, cancellable driver around [`Scheduler::tick`].

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use wabot_core::WabotError;

use crate::engine::{Scheduler, TickOutcome};

/// Starts the background tick loop.
pub struct SchedulerRunner;

impl SchedulerRunner {
    /// Spawn a loop that ticks every `interval`, starting immediately.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(scheduler: Arc<Scheduler>, interval: Duration) -> SchedulerHandle {
        Self::start_with_token(scheduler, interval, CancellationToken::new())
    }

    /// Like [`SchedulerRunner::start`], stopping when `cancel` (or a parent token) fires.
    pub fn start_with_token(
        scheduler: Arc<Scheduler>,
        interval: Duration,
        cancel: CancellationToken,
    ) -> SchedulerHandle {
        let token = cancel.clone();
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            info!(interval_secs = interval.as_secs(), "scheduler started");

            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        // A tick in progress runs to completion before cancellation is seen.
                        log_outcome(&scheduler.tick(Utc::now()).await);
                    }
                }
            }
            info!("scheduler stopped");
        });

        SchedulerHandle { cancel, task }
    }
}

fn log_outcome(outcome: &TickOutcome) {
    match outcome {
        TickOutcome::Completed(reports) if !reports.is_empty() => {
            let delivered = reports.iter().filter(|r| r.is_delivered()).count();
            info!(processed = reports.len(), delivered, "tick complete");
        }
        TickOutcome::Completed(_) => debug!("tick complete, nothing due"),
        TickOutcome::Skipped(_) | TickOutcome::Overlapped => {}
    }
}

/// Handle to a running tick loop.
pub struct SchedulerHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Token that stops the loop when cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Cancel the loop and wait for it to exit.
    pub async fn stop(self) -> Result<(), WabotError> {
        self.cancel.cancel();
        self.task
            .await
            .map_err(|e| WabotError::Internal(format!("scheduler task failed: {e}")))
    }
}
