// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker pool dispatcher.
//!
//! A single loop polls the store for PENDING runs (oldest `scheduled_at`
//! first) and submits them to a semaphore-bounded set of worker tasks. The
//! loop never blocks on pool capacity: when no permit is free the remaining
//! runs stay PENDING and are picked up on a later tick. The atomic claim in
//! the executor makes double-submission across ticks harmless.

use crate::Executor;
use jobmill_adapters::Notifier;
use jobmill_core::Clock;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Semaphore};

/// Poll cadence for the PENDING queue.
const POLL_INTERVAL: Duration = Duration::from_millis(500);

pub struct Dispatcher<N: Notifier, C: Clock> {
    executor: Arc<Executor<N, C>>,
    semaphore: Arc<Semaphore>,
    max_workers: usize,
    poll_interval: Duration,
}

impl<N: Notifier, C: Clock> Dispatcher<N, C> {
    pub fn new(executor: Arc<Executor<N, C>>, max_workers: usize) -> Self {
        Self {
            executor,
            semaphore: Arc::new(Semaphore::new(max_workers)),
            max_workers,
            poll_interval: POLL_INTERVAL,
        }
    }

    /// Override the poll cadence (tests).
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Run until `shutdown` flips, then drain in-flight workers.
    ///
    /// Shutdown stops intake only: runs already submitted finish normally,
    /// and anything still PENDING is picked up after the next start.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut tick = tokio::time::interval(self.poll_interval);
        tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = tick.tick() => {
                    if let Err(err) = self.dispatch_tick() {
                        tracing::error!(%err, "dispatch tick failed");
                    }
                }
                changed = shutdown.changed() => {
                    // A dropped sender counts as shutdown.
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        tracing::info!("dispatcher stopping, draining in-flight runs");
        let _drained = self
            .semaphore
            .acquire_many(self.max_workers as u32)
            .await;
        tracing::info!("dispatcher stopped");
    }

    /// One poll: submit up to `max_workers` pending runs without blocking.
    fn dispatch_tick(&self) -> Result<(), crate::EngineError> {
        let pending = self.executor.store().pending_run_ids(self.max_workers)?;
        for run_id in pending {
            let permit = match Arc::clone(&self.semaphore).try_acquire_owned() {
                Ok(permit) => permit,
                // Pool full: leave the rest PENDING for the next tick.
                Err(_) => break,
            };
            let executor = Arc::clone(&self.executor);
            tokio::spawn(async move {
                executor.execute_run(run_id).await;
                drop(permit);
            });
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "dispatcher_tests.rs"]
mod tests;
