// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Alert engine: suppression windowing plus notifier dispatch.

use chrono::{DateTime, Duration, Utc};
use jobmill_adapters::Notifier;
use jobmill_core::AlertKind;
use jobmill_storage::Store;
use std::sync::Arc;

/// Raises alerts for a task, suppressing repeats per (task, kind).
///
/// The suppression decision and the alert row land in one store
/// transaction; delivery happens after, fire-and-forget. Nothing in here
/// ever propagates an error into the run pipeline.
#[derive(Clone)]
pub struct AlertEngine<N: Notifier> {
    store: Arc<Store>,
    notifier: N,
    suppress_window: Duration,
}

impl<N: Notifier> AlertEngine<N> {
    pub fn new(store: Arc<Store>, notifier: N, suppress_sec: u64) -> Self {
        Self {
            store,
            notifier,
            suppress_window: Duration::seconds(suppress_sec as i64),
        }
    }

    /// Record one alert attempt and deliver it unless suppressed.
    pub async fn raise(&self, task_id: i64, kind: AlertKind, message: &str, now: DateTime<Utc>) {
        let outcome =
            match self
                .store
                .record_alert(task_id, kind, message, self.suppress_window, now)
            {
                Ok(outcome) => outcome,
                Err(err) => {
                    tracing::error!(task_id, kind = %kind, %err, "failed to record alert");
                    return;
                }
            };

        if outcome.suppressed {
            tracing::debug!(task_id, kind = %kind, "alert suppressed");
            return;
        }

        tracing::info!(task_id, kind = %kind, message, "raising alert");
        if let Err(err) = self.notifier.push(message).await {
            tracing::warn!(task_id, kind = %kind, %err, "alert delivery failed");
        }
    }
}

#[cfg(test)]
#[path = "alerts_tests.rs"]
mod tests;
