// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle management: startup, shutdown.

use crate::notifier::AlertNotifier;
use jobmill_core::{Catalog, ChineseCalendar, Config, SystemClock};
use jobmill_engine::{Dispatcher, Executor, TriggerEvaluator};
use jobmill_storage::Store;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// How long shutdown waits for in-flight runs before detaching.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("store error: {0}")]
    Store(#[from] jobmill_storage::StoreError),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// A started daemon: background loops plus the handles to stop them.
pub struct Daemon {
    pub store: Arc<Store>,
    pub catalog: Arc<Catalog>,
    /// Poke to force a trigger-schedule rebuild after mutations.
    pub reload: Arc<Notify>,
    shutdown_tx: watch::Sender<bool>,
    evaluator_handle: JoinHandle<()>,
    dispatcher_handle: JoinHandle<()>,
}

/// Open the store, load the catalogue, and spawn the scheduling and
/// dispatching loops.
pub async fn startup(config: Arc<Config>) -> Result<Daemon, LifecycleError> {
    let store = Arc::new(Store::open(&config.db_path())?);
    info!(db = %config.db_path().display(), "store opened");

    let catalog = Arc::new(Catalog::new(&config.jobs_file));
    catalog.reload();
    if let Some(diagnostic) = catalog.diagnostic() {
        warn!(%diagnostic, "job catalogue failed to load, continuing with previous snapshot");
    } else {
        info!(jobs = catalog.snapshot().len(), "job catalogue loaded");
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let evaluator = TriggerEvaluator::new(
        Arc::clone(&store),
        Arc::new(ChineseCalendar::new()),
        SystemClock,
        config.timezone,
    );
    let reload = evaluator.reload_handle();
    let evaluator_handle = tokio::spawn(evaluator.run(shutdown_rx.clone()));

    let executor = Arc::new(Executor::new(
        Arc::clone(&store),
        Arc::clone(&catalog),
        AlertNotifier::from_config(&config),
        SystemClock,
        Arc::clone(&config),
    ));
    let dispatcher = Dispatcher::new(executor, config.max_workers);
    let dispatcher_handle = tokio::spawn(dispatcher.run(shutdown_rx));

    info!(max_workers = config.max_workers, "daemon started");
    Ok(Daemon {
        store,
        catalog,
        reload,
        shutdown_tx,
        evaluator_handle,
        dispatcher_handle,
    })
}

impl Daemon {
    /// Stop intake and wait for in-flight runs to finish.
    ///
    /// Runs still PENDING stay PENDING; anything RUNNING when the drain
    /// timeout expires is eventually reclaimed by the zombie sweep.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);

        if tokio::time::timeout(DRAIN_TIMEOUT, self.dispatcher_handle)
            .await
            .is_err()
        {
            warn!("dispatcher did not drain in time, detaching");
        }
        if tokio::time::timeout(Duration::from_secs(5), self.evaluator_handle)
            .await
            .is_err()
        {
            warn!("trigger evaluator did not stop in time, detaching");
        }
        info!("daemon stopped");
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
