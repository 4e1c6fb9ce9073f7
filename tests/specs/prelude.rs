//! Shared pipeline harness for the behavioural specs.

use jobmill_adapters::FakeNotifier;
use jobmill_core::{Catalog, ChineseCalendar, Config, SystemClock};
use jobmill_engine::{Dispatcher, Executor, TriggerEvaluator};
use jobmill_storage::Store;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Store, catalogue, and config over a temp dir — no background loops.
pub struct Bench {
    pub dir: tempfile::TempDir,
    pub config: Arc<Config>,
    pub store: Arc<Store>,
    pub catalog: Arc<Catalog>,
    pub notifier: FakeNotifier,
}

pub fn bench(tweak: impl FnOnce(&mut Config)) -> Bench {
    let dir = tempfile::tempdir().unwrap();
    let mut config = Config {
        db_url: dir.path().join("app.db").display().to_string(),
        log_dir: dir.path().join("logs"),
        metrics_dir: dir.path().join("metrics"),
        jobs_file: dir.path().join("jobs.json"),
        max_workers: 4,
        default_timeout_sec: 10,
        ..Config::default()
    };
    tweak(&mut config);
    let config = Arc::new(config);

    let store = Arc::new(Store::open(&config.db_path()).unwrap());
    let catalog = Arc::new(Catalog::new(&config.jobs_file));
    catalog.reload();

    Bench {
        dir,
        config,
        store,
        catalog,
        notifier: FakeNotifier::new(),
    }
}

impl Bench {
    /// An executor wired to this bench's store.
    pub fn executor(&self) -> Arc<Executor<FakeNotifier, SystemClock>> {
        Arc::new(Executor::new(
            Arc::clone(&self.store),
            Arc::clone(&self.catalog),
            self.notifier.clone(),
            SystemClock,
            Arc::clone(&self.config),
        ))
    }
}

/// A running pipeline: evaluator + dispatcher loops over a [`Bench`].
pub struct Pipeline {
    pub bench: Bench,
    shutdown_tx: watch::Sender<bool>,
    handles: Vec<JoinHandle<()>>,
}

/// Start evaluator and dispatcher loops with spec-friendly settings.
pub async fn start_pipeline(tweak: impl FnOnce(&mut Config)) -> Pipeline {
    let bench = bench(tweak);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let evaluator = TriggerEvaluator::new(
        Arc::clone(&bench.store),
        Arc::new(ChineseCalendar::new()),
        SystemClock,
        bench.config.timezone,
    );
    let evaluator_handle = tokio::spawn(evaluator.run(shutdown_rx.clone()));

    let dispatcher = Dispatcher::new(bench.executor(), bench.config.max_workers)
        .with_poll_interval(Duration::from_millis(100));
    let dispatcher_handle = tokio::spawn(dispatcher.run(shutdown_rx));

    Pipeline {
        bench,
        shutdown_tx,
        handles: vec![evaluator_handle, dispatcher_handle],
    }
}

impl Pipeline {
    pub fn store(&self) -> &Arc<Store> {
        &self.bench.store
    }

    pub fn config(&self) -> &Arc<Config> {
        &self.bench.config
    }

    pub fn notifier(&self) -> &FakeNotifier {
        &self.bench.notifier
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.bench.catalog
    }

    /// Stop intake and wait for the loops to drain.
    pub async fn stop(self) {
        let _ = self.shutdown_tx.send(true);
        for handle in self.handles {
            let _ = tokio::time::timeout(Duration::from_secs(30), handle).await;
        }
    }
}

/// Poll `cond` until it holds or `timeout` passes.
pub async fn wait_until(timeout: Duration, cond: impl Fn() -> bool) -> bool {
    let start = Instant::now();
    while start.elapsed() < timeout {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    cond()
}
