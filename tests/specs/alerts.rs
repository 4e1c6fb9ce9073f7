//! Alert suppression and claim-atomicity properties.

use crate::prelude::*;
use jobmill_core::{NewTask, RunStatus};

#[tokio::test(flavor = "multi_thread")]
async fn repeated_failures_deliver_once_inside_the_window() {
    let bench = bench(|config| config.alert_suppress_sec = 900);
    let now = chrono::Utc::now();

    let task = bench
        .store
        .create_task(&NewTask::shell("flaky", "exit 1"), now)
        .unwrap();
    let executor = bench.executor();
    for _ in 0..3 {
        let run_id = bench.store.enqueue_run(task.id, None, now).unwrap();
        executor.execute_run(run_id).await;
    }

    let alerts = bench.store.alerts_for_task(task.id).unwrap();
    assert_eq!(alerts.len(), 3, "every attempt is recorded");
    assert_eq!(
        alerts.iter().filter(|a| !a.suppressed).count(),
        1,
        "only the first attempt is delivered"
    );
    assert_eq!(bench.notifier.push_count(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn concurrent_claimers_execute_a_run_exactly_once() {
    let bench = bench(|_| {});
    let now = chrono::Utc::now();

    let task = bench
        .store
        .create_task(&NewTask::shell("single-shot", "echo once"), now)
        .unwrap();
    let run_id = bench.store.enqueue_run(task.id, None, now).unwrap();

    // Race several executors at the same run id; the claim admits one.
    let executor = bench.executor();
    let mut joins = Vec::new();
    for _ in 0..4 {
        let executor = std::sync::Arc::clone(&executor);
        joins.push(tokio::spawn(async move {
            executor.execute_run(run_id).await;
        }));
    }
    for join in joins {
        join.await.unwrap();
    }

    let run = bench.store.run(run_id).unwrap().unwrap();
    assert_eq!(run.status, RunStatus::Success);

    // One claim means one header line in today's log.
    let out = std::fs::read_to_string(run.stdout_path.as_deref().unwrap()).unwrap();
    let headers = out
        .lines()
        .filter(|l| l.contains(&format!("run={run_id}")))
        .count();
    assert_eq!(headers, 1, "log:\n{out}");
}
