//! S4: two back-to-back runs of one task; exactly one proceeds, the other
//! is demoted by the reentrancy mutex.

use crate::prelude::*;
use jobmill_core::{AlertKind, NewTask, RunStatus};
use std::time::Duration;

#[tokio::test(flavor = "multi_thread")]
async fn second_concurrent_run_fails_with_99() {
    let pipeline = start_pipeline(|_| {}).await;
    let now = chrono::Utc::now();

    let task = pipeline
        .store()
        .create_task(&NewTask::shell("exclusive", "sleep 2; echo done"), now)
        .unwrap();
    let first = pipeline.store().enqueue_run(task.id, None, now).unwrap();
    let second = pipeline.store().enqueue_run(task.id, None, now).unwrap();

    let both_terminal = {
        let store = std::sync::Arc::clone(pipeline.store());
        wait_until(Duration::from_secs(20), move || {
            [first, second].iter().all(|&id| {
                store
                    .run(id)
                    .unwrap()
                    .is_some_and(|r| r.status.is_terminal())
            })
        })
        .await
    };
    assert!(both_terminal, "both runs should reach a terminal state");

    let runs = [
        pipeline.store().run(first).unwrap().unwrap(),
        pipeline.store().run(second).unwrap().unwrap(),
    ];
    let succeeded: Vec<_> = runs
        .iter()
        .filter(|r| r.status == RunStatus::Success)
        .collect();
    let demoted: Vec<_> = runs
        .iter()
        .filter(|r| r.status == RunStatus::Failed && r.exit_code == Some(99))
        .collect();
    assert_eq!(succeeded.len(), 1, "exactly one run proceeds: {runs:?}");
    assert_eq!(demoted.len(), 1, "exactly one run is demoted: {runs:?}");
    assert_eq!(
        demoted[0].error_message.as_deref(),
        Some("Task is already RUNNING (non-reentrant).")
    );

    let alerts = pipeline.store().alerts_for_task(task.id).unwrap();
    assert!(alerts.iter().any(|a| a.kind == AlertKind::Reentry));

    pipeline.stop().await;
}
