//! S3: an overlong child is group-killed and classified TIMEOUT.

use crate::prelude::*;
use jobmill_core::{AlertKind, NewTask, RunStatus};
use std::time::Duration;

#[tokio::test(flavor = "multi_thread")]
async fn overlong_run_times_out_with_exec_alert() {
    let pipeline = start_pipeline(|config| config.default_timeout_sec = 2).await;
    let now = chrono::Utc::now();

    let task = pipeline
        .store()
        .create_task(&NewTask::shell("sleeper", "sleep 30"), now)
        .unwrap();
    let run_id = pipeline.store().enqueue_run(task.id, None, now).unwrap();

    let started = std::time::Instant::now();
    let timed_out = {
        let store = std::sync::Arc::clone(pipeline.store());
        wait_until(Duration::from_secs(15), move || {
            store
                .run(run_id)
                .unwrap()
                .is_some_and(|r| r.status == RunStatus::Timeout)
        })
        .await
    };
    assert!(timed_out, "run should classify as TIMEOUT");
    assert!(
        started.elapsed() < Duration::from_secs(12),
        "TERM→grace→KILL must finish well before the child's sleep"
    );

    let run = pipeline.store().run(run_id).unwrap().unwrap();
    assert!(matches!(run.exit_code, Some(124) | Some(137)));

    let alerts = pipeline.store().alerts_for_task(task.id).unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].kind, AlertKind::ExecFailed);
    assert!(!alerts[0].suppressed);

    pipeline.stop().await;
}
