//! S1: a 1-second interval schedule task runs to SUCCESS and logs output.

use crate::prelude::*;
use jobmill_core::{HolidayPolicy, NewTask, RunStatus, TriggerKind};
use std::time::Duration;

#[tokio::test(flavor = "multi_thread")]
async fn interval_schedule_task_succeeds_and_logs() {
    let pipeline = start_pipeline(|_| {}).await;
    let now = chrono::Utc::now();

    let task = pipeline
        .store()
        .create_task(&NewTask::shell("hello", "echo hi; exit 0"), now)
        .unwrap();
    pipeline
        .store()
        .create_trigger(
            task.id,
            &TriggerKind::Interval { interval_sec: 1 },
            HolidayPolicy::None,
            true,
        )
        .unwrap();

    let succeeded = {
        let store = std::sync::Arc::clone(pipeline.store());
        let task_id = task.id;
        wait_until(Duration::from_secs(15), move || {
            store
                .runs_for_task(task_id)
                .unwrap()
                .iter()
                .any(|r| r.status == RunStatus::Success && r.exit_code == Some(0))
        })
        .await
    };
    assert!(succeeded, "a run should reach SUCCESS within a few seconds");

    let run = pipeline
        .store()
        .runs_for_task(task.id)
        .unwrap()
        .into_iter()
        .find(|r| r.status == RunStatus::Success)
        .unwrap();
    assert!(run.trigger_id.is_some(), "run should come from the trigger");
    assert!(run.scheduled_at <= run.started_at.unwrap());
    assert!(run.started_at.unwrap() <= run.finished_at.unwrap());

    let out = std::fs::read_to_string(run.stdout_path.as_deref().unwrap()).unwrap();
    assert!(out.contains("task=hello"));
    assert!(out.contains("hi"));

    assert_eq!(pipeline.notifier().push_count(), 0);
    pipeline.stop().await;
}
