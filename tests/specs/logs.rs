//! Log rotation: expired daily files disappear after a run.

use crate::prelude::*;
use jobmill_core::{NewTask, RunStatus};
use std::time::Duration;

#[tokio::test(flavor = "multi_thread")]
async fn expired_run_logs_are_pruned_after_a_run() {
    let pipeline = start_pipeline(|config| config.log_backup_count = 7).await;
    let log_dir = pipeline.config().log_dir.clone();
    std::fs::create_dir_all(&log_dir).unwrap();
    std::fs::write(log_dir.join("run_20200101.out.log"), "ancient").unwrap();
    std::fs::write(log_dir.join("run_20200101.err.log"), "ancient").unwrap();
    std::fs::write(log_dir.join("unrelated.log"), "keep me").unwrap();

    let now = chrono::Utc::now();
    let task = pipeline
        .store()
        .create_task(&NewTask::shell("logger", "echo fresh"), now)
        .unwrap();
    let run_id = pipeline.store().enqueue_run(task.id, None, now).unwrap();

    let done = {
        let store = std::sync::Arc::clone(pipeline.store());
        wait_until(Duration::from_secs(10), move || {
            store
                .run(run_id)
                .unwrap()
                .is_some_and(|r| r.status == RunStatus::Success)
        })
        .await
    };
    assert!(done);

    assert!(!log_dir.join("run_20200101.out.log").exists());
    assert!(!log_dir.join("run_20200101.err.log").exists());
    assert!(log_dir.join("unrelated.log").exists());

    let run = pipeline.store().run(run_id).unwrap().unwrap();
    assert!(std::path::Path::new(run.stdout_path.as_deref().unwrap()).exists());

    pipeline.stop().await;
}
