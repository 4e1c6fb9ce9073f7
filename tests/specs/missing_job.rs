//! S5: a task referencing an absent catalogue job fails with exit 97.

use crate::prelude::*;
use jobmill_core::{AlertKind, NewTask, RunStatus};
use std::time::Duration;

#[tokio::test(flavor = "multi_thread")]
async fn absent_catalogue_job_fails_the_run() {
    let pipeline = start_pipeline(|_| {}).await;
    std::fs::write(
        &pipeline.config().jobs_file,
        r#"[{"id": "real", "cmd": ["true"]}]"#,
    )
    .unwrap();
    assert!(pipeline.catalog().reload());

    let now = chrono::Utc::now();
    let task = pipeline
        .store()
        .create_task(
            &NewTask {
                name: "ghost-ref".into(),
                job_id: Some("ghost".into()),
                enabled: true,
                ..Default::default()
            },
            now,
        )
        .unwrap();
    let run_id = pipeline.store().enqueue_run(task.id, None, now).unwrap();

    let failed = {
        let store = std::sync::Arc::clone(pipeline.store());
        wait_until(Duration::from_secs(10), move || {
            store
                .run(run_id)
                .unwrap()
                .is_some_and(|r| r.status == RunStatus::Failed)
        })
        .await
    };
    assert!(failed);

    let run = pipeline.store().run(run_id).unwrap().unwrap();
    assert_eq!(run.exit_code, Some(97));
    assert_eq!(run.error_message.as_deref(), Some("Job not found: ghost"));

    let alerts = pipeline.store().alerts_for_task(task.id).unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].kind, AlertKind::JobMissing);

    pipeline.stop().await;
}
