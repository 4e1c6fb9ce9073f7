//! S2: a monitor task emits metrics to CSV and leaves no run rows behind.

use crate::prelude::*;
use jobmill_core::{HolidayPolicy, NewTask, TriggerKind};
use jobmill_engine::metrics_file_path;
use std::time::Duration;

#[tokio::test(flavor = "multi_thread")]
async fn monitor_task_persists_metrics_and_no_rows() {
    let pipeline = start_pipeline(|_| {}).await;
    let now = chrono::Utc::now();

    let task = pipeline
        .store()
        .create_task(
            &NewTask::monitor("probe", "printf 'OUT=cpu=23.5\\ttemp=67.2\\n'; exit 0"),
            now,
        )
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

    let csv_path = metrics_file_path(&pipeline.config().metrics_dir, task.id);
    let wrote_metrics = {
        let csv_path = csv_path.clone();
        wait_until(Duration::from_secs(15), move || {
            std::fs::read_to_string(&csv_path)
                .map(|text| text.contains("cpu,23.5") && text.contains("temp,67.2"))
                .unwrap_or(false)
        })
        .await
    };
    assert!(wrote_metrics, "metric rows should land in the per-task CSV");

    let text = std::fs::read_to_string(&csv_path).unwrap();
    for line in text.lines() {
        assert!(line.contains(&format!(",{},probe,", task.id)), "row: {line}");
    }

    let store = std::sync::Arc::clone(pipeline.store());
    pipeline.stop().await;

    // Clean monitor runs are deleted after their metrics commit; only rows
    // never dispatched before shutdown may remain.
    let rows = store.runs_for_task(task.id).unwrap();
    assert!(
        rows.iter()
            .all(|r| r.status == jobmill_core::RunStatus::Pending),
        "no completed monitor rows should persist: {rows:?}"
    );
}
