// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

mod alerts;
mod runs;
mod tasks;

use super::*;
use chrono::{DateTime, Utc};
use jobmill_core::NewTask;

/// Fixed base instant so tests control every timestamp.
pub(super) fn t0() -> DateTime<Utc> {
    "2025-06-02T08:00:00Z".parse().unwrap()
}

pub(super) fn t_plus(seconds: i64) -> DateTime<Utc> {
    t0() + chrono::Duration::seconds(seconds)
}

pub(super) fn store() -> Store {
    Store::open_in_memory().unwrap()
}

/// A task plus one pending run, the common fixture.
pub(super) fn task_with_pending_run(store: &Store) -> (i64, i64) {
    let task = store
        .create_task(&NewTask::shell("fixture", "true"), t0())
        .unwrap();
    let run_id = store.enqueue_run(task.id, None, t0()).unwrap();
    (task.id, run_id)
}

#[test]
fn open_creates_parent_directories() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested/deeper/app.db");
    let _store = Store::open(&path).unwrap();
    assert!(path.exists());
}

#[test]
fn open_is_idempotent_over_existing_schema() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("app.db");
    {
        let store = Store::open(&path).unwrap();
        store
            .create_task(&NewTask::shell("persisted", "true"), t0())
            .unwrap();
    }
    let store = Store::open(&path).unwrap();
    assert_eq!(store.task_count().unwrap(), 1);
}
