// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Demo seeding for a fresh database.

use chrono::{DateTime, Utc};
use jobmill_core::{HolidayPolicy, NewTask, TaskKind, TriggerKind};
use jobmill_storage::{Store, StoreError};

/// Create a demo schedule task and a demo monitor task when the task table
/// is empty. Returns whether anything was seeded.
pub fn seed_demo_tasks(store: &Store, now: DateTime<Utc>) -> Result<bool, StoreError> {
    if store.task_count()? > 0 {
        return Ok(false);
    }

    let hello = store.create_task(
        &NewTask {
            name: "hello_schedule".into(),
            kind: Some(TaskKind::Schedule),
            command_template: Some("echo 'hello schedule'; exit 0".into()),
            timeout_sec_default: 10,
            enabled: true,
            ..Default::default()
        },
        now,
    )?;
    store.create_trigger(
        hello.id,
        &TriggerKind::Interval { interval_sec: 30 },
        HolidayPolicy::None,
        true,
    )?;

    let monitor = store.create_task(
        &NewTask {
            name: "demo_monitor".into(),
            kind: Some(TaskKind::Monitor),
            command_template: Some("printf 'OUT=cpu=23.5\\ttemp=67.2\\n'; exit 0".into()),
            timeout_sec_default: 5,
            enabled: true,
            ..Default::default()
        },
        now,
    )?;
    store.create_trigger(
        monitor.id,
        &TriggerKind::Interval { interval_sec: 2 },
        HolidayPolicy::None,
        true,
    )?;

    Ok(true)
}

#[cfg(test)]
#[path = "seed_tests.rs"]
mod tests;
