// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use jobmill_core::{DeadlineSpec, HolidayPolicy, TaskKind, TriggerKind};

// ── Tasks ────────────────────────────────────────────────────────────────────

#[test]
fn create_and_fetch_task() {
    let store = store();
    let created = store
        .create_task(&NewTask::shell("nightly", "echo hi"), t0())
        .unwrap();

    let fetched = store.task(created.id).unwrap().unwrap();
    assert_eq!(fetched, created);
    assert_eq!(fetched.kind, TaskKind::Schedule);
    assert_eq!(fetched.command_template.as_deref(), Some("echo hi"));
    assert_eq!(fetched.created_at, t0());
}

#[test]
fn task_names_are_unique() {
    let store = store();
    store
        .create_task(&NewTask::shell("dup", "true"), t0())
        .unwrap();
    assert!(store
        .create_task(&NewTask::shell("dup", "false"), t0())
        .is_err());
}

#[test]
fn fetch_by_name() {
    let store = store();
    let created = store
        .create_task(&NewTask::monitor("probe", "printf 'OUT=1\\n'"), t0())
        .unwrap();
    let fetched = store.task_by_name("probe").unwrap().unwrap();
    assert_eq!(fetched.id, created.id);
    assert_eq!(fetched.kind, TaskKind::Monitor);
    assert!(store.task_by_name("absent").unwrap().is_none());
}

#[test]
fn update_task_bumps_updated_at() {
    let store = store();
    let mut task = store
        .create_task(&NewTask::shell("edit-me", "true"), t0())
        .unwrap();

    task.command_template = Some("false".into());
    task.enabled = false;
    assert!(store.update_task(&task, t_plus(60)).unwrap());

    let fetched = store.task(task.id).unwrap().unwrap();
    assert_eq!(fetched.command_template.as_deref(), Some("false"));
    assert!(!fetched.enabled);
    assert_eq!(fetched.created_at, t0());
    assert_eq!(fetched.updated_at, t_plus(60));
}

#[test]
fn set_enabled_flag() {
    let store = store();
    let task = store
        .create_task(&NewTask::shell("toggle", "true"), t0())
        .unwrap();

    assert!(store.set_task_enabled(task.id, false, t_plus(1)).unwrap());
    assert!(!store.task(task.id).unwrap().unwrap().enabled);
    assert!(!store.set_task_enabled(9999, false, t_plus(1)).unwrap());
}

#[test]
fn delete_task_cascades_to_triggers_and_runs() {
    let store = store();
    let task = store
        .create_task(&NewTask::shell("doomed", "true"), t0())
        .unwrap();
    let trigger = store
        .create_trigger(
            task.id,
            &TriggerKind::Interval { interval_sec: 10 },
            HolidayPolicy::None,
            true,
        )
        .unwrap();
    let run_id = store.enqueue_run(task.id, Some(trigger.id), t0()).unwrap();

    assert!(store.delete_task(task.id).unwrap());
    assert!(store.task(task.id).unwrap().is_none());
    assert!(store.trigger(trigger.id).unwrap().is_none());
    assert!(store.run(run_id).unwrap().is_none());
}

// ── Triggers ─────────────────────────────────────────────────────────────────

#[test]
fn interval_trigger_round_trips() {
    let store = store();
    let task = store
        .create_task(&NewTask::shell("t", "true"), t0())
        .unwrap();
    let created = store
        .create_trigger(
            task.id,
            &TriggerKind::Interval { interval_sec: 30 },
            HolidayPolicy::CnWorkdayOnly,
            true,
        )
        .unwrap();

    let fetched = store.trigger(created.id).unwrap().unwrap();
    assert_eq!(fetched, created);
}

#[test]
fn cron_trigger_round_trips() {
    let store = store();
    let task = store
        .create_task(&NewTask::shell("t", "true"), t0())
        .unwrap();
    let created = store
        .create_trigger(
            task.id,
            &TriggerKind::Cron {
                expr: "*/5 * * * *".into(),
            },
            HolidayPolicy::None,
            true,
        )
        .unwrap();

    let fetched = store.trigger(created.id).unwrap().unwrap();
    assert_eq!(fetched.kind, created.kind);
}

#[test]
fn deadline_trigger_round_trips_config_json() {
    let store = store();
    let task = store
        .create_task(&NewTask::shell("t", "true"), t0())
        .unwrap();
    let spec = DeadlineSpec {
        deadline_at: "2025-06-10T18:00:00Z".parse().unwrap(),
        start_before_days: 2,
        interval_hours: 4,
    };
    let created = store
        .create_trigger(
            task.id,
            &TriggerKind::Deadline(spec),
            HolidayPolicy::SkipCnHoliday,
            true,
        )
        .unwrap();

    let fetched = store.trigger(created.id).unwrap().unwrap();
    assert_eq!(fetched.kind, TriggerKind::Deadline(spec));
    assert_eq!(fetched.holiday_policy, HolidayPolicy::SkipCnHoliday);
}

#[test]
fn update_trigger_rewrites_kind_and_policy() {
    let store = store();
    let task = store
        .create_task(&NewTask::shell("t", "true"), t0())
        .unwrap();
    let mut trigger = store
        .create_trigger(
            task.id,
            &TriggerKind::Interval { interval_sec: 30 },
            HolidayPolicy::None,
            true,
        )
        .unwrap();

    trigger.kind = TriggerKind::Cron {
        expr: "0 9 * * 1-5".into(),
    };
    trigger.holiday_policy = HolidayPolicy::CnWorkdayOnly;
    trigger.enabled = false;
    assert!(store.update_trigger(&trigger).unwrap());

    // Stale interval payload is gone; the row decodes as the new kind.
    let fetched = store.trigger(trigger.id).unwrap().unwrap();
    assert_eq!(fetched, trigger);
}

#[test]
fn update_trigger_switches_back_to_interval() {
    let store = store();
    let task = store
        .create_task(&NewTask::shell("t", "true"), t0())
        .unwrap();
    let spec = DeadlineSpec {
        deadline_at: "2025-06-10T18:00:00Z".parse().unwrap(),
        start_before_days: 1,
        interval_hours: 2,
    };
    let mut trigger = store
        .create_trigger(
            task.id,
            &TriggerKind::Deadline(spec),
            HolidayPolicy::None,
            true,
        )
        .unwrap();

    trigger.kind = TriggerKind::Interval { interval_sec: 45 };
    assert!(store.update_trigger(&trigger).unwrap());

    let fetched = store.trigger(trigger.id).unwrap().unwrap();
    assert_eq!(fetched.kind, TriggerKind::Interval { interval_sec: 45 });
}

#[test]
fn update_trigger_with_unknown_id_changes_nothing() {
    let store = store();
    let task = store
        .create_task(&NewTask::shell("t", "true"), t0())
        .unwrap();
    let mut trigger = store
        .create_trigger(
            task.id,
            &TriggerKind::Interval { interval_sec: 30 },
            HolidayPolicy::None,
            true,
        )
        .unwrap();

    trigger.id = 9999;
    assert!(!store.update_trigger(&trigger).unwrap());
}

#[test]
fn list_enabled_skips_disabled_triggers() {
    let store = store();
    let task = store
        .create_task(&NewTask::shell("t", "true"), t0())
        .unwrap();
    let on = store
        .create_trigger(
            task.id,
            &TriggerKind::Interval { interval_sec: 5 },
            HolidayPolicy::None,
            true,
        )
        .unwrap();
    store
        .create_trigger(
            task.id,
            &TriggerKind::Interval { interval_sec: 5 },
            HolidayPolicy::None,
            false,
        )
        .unwrap();

    let enabled = store.list_enabled_triggers().unwrap();
    assert_eq!(enabled.len(), 1);
    assert_eq!(enabled[0].id, on.id);
}

#[test]
fn disabling_a_trigger_sticks() {
    let store = store();
    let task = store
        .create_task(&NewTask::shell("t", "true"), t0())
        .unwrap();
    let trigger = store
        .create_trigger(
            task.id,
            &TriggerKind::Interval { interval_sec: 5 },
            HolidayPolicy::None,
            true,
        )
        .unwrap();

    assert!(store.set_trigger_enabled(trigger.id, false).unwrap());
    assert!(!store.trigger(trigger.id).unwrap().unwrap().enabled);
    assert!(store.list_enabled_triggers().unwrap().is_empty());
}

#[test]
fn malformed_trigger_rows_are_skipped_on_list() {
    let store = store();
    let task = store
        .create_task(&NewTask::shell("t", "true"), t0())
        .unwrap();
    // Interval trigger with no interval payload, inserted behind the API.
    {
        let conn = store.conn.lock();
        conn.execute(
            "INSERT INTO triggers (task_id, trigger_type, holiday_policy, enabled) \
             VALUES (?1, 'interval', 'NONE', 1)",
            [task.id],
        )
        .unwrap();
    }
    assert!(store.list_enabled_triggers().unwrap().is_empty());
}
