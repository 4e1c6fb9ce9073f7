// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::Duration;
use jobmill_core::AlertKind;

fn window() -> Duration {
    Duration::seconds(900)
}

#[test]
fn first_alert_is_delivered_and_recorded() {
    let store = store();
    let outcome = store
        .record_alert(1, AlertKind::ExecFailed, "boom", window(), t0())
        .unwrap();

    assert!(!outcome.suppressed);
    let alerts = store.alerts_for_task(1).unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].kind, AlertKind::ExecFailed);
    assert_eq!(alerts[0].message, "boom");
    assert!(!alerts[0].suppressed);

    let state = store.alert_state(1, AlertKind::ExecFailed).unwrap().unwrap();
    assert_eq!(state.last_sent_at, Some(t0()));
}

#[test]
fn attempts_inside_the_window_are_suppressed_but_logged() {
    let store = store();
    store
        .record_alert(1, AlertKind::ExecFailed, "first", window(), t0())
        .unwrap();

    let outcome = store
        .record_alert(1, AlertKind::ExecFailed, "second", window(), t_plus(300))
        .unwrap();
    assert!(outcome.suppressed);

    let alerts = store.alerts_for_task(1).unwrap();
    assert_eq!(alerts.len(), 2);
    assert!(alerts[0].suppressed); // newest first

    // Suppressed attempts do not advance the window.
    let state = store.alert_state(1, AlertKind::ExecFailed).unwrap().unwrap();
    assert_eq!(state.last_sent_at, Some(t0()));
}

#[test]
fn window_expiry_delivers_again() {
    let store = store();
    store
        .record_alert(1, AlertKind::ExecFailed, "first", window(), t0())
        .unwrap();

    let outcome = store
        .record_alert(1, AlertKind::ExecFailed, "after window", window(), t_plus(900))
        .unwrap();
    assert!(!outcome.suppressed);

    let state = store.alert_state(1, AlertKind::ExecFailed).unwrap().unwrap();
    assert_eq!(state.last_sent_at, Some(t_plus(900)));
}

#[test]
fn suppression_is_scoped_per_task_and_kind() {
    let store = store();
    store
        .record_alert(1, AlertKind::ExecFailed, "task1 exec", window(), t0())
        .unwrap();

    // Different kind, same task: delivered.
    let other_kind = store
        .record_alert(1, AlertKind::Reentry, "task1 reentry", window(), t_plus(1))
        .unwrap();
    assert!(!other_kind.suppressed);

    // Same kind, different task: delivered.
    let other_task = store
        .record_alert(2, AlertKind::ExecFailed, "task2 exec", window(), t_plus(1))
        .unwrap();
    assert!(!other_task.suppressed);
}

#[test]
fn list_alerts_returns_newest_first_with_limit() {
    let store = store();
    for i in 0..5 {
        store
            .record_alert(
                1,
                AlertKind::InternalError,
                &format!("a{i}"),
                Duration::zero(),
                t_plus(i),
            )
            .unwrap();
    }
    let alerts = store.list_alerts(3).unwrap();
    assert_eq!(alerts.len(), 3);
    assert_eq!(alerts[0].message, "a4");
}

#[test]
fn zero_window_never_suppresses() {
    let store = store();
    for i in 0..3 {
        let outcome = store
            .record_alert(7, AlertKind::JobMissing, "m", Duration::zero(), t_plus(i))
            .unwrap();
        assert!(!outcome.suppressed);
    }
}
