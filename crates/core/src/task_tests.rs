// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn kind_round_trips_through_text() {
    assert_eq!(TaskKind::Schedule.as_str(), "schedule");
    assert_eq!(TaskKind::Monitor.as_str(), "monitor");
    assert_eq!(TaskKind::parse("schedule"), Some(TaskKind::Schedule));
    assert_eq!(TaskKind::parse("monitor"), Some(TaskKind::Monitor));
    assert_eq!(TaskKind::parse("workflow"), None);
}

#[test]
fn shell_builder_defaults() {
    let new = NewTask::shell("nightly", "echo hi");
    assert_eq!(new.kind(), TaskKind::Schedule);
    assert_eq!(new.command_template.as_deref(), Some("echo hi"));
    assert!(new.enabled);
    assert!(new.job_id.is_none());
    assert_eq!(new.timeout_sec_default, 0);
}

#[test]
fn monitor_builder_sets_kind() {
    let new = NewTask::monitor("probe", "printf 'OUT=1\\n'");
    assert_eq!(new.kind(), TaskKind::Monitor);
}

#[test]
fn unset_kind_defaults_to_schedule() {
    let new = NewTask {
        name: "x".into(),
        ..Default::default()
    };
    assert_eq!(new.kind(), TaskKind::Schedule);
}
