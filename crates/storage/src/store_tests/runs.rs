// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use jobmill_core::RunStatus;

// ── Lifecycle ────────────────────────────────────────────────────────────────

#[test]
fn enqueue_inserts_pending() {
    let store = store();
    let (task_id, run_id) = task_with_pending_run(&store);

    let run = store.run(run_id).unwrap().unwrap();
    assert_eq!(run.task_id, task_id);
    assert_eq!(run.status, RunStatus::Pending);
    assert_eq!(run.scheduled_at, t0());
    assert!(run.started_at.is_none());
    assert!(run.finished_at.is_none());
}

#[test]
fn claim_moves_pending_to_running_once() {
    let store = store();
    let (_, run_id) = task_with_pending_run(&store);

    assert!(store.claim_run(run_id, t_plus(1)).unwrap());
    let run = store.run(run_id).unwrap().unwrap();
    assert_eq!(run.status, RunStatus::Running);
    assert_eq!(run.started_at, Some(t_plus(1)));

    // Second claim observes the row as taken.
    assert!(!store.claim_run(run_id, t_plus(2)).unwrap());
    let run = store.run(run_id).unwrap().unwrap();
    assert_eq!(run.started_at, Some(t_plus(1)));
}

#[test]
fn finish_requires_running() {
    let store = store();
    let (_, run_id) = task_with_pending_run(&store);

    // PENDING rows cannot jump to a terminal state.
    assert!(!store
        .finish_run(run_id, RunStatus::Success, Some(0), None, t_plus(5))
        .unwrap());

    assert!(store.claim_run(run_id, t_plus(1)).unwrap());
    assert!(store
        .finish_run(run_id, RunStatus::Success, Some(0), None, t_plus(5))
        .unwrap());

    let run = store.run(run_id).unwrap().unwrap();
    assert_eq!(run.status, RunStatus::Success);
    assert_eq!(run.exit_code, Some(0));
    assert_eq!(run.finished_at, Some(t_plus(5)));

    // Terminal rows never transition again.
    assert!(!store
        .finish_run(run_id, RunStatus::Failed, Some(1), None, t_plus(9))
        .unwrap());
    assert_eq!(store.run(run_id).unwrap().unwrap().status, RunStatus::Success);
}

#[test]
fn finish_rejects_non_terminal_targets() {
    let store = store();
    let (_, run_id) = task_with_pending_run(&store);
    store.claim_run(run_id, t_plus(1)).unwrap();

    for target in [RunStatus::Pending, RunStatus::Running] {
        let err = store
            .finish_run(run_id, target, None, None, t_plus(2))
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidTransition { .. }));
    }
    assert_eq!(store.run(run_id).unwrap().unwrap().status, RunStatus::Running);
}

#[test]
fn timestamps_are_ordered_through_the_lifecycle() {
    let store = store();
    let (_, run_id) = task_with_pending_run(&store);
    store.claim_run(run_id, t_plus(2)).unwrap();
    store
        .finish_run(run_id, RunStatus::Failed, Some(3), Some("boom"), t_plus(7))
        .unwrap();

    let run = store.run(run_id).unwrap().unwrap();
    let started = run.started_at.unwrap();
    let finished = run.finished_at.unwrap();
    assert!(run.scheduled_at <= started);
    assert!(started <= finished);
    assert_eq!(run.error_message.as_deref(), Some("boom"));
}

#[test]
fn pending_ids_come_oldest_first_and_capped() {
    let store = store();
    let task = store
        .create_task(&NewTask::shell("batch", "true"), t0())
        .unwrap();
    let r3 = store.enqueue_run(task.id, None, t_plus(30)).unwrap();
    let r1 = store.enqueue_run(task.id, None, t_plus(10)).unwrap();
    let r2 = store.enqueue_run(task.id, None, t_plus(20)).unwrap();

    assert_eq!(store.pending_run_ids(10).unwrap(), vec![r1, r2, r3]);
    assert_eq!(store.pending_run_ids(2).unwrap(), vec![r1, r2]);

    store.claim_run(r1, t_plus(40)).unwrap();
    assert_eq!(store.pending_run_ids(10).unwrap(), vec![r2, r3]);
}

#[test]
fn log_paths_are_recorded() {
    let store = store();
    let (_, run_id) = task_with_pending_run(&store);
    assert!(store
        .set_run_log_paths(run_id, "/logs/run.out.log", "/logs/run.err.log")
        .unwrap());
    let run = store.run(run_id).unwrap().unwrap();
    assert_eq!(run.stdout_path.as_deref(), Some("/logs/run.out.log"));
    assert_eq!(run.stderr_path.as_deref(), Some("/logs/run.err.log"));
}

#[test]
fn delete_run_removes_the_row() {
    let store = store();
    let (_, run_id) = task_with_pending_run(&store);
    assert!(store.delete_run(run_id).unwrap());
    assert!(store.run(run_id).unwrap().is_none());
    assert!(!store.delete_run(run_id).unwrap());
}

// ── Reentrancy probe ─────────────────────────────────────────────────────────

#[test]
fn earlier_claimer_is_a_predecessor() {
    let store = store();
    let task = store
        .create_task(&NewTask::shell("busy", "true"), t0())
        .unwrap();
    let first = store.enqueue_run(task.id, None, t0()).unwrap();
    let second = store.enqueue_run(task.id, None, t0()).unwrap();

    store.claim_run(first, t_plus(1)).unwrap();
    store.claim_run(second, t_plus(2)).unwrap();

    // The later claimer sees a predecessor; the earlier one does not.
    assert!(store
        .has_running_predecessor(task.id, second, t_plus(2))
        .unwrap());
    assert!(!store
        .has_running_predecessor(task.id, first, t_plus(1))
        .unwrap());

    // A finished predecessor no longer counts.
    store
        .finish_run(first, RunStatus::Success, Some(0), None, t_plus(3))
        .unwrap();
    assert!(!store
        .has_running_predecessor(task.id, second, t_plus(2))
        .unwrap());
}

#[test]
fn simultaneous_claims_break_the_tie_by_id() {
    let store = store();
    let task = store
        .create_task(&NewTask::shell("busy", "true"), t0())
        .unwrap();
    let first = store.enqueue_run(task.id, None, t0()).unwrap();
    let second = store.enqueue_run(task.id, None, t0()).unwrap();

    store.claim_run(first, t_plus(1)).unwrap();
    store.claim_run(second, t_plus(1)).unwrap();

    // Same started_at: exactly one run observes a predecessor.
    assert!(store
        .has_running_predecessor(task.id, second, t_plus(1))
        .unwrap());
    assert!(!store
        .has_running_predecessor(task.id, first, t_plus(1))
        .unwrap());
}

#[test]
fn peer_probe_ignores_other_tasks() {
    let store = store();
    let a = store
        .create_task(&NewTask::shell("a", "true"), t0())
        .unwrap();
    let b = store
        .create_task(&NewTask::shell("b", "true"), t0())
        .unwrap();
    let run_a = store.enqueue_run(a.id, None, t0()).unwrap();
    let run_b = store.enqueue_run(b.id, None, t0()).unwrap();
    store.claim_run(run_a, t_plus(1)).unwrap();
    store.claim_run(run_b, t_plus(2)).unwrap();

    assert!(!store
        .has_running_predecessor(b.id, run_b, t_plus(2))
        .unwrap());
}

// ── Zombie sweep ─────────────────────────────────────────────────────────────

#[test]
fn sweep_fails_stale_running_rows_only() {
    let store = store();
    let task = store
        .create_task(&NewTask::shell("stale", "true"), t0())
        .unwrap();
    let stale = store.enqueue_run(task.id, None, t0()).unwrap();
    let fresh = store.enqueue_run(task.id, None, t0()).unwrap();
    let pending = store.enqueue_run(task.id, None, t0()).unwrap();

    store.claim_run(stale, t0()).unwrap();
    store.claim_run(fresh, t_plus(3500)).unwrap();

    let swept = store
        .sweep_zombies(chrono::Duration::seconds(3600), t_plus(3700))
        .unwrap();
    assert_eq!(swept, 1);

    let stale = store.run(stale).unwrap().unwrap();
    assert_eq!(stale.status, RunStatus::Failed);
    assert_eq!(
        stale.error_message.as_deref(),
        Some("Zombie run auto-failed")
    );
    assert_eq!(stale.finished_at, Some(t_plus(3700)));

    assert_eq!(store.run(fresh).unwrap().unwrap().status, RunStatus::Running);
    assert_eq!(
        store.run(pending).unwrap().unwrap().status,
        RunStatus::Pending
    );
}

// ── Claim atomicity under contention ─────────────────────────────────────────

#[test]
fn exactly_one_of_many_claimers_wins() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("contended.db");

    let seed = Store::open(&path).unwrap();
    let (_, run_id) = task_with_pending_run(&seed);
    drop(seed);

    let mut handles = Vec::new();
    for _ in 0..8 {
        let path = path.clone();
        handles.push(std::thread::spawn(move || {
            let store = Store::open(&path).unwrap();
            store.claim_run(run_id, t_plus(1)).unwrap()
        }));
    }

    let wins: usize = handles
        .into_iter()
        .map(|h| h.join().unwrap() as usize)
        .sum();
    assert_eq!(wins, 1, "exactly one claimer may observe success");

    let store = Store::open(&path).unwrap();
    let run = store.run(run_id).unwrap().unwrap();
    assert_eq!(run.status, RunStatus::Running);
    assert_eq!(run.started_at, Some(t_plus(1)));
}
