// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use jobmill_core::{
    DeadlineSpec, FakeClock, FixedCalendar, HolidayPolicy, NewTask, RunStatus,
};
use yare::parameterized;

fn t0() -> DateTime<Utc> {
    "2025-06-02T08:00:00Z".parse().unwrap()
}

struct Harness {
    store: Arc<Store>,
    evaluator: TriggerEvaluator<FakeClock>,
}

fn setup(oracle: FixedCalendar) -> Harness {
    let store = Arc::new(Store::open_in_memory().unwrap());
    let evaluator = TriggerEvaluator::new(
        Arc::clone(&store),
        Arc::new(oracle),
        FakeClock::at(t0()),
        chrono_tz::UTC,
    );
    Harness { store, evaluator }
}

impl Harness {
    fn task(&self, enabled: bool) -> i64 {
        let new = NewTask {
            enabled,
            ..NewTask::shell(format!("task-{}", self.store.task_count().unwrap()), "true")
        };
        self.store.create_task(&new, t0()).unwrap().id
    }

    fn trigger(&self, task_id: i64, kind: TriggerKind, policy: HolidayPolicy) -> i64 {
        self.store
            .create_trigger(task_id, &kind, policy, true)
            .unwrap()
            .id
    }

    fn interval_trigger(&self, task_id: i64, seconds: u64) -> i64 {
        self.trigger(
            task_id,
            TriggerKind::Interval {
                interval_sec: seconds,
            },
            HolidayPolicy::None,
        )
    }
}

// ── Schedule building ────────────────────────────────────────────────────────

#[test]
fn interval_first_fire_is_one_period_after_start() {
    let h = setup(FixedCalendar::workday());
    let task_id = h.task(true);
    let trigger_id = h.interval_trigger(task_id, 30);

    let entries = h.evaluator.build_schedule(t0()).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].trigger_id, trigger_id);
    assert_eq!(entries[0].next_fire, t0() + ChronoDuration::seconds(30));
}

#[test]
fn cron_next_fire_matches_the_expression() {
    let h = setup(FixedCalendar::workday());
    let task_id = h.task(true);
    h.trigger(
        task_id,
        TriggerKind::Cron {
            expr: "30 9 * * *".into(),
        },
        HolidayPolicy::None,
    );

    let entries = h.evaluator.build_schedule(t0()).unwrap();
    assert_eq!(entries.len(), 1);
    // 08:00 UTC on 2025-06-02 → next 09:30 UTC the same day.
    assert_eq!(
        entries[0].next_fire,
        "2025-06-02T09:30:00Z".parse::<DateTime<Utc>>().unwrap()
    );
}

#[parameterized(
    four_fields = { "* * * *" },
    six_fields = { "0 * * * * *" },
    garbage_field = { "* * * * notaday" },
)]
fn malformed_cron_is_skipped(expr: &str) {
    let h = setup(FixedCalendar::workday());
    let task_id = h.task(true);
    h.trigger(
        task_id,
        TriggerKind::Cron { expr: expr.into() },
        HolidayPolicy::None,
    );

    assert!(h.evaluator.build_schedule(t0()).unwrap().is_empty());
}

#[test]
fn zero_interval_is_skipped() {
    let h = setup(FixedCalendar::workday());
    let task_id = h.task(true);
    h.interval_trigger(task_id, 0);
    assert!(h.evaluator.build_schedule(t0()).unwrap().is_empty());
}

#[test]
fn deadline_period_floors_at_one_hour() {
    let h = setup(FixedCalendar::workday());
    let task_id = h.task(true);
    h.trigger(
        task_id,
        TriggerKind::Deadline(DeadlineSpec {
            deadline_at: t0() + ChronoDuration::days(1),
            start_before_days: 2,
            interval_hours: 0,
        }),
        HolidayPolicy::None,
    );

    let entries = h.evaluator.build_schedule(t0()).unwrap();
    assert_eq!(entries[0].next_fire, t0() + ChronoDuration::hours(1));
}

// ── Firing and gates ─────────────────────────────────────────────────────────

#[test]
fn due_entries_enqueue_pending_runs() {
    let h = setup(FixedCalendar::workday());
    let task_id = h.task(true);
    let trigger_id = h.interval_trigger(task_id, 10);

    let mut entries = h.evaluator.build_schedule(t0()).unwrap();
    h.evaluator
        .fire_due(&mut entries, t0() + ChronoDuration::seconds(10));

    let runs = h.store.runs_for_task(task_id).unwrap();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].status, RunStatus::Pending);
    assert_eq!(runs[0].trigger_id, Some(trigger_id));
}

#[test]
fn entries_not_yet_due_stay_quiet() {
    let h = setup(FixedCalendar::workday());
    let task_id = h.task(true);
    h.interval_trigger(task_id, 10);

    let mut entries = h.evaluator.build_schedule(t0()).unwrap();
    h.evaluator
        .fire_due(&mut entries, t0() + ChronoDuration::seconds(9));

    assert!(h.store.runs_for_task(task_id).unwrap().is_empty());
}

#[test]
fn missed_periods_fire_once_not_in_a_burst() {
    let h = setup(FixedCalendar::workday());
    let task_id = h.task(true);
    h.interval_trigger(task_id, 10);

    let mut entries = h.evaluator.build_schedule(t0()).unwrap();
    let late = t0() + ChronoDuration::seconds(95);
    h.evaluator.fire_due(&mut entries, late);

    assert_eq!(h.store.runs_for_task(task_id).unwrap().len(), 1);
    assert!(entries[0].next_fire > late);
}

#[test]
fn disabled_trigger_skips_on_fire() {
    let h = setup(FixedCalendar::workday());
    let task_id = h.task(true);
    let trigger_id = h.interval_trigger(task_id, 10);
    h.store.set_trigger_enabled(trigger_id, false).unwrap();

    let decision = h.evaluator.fire(trigger_id, t0()).unwrap();
    assert_eq!(decision, FireDecision::Skipped("trigger disabled"));
    assert!(h.store.runs_for_task(task_id).unwrap().is_empty());
}

#[test]
fn disabled_task_skips_on_fire() {
    let h = setup(FixedCalendar::workday());
    let task_id = h.task(false);
    let trigger_id = h.interval_trigger(task_id, 10);

    let decision = h.evaluator.fire(trigger_id, t0()).unwrap();
    assert_eq!(decision, FireDecision::Skipped("task disabled"));
}

#[test]
fn deleted_trigger_skips_on_fire() {
    let h = setup(FixedCalendar::workday());
    let task_id = h.task(true);
    let trigger_id = h.interval_trigger(task_id, 10);
    h.store.delete_trigger(trigger_id).unwrap();

    let decision = h.evaluator.fire(trigger_id, t0()).unwrap();
    assert_eq!(decision, FireDecision::Skipped("trigger deleted"));
}

// ── Holiday gating ───────────────────────────────────────────────────────────

#[parameterized(
    none_on_workday = { HolidayPolicy::None, true, true },
    none_on_restday = { HolidayPolicy::None, false, true },
    workday_only_on_workday = { HolidayPolicy::CnWorkdayOnly, true, true },
    workday_only_on_restday = { HolidayPolicy::CnWorkdayOnly, false, false },
    skip_holiday_on_workday = { HolidayPolicy::SkipCnHoliday, true, true },
    skip_holiday_on_restday = { HolidayPolicy::SkipCnHoliday, false, false },
    skip_workday_on_workday = { HolidayPolicy::SkipCnWorkday, true, false },
    skip_workday_on_restday = { HolidayPolicy::SkipCnWorkday, false, true },
)]
fn holiday_policies_gate_firing(policy: HolidayPolicy, workday: bool, fires: bool) {
    let oracle = if workday {
        FixedCalendar::workday()
    } else {
        FixedCalendar::restday()
    };
    let h = setup(oracle);
    let task_id = h.task(true);
    let trigger_id = h.trigger(
        task_id,
        TriggerKind::Interval { interval_sec: 10 },
        policy,
    );

    let decision = h.evaluator.fire(trigger_id, t0()).unwrap();
    if fires {
        assert!(matches!(decision, FireDecision::Enqueued(_)));
    } else {
        assert_eq!(decision, FireDecision::Skipped("holiday policy"));
    }
}

#[test]
fn oracle_without_coverage_always_allows() {
    let h = setup(FixedCalendar::unavailable());
    let task_id = h.task(true);
    let trigger_id = h.trigger(
        task_id,
        TriggerKind::Interval { interval_sec: 10 },
        HolidayPolicy::CnWorkdayOnly,
    );

    assert!(matches!(
        h.evaluator.fire(trigger_id, t0()).unwrap(),
        FireDecision::Enqueued(_)
    ));
}

// ── Deadline window ──────────────────────────────────────────────────────────

fn deadline_trigger(h: &Harness, task_id: i64) -> (i64, DeadlineSpec) {
    let spec = DeadlineSpec {
        deadline_at: "2025-06-10T18:00:00Z".parse().unwrap(),
        start_before_days: 2,
        interval_hours: 1,
    };
    let id = h.trigger(task_id, TriggerKind::Deadline(spec), HolidayPolicy::None);
    (id, spec)
}

#[test]
fn deadline_before_window_skips() {
    let h = setup(FixedCalendar::workday());
    let task_id = h.task(true);
    let (trigger_id, spec) = deadline_trigger(&h, task_id);

    let three_days_early = spec.deadline_at - ChronoDuration::days(3);
    let decision = h.evaluator.fire(trigger_id, three_days_early).unwrap();
    assert_eq!(decision, FireDecision::Skipped("before deadline window"));
    assert!(h.store.trigger(trigger_id).unwrap().unwrap().enabled);
}

#[test]
fn deadline_inside_window_enqueues() {
    let h = setup(FixedCalendar::workday());
    let task_id = h.task(true);
    let (trigger_id, spec) = deadline_trigger(&h, task_id);

    let inside = spec.deadline_at - ChronoDuration::days(1);
    assert!(matches!(
        h.evaluator.fire(trigger_id, inside).unwrap(),
        FireDecision::Enqueued(_)
    ));

    // The window boundary itself still fires.
    assert!(matches!(
        h.evaluator.fire(trigger_id, spec.deadline_at).unwrap(),
        FireDecision::Enqueued(_)
    ));
}

#[test]
fn deadline_past_disables_the_trigger() {
    let h = setup(FixedCalendar::workday());
    let task_id = h.task(true);
    let (trigger_id, spec) = deadline_trigger(&h, task_id);

    let past = spec.deadline_at + ChronoDuration::seconds(1);
    let decision = h.evaluator.fire(trigger_id, past).unwrap();
    assert_eq!(decision, FireDecision::Disabled);
    assert!(!h.store.trigger(trigger_id).unwrap().unwrap().enabled);

    // Once disabled, later firings skip without enqueueing.
    let decision = h.evaluator.fire(trigger_id, past).unwrap();
    assert_eq!(decision, FireDecision::Skipped("trigger disabled"));
    assert!(h.store.runs_for_task(task_id).unwrap().is_empty());
}

#[test]
fn disabled_entries_drop_from_the_schedule() {
    let h = setup(FixedCalendar::workday());
    let task_id = h.task(true);
    let (_, spec) = deadline_trigger(&h, task_id);

    let mut entries = h.evaluator.build_schedule(t0()).unwrap();
    assert_eq!(entries.len(), 1);

    let past = spec.deadline_at + ChronoDuration::hours(2);
    // Force the entry due, then fire past the deadline.
    entries[0].next_fire = past;
    h.evaluator.fire_due(&mut entries, past);
    assert!(entries.is_empty());
}
