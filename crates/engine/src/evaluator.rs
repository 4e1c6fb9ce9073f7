// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Trigger evaluator: the scheduling loop.
//!
//! Keeps an in-memory schedule built from the enabled triggers and rebuilds
//! it on start and whenever the reload handle is poked (trigger mutations).
//! Each firing re-reads the trigger and task rows, applies the holiday and
//! deadline gates, and inserts a PENDING run. The loop body never dies:
//! store errors are logged and the tick moves on.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use chrono_tz::Tz;
use jobmill_core::{cron_field_count_ok, CalendarOracle, Clock, Trigger, TriggerKind};
use jobmill_storage::{Store, StoreError};
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::{watch, Notify};

/// Scheduling resolution.
const TICK_INTERVAL: std::time::Duration = std::time::Duration::from_secs(1);

pub(crate) enum FireRule {
    /// Fixed period from scheduler start (interval and deadline triggers).
    Every(ChronoDuration),
    /// 5-field cron expression evaluated in the local timezone.
    Cron(Box<cron::Schedule>),
}

pub(crate) struct ScheduleEntry {
    pub(crate) trigger_id: i64,
    pub(crate) rule: FireRule,
    pub(crate) next_fire: DateTime<Utc>,
}

/// What one firing decided.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum FireDecision {
    Enqueued(i64),
    Skipped(&'static str),
    /// Deadline passed; the trigger disabled itself.
    Disabled,
}

pub struct TriggerEvaluator<C: Clock> {
    store: Arc<Store>,
    oracle: Arc<dyn CalendarOracle>,
    clock: C,
    tz: Tz,
    reload: Arc<Notify>,
}

impl<C: Clock> TriggerEvaluator<C> {
    pub fn new(store: Arc<Store>, oracle: Arc<dyn CalendarOracle>, clock: C, tz: Tz) -> Self {
        Self {
            store,
            oracle,
            clock,
            tz,
            reload: Arc::new(Notify::new()),
        }
    }

    /// Handle used to force a schedule rebuild after trigger mutations.
    pub fn reload_handle(&self) -> Arc<Notify> {
        Arc::clone(&self.reload)
    }

    /// Run the scheduling loop until `shutdown` flips.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut entries = self.rebuild(self.clock.now_utc());
        let mut tick = tokio::time::interval(TICK_INTERVAL);
        tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = tick.tick() => {
                    let now = self.clock.now_utc();
                    self.fire_due(&mut entries, now);
                }
                _ = self.reload.notified() => {
                    entries = self.rebuild(self.clock.now_utc());
                }
                changed = shutdown.changed() => {
                    // A dropped sender counts as shutdown.
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        tracing::info!("trigger evaluator stopped");
    }

    fn rebuild(&self, now: DateTime<Utc>) -> Vec<ScheduleEntry> {
        match self.build_schedule(now) {
            Ok(entries) => {
                tracing::info!(triggers = entries.len(), "schedule rebuilt");
                entries
            }
            Err(err) => {
                tracing::error!(%err, "schedule rebuild failed, keeping empty schedule");
                Vec::new()
            }
        }
    }

    /// Build schedule entries from the enabled triggers. Triggers whose
    /// payload cannot schedule (zero interval, malformed cron) are skipped.
    pub(crate) fn build_schedule(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<ScheduleEntry>, StoreError> {
        let mut entries = Vec::new();
        for trigger in self.store.list_enabled_triggers()? {
            if let Some(entry) = self.schedule_entry(&trigger, now) {
                entries.push(entry);
            }
        }
        Ok(entries)
    }

    fn schedule_entry(&self, trigger: &Trigger, now: DateTime<Utc>) -> Option<ScheduleEntry> {
        match &trigger.kind {
            TriggerKind::Interval { interval_sec } => {
                if *interval_sec == 0 {
                    tracing::warn!(trigger_id = trigger.id, "zero interval, skipping");
                    return None;
                }
                let period = ChronoDuration::seconds(*interval_sec as i64);
                Some(ScheduleEntry {
                    trigger_id: trigger.id,
                    rule: FireRule::Every(period),
                    next_fire: now + period,
                })
            }
            TriggerKind::Cron { expr } => {
                if !cron_field_count_ok(expr) {
                    tracing::warn!(
                        trigger_id = trigger.id,
                        expr,
                        "cron expression must have 5 fields, skipping"
                    );
                    return None;
                }
                // The cron crate wants a seconds field; pin it to zero.
                let schedule = match cron::Schedule::from_str(&format!("0 {expr}")) {
                    Ok(schedule) => schedule,
                    Err(err) => {
                        tracing::warn!(trigger_id = trigger.id, expr, %err, "invalid cron, skipping");
                        return None;
                    }
                };
                let next_fire = schedule
                    .after(&now.with_timezone(&self.tz))
                    .next()?
                    .with_timezone(&Utc);
                Some(ScheduleEntry {
                    trigger_id: trigger.id,
                    rule: FireRule::Cron(Box::new(schedule)),
                    next_fire,
                })
            }
            TriggerKind::Deadline(spec) => {
                let period = ChronoDuration::seconds(spec.period_sec() as i64);
                Some(ScheduleEntry {
                    trigger_id: trigger.id,
                    rule: FireRule::Every(period),
                    next_fire: now + period,
                })
            }
        }
    }

    /// Fire every due entry and advance its next-fire time. Entries whose
    /// trigger disabled itself are dropped until the next rebuild.
    pub(crate) fn fire_due(&self, entries: &mut Vec<ScheduleEntry>, now: DateTime<Utc>) {
        entries.retain_mut(|entry| {
            if entry.next_fire > now {
                return true;
            }
            let decision = match self.fire(entry.trigger_id, now) {
                Ok(decision) => decision,
                Err(err) => {
                    tracing::error!(trigger_id = entry.trigger_id, %err, "trigger firing failed");
                    FireDecision::Skipped("store error")
                }
            };
            match &decision {
                FireDecision::Enqueued(run_id) => {
                    tracing::info!(trigger_id = entry.trigger_id, run_id, "run enqueued");
                }
                FireDecision::Skipped(reason) => {
                    tracing::debug!(trigger_id = entry.trigger_id, reason, "firing skipped");
                }
                FireDecision::Disabled => {
                    tracing::info!(trigger_id = entry.trigger_id, "deadline passed, trigger disabled");
                    return false;
                }
            }
            self.advance(entry, now);
            true
        });
    }

    fn advance(&self, entry: &mut ScheduleEntry, now: DateTime<Utc>) {
        match &entry.rule {
            FireRule::Every(period) => {
                entry.next_fire = entry.next_fire + *period;
                // Skip missed firings instead of bursting through a backlog.
                while entry.next_fire <= now {
                    entry.next_fire = entry.next_fire + *period;
                }
            }
            FireRule::Cron(schedule) => {
                entry.next_fire = schedule
                    .after(&now.with_timezone(&self.tz))
                    .next()
                    .map(|dt| dt.with_timezone(&Utc))
                    // Expressions with no future instant stop firing.
                    .unwrap_or(DateTime::<Utc>::MAX_UTC);
            }
        }
    }

    /// One firing: reload the trigger row and apply the gates in order.
    pub(crate) fn fire(
        &self,
        trigger_id: i64,
        now: DateTime<Utc>,
    ) -> Result<FireDecision, StoreError> {
        let Some(trigger) = self.store.trigger(trigger_id)? else {
            return Ok(FireDecision::Skipped("trigger deleted"));
        };
        if !trigger.enabled {
            return Ok(FireDecision::Skipped("trigger disabled"));
        }
        let Some(task) = self.store.task(trigger.task_id)? else {
            return Ok(FireDecision::Skipped("task missing"));
        };
        if !task.enabled {
            return Ok(FireDecision::Skipped("task disabled"));
        }

        let local_date = now.with_timezone(&self.tz).date_naive();
        if !trigger.holiday_policy.allows(self.oracle.as_ref(), local_date) {
            return Ok(FireDecision::Skipped("holiday policy"));
        }

        if let TriggerKind::Deadline(spec) = &trigger.kind {
            if now < spec.start_at() {
                return Ok(FireDecision::Skipped("before deadline window"));
            }
            if now > spec.deadline_at {
                self.store.set_trigger_enabled(trigger.id, false)?;
                return Ok(FireDecision::Disabled);
            }
        }

        let run_id = self.store.enqueue_run(trigger.task_id, Some(trigger.id), now)?;
        Ok(FireDecision::Enqueued(run_id))
    }
}

#[cfg(test)]
#[path = "evaluator_tests.rs"]
mod tests;
