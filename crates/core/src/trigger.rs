// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Trigger records: the rules that enqueue runs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Deadline-window configuration.
///
/// The trigger fires on an internal period of `max(interval_hours, 1)` hours
/// and only enqueues while `deadline_at - start_before_days <= now <=
/// deadline_at`. Once the deadline passes, the trigger disables itself.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeadlineSpec {
    pub deadline_at: DateTime<Utc>,
    pub start_before_days: i64,
    pub interval_hours: i64,
}

impl DeadlineSpec {
    /// Seconds between internal firings.
    pub fn period_sec(&self) -> u64 {
        self.interval_hours.max(1) as u64 * 3600
    }

    /// Start of the enqueue window.
    pub fn start_at(&self) -> DateTime<Utc> {
        self.deadline_at - chrono::Duration::days(self.start_before_days)
    }
}

/// Kind-specific firing rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TriggerKind {
    /// Fire every `interval_sec` seconds from scheduler start.
    Interval { interval_sec: u64 },
    /// Fire at instants matching a 5-field cron expression in local time.
    Cron { expr: String },
    /// Fire periodically inside a window ending at a deadline.
    Deadline(DeadlineSpec),
}

impl TriggerKind {
    pub fn type_str(&self) -> &'static str {
        match self {
            TriggerKind::Interval { .. } => "interval",
            TriggerKind::Cron { .. } => "cron",
            TriggerKind::Deadline(_) => "deadline",
        }
    }
}

/// Gate applied on each firing against the Chinese calendar oracle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HolidayPolicy {
    None,
    CnWorkdayOnly,
    SkipCnHoliday,
    SkipCnWorkday,
}

impl HolidayPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            HolidayPolicy::None => "NONE",
            HolidayPolicy::CnWorkdayOnly => "CN_WORKDAY_ONLY",
            HolidayPolicy::SkipCnHoliday => "SKIP_CN_HOLIDAY",
            HolidayPolicy::SkipCnWorkday => "SKIP_CN_WORKDAY",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "NONE" => Some(HolidayPolicy::None),
            "CN_WORKDAY_ONLY" => Some(HolidayPolicy::CnWorkdayOnly),
            "SKIP_CN_HOLIDAY" => Some(HolidayPolicy::SkipCnHoliday),
            "SKIP_CN_WORKDAY" => Some(HolidayPolicy::SkipCnWorkday),
            _ => None,
        }
    }

    /// Whether the policy allows firing on `date`.
    ///
    /// Oracle answers of `None` (date outside its coverage, or no oracle at
    /// all) default to allowed for every policy.
    pub fn allows<O: crate::calendar::CalendarOracle + ?Sized>(
        &self,
        oracle: &O,
        date: chrono::NaiveDate,
    ) -> bool {
        match self {
            HolidayPolicy::None => true,
            HolidayPolicy::CnWorkdayOnly => oracle.is_workday(date).unwrap_or(true),
            HolidayPolicy::SkipCnHoliday => !oracle.is_holiday(date).unwrap_or(false),
            HolidayPolicy::SkipCnWorkday => !oracle.is_workday(date).unwrap_or(false),
        }
    }
}

impl fmt::Display for HolidayPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A rule that causes runs to be enqueued for one task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trigger {
    pub id: i64,
    pub task_id: i64,
    pub kind: TriggerKind,
    pub holiday_policy: HolidayPolicy,
    pub enabled: bool,
}

/// Quick structural check for a 5-field cron expression.
///
/// Full parse validation happens when the schedule is built; this guards the
/// field count so malformed strings are skipped on reload instead of fed to
/// the parser with a bogus seconds field prepended.
pub fn cron_field_count_ok(expr: &str) -> bool {
    expr.split_whitespace().count() == 5
}

#[cfg(test)]
#[path = "trigger_tests.rs"]
mod tests;
