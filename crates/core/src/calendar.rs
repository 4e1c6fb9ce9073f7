// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Chinese workday/holiday oracle.
//!
//! Holiday gating asks two questions about a local calendar date: is it a
//! workday, and is it a rest day. The embedded table mirrors the State
//! Council arrangement (statutory holidays plus makeup workdays on
//! weekends). Dates outside the table's coverage answer `None`, which every
//! policy treats as "allowed".

use chrono::{Datelike, NaiveDate, Weekday};

/// Calendar query interface.
///
/// `is_holiday` means "rest day" in the Chinese-calendar sense: statutory
/// holidays and ordinary weekends alike, minus makeup workdays. It is the
/// complement of `is_workday` wherever the oracle has coverage.
pub trait CalendarOracle: Send + Sync {
    /// `Some(true)` if `date` is a working day, `None` outside coverage.
    fn is_workday(&self, date: NaiveDate) -> Option<bool>;

    /// `Some(true)` if `date` is a rest day, `None` outside coverage.
    fn is_holiday(&self, date: NaiveDate) -> Option<bool> {
        self.is_workday(date).map(|w| !w)
    }
}

/// Statutory holidays, 2025 (year, month, day).
const HOLIDAYS_2025: &[(u32, u32)] = &[
    // New Year
    (1, 1),
    // Spring Festival
    (1, 28),
    (1, 29),
    (1, 30),
    (1, 31),
    (2, 1),
    (2, 2),
    (2, 3),
    (2, 4),
    // Qingming
    (4, 4),
    (4, 5),
    (4, 6),
    // Labour Day
    (5, 1),
    (5, 2),
    (5, 3),
    (5, 4),
    (5, 5),
    // Dragon Boat
    (5, 31),
    (6, 1),
    (6, 2),
    // National Day + Mid-Autumn
    (10, 1),
    (10, 2),
    (10, 3),
    (10, 4),
    (10, 5),
    (10, 6),
    (10, 7),
    (10, 8),
];

/// Makeup workdays (weekend days worked), 2025.
const MAKEUP_WORKDAYS_2025: &[(u32, u32)] = &[(1, 26), (2, 8), (4, 27), (9, 28), (10, 11)];

/// Table-backed oracle for the official Chinese calendar.
#[derive(Clone, Copy, Debug, Default)]
pub struct ChineseCalendar;

impl ChineseCalendar {
    pub fn new() -> Self {
        Self
    }

    fn in_coverage(date: NaiveDate) -> bool {
        date.year() == 2025
    }
}

impl CalendarOracle for ChineseCalendar {
    fn is_workday(&self, date: NaiveDate) -> Option<bool> {
        if !Self::in_coverage(date) {
            return None;
        }
        let md = (date.month(), date.day());
        if HOLIDAYS_2025.contains(&md) {
            return Some(false);
        }
        if MAKEUP_WORKDAYS_2025.contains(&md) {
            return Some(true);
        }
        Some(!matches!(date.weekday(), Weekday::Sat | Weekday::Sun))
    }
}

/// Oracle returning a fixed answer, for tests.
#[cfg(any(test, feature = "test-support"))]
#[derive(Clone, Copy, Debug)]
pub struct FixedCalendar(Option<bool>);

#[cfg(any(test, feature = "test-support"))]
impl FixedCalendar {
    /// Every date is a workday.
    pub fn workday() -> Self {
        Self(Some(true))
    }

    /// Every date is a rest day.
    pub fn restday() -> Self {
        Self(Some(false))
    }

    /// No coverage for any date.
    pub fn unavailable() -> Self {
        Self(None)
    }
}

#[cfg(any(test, feature = "test-support"))]
impl CalendarOracle for FixedCalendar {
    fn is_workday(&self, _date: NaiveDate) -> Option<bool> {
        self.0
    }
}

#[cfg(test)]
#[path = "calendar_tests.rs"]
mod tests;
