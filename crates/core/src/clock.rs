// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Clock abstraction for monotonic and wall time.
//!
//! Durable timestamps are always UTC wall time; scheduling arithmetic uses
//! the monotonic clock. `FakeClock` advances both in lockstep for tests.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Source of monotonic and wall-clock time.
pub trait Clock: Clone + Send + Sync + 'static {
    /// Monotonic instant, for interval arithmetic.
    fn now(&self) -> Instant;

    /// Wall-clock time in UTC, for durable timestamps.
    fn now_utc(&self) -> DateTime<Utc>;
}

/// Production clock backed by the OS.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually advanced clock for tests.
#[derive(Clone)]
pub struct FakeClock {
    base_instant: Instant,
    base_utc: DateTime<Utc>,
    offset: Arc<Mutex<Duration>>,
}

impl FakeClock {
    pub fn new() -> Self {
        Self {
            base_instant: Instant::now(),
            base_utc: Utc::now(),
            offset: Arc::new(Mutex::new(Duration::ZERO)),
        }
    }

    /// Create a fake clock whose wall time starts at `base_utc`.
    pub fn at(base_utc: DateTime<Utc>) -> Self {
        Self {
            base_instant: Instant::now(),
            base_utc,
            offset: Arc::new(Mutex::new(Duration::ZERO)),
        }
    }

    /// Advance both clocks by `d`.
    pub fn advance(&self, d: Duration) {
        *self.offset.lock() += d;
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for FakeClock {
    fn now(&self) -> Instant {
        self.base_instant + *self.offset.lock()
    }

    fn now_utc(&self) -> DateTime<Utc> {
        let offset = *self.offset.lock();
        self.base_utc
            + ChronoDuration::from_std(offset).unwrap_or_else(|_| ChronoDuration::zero())
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
