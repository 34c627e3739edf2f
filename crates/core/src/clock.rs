// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Clock abstraction for UTC watermarks, local scheduling, and timers.
//!
//! The engine needs three notions of time: wall-clock UTC for sync
//! watermarks, local wall-clock for the scheduled-sync calendar, and a
//! monotonic instant for timer deadlines. `SystemClock` is used in the
//! service; `FakeClock` is settable and advanceable for tests.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeDelta, Utc};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};

pub trait Clock: Send + Sync {
    /// Current wall-clock time in UTC.
    fn now_utc(&self) -> DateTime<Utc>;

    /// Current local wall-clock time (timezone already applied).
    fn now_local(&self) -> NaiveDateTime;

    /// Monotonic instant for timer arithmetic.
    fn instant(&self) -> Instant;
}

/// Real time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn now_local(&self) -> NaiveDateTime {
        chrono::Local::now().naive_local()
    }

    fn instant(&self) -> Instant {
        Instant::now()
    }
}

struct FakeState {
    utc: DateTime<Utc>,
    /// Offset added to UTC to produce the fake local wall-clock.
    local_offset: TimeDelta,
    base: Instant,
    advanced: Duration,
}

/// Settable clock for tests. Cloning shares the underlying state.
#[derive(Clone)]
pub struct FakeClock {
    inner: Arc<Mutex<FakeState>>,
}

impl FakeClock {
    /// Starts at 2024-01-01T00:00:00Z with local == UTC.
    pub fn new() -> Self {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc())
            .unwrap_or_else(Utc::now);
        Self::at(start)
    }

    pub fn at(utc: DateTime<Utc>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeState {
                utc,
                local_offset: TimeDelta::zero(),
                base: Instant::now(),
                advanced: Duration::ZERO,
            })),
        }
    }

    /// Move all three time sources forward.
    pub fn advance(&self, by: Duration) {
        let mut state = self.inner.lock();
        state.advanced += by;
        state.utc += TimeDelta::from_std(by).unwrap_or_else(|_| TimeDelta::zero());
    }

    pub fn set_utc(&self, utc: DateTime<Utc>) {
        self.inner.lock().utc = utc;
    }

    /// Fix the local wall-clock by choosing the UTC offset.
    pub fn set_local_offset(&self, offset: TimeDelta) {
        self.inner.lock().local_offset = offset;
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for FakeClock {
    fn now_utc(&self) -> DateTime<Utc> {
        self.inner.lock().utc
    }

    fn now_local(&self) -> NaiveDateTime {
        let state = self.inner.lock();
        (state.utc + state.local_offset).naive_utc()
    }

    fn instant(&self) -> Instant {
        let state = self.inner.lock();
        state.base + state.advanced
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
