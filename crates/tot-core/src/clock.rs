//! Sources of "now".
//!
//! Timestamps in `tot` are local, second-granularity wall-clock times, so the
//! clock hands out [`NaiveDateTime`] values. Accessors hold an
//! `Arc<dyn Clock>` and expose it to time-resolution callers.

use std::sync::{PoisonError, RwLock};

use chrono::{Duration, Local, NaiveDate, NaiveDateTime, SubsecRound};

/// Supplies the current local time.
pub trait Clock: Send + Sync {
    /// The current local time.
    fn now(&self) -> NaiveDateTime;
}

/// The real wall clock. Stateless.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local().trunc_subsecs(0)
    }
}

/// A settable clock for deterministic tests.
#[derive(Debug)]
pub struct MockClock {
    now: RwLock<NaiveDateTime>,
}

impl MockClock {
    /// Create a clock frozen at `time`.
    pub fn with_time(time: NaiveDateTime) -> Self {
        Self {
            now: RwLock::new(time),
        }
    }

    /// Move the clock to an absolute point in time.
    pub fn advance_to(&self, time: NaiveDateTime) {
        *self.now.write().unwrap_or_else(PoisonError::into_inner) = time;
    }

    /// Move the clock forward (or backward, for negative durations).
    pub fn advance_by(&self, duration: Duration) {
        let mut now = self.now.write().unwrap_or_else(PoisonError::into_inner);
        *now += duration;
    }
}

impl Default for MockClock {
    /// Starts at 2020-09-01T00:00:00.
    fn default() -> Self {
        let start = NaiveDate::from_ymd_opt(2020, 9, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap_or_default();
        Self::with_time(start)
    }
}

impl Clock for MockClock {
    fn now(&self) -> NaiveDateTime {
        *self.now.read().unwrap_or_else(PoisonError::into_inner)
    }
}
