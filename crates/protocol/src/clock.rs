//! Wall-clock millisecond timestamps that never repeat or go backwards.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;

/// Issues strictly increasing millisecond timestamps.
///
/// Normally this is the wall clock. If two stamps are requested within the
/// same millisecond, or the wall clock steps backwards, the next stamp is
/// `last + 1` instead.
#[derive(Debug, Default)]
pub struct MonotonicClock {
    last: AtomicI64,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next timestamp based on the current wall clock.
    pub fn next_millis(&self) -> i64 {
        self.next_millis_at(now_millis())
    }

    /// Next timestamp given an explicit wall-clock reading.
    pub fn next_millis_at(&self, wall_millis: i64) -> i64 {
        let mut prev = self.last.load(Ordering::Relaxed);
        loop {
            let candidate = wall_millis.max(prev.saturating_add(1));
            match self.last.compare_exchange_weak(
                prev,
                candidate,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => return candidate,
                Err(actual) => prev = actual,
            }
        }
    }

    /// Last issued timestamp (0 if none).
    pub fn last_millis(&self) -> i64 {
        self.last.load(Ordering::Relaxed)
    }
}

/// Current wall-clock time in Unix milliseconds.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}
