//! Injectable clock, ported from `original_source/src/omen/application/ports/time_provider.py`.
//!
//! Threaded explicitly through `Deps` rather than a process-global, so tests
//! can pin and advance time without touching the wall clock.

use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;

pub trait TimeProvider: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Default)]
pub struct SystemTimeProvider;

impl TimeProvider for SystemTimeProvider {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Fixed time provider for testing and replay. Always returns the same
/// configured instant unless explicitly advanced.
pub struct FixedTimeProvider {
    time: RwLock<DateTime<Utc>>,
}

impl FixedTimeProvider {
    pub fn new(fixed_time: DateTime<Utc>) -> Self {
        Self {
            time: RwLock::new(fixed_time),
        }
    }

    pub fn advance(&self, delta: Duration) {
        let mut t = self.time.write();
        *t += delta;
    }
}

impl TimeProvider for FixedTimeProvider {
    fn now(&self) -> DateTime<Utc> {
        *self.time.read()
    }
}
