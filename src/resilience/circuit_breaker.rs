//! Circuit breaker: CLOSED -> OPEN -> HALF_OPEN -> CLOSED/OPEN.
//!
//! State machine shape mirrors the breaker used to gate outbound calls
//! downstream of flaky providers: count consecutive failures, trip once a
//! threshold is hit, probe again after a cooldown.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{info, warn};

use crate::time::TimeProvider;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

struct Inner {
    state: CircuitState,
    consecutive_failures: u32,
    opened_at: Option<chrono::DateTime<chrono::Utc>>,
    half_open_in_flight: u32,
}

pub struct CircuitBreaker {
    name: String,
    failure_threshold: u32,
    cooldown: chrono::Duration,
    half_open_max_calls: u32,
    time: Arc<dyn TimeProvider>,
    inner: Mutex<Inner>,
}

impl CircuitBreaker {
    pub fn new(
        name: impl Into<String>,
        failure_threshold: u32,
        cooldown_seconds: u64,
        time: Arc<dyn TimeProvider>,
    ) -> Self {
        Self::with_half_open_max_calls(name, failure_threshold, cooldown_seconds, 2, time)
    }

    /// Same as [`Self::new`] but with an explicit cap on concurrent
    /// HALF_OPEN probes (spec.md §4.7 `half_open_max_calls`, default 2).
    pub fn with_half_open_max_calls(
        name: impl Into<String>,
        failure_threshold: u32,
        cooldown_seconds: u64,
        half_open_max_calls: u32,
        time: Arc<dyn TimeProvider>,
    ) -> Self {
        Self {
            name: name.into(),
            failure_threshold,
            cooldown: chrono::Duration::seconds(cooldown_seconds as i64),
            half_open_max_calls,
            time,
            inner: Mutex::new(Inner {
                state: CircuitState::Closed,
                consecutive_failures: 0,
                opened_at: None,
                half_open_in_flight: 0,
            }),
        }
    }

    /// Whether a call should be attempted right now. Once the cooldown has
    /// elapsed, the breaker transitions to HALF_OPEN and allows up to
    /// `half_open_max_calls` concurrent probes through; further calls are
    /// refused until one of those probes reports its outcome.
    pub fn allow_request(&self) -> bool {
        let mut inner = self.inner.lock();
        match inner.state {
            CircuitState::Closed => true,
            CircuitState::HalfOpen => {
                if inner.half_open_in_flight < self.half_open_max_calls {
                    inner.half_open_in_flight += 1;
                    true
                } else {
                    false
                }
            }
            CircuitState::Open => {
                let opened_at = inner.opened_at.expect("open state always has opened_at");
                if self.time.now() - opened_at >= self.cooldown {
                    inner.state = CircuitState::HalfOpen;
                    inner.half_open_in_flight = 1;
                    info!(breaker = %self.name, "circuit half-open, allowing probe");
                    true
                } else {
                    false
                }
            }
        }
    }

    pub fn record_success(&self) {
        let mut inner = self.inner.lock();
        if inner.state != CircuitState::Closed {
            info!(breaker = %self.name, "circuit closed after successful probe");
        }
        inner.state = CircuitState::Closed;
        inner.consecutive_failures = 0;
        inner.opened_at = None;
        inner.half_open_in_flight = 0;
    }

    pub fn record_failure(&self) {
        let mut inner = self.inner.lock();
        match inner.state {
            CircuitState::HalfOpen => {
                warn!(breaker = %self.name, "probe failed, circuit re-opened");
                inner.state = CircuitState::Open;
                inner.opened_at = Some(self.time.now());
                inner.half_open_in_flight = 0;
            }
            CircuitState::Closed => {
                inner.consecutive_failures += 1;
                if inner.consecutive_failures >= self.failure_threshold {
                    warn!(breaker = %self.name, failures = inner.consecutive_failures, "circuit opened");
                    inner.state = CircuitState::Open;
                    inner.opened_at = Some(self.time.now());
                }
            }
            CircuitState::Open => {}
        }
    }

    pub fn state(&self) -> CircuitState {
        self.inner.lock().state
    }
}
