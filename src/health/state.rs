//! Target health state machine.
//!
//! # States
//! - Unknown: no threshold reached yet (not available)
//! - Available: target may receive traffic
//! - Unavailable: target should be skipped by health-aware callers
//!
//! # State Transitions
//! ```text
//! * → Available:   consecutive successes >= success_threshold
//! * → Unavailable: consecutive failures  >= failure_threshold
//! ```
//!
//! Counters are mutually exclusive and reset when their threshold fires.
//! State and counters share one mutex so readers never see a flip without
//! its counter reset.

use std::sync::Mutex;

/// Health state of a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthState {
    Unknown,
    Available,
    Unavailable,
}

impl HealthState {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthState::Unknown => "unknown",
            HealthState::Available => "available",
            HealthState::Unavailable => "unavailable",
        }
    }
}

#[derive(Debug)]
struct Counters {
    state: HealthState,
    successes: u32,
    failures: u32,
}

/// Availability record attached to every target.
#[derive(Debug)]
pub struct HealthStatus {
    inner: Mutex<Counters>,
}

impl HealthStatus {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Counters {
                state: HealthState::Unknown,
                successes: 0,
                failures: 0,
            }),
        }
    }

    pub fn state(&self) -> HealthState {
        self.lock().state
    }

    pub fn is_available(&self) -> bool {
        self.state() == HealthState::Available
    }

    /// Current (successes, failures) run lengths.
    pub fn counts(&self) -> (u32, u32) {
        let c = self.lock();
        (c.successes, c.failures)
    }

    /// Record a successful probe.
    /// Returns the new state if this call changed it.
    pub(crate) fn record_success(&self, threshold: u32) -> Option<HealthState> {
        let mut c = self.lock();
        c.successes += 1;
        c.failures = 0;

        if c.successes >= threshold {
            c.successes = 0;
            return transition(&mut c, HealthState::Available);
        }
        None
    }

    /// Record a failed probe.
    /// Returns the new state if this call changed it.
    pub(crate) fn record_failure(&self, threshold: u32) -> Option<HealthState> {
        let mut c = self.lock();
        c.failures += 1;
        c.successes = 0;

        if c.failures >= threshold {
            c.failures = 0;
            return transition(&mut c, HealthState::Unavailable);
        }
        None
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Counters> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for HealthStatus {
    fn default() -> Self {
        Self::new()
    }
}

fn transition(c: &mut Counters, next: HealthState) -> Option<HealthState> {
    if c.state == next {
        return None;
    }
    c.state = next;
    Some(next)
}
