//! Per-target health monitoring.
//!
//! # Responsibilities
//! - Run one background probe loop per target
//! - Feed outcomes into the target's hysteresis state machine
//! - Stop promptly on cancellation (initial delay, between ticks, mid-probe)

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::config::HealthCheckConfig;
use crate::health::probe::{Probe, ProbeError, DEFAULT_PROBE_TIMEOUT};
use crate::health::state::HealthState;
use crate::load_balancer::Target;
use crate::observability::metrics;

pub const DEFAULT_PERIOD: Duration = Duration::from_secs(10);
pub const DEFAULT_SUCCESS_THRESHOLD: u32 = 1;
pub const DEFAULT_FAILURE_THRESHOLD: u32 = 3;

/// Scheduling and hysteresis parameters for a monitor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthSettings {
    pub period: Duration,
    /// Ignored (treated as zero) when longer than `period`.
    pub initial_delay: Duration,
    pub success_threshold: u32,
    pub failure_threshold: u32,
    pub probe_timeout: Duration,
}

impl Default for HealthSettings {
    fn default() -> Self {
        Self {
            period: DEFAULT_PERIOD,
            initial_delay: Duration::ZERO,
            success_threshold: DEFAULT_SUCCESS_THRESHOLD,
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }
}

impl HealthSettings {
    pub fn with_period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    pub fn with_success_threshold(mut self, threshold: u32) -> Self {
        self.success_threshold = threshold;
        self
    }

    pub fn with_failure_threshold(mut self, threshold: u32) -> Self {
        self.failure_threshold = threshold;
        self
    }

    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    /// The delay actually waited before the first probe.
    pub fn effective_initial_delay(&self) -> Duration {
        if self.initial_delay > self.period {
            Duration::ZERO
        } else {
            self.initial_delay
        }
    }

    /// Replace unusable values (zero period/timeout, zero thresholds).
    fn normalized(mut self) -> Self {
        if self.period.is_zero() {
            self.period = DEFAULT_PERIOD;
        }
        if self.probe_timeout.is_zero() {
            self.probe_timeout = DEFAULT_PROBE_TIMEOUT;
        }
        self.success_threshold = self.success_threshold.max(1);
        self.failure_threshold = self.failure_threshold.max(1);
        self
    }
}

impl From<&HealthCheckConfig> for HealthSettings {
    fn from(config: &HealthCheckConfig) -> Self {
        Self {
            period: Duration::from_secs(config.period_secs),
            initial_delay: Duration::from_secs(config.initial_delay_secs),
            success_threshold: config.success_threshold,
            failure_threshold: config.failure_threshold,
            probe_timeout: Duration::from_secs(config.timeout_secs),
        }
    }
}

/// Handle to a running per-target probe loop.
///
/// Dropping the handle cancels the loop.
#[derive(Debug)]
pub struct HealthMonitor {
    target: Arc<Target>,
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl HealthMonitor {
    /// Start monitoring `target`. Must be called inside a tokio runtime.
    pub fn spawn(target: Arc<Target>, probe: Arc<dyn Probe>, settings: HealthSettings) -> Self {
        Self::spawn_with_token(target, probe, settings, CancellationToken::new())
    }

    /// Start monitoring with an externally owned token, typically a child
    /// of the process shutdown token.
    pub fn spawn_with_token(
        target: Arc<Target>,
        probe: Arc<dyn Probe>,
        settings: HealthSettings,
        cancel: CancellationToken,
    ) -> Self {
        let worker = Worker {
            target: target.clone(),
            probe,
            settings: settings.normalized(),
            cancel: cancel.clone(),
        };
        let handle = tokio::spawn(worker.run());

        Self {
            target,
            cancel,
            handle: Some(handle),
        }
    }

    pub fn target(&self) -> &Arc<Target> {
        &self.target
    }

    pub fn is_available(&self) -> bool {
        self.target.is_available()
    }

    /// Signal the loop to stop. Safe to call any number of times.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Stop and wait for the loop to exit.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                tracing::error!(upstream = %self.target.label(), error = %e, "Health monitor task failed");
            }
        }
    }
}

impl Drop for HealthMonitor {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

struct Worker {
    target: Arc<Target>,
    probe: Arc<dyn Probe>,
    settings: HealthSettings,
    cancel: CancellationToken,
}

impl Worker {
    async fn run(self) {
        let label = self.target.label().to_string();
        tracing::debug!(
            upstream = %label,
            probe = self.probe.name(),
            period_ms = self.settings.period.as_millis() as u64,
            "Health monitor starting"
        );

        let delay = self.settings.effective_initial_delay();
        if !delay.is_zero() {
            tokio::select! {
                _ = time::sleep(delay) => {}
                _ = self.cancel.cancelled() => {
                    tracing::debug!(upstream = %label, "Health monitor cancelled during initial delay");
                    return;
                }
            }
        }

        let mut ticker = time::interval(self.settings.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                outcome = self.probe_once() => self.apply(outcome),
            }
        }

        tracing::debug!(upstream = %label, "Health monitor stopped");
    }

    async fn probe_once(&self) -> Result<(), ProbeError> {
        let timeout = self.settings.probe_timeout;
        match time::timeout(timeout, self.probe.check(self.target.address())).await {
            Ok(result) => result,
            Err(_) => Err(ProbeError::Timeout(timeout)),
        }
    }

    fn apply(&self, outcome: Result<(), ProbeError>) {
        let label = self.target.label();
        let health = self.target.health();

        let transition = match &outcome {
            Ok(()) => health.record_success(self.settings.success_threshold),
            Err(e) => {
                tracing::debug!(upstream = %label, error = %e, "Health probe failed");
                health.record_failure(self.settings.failure_threshold)
            }
        };
        metrics::record_probe(label, outcome.is_ok());

        match transition {
            Some(HealthState::Available) => {
                tracing::info!(upstream = %label, "Target became available");
            }
            Some(state) => {
                tracing::warn!(upstream = %label, state = state.as_str(), "Target became unavailable");
            }
            None => return,
        }
        metrics::record_target_availability(label, health.is_available());
    }
}
