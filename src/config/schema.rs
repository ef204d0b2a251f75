//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the balancer.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::health::ProbeKind;
use crate::load_balancer::StrategyKind;

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct BalancerConfig {
    /// Pool membership and selection strategy.
    pub pool: PoolConfig,

    /// Health check settings shared by every target monitor.
    pub health_check: HealthCheckConfig,

    /// Admin API settings.
    pub admin: AdminConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Pool configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct PoolConfig {
    /// Selection strategy (`round_robin` or `weighted_round_robin`).
    pub strategy: StrategyKind,

    /// Initial targets, in rotation order.
    pub targets: Vec<TargetConfig>,
}

/// A single target definition.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct TargetConfig {
    /// Target address (e.g., "http://127.0.0.1:3000").
    pub address: String,

    /// Optional unique name, used for removal and logging.
    #[serde(default)]
    pub name: Option<String>,

    /// Weight for weighted round-robin (default: 1).
    #[serde(default = "default_weight")]
    pub weight: i32,
}

impl TargetConfig {
    /// Identity used to diff configs on reload: name if set, else address.
    pub fn key(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.address)
    }
}

fn default_weight() -> i32 {
    1
}

/// Health check configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct HealthCheckConfig {
    /// Enable active health checks.
    pub enabled: bool,

    /// Probe type (`http`, `tcp`, `dns`).
    pub probe: ProbeKind,

    /// Path joined onto the target address for HTTP probes.
    pub path: String,

    /// Probe period in seconds.
    pub period_secs: u64,

    /// Delay before the first probe in seconds. Ignored when above the period.
    pub initial_delay_secs: u64,

    /// Per-probe timeout in seconds.
    pub timeout_secs: u64,

    /// Consecutive successes before a target becomes available.
    pub success_threshold: u32,

    /// Consecutive failures before a target becomes unavailable.
    pub failure_threshold: u32,
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            probe: ProbeKind::Http,
            path: String::new(),
            period_secs: 10,
            initial_delay_secs: 0,
            timeout_secs: 5,
            success_threshold: 1,
            failure_threshold: 3,
        }
    }
}

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct AdminConfig {
    /// Enable the admin API.
    pub enabled: bool,

    /// API key for authentication (Bearer token).
    pub api_key: String,

    /// Admin API bind address.
    pub bind_address: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: String::new(),
            bind_address: "127.0.0.1:8081".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
