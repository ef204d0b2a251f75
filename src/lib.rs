//! Backend selection and health tracking for load balancers.
//!
//! A [`ServerPool`] holds targets and hands out the next one under a
//! round-robin or smooth weighted round-robin strategy. Each target can be
//! watched by a [`HealthMonitor`] that flips its availability with
//! success/failure hysteresis.

pub mod admin;
pub mod config;
pub mod health;
pub mod lifecycle;
pub mod load_balancer;
pub mod observability;

pub use config::BalancerConfig;
pub use health::{HealthMonitor, HealthSettings, Probe, ProbeError};
pub use lifecycle::{Shutdown, Supervisor};
pub use load_balancer::{PoolError, ServerPool, StrategyKind, Target, TargetId};
