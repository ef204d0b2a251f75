//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Monitor loop (monitor.rs), one per target:
//!     Initial delay → periodic tick
//!     → probe.rs (HTTP / TCP / DNS / closure, bounded by timeout)
//!     → state.rs (hysteresis counters)
//!     → Target availability flag
//! ```
//!
//! # Design Decisions
//! - State transitions require consecutive successes/failures
//! - Health state is per-target; monitors are independent tasks
//! - Probe failures are data, never propagated as errors
//! - Selection strategies never read health; callers opt in

pub mod monitor;
pub mod probe;
pub mod state;

pub use monitor::{HealthMonitor, HealthSettings};
pub use probe::{DnsProbe, HttpProbe, Probe, ProbeError, ProbeKind, TcpProbe};
pub use state::{HealthState, HealthStatus};
