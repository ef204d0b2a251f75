//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Pool and monitors produce:
//!     → logging.rs (structured tracing events)
//!     → metrics.rs (selection counters, probe counters, availability gauges)
//!
//! Consumers:
//!     → stdout (fmt subscriber)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured fields (`upstream`, `weight`, `count`) on every event
//! - Metric calls are no-ops until a recorder is installed

pub mod logging;
pub mod metrics;
