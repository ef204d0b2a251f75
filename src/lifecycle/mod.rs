//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Build pool → Spawn one monitor per target
//!
//! Reload (startup.rs):
//!     New config → Diff against running targets → add / remove / reweigh
//!
//! Shutdown (shutdown.rs):
//!     Signal received (signals.rs) → Cancel root token → Monitors exit
//! ```
//!
//! # Design Decisions
//! - Monitors run on child tokens of one root token
//! - Strategy and health settings are fixed at startup; reload only
//!   touches membership and weights

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::{ReloadSummary, Supervisor};
