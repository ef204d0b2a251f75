//! Load balancing subsystem.
//!
//! # Data Flow
//! ```text
//! Caller asks for a target
//!     → pool.rs (read guard over the ordered target list)
//!     → Strategy picks an index:
//!         - round_robin.rs (atomic counter modulo count)
//!         - weighted.rs (smooth weighted round robin)
//!     → Return Arc<Target> or None
//!
//! Membership changes:
//!     add / remove / clear / set_weight
//!     → pool.rs (write guard)
//!     → Strategy notified so derived state (gcd, max weight) stays in sync
//! ```
//!
//! # Design Decisions
//! - Strategies are health-agnostic; `ServerPool::next_available` is the opt-in
//! - Removal is stable, so round-robin order stays insertion order
//! - Selection on an empty pool is `None`, not an error

pub mod error;
pub mod pool;
pub mod round_robin;
pub mod target;
pub mod weighted;

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

pub use error::{PoolError, PoolResult, TargetId};
pub use pool::ServerPool;
pub use round_robin::RoundRobin;
pub use target::Target;
pub use weighted::WeightedRoundRobin;

/// Which selection strategy a pool runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    #[default]
    RoundRobin,
    WeightedRoundRobin,
}

impl StrategyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::RoundRobin => "round_robin",
            StrategyKind::WeightedRoundRobin => "weighted_round_robin",
        }
    }

    /// Build a fresh strategy instance of this kind.
    pub fn build(self) -> Box<dyn Strategy> {
        match self {
            StrategyKind::RoundRobin => Box::new(RoundRobin::new()),
            StrategyKind::WeightedRoundRobin => Box::new(WeightedRoundRobin::new()),
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A target selection strategy.
///
/// The pool calls every method while holding its lock: `select` under the
/// shared guard, the notification hooks under the exclusive guard. Strategy
/// state must therefore be interior-mutable.
pub trait Strategy: Send + Sync + fmt::Debug {
    fn kind(&self) -> StrategyKind;

    /// Pick the index of the next target, or `None` if nothing is selectable.
    /// Returned indices are always `< targets.len()`.
    fn select(&self, targets: &[Arc<Target>]) -> Option<usize>;

    /// A target was appended.
    fn on_added(&self, _target: &Target) {}

    /// Membership or weights changed in a way that needs a full recompute.
    fn on_changed(&self, _targets: &[Arc<Target>]) {}

    /// Re-arm the selection cycle without touching membership.
    fn reset(&self);

    /// Drop all derived state; the pool is now empty.
    fn clear(&self) {
        self.reset();
    }
}
