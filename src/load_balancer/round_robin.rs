//! Round-robin load balancing strategy.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::load_balancer::{Strategy, StrategyKind, Target};

/// Round-robin selector.
/// Stores an internal counter to rotate through targets.
/// `fetch_add` wraps on overflow, so the rotation never panics.
#[derive(Debug, Default)]
pub struct RoundRobin {
    counter: AtomicUsize,
}

impl RoundRobin {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    fn starting_at(position: usize) -> Self {
        Self {
            counter: AtomicUsize::new(position),
        }
    }
}

impl Strategy for RoundRobin {
    fn kind(&self) -> StrategyKind {
        StrategyKind::RoundRobin
    }

    fn select(&self, targets: &[Arc<Target>]) -> Option<usize> {
        if targets.is_empty() {
            return None;
        }
        let position = self.counter.fetch_add(1, Ordering::Relaxed);
        Some(position % targets.len())
    }

    fn reset(&self) {
        self.counter.store(0, Ordering::Relaxed);
    }
}
