//! Target pool management.
//!
//! # Responsibilities
//! - Own the ordered list of targets
//! - Serialize membership changes behind one exclusive lock
//! - Delegate selection to the active strategy under a shared lock

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::load_balancer::{
    error::{PoolError, PoolResult, TargetId},
    Strategy, StrategyKind, Target,
};
use crate::observability::metrics;

/// Concurrency-safe container of targets plus the active strategy.
#[derive(Debug)]
pub struct ServerPool {
    targets: RwLock<Vec<Arc<Target>>>,
    /// Only called while `targets` is locked.
    strategy: Box<dyn Strategy>,
}

impl ServerPool {
    /// Create an empty pool.
    pub fn new(kind: StrategyKind) -> Self {
        Self::with_strategy(kind.build())
    }

    /// Create an empty pool around a caller-supplied strategy.
    pub fn with_strategy(strategy: Box<dyn Strategy>) -> Self {
        Self {
            targets: RwLock::new(Vec::new()),
            strategy,
        }
    }

    /// Create a pool seeded with at least one target.
    pub fn with_targets(
        kind: StrategyKind,
        targets: impl IntoIterator<Item = Target>,
    ) -> PoolResult<Self> {
        let pool = Self::new(kind);
        pool.add(targets)?;
        Ok(pool)
    }

    pub fn strategy(&self) -> StrategyKind {
        self.strategy.kind()
    }

    /// Append targets in order. Duplicates are kept as separate entries.
    pub fn add(&self, targets: impl IntoIterator<Item = Target>) -> PoolResult<Vec<Arc<Target>>> {
        let new: Vec<Arc<Target>> = targets.into_iter().map(Arc::new).collect();
        if new.is_empty() {
            return Err(PoolError::EmptyInput);
        }

        let mut guard = self.write();
        for target in &new {
            if target.weight() <= 0 && self.strategy.kind() == StrategyKind::WeightedRoundRobin {
                tracing::warn!(
                    upstream = %target.label(),
                    weight = target.weight(),
                    "Non-positive weight, target will not be selected"
                );
            }
            guard.push(target.clone());
            self.strategy.on_added(target);
            tracing::debug!(upstream = %target.label(), weight = target.weight(), "Target added");
        }
        tracing::info!(added = new.len(), count = guard.len(), "Pool membership updated");

        Ok(new)
    }

    /// Remove the first target matching `id`, keeping the order of the rest.
    pub fn remove(&self, id: &TargetId) -> PoolResult<Arc<Target>> {
        self.remove_where(|t| t.matches(id))
            .ok_or_else(|| PoolError::NotFound(id.clone()))
    }

    /// Remove this exact entry, even when another target shares its
    /// address or name.
    pub(crate) fn remove_exact(&self, target: &Arc<Target>) -> PoolResult<Arc<Target>> {
        self.remove_where(|t| Arc::ptr_eq(t, target))
            .ok_or_else(|| PoolError::NotFound(target.id()))
    }

    /// Change a target's weight and recompute weighted state.
    pub fn set_weight(&self, id: &TargetId, weight: i32) -> PoolResult<()> {
        if self.reweight_where(|t| t.matches(id), weight) {
            Ok(())
        } else {
            Err(PoolError::NotFound(id.clone()))
        }
    }

    pub(crate) fn set_weight_exact(&self, target: &Arc<Target>, weight: i32) -> PoolResult<()> {
        if self.reweight_where(|t| Arc::ptr_eq(t, target), weight) {
            Ok(())
        } else {
            Err(PoolError::NotFound(target.id()))
        }
    }

    fn remove_where(&self, pred: impl Fn(&Arc<Target>) -> bool) -> Option<Arc<Target>> {
        let mut guard = self.write();
        let position = guard.iter().position(pred)?;

        let removed = guard.remove(position);
        self.strategy.on_changed(&guard);
        tracing::info!(upstream = %removed.label(), count = guard.len(), "Target removed");

        Some(removed)
    }

    fn reweight_where(&self, pred: impl Fn(&Arc<Target>) -> bool, weight: i32) -> bool {
        let guard = self.write();
        let Some(target) = guard.iter().find(|t| pred(t)) else {
            return false;
        };

        let previous = target.weight();
        target.set_weight(weight);
        self.strategy.on_changed(&guard);
        tracing::info!(upstream = %target.label(), previous, weight, "Target weight changed");

        true
    }

    /// Select the next target; `None` when nothing is selectable.
    pub fn next(&self) -> Option<Arc<Target>> {
        let guard = self.read();
        let picked = self
            .strategy
            .select(&guard)
            .and_then(|i| guard.get(i).cloned());

        metrics::record_selection(self.strategy.kind().as_str(), picked.is_some());
        picked
    }

    /// Like `next`, but skips targets the health monitor has not marked
    /// available. Gives up after one pass over the pool.
    pub fn next_available(&self) -> Option<Arc<Target>> {
        let guard = self.read();
        for _ in 0..guard.len() {
            let Some(target) = self
                .strategy
                .select(&guard)
                .and_then(|i| guard.get(i))
            else {
                break;
            };
            if target.is_available() {
                metrics::record_selection(self.strategy.kind().as_str(), true);
                return Some(target.clone());
            }
        }

        tracing::debug!(count = guard.len(), "No available target in pool");
        metrics::record_selection(self.strategy.kind().as_str(), false);
        None
    }

    /// Snapshot of the current membership.
    pub fn list(&self) -> Vec<Arc<Target>> {
        self.read().clone()
    }

    pub fn find(&self, id: &TargetId) -> Option<Arc<Target>> {
        self.read().iter().find(|t| t.matches(id)).cloned()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Drop every target and reset strategy counters.
    pub fn clear(&self) {
        let mut guard = self.write();
        let dropped = guard.len();
        guard.clear();
        self.strategy.clear();
        tracing::info!(dropped, "Pool cleared");
    }

    /// Restart the selection cycle; membership is untouched.
    pub fn reset(&self) {
        let _guard = self.write();
        self.strategy.reset();
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<Arc<Target>>> {
        self.targets.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<Arc<Target>>> {
        self.targets.write().unwrap_or_else(|e| e.into_inner())
    }
}
