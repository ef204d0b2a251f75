//! Smooth weighted round-robin strategy.
//!
//! Classic LVS scheduling: the current weight starts at the maximum weight
//! and drops by the gcd of all weights every time the index wraps. A target
//! is picked when its weight is at least the current weight, so heavier
//! targets are interleaved instead of served in a burst.
//!
//! ```text
//! loop:
//!   index = (index + 1) mod count
//!   if index == 0:
//!       current -= gcd
//!       if current <= 0:
//!           current = max
//!           if max == 0: return None
//!   if weight[index] >= current:
//!       return index
//! ```

use std::sync::{Arc, Mutex, MutexGuard};

use crate::load_balancer::{Strategy, StrategyKind, Target};

#[derive(Debug, Default)]
struct WeightedState {
    /// Last selected position; `None` means before the first target.
    index: Option<usize>,
    current_weight: i64,
    gcd: i64,
    max_weight: i64,
}

impl WeightedState {
    fn absorb(&mut self, weight: i32) {
        // non-positive weights never take part in the weight loop
        if weight <= 0 {
            return;
        }
        let w = i64::from(weight);
        if self.gcd == 0 {
            self.gcd = w;
            self.max_weight = w;
        } else {
            self.gcd = gcd(self.gcd, w);
            self.max_weight = self.max_weight.max(w);
        }
    }
}

/// Smooth weighted round-robin selector.
#[derive(Debug, Default)]
pub struct WeightedRoundRobin {
    state: Mutex<WeightedState>,
}

impl WeightedRoundRobin {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current (gcd, max weight) derived from positive weights.
    pub fn derived_weights(&self) -> (i64, i64) {
        let s = self.lock();
        (s.gcd, s.max_weight)
    }

    fn lock(&self) -> MutexGuard<'_, WeightedState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Strategy for WeightedRoundRobin {
    fn kind(&self) -> StrategyKind {
        StrategyKind::WeightedRoundRobin
    }

    fn select(&self, targets: &[Arc<Target>]) -> Option<usize> {
        let count = targets.len();
        match count {
            0 => return None,
            // a lone zero-weight target would otherwise spin forever
            1 => return Some(0),
            _ => {}
        }

        let mut s = self.lock();
        if s.max_weight == 0 {
            return None;
        }

        loop {
            let index = match s.index {
                Some(i) => (i + 1) % count,
                None => 0,
            };
            s.index = Some(index);

            if index == 0 {
                s.current_weight -= s.gcd;
                if s.current_weight <= 0 {
                    s.current_weight = s.max_weight;
                }
            }

            if i64::from(targets[index].weight()) >= s.current_weight {
                return Some(index);
            }
        }
    }

    fn on_added(&self, target: &Target) {
        self.lock().absorb(target.weight());
    }

    fn on_changed(&self, targets: &[Arc<Target>]) {
        let mut s = self.lock();
        s.gcd = 0;
        s.max_weight = 0;
        for t in targets {
            s.absorb(t.weight());
        }
        if s.current_weight > s.max_weight {
            s.current_weight = s.max_weight;
        }
    }

    fn reset(&self) {
        let mut s = self.lock();
        s.index = None;
        s.current_weight = 0;
    }

    fn clear(&self) {
        *self.lock() = WeightedState::default();
    }
}

fn gcd(mut a: i64, mut b: i64) -> i64 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weighted(weights: &[i32]) -> (WeightedRoundRobin, Vec<Arc<Target>>) {
        let lb = WeightedRoundRobin::new();
        let targets: Vec<Arc<Target>> = weights
            .iter()
            .enumerate()
            .map(|(i, w)| {
                let t = Target::parse(&format!("http://192.168.1.{}", 10 + i))
                    .unwrap()
                    .with_weight(*w);
                lb.on_added(&t);
                Arc::new(t)
            })
            .collect();
        (lb, targets)
    }

    fn run(lb: &WeightedRoundRobin, targets: &[Arc<Target>], n: usize) -> Vec<usize> {
        (0..n).map(|_| lb.select(targets).unwrap()).collect()
    }

    #[test]
    fn test_smooth_sequence() {
        let (lb, targets) = weighted(&[4, 3, 2]);
        assert_eq!(lb.derived_weights(), (1, 4));
        assert_eq!(run(&lb, &targets, 9), vec![0, 0, 1, 0, 1, 2, 0, 1, 2]);
        // and the cycle repeats
        assert_eq!(run(&lb, &targets, 9), vec![0, 0, 1, 0, 1, 2, 0, 1, 2]);
    }

    #[test]
    fn test_gcd_scaled_weights_keep_proportions() {
        let (lb, targets) = weighted(&[4, 2]);
        assert_eq!(lb.derived_weights(), (2, 4));
        assert_eq!(run(&lb, &targets, 6), vec![0, 0, 1, 0, 0, 1]);
    }

    #[test]
    fn test_non_positive_weights_never_selected() {
        let (lb, targets) = weighted(&[0, 3, -1]);
        assert_eq!(lb.derived_weights(), (3, 3));
        assert!(run(&lb, &targets, 10).iter().all(|&i| i == 1));
    }

    #[test]
    fn test_all_zero_weights_is_none() {
        let (lb, targets) = weighted(&[0, 0]);
        assert_eq!(lb.select(&targets), None);
    }

    #[test]
    fn test_single_target_bypasses_weights() {
        let (lb, targets) = weighted(&[0]);
        assert_eq!(lb.select(&targets), Some(0));
        assert_eq!(lb.select(&targets), Some(0));
    }

    #[test]
    fn test_recompute_after_change() {
        let (lb, mut targets) = weighted(&[6, 4, 3]);
        assert_eq!(lb.derived_weights(), (1, 6));
        targets.remove(2);
        lb.on_changed(&targets);
        assert_eq!(lb.derived_weights(), (2, 6));
    }

    #[test]
    fn test_reset_rearms_cycle() {
        let (lb, targets) = weighted(&[4, 3, 2]);
        run(&lb, &targets, 4);
        lb.reset();
        assert_eq!(run(&lb, &targets, 3), vec![0, 0, 1]);
    }

    #[test]
    fn test_gcd() {
        assert_eq!(gcd(12, 8), 4);
        assert_eq!(gcd(7, 3), 1);
        assert_eq!(gcd(5, 0), 5);
    }
}
