//! Replica selection strategies.
//!
//! The compiler never picks a connection itself. Execution layers that hold
//! several replicas inject one of these strategies and ask it for an index.
//! Every strategy owns its own state; there are no process-wide counters.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use rand::Rng;

/// Picks one of `candidates` replicas for a logical connection `key`.
pub trait LoadBalancer: Send + Sync {
    /// Return the chosen index in `0..candidates`, or `None` when there is
    /// nothing to choose from.
    ///
    /// `weights` is matched to candidates by position; strategies that do not
    /// weigh candidates ignore it.
    fn select(&self, key: &str, candidates: usize, weights: &[u32]) -> Option<usize>;
}

/// Cycles through candidates in order, one counter per key.
#[derive(Debug, Default)]
pub struct RoundRobin {
    shared: AtomicUsize,
    per_key: Mutex<HashMap<String, usize>>,
    keyed: bool,
}

impl RoundRobin {
    /// A single counter shared by every key.
    pub fn new() -> Self {
        Self::default()
    }

    /// Separate counters per key, so independent databases rotate
    /// independently.
    pub fn per_key() -> Self {
        Self {
            keyed: true,
            ..Self::default()
        }
    }
}

impl LoadBalancer for RoundRobin {
    fn select(&self, key: &str, candidates: usize, _weights: &[u32]) -> Option<usize> {
        if candidates == 0 {
            return None;
        }
        if !self.keyed {
            return Some(self.shared.fetch_add(1, Ordering::Relaxed) % candidates);
        }
        let mut counters = self.per_key.lock().unwrap_or_else(PoisonError::into_inner);
        let counter = counters.entry(key.to_string()).or_insert(0);
        let chosen = *counter % candidates;
        *counter = counter.wrapping_add(1);
        Some(chosen)
    }
}

/// Chooses randomly, proportionally to each candidate's weight.
///
/// Missing weights count as `1`. When every weight is zero the choice is
/// uniform.
#[derive(Debug, Default, Clone, Copy)]
pub struct WeightedRandom;

impl WeightedRandom {
    pub fn new() -> Self {
        Self
    }
}

impl LoadBalancer for WeightedRandom {
    fn select(&self, key: &str, candidates: usize, weights: &[u32]) -> Option<usize> {
        if candidates == 0 {
            return None;
        }
        let weight_of = |i: usize| u64::from(weights.get(i).copied().unwrap_or(1));
        let total: u64 = (0..candidates).map(weight_of).sum();
        let mut rng = rand::thread_rng();
        if total == 0 {
            tracing::trace!(key, candidates, "All replica weights are zero; choosing uniformly");
            return Some(rng.gen_range(0..candidates));
        }

        let mut ticket = rng.gen_range(0..total);
        for i in 0..candidates {
            let weight = weight_of(i);
            if ticket < weight {
                return Some(i);
            }
            ticket -= weight;
        }
        Some(candidates - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_robin_cycles() {
        let rr = RoundRobin::new();
        let picks: Vec<_> = (0..5).map(|_| rr.select("db", 3, &[]).unwrap()).collect();
        assert_eq!(picks, [0, 1, 2, 0, 1]);
    }

    #[test]
    fn test_round_robin_per_key_is_independent() {
        let rr = RoundRobin::per_key();
        assert_eq!(rr.select("a", 2, &[]), Some(0));
        assert_eq!(rr.select("a", 2, &[]), Some(1));
        assert_eq!(rr.select("b", 2, &[]), Some(0));
        assert_eq!(rr.select("a", 2, &[]), Some(0));
    }

    #[test]
    fn test_strategies_are_not_global() {
        let first = RoundRobin::new();
        let second = RoundRobin::new();
        assert_eq!(first.select("db", 4, &[]), Some(0));
        assert_eq!(first.select("db", 4, &[]), Some(1));
        assert_eq!(second.select("db", 4, &[]), Some(0));
    }

    #[test]
    fn test_empty_candidates_select_nothing() {
        assert_eq!(RoundRobin::new().select("db", 0, &[]), None);
        assert_eq!(WeightedRandom::new().select("db", 0, &[]), None);
    }

    #[test]
    fn test_weighted_random_respects_zero_weights() {
        let wr = WeightedRandom::new();
        for _ in 0..200 {
            assert_eq!(wr.select("db", 3, &[0, 5, 0]), Some(1));
        }
    }

    #[test]
    fn test_weighted_random_stays_in_range() {
        let wr = WeightedRandom::new();
        for _ in 0..200 {
            let pick = wr.select("db", 4, &[0, 0, 0, 0]).unwrap();
            assert!(pick < 4);
        }
    }
}
