use std::sync::atomic::{AtomicUsize, Ordering};

use log::debug;
use rand::Rng;
use serde::{Serialize, Deserialize};

/// How a model group picks a backend for each task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RoutingStrategy {
    /// Cyclic, even rotation over the group's backends
    RoundRobin,
    /// Weighted random draw proportional to configured weights
    Priority,
}

impl std::fmt::Display for RoutingStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RoutingStrategy::RoundRobin => write!(f, "round-robin"),
            RoutingStrategy::Priority => write!(f, "priority"),
        }
    }
}

/// Select the next index in rotation.
///
/// The fetch-and-increment is a single atomic operation, so concurrent
/// callers each observe a distinct pre-increment value and the rotation
/// stays even under contention.
pub fn round_robin_pick(cursor: &AtomicUsize, len: usize) -> usize {
    debug_assert!(len > 0);
    let ticket = cursor.fetch_add(1, Ordering::Relaxed);
    ticket % len
}

/// Select an index by weighted random draw.
///
/// The draw is proportional to the weights; callers guarantee the slice is
/// non-empty and every weight is positive.
pub fn weighted_pick(weights: &[u32]) -> usize {
    debug_assert!(!weights.is_empty());

    let total: u64 = weights.iter().map(|w| *w as u64).sum();
    let mut draw = rand::rng().random_range(0..total);

    for (index, weight) in weights.iter().enumerate() {
        let weight = *weight as u64;
        if draw < weight {
            debug!("weighted_pick: selected index {} out of {} candidates", index, weights.len());
            return index;
        }
        draw -= weight;
    }

    // Unreachable for positive weights; fall back to the last index.
    weights.len() - 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_robin_cycles_evenly() {
        let cursor = AtomicUsize::new(0);
        let picks: Vec<usize> = (0..6).map(|_| round_robin_pick(&cursor, 3)).collect();
        assert_eq!(picks, vec![0, 1, 2, 0, 1, 2]);
    }

    #[test]
    fn test_round_robin_single_backend() {
        let cursor = AtomicUsize::new(0);
        for _ in 0..5 {
            assert_eq!(round_robin_pick(&cursor, 1), 0);
        }
    }

    #[test]
    fn test_weighted_pick_respects_zero_width_tail() {
        // With one dominant weight the draw must still be a valid index.
        for _ in 0..100 {
            let index = weighted_pick(&[1, 1000]);
            assert!(index < 2);
        }
    }

    #[test]
    fn test_strategy_serde_names() {
        assert_eq!(serde_json::to_string(&RoutingStrategy::RoundRobin).unwrap(), "\"round-robin\"");
        assert_eq!(serde_json::to_string(&RoutingStrategy::Priority).unwrap(), "\"priority\"");

        let parsed: RoutingStrategy = serde_json::from_str("\"round-robin\"").unwrap();
        assert_eq!(parsed, RoutingStrategy::RoundRobin);
    }
}
