//! Scale-up recommendations
//!
//! A Recommendation maps worker pool names to non-negative node deltas:
//! how many nodes each pool must grow by so the simulated workload becomes
//! schedulable. Produced exactly once per run and immutable afterwards.
//! Pools whose clamped delta is zero are omitted from the map.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Per-pool node deltas relative to the pre-simulation real pool sizes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    /// Pool name -> additional node count (always > 0; zero deltas omitted)
    pub deltas: BTreeMap<String, u32>,
}

impl Recommendation {
    /// Build a recommendation, dropping zero deltas
    pub fn from_deltas(deltas: impl IntoIterator<Item = (String, u32)>) -> Self {
        Self {
            deltas: deltas.into_iter().filter(|(_, d)| *d > 0).collect(),
        }
    }

    /// Delta for a pool; zero when the pool needs no scale-up
    pub fn delta(&self, pool: &str) -> u32 {
        self.deltas.get(pool).copied().unwrap_or(0)
    }

    /// Whether no pool needs additional nodes
    pub fn is_empty(&self) -> bool {
        self.deltas.is_empty()
    }

    /// Total additional nodes across all pools
    pub fn total_nodes(&self) -> u32 {
        self.deltas.values().sum()
    }

    /// Iterate (pool, delta) pairs in pool-name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.deltas.iter().map(|(pool, delta)| (pool.as_str(), *delta))
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.deltas.is_empty() {
            return write!(f, "no scale-up needed");
        }
        let rendered = self
            .deltas
            .iter()
            .map(|(pool, delta)| format!("{}=+{}", pool, delta))
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "{}", rendered)
    }
}
