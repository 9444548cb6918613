//! Recommendation synthesis
//!
//! Reduces the post-trim replica state to a per-pool node delta relative to
//! each pool's pre-simulation real size. Pure and deterministic: same
//! inputs, same recommendation. Pools whose clamped delta is zero are
//! omitted from the result.

use std::collections::HashMap;

use crate::cluster::{NodePodAssignment, Recommendation, VirtualNode, WorkerPool};

/// Compute per-pool deltas from the surviving node set.
///
/// For each pool: delta = surviving − current, clipped to [0, max − current].
pub fn synthesize(
    assignments: &NodePodAssignment,
    nodes: &[VirtualNode],
    pools: &[WorkerPool],
) -> Recommendation {
    let pool_of: HashMap<&str, &str> = nodes
        .iter()
        .map(|n| (n.name.as_str(), n.pool.as_str()))
        .collect();

    let mut surviving: HashMap<&str, u32> = HashMap::new();
    for node in assignments.node_names() {
        if let Some(pool) = pool_of.get(node) {
            *surviving.entry(pool).or_default() += 1;
        }
    }

    Recommendation::from_deltas(pools.iter().map(|pool| {
        let count = surviving.get(pool.name.as_str()).copied().unwrap_or(0);
        let delta = count
            .saturating_sub(pool.current_replicas)
            .min(pool.headroom());
        (pool.name.clone(), delta)
    }))
}
