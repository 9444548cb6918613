//! Pool scaling to declared maxima
//!
//! Best-effort "scale to ceiling": each worker pool is grown with virtual
//! nodes until it holds its max replica count. Pools are scaled
//! independently; one pool's failure never blocks the others. The report's
//! created count is ground truth, never the assumed total.

use tracing::warn;

use super::SimulationError;
use crate::cluster::WorkerPool;
use crate::replica::{ReplicaAccess, ReplicaError};

const STAGE: &str = "scale";

/// A pool that could not be scaled fully to its max
#[derive(Debug, Clone)]
pub struct PoolShortfall {
    /// Affected pool
    pub pool: String,
    /// Nodes the pool still needed
    pub requested: u32,
    /// Nodes actually created for it
    pub created: u32,
    /// What went wrong
    pub reason: String,
}

/// Outcome of scaling all pools
#[derive(Debug, Clone, Default)]
pub struct ScaleReport {
    /// Total nodes successfully created across all pools
    pub created: usize,
    /// Pools left short of their max
    pub shortfalls: Vec<PoolShortfall>,
}

/// Grow every pool's virtual node count to its declared max.
pub async fn scale_pools_to_max<R: ReplicaAccess + ?Sized>(
    replica: &R,
    pools: &[WorkerPool],
) -> Result<ScaleReport, SimulationError> {
    let existing = replica
        .list_nodes()
        .await
        .map_err(|e| SimulationError::access(STAGE, e))?;

    let mut report = ScaleReport::default();

    for pool in pools {
        if let Err(e) = pool.validate() {
            warn!(pool = %pool.name, error = %e, "skipping invalid pool");
            report.shortfalls.push(PoolShortfall {
                pool: pool.name.clone(),
                requested: 0,
                created: 0,
                reason: e.to_string(),
            });
            continue;
        }

        let present = existing.iter().filter(|n| n.pool == pool.name).count() as u32;
        let needed = pool.max_replicas.saturating_sub(present);
        if needed == 0 {
            continue;
        }

        let templates: Vec<_> = (present..pool.max_replicas)
            .map(|i| pool.node_template(i))
            .collect();

        match replica.create_nodes(&templates).await {
            Ok(created) => report.created += created,
            Err(ReplicaError::PartialCreation {
                created, reason, ..
            }) => {
                warn!(pool = %pool.name, created, needed, %reason, "pool scaled partially");
                report.created += created;
                report.shortfalls.push(PoolShortfall {
                    pool: pool.name.clone(),
                    requested: needed,
                    created: created as u32,
                    reason,
                });
            }
            Err(e) => {
                warn!(pool = %pool.name, error = %e, "pool scaling failed");
                report.shortfalls.push(PoolShortfall {
                    pool: pool.name.clone(),
                    requested: needed,
                    created: 0,
                    reason: e.to_string(),
                });
            }
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::{NodeCapacity, VirtualNode};
    use crate::replica::InMemoryReplica;

    fn pool(name: &str, max: u32) -> WorkerPool {
        WorkerPool::new(
            name,
            "m5.large",
            max,
            NodeCapacity::default().with_cpu_cores(2).with_memory_gb(8),
        )
    }

    #[tokio::test]
    async fn test_scales_each_pool_to_max() {
        let replica = InMemoryReplica::new();
        let report = scale_pools_to_max(&replica, &[pool("p1", 3), pool("p2", 2)])
            .await
            .unwrap();

        assert_eq!(report.created, 5);
        assert!(report.shortfalls.is_empty());

        let nodes = replica.list_nodes().await.unwrap();
        assert_eq!(nodes.iter().filter(|n| n.pool == "p1").count(), 3);
        assert_eq!(nodes.iter().filter(|n| n.pool == "p2").count(), 2);
    }

    #[tokio::test]
    async fn test_counts_mirrored_nodes_toward_max() {
        let replica = InMemoryReplica::new();
        replica
            .create_nodes(&[
                VirtualNode::new("real-1", "p1", NodeCapacity::new(2000, 8 << 30)),
                VirtualNode::new("real-2", "p1", NodeCapacity::new(2000, 8 << 30)),
            ])
            .await
            .unwrap();

        let report = scale_pools_to_max(&replica, &[pool("p1", 5)]).await.unwrap();
        assert_eq!(report.created, 3);
        assert_eq!(replica.list_nodes().await.unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_never_exceeds_max() {
        let replica = InMemoryReplica::new();
        scale_pools_to_max(&replica, &[pool("p1", 4)]).await.unwrap();

        // Already at max: a second pass creates nothing.
        let report = scale_pools_to_max(&replica, &[pool("p1", 4)]).await.unwrap();
        assert_eq!(report.created, 0);
        assert_eq!(replica.list_nodes().await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_one_pool_failure_does_not_block_others() {
        let replica = InMemoryReplica::new();
        // A pre-existing node whose name collides with p1's first template.
        replica
            .create_nodes(&[VirtualNode::new(
                "p1-vn-1",
                "other",
                NodeCapacity::new(1000, 1 << 30),
            )])
            .await
            .unwrap();

        let report = scale_pools_to_max(&replica, &[pool("p1", 2), pool("p2", 2)])
            .await
            .unwrap();

        assert_eq!(report.shortfalls.len(), 1);
        assert_eq!(report.shortfalls[0].pool, "p1");
        assert_eq!(report.shortfalls[0].created, 1);
        // p2 still reached its max.
        let nodes = replica.list_nodes().await.unwrap();
        assert_eq!(nodes.iter().filter(|n| n.pool == "p2").count(), 2);
        assert_eq!(report.created, 3);
    }

    #[tokio::test]
    async fn test_invalid_pool_reported_not_fatal() {
        let replica = InMemoryReplica::new();
        let broken = pool("bad", 1).with_min_replicas(5);

        let report = scale_pools_to_max(&replica, &[broken, pool("ok", 1)])
            .await
            .unwrap();
        assert_eq!(report.created, 1);
        assert_eq!(report.shortfalls.len(), 1);
        assert_eq!(report.shortfalls[0].pool, "bad");
    }
}
