//! Cluster trimming
//!
//! After admission the replica holds every pool at its max. Trimming removes
//! nodes carrying no non-daemon workload, recomputing the assignment after
//! each pass, until a fixpoint: the minimal node set that still satisfies
//! admission. Daemon occupancy never protects a node; pods are never moved.

use std::collections::HashSet;

use tracing::debug;

use super::SimulationError;
use crate::replica::ReplicaAccess;

const STAGE: &str = "trim";

/// Remove every node with zero non-daemon occupants; returns how many
/// nodes were deleted.
pub async fn trim_cluster<R: ReplicaAccess + ?Sized>(
    replica: &R,
) -> Result<usize, SimulationError> {
    let mut removed = 0;

    loop {
        let pods = replica
            .list_pods()
            .await
            .map_err(|e| SimulationError::access(STAGE, e))?;
        let occupied: HashSet<&str> = pods
            .iter()
            .filter(|p| !p.is_daemon())
            .filter_map(|p| p.node())
            .collect();

        let victims: Vec<String> = replica
            .list_nodes()
            .await
            .map_err(|e| SimulationError::access(STAGE, e))?
            .into_iter()
            .filter(|n| !occupied.contains(n.name.as_str()))
            .map(|n| n.name)
            .collect();

        if victims.is_empty() {
            break;
        }

        for victim in victims {
            replica
                .delete_node(&victim)
                .await
                .map_err(|e| SimulationError::access(STAGE, e))?;
            removed += 1;
        }
    }

    debug!(removed, "cluster trimmed");
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::{NodeCapacity, Pod, ResourceRequest, VirtualNode};
    use crate::engine::admit::apply_daemon_pods;
    use crate::replica::InMemoryReplica;
    use crate::scheduler::SchedulingStrategy;

    const GIB: u64 = 1024 * 1024 * 1024;

    async fn replica_with_nodes(count: u32) -> InMemoryReplica {
        let replica = InMemoryReplica::new();
        let nodes: Vec<VirtualNode> = (0..count)
            .map(|i| {
                VirtualNode::new(
                    format!("n{}", i),
                    "p1",
                    NodeCapacity::default().with_cpu_cores(2).with_memory_gb(8),
                )
            })
            .collect();
        replica.create_nodes(&nodes).await.unwrap();
        replica
    }

    #[tokio::test]
    async fn test_trim_keeps_only_occupied_nodes() {
        let replica = replica_with_nodes(5).await;
        replica
            .schedule(
                SchedulingStrategy::BinPacking,
                vec![Pod::workload("w1", ResourceRequest::new(500, 2 * GIB))],
            )
            .await
            .unwrap();

        let removed = trim_cluster(&replica).await.unwrap();
        assert_eq!(removed, 4);

        let survivors = replica.list_nodes().await.unwrap();
        assert_eq!(survivors.len(), 1);
    }

    #[tokio::test]
    async fn test_trim_is_monotonic_and_idempotent() {
        let replica = replica_with_nodes(3).await;
        replica
            .schedule(
                SchedulingStrategy::FirstFit,
                vec![Pod::workload("w1", ResourceRequest::new(100, GIB))],
            )
            .await
            .unwrap();

        let first = trim_cluster(&replica).await.unwrap();
        let count_after_first = replica.list_nodes().await.unwrap().len();

        let second = trim_cluster(&replica).await.unwrap();
        let count_after_second = replica.list_nodes().await.unwrap().len();

        assert_eq!(first, 2);
        assert_eq!(second, 0, "second trim must be a no-op");
        assert_eq!(count_after_first, count_after_second);
    }

    #[tokio::test]
    async fn test_daemon_only_nodes_are_removed() {
        let replica = replica_with_nodes(3).await;
        apply_daemon_pods(
            &replica,
            &[Pod::daemon("agent", ResourceRequest::new(100, GIB / 4))],
        )
        .await
        .unwrap();
        replica
            .schedule(
                SchedulingStrategy::BinPacking,
                vec![Pod::workload("w1", ResourceRequest::new(500, 2 * GIB))],
            )
            .await
            .unwrap();

        trim_cluster(&replica).await.unwrap();

        let survivors = replica.list_nodes().await.unwrap();
        assert_eq!(survivors.len(), 1, "daemon occupancy must not protect nodes");

        // The surviving node keeps both its workload and its daemon instance.
        let pods = replica.list_pods().await.unwrap();
        assert_eq!(pods.iter().filter(|p| p.is_daemon()).count(), 1);
        assert_eq!(pods.iter().filter(|p| !p.is_daemon()).count(), 1);
    }

    #[tokio::test]
    async fn test_pending_pods_survive_trim() {
        let replica = replica_with_nodes(2).await;
        replica
            .schedule(
                SchedulingStrategy::FirstFit,
                vec![Pod::workload("giant", ResourceRequest::new(9000, 64 * GIB))],
            )
            .await
            .unwrap();

        trim_cluster(&replica).await.unwrap();

        assert!(replica.list_nodes().await.unwrap().is_empty());
        let pending = replica.pending_pods().await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].name, "giant");
    }

    #[tokio::test]
    async fn test_trim_empty_replica_is_noop() {
        let replica = InMemoryReplica::new();
        assert_eq!(trim_cluster(&replica).await.unwrap(), 0);
    }
}
