//! Inventory synchronization
//!
//! Replaces the replica's entire node set with a fresh mirror of the real
//! cluster's current nodes, discarding prior workload state. No stale data
//! is acceptable: any failure aborts the run.

use tracing::debug;

use super::SimulationError;
use crate::cluster::VirtualNode;
use crate::replica::ReplicaAccess;

const STAGE: &str = "sync";

/// Clear the replica and mirror the given real nodes into it.
///
/// Idempotent: two calls with the same input yield the same node set.
pub async fn sync_virtual_nodes<R: ReplicaAccess + ?Sized>(
    replica: &R,
    real_nodes: &[VirtualNode],
) -> Result<usize, SimulationError> {
    replica
        .clear_all()
        .await
        .map_err(|e| SimulationError::access(STAGE, e))?;

    let created = replica
        .create_nodes(real_nodes)
        .await
        .map_err(|e| SimulationError::access(STAGE, e))?;

    debug!(created, "virtual nodes synchronized");
    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::{NodeCapacity, Pod, ResourceRequest};
    use crate::replica::InMemoryReplica;
    use crate::scheduler::SchedulingStrategy;

    fn real_nodes() -> Vec<VirtualNode> {
        vec![
            VirtualNode::new("real-1", "p1", NodeCapacity::new(2000, 8 << 30)),
            VirtualNode::new("real-2", "p1", NodeCapacity::new(2000, 8 << 30)),
        ]
    }

    #[tokio::test]
    async fn test_sync_is_idempotent() {
        let replica = InMemoryReplica::new();

        let first = sync_virtual_nodes(&replica, &real_nodes()).await.unwrap();
        let after_first = replica.list_nodes().await.unwrap();

        let second = sync_virtual_nodes(&replica, &real_nodes()).await.unwrap();
        let after_second = replica.list_nodes().await.unwrap();

        assert_eq!(first, 2);
        assert_eq!(second, 2);
        assert_eq!(after_first, after_second);
    }

    #[tokio::test]
    async fn test_sync_discards_prior_workload_state() {
        let replica = InMemoryReplica::new();
        sync_virtual_nodes(&replica, &real_nodes()).await.unwrap();
        replica
            .schedule(
                SchedulingStrategy::FirstFit,
                vec![Pod::workload("w1", ResourceRequest::new(100, 1024))],
            )
            .await
            .unwrap();

        sync_virtual_nodes(&replica, &real_nodes()).await.unwrap();
        assert!(replica.list_pods().await.unwrap().is_empty());
        assert_eq!(replica.list_nodes().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_duplicate_input_aborts() {
        let replica = InMemoryReplica::new();
        let nodes = vec![
            VirtualNode::new("dup", "p1", NodeCapacity::new(1000, 1 << 30)),
            VirtualNode::new("dup", "p1", NodeCapacity::new(1000, 1 << 30)),
        ];
        let err = sync_virtual_nodes(&replica, &nodes).await.unwrap_err();
        assert!(matches!(err, SimulationError::Access { stage: "sync", .. }));
    }
}
