//! Workload admission
//!
//! Two phases: mandatory daemon pods are fanned out to every eligible node
//! first, then the pending workload pods are submitted to the selected
//! scheduling strategy. Pods whose request exceeds every node's allocatable
//! capacity are permanently unschedulable; they are reported up front and
//! never retried.

use tracing::{debug, warn};

use super::SimulationError;
use crate::cluster::{Pod, PodPhase, ResourceRequest};
use crate::replica::{ReplicaAccess, ReplicaError};
use crate::scheduler::SchedulingStrategy;

const STAGE: &str = "admit";

/// Outcome of submitting the workload batch
#[derive(Debug, Clone, Default)]
pub struct AdmitReport {
    /// Pods left pending by the strategy
    pub pending: Vec<Pod>,
    /// Pods that can never fit any node, even after scale-out
    pub infeasible: Vec<String>,
}

/// Bind one instance of each eligible daemon pod to every virtual node.
///
/// Deterministic: every node receives its full eligible set, named
/// `"{template}-{node}"`. Instances that no longer fit a node are skipped
/// with a warning; the returned count is the instances actually created.
pub async fn apply_daemon_pods<R: ReplicaAccess + ?Sized>(
    replica: &R,
    daemons: &[Pod],
) -> Result<usize, SimulationError> {
    let nodes = replica
        .list_nodes()
        .await
        .map_err(|e| SimulationError::access(STAGE, e))?;

    let mut created = 0;
    for node in &nodes {
        for template in daemons {
            if !template.matches_node(node) {
                continue;
            }
            let mut instance = template.clone();
            instance.name = format!("{}-{}", template.name, node.name);
            instance.phase = PodPhase::Scheduled {
                node: node.name.clone(),
            };

            match replica.create_pods(&[instance]).await {
                Ok(n) => created += n,
                Err(ReplicaError::PartialCreation { reason, .. }) => {
                    warn!(daemon = %template.name, node = %node.name, %reason,
                        "daemon instance not created");
                }
                Err(e) => return Err(SimulationError::access(STAGE, e)),
            }
        }
    }

    debug!(created, nodes = nodes.len(), "daemon pods applied");
    Ok(created)
}

/// Submit workload pods to the strategy and screen out infeasible ones.
pub async fn admit_workloads<R: ReplicaAccess + ?Sized>(
    replica: &R,
    strategy: SchedulingStrategy,
    pods: Vec<Pod>,
) -> Result<AdmitReport, SimulationError> {
    let nodes = replica
        .list_nodes()
        .await
        .map_err(|e| SimulationError::access(STAGE, e))?;

    // A pod larger than every eligible node's total allocatable capacity
    // cannot be helped by any amount of scale-out.
    let infeasible: Vec<String> = pods
        .iter()
        .filter(|pod| {
            !nodes.iter().any(|node| {
                let total =
                    ResourceRequest::new(node.capacity.cpu_millis, node.capacity.memory_bytes);
                pod.matches_node(node) && total.accommodates(&pod.request)
            })
        })
        .map(|pod| pod.name.clone())
        .collect();

    for pod in &infeasible {
        warn!(pod = %pod, "pod cannot fit any node even at pool maxima");
    }

    if pods.is_empty() {
        return Ok(AdmitReport {
            pending: Vec::new(),
            infeasible,
        });
    }

    let pending = replica
        .schedule(strategy, pods)
        .await
        .map_err(|e| SimulationError::access(STAGE, e))?;

    Ok(AdmitReport {
        pending,
        infeasible,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::{NodeCapacity, Taint, Toleration, VirtualNode};
    use crate::replica::InMemoryReplica;

    const GIB: u64 = 1024 * 1024 * 1024;

    async fn replica_with_nodes(names: &[&str]) -> InMemoryReplica {
        let replica = InMemoryReplica::new();
        let nodes: Vec<VirtualNode> = names
            .iter()
            .map(|n| {
                VirtualNode::new(
                    *n,
                    "p1",
                    NodeCapacity::default().with_cpu_cores(2).with_memory_gb(8),
                )
            })
            .collect();
        replica.create_nodes(&nodes).await.unwrap();
        replica
    }

    #[tokio::test]
    async fn test_daemons_fan_out_to_every_node() {
        let replica = replica_with_nodes(&["n1", "n2", "n3"]).await;
        let daemons = vec![
            Pod::daemon("log-agent", ResourceRequest::new(100, GIB / 4)),
            Pod::daemon("metrics", ResourceRequest::new(50, GIB / 8)),
        ];

        let created = apply_daemon_pods(&replica, &daemons).await.unwrap();
        assert_eq!(created, 6);

        let pods = replica.list_pods().await.unwrap();
        assert!(pods.iter().all(|p| p.is_daemon() && !p.is_pending()));
        assert!(pods.iter().any(|p| p.name == "log-agent-n2"));
    }

    #[tokio::test]
    async fn test_daemon_respects_placement_constraints() {
        let replica = InMemoryReplica::new();
        replica
            .create_nodes(&[
                VirtualNode::new("plain", "p1", NodeCapacity::new(2000, 8 * GIB)),
                VirtualNode::new("tainted", "p1", NodeCapacity::new(2000, 8 * GIB))
                    .with_taint(Taint::no_schedule("dedicated", "infra")),
            ])
            .await
            .unwrap();

        let tolerant = Pod::daemon("agent", ResourceRequest::new(100, GIB / 4))
            .with_toleration(Toleration::for_key("dedicated"));
        let plain = Pod::daemon("sidecar", ResourceRequest::new(100, GIB / 4));

        let created = apply_daemon_pods(&replica, &[tolerant, plain]).await.unwrap();
        // agent lands on both nodes, sidecar only on the untainted one.
        assert_eq!(created, 3);
    }

    #[tokio::test]
    async fn test_infeasible_pod_detected() {
        let replica = replica_with_nodes(&["n1"]).await;
        let report = admit_workloads(
            &replica,
            SchedulingStrategy::BinPacking,
            vec![
                Pod::workload("fits", ResourceRequest::new(500, 2 * GIB)),
                Pod::workload("giant", ResourceRequest::new(9000, 64 * GIB)),
            ],
        )
        .await
        .unwrap();

        assert_eq!(report.infeasible, vec!["giant".to_string()]);
        assert_eq!(report.pending.len(), 1);
        assert_eq!(report.pending[0].name, "giant");
    }

    #[tokio::test]
    async fn test_daemons_excluded_from_feasibility_space() {
        // A pod that fits an empty node is feasible even when daemons
        // currently occupy part of it.
        let replica = replica_with_nodes(&["n1"]).await;
        apply_daemon_pods(
            &replica,
            &[Pod::daemon("agent", ResourceRequest::new(500, 2 * GIB))],
        )
        .await
        .unwrap();

        let report = admit_workloads(
            &replica,
            SchedulingStrategy::BinPacking,
            vec![Pod::workload("big", ResourceRequest::new(2000, 8 * GIB))],
        )
        .await
        .unwrap();

        // Not infeasible (fits allocatable), but pending (no free room now).
        assert!(report.infeasible.is_empty());
        assert_eq!(report.pending.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_workload_batch() {
        let replica = replica_with_nodes(&["n1"]).await;
        let report = admit_workloads(&replica, SchedulingStrategy::FirstFit, Vec::new())
            .await
            .unwrap();
        assert!(report.pending.is_empty());
        assert!(report.infeasible.is_empty());
    }
}
