//! In-memory replica control plane
//!
//! The default `ReplicaAccess` implementation: plain maps guarded for
//! concurrent access, with an append-only event log. One instance per
//! simulation run gives each run an isolated partition for free.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::RwLock;
use tracing::debug;

use super::events::SchedulingEvent;
use super::{ReplicaAccess, ReplicaError};
use crate::cluster::{NodePodAssignment, Pod, PodPhase, ResourceRequest, VirtualNode};
use crate::scheduler::{self, NodeFit, SchedulingStrategy};

/// Ephemeral replica state for one simulation run
#[derive(Clone, Default)]
pub struct InMemoryReplica {
    /// Virtual nodes indexed by name
    nodes: Arc<DashMap<String, VirtualNode>>,

    /// Pods indexed by name
    pods: Arc<DashMap<String, Pod>>,

    /// Append-only scheduling event log
    events: Arc<RwLock<Vec<SchedulingEvent>>>,
}

impl InMemoryReplica {
    /// Create an empty replica
    pub fn new() -> Self {
        Self::default()
    }

    /// Remaining free capacity and pod slots of a node
    fn free_of(&self, node: &VirtualNode) -> (ResourceRequest, u32) {
        let mut free = ResourceRequest::new(node.capacity.cpu_millis, node.capacity.memory_bytes);
        let mut slots = node.capacity.max_pods;
        for pod in self.pods.iter() {
            if pod.node() == Some(node.name.as_str()) {
                free = free.minus(&pod.request);
                slots = slots.saturating_sub(1);
            }
        }
        (free, slots)
    }

    /// Free-capacity snapshot of the whole node set
    fn snapshot(&self) -> Vec<NodeFit> {
        self.nodes
            .iter()
            .map(|entry| {
                let node = entry.value().clone();
                let (free, free_pods) = self.free_of(&node);
                NodeFit {
                    node,
                    free,
                    free_pods,
                }
            })
            .collect()
    }

    async fn record(&self, event: SchedulingEvent) {
        self.events.write().await.push(event);
    }

    /// Validate and store one pod; bound pods are capacity-checked
    fn insert_pod(&self, pod: Pod) -> Result<(), ReplicaError> {
        if self.pods.contains_key(&pod.name) {
            return Err(ReplicaError::PodExists(pod.name));
        }
        if let PodPhase::Scheduled { node } = &pod.phase {
            let target = self
                .nodes
                .get(node)
                .ok_or_else(|| ReplicaError::NodeNotFound(node.clone()))?;
            let (free, slots) = self.free_of(target.value());
            if slots == 0 || !free.accommodates(&pod.request) {
                return Err(ReplicaError::CapacityExceeded(pod.name, node.clone()));
            }
        }
        self.pods.insert(pod.name.clone(), pod);
        Ok(())
    }
}

#[async_trait]
impl ReplicaAccess for InMemoryReplica {
    async fn clear_all(&self) -> Result<(), ReplicaError> {
        self.nodes.clear();
        self.pods.clear();
        debug!("replica cleared");
        Ok(())
    }

    async fn create_nodes(&self, nodes: &[VirtualNode]) -> Result<usize, ReplicaError> {
        let mut created = 0;
        let mut first_failure: Option<String> = None;

        for node in nodes {
            if self.nodes.contains_key(&node.name) {
                first_failure
                    .get_or_insert_with(|| format!("node '{}' already exists", node.name));
                continue;
            }
            self.nodes.insert(node.name.clone(), node.clone());
            created += 1;
        }

        match first_failure {
            None => Ok(created),
            Some(reason) => Err(ReplicaError::PartialCreation {
                created,
                requested: nodes.len(),
                reason,
            }),
        }
    }

    async fn delete_node(&self, name: &str) -> Result<(), ReplicaError> {
        self.nodes
            .remove(name)
            .ok_or_else(|| ReplicaError::NodeNotFound(name.to_string()))?;

        let orphaned: Vec<String> = self
            .pods
            .iter()
            .filter(|p| p.node() == Some(name))
            .map(|p| p.name.clone())
            .collect();
        for pod in orphaned {
            self.pods.remove(&pod);
        }

        self.record(SchedulingEvent::node_removed(name)).await;
        Ok(())
    }

    async fn list_nodes(&self) -> Result<Vec<VirtualNode>, ReplicaError> {
        let mut nodes: Vec<VirtualNode> = self.nodes.iter().map(|e| e.value().clone()).collect();
        nodes.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(nodes)
    }

    async fn create_pods(&self, pods: &[Pod]) -> Result<usize, ReplicaError> {
        let mut created = 0;
        let mut first_failure: Option<String> = None;

        for pod in pods {
            match self.insert_pod(pod.clone()) {
                Ok(()) => {
                    if let Some(node) = pod.node() {
                        self.record(SchedulingEvent::scheduled(&pod.name, node)).await;
                    }
                    created += 1;
                }
                Err(e) => {
                    first_failure.get_or_insert_with(|| e.to_string());
                }
            }
        }

        match first_failure {
            None => Ok(created),
            Some(reason) => Err(ReplicaError::PartialCreation {
                created,
                requested: pods.len(),
                reason,
            }),
        }
    }

    async fn schedule(
        &self,
        strategy: SchedulingStrategy,
        pods: Vec<Pod>,
    ) -> Result<Vec<Pod>, ReplicaError> {
        // Register the batch as pending before planning.
        for mut pod in pods.clone() {
            pod.phase = PodPhase::Pending;
            self.insert_pod(pod)?;
        }

        let mut fits = self.snapshot();
        let placements = scheduler::plan(strategy, &mut fits, &pods);

        let mut still_pending = Vec::new();
        for placement in placements {
            match placement.node {
                Some(node) => {
                    if let Some(mut pod) = self.pods.get_mut(&placement.pod) {
                        pod.phase = PodPhase::Scheduled { node: node.clone() };
                    }
                    self.record(SchedulingEvent::scheduled(&placement.pod, &node))
                        .await;
                }
                None => {
                    self.record(SchedulingEvent::failed_scheduling(
                        &placement.pod,
                        format!(
                            "no node with sufficient free capacity ({} strategy)",
                            strategy
                        ),
                    ))
                    .await;
                    if let Some(pod) = self.pods.get(&placement.pod) {
                        still_pending.push(pod.clone());
                    }
                }
            }
        }

        still_pending.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(still_pending)
    }

    async fn pending_pods(&self) -> Result<Vec<Pod>, ReplicaError> {
        let mut pending: Vec<Pod> = self
            .pods
            .iter()
            .filter(|p| p.is_pending())
            .map(|p| p.value().clone())
            .collect();
        pending.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(pending)
    }

    async fn list_pods(&self) -> Result<Vec<Pod>, ReplicaError> {
        let mut pods: Vec<Pod> = self.pods.iter().map(|e| e.value().clone()).collect();
        pods.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(pods)
    }

    async fn list_assignments(&self) -> Result<NodePodAssignment, ReplicaError> {
        let mut snapshot = NodePodAssignment::new();
        for node in self.nodes.iter() {
            snapshot.add_node(node.key().clone());
        }
        for pod in self.pods.iter() {
            if let Some(node) = pod.node() {
                snapshot.bind(node, pod.name.clone());
            }
        }
        Ok(snapshot)
    }

    async fn list_events(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<SchedulingEvent>, ReplicaError> {
        let mut events: Vec<SchedulingEvent> = self
            .events
            .read()
            .await
            .iter()
            .filter(|e| e.timestamp >= since)
            .cloned()
            .collect();
        events.sort_by_key(|e| e.timestamp);
        Ok(events)
    }
}
