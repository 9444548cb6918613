//! Replica control plane access
//!
//! The replica is an isolated control plane holding only ephemeral state:
//! virtual nodes and simulated pods. It is rebuilt from scratch by every
//! simulation run and handed through the pipeline as an explicit run-scoped
//! handle, never a hidden singleton. Concurrent runs use separate handles
//! over separate state.

pub mod events;
pub mod memory;

pub use events::{EventReason, SchedulingEvent};
pub use memory::InMemoryReplica;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::cluster::{NodePodAssignment, Pod, VirtualNode};
use crate::scheduler::SchedulingStrategy;

/// Errors raised by replica control plane operations
#[derive(Error, Debug)]
pub enum ReplicaError {
    #[error("Node '{0}' already exists")]
    NodeExists(String),

    #[error("Node '{0}' not found")]
    NodeNotFound(String),

    #[error("Pod '{0}' already exists")]
    PodExists(String),

    #[error("Pod '{0}' does not fit on node '{1}'")]
    CapacityExceeded(String, String),

    #[error("Created {created} of {requested} objects: {reason}")]
    PartialCreation {
        created: usize,
        requested: usize,
        reason: String,
    },
}

impl ReplicaError {
    /// Success count a caller may rely on after a creation batch
    pub fn created(&self) -> usize {
        match self {
            ReplicaError::PartialCreation { created, .. } => *created,
            _ => 0,
        }
    }
}

/// Operations the pipeline needs from a replica control plane.
///
/// Creation batches are not transactional: they can partially succeed, in
/// which case the error carries the success count and callers must treat
/// that count as ground truth.
#[async_trait]
pub trait ReplicaAccess: Send + Sync {
    /// Delete all virtual nodes and pods
    async fn clear_all(&self) -> Result<(), ReplicaError>;

    /// Create virtual nodes, returning how many were created
    async fn create_nodes(&self, nodes: &[VirtualNode]) -> Result<usize, ReplicaError>;

    /// Delete a node together with every pod bound to it
    async fn delete_node(&self, name: &str) -> Result<(), ReplicaError>;

    /// Snapshot of all virtual nodes
    async fn list_nodes(&self) -> Result<Vec<VirtualNode>, ReplicaError>;

    /// Create pods as given; pods already carrying a node binding are
    /// capacity-checked against that node
    async fn create_pods(&self, pods: &[Pod]) -> Result<usize, ReplicaError>;

    /// Create the given pods pending, then assign them to nodes using the
    /// selected strategy; returns the pods still pending afterwards
    async fn schedule(
        &self,
        strategy: SchedulingStrategy,
        pods: Vec<Pod>,
    ) -> Result<Vec<Pod>, ReplicaError>;

    /// All pods currently without a node
    async fn pending_pods(&self) -> Result<Vec<Pod>, ReplicaError>;

    /// Snapshot of all pods
    async fn list_pods(&self) -> Result<Vec<Pod>, ReplicaError>;

    /// Current node -> pod mapping, including empty nodes
    async fn list_assignments(&self) -> Result<NodePodAssignment, ReplicaError>;

    /// Scheduling events recorded at or after `since`, ordered by timestamp
    async fn list_events(&self, since: DateTime<Utc>)
        -> Result<Vec<SchedulingEvent>, ReplicaError>;
}
