//! Worker pool definitions
//!
//! A WorkerPool describes one scalable group of machines in the real
//! cluster: its machine type, size bounds, current real replica count, and
//! the node shape the simulator uses when extending the pool with virtual
//! nodes.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::node::{NodeCapacity, Taint, VirtualNode};

/// Errors raised by worker pool validation
#[derive(Error, Debug)]
pub enum PoolError {
    #[error("Pool '{0}' has max replicas {1} below min replicas {2}")]
    InvalidBounds(String, u32, u32),
}

/// A named group of nodes sharing machine type and size bounds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerPool {
    /// Pool identifier
    pub name: String,

    /// Machine/instance type of this pool's nodes
    #[serde(rename = "machineType")]
    pub machine_type: String,

    /// Minimum replica count
    #[serde(rename = "minReplicas")]
    #[serde(default)]
    pub min_replicas: u32,

    /// Maximum replica count; the simulation never creates more virtual
    /// nodes for this pool
    #[serde(rename = "maxReplicas")]
    pub max_replicas: u32,

    /// Current real replica count, supplied externally
    #[serde(rename = "currentReplicas")]
    #[serde(default)]
    pub current_replicas: u32,

    /// Allocatable capacity of one node of this machine type
    #[serde(rename = "nodeCapacity")]
    pub node_capacity: NodeCapacity,

    /// Labels stamped on every node of this pool
    #[serde(default)]
    pub labels: HashMap<String, String>,

    /// Taints stamped on every node of this pool
    #[serde(default)]
    pub taints: Vec<Taint>,
}

impl WorkerPool {
    /// Create a pool with the given bounds and node shape
    pub fn new(
        name: impl Into<String>,
        machine_type: impl Into<String>,
        max_replicas: u32,
        node_capacity: NodeCapacity,
    ) -> Self {
        Self {
            name: name.into(),
            machine_type: machine_type.into(),
            min_replicas: 0,
            max_replicas,
            current_replicas: 0,
            node_capacity,
            labels: HashMap::new(),
            taints: Vec::new(),
        }
    }

    /// Set the minimum replica count
    pub fn with_min_replicas(mut self, min: u32) -> Self {
        self.min_replicas = min;
        self
    }

    /// Set the current real replica count
    pub fn with_current_replicas(mut self, current: u32) -> Self {
        self.current_replicas = current;
        self
    }

    /// Add a label stamped on pool nodes
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    /// Check the max >= min invariant
    pub fn validate(&self) -> Result<(), PoolError> {
        if self.max_replicas < self.min_replicas {
            return Err(PoolError::InvalidBounds(
                self.name.clone(),
                self.max_replicas,
                self.min_replicas,
            ));
        }
        Ok(())
    }

    /// How many more nodes this pool may still grow by
    pub fn headroom(&self) -> u32 {
        self.max_replicas.saturating_sub(self.current_replicas)
    }

    /// Build the virtual node this pool would create at the given index
    pub fn node_template(&self, index: u32) -> VirtualNode {
        let mut node = VirtualNode::new(
            format!("{}-vn-{}", self.name, index),
            self.name.clone(),
            self.node_capacity,
        );
        for (k, v) in &self.labels {
            node = node.with_label(k.clone(), v.clone());
        }
        for taint in &self.taints {
            node = node.with_taint(taint.clone());
        }
        node
    }
}
