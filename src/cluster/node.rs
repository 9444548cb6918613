//! Virtual node resource - mirrors a real node inside the replica control plane
//!
//! A VirtualNode exists only for the lifetime of one simulation run. It is
//! either a mirror of a real cluster node (created by inventory sync) or an
//! extension node created by the pool scaler up to the pool's declared max.
//! Capacity, labels, and taints are fixed at creation and never mutated.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::DEFAULT_MAX_PODS;

/// Allocatable capacity of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeCapacity {
    /// CPU in millicores
    #[serde(rename = "cpuMillis")]
    pub cpu_millis: u64,

    /// Memory in bytes
    #[serde(rename = "memoryBytes")]
    pub memory_bytes: u64,

    /// Maximum pods this node can host
    #[serde(rename = "maxPods")]
    #[serde(default = "default_max_pods")]
    pub max_pods: u32,
}

fn default_max_pods() -> u32 {
    DEFAULT_MAX_PODS
}

impl Default for NodeCapacity {
    fn default() -> Self {
        Self {
            cpu_millis: 0,
            memory_bytes: 0,
            max_pods: default_max_pods(),
        }
    }
}

impl NodeCapacity {
    /// Create capacity with CPU millicores and memory bytes
    pub fn new(cpu_millis: u64, memory_bytes: u64) -> Self {
        Self {
            cpu_millis,
            memory_bytes,
            max_pods: default_max_pods(),
        }
    }

    /// Set CPU cores
    pub fn with_cpu_cores(mut self, cores: u64) -> Self {
        self.cpu_millis = cores * 1000;
        self
    }

    /// Set memory in GB
    pub fn with_memory_gb(mut self, gb: u64) -> Self {
        self.memory_bytes = gb * 1024 * 1024 * 1024;
        self
    }

    /// Set the pod ceiling
    pub fn with_max_pods(mut self, max_pods: u32) -> Self {
        self.max_pods = max_pods;
        self
    }
}

/// Effect of a node taint on scheduling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaintEffect {
    /// Pods without a matching toleration are not scheduled here
    NoSchedule,
    /// Scheduler avoids the node but may still use it
    PreferNoSchedule,
    /// Running pods without a toleration are evicted
    NoExecute,
}

/// A taint repelling pods from a node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Taint {
    /// Taint key
    pub key: String,

    /// Taint value
    #[serde(default)]
    pub value: String,

    /// Scheduling effect
    pub effect: TaintEffect,
}

impl Taint {
    /// Create a NoSchedule taint
    pub fn no_schedule(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            effect: TaintEffect::NoSchedule,
        }
    }

    /// Whether this taint blocks scheduling outright
    pub fn blocks_scheduling(&self) -> bool {
        matches!(self.effect, TaintEffect::NoSchedule | TaintEffect::NoExecute)
    }
}

/// An ephemeral node in the replica control plane
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VirtualNode {
    /// Unique node name
    pub name: String,

    /// Owning worker pool
    pub pool: String,

    /// Allocatable capacity, immutable after creation
    pub capacity: NodeCapacity,

    /// Labels for pod selection
    #[serde(default)]
    pub labels: HashMap<String, String>,

    /// Taints repelling non-tolerating pods
    #[serde(default)]
    pub taints: Vec<Taint>,
}

impl VirtualNode {
    /// Create a new node owned by a pool
    pub fn new(name: impl Into<String>, pool: impl Into<String>, capacity: NodeCapacity) -> Self {
        let pool = pool.into();
        let mut labels = HashMap::new();
        labels.insert(super::POOL_LABEL.to_string(), pool.clone());
        Self {
            name: name.into(),
            pool,
            capacity,
            labels,
            taints: Vec::new(),
        }
    }

    /// Add a label
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    /// Add a taint
    pub fn with_taint(mut self, taint: Taint) -> Self {
        self.taints.push(taint);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_builder() {
        let cap = NodeCapacity::default()
            .with_cpu_cores(4)
            .with_memory_gb(16)
            .with_max_pods(64);

        assert_eq!(cap.cpu_millis, 4000);
        assert_eq!(cap.memory_bytes, 16 * 1024 * 1024 * 1024);
        assert_eq!(cap.max_pods, 64);
    }

    #[test]
    fn test_default_max_pods() {
        let cap = NodeCapacity::new(2000, 8 * 1024 * 1024 * 1024);
        assert_eq!(cap.max_pods, super::super::DEFAULT_MAX_PODS);
    }

    #[test]
    fn test_node_carries_pool_label() {
        let node = VirtualNode::new("p1-vn-0", "p1", NodeCapacity::new(1000, 1024));
        assert_eq!(
            node.labels.get(super::super::POOL_LABEL),
            Some(&"p1".to_string())
        );
        assert_eq!(node.pool, "p1");
    }

    #[test]
    fn test_node_builder() {
        let node = VirtualNode::new("n", "p", NodeCapacity::default())
            .with_label("zone", "eu-west-1a")
            .with_taint(Taint::no_schedule("dedicated", "batch"));

        assert_eq!(node.labels.get("zone"), Some(&"eu-west-1a".to_string()));
        assert_eq!(node.taints.len(), 1);
        assert!(node.taints[0].blocks_scheduling());
    }

    #[test]
    fn test_prefer_no_schedule_does_not_block() {
        let taint = Taint {
            key: "soft".to_string(),
            value: String::new(),
            effect: TaintEffect::PreferNoSchedule,
        };
        assert!(!taint.blocks_scheduling());
    }
}
