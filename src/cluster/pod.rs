//! Pod resource - a schedulable unit of work
//!
//! Pods come in two owner classes: workload pods submitted by the caller, and
//! daemon pods that run once per eligible node. Daemon pods are templates;
//! the admitter replicates one instance per node. Daemon instances consume
//! node capacity but never count toward trim decisions or pool deltas.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::node::{Taint, VirtualNode};

const MIB: u64 = 1024 * 1024;

/// Resource request of a pod (also used for free-capacity arithmetic)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRequest {
    /// CPU in millicores
    #[serde(rename = "cpuMillis")]
    #[serde(default)]
    pub cpu_millis: u64,

    /// Memory in bytes
    #[serde(rename = "memoryBytes")]
    #[serde(default)]
    pub memory_bytes: u64,
}

impl ResourceRequest {
    /// Create a request with CPU millicores and memory bytes
    pub fn new(cpu_millis: u64, memory_bytes: u64) -> Self {
        Self {
            cpu_millis,
            memory_bytes,
        }
    }

    /// Scalar ordering key for packing decisions.
    ///
    /// One millicore weighs as one MiB. The scalar is purely ordinal; ties
    /// are broken by name at the call sites that sort by it.
    pub fn magnitude(&self) -> u64 {
        self.cpu_millis + self.memory_bytes / MIB
    }

    /// Whether `other` fits inside this request when treated as free capacity
    pub fn accommodates(&self, other: &ResourceRequest) -> bool {
        self.cpu_millis >= other.cpu_millis && self.memory_bytes >= other.memory_bytes
    }

    /// Subtract another request, saturating at zero
    pub fn minus(&self, other: &ResourceRequest) -> ResourceRequest {
        ResourceRequest {
            cpu_millis: self.cpu_millis.saturating_sub(other.cpu_millis),
            memory_bytes: self.memory_bytes.saturating_sub(other.memory_bytes),
        }
    }
}

/// Owner class of a pod
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PodClass {
    /// Regular workload pod submitted by the caller
    Workload,
    /// One-per-eligible-node daemon pod
    Daemon,
}

/// Scheduling state of a pod
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum PodPhase {
    /// Not yet bound to a node
    Pending,
    /// Bound to the named node
    Scheduled { node: String },
}

/// A pod in the replica control plane
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pod {
    /// Unique pod name
    pub name: String,

    /// Resource request
    #[serde(default)]
    pub request: ResourceRequest,

    /// Owner class
    pub class: PodClass,

    /// Node labels this pod requires (subset match)
    #[serde(rename = "nodeSelector")]
    #[serde(default)]
    pub node_selector: HashMap<String, String>,

    /// Taints this pod tolerates
    #[serde(default)]
    pub tolerations: Vec<Toleration>,

    /// Current scheduling state
    #[serde(default = "pending")]
    pub phase: PodPhase,
}

fn pending() -> PodPhase {
    PodPhase::Pending
}

impl Pod {
    /// Create a pending workload pod
    pub fn workload(name: impl Into<String>, request: ResourceRequest) -> Self {
        Self {
            name: name.into(),
            request,
            class: PodClass::Workload,
            node_selector: HashMap::new(),
            tolerations: Vec::new(),
            phase: PodPhase::Pending,
        }
    }

    /// Create a daemon pod template
    pub fn daemon(name: impl Into<String>, request: ResourceRequest) -> Self {
        Self {
            name: name.into(),
            request,
            class: PodClass::Daemon,
            node_selector: HashMap::new(),
            tolerations: Vec::new(),
            phase: PodPhase::Pending,
        }
    }

    /// Require a node label
    pub fn with_selector(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.node_selector.insert(key.into(), value.into());
        self
    }

    /// Add a toleration
    pub fn with_toleration(mut self, toleration: Toleration) -> Self {
        self.tolerations.push(toleration);
        self
    }

    /// Whether this pod is a daemon instance or template
    pub fn is_daemon(&self) -> bool {
        self.class == PodClass::Daemon
    }

    /// Whether this pod is still awaiting a node
    pub fn is_pending(&self) -> bool {
        self.phase == PodPhase::Pending
    }

    /// The node this pod is bound to, if any
    pub fn node(&self) -> Option<&str> {
        match &self.phase {
            PodPhase::Pending => None,
            PodPhase::Scheduled { node } => Some(node),
        }
    }

    /// Placement eligibility: selector labels present and blocking taints tolerated
    pub fn matches_node(&self, node: &VirtualNode) -> bool {
        let labels_ok = self
            .node_selector
            .iter()
            .all(|(k, v)| node.labels.get(k) == Some(v));

        let taints_ok = node
            .taints
            .iter()
            .filter(|t| t.blocks_scheduling())
            .all(|t| self.tolerations.iter().any(|tol| tol.tolerates(t)));

        labels_ok && taints_ok
    }
}

/// A pod-side match against node taints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Toleration {
    /// Taint key to match
    pub key: String,

    /// Required value; None tolerates any value for the key
    #[serde(default)]
    pub value: Option<String>,

    /// Required effect; None tolerates any effect
    #[serde(default)]
    pub effect: Option<super::node::TaintEffect>,
}

impl Toleration {
    /// Tolerate any value and effect for a key
    pub fn for_key(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: None,
            effect: None,
        }
    }

    /// Whether this toleration matches a taint
    pub fn tolerates(&self, taint: &Taint) -> bool {
        if self.key != taint.key {
            return false;
        }
        if let Some(value) = &self.value {
            if value != &taint.value {
                return false;
            }
        }
        if let Some(effect) = &self.effect {
            if *effect != taint.effect {
                return false;
            }
        }
        true
    }
}
