//! Node to pod assignment snapshots
//!
//! A NodePodAssignment is a derived view of the replica control plane:
//! every node currently present, mapped to the pods bound to it. It is
//! recomputed after each mutating pipeline stage, never hand-edited.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

/// Mapping from node name to the set of pod names bound to it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodePodAssignment {
    /// Ordered node -> pods entries (ordered for deterministic rendering)
    pub entries: BTreeMap<String, BTreeSet<String>>,
}

impl NodePodAssignment {
    /// Create an empty snapshot
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a node with no pods yet
    pub fn add_node(&mut self, node: impl Into<String>) {
        self.entries.entry(node.into()).or_default();
    }

    /// Record a pod bound to a node
    pub fn bind(&mut self, node: impl Into<String>, pod: impl Into<String>) {
        self.entries.entry(node.into()).or_default().insert(pod.into());
    }

    /// Pods bound to a node, empty if the node is absent
    pub fn pods_on(&self, node: &str) -> impl Iterator<Item = &str> {
        self.entries
            .get(node)
            .into_iter()
            .flat_map(|pods| pods.iter().map(String::as_str))
    }

    /// All node names in the snapshot
    pub fn node_names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Number of nodes in the snapshot
    pub fn node_count(&self) -> usize {
        self.entries.len()
    }

    /// Total number of bound pods across all nodes
    pub fn pod_count(&self) -> usize {
        self.entries.values().map(BTreeSet::len).sum()
    }
}

impl fmt::Display for NodePodAssignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (node, pods) in &self.entries {
            let joined = pods.iter().cloned().collect::<Vec<_>>().join(", ");
            writeln!(f, "{}: [{}]", node, joined)?;
        }
        Ok(())
    }
}
