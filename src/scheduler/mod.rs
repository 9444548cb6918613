//! Scheduling strategies for workload admission
//!
//! Strategy selection is a closed set dispatched at the schedule call
//! boundary. The planner is pure: it takes a free-capacity snapshot of the
//! node set and a batch of pending pods, and returns a deterministic
//! placement plan without touching replica state.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::cluster::{Pod, ResourceRequest, VirtualNode};

/// Closed set of admission policies
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SchedulingStrategy {
    /// Baseline: first node (in name order) with room takes the pod
    #[default]
    FirstFit,
    /// Tightest-fit-first packing to minimize the surviving node count
    BinPacking,
}

impl fmt::Display for SchedulingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchedulingStrategy::FirstFit => write!(f, "first-fit"),
            SchedulingStrategy::BinPacking => write!(f, "bin-packing"),
        }
    }
}

/// A node plus its remaining free capacity at planning time
#[derive(Debug, Clone)]
pub struct NodeFit {
    /// The node being considered
    pub node: VirtualNode,
    /// Free resources after all pods bound so far
    pub free: ResourceRequest,
    /// Remaining pod slots
    pub free_pods: u32,
}

impl NodeFit {
    /// Snapshot a node with its full capacity free
    pub fn empty(node: VirtualNode) -> Self {
        let free = ResourceRequest::new(node.capacity.cpu_millis, node.capacity.memory_bytes);
        let free_pods = node.capacity.max_pods;
        Self {
            node,
            free,
            free_pods,
        }
    }

    /// Whether the pod is eligible and the remaining capacity accommodates it
    fn can_take(&self, pod: &Pod) -> bool {
        self.free_pods > 0 && self.free.accommodates(&pod.request) && pod.matches_node(&self.node)
    }

    /// Consume capacity for a bound pod
    fn take(&mut self, pod: &Pod) {
        self.free = self.free.minus(&pod.request);
        self.free_pods -= 1;
    }
}

/// One pod's planned placement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    /// Pod name
    pub pod: String,
    /// Chosen node, or None when no node fits
    pub node: Option<String>,
}

/// Plan placements for a batch of pods over the given free-capacity snapshot.
///
/// The snapshot is consumed pod by pod: capacity taken by earlier pods in the
/// batch is unavailable to later ones. Output order follows the strategy's
/// pod visit order and is deterministic for identical inputs.
pub fn plan(
    strategy: SchedulingStrategy,
    nodes: &mut Vec<NodeFit>,
    pods: &[Pod],
) -> Vec<Placement> {
    match strategy {
        SchedulingStrategy::FirstFit => plan_first_fit(nodes, pods),
        SchedulingStrategy::BinPacking => plan_bin_packing(nodes, pods),
    }
}

/// Baseline policy: pods in submission order, nodes in name order.
fn plan_first_fit(nodes: &mut Vec<NodeFit>, pods: &[Pod]) -> Vec<Placement> {
    nodes.sort_by(|a, b| a.node.name.cmp(&b.node.name));

    pods.iter()
        .map(|pod| {
            let chosen = nodes.iter_mut().find(|fit| fit.can_take(pod));
            Placement {
                pod: pod.name.clone(),
                node: chosen.map(|fit| {
                    fit.take(pod);
                    fit.node.name.clone()
                }),
            }
        })
        .collect()
}

/// Packing policy: largest pods first, tightest node first.
///
/// Pods are visited by descending request magnitude (ties by name). For each
/// pod the eligible nodes are re-ranked by ascending remaining free capacity
/// (ties by name) and the first that still accommodates the request takes it.
/// Consolidating occupancy this way minimizes the node count surviving trim.
fn plan_bin_packing(nodes: &mut Vec<NodeFit>, pods: &[Pod]) -> Vec<Placement> {
    let mut ordered: Vec<&Pod> = pods.iter().collect();
    ordered.sort_by(|a, b| {
        b.request
            .magnitude()
            .cmp(&a.request.magnitude())
            .then_with(|| a.name.cmp(&b.name))
    });

    let mut placements = Vec::with_capacity(ordered.len());
    for pod in ordered {
        nodes.sort_by(|a, b| {
            a.free
                .magnitude()
                .cmp(&b.free.magnitude())
                .then_with(|| a.node.name.cmp(&b.node.name))
        });

        let chosen = nodes.iter_mut().find(|fit| fit.can_take(pod));
        placements.push(Placement {
            pod: pod.name.clone(),
            node: chosen.map(|fit| {
                fit.take(pod);
                fit.node.name.clone()
            }),
        });
    }
    placements
}
