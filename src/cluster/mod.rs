//! Domain model for scale-out simulation.
//!
//! The simulator mirrors a real cluster into an ephemeral replica, scales
//! worker pools to their ceilings, admits pending workloads, trims the node
//! set back to the minimum that still satisfies admission, and reduces the
//! survivors to a per-pool scale recommendation.
//!
//! Core resources:
//!
//! - **WorkerPool**: a named group of nodes sharing a machine type and
//!   min/max size bounds
//! - **VirtualNode**: an ephemeral node mirroring or extending real capacity
//! - **Pod**: a workload or per-node daemon with a resource request
//! - **Recommendation**: the per-pool node delta derived from the minimal
//!   feasible simulated state

pub mod assignment;
pub mod node;
pub mod pod;
pub mod pool;
pub mod recommendation;

pub use assignment::NodePodAssignment;
pub use node::{NodeCapacity, Taint, TaintEffect, VirtualNode};
pub use pod::{Pod, PodClass, PodPhase, ResourceRequest, Toleration};
pub use pool::{PoolError, WorkerPool};
pub use recommendation::Recommendation;

/// Label carrying the owning worker pool name on every virtual node
pub const POOL_LABEL: &str = "scalesim.io/worker-pool";

/// Default per-node pod capacity when a node spec does not declare one
pub const DEFAULT_MAX_PODS: u32 = 110;
