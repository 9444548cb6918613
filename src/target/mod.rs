//! Real-cluster access seam
//!
//! The simulator never talks to a live cluster directly; it consumes this
//! trait. Implementations own credentials, transport, and object conversion.
//! `StaticClusterAccess` serves fixtures from a `SimulationInput` and is
//! what the tests (and offline what-if runs) use.

use async_trait::async_trait;
use std::sync::Mutex;

use crate::cluster::{Pod, Recommendation, VirtualNode, WorkerPool};
use crate::config::SimulationInput;

/// Read access to the real cluster plus the scale-up application hook
#[async_trait]
pub trait ClusterAccess: Send + Sync {
    /// Current real nodes (specs, labels, taints)
    async fn get_nodes(&self) -> anyhow::Result<Vec<VirtualNode>>;

    /// Daemon pod templates that run once per eligible node
    async fn get_daemon_pods(&self) -> anyhow::Result<Vec<Pod>>;

    /// Workload pods currently unschedulable in the real cluster
    async fn get_unscheduled_pods(&self) -> anyhow::Result<Vec<Pod>>;

    /// Worker pool definitions including current real replica counts
    async fn get_pool_definitions(&self) -> anyhow::Result<Vec<WorkerPool>>;

    /// Apply a recommendation against the real cluster
    async fn apply_scale_up(&self, recommendation: &Recommendation) -> anyhow::Result<()>;
}

/// Fixture-backed cluster access
#[derive(Default)]
pub struct StaticClusterAccess {
    input: SimulationInput,
    applied: Mutex<Vec<Recommendation>>,
}

impl StaticClusterAccess {
    /// Serve the given input as the real cluster's state
    pub fn new(input: SimulationInput) -> Self {
        Self {
            input,
            applied: Mutex::new(Vec::new()),
        }
    }

    /// Recommendations applied so far, in order
    pub fn applied(&self) -> Vec<Recommendation> {
        self.applied.lock().expect("applied lock poisoned").clone()
    }
}

#[async_trait]
impl ClusterAccess for StaticClusterAccess {
    async fn get_nodes(&self) -> anyhow::Result<Vec<VirtualNode>> {
        Ok(self.input.nodes.clone())
    }

    async fn get_daemon_pods(&self) -> anyhow::Result<Vec<Pod>> {
        Ok(self.input.daemon_pods.clone())
    }

    async fn get_unscheduled_pods(&self) -> anyhow::Result<Vec<Pod>> {
        Ok(self.input.workload_pods.clone())
    }

    async fn get_pool_definitions(&self) -> anyhow::Result<Vec<WorkerPool>> {
        Ok(self.input.pools.clone())
    }

    async fn apply_scale_up(&self, recommendation: &Recommendation) -> anyhow::Result<()> {
        self.applied
            .lock()
            .expect("applied lock poisoned")
            .push(recommendation.clone());
        Ok(())
    }
}
