//! Simulation engine - the scale-out recommendation pipeline
//!
//! One run executes a strict sequence against a run-scoped replica handle:
//!
//! 1. mirror the real cluster's nodes into the replica (sync)
//! 2. grow every worker pool to its declared max (scale)
//! 3. fan daemon pods out to every node, then admit the pending workload
//!    through the selected strategy (admit)
//! 4. wait until nothing is pending, bounded by a deadline and cancellable
//!    externally (wait)
//! 5. delete nodes carrying no non-daemon workload until fixpoint (trim)
//! 6. reduce the survivors to per-pool deltas (synthesize)
//! 7. collect scheduling events for the report
//!
//! A timed-out admission still produces a partial recommendation annotated
//! with the pods left unschedulable; cancellation aborts the run.

pub mod admit;
pub mod report;
pub mod scale;
pub mod sync;
pub mod synthesize;
pub mod trim;
pub mod wait;

pub use admit::{admit_workloads, apply_daemon_pods, AdmitReport};
pub use report::collect_events;
pub use scale::{scale_pools_to_max, PoolShortfall, ScaleReport};
pub use sync::sync_virtual_nodes;
pub use synthesize::synthesize;
pub use trim::trim_cluster;
pub use wait::{wait_until_admitted, WaitOutcome};

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

use crate::cluster::{NodePodAssignment, Recommendation};
use crate::progress::{ProgressSink, TracingSink};
use crate::replica::{ReplicaAccess, SchedulingEvent};
use crate::scheduler::SchedulingStrategy;
use crate::target::ClusterAccess;

/// Fatal simulation failures. Everything else (partial creation, timeout,
/// infeasible pods, event collection) is carried on the outcome instead.
#[derive(Error, Debug)]
pub enum SimulationError {
    #[error("{stage} stage failed: {source}")]
    Access {
        stage: &'static str,
        #[source]
        source: anyhow::Error,
    },

    #[error("simulation cancelled with {pending} pod(s) still pending")]
    Cancelled { pending: usize },
}

impl SimulationError {
    pub(crate) fn access(stage: &'static str, source: impl Into<anyhow::Error>) -> Self {
        SimulationError::Access {
            stage,
            source: source.into(),
        }
    }
}

/// Tunables for one engine instance
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Admission policy
    pub strategy: SchedulingStrategy,

    /// How long the waiter may poll before giving up
    pub admission_deadline: Duration,

    /// Fixed interval between pending-pod polls
    pub poll_interval: Duration,

    /// Apply the synthesized recommendation to the real cluster
    pub apply_recommendation: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            strategy: SchedulingStrategy::default(),
            admission_deadline: Duration::from_secs(30),
            poll_interval: Duration::from_millis(250),
            apply_recommendation: false,
        }
    }
}

/// Result of one simulation run
#[derive(Debug, Clone)]
pub struct SimulationOutcome {
    /// Identifier of this run
    pub run_id: Uuid,

    /// Per-pool node deltas (zero deltas omitted)
    pub recommendation: Recommendation,

    /// Post-trim node -> pod mapping
    pub assignments: NodePodAssignment,

    /// Pods still pending when the wait ended
    pub unschedulable: Vec<String>,

    /// Pods that cannot fit any node even at pool maxima
    pub infeasible: Vec<String>,

    /// Whether the admission deadline elapsed
    pub timed_out: bool,

    /// Wall time the admission wait consumed
    pub wait_elapsed: Duration,

    /// Scheduling events recorded after simulation start
    pub events: Vec<SchedulingEvent>,

    /// Non-fatal issues encountered along the way
    pub warnings: Vec<String>,
}

/// Runs the simulation pipeline against a real cluster seam and a
/// run-scoped replica handle.
pub struct SimulationEngine<C, R> {
    cluster: C,
    replica: R,
    config: EngineConfig,
    progress: Arc<dyn ProgressSink>,
}

impl<C, R> SimulationEngine<C, R>
where
    C: ClusterAccess,
    R: ReplicaAccess,
{
    /// Create an engine with default configuration
    pub fn new(cluster: C, replica: R) -> Self {
        Self {
            cluster,
            replica,
            config: EngineConfig::default(),
            progress: Arc::new(TracingSink),
        }
    }

    /// Override the configuration
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Route progress lines to a custom sink
    pub fn with_progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.progress = progress;
        self
    }

    /// The replica handle this engine operates on
    pub fn replica(&self) -> &R {
        &self.replica
    }

    /// The real-cluster access this engine reads from
    pub fn cluster(&self) -> &C {
        &self.cluster
    }

    /// Execute one full simulation run.
    pub async fn run(
        &self,
        cancel: &CancellationToken,
    ) -> Result<SimulationOutcome, SimulationError> {
        let run_id = Uuid::new_v4();
        let start = Utc::now();
        let mut warnings = Vec::new();

        self.progress
            .log(&format!("starting simulation run {}", run_id));

        let pools = self
            .cluster
            .get_pool_definitions()
            .await
            .map_err(|e| SimulationError::access("target", e))?;
        let real_nodes = self
            .cluster
            .get_nodes()
            .await
            .map_err(|e| SimulationError::access("target", e))?;

        let mirrored = sync_virtual_nodes(&self.replica, &real_nodes).await?;
        self.progress
            .log(&format!("synchronized {} virtual node(s)", mirrored));

        let scale_report = scale_pools_to_max(&self.replica, &pools).await?;
        self.progress.log(&format!(
            "scaled {} pool(s) to max, created {} virtual node(s)",
            pools.len(),
            scale_report.created
        ));
        for shortfall in &scale_report.shortfalls {
            let line = format!(
                "pool '{}' short: created {} of {} ({})",
                shortfall.pool, shortfall.created, shortfall.requested, shortfall.reason
            );
            warn!("{}", line);
            self.progress.log(&line);
            warnings.push(line);
        }

        let daemons = self
            .cluster
            .get_daemon_pods()
            .await
            .map_err(|e| SimulationError::access("target", e))?;
        let daemon_count = apply_daemon_pods(&self.replica, &daemons).await?;
        self.progress
            .log(&format!("applied {} daemon pod instance(s)", daemon_count));

        let workloads = self
            .cluster
            .get_unscheduled_pods()
            .await
            .map_err(|e| SimulationError::access("target", e))?;
        self.progress.log(&format!(
            "admitting {} workload pod(s) with {} strategy",
            workloads.len(),
            self.config.strategy
        ));
        let admit_report =
            admit_workloads(&self.replica, self.config.strategy, workloads).await?;
        for pod in &admit_report.infeasible {
            let line = format!("pod '{}' cannot fit any node even at pool maxima", pod);
            self.progress.log(&line);
            warnings.push(line);
        }

        let wait_outcome = wait_until_admitted(
            &self.replica,
            self.config.admission_deadline,
            self.config.poll_interval,
            cancel,
        )
        .await?;

        let timed_out = match &wait_outcome {
            WaitOutcome::Admitted { elapsed } => {
                self.progress
                    .log(&format!("all pods admitted after {:?}", elapsed));
                false
            }
            WaitOutcome::TimedOut { elapsed, pending } => {
                let line = format!(
                    "admission deadline elapsed after {:?} with {} pod(s) pending",
                    elapsed,
                    pending.len()
                );
                warn!("{}", line);
                self.progress.log(&line);
                warnings.push(line);
                true
            }
            WaitOutcome::Cancelled { pending, .. } => {
                return Err(SimulationError::Cancelled {
                    pending: pending.len(),
                });
            }
        };
        let unschedulable: Vec<String> = wait_outcome
            .pending()
            .iter()
            .map(|p| p.name.clone())
            .collect();

        let removed = trim_cluster(&self.replica).await?;
        self.progress
            .log(&format!("trimmed {} empty node(s)", removed));

        let assignments = self
            .replica
            .list_assignments()
            .await
            .map_err(|e| SimulationError::access("inspect", e))?;
        let nodes = self
            .replica
            .list_nodes()
            .await
            .map_err(|e| SimulationError::access("inspect", e))?;

        let recommendation = synthesize(&assignments, &nodes, &pools);
        self.progress
            .log(&format!("recommendation: {}", recommendation));

        let events = collect_events(&self.replica, start).await;

        if self.config.apply_recommendation && !recommendation.is_empty() {
            self.cluster
                .apply_scale_up(&recommendation)
                .await
                .map_err(|e| SimulationError::access("apply", e))?;
            self.progress.log("recommendation applied to real cluster");
        }

        info!(
            %run_id,
            recommendation = %recommendation,
            timed_out,
            unschedulable = unschedulable.len(),
            "simulation run complete"
        );

        Ok(SimulationOutcome {
            run_id,
            recommendation,
            assignments,
            unschedulable,
            infeasible: admit_report.infeasible,
            timed_out,
            wait_elapsed: wait_outcome.elapsed(),
            events,
            warnings,
        })
    }
}
