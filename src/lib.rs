//! # scalesim
//!
//! A what-if simulator for cluster scale-out. Given the real cluster's
//! worker pools, nodes, daemon pod templates, and pending workload, a run
//! answers: how many nodes must each pool add so everything schedules?
//!
//! The simulator mirrors the cluster into an in-memory replica, grows every
//! pool to its maximum, admits the workload with a pluggable strategy,
//! trims nodes no workload landed on, and reduces the survivors to per-pool
//! deltas. It never mutates the real cluster unless explicitly asked to
//! apply the recommendation.
//!
//! ## Modules
//!
//! - [`cluster`] - nodes, pods, pools, assignments, recommendations
//! - [`replica`] - the in-memory virtual cluster and its access trait
//! - [`scheduler`] - first-fit and bin-packing placement strategies
//! - [`engine`] - the simulation pipeline and its stages
//! - [`target`] - the real-cluster access seam
//! - [`config`] - simulation input files (YAML/JSON)
//! - [`progress`] - ordered status lines for external observers
//!
//! ## Example
//!
//! ```no_run
//! use scalesim::config::load_simulation_input;
//! use scalesim::engine::SimulationEngine;
//! use scalesim::replica::InMemoryReplica;
//! use scalesim::target::StaticClusterAccess;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let input = load_simulation_input("cluster.yaml".as_ref())?;
//! let engine = SimulationEngine::new(StaticClusterAccess::new(input), InMemoryReplica::new());
//! let outcome = engine.run(&CancellationToken::new()).await?;
//! println!("{}", outcome.recommendation);
//! # Ok(())
//! # }
//! ```

pub mod cluster;
pub mod config;
pub mod engine;
pub mod progress;
pub mod replica;
pub mod scheduler;
pub mod target;

pub use cluster::{NodePodAssignment, Pod, Recommendation, VirtualNode, WorkerPool};
pub use engine::{EngineConfig, SimulationEngine, SimulationError, SimulationOutcome};
pub use replica::{InMemoryReplica, ReplicaAccess};
pub use scheduler::SchedulingStrategy;
pub use target::ClusterAccess;
