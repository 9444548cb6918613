//! Simulation input loading
//!
//! A simulation input file describes the real-cluster side of a run: worker
//! pool definitions, current real nodes, daemon pod templates, and the
//! pending workload pods. Files are YAML or JSON, selected by extension.
//! This module is the I/O boundary - it reads the file and delegates to pure
//! parsing and validation.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cluster::{Pod, PoolError, VirtualNode, WorkerPool};

/// Errors for input file loading
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse input: {0}")]
    ParseError(String),

    #[error("Unsupported input format '{0}' (expected .yaml, .yml, or .json)")]
    UnsupportedFormat(String),

    #[error("Invalid worker pool: {0}")]
    InvalidPool(#[from] PoolError),

    #[error("Node '{0}' references unknown pool '{1}'")]
    UnknownPool(String, String),
}

/// Everything a simulation run consumes from the real cluster
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimulationInput {
    /// Worker pool definitions with their current real replica counts
    #[serde(default)]
    pub pools: Vec<WorkerPool>,

    /// Current real nodes to mirror into the replica
    #[serde(default)]
    pub nodes: Vec<VirtualNode>,

    /// Daemon pod templates applied once per eligible node
    #[serde(rename = "daemonPods")]
    #[serde(default)]
    pub daemon_pods: Vec<Pod>,

    /// Pending workload pods awaiting admission
    #[serde(rename = "workloadPods")]
    #[serde(default)]
    pub workload_pods: Vec<Pod>,
}

impl SimulationInput {
    /// Parse from a string in the named format ("yaml" or "json")
    pub fn from_str(content: &str, format: &str) -> Result<Self, ConfigError> {
        let input: SimulationInput = match format {
            "yaml" | "yml" => {
                serde_yaml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?
            }
            "json" => {
                serde_json::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?
            }
            other => return Err(ConfigError::UnsupportedFormat(other.to_string())),
        };
        input.validate()?;
        Ok(input)
    }

    /// Check pool bounds and node -> pool references
    pub fn validate(&self) -> Result<(), ConfigError> {
        for pool in &self.pools {
            pool.validate()?;
        }
        for node in &self.nodes {
            if !self.pools.iter().any(|p| p.name == node.pool) {
                return Err(ConfigError::UnknownPool(
                    node.name.clone(),
                    node.pool.clone(),
                ));
            }
        }
        Ok(())
    }
}

/// Load and parse a simulation input file from disk.
pub fn load_simulation_input(path: &Path) -> Result<SimulationInput, ConfigError> {
    let format = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    let content = std::fs::read_to_string(path)?;
    SimulationInput::from_str(&content, &format)
}
