//! Scheduling events recorded by the replica control plane
//!
//! Events are observability output: the engine collects everything recorded
//! at or after simulation start for audit and latency reporting.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Why an event was recorded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventReason {
    /// A pod was bound to a node
    Scheduled,
    /// A pod could not be placed on any node
    FailedScheduling,
    /// A node was removed during trimming
    NodeRemoved,
}

/// A timestamped scheduling-related event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulingEvent {
    /// When the event occurred
    pub timestamp: DateTime<Utc>,

    /// Reason category
    pub reason: EventReason,

    /// Affected pod, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pod: Option<String>,

    /// Affected node, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node: Option<String>,

    /// Human-readable detail
    pub message: String,
}

impl SchedulingEvent {
    /// Record a successful binding
    pub fn scheduled(pod: impl Into<String>, node: impl Into<String>) -> Self {
        let pod = pod.into();
        let node = node.into();
        Self {
            timestamp: Utc::now(),
            reason: EventReason::Scheduled,
            message: format!("pod '{}' bound to node '{}'", pod, node),
            pod: Some(pod),
            node: Some(node),
        }
    }

    /// Record a placement failure
    pub fn failed_scheduling(pod: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            reason: EventReason::FailedScheduling,
            pod: Some(pod.into()),
            node: None,
            message: message.into(),
        }
    }

    /// Record a node removal
    pub fn node_removed(node: impl Into<String>) -> Self {
        let node = node.into();
        Self {
            timestamp: Utc::now(),
            reason: EventReason::NodeRemoved,
            pod: None,
            message: format!("node '{}' removed", node),
            node: Some(node),
        }
    }
}
