//! Event reporting
//!
//! Collects scheduling events recorded at or after the simulation start,
//! for audit and latency reporting. Collection is strictly observability:
//! a failure is logged as a warning and yields no events, never an abort.

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::replica::{ReplicaAccess, SchedulingEvent};

/// Events at or after `since`, ordered by timestamp; empty on failure.
pub async fn collect_events<R: ReplicaAccess + ?Sized>(
    replica: &R,
    since: DateTime<Utc>,
) -> Vec<SchedulingEvent> {
    match replica.list_events(since).await {
        Ok(events) => events,
        Err(e) => {
            warn!(error = %e, "event collection failed, continuing without events");
            Vec::new()
        }
    }
}
