//! Admission waiting
//!
//! Polls the replica's pending-pod count at a fixed interval until it
//! reaches zero, the deadline elapses, or the run is cancelled - whichever
//! comes first. Read-only: the waiter never mutates replica state.

use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::SimulationError;
use crate::cluster::Pod;
use crate::replica::ReplicaAccess;

const STAGE: &str = "wait";

/// How an admission wait ended
#[derive(Debug, Clone)]
pub enum WaitOutcome {
    /// Every pod found a node
    Admitted {
        /// Wall time spent waiting
        elapsed: Duration,
    },
    /// The deadline elapsed with pods still pending
    TimedOut {
        /// Wall time spent waiting
        elapsed: Duration,
        /// Pods still without a node
        pending: Vec<Pod>,
    },
    /// The run was cancelled externally
    Cancelled {
        /// Wall time spent waiting
        elapsed: Duration,
        /// Pods still without a node at cancellation
        pending: Vec<Pod>,
    },
}

impl WaitOutcome {
    /// Wall time the wait consumed
    pub fn elapsed(&self) -> Duration {
        match self {
            WaitOutcome::Admitted { elapsed }
            | WaitOutcome::TimedOut { elapsed, .. }
            | WaitOutcome::Cancelled { elapsed, .. } => *elapsed,
        }
    }

    /// Pods still pending when the wait ended
    pub fn pending(&self) -> &[Pod] {
        match self {
            WaitOutcome::Admitted { .. } => &[],
            WaitOutcome::TimedOut { pending, .. } | WaitOutcome::Cancelled { pending, .. } => {
                pending
            }
        }
    }
}

/// Wait until no pod remains pending, the deadline passes, or `cancel` fires.
///
/// A zero deadline returns immediately with the current pending set.
pub async fn wait_until_admitted<R: ReplicaAccess + ?Sized>(
    replica: &R,
    deadline: Duration,
    poll_interval: Duration,
    cancel: &CancellationToken,
) -> Result<WaitOutcome, SimulationError> {
    let start = Instant::now();

    loop {
        let pending = replica
            .pending_pods()
            .await
            .map_err(|e| SimulationError::access(STAGE, e))?;

        if pending.is_empty() {
            let elapsed = start.elapsed();
            debug!(?elapsed, "all pods admitted");
            return Ok(WaitOutcome::Admitted { elapsed });
        }

        let elapsed = start.elapsed();
        if elapsed >= deadline {
            debug!(?elapsed, pending = pending.len(), "admission deadline elapsed");
            return Ok(WaitOutcome::TimedOut { elapsed, pending });
        }

        let nap = poll_interval.min(deadline - elapsed);
        tokio::select! {
            _ = cancel.cancelled() => {
                return Ok(WaitOutcome::Cancelled {
                    elapsed: start.elapsed(),
                    pending,
                });
            }
            _ = tokio::time::sleep(nap) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::{NodeCapacity, ResourceRequest, VirtualNode};
    use crate::replica::InMemoryReplica;
    use crate::scheduler::SchedulingStrategy;

    const POLL: Duration = Duration::from_millis(10);

    async fn replica_with_pending_pod() -> InMemoryReplica {
        let replica = InMemoryReplica::new();
        replica
            .create_nodes(&[VirtualNode::new(
                "n1",
                "p1",
                NodeCapacity::new(1000, 1 << 30),
            )])
            .await
            .unwrap();
        replica
            .schedule(
                SchedulingStrategy::FirstFit,
                vec![Pod::workload("giant", ResourceRequest::new(9000, 64 << 30))],
            )
            .await
            .unwrap();
        replica
    }

    #[tokio::test]
    async fn test_admitted_immediately_when_nothing_pending() {
        let replica = InMemoryReplica::new();
        let cancel = CancellationToken::new();

        let outcome = wait_until_admitted(&replica, Duration::from_secs(5), POLL, &cancel)
            .await
            .unwrap();
        assert!(matches!(outcome, WaitOutcome::Admitted { .. }));
        assert!(outcome.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_zero_deadline_returns_immediately_with_pending() {
        let replica = replica_with_pending_pod().await;
        let cancel = CancellationToken::new();

        let outcome = wait_until_admitted(&replica, Duration::ZERO, POLL, &cancel)
            .await
            .unwrap();
        match outcome {
            WaitOutcome::TimedOut { pending, .. } => {
                assert_eq!(pending.len(), 1);
                assert_eq!(pending[0].name, "giant");
            }
            other => panic!("expected TimedOut, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_deadline_bounds_the_wait() {
        let replica = replica_with_pending_pod().await;
        let cancel = CancellationToken::new();

        let outcome = wait_until_admitted(&replica, Duration::from_millis(60), POLL, &cancel)
            .await
            .unwrap();
        assert!(matches!(outcome, WaitOutcome::TimedOut { .. }));
        assert!(outcome.elapsed() >= Duration::from_millis(60));
    }

    #[tokio::test]
    async fn test_cancellation_is_distinct_from_timeout() {
        let replica = replica_with_pending_pod().await;
        let cancel = CancellationToken::new();
        cancel.cancel();

        let outcome = wait_until_admitted(&replica, Duration::from_secs(30), POLL, &cancel)
            .await
            .unwrap();
        match outcome {
            WaitOutcome::Cancelled { pending, .. } => assert_eq!(pending.len(), 1),
            other => panic!("expected Cancelled, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_wait_never_mutates_state() {
        let replica = replica_with_pending_pod().await;
        let cancel = CancellationToken::new();
        let before = replica.list_pods().await.unwrap();

        wait_until_admitted(&replica, Duration::from_millis(30), POLL, &cancel)
            .await
            .unwrap();

        assert_eq!(replica.list_pods().await.unwrap(), before);
    }
}
