//! Publishing to a remote queue with a cooldown-gated purge.
//!
//! Queue services that support purging typically allow it once per minute per
//! queue and reject extra requests. [`PurgingPublisher`] enqueues a message,
//! then purges the queue only if the throttle allows it. Purge problems never
//! fail the publish.

use crate::outcome::{ActionOutcome, Decision, SkipReason};
use crate::CooldownThrottle;
use futures::future::BoxFuture;
use outbound_resilience_core::BoxError;
use thiserror::Error;

#[cfg(feature = "tracing")]
use tracing::{debug, warn};

/// Errors reported by a [`RemoteQueue`].
#[derive(Debug, Error)]
pub enum QueueError {
    /// A purge of this queue is already running on the remote side.
    #[error("purge already in progress")]
    PurgeInProgress,
    /// The queue service rejected the request because of rate limits.
    #[error("queue request throttled: {0}")]
    Throttled(String),
    #[error(transparent)]
    Other(BoxError),
}

impl QueueError {
    pub fn other<E>(err: E) -> Self
    where
        E: Into<BoxError>,
    {
        QueueError::Other(err.into())
    }
}

impl ActionOutcome<(), QueueError> {
    /// Maps a purge result onto the throttle's outcome model.
    ///
    /// `PurgeInProgress` counts as done, `Throttled` is an overload signal,
    /// anything else is a plain failure.
    pub fn from_purge(result: Result<(), QueueError>) -> Self {
        match result {
            Ok(()) => ActionOutcome::Completed(()),
            Err(QueueError::PurgeInProgress) => ActionOutcome::InProgress,
            Err(err @ QueueError::Throttled(_)) => ActionOutcome::Overloaded(err),
            Err(err) => ActionOutcome::Failed(err),
        }
    }
}

/// A remote message queue addressed by name or URL.
pub trait RemoteQueue: Send + Sync {
    type Payload: Send;

    /// Appends one message to `queue`.
    fn enqueue<'a>(
        &'a self,
        queue: &'a str,
        payload: Self::Payload,
    ) -> BoxFuture<'a, Result<(), QueueError>>;

    /// Deletes all messages in `queue`.
    fn purge<'a>(&'a self, queue: &'a str) -> BoxFuture<'a, Result<(), QueueError>>;
}

/// What happened to the purge after a successful publish.
#[derive(Debug)]
pub enum PurgeStatus {
    Purged,
    /// The queue reported a purge already running.
    AlreadyPurging,
    Skipped(SkipReason),
    /// The purge failed. The error was logged and not propagated.
    Failed(QueueError),
}

impl PurgeStatus {
    pub fn is_purged(&self) -> bool {
        matches!(self, PurgeStatus::Purged | PurgeStatus::AlreadyPurging)
    }
}

/// Enqueues messages and purges each queue at most once per cooldown.
pub struct PurgingPublisher<Q> {
    queue: Q,
    throttle: CooldownThrottle,
}

impl<Q: RemoteQueue> PurgingPublisher<Q> {
    pub fn new(queue: Q, throttle: CooldownThrottle) -> Self {
        Self { queue, throttle }
    }

    pub fn queue(&self) -> &Q {
        &self.queue
    }

    pub fn throttle(&self) -> &CooldownThrottle {
        &self.throttle
    }

    /// Enqueues `payload` on `queue`, then purges `queue` if its cooldown
    /// allows.
    ///
    /// Only an enqueue failure is returned as an error.
    pub async fn publish(
        &self,
        queue: &str,
        payload: Q::Payload,
    ) -> Result<PurgeStatus, QueueError> {
        self.queue.enqueue(queue, payload).await?;

        let decision = self
            .throttle
            .try_act(queue, || async {
                ActionOutcome::from_purge(self.queue.purge(queue).await)
            })
            .await;

        let status = match decision {
            Ok(Decision::Executed(())) => PurgeStatus::Purged,
            Ok(Decision::InProgress) => PurgeStatus::AlreadyPurging,
            Ok(Decision::Skipped(reason)) => {
                #[cfg(feature = "tracing")]
                debug!(queue, reason = %reason, "Skipping queue purge");
                PurgeStatus::Skipped(reason)
            }
            Err(err) => {
                #[cfg(feature = "tracing")]
                warn!(queue, error = %err, "Failed to purge queue, message was still published");
                PurgeStatus::Failed(err)
            }
        };
        Ok(status)
    }
}
