use outbound_resilience_core::events::ResilienceEvent;
use outbound_resilience_core::ErrorKind;
use std::time::{Duration, Instant};

/// How a single attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    Success,
    Transient,
    Terminal,
}

impl AttemptOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            AttemptOutcome::Success => "success",
            AttemptOutcome::Transient => "transient",
            AttemptOutcome::Terminal => "terminal",
        }
    }
}

/// Events emitted by a resilient invoker.
#[derive(Debug, Clone)]
pub enum InvokerEvent {
    /// An attempt finished.
    Attempt {
        instance: String,
        timestamp: Instant,
        operation: String,
        attempt: usize,
        outcome: AttemptOutcome,
        /// Rendered cause of a failed attempt.
        cause: Option<String>,
    },
    /// A retry was scheduled after a transient failure.
    Retry {
        instance: String,
        timestamp: Instant,
        operation: String,
        /// The attempt that is about to run (2 for the first retry).
        next_attempt: usize,
        delay: Duration,
    },
    /// The invocation produced a response.
    Success {
        instance: String,
        timestamp: Instant,
        operation: String,
        attempts: usize,
    },
    /// The invocation ended with a classified error.
    Failure {
        instance: String,
        timestamp: Instant,
        operation: String,
        attempts: usize,
        kind: ErrorKind,
    },
}

impl ResilienceEvent for InvokerEvent {
    fn event_type(&self) -> &'static str {
        match self {
            InvokerEvent::Attempt { .. } => "Attempt",
            InvokerEvent::Retry { .. } => "Retry",
            InvokerEvent::Success { .. } => "Success",
            InvokerEvent::Failure { .. } => "Failure",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            InvokerEvent::Attempt { timestamp, .. }
            | InvokerEvent::Retry { timestamp, .. }
            | InvokerEvent::Success { timestamp, .. }
            | InvokerEvent::Failure { timestamp, .. } => *timestamp,
        }
    }

    fn instance_name(&self) -> &str {
        match self {
            InvokerEvent::Attempt { instance, .. }
            | InvokerEvent::Retry { instance, .. }
            | InvokerEvent::Success { instance, .. }
            | InvokerEvent::Failure { instance, .. } => instance,
        }
    }

    fn subject(&self) -> &str {
        self.operation()
    }
}

impl InvokerEvent {
    /// Identifier of the operation the event belongs to.
    pub fn operation(&self) -> &str {
        match self {
            InvokerEvent::Attempt { operation, .. }
            | InvokerEvent::Retry { operation, .. }
            | InvokerEvent::Success { operation, .. }
            | InvokerEvent::Failure { operation, .. } => operation,
        }
    }
}
