use crate::outcome::SkipReason;
use outbound_resilience_core::events::ResilienceEvent;
use std::time::Instant;

/// Events emitted by a cooldown throttle, one per decision.
#[derive(Debug, Clone)]
pub enum ThrottleEvent {
    /// The action ran. `in_progress` is true when the remote reported it
    /// was already doing the work.
    Executed {
        instance: String,
        timestamp: Instant,
        key: String,
        in_progress: bool,
    },
    /// The action was not invoked.
    Skipped {
        instance: String,
        timestamp: Instant,
        key: String,
        reason: SkipReason,
    },
    /// The action ran and failed; the error went back to the caller.
    Failed {
        instance: String,
        timestamp: Instant,
        key: String,
        /// The remote signalled overload rather than a plain failure.
        overloaded: bool,
        /// Whether the cooldown window was started anyway.
        cooldown_started: bool,
        error: String,
    },
}

impl ResilienceEvent for ThrottleEvent {
    fn event_type(&self) -> &'static str {
        match self {
            ThrottleEvent::Executed { .. } => "Executed",
            ThrottleEvent::Skipped { .. } => "Skipped",
            ThrottleEvent::Failed { .. } => "Failed",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            ThrottleEvent::Executed { timestamp, .. }
            | ThrottleEvent::Skipped { timestamp, .. }
            | ThrottleEvent::Failed { timestamp, .. } => *timestamp,
        }
    }

    fn instance_name(&self) -> &str {
        match self {
            ThrottleEvent::Executed { instance, .. }
            | ThrottleEvent::Skipped { instance, .. }
            | ThrottleEvent::Failed { instance, .. } => instance,
        }
    }

    fn subject(&self) -> &str {
        self.key()
    }
}

impl ThrottleEvent {
    /// The resource key the decision was about.
    pub fn key(&self) -> &str {
        match self {
            ThrottleEvent::Executed { key, .. }
            | ThrottleEvent::Skipped { key, .. }
            | ThrottleEvent::Failed { key, .. } => key,
        }
    }
}
