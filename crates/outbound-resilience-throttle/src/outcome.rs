use std::fmt;
use std::time::Duration;

/// What a throttled action reports back.
///
/// The throttle's state machine decides per variant whether the cooldown
/// window starts, so "already in progress" is a value here rather than an
/// error to be caught.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome<T, E> {
    /// The action ran to completion.
    Completed(T),
    /// The remote system is already performing the action. Counts as
    /// executed: the cooldown starts.
    InProgress,
    /// The remote system is overloaded or rate limiting. The error is
    /// propagated and the cooldown still starts.
    Overloaded(E),
    /// Any other failure. The error is propagated; whether the cooldown
    /// starts depends on the throttle's `hold_on_failure` setting.
    Failed(E),
}

impl<T, E> ActionOutcome<T, E> {
    pub fn is_completed(&self) -> bool {
        matches!(self, ActionOutcome::Completed(_))
    }
}

impl<T, E> From<Result<T, E>> for ActionOutcome<T, E> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => ActionOutcome::Completed(value),
            Err(err) => ActionOutcome::Failed(err),
        }
    }
}

/// Why a throttled action did not run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The key's cooldown has not elapsed yet.
    CooldownActive {
        /// Time left until the action is allowed again.
        remaining: Duration,
    },
    /// Another caller is running the action for this key right now.
    ActionInFlight,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::CooldownActive { .. } => "cooldown_active",
            SkipReason::ActionInFlight => "action_in_flight",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::CooldownActive { remaining } => {
                write!(f, "cooldown period not elapsed ({:?} remaining)", remaining)
            }
            SkipReason::ActionInFlight => write!(f, "action already in flight"),
        }
    }
}

/// Result of asking the throttle to act.
///
/// Skipping is a normal outcome, never an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision<T> {
    /// The action ran and completed.
    Executed(T),
    /// The action ran and the remote reported it already in progress.
    /// Treated as executed.
    InProgress,
    /// The action was not invoked.
    Skipped(SkipReason),
}

impl<T> Decision<T> {
    /// True for both `Executed` and `InProgress`.
    pub fn is_executed(&self) -> bool {
        !self.is_skipped()
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Decision::Skipped(_))
    }

    pub fn skip_reason(&self) -> Option<SkipReason> {
        match self {
            Decision::Skipped(reason) => Some(*reason),
            _ => None,
        }
    }

    /// Label used in events and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Executed(_) => "executed",
            Decision::InProgress => "in_progress",
            Decision::Skipped(_) => "skipped",
        }
    }
}
