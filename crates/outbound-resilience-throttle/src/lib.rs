//! Cooldown-gated execution of disruptive side effects.
//!
//! A [`CooldownThrottle`] lets an action run for a resource key only if at
//! least the cooldown has passed since the last recorded action for that key.
//! It exists for remote operations that must not fire too often, such as a
//! queue purge the queue service allows once per minute.
//!
//! Per key:
//! - **Idle** (no record, or the cooldown elapsed): the action runs
//! - **ActionInFlight**: concurrent callers are skipped
//! - **CooldownActive**: callers are skipped until the cooldown elapses
//!
//! How the action's [`ActionOutcome`] moves the record:
//!
//! | Outcome | Caller sees | Cooldown starts |
//! |---|---|---|
//! | `Completed(v)` | `Ok(Decision::Executed(v))` | yes |
//! | `InProgress` | `Ok(Decision::InProgress)` | yes |
//! | `Overloaded(e)` | `Err(e)` | yes |
//! | `Failed(e)` | `Err(e)` | only with `hold_on_failure(true)` |
//!
//! State is owned by the throttle instance; clones share it.
//!
//! # Example
//!
//! ```rust
//! use outbound_resilience_throttle::{ActionOutcome, CooldownThrottle, Decision};
//! use std::time::Duration;
//!
//! # async fn example() {
//! let throttle = CooldownThrottle::builder()
//!     .name("queue-purge")
//!     .cooldown(Duration::from_secs(60))
//!     .build();
//!
//! let first = throttle
//!     .try_act("apm_test", || async { ActionOutcome::<_, std::io::Error>::Completed(()) })
//!     .await;
//! assert!(matches!(first, Ok(Decision::Executed(()))));
//!
//! let second = throttle
//!     .try_act("apm_test", || async { ActionOutcome::<_, std::io::Error>::Completed(()) })
//!     .await;
//! assert!(matches!(second, Ok(Decision::Skipped(_))));
//! # }
//! ```

mod config;
mod events;
mod outcome;
mod queue;
mod store;

pub use config::{CooldownConfig, CooldownConfigBuilder};
pub use events::ThrottleEvent;
pub use outcome::{ActionOutcome, Decision, SkipReason};
pub use queue::{PurgeStatus, PurgingPublisher, QueueError, RemoteQueue};
pub use store::{ThrottleState, ThrottleStore};

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

#[cfg(feature = "metrics")]
use metrics::{counter, describe_counter};

#[cfg(feature = "tracing")]
use tracing::{debug, info, warn};

/// Per-key cooldown gate. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct CooldownThrottle {
    config: Arc<CooldownConfig>,
    store: Arc<ThrottleStore>,
}

impl CooldownThrottle {
    /// Creates a throttle with a fresh state store.
    pub fn new(config: CooldownConfig) -> Self {
        Self::with_store(config, Arc::new(ThrottleStore::new()))
    }

    /// Creates a throttle over an existing store.
    pub fn with_store(config: CooldownConfig, store: Arc<ThrottleStore>) -> Self {
        #[cfg(feature = "metrics")]
        describe_counter!(
            "throttle_decisions_total",
            "Throttle decisions by outcome (executed, in_progress, skipped, failed)"
        );

        Self {
            config: Arc::new(config),
            store,
        }
    }

    pub fn builder() -> CooldownConfigBuilder {
        CooldownConfigBuilder::new()
    }

    pub fn cooldown(&self) -> Duration {
        self.config.cooldown
    }

    pub fn config(&self) -> &CooldownConfig {
        &self.config
    }

    /// The state store backing this throttle.
    pub fn store(&self) -> &Arc<ThrottleStore> {
        &self.store
    }

    /// When the last action for `key` was recorded.
    pub fn last_action(&self, key: &str) -> Option<Instant> {
        self.store.last_action(key)
    }

    /// Current state of `key`.
    pub fn state(&self, key: &str) -> ThrottleState {
        self.store.state(key, Instant::now(), self.config.cooldown)
    }

    /// Runs `action` for `key` if the cooldown allows it.
    ///
    /// The check and the claim are atomic per key: of several concurrent
    /// callers on an idle key exactly one runs the action; the others are
    /// skipped with [`SkipReason::ActionInFlight`]. The record is stamped with
    /// the time the action was permitted.
    ///
    /// Dropping the returned future while the action runs clears the claim
    /// without recording anything.
    pub async fn try_act<F, Fut, T, E>(&self, key: &str, action: F) -> Result<Decision<T>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ActionOutcome<T, E>>,
        E: fmt::Display,
    {
        let cooldown = self.config.cooldown;
        let permitted_at = Instant::now();

        let permit = match self.store.begin(key, permitted_at, cooldown) {
            Ok(permit) => permit,
            Err(reason) => {
                let decision = Decision::Skipped(reason);
                self.report_skipped(key, reason, &decision);
                return Ok(decision);
            }
        };

        match action().await {
            ActionOutcome::Completed(value) => {
                permit.record(permitted_at);
                let decision = Decision::Executed(value);
                self.report_executed(key, &decision);
                Ok(decision)
            }
            ActionOutcome::InProgress => {
                permit.record(permitted_at);
                let decision = Decision::InProgress;
                self.report_executed(key, &decision);
                Ok(decision)
            }
            ActionOutcome::Overloaded(err) => {
                permit.record(permitted_at);
                self.report_failed(key, true, true, &err);
                Err(err)
            }
            ActionOutcome::Failed(err) => {
                let hold = self.config.hold_on_failure;
                if hold {
                    permit.record(permitted_at);
                } else {
                    permit.release();
                }
                self.report_failed(key, false, hold, &err);
                Err(err)
            }
        }
    }

    fn report_executed<T>(&self, key: &str, decision: &Decision<T>) {
        let in_progress = matches!(decision, Decision::InProgress);

        #[cfg(feature = "metrics")]
        counter!(
            "throttle_decisions_total",
            "throttle" => self.config.name.clone(),
            "decision" => decision.as_str()
        )
        .increment(1);

        #[cfg(feature = "tracing")]
        info!(
            throttle = %self.config.name,
            key,
            in_progress,
            "Throttled action executed"
        );

        self.config.event_listeners.emit_with(|| ThrottleEvent::Executed {
            instance: self.config.name.clone(),
            timestamp: std::time::Instant::now(),
            key: key.to_string(),
            in_progress,
        });
    }

    #[cfg_attr(not(feature = "metrics"), allow(unused_variables))]
    fn report_skipped<T>(&self, key: &str, reason: SkipReason, decision: &Decision<T>) {
        #[cfg(feature = "metrics")]
        counter!(
            "throttle_decisions_total",
            "throttle" => self.config.name.clone(),
            "decision" => decision.as_str(),
            "reason" => reason.as_str()
        )
        .increment(1);

        #[cfg(feature = "tracing")]
        debug!(
            throttle = %self.config.name,
            key,
            reason = %reason,
            "Skipping throttled action"
        );

        self.config.event_listeners.emit_with(|| ThrottleEvent::Skipped {
            instance: self.config.name.clone(),
            timestamp: std::time::Instant::now(),
            key: key.to_string(),
            reason,
        });
    }

    fn report_failed<E: fmt::Display>(
        &self,
        key: &str,
        overloaded: bool,
        cooldown_started: bool,
        err: &E,
    ) {
        #[cfg(feature = "metrics")]
        counter!(
            "throttle_decisions_total",
            "throttle" => self.config.name.clone(),
            "decision" => "failed"
        )
        .increment(1);

        #[cfg(feature = "tracing")]
        warn!(
            throttle = %self.config.name,
            key,
            overloaded,
            cooldown_started,
            error = %err,
            "Throttled action failed"
        );

        self.config.event_listeners.emit_with(|| ThrottleEvent::Failed {
            instance: self.config.name.clone(),
            timestamp: std::time::Instant::now(),
            key: key.to_string(),
            overloaded,
            cooldown_started,
            error: err.to_string(),
        });
    }
}

impl fmt::Debug for CooldownThrottle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CooldownThrottle")
            .field("name", &self.config.name)
            .field("cooldown", &self.config.cooldown)
            .field("hold_on_failure", &self.config.hold_on_failure)
            .field("keys", &self.store.len())
            .finish()
    }
}
