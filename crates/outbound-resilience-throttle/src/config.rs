use crate::events::ThrottleEvent;
use crate::outcome::SkipReason;
use outbound_resilience_core::events::{EventListeners, FnListener};
use std::time::Duration;

/// Configuration for a [`CooldownThrottle`](crate::CooldownThrottle).
pub struct CooldownConfig {
    pub(crate) cooldown: Duration,
    pub(crate) hold_on_failure: bool,
    pub(crate) event_listeners: EventListeners<ThrottleEvent>,
    pub(crate) name: String,
}

impl CooldownConfig {
    /// Creates a builder with default settings.
    pub fn builder() -> CooldownConfigBuilder {
        CooldownConfigBuilder::new()
    }

    /// Minimum time between recorded actions for one key.
    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// Whether a plain failure still starts the cooldown window.
    pub fn hold_on_failure(&self) -> bool {
        self.hold_on_failure
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Builder for [`CooldownConfig`].
pub struct CooldownConfigBuilder {
    cooldown: Duration,
    hold_on_failure: bool,
    event_listeners: EventListeners<ThrottleEvent>,
    name: String,
}

impl Default for CooldownConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CooldownConfigBuilder {
    /// Creates a new builder.
    ///
    /// Defaults:
    /// - cooldown: 60s
    /// - hold_on_failure: false (a failed action may be retried right away)
    /// - name: `"<unnamed>"`
    pub fn new() -> Self {
        Self {
            cooldown: Duration::from_secs(60),
            hold_on_failure: false,
            event_listeners: EventListeners::new(),
            name: "<unnamed>".to_string(),
        }
    }

    /// Sets the minimum time between recorded actions per key.
    pub fn cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    /// Starts the cooldown even when the action fails with a plain error.
    ///
    /// Overload signals and "already in progress" always start it; this only
    /// covers [`ActionOutcome::Failed`](crate::ActionOutcome::Failed).
    pub fn hold_on_failure(mut self, hold: bool) -> Self {
        self.hold_on_failure = hold;
        self
    }

    /// Sets the instance name used in events and logs.
    pub fn name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = name.into();
        self
    }

    /// Registers a callback for executed actions.
    ///
    /// # Callback Signature
    /// `Fn(&str, bool)`: the key, and whether the remote reported the action
    /// already in progress.
    pub fn on_executed<F>(mut self, f: F) -> Self
    where
        F: Fn(&str, bool) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let ThrottleEvent::Executed {
                key, in_progress, ..
            } = event
            {
                f(key, *in_progress);
            }
        }));
        self
    }

    /// Registers a callback for skipped actions.
    ///
    /// # Callback Signature
    /// `Fn(&str, SkipReason)`: the key and why the action did not run.
    pub fn on_skipped<F>(mut self, f: F) -> Self
    where
        F: Fn(&str, SkipReason) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let ThrottleEvent::Skipped { key, reason, .. } = event {
                f(key, *reason);
            }
        }));
        self
    }

    /// Registers a callback for failed actions.
    ///
    /// # Callback Signature
    /// `Fn(&str, bool)`: the key, and whether the cooldown was started anyway.
    pub fn on_failed<F>(mut self, f: F) -> Self
    where
        F: Fn(&str, bool) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let ThrottleEvent::Failed {
                key,
                cooldown_started,
                ..
            } = event
            {
                f(key, *cooldown_started);
            }
        }));
        self
    }

    /// Builds the configuration.
    pub fn build_config(self) -> CooldownConfig {
        CooldownConfig {
            cooldown: self.cooldown,
            hold_on_failure: self.hold_on_failure,
            event_listeners: self.event_listeners,
            name: self.name,
        }
    }

    /// Builds a throttle with its own, empty state store.
    pub fn build(self) -> crate::CooldownThrottle {
        crate::CooldownThrottle::new(self.build_config())
    }
}
