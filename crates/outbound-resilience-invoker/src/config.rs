use crate::backoff::{clamp_multiplier, ExponentialBackoff, FullJitter, IntervalFunction};
use crate::classifier::{Classification, DefaultClassifier, FailureClassifier, FnClassifier};
use crate::events::{AttemptOutcome, InvokerEvent};
use outbound_resilience_core::events::{EventListeners, FnListener};
use outbound_resilience_core::{DownstreamError, ErrorKind};
use std::sync::Arc;
use std::time::Duration;

/// Immutable timing and retry limits for an invoker.
///
/// Values are clamped on construction: `max_attempts` is at least 1 and
/// `backoff_multiplier` at least 1.0.
#[derive(Debug, Clone, PartialEq)]
pub struct CallPolicy {
    timeout: Duration,
    max_attempts: usize,
    base_backoff: Duration,
    backoff_multiplier: f64,
    max_backoff: Option<Duration>,
    jitter: bool,
    retry_non_idempotent: bool,
}

impl CallPolicy {
    pub fn new(
        timeout: Duration,
        max_attempts: usize,
        base_backoff: Duration,
        backoff_multiplier: f64,
    ) -> Self {
        Self {
            timeout,
            max_attempts: max_attempts.max(1),
            base_backoff,
            backoff_multiplier: clamp_multiplier(backoff_multiplier),
            max_backoff: None,
            jitter: false,
            retry_non_idempotent: true,
        }
    }

    /// Per-attempt timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Attempts per invocation, initial attempt included.
    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    pub fn base_backoff(&self) -> Duration {
        self.base_backoff
    }

    pub fn backoff_multiplier(&self) -> f64 {
        self.backoff_multiplier
    }

    pub fn max_backoff(&self) -> Option<Duration> {
        self.max_backoff
    }

    pub fn jitter(&self) -> bool {
        self.jitter
    }

    pub fn retry_non_idempotent(&self) -> bool {
        self.retry_non_idempotent
    }

    /// Nominal wait before `attempt` (2-based; attempt 1 never waits),
    /// without jitter: `base_backoff * backoff_multiplier^(attempt - 2)`.
    ///
    /// This is the policy's own exponential schedule. An invoker built with
    /// [`InvokerConfigBuilder::backoff`] waits according to that function
    /// instead; use [`InvokerConfig::delay_before`] for the effective wait.
    pub fn delay_before(&self, attempt: usize) -> Duration {
        if attempt < 2 {
            return Duration::ZERO;
        }
        self.exponential().next_interval(attempt - 2)
    }

    fn exponential(&self) -> ExponentialBackoff {
        let backoff = ExponentialBackoff::new(self.base_backoff).multiplier(self.backoff_multiplier);
        match self.max_backoff {
            Some(max) => backoff.max_interval(max),
            None => backoff,
        }
    }

    pub(crate) fn interval_fn(&self) -> Arc<dyn IntervalFunction> {
        if self.jitter {
            Arc::new(FullJitter::new(self.exponential()))
        } else {
            Arc::new(self.exponential())
        }
    }
}

impl Default for CallPolicy {
    /// 10s per attempt, 4 attempts (one call plus three retries), 500ms base
    /// backoff doubling each retry.
    fn default() -> Self {
        Self::new(Duration::from_secs(10), 4, Duration::from_millis(500), 2.0)
    }
}

/// Everything an invoker needs: policy, backoff, classifier and listeners.
pub struct InvokerConfig {
    pub(crate) policy: CallPolicy,
    pub(crate) interval_fn: Arc<dyn IntervalFunction>,
    pub(crate) classifier: Arc<dyn FailureClassifier>,
    pub(crate) event_listeners: EventListeners<InvokerEvent>,
    pub(crate) name: String,
}

impl InvokerConfig {
    /// Creates a builder with default settings.
    pub fn builder() -> InvokerConfigBuilder {
        InvokerConfigBuilder::new()
    }

    pub fn policy(&self) -> &CallPolicy {
        &self.policy
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Wait before `attempt` (2-based) as the invoker will actually apply
    /// it: the custom interval function when one was set, otherwise the
    /// policy schedule. Jittered schedules return a fresh sample each call.
    pub fn delay_before(&self, attempt: usize) -> Duration {
        if attempt < 2 {
            return Duration::ZERO;
        }
        self.next_backoff(attempt - 2)
    }

    /// Wait before the given retry (0-indexed), jitter included if enabled.
    pub(crate) fn next_backoff(&self, retry: usize) -> Duration {
        self.interval_fn.next_interval(retry)
    }

    pub(crate) fn classify(&self, error: &DownstreamError) -> Classification {
        self.classifier.classify(error)
    }
}

/// Builder for [`InvokerConfig`].
pub struct InvokerConfigBuilder {
    policy: CallPolicy,
    interval_fn: Option<Arc<dyn IntervalFunction>>,
    classifier: Arc<dyn FailureClassifier>,
    event_listeners: EventListeners<InvokerEvent>,
    name: String,
}

impl Default for InvokerConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl InvokerConfigBuilder {
    /// Creates a new builder.
    ///
    /// Defaults:
    /// - timeout: 10s per attempt
    /// - max_attempts: 4
    /// - backoff: exponential, 500ms base, multiplier 2.0, no cap, no jitter
    /// - retry_non_idempotent: true
    /// - classifier: [`DefaultClassifier`]
    /// - name: `"<unnamed>"`
    pub fn new() -> Self {
        Self {
            policy: CallPolicy::default(),
            interval_fn: None,
            classifier: Arc::new(DefaultClassifier),
            event_listeners: EventListeners::new(),
            name: "<unnamed>".to_string(),
        }
    }

    /// Replaces every timing and retry setting at once.
    pub fn policy(mut self, policy: CallPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Sets the per-attempt timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.policy.timeout = timeout;
        self
    }

    /// Sets the total number of attempts, including the first one.
    ///
    /// `max_attempts(3)` means one call and up to two retries. Zero is
    /// treated as one.
    pub fn max_attempts(mut self, max_attempts: usize) -> Self {
        self.policy.max_attempts = max_attempts.max(1);
        self
    }

    /// Sets the wait before the first retry.
    pub fn base_backoff(mut self, base_backoff: Duration) -> Self {
        self.policy.base_backoff = base_backoff;
        self
    }

    /// Sets the growth factor between consecutive retries. Clamped to >= 1.0.
    pub fn backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.policy.backoff_multiplier = clamp_multiplier(multiplier);
        self
    }

    /// Caps every backoff wait.
    pub fn max_backoff(mut self, max_backoff: Duration) -> Self {
        self.policy.max_backoff = Some(max_backoff);
        self
    }

    /// Enables full jitter: each wait is drawn uniformly from `[0, nominal]`.
    pub fn jitter(mut self, enabled: bool) -> Self {
        self.policy.jitter = enabled;
        self
    }

    /// Whether operations that are not retry safe (POST/PATCH without an
    /// idempotency key) may be retried. When false they get one attempt.
    pub fn retry_non_idempotent(mut self, allowed: bool) -> Self {
        self.policy.retry_non_idempotent = allowed;
        self
    }

    /// Replaces the exponential schedule with a custom interval function.
    ///
    /// The policy's base backoff and multiplier are ignored when one is set.
    pub fn backoff<I>(mut self, interval_fn: I) -> Self
    where
        I: IntervalFunction + 'static,
    {
        self.interval_fn = Some(Arc::new(interval_fn));
        self
    }

    /// Replaces the failure classifier.
    pub fn classifier<C>(mut self, classifier: C) -> Self
    where
        C: FailureClassifier + 'static,
    {
        self.classifier = Arc::new(classifier);
        self
    }

    /// Classifies failures with a closure.
    pub fn classify_with<F>(self, f: F) -> Self
    where
        F: Fn(&DownstreamError) -> Classification + Send + Sync + 'static,
    {
        self.classifier(FnClassifier::new(f))
    }

    /// Sets the instance name used in events, logs and metric labels.
    pub fn name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = name.into();
        self
    }

    /// Registers a callback for every finished attempt.
    ///
    /// # Callback Signature
    /// `Fn(&str, usize, AttemptOutcome, Option<&str>)`: operation identifier,
    /// attempt number (1-based), outcome, and the rendered cause of a failure.
    pub fn on_attempt<F>(mut self, f: F) -> Self
    where
        F: Fn(&str, usize, AttemptOutcome, Option<&str>) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let InvokerEvent::Attempt {
                operation,
                attempt,
                outcome,
                cause,
                ..
            } = event
            {
                f(operation, *attempt, *outcome, cause.as_deref());
            }
        }));
        self
    }

    /// Registers a callback invoked before each backoff wait.
    ///
    /// # Callback Signature
    /// `Fn(usize, Duration)`: the attempt about to run and the wait before it.
    pub fn on_retry<F>(mut self, f: F) -> Self
    where
        F: Fn(usize, Duration) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let InvokerEvent::Retry {
                next_attempt,
                delay,
                ..
            } = event
            {
                f(*next_attempt, *delay);
            }
        }));
        self
    }

    /// Registers a callback for successful invocations.
    ///
    /// # Callback Signature
    /// `Fn(usize)`: total attempts made, 1 meaning no retry was needed.
    pub fn on_success<F>(mut self, f: F) -> Self
    where
        F: Fn(usize) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let InvokerEvent::Success { attempts, .. } = event {
                f(*attempts);
            }
        }));
        self
    }

    /// Registers a callback for invocations that end in a classified error.
    ///
    /// # Callback Signature
    /// `Fn(ErrorKind, usize)`: the surfaced kind and the attempts made.
    pub fn on_failure<F>(mut self, f: F) -> Self
    where
        F: Fn(ErrorKind, usize) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let InvokerEvent::Failure { kind, attempts, .. } = event {
                f(*kind, *attempts);
            }
        }));
        self
    }

    /// Builds the configuration without wrapping it in a layer.
    pub fn build_config(self) -> InvokerConfig {
        let interval_fn = self
            .interval_fn
            .unwrap_or_else(|| self.policy.interval_fn());

        InvokerConfig {
            policy: self.policy,
            interval_fn,
            classifier: self.classifier,
            event_listeners: self.event_listeners,
            name: self.name,
        }
    }

    /// Builds the invoker layer.
    pub fn build(self) -> crate::InvokerLayer {
        crate::InvokerLayer::new(self.build_config())
    }
}
