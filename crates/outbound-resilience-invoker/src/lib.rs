//! Resilient outbound calls for Tower services.
//!
//! A [`ResilientInvoker`] wraps a downstream transport (any Tower service whose
//! error is [`DownstreamError`]) and turns each remote call into exactly one of:
//! the decoded response, or one [`ClassifiedError`].
//!
//! Per attempt it:
//! - runs the call under the policy's timeout (a timeout is a transient failure)
//! - classifies failures as transient or terminal ([`FailureClassifier`])
//! - retries transient failures with exponential backoff until
//!   `max_attempts` is reached, then surfaces `Unavailable` (a policy of
//!   one attempt that times out surfaces `Timeout` instead)
//! - surfaces terminal failures immediately, without another attempt
//!
//! Attempts for one invocation are strictly sequential. Dropping the returned
//! future cancels the invocation: a pending backoff wait is abandoned and no
//! further attempt starts. A deadline carried by the [`Operation`] bounds the
//! whole sequence and surfaces `Timeout` once exceeded.
//!
//! # Examples
//!
//! ```
//! use outbound_resilience_core::{DownstreamError, ErrorKind};
//! use outbound_resilience_invoker::{InvokerConfig, Operation};
//! use tower::Layer;
//! use std::time::Duration;
//!
//! # async fn example() {
//! let layer = InvokerConfig::builder()
//!     .name("visits-service")
//!     .max_attempts(3)
//!     .base_backoff(Duration::from_millis(500))
//!     .on_retry(|attempt, delay| {
//!         println!("attempt {} in {:?}", attempt, delay);
//!     })
//!     .build();
//!
//! let transport = tower::service_fn(|_op: Operation| async move {
//!     Err::<String, _>(DownstreamError::status(404))
//! });
//!
//! let invoker = layer.layer(transport);
//! let err = invoker
//!     .invoke(Operation::get("owners/1/pets/2/visits"))
//!     .await
//!     .unwrap_err();
//! assert_eq!(err.kind(), ErrorKind::NotFound);
//! # }
//! ```

mod backoff;
mod classifier;
mod config;
mod events;
mod layer;
mod operation;

pub use backoff::{ExponentialBackoff, FnInterval, FullJitter, IntervalFunction};
pub use classifier::{Classification, DefaultClassifier, FailureClassifier, FnClassifier};
pub use config::{CallPolicy, InvokerConfig, InvokerConfigBuilder};
pub use events::{AttemptOutcome, InvokerEvent};
pub use layer::InvokerLayer;
pub use operation::{Method, Operation};

use futures::future::BoxFuture;
use outbound_resilience_core::{ClassifiedError, DownstreamError, ErrorKind};
use std::fmt;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::time::{sleep, timeout, Instant};
use tower::{Service, ServiceExt};

#[cfg(feature = "metrics")]
use metrics::{counter, describe_counter, describe_histogram, histogram};

#[cfg(feature = "tracing")]
use tracing::{debug, error, warn};

/// Wraps a downstream transport with timeout, retry and error classification.
pub struct ResilientInvoker<S> {
    inner: S,
    config: Arc<InvokerConfig>,
}

impl<S> ResilientInvoker<S> {
    /// Creates an invoker around `inner`.
    pub fn new(inner: S, config: Arc<InvokerConfig>) -> Self {
        #[cfg(feature = "metrics")]
        {
            describe_counter!(
                "invoker_attempts_total",
                "Downstream attempts made by the invoker, by outcome"
            );
            describe_counter!(
                "invoker_calls_total",
                "Invocations by final disposition (success or error kind)"
            );
            describe_histogram!(
                "invoker_backoff_seconds",
                "Backoff waits scheduled between attempts"
            );
        }

        Self { inner, config }
    }

    /// The immutable call policy.
    pub fn policy(&self) -> &CallPolicy {
        &self.config.policy
    }

    pub fn config(&self) -> &InvokerConfig {
        &self.config
    }

    /// The wrapped transport.
    pub fn get_ref(&self) -> &S {
        &self.inner
    }

    /// Performs `operation` with retries, returning the response or one
    /// classified error.
    pub async fn invoke<B, T>(&self, operation: Operation<B>) -> Result<T, ClassifiedError>
    where
        S: Service<Operation<B>, Response = T, Error = DownstreamError> + Clone,
        B: Clone,
    {
        execute(self.inner.clone(), &self.config, operation).await
    }

    /// Like [`invoke`](Self::invoke), with a caller deadline bounding every
    /// attempt and backoff wait combined.
    pub async fn invoke_with_deadline<B, T>(
        &self,
        operation: Operation<B>,
        deadline: Duration,
    ) -> Result<T, ClassifiedError>
    where
        S: Service<Operation<B>, Response = T, Error = DownstreamError> + Clone,
        B: Clone,
    {
        self.invoke(operation.with_deadline(deadline)).await
    }
}

impl<S: Clone> Clone for ResilientInvoker<S> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            config: Arc::clone(&self.config),
        }
    }
}

impl<S, B, T> Service<Operation<B>> for ResilientInvoker<S>
where
    S: Service<Operation<B>, Response = T, Error = DownstreamError> + Clone + Send + 'static,
    S::Future: Send + 'static,
    B: Clone + Send + 'static,
    T: Send + 'static,
{
    type Response = T;
    type Error = ClassifiedError;
    type Future = BoxFuture<'static, Result<T, ClassifiedError>>;

    // Readiness of the transport is awaited per attempt, inside the timeout.
    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, operation: Operation<B>) -> Self::Future {
        let service = self.inner.clone();
        let config = Arc::clone(&self.config);

        Box::pin(async move { execute(service, &config, operation).await })
    }
}

/// Why one attempt failed.
enum AttemptFailure {
    Downstream(DownstreamError),
    TimedOut(Duration),
}

impl AttemptFailure {
    /// True for an invoker-side expiry and for a timeout the transport reported.
    fn is_timeout(&self) -> bool {
        matches!(
            self,
            AttemptFailure::TimedOut(_) | AttemptFailure::Downstream(DownstreamError::TimedOut)
        )
    }

    /// Maps a terminal failure onto the caller-facing error.
    fn into_terminal(self, kind: ErrorKind) -> ClassifiedError {
        match self {
            AttemptFailure::Downstream(DownstreamError::Other(cause)) => {
                ClassifiedError::new(kind).with_source(cause)
            }
            AttemptFailure::Downstream(err) => match err.status_code() {
                Some(code) => {
                    let message = err
                        .body()
                        .filter(|body| !body.is_empty())
                        .map(str::to_owned)
                        .unwrap_or_else(|| default_message(kind, code));
                    ClassifiedError::new(kind)
                        .with_status(code)
                        .with_message(message)
                        .with_source(err)
                }
                None => ClassifiedError::new(kind).with_source(err),
            },
            AttemptFailure::TimedOut(limit) => ClassifiedError::new(kind)
                .with_message(format!("attempt timed out after {:?}", limit)),
        }
    }
}

impl fmt::Display for AttemptFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptFailure::Downstream(err) => write!(f, "{}", err),
            AttemptFailure::TimedOut(limit) => write!(f, "attempt timed out after {:?}", limit),
        }
    }
}

fn default_message(kind: ErrorKind, code: u16) -> String {
    match kind {
        ErrorKind::BadRequest => "request rejected by downstream".to_string(),
        ErrorKind::NotFound => "requested resource not found".to_string(),
        _ => format!("downstream responded with status {}", code),
    }
}

async fn call_once<S, Req>(service: &mut S, request: Req) -> Result<S::Response, S::Error>
where
    S: Service<Req>,
{
    service.ready().await?.call(request).await
}

async fn execute<S, B, T>(
    mut service: S,
    config: &InvokerConfig,
    operation: Operation<B>,
) -> Result<T, ClassifiedError>
where
    S: Service<Operation<B>, Response = T, Error = DownstreamError>,
    B: Clone,
{
    let policy = &config.policy;
    let op_id = operation.id();
    let deadline = operation
        .deadline()
        .and_then(|limit| Instant::now().checked_add(limit));
    let max_attempts = if operation.is_retry_safe() || policy.retry_non_idempotent() {
        policy.max_attempts()
    } else {
        1
    };

    let mut attempt = 1;
    loop {
        let attempt_timeout = match deadline {
            Some(deadline) => policy
                .timeout()
                .min(deadline.saturating_duration_since(Instant::now())),
            None => policy.timeout(),
        };

        let failure = match timeout(attempt_timeout, call_once(&mut service, operation.clone())).await
        {
            Ok(Ok(response)) => {
                report_attempt(config, &op_id, attempt, AttemptOutcome::Success, None);
                report_success(config, &op_id, attempt);
                return Ok(response);
            }
            Ok(Err(err)) => AttemptFailure::Downstream(err),
            Err(_elapsed) => AttemptFailure::TimedOut(attempt_timeout),
        };
        let cause = failure.to_string();

        if failure.is_timeout() && deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            report_attempt(config, &op_id, attempt, AttemptOutcome::Terminal, Some(cause));
            return Err(report_failure(config, &op_id, attempt, deadline_exceeded()));
        }

        let classification = match &failure {
            AttemptFailure::TimedOut(_) => Classification::Transient,
            AttemptFailure::Downstream(err) => config.classify(err),
        };

        match classification {
            Classification::Terminal(kind) => {
                report_attempt(config, &op_id, attempt, AttemptOutcome::Terminal, Some(cause));
                return Err(report_failure(
                    config,
                    &op_id,
                    attempt,
                    failure.into_terminal(kind),
                ));
            }
            Classification::Transient => {
                report_attempt(config, &op_id, attempt, AttemptOutcome::Transient, Some(cause));

                if attempt >= max_attempts {
                    #[cfg(feature = "tracing")]
                    error!(
                        invoker = %config.name,
                        operation = %op_id,
                        attempts = attempt,
                        last_cause = %failure,
                        "Retries exhausted"
                    );

                    // Only a lone attempt keeps its timeout identity.
                    let err = if attempt == 1 && failure.is_timeout() {
                        ClassifiedError::timeout(format!("request timed out: {}", failure))
                    } else {
                        ClassifiedError::unavailable(format!(
                            "{} unavailable after {} attempts",
                            config.name, attempt
                        ))
                    };
                    return Err(report_failure(config, &op_id, attempt, err));
                }

                let delay = config.next_backoff(attempt - 1);
                if let Some(deadline) = deadline {
                    let overruns = Instant::now()
                        .checked_add(delay)
                        .is_none_or(|wake| wake >= deadline);
                    if overruns {
                        return Err(report_failure(config, &op_id, attempt, deadline_exceeded()));
                    }
                }

                report_retry(config, &op_id, attempt + 1, delay);
                sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

fn deadline_exceeded() -> ClassifiedError {
    ClassifiedError::timeout("caller deadline exceeded")
}

fn report_attempt(
    config: &InvokerConfig,
    op_id: &str,
    attempt: usize,
    outcome: AttemptOutcome,
    cause: Option<String>,
) {
    #[cfg(feature = "metrics")]
    counter!("invoker_attempts_total", "invoker" => config.name.clone(), "outcome" => outcome.as_str())
        .increment(1);

    #[cfg(feature = "tracing")]
    debug!(
        invoker = %config.name,
        operation = %op_id,
        attempt,
        outcome = outcome.as_str(),
        cause = cause.as_deref().unwrap_or(""),
        "Attempt finished"
    );

    config.event_listeners.emit_with(|| InvokerEvent::Attempt {
        instance: config.name.clone(),
        timestamp: std::time::Instant::now(),
        operation: op_id.to_string(),
        attempt,
        outcome,
        cause,
    });
}

fn report_retry(config: &InvokerConfig, op_id: &str, next_attempt: usize, delay: Duration) {
    #[cfg(feature = "metrics")]
    histogram!("invoker_backoff_seconds", "invoker" => config.name.clone())
        .record(delay.as_secs_f64());

    #[cfg(feature = "tracing")]
    warn!(
        invoker = %config.name,
        operation = %op_id,
        next_attempt,
        delay_ms = delay.as_millis() as u64,
        "Transient failure, retrying"
    );

    config.event_listeners.emit_with(|| InvokerEvent::Retry {
        instance: config.name.clone(),
        timestamp: std::time::Instant::now(),
        operation: op_id.to_string(),
        next_attempt,
        delay,
    });
}

fn report_success(config: &InvokerConfig, op_id: &str, attempts: usize) {
    #[cfg(feature = "metrics")]
    counter!("invoker_calls_total", "invoker" => config.name.clone(), "result" => "success")
        .increment(1);

    config.event_listeners.emit_with(|| InvokerEvent::Success {
        instance: config.name.clone(),
        timestamp: std::time::Instant::now(),
        operation: op_id.to_string(),
        attempts,
    });
}

fn report_failure(
    config: &InvokerConfig,
    op_id: &str,
    attempts: usize,
    err: ClassifiedError,
) -> ClassifiedError {
    #[cfg(feature = "metrics")]
    counter!("invoker_calls_total", "invoker" => config.name.clone(), "result" => err.kind().as_str())
        .increment(1);

    #[cfg(feature = "tracing")]
    if err.kind() != ErrorKind::Unavailable {
        warn!(
            invoker = %config.name,
            operation = %op_id,
            attempts,
            kind = err.kind().as_str(),
            error = %err,
            "Invocation failed"
        );
    }

    config.event_listeners.emit_with(|| InvokerEvent::Failure {
        instance: config.name.clone(),
        timestamp: std::time::Instant::now(),
        operation: op_id.to_string(),
        attempts,
        kind: err.kind(),
    });
    err
}
