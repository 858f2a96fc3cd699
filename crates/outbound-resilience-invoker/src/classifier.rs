//! Failure classification for retry decisions.
//!
//! Every failed attempt is classified exactly once, and the verdict is never
//! carried over to the next attempt: a downstream that flips between transient
//! and terminal failures is judged attempt by attempt.

use outbound_resilience_core::{DownstreamError, ErrorKind};
use std::sync::Arc;

/// Verdict on a single failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Retrying may help.
    Transient,
    /// Retrying cannot help; surface as the given kind.
    Terminal(ErrorKind),
}

impl Classification {
    pub fn is_transient(self) -> bool {
        matches!(self, Classification::Transient)
    }
}

/// Decides whether a downstream failure is worth another attempt.
pub trait FailureClassifier: Send + Sync {
    fn classify(&self, error: &DownstreamError) -> Classification;
}

/// The standard classification table.
///
/// | Signal | Verdict |
/// |---|---|
/// | 5xx | transient |
/// | 429 | transient |
/// | 400 | terminal, `BadRequest` |
/// | 404 | terminal, `NotFound` |
/// | other status | terminal, `Unknown` (status passed through) |
/// | connect failure | transient |
/// | transport timeout | transient |
/// | anything else | terminal, `Unknown` |
///
/// ```rust
/// use outbound_resilience_core::{DownstreamError, ErrorKind};
/// use outbound_resilience_invoker::{Classification, DefaultClassifier, FailureClassifier};
///
/// let classifier = DefaultClassifier;
/// assert_eq!(classifier.classify(&DownstreamError::status(503)), Classification::Transient);
/// assert_eq!(
///     classifier.classify(&DownstreamError::status(404)),
///     Classification::Terminal(ErrorKind::NotFound)
/// );
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultClassifier;

impl FailureClassifier for DefaultClassifier {
    fn classify(&self, error: &DownstreamError) -> Classification {
        match error {
            DownstreamError::Status { code, .. } => classify_status(*code),
            DownstreamError::Connect(_) | DownstreamError::TimedOut => Classification::Transient,
            DownstreamError::Other(_) => Classification::Terminal(ErrorKind::Unknown),
        }
    }
}

fn classify_status(code: u16) -> Classification {
    match code {
        429 | 500..=599 => Classification::Transient,
        400 => Classification::Terminal(ErrorKind::BadRequest),
        404 => Classification::Terminal(ErrorKind::NotFound),
        _ => Classification::Terminal(ErrorKind::Unknown),
    }
}

/// A classifier backed by a closure.
///
/// ```rust
/// use outbound_resilience_core::{DownstreamError, ErrorKind};
/// use outbound_resilience_invoker::{Classification, DefaultClassifier, FailureClassifier, FnClassifier};
///
/// // Treat 409 as transient, otherwise defer to the standard table.
/// let classifier = FnClassifier::new(|err: &DownstreamError| match err.status_code() {
///     Some(409) => Classification::Transient,
///     _ => DefaultClassifier.classify(err),
/// });
///
/// assert!(classifier.classify(&DownstreamError::status(409)).is_transient());
/// assert_eq!(
///     classifier.classify(&DownstreamError::status(400)),
///     Classification::Terminal(ErrorKind::BadRequest)
/// );
/// ```
#[derive(Clone)]
pub struct FnClassifier<F> {
    f: Arc<F>,
}

impl<F> FnClassifier<F> {
    pub fn new(f: F) -> Self {
        Self { f: Arc::new(f) }
    }
}

impl<F> FailureClassifier for FnClassifier<F>
where
    F: Fn(&DownstreamError) -> Classification + Send + Sync,
{
    fn classify(&self, error: &DownstreamError) -> Classification {
        (self.f)(error)
    }
}

impl<F> std::fmt::Debug for FnClassifier<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnClassifier")
            .field("f", &"<closure>")
            .finish()
    }
}
