//! The error taxonomy surfaced to callers.
//!
//! A caller of the invoker gets either its response or exactly one
//! [`ClassifiedError`]. Per-attempt failures never cross the boundary; only the
//! terminal disposition does.
//!
//! # Pattern Matching
//!
//! ```rust
//! use outbound_resilience_core::{ClassifiedError, ErrorKind};
//!
//! fn to_status(err: &ClassifiedError) -> u16 {
//!     match err.kind() {
//!         ErrorKind::BadRequest | ErrorKind::NotFound => err.status_code(),
//!         ErrorKind::Timeout => 408,
//!         ErrorKind::Unavailable => 503,
//!         ErrorKind::Unknown => err.status_code(),
//!     }
//! }
//!
//! let err = ClassifiedError::unavailable("visits service unavailable after retries");
//! assert_eq!(to_status(&err), 503);
//! ```

use std::fmt;

/// Type-erased error used for causes.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The fixed set of failure kinds a caller can observe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ErrorKind {
    /// The downstream rejected the caller's input. Never retried.
    BadRequest,
    /// The requested resource does not exist downstream.
    NotFound,
    /// A deadline was exceeded, possibly after retries.
    Timeout,
    /// Retries were exhausted against a transient condition.
    Unavailable,
    /// Anything else. The cause is passed through unchanged.
    Unknown,
}

impl ErrorKind {
    /// Stable lowercase label, suitable for logs and metric labels.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::BadRequest => "bad_request",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Unavailable => "unavailable",
            ErrorKind::Unknown => "unknown",
        }
    }

    /// The protocol status a presentation layer would report for this kind.
    pub fn status_code(self) -> u16 {
        match self {
            ErrorKind::BadRequest => 400,
            ErrorKind::NotFound => 404,
            ErrorKind::Timeout => 408,
            ErrorKind::Unavailable => 503,
            ErrorKind::Unknown => 500,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ErrorKind::BadRequest => "bad request",
            ErrorKind::NotFound => "not found",
            ErrorKind::Timeout => "timed out",
            ErrorKind::Unavailable => "unavailable",
            ErrorKind::Unknown => "unknown error",
        })
    }
}

/// A failure mapped onto [`ErrorKind`] at the component boundary.
///
/// Carries an optional human-readable message, the downstream status code when
/// there was one, and the originating cause (reachable via
/// [`std::error::Error::source`]).
#[derive(Debug, thiserror::Error)]
#[error("{kind}{}", .message.as_deref().map(|m| format!(": {m}")).unwrap_or_default())]
pub struct ClassifiedError {
    kind: ErrorKind,
    message: Option<String>,
    status: Option<u16>,
    #[source]
    source: Option<BoxError>,
}

impl ClassifiedError {
    /// Creates an error of the given kind with no message or cause.
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
            status: None,
            source: None,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::BadRequest).with_message(message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound).with_message(message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Timeout).with_message(message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unavailable).with_message(message)
    }

    /// Wraps an uncategorized cause without masking it.
    pub fn unknown<E>(cause: E) -> Self
    where
        E: Into<BoxError>,
    {
        Self::new(ErrorKind::Unknown).with_source(cause)
    }

    /// Attaches a human-readable message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Records the downstream status code the error was derived from.
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Attaches the originating cause.
    pub fn with_source<E>(mut self, cause: E) -> Self
    where
        E: Into<BoxError>,
    {
        self.source = Some(cause.into());
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// The downstream status, if the error came from a status response.
    pub fn downstream_status(&self) -> Option<u16> {
        self.status
    }

    /// Status code for the presentation layer.
    ///
    /// `Unknown` errors pass the downstream status through when one exists.
    pub fn status_code(&self) -> u16 {
        match (self.kind, self.status) {
            (ErrorKind::Unknown, Some(status)) => status,
            (kind, _) => kind.status_code(),
        }
    }

    /// Takes the originating cause out of the error.
    pub fn into_source(self) -> Option<BoxError> {
        self.source
    }

    pub fn is_timeout(&self) -> bool {
        self.kind == ErrorKind::Timeout
    }

    pub fn is_unavailable(&self) -> bool {
        self.kind == ErrorKind::Unavailable
    }
}
