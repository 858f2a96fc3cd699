//! Failure signals reported by a downstream transport.
//!
//! The core never talks to the network itself. A transport adapter turns its
//! own failures into a [`DownstreamError`] so the invoker's classifier can
//! decide between retrying and surfacing.

use crate::error::BoxError;

/// A failed downstream call, as seen by the transport.
#[derive(Debug, thiserror::Error)]
pub enum DownstreamError {
    /// The downstream answered with a non-success status.
    #[error("downstream responded with status {code}")]
    Status {
        /// Status-like code (HTTP semantics: 4xx client, 5xx server).
        code: u16,
        /// Response body, if the transport captured one.
        body: Option<String>,
    },

    /// A connection could not be established.
    #[error("connection to downstream failed: {0}")]
    Connect(#[source] BoxError),

    /// The transport gave up waiting (e.g. a socket read timeout).
    #[error("downstream read timed out")]
    TimedOut,

    /// Anything the transport could not categorize.
    #[error(transparent)]
    Other(BoxError),
}

impl DownstreamError {
    /// A status response without a captured body.
    pub fn status(code: u16) -> Self {
        DownstreamError::Status { code, body: None }
    }

    /// A status response with its body.
    pub fn status_with_body(code: u16, body: impl Into<String>) -> Self {
        DownstreamError::Status {
            code,
            body: Some(body.into()),
        }
    }

    pub fn connect<E>(cause: E) -> Self
    where
        E: Into<BoxError>,
    {
        DownstreamError::Connect(cause.into())
    }

    pub fn other<E>(cause: E) -> Self
    where
        E: Into<BoxError>,
    {
        DownstreamError::Other(cause.into())
    }

    /// The status code, for `Status` signals.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            DownstreamError::Status { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// The response body, for `Status` signals that captured one.
    pub fn body(&self) -> Option<&str> {
        match self {
            DownstreamError::Status { body, .. } => body.as_deref(),
            _ => None,
        }
    }
}
