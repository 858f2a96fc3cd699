//! Core infrastructure for outbound-resilience.
//!
//! This crate holds what the invoker and the throttle share:
//! - Event system for observability
//! - The classified error taxonomy handed to callers
//! - The downstream failure signal the classifier consumes

pub mod error;
pub mod events;
pub mod signal;

pub use error::{BoxError, ClassifiedError, ErrorKind};
pub use events::{EventListener, EventListeners, FnListener, ResilienceEvent};
pub use signal::DownstreamError;
