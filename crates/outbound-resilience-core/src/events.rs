//! Observer hooks for invokers and throttles.
//!
//! Each instance owns one [`EventListeners`] set for its own event type. The
//! instance reports every attempt, retry, throttle decision and final
//! disposition through it; what a listener does with the event (log line,
//! counter, audit record) is up to the listener.
//!
//! ```rust
//! use outbound_resilience_core::events::{EventListeners, FnListener, ResilienceEvent};
//! use std::time::Instant;
//!
//! #[derive(Debug)]
//! struct Purged {
//!     queue: String,
//!     at: Instant,
//! }
//!
//! impl ResilienceEvent for Purged {
//!     fn event_type(&self) -> &'static str {
//!         "Purged"
//!     }
//!     fn timestamp(&self) -> Instant {
//!         self.at
//!     }
//!     fn instance_name(&self) -> &str {
//!         "purger"
//!     }
//!     fn subject(&self) -> &str {
//!         &self.queue
//!     }
//! }
//!
//! let mut listeners = EventListeners::new();
//! listeners.add(FnListener::new(|event: &Purged| {
//!     println!("{} {}", event.event_type(), event.subject());
//! }));
//! listeners.emit_with(|| Purged { queue: "apm_test".into(), at: Instant::now() });
//! ```

use std::fmt;
use std::marker::PhantomData;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

/// An event reported by an invoker or throttle instance.
pub trait ResilienceEvent: Send + Sync + fmt::Debug {
    /// Stable variant name, e.g. `"Attempt"` or `"Skipped"`.
    fn event_type(&self) -> &'static str;

    fn timestamp(&self) -> Instant;

    /// Configured name of the reporting instance.
    fn instance_name(&self) -> &str;

    /// What the event is about: an operation id for the invoker, a resource
    /// key for the throttle.
    fn subject(&self) -> &str;
}

/// Receives events of type `E`.
pub trait EventListener<E: ResilienceEvent>: Send + Sync {
    fn on_event(&self, event: &E);
}

/// Listeners for one event type, called in registration order.
///
/// Cloning shares the registered listeners.
#[derive(Clone)]
pub struct EventListeners<E: ResilienceEvent> {
    listeners: Vec<Arc<dyn EventListener<E>>>,
}

impl<E: ResilienceEvent> EventListeners<E> {
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }

    pub fn add<L>(&mut self, listener: L)
    where
        L: EventListener<E> + 'static,
    {
        self.listeners.push(Arc::new(listener));
    }

    /// Delivers `event` to every listener.
    ///
    /// A listener that panics is skipped; the others still receive the event
    /// and the panic never reaches the caller.
    pub fn emit(&self, event: &E) {
        for listener in &self.listeners {
            let _ = catch_unwind(AssertUnwindSafe(|| listener.on_event(event)));
        }
    }

    /// Builds the event only when someone is listening, then emits it.
    pub fn emit_with<F>(&self, build: F)
    where
        F: FnOnce() -> E,
    {
        if self.listeners.is_empty() {
            return;
        }
        self.emit(&build());
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }
}

impl<E: ResilienceEvent> Default for EventListeners<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: ResilienceEvent> fmt::Debug for EventListeners<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventListeners")
            .field("len", &self.listeners.len())
            .finish()
    }
}

/// Adapts a closure into an [`EventListener`].
pub struct FnListener<E, F> {
    f: F,
    _event: PhantomData<fn(&E)>,
}

impl<E, F> FnListener<E, F>
where
    F: Fn(&E) + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self {
            f,
            _event: PhantomData,
        }
    }
}

impl<E, F> EventListener<E> for FnListener<E, F>
where
    E: ResilienceEvent,
    F: Fn(&E) + Send + Sync,
{
    fn on_event(&self, event: &E) {
        (self.f)(event)
    }
}
