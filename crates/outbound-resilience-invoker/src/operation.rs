//! Description of a single remote call.

use std::fmt;
use std::time::Duration;

/// Request method of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete,
    Options,
}

impl Method {
    /// Whether repeating the call has the same effect as making it once.
    pub fn is_idempotent(self) -> bool {
        !matches!(self, Method::Post | Method::Patch)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
            Method::Options => "OPTIONS",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A remote call: method, target and optional body.
///
/// The body type is opaque to the invoker; it is cloned once per attempt.
///
/// ```rust
/// use outbound_resilience_invoker::{Method, Operation};
/// use std::time::Duration;
///
/// let op = Operation::post("owners/7/pets/3/visits", "checkup".to_string())
///     .with_idempotency_key("visit-7-3-2024-05-01")
///     .with_deadline(Duration::from_secs(2));
///
/// assert_eq!(op.method(), Method::Post);
/// assert!(op.is_retry_safe());
/// assert_eq!(op.id(), "POST owners/7/pets/3/visits");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation<B = ()> {
    method: Method,
    target: String,
    body: Option<B>,
    name: Option<String>,
    idempotency_key: Option<String>,
    deadline: Option<Duration>,
}

impl<B> Operation<B> {
    pub fn new(method: Method, target: impl Into<String>) -> Self {
        Self {
            method,
            target: target.into(),
            body: None,
            name: None,
            idempotency_key: None,
            deadline: None,
        }
    }

    pub fn get(target: impl Into<String>) -> Self {
        Self::new(Method::Get, target)
    }

    pub fn delete(target: impl Into<String>) -> Self {
        Self::new(Method::Delete, target)
    }

    pub fn post(target: impl Into<String>, body: B) -> Self {
        Self::new(Method::Post, target).with_body(body)
    }

    pub fn put(target: impl Into<String>, body: B) -> Self {
        Self::new(Method::Put, target).with_body(body)
    }

    pub fn with_body(mut self, body: B) -> Self {
        self.body = Some(body);
        self
    }

    /// Overrides the identifier reported in events and logs.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Marks the call as safe to repeat even if its method is not idempotent.
    /// The transport is expected to forward the key to the downstream.
    pub fn with_idempotency_key(mut self, key: impl Into<String>) -> Self {
        self.idempotency_key = Some(key.into());
        self
    }

    /// Bounds the whole invocation, retries and backoff included.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn body(&self) -> Option<&B> {
        self.body.as_ref()
    }

    pub fn idempotency_key(&self) -> Option<&str> {
        self.idempotency_key.as_deref()
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.deadline
    }

    /// True when repeating the call cannot cause duplicate side effects.
    pub fn is_retry_safe(&self) -> bool {
        self.method.is_idempotent() || self.idempotency_key.is_some()
    }

    /// Identifier used in events: the explicit name, or `"METHOD target"`.
    pub fn id(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => format!("{} {}", self.method, self.target),
        }
    }
}
