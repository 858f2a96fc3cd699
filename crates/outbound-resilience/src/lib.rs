//! Resilient outbound calls and cooldown-gated side effects for Tower services.
//!
//! `outbound-resilience` bundles two patterns a service needs when it talks to
//! other services and to hosted infrastructure. Each is available as an
//! individual crate and as a feature here.
//!
//! # Patterns
//!
//! - **Invoker** (`invoker` feature): wraps a downstream transport with a
//!   per-attempt timeout, classification-aware retry with exponential backoff,
//!   and translation of failures into one [`core::ClassifiedError`]
//! - **Throttle** (`throttle` feature): runs a disruptive action for a key at
//!   most once per cooldown window, e.g. purging a queue
//!
//! # Usage
//!
//! ```toml
//! [dependencies]
//! outbound-resilience = { version = "0.1", features = ["invoker", "tracing"] }
//! ```
//!
//! Or enable everything:
//!
//! ```toml
//! [dependencies]
//! outbound-resilience = { version = "0.1", features = ["full"] }
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! # #[cfg(feature = "invoker")]
//! # {
//! use outbound_resilience::core::DownstreamError;
//! use outbound_resilience::invoker::{InvokerLayer, Operation};
//! use std::time::Duration;
//! use tower::ServiceBuilder;
//!
//! # async fn example() {
//! let client = ServiceBuilder::new()
//!     .layer(
//!         InvokerLayer::builder()
//!             .name("visits-service")
//!             .timeout(Duration::from_secs(10))
//!             .build(),
//!     )
//!     .service(tower::service_fn(|_op: Operation| async {
//!         Ok::<_, DownstreamError>("[]".to_string())
//!     }));
//!
//! let visits: String = client.invoke(Operation::get("pets/visits?petId=1")).await.unwrap();
//! # let _ = visits;
//! # }
//! # }
//! ```
//!
//! # Individual Crates
//!
//! - `outbound-resilience-invoker`
//! - `outbound-resilience-throttle`
//! - `outbound-resilience-core` (shared infrastructure)

// Re-export core (always available)
pub use outbound_resilience_core as core;

#[cfg(feature = "invoker")]
pub use outbound_resilience_invoker as invoker;

#[cfg(feature = "throttle")]
pub use outbound_resilience_throttle as throttle;
