use crate::{InvokerConfig, ResilientInvoker};
use std::sync::Arc;
use tower::Layer;

/// A Tower [`Layer`] that wraps a downstream transport in a
/// [`ResilientInvoker`].
///
/// # Examples
///
/// ```
/// use outbound_resilience_core::DownstreamError;
/// use outbound_resilience_invoker::{InvokerLayer, Operation};
/// use tower::ServiceBuilder;
/// use std::time::Duration;
///
/// # async fn example() {
/// let layer = InvokerLayer::builder()
///     .name("visits-service")
///     .timeout(Duration::from_secs(10))
///     .max_attempts(3)
///     .base_backoff(Duration::from_millis(500))
///     .build();
///
/// let invoker = ServiceBuilder::new()
///     .layer(layer)
///     .service(tower::service_fn(|op: Operation| async move {
///         Ok::<_, DownstreamError>(format!("visits for {}", op.target()))
///     }));
///
/// let visits = invoker.invoke(Operation::get("pets/visits?petId=1")).await;
/// # let _ = visits;
/// # }
/// ```
#[derive(Clone)]
pub struct InvokerLayer {
    config: Arc<InvokerConfig>,
}

impl InvokerLayer {
    pub fn new(config: InvokerConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// Creates a new builder for configuring an invoker layer.
    pub fn builder() -> crate::InvokerConfigBuilder {
        crate::InvokerConfigBuilder::new()
    }
}

impl<S> Layer<S> for InvokerLayer {
    type Service = ResilientInvoker<S>;

    fn layer(&self, service: S) -> Self::Service {
        ResilientInvoker::new(service, Arc::clone(&self.config))
    }
}
