//! Registering a pet: call the visits service through the invoker, then
//! publish a notification whose queue purge is cooldown gated.

use futures::future::BoxFuture;
use outbound_resilience::core::{DownstreamError, ErrorKind};
use outbound_resilience::invoker::{InvokerLayer, Operation};
use outbound_resilience::throttle::{
    CooldownThrottle, PurgeStatus, PurgingPublisher, QueueError, RemoteQueue,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;

struct NotificationQueue;

impl RemoteQueue for NotificationQueue {
    type Payload = String;

    fn enqueue<'a>(
        &'a self,
        queue: &'a str,
        payload: String,
    ) -> BoxFuture<'a, Result<(), QueueError>> {
        Box::pin(async move {
            println!("  -> {}: {}", queue, payload);
            Ok(())
        })
    }

    fn purge<'a>(&'a self, queue: &'a str) -> BoxFuture<'a, Result<(), QueueError>> {
        Box::pin(async move {
            println!("  purged {}", queue);
            Ok(())
        })
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Pet Registration Example");
    println!("========================\n");

    let failures_left = Arc::new(AtomicUsize::new(1));
    let visits_transport = tower::service_fn(move |op: Operation<String>| {
        let failures_left = Arc::clone(&failures_left);
        async move {
            if failures_left
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
            {
                return Err(DownstreamError::status(502));
            }
            Ok::<_, DownstreamError>(format!("created {}", op.body().cloned().unwrap_or_default()))
        }
    });

    let visits = ServiceBuilder::new()
        .layer(
            InvokerLayer::builder()
                .name("visits-service")
                .max_attempts(3)
                .base_backoff(Duration::from_millis(50))
                .on_retry(|attempt, delay| println!("  [RETRY] attempt {} in {:?}", attempt, delay))
                .build(),
        )
        .service(visits_transport);

    let publisher = PurgingPublisher::new(
        NotificationQueue,
        CooldownThrottle::builder()
            .name("notification-purge")
            .cooldown(Duration::from_secs(60))
            .build(),
    );

    for pet in ["Leo", "Basil"] {
        println!("Registering {}", pet);
        let op = Operation::post("owners/1/pets/visits", format!("{{\"pet\":\"{}\"}}", pet))
            .with_idempotency_key(format!("register-{}", pet));
        match visits.invoke::<String, String>(op).await {
            Ok(body) => println!("  visits service: {}", body),
            Err(err) if err.kind() == ErrorKind::Unavailable => {
                println!("  visits service unavailable, skipping: {}", err);
                continue;
            }
            Err(err) => return Err(err.into()),
        }

        match publisher.publish("pet-events", format!("registered {}", pet)).await? {
            PurgeStatus::Skipped(reason) => println!("  purge skipped: {}\n", reason),
            status => println!("  purge: {:?}\n", status),
        }
    }

    Ok(())
}
