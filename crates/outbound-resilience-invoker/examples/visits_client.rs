//! A visits-service client that rides out a flaky downstream.
//!
//! Run with: cargo run -p outbound-resilience-invoker --example visits_client --features tracing

use outbound_resilience_core::{DownstreamError, ErrorKind};
use outbound_resilience_invoker::{InvokerLayer, Operation};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    println!("Visits Client Example");
    println!("=====================\n");

    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);

    // Fails twice with 503, then answers. Unknown pets give 404.
    let transport = tower::service_fn(move |op: Operation| {
        let counter = Arc::clone(&counter);
        async move {
            if op.target().ends_with("petId=404") {
                return Err(DownstreamError::status_with_body(404, "no such pet"));
            }
            let n = counter.fetch_add(1, Ordering::SeqCst);
            if n < 2 {
                Err(DownstreamError::status(503))
            } else {
                Ok(format!("[{{\"petId\":7,\"description\":\"rabies shot\"}}] from {}", op.target()))
            }
        }
    });

    let layer = InvokerLayer::builder()
        .name("visits-service")
        .timeout(Duration::from_secs(2))
        .max_attempts(4)
        .base_backoff(Duration::from_millis(100))
        .on_retry(|attempt, delay| {
            println!("  [RETRY] attempt {} in {:?}", attempt, delay);
        })
        .on_success(|attempts| {
            println!("  [SUCCESS] after {} attempt(s)", attempts);
        })
        .on_failure(|kind, attempts| {
            println!("  [FAILURE] {} after {} attempt(s)", kind, attempts);
        })
        .build();

    let client = ServiceBuilder::new().layer(layer).service(transport);

    println!("Example 1: transient 503s are retried");
    let visits: String = client
        .invoke(Operation::get("pets/visits?petId=7").named("get-visits"))
        .await?;
    println!("  Visits: {}\n", visits);

    println!("Example 2: 404 is surfaced without retry");
    match client
        .invoke::<(), String>(Operation::get("pets/visits?petId=404"))
        .await
    {
        Err(err) if err.kind() == ErrorKind::NotFound => {
            println!("  Not found (HTTP {}): {}\n", err.status_code(), err);
        }
        other => println!("  Unexpected: {:?}\n", other),
    }

    println!("Example 3: a caller deadline bounds the whole sequence");
    calls.store(0, Ordering::SeqCst);
    let result: Result<String, _> = client
        .invoke_with_deadline(
            Operation::get("pets/visits?petId=7"),
            Duration::from_millis(50),
        )
        .await;
    match result {
        Err(err) => println!("  Gave up: {} ({})", err, err.kind()),
        Ok(visits) => println!("  Visits: {}", visits),
    }

    Ok(())
}
