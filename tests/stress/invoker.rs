//! Invoker stress tests

use outbound_resilience_core::DownstreamError;
use outbound_resilience_invoker::{InvokerLayer, Operation};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tower::Layer;

use super::ConcurrencyTracker;

/// Test: 500k invocations that succeed on the first attempt
#[tokio::test]
#[ignore]
async fn stress_half_million_calls_no_retries() {
    let call_count = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&call_count);

    let svc = tower::service_fn(move |_op: Operation| {
        counter.fetch_add(1, Ordering::Relaxed);
        async { Ok::<_, DownstreamError>(()) }
    });

    let invoker = InvokerLayer::builder()
        .name("stress")
        .max_attempts(3)
        .build()
        .layer(svc);

    let start = Instant::now();
    for _ in 0..500_000 {
        invoker
            .invoke::<(), ()>(Operation::get("pets/visits"))
            .await
            .unwrap();
    }
    let elapsed = start.elapsed();

    println!("500k invocations completed in {:?}", elapsed);
    println!(
        "Throughput: {:.0} calls/sec",
        500_000.0 / elapsed.as_secs_f64()
    );

    assert_eq!(call_count.load(Ordering::Relaxed), 500_000);
}

/// Test: Many concurrent invocations, each needing one retry
#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
#[ignore]
async fn stress_concurrent_invocations_with_retries() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let tracker = ConcurrencyTracker::new();

    let svc = {
        let attempts = Arc::clone(&attempts);
        let tracker = Arc::clone(&tracker);
        tower::service_fn(move |op: Operation| {
            let attempts = Arc::clone(&attempts);
            let tracker = Arc::clone(&tracker);
            async move {
                tracker.enter();
                attempts.fetch_add(1, Ordering::Relaxed);
                tokio::time::sleep(Duration::from_millis(1)).await;
                tracker.exit();
                if op.target().ends_with("down") {
                    Err(DownstreamError::status(503))
                } else {
                    Ok(())
                }
            }
        })
    };

    let invoker = InvokerLayer::builder()
        .max_attempts(2)
        .base_backoff(Duration::from_millis(1))
        .build()
        .layer(svc);

    let start = Instant::now();
    let handles: Vec<_> = (0..5_000)
        .map(|i| {
            let invoker = invoker.clone();
            tokio::spawn(async move {
                let target = if i % 2 == 0 { "visits/down" } else { "visits/ok" };
                invoker.invoke::<(), ()>(Operation::get(target)).await
            })
        })
        .collect();

    let mut failures = 0;
    for handle in handles {
        if handle.await.unwrap().is_err() {
            failures += 1;
        }
    }

    println!("5k concurrent invocations completed in {:?}", start.elapsed());
    println!("Peak concurrent downstream calls: {}", tracker.peak());

    // Even targets always fail: two attempts each, then Unavailable.
    assert_eq!(failures, 2_500);
    assert_eq!(attempts.load(Ordering::Relaxed), 2_500 * 2 + 2_500);
    assert_eq!(tracker.current(), 0);
}
