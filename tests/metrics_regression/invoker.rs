//! Invoker metrics regression tests

use super::helpers::*;
use outbound_resilience_core::DownstreamError;
use outbound_resilience_invoker::{InvokerLayer, Operation};
use serial_test::serial;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tower::Layer;

#[tokio::test]
#[serial]
async fn invoker_metrics_exist() {
    init_recorder();

    let counter = Arc::new(AtomicUsize::new(0));
    let counter_clone = Arc::clone(&counter);
    let service = tower::service_fn(move |_op: Operation| {
        let count = counter_clone.fetch_add(1, Ordering::SeqCst);
        async move {
            if count < 1 {
                Err(DownstreamError::status(503))
            } else {
                Ok("visits".to_string())
            }
        }
    });

    let invoker = InvokerLayer::builder()
        .name("test_invoker")
        .max_attempts(3)
        .base_backoff(Duration::from_millis(10))
        .build()
        .layer(service);

    // Make a call that will retry once and succeed
    let _ = invoker.invoke::<(), String>(Operation::get("pets/visits")).await;

    assert_counter_exists("invoker_attempts_total");
    assert_metric_has_label("invoker_attempts_total", "invoker", "test_invoker");
    assert_metric_has_label("invoker_attempts_total", "outcome", "transient");
    assert_metric_has_label("invoker_attempts_total", "outcome", "success");

    assert_counter_exists("invoker_calls_total");
    assert_metric_has_label("invoker_calls_total", "result", "success");

    assert_histogram_exists("invoker_backoff_seconds");
    assert_metric_has_label("invoker_backoff_seconds", "invoker", "test_invoker");
}

#[tokio::test]
#[serial]
async fn invoker_failure_result_labels() {
    init_recorder();

    let service = tower::service_fn(|op: Operation| async move {
        if op.target().contains("missing") {
            Err::<String, _>(DownstreamError::status(404))
        } else {
            Err(DownstreamError::status(503))
        }
    });

    let invoker = InvokerLayer::builder()
        .name("failing_invoker")
        .max_attempts(2)
        .base_backoff(Duration::from_millis(1))
        .build()
        .layer(service);

    let _ = invoker.invoke::<(), String>(Operation::get("owners/missing")).await;
    let _ = invoker.invoke::<(), String>(Operation::get("pets/visits")).await;

    assert_metric_has_label("invoker_calls_total", "result", "not_found");
    assert_metric_has_label("invoker_calls_total", "result", "unavailable");
    assert_metric_has_label("invoker_attempts_total", "outcome", "terminal");
}
