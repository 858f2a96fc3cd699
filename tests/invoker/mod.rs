//! Tests for the resilient invoker.
//!
//! Test organization:
//! - attempts.rs: retry counts, backoff timing, exhaustion
//! - classification.rs: error translation and custom classifiers
//! - deadline.rs: caller deadlines and cancellation
//! - events.rs: listener callbacks
//! - service.rs: Tower `Service`/`Layer` composition


use outbound_resilience_core::DownstreamError;
use outbound_resilience_invoker::Operation;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower::Service;

/// Routes invoker logs to the test harness output. Safe to call repeatedly.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

/// One scripted downstream reaction.
#[derive(Debug, Clone)]
pub enum Step {
    Ok(&'static str),
    Status(u16),
    Connect,
    /// Sleep longer than any per-attempt timeout used in these tests.
    Hang,
}

/// A transport that replays `steps` in order and repeats the last one.
pub fn scripted(
    steps: Vec<Step>,
) -> (
    impl Service<Operation, Response = String, Error = DownstreamError, Future: Send> + Clone + Send + 'static,
    Arc<AtomicUsize>,
) {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let steps = Arc::new(Mutex::new(VecDeque::from(steps)));

    let service = tower::service_fn(move |_op: Operation| {
        counter.fetch_add(1, Ordering::SeqCst);
        let step = {
            let mut steps = steps.lock().unwrap();
            if steps.len() > 1 {
                steps.pop_front()
            } else {
                steps.front().cloned()
            }
        };
        async move {
            match step.unwrap_or(Step::Ok("ok")) {
                Step::Ok(body) => Ok(body.to_string()),
                Step::Status(code) => Err(DownstreamError::status(code)),
                Step::Connect => Err(DownstreamError::connect(std::io::Error::new(
                    std::io::ErrorKind::ConnectionRefused,
                    "connection refused",
                ))),
                Step::Hang => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Ok("late".to_string())
                }
            }
        }
    });
    (service, calls)
}

/// Asserts `elapsed` is `expected`, allowing for timer-wheel rounding.
pub fn assert_elapsed(elapsed: Duration, expected: Duration) {
    let tolerance = Duration::from_millis(10);
    assert!(
        elapsed >= expected && elapsed <= expected + tolerance,
        "expected ~{:?}, got {:?}",
        expected,
        elapsed
    );
}
