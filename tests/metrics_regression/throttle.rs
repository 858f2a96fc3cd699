//! Throttle metrics regression tests

use super::helpers::*;
use outbound_resilience_throttle::{ActionOutcome, CooldownThrottle};
use serial_test::serial;
use std::time::Duration;

#[tokio::test]
#[serial]
async fn throttle_decision_metrics() {
    init_recorder();

    let throttle = CooldownThrottle::builder()
        .name("test_throttle")
        .cooldown(Duration::from_secs(60))
        .build();

    let executed = throttle
        .try_act("q1", || async { ActionOutcome::<(), String>::Completed(()) })
        .await
        .unwrap();
    let skipped = throttle
        .try_act("q1", || async { ActionOutcome::<(), String>::Completed(()) })
        .await
        .unwrap();
    let in_progress = throttle
        .try_act("q2", || async { ActionOutcome::<(), String>::InProgress })
        .await
        .unwrap();
    let _ = throttle
        .try_act("q3", || async {
            ActionOutcome::<(), _>::Failed("denied".to_string())
        })
        .await;

    assert_counter_exists("throttle_decisions_total");
    assert_metric_has_label("throttle_decisions_total", "throttle", "test_throttle");
    assert_metric_has_label("throttle_decisions_total", "decision", "executed");
    assert_metric_has_label("throttle_decisions_total", "decision", "skipped");
    assert_metric_has_label("throttle_decisions_total", "reason", "cooldown_active");
    assert_metric_has_label("throttle_decisions_total", "decision", "in_progress");
    assert_metric_has_label("throttle_decisions_total", "decision", "failed");

    // The decision label is the decision's own label.
    for decision in [&executed, &skipped, &in_progress] {
        assert_metric_has_label("throttle_decisions_total", "decision", decision.as_str());
    }
}
