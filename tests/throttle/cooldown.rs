//! Cooldown window timing and per-key isolation.

use super::PurgeError;
use outbound_resilience_throttle::{
    ActionOutcome, CooldownThrottle, Decision, SkipReason, ThrottleState,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::time::{Instant, advance};

fn purge_throttle() -> CooldownThrottle {
    CooldownThrottle::builder()
        .name("queue-purge")
        .cooldown(Duration::from_secs(60))
        .build()
}

async fn purge(
    throttle: &CooldownThrottle,
    queue: &str,
    calls: &AtomicUsize,
) -> Result<Decision<()>, PurgeError> {
    throttle
        .try_act(queue, || async {
            calls.fetch_add(1, Ordering::SeqCst);
            ActionOutcome::Completed(())
        })
        .await
}

#[tokio::test(start_paused = true)]
async fn purge_at_0_skip_at_30_purge_at_61() {
    let throttle = purge_throttle();
    let calls = AtomicUsize::new(0);

    assert_eq!(purge(&throttle, "apm_test", &calls).await, Ok(Decision::Executed(())));

    advance(Duration::from_secs(30)).await;
    let skipped = purge(&throttle, "apm_test", &calls).await.unwrap();
    assert_eq!(
        skipped.skip_reason(),
        Some(SkipReason::CooldownActive {
            remaining: Duration::from_secs(30)
        })
    );

    advance(Duration::from_secs(31)).await;
    assert_eq!(purge(&throttle, "apm_test", &calls).await, Ok(Decision::Executed(())));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn record_is_stamped_at_decision_time() {
    let throttle = purge_throttle();
    let started = Instant::now();

    let decision = throttle
        .try_act("apm_test", || async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            ActionOutcome::<_, PurgeError>::Completed(())
        })
        .await;

    assert!(decision.unwrap().is_executed());
    assert_eq!(throttle.last_action("apm_test"), Some(started));
}

#[tokio::test(start_paused = true)]
async fn keys_do_not_share_a_window() {
    let throttle = purge_throttle();
    let calls = AtomicUsize::new(0);

    assert!(purge(&throttle, "queue-a", &calls).await.unwrap().is_executed());
    assert!(purge(&throttle, "queue-b", &calls).await.unwrap().is_executed());
    assert!(purge(&throttle, "queue-a", &calls).await.unwrap().is_skipped());

    assert_eq!(throttle.state("queue-a"), ThrottleState::CooldownActive);
    assert_eq!(throttle.state("queue-c"), ThrottleState::Idle);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn clones_share_state() {
    let throttle = purge_throttle();
    let clone = throttle.clone();
    let calls = AtomicUsize::new(0);

    purge(&throttle, "apm_test", &calls).await.unwrap();
    assert!(purge(&clone, "apm_test", &calls).await.unwrap().is_skipped());
}

#[tokio::test(start_paused = true)]
async fn zero_cooldown_never_skips_sequential_calls() {
    let throttle = CooldownThrottle::builder().cooldown(Duration::ZERO).build();
    let calls = AtomicUsize::new(0);

    for _ in 0..5 {
        assert!(purge(&throttle, "apm_test", &calls).await.unwrap().is_executed());
    }
    assert_eq!(calls.load(Ordering::SeqCst), 5);
}

#[tokio::test(start_paused = true)]
async fn state_decays_without_calls() {
    let throttle = purge_throttle();
    let calls = AtomicUsize::new(0);

    purge(&throttle, "apm_test", &calls).await.unwrap();
    assert_eq!(throttle.state("apm_test"), ThrottleState::CooldownActive);

    advance(Duration::from_secs(60)).await;
    assert_eq!(throttle.state("apm_test"), ThrottleState::Idle);
}
