//! Throttle stress tests

use outbound_resilience_throttle::{ActionOutcome, CooldownThrottle, ThrottleState};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// Test: 10k concurrent callers hammering one key, one window
#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
#[ignore]
async fn stress_single_key_contention() {
    let throttle = CooldownThrottle::builder()
        .cooldown(Duration::from_secs(60))
        .build();
    let runs = Arc::new(AtomicUsize::new(0));

    let start = Instant::now();
    let handles: Vec<_> = (0..10_000)
        .map(|_| {
            let throttle = throttle.clone();
            let runs = Arc::clone(&runs);
            tokio::spawn(async move {
                throttle
                    .try_act("apm_test", || async {
                        runs.fetch_add(1, Ordering::SeqCst);
                        ActionOutcome::<_, String>::Completed(())
                    })
                    .await
            })
        })
        .collect();

    let mut executed = 0;
    for handle in handles {
        if handle.await.unwrap().unwrap().is_executed() {
            executed += 1;
        }
    }

    println!("10k contended decisions in {:?}", start.elapsed());
    assert_eq!(executed, 1);
    assert_eq!(runs.load(Ordering::SeqCst), 1);
}

/// Test: Many keys, many rounds; state stays consistent
#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
#[ignore]
async fn stress_many_keys() {
    let throttle = CooldownThrottle::builder()
        .cooldown(Duration::from_secs(3600))
        .build();
    let runs = Arc::new(AtomicUsize::new(0));

    let start = Instant::now();
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let throttle = throttle.clone();
            let runs = Arc::clone(&runs);
            tokio::spawn(async move {
                for key in 0..10_000 {
                    let key = format!("queue-{}", key);
                    let _ = throttle
                        .try_act(&key, || async {
                            runs.fetch_add(1, Ordering::Relaxed);
                            ActionOutcome::<_, String>::Completed(())
                        })
                        .await;
                }
            })
        })
        .collect();

    for handle in handles {
        handle.await.unwrap();
    }

    println!("80k decisions over 10k keys in {:?}", start.elapsed());
    assert_eq!(runs.load(Ordering::Relaxed), 10_000);
    assert_eq!(throttle.store().len(), 10_000);
}

/// Test: Repeated cancellation never leaves a key stuck in flight
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore]
async fn stress_cancellation_releases_keys() {
    let throttle = CooldownThrottle::builder()
        .cooldown(Duration::from_secs(60))
        .build();

    for _ in 0..1_000 {
        let handle = {
            let throttle = throttle.clone();
            tokio::spawn(async move {
                throttle
                    .try_act("apm_test", || async {
                        tokio::time::sleep(Duration::from_secs(10)).await;
                        ActionOutcome::<_, String>::Completed(())
                    })
                    .await
            })
        };
        tokio::task::yield_now().await;
        handle.abort();
        let _ = handle.await;
    }

    assert_ne!(throttle.state("apm_test"), ThrottleState::ActionInFlight);
    assert!(throttle.last_action("apm_test").is_none());
}
