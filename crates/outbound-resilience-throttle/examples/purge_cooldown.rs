//! Publishing to a queue whose purge is allowed once per cooldown.
//!
//! Run with: cargo run -p outbound-resilience-throttle --example purge_cooldown --features tracing

use futures::future::BoxFuture;
use outbound_resilience_throttle::{
    CooldownThrottle, PurgeStatus, PurgingPublisher, QueueError, RemoteQueue,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// In-memory stand-in for a hosted queue that rejects purges more often
/// than once a minute.
#[derive(Default)]
struct MemoryQueue {
    sent: AtomicUsize,
    purges: AtomicUsize,
}

impl RemoteQueue for MemoryQueue {
    type Payload = &'static str;

    fn enqueue<'a>(
        &'a self,
        queue: &'a str,
        payload: &'static str,
    ) -> BoxFuture<'a, Result<(), QueueError>> {
        Box::pin(async move {
            self.sent.fetch_add(1, Ordering::SeqCst);
            println!("  enqueue {} <- {:?}", queue, payload);
            Ok(())
        })
    }

    fn purge<'a>(&'a self, queue: &'a str) -> BoxFuture<'a, Result<(), QueueError>> {
        Box::pin(async move {
            let n = self.purges.fetch_add(1, Ordering::SeqCst);
            println!("  purge {}", queue);
            if n == 1 {
                Err(QueueError::PurgeInProgress)
            } else {
                Ok(())
            }
        })
    }
}

#[tokio::main]
async fn main() -> Result<(), QueueError> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    println!("Purge Cooldown Example");
    println!("======================\n");

    let throttle = CooldownThrottle::builder()
        .name("queue-purge")
        .cooldown(Duration::from_millis(300))
        .hold_on_failure(true)
        .on_skipped(|key, reason| println!("  [SKIPPED] {}: {}", key, reason))
        .build();

    let publisher = PurgingPublisher::new(MemoryQueue::default(), throttle);

    for round in 1..=4 {
        println!("Publish #{}", round);
        let status = publisher.publish("apm_test", "hello world").await?;
        match status {
            PurgeStatus::Purged => println!("  queue purged\n"),
            PurgeStatus::AlreadyPurging => println!("  purge already running remotely\n"),
            PurgeStatus::Skipped(_) => println!("  purge skipped\n"),
            PurgeStatus::Failed(err) => println!("  purge failed: {}\n", err),
        }
        tokio::time::sleep(Duration::from_millis(200)).await;
    }

    println!(
        "Sent {} messages, issued {} purges",
        publisher.queue().sent.load(Ordering::SeqCst),
        publisher.queue().purges.load(Ordering::SeqCst)
    );
    Ok(())
}
