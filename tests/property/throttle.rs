//! Property tests for the cooldown throttle.
//!
//! Invariants tested:
//! - Executed actions for one key are at least one cooldown apart
//! - A call is skipped exactly when the previous record is younger than the cooldown
//! - Plain failures never move the record unless hold_on_failure is set

use super::paused_runtime;
use outbound_resilience_throttle::{ActionOutcome, CooldownThrottle, Decision};
use proptest::prelude::*;
use std::time::Duration;
use tokio::time::{Instant, advance};

#[derive(Debug, Clone, Copy)]
enum Kind {
    Completed,
    InProgress,
    Overloaded,
    Failed,
}

fn kind() -> impl Strategy<Value = Kind> {
    prop_oneof![
        Just(Kind::Completed),
        Just(Kind::InProgress),
        Just(Kind::Overloaded),
        Just(Kind::Failed),
    ]
}

fn outcome(kind: Kind) -> ActionOutcome<(), String> {
    match kind {
        Kind::Completed => ActionOutcome::Completed(()),
        Kind::InProgress => ActionOutcome::InProgress,
        Kind::Overloaded => ActionOutcome::Overloaded("rate exceeded".to_string()),
        Kind::Failed => ActionOutcome::Failed("denied".to_string()),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property: with completed actions only, invocations for one key are
    /// spaced at least one cooldown apart, and every allowed call runs.
    #[test]
    fn executed_actions_are_a_cooldown_apart(
        cooldown_s in 1u64..=120,
        gaps in prop::collection::vec(0u64..=90, 1..30),
    ) {
        let rt = paused_runtime();
        rt.block_on(async {
            let cooldown = Duration::from_secs(cooldown_s);
            let throttle = CooldownThrottle::builder().cooldown(cooldown).build();
            let mut last_run: Option<Instant> = None;

            for gap in gaps {
                advance(Duration::from_secs(gap)).await;
                let now = Instant::now();
                let decision = throttle
                    .try_act("apm_test", || async { ActionOutcome::<(), String>::Completed(()) })
                    .await
                    .unwrap();

                let expected_run = last_run.is_none_or(|last| now - last >= cooldown);
                prop_assert_eq!(decision.is_executed(), expected_run);
                if expected_run {
                    last_run = Some(now);
                }
            }
            Ok(())
        })?;
    }

    /// Property: the record moves on Completed, InProgress and Overloaded;
    /// on Failed it moves only when hold_on_failure is set.
    #[test]
    fn record_follows_failure_policy(
        hold_on_failure in any::<bool>(),
        steps in prop::collection::vec((kind(), 0u64..=40), 1..25),
    ) {
        let rt = paused_runtime();
        rt.block_on(async {
            let cooldown = Duration::from_secs(30);
            let throttle = CooldownThrottle::builder()
                .cooldown(cooldown)
                .hold_on_failure(hold_on_failure)
                .build();
            let mut record: Option<Instant> = None;

            for (kind, gap) in steps {
                advance(Duration::from_secs(gap)).await;
                let now = Instant::now();
                let allowed = record.is_none_or(|last| now - last >= cooldown);

                let result = throttle.try_act("apm_test", || async { outcome(kind) }).await;

                if !allowed {
                    prop_assert!(matches!(result, Ok(Decision::Skipped(_))));
                    continue;
                }
                let moves = match kind {
                    Kind::Completed | Kind::InProgress | Kind::Overloaded => true,
                    Kind::Failed => hold_on_failure,
                };
                if moves {
                    record = Some(now);
                }
                prop_assert_eq!(throttle.last_action("apm_test"), record);
            }
            Ok(())
        })?;
    }
}
