//! Instance-owned, per-key throttle state.

use crate::outcome::SkipReason;
use hashbrown::HashMap;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Observable state of one key.
///
/// `CooldownActive` is not stored: it is recomputed from the last recorded
/// action, so it decays to `Idle` on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThrottleState {
    Idle,
    CooldownActive,
    ActionInFlight,
}

#[derive(Debug, Default)]
struct KeyEntry {
    last_action: Option<Instant>,
    in_flight: bool,
}

impl KeyEntry {
    fn remaining(&self, now: Instant, cooldown: Duration) -> Option<Duration> {
        let last = self.last_action?;
        let elapsed = now.saturating_duration_since(last);
        (elapsed < cooldown).then(|| cooldown - elapsed)
    }
}

/// Map from resource key to its throttle state.
///
/// The outer lock is held only to find or create a key's entry; checks and
/// updates for a key run under that key's own lock, so unrelated keys never
/// contend. Entries live as long as the store.
#[derive(Debug, Default)]
pub struct ThrottleStore {
    keys: Mutex<HashMap<String, Arc<Mutex<KeyEntry>>>>,
}

impl ThrottleStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&self, key: &str) -> Arc<Mutex<KeyEntry>> {
        let mut keys = self.keys.lock();
        if let Some(entry) = keys.get(key) {
            return Arc::clone(entry);
        }
        Arc::clone(keys.entry(key.to_owned()).or_default())
    }

    /// Check-then-claim for `key`, atomic with respect to other callers.
    ///
    /// On success the key is marked in flight until the returned permit is
    /// recorded, released, or dropped.
    pub(crate) fn begin(
        &self,
        key: &str,
        now: Instant,
        cooldown: Duration,
    ) -> Result<Permit, SkipReason> {
        let entry = self.entry(key);
        {
            let mut state = entry.lock();
            if state.in_flight {
                return Err(SkipReason::ActionInFlight);
            }
            if let Some(remaining) = state.remaining(now, cooldown) {
                return Err(SkipReason::CooldownActive { remaining });
            }
            state.in_flight = true;
        }
        Ok(Permit {
            entry,
            armed: true,
        })
    }

    /// When the last action for `key` was recorded.
    pub fn last_action(&self, key: &str) -> Option<Instant> {
        let entry = self.keys.lock().get(key).map(Arc::clone)?;
        let last = entry.lock().last_action;
        last
    }

    /// State of `key` at `now` for the given cooldown.
    pub fn state(&self, key: &str, now: Instant, cooldown: Duration) -> ThrottleState {
        let Some(entry) = self.keys.lock().get(key).map(Arc::clone) else {
            return ThrottleState::Idle;
        };
        let state = entry.lock();
        if state.in_flight {
            ThrottleState::ActionInFlight
        } else if state.remaining(now, cooldown).is_some() {
            ThrottleState::CooldownActive
        } else {
            ThrottleState::Idle
        }
    }

    /// Number of keys ever referenced.
    pub fn len(&self) -> usize {
        self.keys.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.lock().is_empty()
    }
}

/// Exclusive right to run the action for one key.
///
/// Dropping an unfinished permit (e.g. the caller's future was cancelled)
/// clears the in-flight mark and leaves the previous record untouched.
#[derive(Debug)]
pub(crate) struct Permit {
    entry: Arc<Mutex<KeyEntry>>,
    armed: bool,
}

impl Permit {
    /// Starts the cooldown window at `at`.
    pub(crate) fn record(mut self, at: Instant) {
        let mut state = self.entry.lock();
        state.last_action = Some(at);
        state.in_flight = false;
        self.armed = false;
    }

    /// Finishes without advancing the record.
    pub(crate) fn release(mut self) {
        self.entry.lock().in_flight = false;
        self.armed = false;
    }
}

impl Drop for Permit {
    fn drop(&mut self) {
        if self.armed {
            self.entry.lock().in_flight = false;
        }
    }
}
