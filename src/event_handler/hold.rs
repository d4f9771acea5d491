use evdev::KeyCode as Key;
use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::config::rule::Rule;

// A key with a `hold` rule that is down, but hasn't decided between tap and hold yet
#[derive(Clone, Copy, Debug)]
pub struct PendingHold {
    pub key: Key,
    pub rule: Rule,
    pub started_at: Instant,
}

impl PendingHold {
    // Keys to press while the hold applies
    pub fn held(&self) -> Vec<Key> {
        self.rule.hold_output.into_iter().collect()
    }

    // Keys to tap when released before the threshold
    pub fn alone(&self) -> Vec<Key> {
        self.rule.tap_outputs(self.key)
    }
}

// Nothing fires on its own. The threshold is only compared when the next event arrives.
#[derive(Debug, Default)]
pub struct HoldTimer {
    pending: HashMap<Key, PendingHold>,
}

impl HoldTimer {
    pub fn start(&mut self, key: Key, rule: Rule, started_at: Instant) {
        self.pending.insert(
            key,
            PendingHold {
                key,
                rule,
                started_at,
            },
        );
    }

    pub fn elapsed(&self, key: Key, now: Instant) -> Option<Duration> {
        self.pending
            .get(&key)
            .map(|hold| now.saturating_duration_since(hold.started_at))
    }

    pub fn clear(&mut self, key: Key) -> Option<PendingHold> {
        self.pending.remove(&key)
    }

    // Every pending hold, oldest first
    pub fn drain(&mut self) -> Vec<PendingHold> {
        let mut holds: Vec<PendingHold> = self.pending.drain().map(|(_, hold)| hold).collect();
        holds.sort_by_key(|hold| hold.started_at);
        holds
    }
}
