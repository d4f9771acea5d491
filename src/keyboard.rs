use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::time::{Duration, Instant};

use evdev::KeyCode as Key;

use crate::event::{KeyEvent, KeyValue};

// Number of EV_KEY codes the kernel defines (KEY_CNT)
pub const KEY_CNT: usize = 0x300;

const RELEASED: u8 = 0;
const PRESSED: u8 = 1;
const REPEATING: u8 = 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PhysicalState {
    Released,
    Pressed,
    Repeating,
}

impl PhysicalState {
    pub fn is_down(&self) -> bool {
        *self != PhysicalState::Released
    }

    fn from_raw(raw: u8) -> PhysicalState {
        match raw {
            PRESSED => PhysicalState::Pressed,
            REPEATING => PhysicalState::Repeating,
            _ => PhysicalState::Released,
        }
    }
}

// Each field is its own atomic, so a concurrent reader sees a stale value at worst.
#[derive(Default)]
struct KeyStateCell {
    value: AtomicU8,
    // Nanoseconds since `KeyboardState::epoch`
    pressed_at: AtomicU64,
}

/// Physical state of every key code, as reported by the input device.
///
/// Writes only come from the event loop. Reads are safe from any thread.
pub struct KeyboardState {
    epoch: Instant,
    keys: Vec<KeyStateCell>,
}

impl KeyboardState {
    pub fn new() -> KeyboardState {
        KeyboardState {
            epoch: Instant::now(),
            keys: (0..KEY_CNT).map(|_| KeyStateCell::default()).collect(),
        }
    }

    // Released -> Pressed -> Repeating (-> Repeating) -> Released
    pub fn record(&self, event: &KeyEvent, now: Instant) {
        let Some(cell) = self.keys.get(event.code() as usize) else {
            return;
        };
        let current = cell.value.load(Ordering::Acquire);
        let next = match (event.key_value(), current) {
            (KeyValue::Release, _) => RELEASED,
            // A repeat for a key we never saw going down still starts from Pressed
            (KeyValue::Press | KeyValue::Repeat, RELEASED) => {
                let nanos = now.saturating_duration_since(self.epoch).as_nanos();
                cell.pressed_at.store(u64::try_from(nanos).unwrap_or(u64::MAX), Ordering::Release);
                PRESSED
            }
            (KeyValue::Press, current) => current,
            (KeyValue::Repeat, _) => REPEATING,
        };
        cell.value.store(next, Ordering::Release);
    }

    pub fn state_of(&self, key: Key) -> PhysicalState {
        match self.keys.get(key.code() as usize) {
            Some(cell) => PhysicalState::from_raw(cell.value.load(Ordering::Acquire)),
            None => PhysicalState::Released,
        }
    }

    pub fn is_down(&self, key: Key) -> bool {
        self.state_of(key).is_down()
    }

    // When the key last went from Released to Pressed. None while it's released.
    pub fn pressed_at(&self, key: Key) -> Option<Instant> {
        let cell = self.keys.get(key.code() as usize)?;
        if cell.value.load(Ordering::Acquire) == RELEASED {
            return None;
        }
        let nanos = cell.pressed_at.load(Ordering::Acquire);
        Some(self.epoch + Duration::from_nanos(nanos))
    }

    pub fn pressed_keys(&self) -> Vec<Key> {
        self.keys
            .iter()
            .enumerate()
            .filter(|(_, cell)| cell.value.load(Ordering::Acquire) != RELEASED)
            .map(|(code, _)| Key::new(code as u16))
            .collect()
    }

    // The physical keyboard's true state is unknown after dropped events
    pub fn reset(&self) {
        for cell in &self.keys {
            cell.value.store(RELEASED, Ordering::Release);
        }
    }
}

impl std::fmt::Debug for KeyboardState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyboardState")
            .field("pressed_keys", &self.pressed_keys())
            .finish()
    }
}

impl Default for KeyboardState {
    fn default() -> Self {
        KeyboardState::new()
    }
}
