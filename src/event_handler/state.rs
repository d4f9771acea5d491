use evdev::KeyCode as Key;

use super::{EventHandler, MODIFIER_KEYS};

// What a physically held key currently presents downstream
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Binding {
    // Passed through or remapped by a single-key rule. `suppressed` keys were released
    // downstream by a combination and are pressed again when it ends.
    Plain { keys: Vec<Key>, suppressed: Vec<Key> },
    // Fired a combination while `holder` presented `restore`.
    // Unless `key_side`, releasing `holder` ends it.
    Combo {
        outputs: Vec<Key>,
        holder: Key,
        restore: Key,
        key_side: bool,
    },
    // Waiting for the tap/hold decision. Nothing was pressed yet.
    Hold,
}

impl Binding {
    pub fn plain(keys: Vec<Key>) -> Binding {
        Binding::Plain {
            keys,
            suppressed: vec![],
        }
    }

    pub fn presents(&self, key: Key) -> bool {
        matches!(self, Binding::Plain { keys, .. } if keys.contains(&key))
    }

    // Keys that are down downstream because of this binding, in press order
    pub fn pressed_outputs(&self) -> Vec<Key> {
        match self {
            Binding::Plain { keys, suppressed } => keys.iter().filter(|key| !suppressed.contains(key)).copied().collect(),
            Binding::Combo { outputs, .. } => outputs.clone(),
            Binding::Hold => vec![],
        }
    }
}

impl EventHandler {
    // Physical key whose binding presents `code`, ignoring `except`.
    // The lowest key code wins so that the choice doesn't depend on hashing.
    pub(super) fn presenter_of(&self, code: Key, except: Key) -> Option<Key> {
        self.in_flight
            .iter()
            .filter(|(physical, binding)| **physical != except && binding.presents(code))
            .map(|(physical, _)| *physical)
            .min()
    }

    // Returns false if `target` was already released downstream
    pub(super) fn suppress(&mut self, holder: Key, target: Key) -> bool {
        match self.in_flight.get_mut(&holder) {
            Some(Binding::Plain { suppressed, .. }) if !suppressed.contains(&target) => {
                suppressed.push(target);
                true
            }
            _ => false,
        }
    }

    // Undo `suppress` once no combination needs `target` released anymore.
    // Returns true if `target` should be pressed again.
    pub(super) fn restore(&mut self, holder: Key, target: Key) -> bool {
        let still_used = self.in_flight.values().any(|binding| {
            matches!(binding, Binding::Combo { holder: h, restore: r, .. } if *h == holder && *r == target)
        });
        if still_used || !self.engine.keyboard().is_down(holder) {
            return false;
        }
        match self.in_flight.get_mut(&holder) {
            Some(Binding::Plain { suppressed, .. }) => {
                let before = suppressed.len();
                suppressed.retain(|key| *key != target);
                suppressed.len() != before
            }
            _ => false,
        }
    }

    // Modifier-side combinations whose key-half is `holder`, lowest physical key first
    pub(super) fn combos_held_by(&self, holder: Key) -> Vec<Key> {
        let mut keys: Vec<Key> = self
            .in_flight
            .iter()
            .filter(|(_, binding)| {
                matches!(binding, Binding::Combo { holder: h, key_side: false, .. } if *h == holder)
            })
            .map(|(physical, _)| *physical)
            .collect();
        keys.sort_by_key(|key| key.code());
        keys
    }

    // Every key still down downstream, modifiers last
    pub(super) fn pressed_outputs(&self) -> Vec<Key> {
        let mut keys: Vec<Key> = vec![];
        for binding in self.in_flight.values() {
            for key in binding.pressed_outputs() {
                if !keys.contains(&key) {
                    keys.push(key);
                }
            }
        }
        keys.sort_by_key(|key| (MODIFIER_KEYS.contains(key), key.code()));
        keys
    }
}
