mod hold;
mod matching;
mod state;


use crate::action::Action;
use crate::engine::Engine;
use crate::event::{Event, KeyEvent, KeyValue};
use evdev::KeyCode as Key;
use lazy_static::lazy_static;
use log::debug;
use std::collections::HashMap;
use std::time::Instant;

use self::hold::{HoldTimer, PendingHold};
use self::matching::{Classification, ComboMatch};
use self::state::Binding;

pub struct EventHandler {
    // Shared with the focus listener
    engine: Engine,
    // Physical keys that are down, and what each of them presents downstream
    in_flight: HashMap<Key, Binding>,
    // Keys with a `hold` rule that haven't been classified as tap or hold yet
    hold_timer: HoldTimer,
    // Buffered actions to be dispatched
    actions: Vec<Action>,
}

impl EventHandler {
    pub fn new(engine: Engine) -> EventHandler {
        EventHandler {
            engine,
            in_flight: HashMap::new(),
            hold_timer: HoldTimer::default(),
            actions: vec![],
        }
    }

    // Handle Events and return Actions. This should be the only public method of EventHandler.
    // `now` is when the events were read. Hold/tap decisions are made against it.
    pub fn on_events(&mut self, events: &[Event], now: Instant) -> Vec<Action> {
        for event in events {
            match event {
                Event::KeyEvent(key_event) => self.on_key_event(key_event, now),
                Event::OtherEvents(event) => self.send_action(Action::InputEvent(*event)),
                Event::Resync => self.resync(),
            }
        }
        self.actions.drain(..).collect()
    }

    // Handle EventType::KEY
    fn on_key_event(&mut self, event: &KeyEvent, now: Instant) {
        self.engine.keyboard().record(event, now);
        let key = event.key;
        debug!("=> {}: {:?}", event.value(), &key);

        match event.key_value() {
            KeyValue::Press => self.on_press(key, now),
            KeyValue::Repeat => self.on_repeat(key, now),
            KeyValue::Release => self.on_release(key, now),
        }
    }

    fn on_press(&mut self, key: Key, now: Instant) {
        // Missed release
        if self.in_flight.contains_key(&key) {
            self.on_release(key, now);
        }

        // Another key is pressed while a hold/tap key is undecided: it's a hold
        for hold in self.hold_timer.drain() {
            self.apply_hold(hold);
        }

        let engine = self.engine.clone();
        let rules = engine.active_rule_set();
        match self.classify(key, rules) {
            Classification::Combo(combo) => self.press_combo(key, combo),
            Classification::Single(rule) if rule.hold_output.is_some() => {
                let started_at = self.engine.keyboard().pressed_at(key).unwrap_or(now);
                self.hold_timer.start(key, rule, started_at);
                self.in_flight.insert(key, Binding::Hold);
            }
            Classification::Single(rule) => {
                let keys = rule.outputs();
                for output in &keys {
                    self.send_key(output, KeyValue::Press);
                }
                self.in_flight.insert(key, Binding::plain(keys));
            }
            Classification::Unmapped => {
                self.send_key(&key, KeyValue::Press);
                self.in_flight.insert(key, Binding::plain(vec![key]));
            }
        }
    }

    fn press_combo(&mut self, key: Key, combo: ComboMatch) {
        debug!(
            "combination: {:?} + {:?} -> {:?}",
            combo.target,
            key,
            combo.rule.outputs()
        );
        // Downstream must never see the trigger together with the output
        if self.suppress(combo.holder, combo.target) {
            self.send_key(&combo.target, KeyValue::Release);
        }
        let outputs = combo.rule.outputs();
        for output in &outputs {
            self.send_key(output, KeyValue::Press);
        }
        self.in_flight.insert(
            key,
            Binding::Combo {
                outputs,
                holder: combo.holder,
                restore: combo.target,
                key_side: combo.key_side,
            },
        );
    }

    fn on_repeat(&mut self, key: Key, now: Instant) {
        match self.in_flight.get(&key) {
            Some(Binding::Hold) => {
                let held_long_enough = self
                    .hold_timer
                    .elapsed(key, now)
                    .is_some_and(|elapsed| elapsed >= self.engine.hold_threshold());
                if held_long_enough {
                    if let Some(hold) = self.hold_timer.clear(key) {
                        self.apply_hold(hold);
                    }
                }
            }
            Some(binding) => {
                // A fully suppressed key stays silent
                if let Some(last) = binding.pressed_outputs().last().copied() {
                    self.send_key(&last, KeyValue::Repeat);
                }
            }
            None => self.send_key(&key, KeyValue::Repeat),
        }
    }

    fn on_release(&mut self, key: Key, now: Instant) {
        match self.in_flight.remove(&key) {
            Some(Binding::Plain { keys, suppressed }) => {
                for output in keys.iter().rev().filter(|output| !suppressed.contains(output)) {
                    self.send_key(output, KeyValue::Release);
                }
                self.end_combos_held_by(key);
            }
            Some(Binding::Combo {
                outputs,
                holder,
                restore,
                ..
            }) => {
                for output in outputs.iter().rev() {
                    self.send_key(output, KeyValue::Release);
                }
                // Only while the other half is still held and no other combination needs it released
                if self.restore(holder, restore) {
                    self.send_key(&restore, KeyValue::Press);
                }
            }
            Some(Binding::Hold) => {
                let Some(hold) = self.hold_timer.clear(key) else {
                    return;
                };
                let elapsed = now.saturating_duration_since(hold.started_at);
                if elapsed < self.engine.hold_threshold() {
                    self.tap(&hold.alone());
                } else {
                    debug!("hold: {:?} released after {:?}, no tap", key, elapsed);
                }
            }
            None => self.send_key(&key, KeyValue::Release),
        }
    }

    // The key-half went up before the modifier. The modifier is still physically down,
    // so it goes back to presenting itself.
    fn end_combos_held_by(&mut self, holder: Key) {
        for modifier in self.combos_held_by(holder) {
            let Some(Binding::Combo { outputs, .. }) = self.in_flight.remove(&modifier) else {
                continue;
            };
            debug!("combination: {:?} released, {:?} is plain again", holder, modifier);
            for output in outputs.iter().rev() {
                self.send_key(output, KeyValue::Release);
            }
            self.send_key(&modifier, KeyValue::Press);
            self.in_flight.insert(modifier, Binding::plain(vec![modifier]));
        }
    }

    fn apply_hold(&mut self, hold: PendingHold) {
        let keys = hold.held();
        debug!("hold: {:?} -> {:?}", hold.key, keys);
        for key in &keys {
            self.send_key(key, KeyValue::Press);
        }
        self.in_flight.insert(hold.key, Binding::plain(keys));
    }

    fn tap(&mut self, keys: &[Key]) {
        for key in keys {
            self.send_key(key, KeyValue::Press);
        }
        for key in keys.iter().rev() {
            self.send_key(key, KeyValue::Release);
        }
    }

    // The device dropped events. Nothing that's believed to be held can be trusted anymore.
    fn resync(&mut self) {
        let keys = self.pressed_outputs();
        debug!("resync: releasing {:?}", keys);
        for key in &keys {
            self.send_key(key, KeyValue::Release);
        }
        self.in_flight.clear();
        self.hold_timer.drain();
        self.engine.keyboard().reset();
    }

    fn send_key(&mut self, key: &Key, value: KeyValue) {
        let event = KeyEvent::new(*key, value);
        self.send_action(Action::KeyEvent(event));
    }

    fn send_action(&mut self, action: Action) {
        self.actions.push(action);
    }
}

lazy_static! {
    pub(super) static ref MODIFIER_KEYS: [Key; 8] = [
        // Shift
        Key::KEY_LEFTSHIFT,
        Key::KEY_RIGHTSHIFT,
        // Control
        Key::KEY_LEFTCTRL,
        Key::KEY_RIGHTCTRL,
        // Alt
        Key::KEY_LEFTALT,
        Key::KEY_RIGHTALT,
        // Windows
        Key::KEY_LEFTMETA,
        Key::KEY_RIGHTMETA,
    ];
}
