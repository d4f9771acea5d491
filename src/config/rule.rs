use crate::config::key::deserialize_optional_key;
use evdev::KeyCode as Key;
use serde::Deserialize;

// An element of `rules:`
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Rule {
    #[serde(default, rename = "modifier", deserialize_with = "deserialize_optional_key")]
    pub modifier_trigger: Option<Key>,
    #[serde(default, rename = "key", deserialize_with = "deserialize_optional_key")]
    pub key_trigger: Option<Key>,
    #[serde(default, rename = "to_modifier", deserialize_with = "deserialize_optional_key")]
    pub modifier_output: Option<Key>,
    #[serde(default, rename = "to_key", deserialize_with = "deserialize_optional_key")]
    pub key_output: Option<Key>,
    #[serde(default, rename = "hold", deserialize_with = "deserialize_optional_key")]
    pub hold_output: Option<Key>,
}

// What has to be physically held for a rule to fire. Two rules with the same Trigger
// are the same binding, so the more specific scope replaces the other.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Trigger {
    Single(Key),
    Combination { modifier: Key, key: Key },
}

impl Rule {
    pub fn trigger(&self) -> Option<Trigger> {
        match (self.modifier_trigger, self.key_trigger) {
            (Some(modifier), Some(key)) => Some(Trigger::Combination { modifier, key }),
            (None, Some(key)) | (Some(key), None) => Some(Trigger::Single(key)),
            (None, None) => None,
        }
    }

    pub fn is_combination(&self) -> bool {
        matches!(self.trigger(), Some(Trigger::Combination { .. }))
    }

    // Key that fires a single-key rule. A rule with only `modifier` set fires on that modifier.
    pub fn single_trigger(&self) -> Option<Key> {
        match self.trigger() {
            Some(Trigger::Single(key)) => Some(key),
            _ => None,
        }
    }

    // Modifier first, so that it's pressed first and released last
    pub fn outputs(&self) -> Vec<Key> {
        self.modifier_output.into_iter().chain(self.key_output).collect()
    }

    // A hold/tap key without its own outputs taps itself
    pub fn tap_outputs(&self, key: Key) -> Vec<Key> {
        match self.outputs() {
            outputs if outputs.is_empty() => vec![key],
            outputs => outputs,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.trigger().is_none() {
            return Err("neither `modifier` nor `key` is set".into());
        }
        if self.hold_output.is_some() {
            if self.key_trigger.is_none() {
                return Err("`hold` requires `key`".into());
            }
            if self.is_combination() {
                return Err("`hold` is only supported on single-key rules".into());
            }
        } else if self.outputs().is_empty() {
            return Err("none of `to_modifier`, `to_key` or `hold` is set".into());
        }
        Ok(())
    }
}
