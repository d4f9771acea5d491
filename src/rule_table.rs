use crate::config::rule::{Rule, Trigger};
use crate::config::window::WindowClass;
use crate::config::Config;
use anyhow::bail;
use evdev::KeyCode as Key;
use std::collections::HashMap;

pub const DEFAULT_SCOPE: &str = "default";

#[derive(Debug)]
pub struct RuleSet {
    pub scope_name: String,
    pub rules: Vec<Rule>,
}

impl RuleSet {
    pub fn new(scope_name: &str, rules: Vec<Rule>) -> anyhow::Result<RuleSet> {
        let mut triggers: HashMap<Trigger, usize> = HashMap::new();
        for (index, rule) in rules.iter().enumerate() {
            if let Err(message) = rule.validate() {
                bail!("invalid rule #{} in scope '{}': {}", index, scope_name, message);
            }
            // validate() guarantees a trigger
            let Some(trigger) = rule.trigger() else { continue };
            if let Some(first) = triggers.insert(trigger, index) {
                bail!(
                    "rule #{} in scope '{}' has the same trigger as rule #{}: {:?}",
                    index,
                    scope_name,
                    first,
                    trigger
                );
            }
        }
        Ok(RuleSet {
            scope_name: scope_name.to_string(),
            rules,
        })
    }

    // Window rules first; default rules only where the window doesn't bind the same trigger
    fn overlay(window: &RuleSet, default: &RuleSet) -> RuleSet {
        let mut rules = window.rules.clone();
        for rule in &default.rules {
            if !window.rules.iter().any(|r| r.trigger() == rule.trigger()) {
                rules.push(*rule);
            }
        }
        RuleSet {
            scope_name: window.scope_name.clone(),
            rules,
        }
    }

    // Single-key rule fired by `key` alone
    pub fn single_rule(&self, key: Key) -> Option<&Rule> {
        self.rules.iter().find(|rule| rule.single_trigger() == Some(key))
    }

    // Combination rules where `key` is the key_trigger
    pub fn key_side_rules(&self, key: Key) -> impl Iterator<Item = &Rule> {
        self.rules
            .iter()
            .filter(move |rule| rule.is_combination() && rule.key_trigger == Some(key))
    }

    // Combination rules where `key` is the modifier_trigger
    pub fn modifier_side_rules(&self, key: Key) -> impl Iterator<Item = &Rule> {
        self.rules
            .iter()
            .filter(move |rule| rule.is_combination() && rule.modifier_trigger == Some(key))
    }
}

/// All rule sets known at startup. Index 0 is the default set, index `i + 1` is the `i`-th
/// window set already merged with the default one, so that switching scopes never allocates.
#[derive(Debug)]
pub struct RuleTable {
    sets: Vec<RuleSet>,
    classes: Vec<WindowClass>,
}

impl RuleTable {
    pub fn new(config: &Config) -> anyhow::Result<RuleTable> {
        let default = RuleSet::new(DEFAULT_SCOPE, config.rules.clone())?;

        let mut sets = vec![];
        let mut classes = vec![];
        for window in &config.windows {
            let scope_name = window.class.to_string();
            let window_set = RuleSet::new(&scope_name, window.rules.clone())?;
            sets.push(RuleSet::overlay(&window_set, &default));
            classes.push(window.class.clone());
        }
        sets.insert(0, default);

        Ok(RuleTable { sets, classes })
    }

    // First matching window wins; an unknown or empty class selects the default set
    pub fn scope_index(&self, window_class: &str) -> usize {
        if window_class.is_empty() {
            return 0;
        }
        self.classes
            .iter()
            .position(|class| class.matches(window_class))
            .map_or(0, |index| index + 1)
    }

    pub fn rule_set(&self, index: usize) -> &RuleSet {
        self.sets.get(index).unwrap_or(&self.sets[0])
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }
}
