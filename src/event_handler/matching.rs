use evdev::KeyCode as Key;
use log::debug;

use super::EventHandler;
use crate::config::rule::Rule;
use crate::rule_table::RuleSet;

// A combination that fires on this press
#[derive(Clone, Copy, Debug)]
pub struct ComboMatch {
    pub rule: Rule,
    // Physical key presenting the other half of the trigger
    pub holder: Key,
    // The other half itself, released downstream while the combination is active
    pub target: Key,
    // Fired by the key-half, so it ends when the pressed key goes up.
    // Otherwise the modifier was pressed last and the combination ends with `holder`.
    pub key_side: bool,
}

#[derive(Debug)]
pub enum Classification {
    Combo(ComboMatch),
    Single(Rule),
    Unmapped,
}

impl EventHandler {
    // Decide what a newly pressed key means in the given rule set
    pub(super) fn classify(&self, key: Key, rules: &RuleSet) -> Classification {
        let mut matches: Vec<ComboMatch> = vec![];

        // The modifier was already down when the key came
        for rule in rules.key_side_rules(key) {
            let Some(target) = rule.modifier_trigger else { continue };
            if let Some(holder) = self.presenter_of(target, key) {
                matches.push(ComboMatch {
                    rule: *rule,
                    holder,
                    target,
                    key_side: true,
                });
            }
        }
        // The key was already down when the modifier came
        for rule in rules.modifier_side_rules(key) {
            let Some(target) = rule.key_trigger else { continue };
            if let Some(holder) = self.presenter_of(target, key) {
                matches.push(ComboMatch {
                    rule: *rule,
                    holder,
                    target,
                    key_side: false,
                });
            }
        }

        match matches.as_slice() {
            [] => match rules.single_rule(key) {
                Some(rule) => Classification::Single(*rule),
                None => Classification::Unmapped,
            },
            [combo] => Classification::Combo(*combo),
            _ => {
                debug!(
                    "ambiguous: {:?} matches {} combinations in scope '{}'",
                    key,
                    matches.len(),
                    rules.scope_name
                );
                Classification::Unmapped
            }
        }
    }
}
