use crate::keyboard::KeyboardState;
use crate::rule_table::{RuleSet, RuleTable};
use crate::scope::ScopeSelector;
use std::sync::Arc;
use std::time::Duration;

/// Tables shared by the event loop and the focus listener. Cloning is cheap and every clone
/// sees the same state.
#[derive(Clone, Debug)]
pub struct Engine {
    keyboard: Arc<KeyboardState>,
    scope: Arc<ScopeSelector>,
    hold_threshold: Duration,
}

impl Engine {
    pub fn new(table: RuleTable, hold_threshold: Duration) -> Engine {
        Engine {
            keyboard: Arc::new(KeyboardState::new()),
            scope: Arc::new(ScopeSelector::new(table)),
            hold_threshold,
        }
    }

    pub fn on_focus_changed(&self, window_class: &str) {
        self.scope.on_focus_changed(window_class);
    }

    pub fn active_rule_set(&self) -> &RuleSet {
        self.scope.active_rule_set()
    }

    pub fn keyboard(&self) -> &KeyboardState {
        &self.keyboard
    }

    pub fn hold_threshold(&self) -> Duration {
        self.hold_threshold
    }
}
