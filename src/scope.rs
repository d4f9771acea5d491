use crate::rule_table::{RuleSet, RuleTable};
use log::debug;
use std::sync::atomic::{AtomicUsize, Ordering};

// Written by the focus listener, read by the event loop. The class name is resolved to an
// index on the writer side, so readers only ever load a single word.
#[derive(Debug)]
pub struct ScopeSelector {
    table: RuleTable,
    active: AtomicUsize,
}

impl ScopeSelector {
    pub fn new(table: RuleTable) -> ScopeSelector {
        ScopeSelector {
            table,
            active: AtomicUsize::new(0),
        }
    }

    pub fn on_focus_changed(&self, window_class: &str) -> usize {
        let index = self.table.scope_index(window_class);
        let previous = self.active.swap(index, Ordering::Release);
        if previous != index {
            debug!("scope: {} ({})", self.table.rule_set(index).scope_name, window_class);
        }
        index
    }

    pub fn active_rule_set(&self) -> &RuleSet {
        self.table.rule_set(self.active.load(Ordering::Acquire))
    }
}
