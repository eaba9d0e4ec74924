//! C4: the action model and registry (§4.4).
//!
//! Concrete actions (mouse click, key press, form fill, ...) live in
//! `demodocus-actions`; this module only defines the contract and the
//! interning registry that gives actions identity for hashing/equality.

use crate::ability::{Axes, UserModel};
use crate::error::Result;
use crate::graph::EdgeMetrics;
use crate::interface::InterfaceAccess;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

/// A named operation a user might perform on an element (§4.4).
pub trait Action: fmt::Debug + Send + Sync {
    /// Identity for hashing/equality/action-name lookups (e.g. by the
    /// fixture access's transition table).
    fn name(&self) -> &str;

    /// Candidate elements on which this action may be attempted.
    fn get_elements(&self, access: &mut dyn InterfaceAccess) -> Result<Vec<String>>;

    /// Whether the explorer may apply this action more than once to the
    /// same element to reveal paginated/cyclic states.
    fn repeatable(&self) -> bool {
        false
    }

    /// An action whose *intent* is to undo this one, used by the reduced
    /// explorer's reverse-chain heuristic. Most actions have none.
    fn reverse(&self) -> Option<Arc<dyn Action>> {
        None
    }

    /// Gate on `user`'s combined PNA score for this action on `element`;
    /// if positive, invoke the interface to perform it and record timing.
    /// Never propagates a plain scoring miss as an `Err` — that becomes a
    /// zero-score `EdgeMetrics` with an error marker (§7).
    fn execute(&self, access: &mut dyn InterfaceAccess, user: &UserModel, element: &str) -> Result<EdgeMetrics> {
        let mut build = crate::build_data::BuildData::default();
        let scored = user.score(Axes::ALL, &mut build, access, element, Some(self.name()))?;
        if scored.combined <= 0.0 {
            let mut metrics = EdgeMetrics::zero_with_error(format!(
                "user '{}' scores 0 on action '{}' at {element}",
                user.name(),
                self.name()
            ));
            metrics.build_data = Some(build);
            return Ok(metrics);
        }

        let mut metrics = access.perform_action_on_element(user, self.name(), element)?;
        metrics.ability_score = metrics.ability_score.max(scored.combined);
        metrics.pcv_score = metrics.pcv_score.max(scored.pcv);
        metrics.nav_score = metrics.nav_score.max(scored.nav);
        metrics.act_score = metrics.act_score.max(scored.act);
        Ok(metrics)
    }
}

/// Interns `Action` instances by name so equality/hashing downstream (e.g.
/// a per-state `elements_to_explore` set keyed by `(action name, element)`)
/// is by identity of the interned instance rather than by re-comparing
/// instance fields (§4.4, §9 "Global state").
#[derive(Default)]
pub struct ActionRegistry {
    by_name: RwLock<HashMap<String, Arc<dyn Action>>>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `action` if no instance with the same name is registered yet,
    /// returning the interned instance either way.
    pub fn intern(&self, action: Arc<dyn Action>) -> Arc<dyn Action> {
        let name = action.name().to_string();
        {
            let guard = self.by_name.read().expect("action registry lock poisoned");
            if let Some(existing) = guard.get(&name) {
                return existing.clone();
            }
        }
        let mut guard = self.by_name.write().expect("action registry lock poisoned");
        guard.entry(name).or_insert(action).clone()
    }

    /// Look up an interned action by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Action>> {
        self.by_name.read().expect("action registry lock poisoned").get(name).cloned()
    }

    /// All interned actions, in no particular order.
    pub fn all(&self) -> Vec<Arc<dyn Action>> {
        self.by_name.read().expect("action registry lock poisoned").values().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Noop(&'static str);
    impl Action for Noop {
        fn name(&self) -> &str {
            self.0
        }
        fn get_elements(&self, _access: &mut dyn InterfaceAccess) -> Result<Vec<String>> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn intern_returns_the_same_instance_for_repeated_names() {
        let registry = ActionRegistry::new();
        let a = registry.intern(Arc::new(Noop("click")));
        let b = registry.intern(Arc::new(Noop("click")));
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn distinct_names_intern_distinct_instances() {
        let registry = ActionRegistry::new();
        let click = registry.intern(Arc::new(Noop("click")));
        let focus = registry.intern(Arc::new(Noop("focus")));
        assert!(!Arc::ptr_eq(&click, &focus));
        assert_eq!(registry.all().len(), 2);
    }
}
