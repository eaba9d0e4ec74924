//! Concrete `Action` implementations outside the core (§4.4).
//!
//! `demodocus-core` defines the `Action` contract and the registry that
//! interns instances by name; this crate supplies mouse, keyboard, and
//! form-fill actions that a concrete `InterfaceAccess` (e.g.
//! `demodocus-access-fixture`, or a real browser driver) executes against.

mod xpath;

pub mod form_fill;
pub mod keyboard;
pub mod mouse;

#[cfg(test)]
mod test_support;

pub use form_fill::FormFillAction;
pub use keyboard::KeyPressAction;
pub use mouse::MouseClickAction;
pub use xpath::{collect_elements, find, ElementSnapshot};

use demodocus_core::{Action, ActionRegistry};
use std::sync::Arc;

/// The fixed, class-level action inventory a web `InterfaceAccess` offers:
/// mouse click, `Tab`/arrow-key navigation, `Enter` activation, and form
/// fill, all interned into one registry (§4.4, §4.7 `actions()`).
pub fn register_default_actions(registry: &ActionRegistry) -> Vec<Arc<dyn Action>> {
    let actions: Vec<Arc<dyn Action>> = vec![
        Arc::new(MouseClickAction::new()),
        Arc::new(KeyPressAction::new("Tab")),
        Arc::new(KeyPressAction::new("ArrowDown")),
        Arc::new(KeyPressAction::new("ArrowUp")),
        Arc::new(KeyPressAction::activate()),
        Arc::new(FormFillAction::new()),
    ];
    actions.into_iter().map(|a| registry.intern(a)).collect()
}
