//! Key press: keyboard-driven activation and navigation (§4.4).

use crate::xpath::{self, ElementSnapshot};
use demodocus_core::error::Result;
use demodocus_core::interface::InterfaceAccess;
use demodocus_core::web::ability::KEY_PRESS_PREFIX;
use demodocus_core::Action;

/// Keys whose repeated presses on the same element reveal further states
/// (cycling focus through a list, paging a carousel) rather than a
/// one-shot activation (§4.4).
const REPEATABLE_KEYS: &[&str] = &["tab", "arrowdown", "arrowup", "arrowleft", "arrowright"];

/// A named key press, claimed by `KeyboardAbility` via the shared
/// `key_press:` prefix so each distinct key interns as its own action
/// (§4.4, §4.5). [`KeyPressAction::activate`] presses `Enter` and targets
/// the same elements `MouseClickAction` would click; [`KeyPressAction::new`]
/// covers `Tab`/arrow-key navigation of focusable widgets.
#[derive(Debug, Clone)]
pub struct KeyPressAction {
    key: String,
    name: String,
    repeatable: bool,
}

impl KeyPressAction {
    /// A press of `key`. The action name lowercases `key` so `"Tab"` and
    /// `"tab"` intern to the same action.
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        let lower = key.to_ascii_lowercase();
        let repeatable = REPEATABLE_KEYS.contains(&lower.as_str());
        Self { name: format!("{KEY_PRESS_PREFIX}{lower}"), key, repeatable }
    }

    /// Pressing `Enter`: the keyboard equivalent of a mouse click on a
    /// focused control.
    pub fn activate() -> Self {
        Self::new("Enter")
    }

    /// The literal key this instance sends (e.g. `"Tab"`, `"Enter"`).
    pub fn key(&self) -> &str {
        &self.key
    }

    fn is_candidate(el: &ElementSnapshot) -> bool {
        if el.is_disabled() {
            return false;
        }
        if let Some(tabindex) = el.attr("tabindex") {
            return tabindex != "-1";
        }
        matches!(el.tag.as_str(), "a" | "button" | "input" | "select" | "textarea" | "summary") || el.has_attr("role")
    }
}

impl Action for KeyPressAction {
    fn name(&self) -> &str {
        &self.name
    }

    fn get_elements(&self, access: &mut dyn InterfaceAccess) -> Result<Vec<String>> {
        let data = access.state_data()?;
        let elements = xpath::collect_elements(&data.raw_dom);
        Ok(elements.into_iter().filter(Self::is_candidate).map(|e| e.xpath).collect())
    }

    fn repeatable(&self) -> bool {
        self.repeatable
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::DomFixture;

    #[test]
    fn name_is_prefixed_and_lowercased() {
        let action = KeyPressAction::new("ArrowDown");
        assert_eq!(action.name(), "key_press:arrowdown");
        assert_eq!(action.key(), "ArrowDown");
    }

    #[test]
    fn arrow_and_tab_keys_are_repeatable_enter_is_not() {
        assert!(KeyPressAction::new("Tab").repeatable());
        assert!(KeyPressAction::new("ArrowUp").repeatable());
        assert!(!KeyPressAction::activate().repeatable());
    }

    #[test]
    fn finds_tabbable_elements_and_skips_negative_tabindex() {
        let html = r#"
            <html><body>
                <a href="/x">link</a>
                <div tabindex="0">widget</div>
                <div tabindex="-1">not tabbable</div>
                <span role="tab">tab</span>
                <p>plain text</p>
            </body></html>
        "#;
        let mut fixture = DomFixture(html.to_string());
        let action = KeyPressAction::activate();
        let elements = action.get_elements(&mut fixture).unwrap();
        assert_eq!(elements.len(), 3);
    }
}
