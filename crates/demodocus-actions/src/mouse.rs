//! Mouse click: pointer-driven activation of clickable elements (§4.4).

use crate::xpath::{self, ElementSnapshot};
use demodocus_core::error::Result;
use demodocus_core::interface::InterfaceAccess;
use demodocus_core::web::ability::MOUSE_CLICK_ACTION;
use demodocus_core::Action;

/// Tags `MouseClickAction` always considers clickable.
const CLICKABLE_TAGS: &[&str] = &["button", "a", "summary"];
/// ARIA roles that make an otherwise-generic element clickable.
const CLICKABLE_ROLES: &[&str] = &["button", "link", "tab", "menuitem", "checkbox", "radio"];
/// `<input type=...>` values that behave like a button under the mouse.
const CLICKABLE_INPUT_TYPES: &[&str] = &["button", "submit", "reset", "checkbox", "radio", "image"];

/// Pointer-driven click, matching
/// `demodocus_core::web::ability::MouseAbility`'s claimed action name.
///
/// Not repeatable and has no reverse: a click on a generic clickable
/// element isn't assumed to be self-inverting. A page that happens to
/// implement a toggle surfaces that as a repeat/reverse cycle only through
/// the reduced explorer's heuristic (§4.8), never as a property declared
/// by this action.
#[derive(Debug, Default)]
pub struct MouseClickAction;

impl MouseClickAction {
    pub fn new() -> Self {
        Self
    }

    fn is_candidate(el: &ElementSnapshot) -> bool {
        if el.is_disabled() {
            return false;
        }
        if CLICKABLE_TAGS.contains(&el.tag.as_str()) {
            return true;
        }
        if el.tag == "input" {
            return el
                .attr("type")
                .map(|ty| CLICKABLE_INPUT_TYPES.contains(&ty.to_ascii_lowercase().as_str()))
                .unwrap_or(false);
        }
        if el.has_attr("onclick") {
            return true;
        }
        el.attr("role")
            .map(|role| CLICKABLE_ROLES.contains(&role.to_ascii_lowercase().as_str()))
            .unwrap_or(false)
    }
}

impl Action for MouseClickAction {
    fn name(&self) -> &str {
        MOUSE_CLICK_ACTION
    }

    fn get_elements(&self, access: &mut dyn InterfaceAccess) -> Result<Vec<String>> {
        let data = access.state_data()?;
        let elements = xpath::collect_elements(&data.raw_dom);
        Ok(elements.into_iter().filter(Self::is_candidate).map(|e| e.xpath).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::DomFixture;

    #[test]
    fn finds_buttons_links_and_ignores_disabled() {
        let html = r#"
            <html><body>
                <button>click me</button>
                <a href="/x">link</a>
                <button disabled>nope</button>
                <div onclick="go()">div click</div>
                <span role="button">span button</span>
                <p>not clickable</p>
            </body></html>
        "#;
        let mut fixture = DomFixture(html.to_string());
        let action = MouseClickAction::new();
        let elements = action.get_elements(&mut fixture).unwrap();
        assert_eq!(elements.len(), 4);
    }

    #[test]
    fn input_type_gates_clickability() {
        let html = r#"
            <html><body>
                <input type="submit" value="go">
                <input type="text">
            </body></html>
        "#;
        let mut fixture = DomFixture(html.to_string());
        let action = MouseClickAction::new();
        let elements = action.get_elements(&mut fixture).unwrap();
        assert_eq!(elements.len(), 1);
    }

    #[test]
    fn not_repeatable_and_has_no_reverse() {
        let action = MouseClickAction::new();
        assert!(!action.repeatable());
        assert!(action.reverse().is_none());
    }
}
