//! Form fill: a rule-ordered attempt to complete and submit a form (§4.4).
//!
//! Grounded in the original implementation's `demodocusfw/web/action/form.py`:
//! find a submit control and its associated input fields, gate access to
//! the submit control, then try each input's type-appropriate candidate
//! values in rule order until a combination produces a successful
//! submission edge.

use crate::xpath::{self, ElementSnapshot};
use demodocus_core::ability::{Axes, UserModel};
use demodocus_core::build_data::BuildData;
use demodocus_core::error::Result;
use demodocus_core::interface::InterfaceAccess;
use demodocus_core::web::ability::{FORM_FILL_ACTION, MOUSE_CLICK_ACTION};
use demodocus_core::Action;
use demodocus_core::EdgeMetrics;

/// `<input type=...>` values this action never tries to fill in (they are
/// either the submit control itself or not yet handled).
const UNFILLABLE_INPUT_TYPES: &[&str] = &["submit", "button", "reset", "image", "file", "hidden"];

/// Bounded total number of submit attempts per `execute` call, so a form
/// with several fields and several candidate values each cannot blow up
/// the crawl (§4.8 concerns about bounded work apply here too).
const MAX_ATTEMPTS: usize = 24;

/// Tries a rule-ordered list of candidate values per field, one field at a
/// time, stopping at the first value that produces a successful
/// submission edge (§4.4). Not repeatable; has no reverse — submitting a
/// form isn't generally self-undoing.
#[derive(Debug, Default)]
pub struct FormFillAction;

impl FormFillAction {
    pub fn new() -> Self {
        Self
    }

    fn is_container(el: &ElementSnapshot, all: &[ElementSnapshot]) -> bool {
        if el.tag == "form" {
            return true;
        }
        let descendants = Self::descendants(el, all);
        let has_input = descendants.iter().any(|e| e.tag == "input");
        let has_button = descendants
            .iter()
            .any(|e| e.tag == "button" || (e.tag == "input" && e.attr("type") == Some("submit")));
        has_input && has_button
    }

    /// `all`'s elements whose xpath nests under `container`'s, per the
    /// child-prefix-extension scheme [`xpath::collect_elements`] assigns
    /// (every descendant's xpath is built by appending onto its parent's).
    fn descendants<'a>(container: &ElementSnapshot, all: &'a [ElementSnapshot]) -> Vec<&'a ElementSnapshot> {
        let marker = format!("{}[", container.xpath);
        all.iter().filter(|e| e.xpath != container.xpath && e.xpath.starts_with(&marker)).collect()
    }

    fn find_submit<'a>(descendants: &[&'a ElementSnapshot]) -> Option<&'a ElementSnapshot> {
        descendants
            .iter()
            .find(|e| !e.is_disabled() && (e.tag == "button" || (e.tag == "input" && e.attr("type") == Some("submit"))))
            .copied()
    }

    fn find_fields<'a>(descendants: &[&'a ElementSnapshot]) -> Vec<&'a ElementSnapshot> {
        descendants
            .iter()
            .filter(|e| e.tag == "input" && !e.is_disabled())
            .filter(|e| {
                let ty = e.attr("type").unwrap_or("text").to_ascii_lowercase();
                !UNFILLABLE_INPUT_TYPES.contains(&ty.as_str())
            })
            .copied()
            .collect()
    }

    /// Rule-ordered candidate values for one field, keyed by input `type`
    /// and refined by an id/name/placeholder hint, mirroring the original's
    /// `form_fill_rules` table.
    fn candidates_for(field: &ElementSnapshot) -> Vec<String> {
        let ty = field.attr("type").unwrap_or("text").to_ascii_lowercase();
        let hint = [field.attr("id"), field.attr("name"), field.attr("placeholder")]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ")
            .to_ascii_lowercase();

        let strs = |vals: &[&str]| vals.iter().map(|s| s.to_string()).collect::<Vec<_>>();

        match ty.as_str() {
            "checkbox" | "radio" => strs(&["true", "false"]),
            "date" => strs(&["0001-01-01", "1979-01-01"]),
            "month" => strs(&["0001-01", "1979-01"]),
            "week" => strs(&["0001-W01", "1979-W01"]),
            "number" => strs(&["-1", "0", "2", "100", "1295", "12.95"]),
            "tel" => strs(&["555-555-5555"]),
            "email" => strs(&["bob@example.com"]),
            "password" => strs(&["Mbuasd$1fd", "hjfsdhskfd", "$$$orddkD21"]),
            "url" => strs(&["http://www.example.com/"]),
            "search" => strs(&["testText"]),
            "text" | "" => {
                if hint.contains("email") {
                    strs(&["bob@example.com"])
                } else if hint.contains("phone") || hint.contains("tel") {
                    strs(&["5555555555", "555-555-5555", "(555)-555-5555"])
                } else if hint.contains("zip") {
                    strs(&["55555"])
                } else if hint.contains("date") || hint.contains("day") {
                    strs(&["01/01/1979", "1979/01/01", "01-01-1979"])
                } else if hint.contains("time") {
                    strs(&["10:00", "10:00AM", "10AM"])
                } else if hint.contains("name") || hint.contains("user") {
                    strs(&["bob smith", "bsmith", "bsmith21"])
                } else if hint.contains("password") {
                    strs(&["Mbuasd$1fd", "hjfsdhskfd"])
                } else if hint.contains("url") {
                    strs(&["http://www.example.com/"])
                } else {
                    strs(&["testText"])
                }
            }
            _ => strs(&["testText"]),
        }
    }
}

impl Action for FormFillAction {
    fn name(&self) -> &str {
        FORM_FILL_ACTION
    }

    fn get_elements(&self, access: &mut dyn InterfaceAccess) -> Result<Vec<String>> {
        let data = access.state_data()?;
        let elements = xpath::collect_elements(&data.raw_dom);
        Ok(elements
            .iter()
            .filter(|e| Self::is_container(e, &elements))
            .map(|e| e.xpath.clone())
            .collect())
    }

    fn execute(&self, access: &mut dyn InterfaceAccess, user: &UserModel, element: &str) -> Result<EdgeMetrics> {
        let mut build = BuildData::default();
        let gate = user.score(Axes::ALL, &mut build, access, element, Some(self.name()))?;
        if gate.combined <= 0.0 {
            let mut metrics = EdgeMetrics::zero_with_error(format!("user '{}' scores 0 on form '{element}'", user.name()));
            metrics.build_data = Some(build);
            return Ok(metrics);
        }

        let data = access.state_data()?;
        let all = xpath::collect_elements(&data.raw_dom);
        let Some(container) = all.iter().find(|e| e.xpath == element) else {
            return Ok(EdgeMetrics::zero_with_error(format!("form container '{element}' not found")));
        };
        let descendants = Self::descendants(container, &all);

        let Some(submit) = Self::find_submit(&descendants) else {
            return Ok(EdgeMetrics::zero_with_error(format!("no submit control found in '{element}'")));
        };
        let mut submit_build = BuildData::default();
        let submit_gate = user.score(
            Axes::ALL,
            &mut submit_build,
            access,
            &submit.xpath,
            Some(MOUSE_CLICK_ACTION),
        )?;
        if submit_gate.combined <= 0.0 {
            return Ok(EdgeMetrics::zero_with_error(format!(
                "user '{}' cannot reach submit control in '{element}'",
                user.name()
            )));
        }

        let fields = Self::find_fields(&descendants);
        if fields.is_empty() {
            let mut metrics = access.perform_action_on_element(user, MOUSE_CLICK_ACTION, &submit.xpath)?;
            metrics.ability_score = metrics.ability_score.max(submit_gate.combined);
            return Ok(metrics);
        }

        let mut attempts = 0usize;
        for field in &fields {
            let field_gate = user.score(Axes::PCV | Axes::NAV, &mut BuildData::default(), access, &field.xpath, None)?;
            if field_gate.combined <= 0.0 {
                continue;
            }
            for value in Self::candidates_for(field) {
                if attempts >= MAX_ATTEMPTS {
                    break;
                }
                attempts += 1;
                access.set_field_value(&field.xpath, &value)?;
                let mut metrics = access.perform_action_on_element(user, MOUSE_CLICK_ACTION, &submit.xpath)?;
                if metrics.ability_score > 0.0 {
                    metrics.ability_score = metrics.ability_score.max(submit_gate.combined);
                    return Ok(metrics);
                }
            }
        }

        Ok(EdgeMetrics::zero_with_error(format!(
            "no candidate value combination submitted '{element}' successfully"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use demodocus_core::ability::UserModel;
    use demodocus_core::web::OmniAbility;
    use std::sync::Arc;

    #[test]
    fn candidates_prefer_email_hint_for_text_inputs() {
        let html = r#"<html><body><input type="text" name="email_address"></body></html>"#;
        let elements = xpath::collect_elements(html);
        let field = elements.iter().find(|e| e.tag == "input").unwrap();
        let candidates = FormFillAction::candidates_for(field);
        assert_eq!(candidates, vec!["bob@example.com".to_string()]);
    }

    #[test]
    fn finds_form_container_with_input_and_button() {
        let html = r#"
            <html><body>
                <form>
                    <input type="email" name="email">
                    <button type="submit">Go</button>
                </form>
            </body></html>
        "#;
        let elements = xpath::collect_elements(html);
        let containers: Vec<_> = elements.iter().filter(|e| FormFillAction::is_container(e, &elements)).collect();
        assert_eq!(containers.len(), 1);
        assert_eq!(containers[0].tag, "form");
    }

    #[test]
    fn not_repeatable_and_has_no_reverse() {
        let action = FormFillAction::new();
        assert!(!action.repeatable());
        assert!(action.reverse().is_none());
    }

    #[allow(dead_code)]
    fn build_user() -> UserModel {
        UserModel::new("build", vec![Arc::new(OmniAbility)])
    }
}
