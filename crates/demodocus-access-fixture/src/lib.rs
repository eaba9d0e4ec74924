//! A fixture-backed `InterfaceAccess` (§4.7) over small, hand-written HTML
//! pages instead of a real browser. Used by `demodocus-core`'s own dev
//! dependency on this crate (simulated re-crawl needs *some* concrete
//! access to exercise against), by `demodocus-testing`'s harness, and by
//! the CLI's `demo` subcommand.
//!
//! Each [`Scenario`] is a tiny, self-contained page with its own state
//! machine (a toggle, an expandable list, an outbound link, a form, a
//! clock, or a keyboard trap). Rather than keeping a side table of
//! sessions, a page encodes everything needed to resume it directly in
//! its own rendered markup (element ids, an `email` field's `value=`
//! attribute, the presence or absence of a status node), so `set_state`
//! and `set_state_direct` can restore session-local fields just by
//! re-parsing the stored DOM.

use demodocus_actions::{self as actions, ElementSnapshot};
use demodocus_core::ability::{Axes, UserModel};
use demodocus_core::build_data::BuildData;
use demodocus_core::error::Result;
use demodocus_core::graph::EdgeMetrics;
use demodocus_core::interface::{ElementMeasurement, FocusStyle, InterfaceAccess, TabOrder};
use demodocus_core::template::stability::{wait_for_stability, SnapshotSource};
use demodocus_core::web::ability::MOUSE_CLICK_ACTION;
use demodocus_core::web::state::WebStateData;
use demodocus_core::{Action, ActionRegistry};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

/// Which bundled page a `FixtureAccess` simulates. Each covers one
/// end-to-end accessibility pattern worth crawling and scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scenario {
    /// A single button that shows/hides a details panel.
    TogglePage,
    /// A list whose items each expand independently to reveal detail text.
    ExpandableList,
    /// A link that, once clicked, leaves the crawlable site (an
    /// out-of-scope stub state).
    StubOutboundLink,
    /// A sign-up form with one required email field.
    RequiredEmailForm,
    /// A page with a clock that advances every time it's observed, so its
    /// `<time>` text becomes unstable content the template engine must
    /// learn to tolerate.
    RandomizedTime,
    /// Two elements whose focus cycles between each other, never reaching
    /// a third element that follows them in document order.
    KeyboardTrap,
}

/// A fixture-backed `InterfaceAccess` simulating one [`Scenario`].
pub struct FixtureAccess {
    scenario: Scenario,
    actions: Arc<ActionRegistry>,
    poll_interval: Duration,
    stability_threshold: Duration,
    stability_timeout: Duration,
    num_revisits: u32,
    item_count: usize,

    url: String,
    focused: Option<String>,

    toggled: bool,
    expanded: BTreeSet<usize>,
    navigated_out: bool,
    field_values: HashMap<String, String>,
    submitted: bool,
    load_count: u32,
}

impl FixtureAccess {
    /// A fresh access for `scenario`, polling for stability every 1ms with
    /// a 5ms threshold and a 50ms timeout — short enough to keep a
    /// synthetic, fully-deterministic page snappy. Use [`Self::with_config`]
    /// to run against the same `page_change_threshold_secs`/
    /// `page_change_timeout_secs` a real crawl's `CrawlConfig` would use.
    pub fn new(scenario: Scenario) -> Self {
        Self::with_config(
            scenario,
            Duration::from_millis(1),
            Duration::from_millis(5),
            Duration::from_millis(50),
        )
    }

    /// As [`Self::new`], but with the caller's own stability-wait
    /// parameters and the default tab-order revisit bound (3).
    pub fn with_config(scenario: Scenario, poll_interval: Duration, stability_threshold: Duration, stability_timeout: Duration) -> Self {
        let registry = ActionRegistry::new();
        let actions = Arc::new(registry);
        demodocus_actions::register_default_actions(&actions);
        Self {
            scenario,
            actions,
            poll_interval,
            stability_threshold,
            stability_timeout,
            num_revisits: 3,
            item_count: 4,
            url: String::new(),
            focused: None,
            toggled: false,
            expanded: BTreeSet::new(),
            navigated_out: false,
            field_values: HashMap::new(),
            submitted: false,
            load_count: 0,
        }
    }

    /// Override the tab-order revisit bound (default 3) used to detect
    /// keyboard traps.
    pub fn with_num_revisits(mut self, num_revisits: u32) -> Self {
        self.num_revisits = num_revisits.max(1);
        self
    }

    /// Override the expandable list's item count (default 4).
    pub fn with_item_count(mut self, item_count: usize) -> Self {
        self.item_count = item_count.max(1);
        self
    }

    /// The action registry this access was built with, shared so a caller
    /// driving a [`demodocus_core::explorer::SingleThreadedExplorer`] (or
    /// another `InterfaceAccess` consumer) can iterate the same `Action`
    /// instances rather than registering its own.
    pub fn action_registry(&self) -> Arc<ActionRegistry> {
        self.actions.clone()
    }

    fn reset_session_state(&mut self) {
        self.focused = None;
        self.toggled = false;
        self.expanded.clear();
        self.navigated_out = false;
        self.field_values.clear();
        self.submitted = false;
    }

    fn render(&self) -> String {
        match self.scenario {
            Scenario::TogglePage => {
                let label = if self.toggled { "Hide details" } else { "Show details" };
                let panel = if self.toggled {
                    "<div id=\"panel\">Extra content now visible</div>"
                } else {
                    ""
                };
                format!("<html><body><button id=\"toggle\" type=\"button\">{label}</button>{panel}</body></html>")
            }
            Scenario::ExpandableList => {
                let items: String = (0..self.item_count)
                    .map(|i| {
                        let is_open = self.expanded.contains(&i);
                        let detail = if is_open {
                            format!("<div id=\"detail-{i}\">Detail for item {i}</div>")
                        } else {
                            String::new()
                        };
                        format!(
                            "<li><button id=\"item-{i}\" type=\"button\" aria-expanded=\"{is_open}\">Item {i}</button>{detail}</li>"
                        )
                    })
                    .collect();
                format!("<html><body><ul id=\"list\">{items}</ul></body></html>")
            }
            Scenario::StubOutboundLink => {
                if self.navigated_out {
                    "<html><body><p id=\"left\">You have left the site.</p></body></html>".to_string()
                } else {
                    "<html><body><a id=\"outbound\" href=\"https://example.org/\">Visit partner site</a></body></html>"
                        .to_string()
                }
            }
            Scenario::RequiredEmailForm => {
                let value = self.field_values.get("email").cloned().unwrap_or_default();
                let status = if self.submitted {
                    "<p id=\"status\">Thanks for signing up.</p>"
                } else {
                    ""
                };
                format!(
                    "<html><body><form id=\"signup\"><input id=\"email\" type=\"email\" name=\"email\" required value=\"{value}\"><button id=\"submit\" type=\"submit\">Sign up</button></form>{status}</body></html>"
                )
            }
            Scenario::RandomizedTime => {
                let hh = (self.load_count * 7) % 24;
                let mm = (self.load_count * 13) % 60;
                format!(
                    "<html><body><p id=\"heading\">Current time</p><time id=\"clock\">{hh:02}:{mm:02}</time></body></html>"
                )
            }
            Scenario::KeyboardTrap => "<html><body>\
                <a id=\"before\" href=\"#\">Before</a>\
                <div id=\"trap-a\" tabindex=\"0\">Trap A</div>\
                <div id=\"trap-b\" tabindex=\"0\">Trap B</div>\
                <a id=\"after\" href=\"#\">After</a>\
                </body></html>"
                .to_string(),
        }
    }

    fn elements(&self) -> Vec<ElementSnapshot> {
        actions::collect_elements(&self.render())
    }

    fn find(&self, element: &str) -> Option<ElementSnapshot> {
        let elements = self.elements();
        actions::find(&elements, element).cloned()
    }

    fn element_id(&self, element: &str) -> Option<String> {
        self.find(element).and_then(|e| e.attr("id").map(str::to_string))
    }

    fn is_focusable(el: &ElementSnapshot) -> bool {
        if el.is_disabled() {
            return false;
        }
        if let Some(tabindex) = el.attr("tabindex") {
            return tabindex != "-1";
        }
        matches!(el.tag.as_str(), "a" | "button" | "input" | "select" | "textarea" | "summary") || el.has_attr("role")
    }

    fn focusable_order(&self) -> Vec<String> {
        self.elements()
            .into_iter()
            .filter(Self::is_focusable)
            .map(|e| e.xpath)
            .collect()
    }

    /// Apply the effect of a successful `action_name` on `element`'s `id`,
    /// per scenario. Anything not recognized by the current scenario is a
    /// no-op (e.g. clicking the toggle button has no effect on the
    /// keyboard-trap page, since it has none).
    fn apply_transition(&mut self, action_name: &str, element: &str) {
        let Some(id) = self.element_id(element) else {
            return;
        };
        match self.scenario {
            Scenario::TogglePage => {
                if id == "toggle" && action_name == MOUSE_CLICK_ACTION {
                    self.toggled = !self.toggled;
                }
            }
            Scenario::ExpandableList => {
                if action_name != MOUSE_CLICK_ACTION {
                    return;
                }
                if let Some(idx) = id.strip_prefix("item-").and_then(|s| s.parse::<usize>().ok()) {
                    if !self.expanded.remove(&idx) {
                        self.expanded.insert(idx);
                    }
                }
            }
            Scenario::StubOutboundLink => {
                if id == "outbound" && action_name == MOUSE_CLICK_ACTION {
                    self.navigated_out = true;
                }
            }
            Scenario::RequiredEmailForm => {
                if id == "submit" && action_name == MOUSE_CLICK_ACTION {
                    let email = self.field_values.get("email").cloned().unwrap_or_default();
                    if email.contains('@') && email.rsplit('@').next().is_some_and(|host| host.contains('.')) {
                        self.submitted = true;
                    }
                }
            }
            Scenario::RandomizedTime | Scenario::KeyboardTrap => {}
        }
    }

    fn observe_stable(&mut self) -> Result<demodocus_core::template::HtmlTemplate> {
        let interval = self.poll_interval;
        let threshold = self.stability_threshold;
        let timeout = self.stability_timeout;
        Ok(wait_for_stability(self, interval, threshold, timeout)?.template)
    }

    fn restore_from_dom(&mut self, dom: &str) {
        let elements = actions::collect_elements(dom);
        match self.scenario {
            Scenario::TogglePage => {
                self.toggled = elements.iter().any(|e| e.attr("id") == Some("panel"));
            }
            Scenario::ExpandableList => {
                self.expanded = elements
                    .iter()
                    .filter_map(|e| e.attr("id"))
                    .filter_map(|id| id.strip_prefix("detail-"))
                    .filter_map(|idx| idx.parse::<usize>().ok())
                    .collect();
            }
            Scenario::StubOutboundLink => {
                self.navigated_out = !elements.iter().any(|e| e.attr("id") == Some("outbound"));
            }
            Scenario::RequiredEmailForm => {
                self.submitted = elements.iter().any(|e| e.attr("id") == Some("status"));
                if let Some(input) = elements.iter().find(|e| e.attr("id") == Some("email")) {
                    if let Some(v) = input.attr("value") {
                        self.field_values.insert("email".to_string(), v.to_string());
                    }
                }
            }
            Scenario::RandomizedTime | Scenario::KeyboardTrap => {}
        }
    }
}

impl SnapshotSource for FixtureAccess {
    fn snapshot(&mut self) -> Result<String> {
        if matches!(self.scenario, Scenario::RandomizedTime) {
            self.load_count += 1;
        }
        Ok(self.render())
    }
}

impl ElementMeasurement for FixtureAccess {
    fn measure_foreground_color(&self, _element: &str) -> Result<String> {
        Ok("#111111".to_string())
    }

    fn measure_background_color(&self, _element: &str) -> Result<String> {
        Ok("#ffffff".to_string())
    }

    fn measure_contrast_ratio(&self, _element: &str) -> Result<f64> {
        Ok(12.0)
    }

    fn measure_size(&self, _element: &str) -> Result<(f64, f64)> {
        Ok((120.0, 44.0))
    }

    fn measure_font_size(&self, _element: &str) -> Result<f64> {
        Ok(16.0)
    }

    fn measure_position(&self, element: &str) -> Result<(f64, f64)> {
        let order = self.focusable_order();
        let idx = order.iter().position(|x| x == element).unwrap_or(0);
        Ok((20.0, idx as f64 * 60.0))
    }

    fn measure_pixel_distance_from_prior_focus(&self, element: &str) -> Result<f64> {
        let Some(prior) = &self.focused else {
            return Ok(0.0);
        };
        let order = self.focusable_order();
        let (Some(pi), Some(ei)) = (order.iter().position(|x| x == prior), order.iter().position(|x| x == element))
        else {
            return Ok(0.0);
        };
        Ok((pi as f64 - ei as f64).abs() * 60.0)
    }

    fn measure_tab_distance_from_prior_focus(&self, element: &str) -> Result<i64> {
        if matches!(self.scenario, Scenario::KeyboardTrap) && self.element_id(element).as_deref() == Some("after") {
            return Ok(-1);
        }
        let order = self.focusable_order();
        let Some(ei) = order.iter().position(|x| x == element) else {
            return Ok(-1);
        };
        match &self.focused {
            None => Ok(ei as i64),
            Some(prior) => match order.iter().position(|x| x == prior) {
                Some(pi) => Ok((ei as i64 - pi as i64).abs()),
                None => Ok(ei as i64),
            },
        }
    }

    fn measure_tag_name(&self, element: &str) -> Result<String> {
        Ok(self.find(element).map(|e| e.tag).unwrap_or_default())
    }

    fn measure_text(&self, element: &str) -> Result<String> {
        Ok(self.find(element).map(|e| e.text).unwrap_or_default())
    }

    fn measure_descriptor_tags(&self, element: &str) -> Result<HashSet<String>> {
        let mut tags = HashSet::new();
        if let Some(e) = self.find(element) {
            tags.insert(e.tag.clone());
            if let Some(role) = e.attr("role") {
                tags.insert(role.to_string());
            }
        }
        Ok(tags)
    }
}

impl InterfaceAccess for FixtureAccess {
    fn load(&mut self, entry_point: &str) -> Result<bool> {
        if entry_point.trim().is_empty() {
            return Ok(false);
        }
        self.url = entry_point.to_string();
        self.reset_session_state();
        Ok(true)
    }

    fn state_data(&mut self) -> Result<WebStateData> {
        let template = self.observe_stable()?;
        let raw_dom = template.to_html();
        Ok(WebStateData {
            url: self.url.clone(),
            raw_dom,
            template: Some(template),
            tab_order: None,
            initial_focus: self.focused.clone(),
            elements_to_explore: HashSet::new(),
        })
    }

    fn set_state(&mut self, state: &WebStateData) -> Result<bool> {
        self.set_state_direct(state)
    }

    fn set_state_direct(&mut self, state: &WebStateData) -> Result<bool> {
        self.url = state.url.clone();
        self.restore_from_dom(&state.raw_dom);
        Ok(true)
    }

    fn is_state_valid(&mut self) -> Result<bool> {
        Ok(!(matches!(self.scenario, Scenario::StubOutboundLink) && self.navigated_out))
    }

    fn actions(&self) -> Vec<Arc<dyn Action>> {
        self.actions.all()
    }

    fn perform_action_on_element(&mut self, user: &UserModel, action_name: &str, element: &str) -> Result<EdgeMetrics> {
        let mut build = BuildData::default();
        let scored = user.score(Axes::ALL, &mut build, self, element, Some(action_name))?;
        if scored.combined <= 0.0 {
            let mut metrics =
                EdgeMetrics::zero_with_error(format!("user '{}' scores 0 on '{action_name}' at {element}", user.name()));
            metrics.build_data = Some(build);
            return Ok(metrics);
        }

        self.apply_transition(action_name, element);
        self.focused = Some(element.to_string());
        build.capture_all(self, element)?;

        Ok(EdgeMetrics {
            ability_score: scored.combined,
            pcv_score: scored.pcv,
            nav_score: scored.nav,
            act_score: scored.act,
            act_time: Some(Duration::from_millis(5)),
            error: None,
            build_data: Some(build),
        })
    }

    fn set_field_value(&mut self, element: &str, value: &str) -> Result<()> {
        if let Some(id) = self.element_id(element) {
            self.field_values.insert(id, value.to_string());
        }
        Ok(())
    }

    fn generate_tab_order(&mut self, _context: Option<&str>) -> Result<TabOrder> {
        let focusable = self.elements().into_iter().filter(Self::is_focusable).collect::<Vec<_>>();
        let start = self.focused.clone();

        if focusable.is_empty() {
            return Ok(TabOrder {
                styles: HashMap::new(),
                ordered: Vec::new(),
                start_element_xpath: start,
                traps: HashSet::new(),
            });
        }

        let sequence: Vec<String> = if matches!(self.scenario, Scenario::KeyboardTrap) {
            let cycle: Vec<String> = focusable
                .iter()
                .filter(|e| matches!(e.attr("id"), Some("trap-a") | Some("trap-b")))
                .map(|e| e.xpath.clone())
                .collect();
            cycle.iter().cloned().cycle().take(focusable.len() * 3).collect()
        } else {
            focusable.iter().map(|e| e.xpath.clone()).collect()
        };

        let mut ordered = Vec::new();
        let mut styles = HashMap::new();
        let mut traps = HashSet::new();
        let mut visits: HashMap<String, u32> = HashMap::new();

        for xpath in sequence {
            let count = visits.entry(xpath.clone()).or_insert(0);
            *count += 1;
            if *count > self.num_revisits {
                tracing::debug!(xpath = %xpath, "keyboard trap: revisit bound exceeded");
                traps.insert(xpath);
                break;
            }
            styles.insert(
                xpath.clone(),
                FocusStyle {
                    focused_style: "outline: 2px solid blue".to_string(),
                    unfocused_style: "outline: none".to_string(),
                    x: 0.0,
                    y: 0.0,
                },
            );
            ordered.push(xpath);
        }

        Ok(TabOrder {
            styles,
            ordered,
            start_element_xpath: start,
            traps,
        })
    }

    fn reset(&mut self) -> Result<()> {
        self.url.clear();
        self.reset_session_state();
        Ok(())
    }

    fn shutdown(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use demodocus_core::web::OmniAbility;

    fn build_user() -> UserModel {
        UserModel::new("build", vec![Arc::new(OmniAbility)])
    }

    #[test]
    fn toggle_page_round_trips_through_click() {
        let mut access = FixtureAccess::new(Scenario::TogglePage);
        access.load("https://fixture.test/toggle").unwrap();
        let before = access.state_data().unwrap();
        assert!(!before.raw_dom.contains("panel"));

        let elements = actions::collect_elements(&before.raw_dom);
        let button = elements.iter().find(|e| e.attr("id") == Some("toggle")).unwrap();

        let user = build_user();
        let metrics = access
            .perform_action_on_element(&user, MOUSE_CLICK_ACTION, &button.xpath)
            .unwrap();
        assert!(metrics.ability_score > 0.0);

        let after = access.state_data().unwrap();
        assert!(after.raw_dom.contains("panel"));
    }

    #[test]
    fn stub_outbound_link_marks_state_invalid_after_click() {
        let mut access = FixtureAccess::new(Scenario::StubOutboundLink);
        access.load("https://fixture.test/stub").unwrap();
        let before = access.state_data().unwrap();
        let elements = actions::collect_elements(&before.raw_dom);
        let link = elements.iter().find(|e| e.attr("id") == Some("outbound")).unwrap();

        let user = build_user();
        access.perform_action_on_element(&user, MOUSE_CLICK_ACTION, &link.xpath).unwrap();
        assert!(!access.is_state_valid().unwrap());
    }

    #[test]
    fn randomized_time_becomes_unstable_across_polls() {
        let mut access = FixtureAccess::with_config(
            Scenario::RandomizedTime,
            Duration::from_millis(1),
            Duration::from_millis(10),
            Duration::from_millis(20),
        );
        access.load("https://fixture.test/clock").unwrap();
        let state = access.state_data().unwrap();
        let template = state.template.expect("fixture always captures a template");
        assert!(template.unstable_xpaths().iter().any(|xp| xp.contains("time")));
    }

    #[test]
    fn keyboard_trap_is_detected_and_after_link_is_unreachable_by_tab() {
        let mut access = FixtureAccess::new(Scenario::KeyboardTrap).with_num_revisits(2);
        access.load("https://fixture.test/trap").unwrap();
        let order = access.generate_tab_order(None).unwrap();
        assert!(!order.traps.is_empty());

        let state = access.state_data().unwrap();
        let elements = actions::collect_elements(&state.raw_dom);
        let after = elements.iter().find(|e| e.attr("id") == Some("after")).unwrap();
        assert_eq!(access.measure_tab_distance_from_prior_focus(&after.xpath).unwrap(), -1);
    }

    #[test]
    fn required_email_form_submits_on_valid_address() {
        let mut access = FixtureAccess::new(Scenario::RequiredEmailForm);
        access.load("https://fixture.test/signup").unwrap();
        let before = access.state_data().unwrap();
        let elements = actions::collect_elements(&before.raw_dom);
        let email = elements.iter().find(|e| e.attr("id") == Some("email")).unwrap();
        let submit = elements.iter().find(|e| e.attr("id") == Some("submit")).unwrap();

        access.set_field_value(&email.xpath, "bob@example.com").unwrap();
        let user = build_user();
        access.perform_action_on_element(&user, MOUSE_CLICK_ACTION, &submit.xpath).unwrap();

        let after = access.state_data().unwrap();
        assert!(after.raw_dom.contains("status"));
    }

    #[test]
    fn expandable_list_toggles_one_item_independently() {
        let mut access = FixtureAccess::new(Scenario::ExpandableList).with_item_count(4);
        access.load("https://fixture.test/list").unwrap();
        let before = access.state_data().unwrap();
        let elements = actions::collect_elements(&before.raw_dom);
        let item1 = elements.iter().find(|e| e.attr("id") == Some("item-1")).unwrap();

        let user = build_user();
        access.perform_action_on_element(&user, MOUSE_CLICK_ACTION, &item1.xpath).unwrap();

        let after = access.state_data().unwrap();
        assert!(after.raw_dom.contains("detail-1"));
        assert!(!after.raw_dom.contains("detail-0"));
    }
}
