//! C7: the `InterfaceAccess` contract (§4.7).
//!
//! The core treats "the browser" as a capability object. This module only
//! defines the contract; `demodocus-access-fixture` is the one concrete
//! implementation in this workspace, and a real browser driver (WebDriver,
//! CDP, ...) is an out-of-scope collaborator that would implement the same
//! trait.

use crate::action::Action;
use crate::ability::UserModel;
use crate::error::Result;
use crate::graph::EdgeMetrics;
use crate::web::state::WebStateData;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Narrow measurement surface an interface exposes about one element.
/// Kept separate from [`InterfaceAccess`] so [`crate::build_data::BuildData`]
/// can depend on it without pulling in state/action machinery.
pub trait ElementMeasurement: Send + Sync {
    /// CSS foreground (text) color, as returned by the interface (e.g. an
    /// `rgb(...)` string).
    fn measure_foreground_color(&self, element: &str) -> Result<String>;
    /// CSS background color.
    fn measure_background_color(&self, element: &str) -> Result<String>;
    /// WCAG contrast ratio between the element's foreground and background.
    fn measure_contrast_ratio(&self, element: &str) -> Result<f64>;
    /// Rendered `(width, height)` in pixels.
    fn measure_size(&self, element: &str) -> Result<(f64, f64)>;
    /// Rendered font size, in points.
    fn measure_font_size(&self, element: &str) -> Result<f64>;
    /// Rendered `(x, y)` position in pixels.
    fn measure_position(&self, element: &str) -> Result<(f64, f64)>;
    /// Euclidean pixel distance from the element focused just before this
    /// action, or `0.0` if there was none.
    fn measure_pixel_distance_from_prior_focus(&self, element: &str) -> Result<f64>;
    /// Tab-order distance from the element focused just before this action,
    /// or `-1` if the element is not reachable by keyboard.
    fn measure_tab_distance_from_prior_focus(&self, element: &str) -> Result<i64>;
    /// Lowercase tag name.
    fn measure_tag_name(&self, element: &str) -> Result<String>;
    /// Visible text content.
    fn measure_text(&self, element: &str) -> Result<String>;
    /// ARIA/role descriptor tags (e.g. `button`, `link`, `heading`).
    fn measure_descriptor_tags(&self, element: &str) -> Result<HashSet<String>>;
}

/// Focused/unfocused style snapshot plus screen position for one element,
/// captured during [`InterfaceAccess::generate_tab_order`] (§4.10 "Focus
/// analysis" reads these back).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FocusStyle {
    /// A string summary of the element's style while focused (e.g. outline,
    /// border, background — whatever the interface considers its focus
    /// indicator).
    pub focused_style: String,
    /// The same summary while not focused.
    pub unfocused_style: String,
    /// Screen X position in pixels.
    pub x: f64,
    /// Screen Y position in pixels.
    pub y: f64,
}

/// The result of one `generate_tab_order` call (§4.7).
#[derive(Debug, Clone, Default)]
pub struct TabOrder {
    /// Per-element xpath → focus style snapshot.
    pub styles: HashMap<String, FocusStyle>,
    /// Elements in the order focus visited them, starting from (and
    /// including) the element focused when generation began.
    pub ordered: Vec<String>,
    /// The xpath of the element focus started on, if any was focused.
    pub start_element_xpath: Option<String>,
    /// Elements visited more than the configured revisit bound — a
    /// keyboard trap (§4.10).
    pub traps: HashSet<String>,
}

/// The interface capability contract (C7). One instance owns exactly one
/// underlying session (browser tab, fixture cursor, ...); instances are
/// never shared across threads — the pooled explorer gives each worker its
/// own (§5 "strict affinity").
pub trait InterfaceAccess: ElementMeasurement {
    /// Materialize the initial state at `entry_point`, waiting for
    /// stability (§4.2) before returning. `false` means the entry point
    /// could not be loaded at all (a fatal, non-retryable failure).
    fn load(&mut self, entry_point: &str) -> Result<bool>;

    /// Snapshot the current UI as web state data.
    fn state_data(&mut self) -> Result<WebStateData>;

    /// Deterministically navigate back to a previously seen state: reload
    /// the state's stored raw page, then replay the build user's recorded
    /// path to it.
    fn set_state(&mut self, state: &WebStateData) -> Result<bool>;

    /// Rebind the access's cursor to `state` without touching the UI, used
    /// when the caller knows the UI has not drifted since `state` was last
    /// observed.
    fn set_state_direct(&mut self, state: &WebStateData) -> Result<bool>;

    /// Whether the currently loaded state belongs in-scope (`false` marks
    /// the state a stub, e.g. a different origin).
    fn is_state_valid(&mut self) -> Result<bool>;

    /// The fixed, class-level action inventory this access supports.
    fn actions(&self) -> Vec<Arc<dyn Action>>;

    /// Capture build data (if the edge is new), gate by `user`'s score,
    /// attempt `action_name` on `element` with bounded retries on
    /// transient errors, then re-snapshot. Never returns `Err` for a
    /// zero-scored or failed action — those become a zero-score
    /// `EdgeMetrics` with an error marker (§7 propagation policy).
    fn perform_action_on_element(&mut self, user: &UserModel, action_name: &str, element: &str) -> Result<EdgeMetrics>;

    /// Set one input-like element's value (or checked/selected state)
    /// without submitting anything, so a rule-ordered form-filling action
    /// can try several candidate values before attempting a submission
    /// (§4.4 `FormFillAction`). `value` is the type-appropriate string
    /// representation (e.g. `"true"`/`"false"` for a checkbox).
    fn set_field_value(&mut self, element: &str, value: &str) -> Result<()>;

    /// Starting from the currently focused element, advance focus
    /// (typically via repeated `Tab`) until either the first element is
    /// revisited or a configured maximum count is reached, restoring the
    /// original focus before returning.
    fn generate_tab_order(&mut self, context: Option<&str>) -> Result<TabOrder>;

    /// Reset the access to a blank/initial session without tearing it down.
    fn reset(&mut self) -> Result<()>;

    /// Release all OS resources. Must be safe to call more than once.
    fn shutdown(&mut self);
}
