//! Web specialization of `StateData` (§3 "StateData (web specialization)").

use crate::graph::StateData;
use crate::interface::TabOrder;
use crate::template::HtmlTemplate;
use std::collections::HashSet;

/// One `(action name, element xpath)` pair whose reachability became true
/// during the transition that produced this state — the reduced explorer
/// restricts child exploration to this set (§3, §4.8).
pub type ElementToExplore = (String, String);

/// Everything the web interface knows about one observed UI state.
#[derive(Debug, Clone)]
pub struct WebStateData {
    /// The page URL at the time this state was observed.
    pub url: String,
    /// The full, stability-waited DOM string.
    pub raw_dom: String,
    /// The merged template for this state, once one has been built (the
    /// build crawler sets this; simulated re-crawl never needs to).
    pub template: Option<HtmlTemplate>,
    /// Precomputed tab order, generated once per newly discovered non-stub
    /// state (§4.8 "Reduced DFS").
    pub tab_order: Option<TabOrder>,
    /// xpath of the element focused when this state was first observed.
    pub initial_focus: Option<String>,
    /// Reachability delta produced by the action that led to this state.
    pub elements_to_explore: HashSet<ElementToExplore>,
}

impl WebStateData {
    /// A freshly observed state with no template, tab order, or
    /// exploration delta yet.
    pub fn new(url: impl Into<String>, raw_dom: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            raw_dom: raw_dom.into(),
            template: None,
            tab_order: None,
            initial_focus: None,
            elements_to_explore: HashSet::new(),
        }
    }
}

impl StateData for WebStateData {
    fn representation(&self) -> String {
        self.raw_dom.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn representation_is_the_raw_dom() {
        let data = WebStateData::new("https://example.test/", "<html></html>");
        assert_eq!(data.representation(), "<html></html>");
    }
}
