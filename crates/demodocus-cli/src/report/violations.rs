//! Element map (violations) JSON output (§4.14, §6).
//!
//! `serde_json` serialization of the analyzer's own `Violation`/
//! `StateViolations` types — no intermediate shape, since those types
//! already carry the exact tagged-enum schema §6 describes.

use anyhow::{Context, Result};
use demodocus_core::analyzer::AnalysisReport;
use demodocus_core::graph::StateId;
use std::collections::HashMap;

/// Render the per-state violation map as pretty JSON, keyed by state id.
pub fn write_violations_json(report: &AnalysisReport) -> Result<String> {
    let keyed: &HashMap<StateId, demodocus_core::analyzer::violation::StateViolations> = &report.states;
    serde_json::to_string_pretty(keyed).context("serializing element map")
}

#[cfg(test)]
mod tests {
    use super::*;
    use demodocus_core::analyzer::violation::{Level, StateViolations, Violation};

    #[test]
    fn keys_by_state_id_and_tags_variant_type() {
        let mut states = HashMap::new();
        states.insert(
            7u64,
            StateViolations {
                src: Some(0),
                violations: vec![Violation::Atomic {
                    level: Level::Warning,
                    category: "contrast".to_string(),
                    element: demodocus_core::analyzer::violation::ElementLocator {
                        x: 0.0,
                        y: 0.0,
                        width: 10.0,
                        height: 10.0,
                        xpath: "/html/body/a".to_string(),
                        text: "link".to_string(),
                        tag: "a".to_string(),
                    },
                    replay: vec!["mouse_click:/html/body/a".to_string()],
                    code: "min-contrast".to_string(),
                    group_id: 1,
                }],
            },
        );
        let report = AnalysisReport {
            states,
            per_user: HashMap::new(),
            layouts: HashMap::new(),
        };
        let json = write_violations_json(&report).unwrap();
        assert!(json.contains("\"7\""));
        assert!(json.contains("\"type\": \"atomic\""));
        assert!(json.contains("\"level\": \"warning\""));
    }
}
