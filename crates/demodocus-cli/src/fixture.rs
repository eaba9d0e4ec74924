//! Maps the CLI's notion of an entry point onto a bundled
//! `demodocus_access_fixture::Scenario` (§4.12 `access_class = "fixture"`).
//!
//! A real browser driver is out of scope here (§1 Non-goals), so every
//! entry point this workspace understands names one of the fixture's
//! bundled pages rather than a URL a network client would dereference.

use anyhow::{anyhow, Result};
use demodocus_access_fixture::Scenario;

/// Entry-point names the fixture access recognizes, in the same order as
/// [`Scenario`]'s variants.
const SCENARIO_NAMES: &[(&str, Scenario)] = &[
    ("toggle-page", Scenario::TogglePage),
    ("expandable-list", Scenario::ExpandableList),
    ("stub-outbound-link", Scenario::StubOutboundLink),
    ("required-email-form", Scenario::RequiredEmailForm),
    ("randomized-time", Scenario::RandomizedTime),
    ("keyboard-trap", Scenario::KeyboardTrap),
];

/// Parse an entry-point string into the scenario it names, ignoring a
/// `fixture:` prefix if present (e.g. both `toggle-page` and
/// `fixture:toggle-page` resolve to [`Scenario::TogglePage`]).
pub fn parse_scenario(entry_point: &str) -> Result<Scenario> {
    let name = entry_point.strip_prefix("fixture:").unwrap_or(entry_point);
    SCENARIO_NAMES
        .iter()
        .find(|(candidate, _)| *candidate == name)
        .map(|(_, scenario)| *scenario)
        .ok_or_else(|| {
            let known: Vec<&str> = SCENARIO_NAMES.iter().map(|(n, _)| *n).collect();
            anyhow!("unknown fixture entry point '{entry_point}'; known scenarios: {}", known.join(", "))
        })
}

/// The canonical name a [`Scenario`] was parsed from, used in report
/// output and the `demo` subcommand's banner.
pub fn scenario_name(scenario: Scenario) -> &'static str {
    SCENARIO_NAMES
        .iter()
        .find(|(_, candidate)| *candidate == scenario)
        .map(|(name, _)| *name)
        .unwrap_or("unknown")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_and_prefixed_names() {
        assert_eq!(parse_scenario("toggle-page").unwrap(), Scenario::TogglePage);
        assert_eq!(parse_scenario("fixture:keyboard-trap").unwrap(), Scenario::KeyboardTrap);
    }

    #[test]
    fn rejects_unknown_names() {
        assert!(parse_scenario("https://example.com/").is_err());
    }

    #[test]
    fn name_round_trips_through_parse() {
        for (name, scenario) in SCENARIO_NAMES {
            assert_eq!(scenario_name(*scenario), *name);
            assert_eq!(parse_scenario(name).unwrap(), *scenario);
        }
    }
}
