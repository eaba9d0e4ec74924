//! End-to-end test harness built on the in-memory fixture access.
//!
//! Wires a `demodocus_core::orchestrator::Orchestrator` against
//! `demodocus_access_fixture::FixtureAccess` so a crate (or an
//! integration test in `demodocus-cli`) can run a full build pass plus
//! simulated re-crawls without a browser, then assert on the resulting
//! graph and analyzer output. One `FixtureAccess` scenario stands in for
//! one "testable property" page (§8).

use demodocus_access_fixture::{FixtureAccess, Scenario};
use demodocus_core::ability::UserModel;
use demodocus_core::analyzer::{self, AnalysisReport};
use demodocus_core::comparator::default_pipeline;
use demodocus_core::error::Result;
use demodocus_core::graph::Graph;
use demodocus_core::interface::InterfaceAccess;
use demodocus_core::orchestrator::{Orchestrator, ReportPhase, ReportSink};
use demodocus_core::web::ability::KEY_PRESS_PREFIX;
use demodocus_core::web::{OmniAbility, WebStateData};
use demodocus_core::web::{KeyboardAbility, MouseAbility, VisionAbility};
use demodocus_core::ActionRegistry;
use std::sync::{Arc, Mutex};

/// The default entry point every harness crawl is run against; the
/// fixture ignores its value beyond treating it as non-empty.
pub const ENTRY_POINT: &str = "https://fixture.test/";

/// A build user with every ability, used to discover the full graph.
pub fn build_user() -> UserModel {
    UserModel::new("build", vec![Arc::new(OmniAbility)])
}

/// A crawl user who can only point and click.
pub fn mouse_only_user() -> UserModel {
    UserModel::new("mouse_only", vec![Arc::new(MouseAbility)])
}

/// A crawl user who can only drive the keyboard (tab order, key presses,
/// form fill) and has no pointer at all.
pub fn keyboard_only_user() -> UserModel {
    UserModel::new("keyboard_only", vec![Arc::new(KeyboardAbility)])
}

/// A sighted keyboard user: keyboard navigation plus the vision
/// perceive checks (contrast, minimum target size).
pub fn sighted_keyboard_user() -> UserModel {
    UserModel::new("sighted_keyboard", vec![Arc::new(KeyboardAbility), Arc::new(VisionAbility)])
}

/// One call to a `ReportSink::emit`, captured for assertions instead of
/// written to disk.
#[derive(Debug, Clone)]
pub enum RecordedPhase {
    AfterBuild { entry_point: String },
    AfterRecrawl { entry_point: String, user: String },
}

#[derive(Default)]
struct CollectingReportSink {
    phases: Mutex<Vec<RecordedPhase>>,
}

impl ReportSink for CollectingReportSink {
    fn emit(&self, _graph: &Graph<WebStateData>, phase: ReportPhase<'_>) -> Result<()> {
        let recorded = match phase {
            ReportPhase::AfterBuild { entry_point } => RecordedPhase::AfterBuild {
                entry_point: entry_point.to_string(),
            },
            ReportPhase::AfterRecrawl { entry_point, user } => RecordedPhase::AfterRecrawl {
                entry_point: entry_point.to_string(),
                user: user.to_string(),
            },
        };
        self.phases.lock().unwrap_or_else(|e| e.into_inner()).push(recorded);
        Ok(())
    }
}

/// The graph produced by one [`GraphTestHarness::crawl`] call, plus the
/// sequence of report-sink calls the orchestrator made along the way.
pub struct CrawlOutcome {
    pub graph: Arc<Graph<WebStateData>>,
    pub phases: Vec<RecordedPhase>,
    pub build_user: String,
    pub crawl_users: Vec<String>,
}

impl CrawlOutcome {
    /// Run the accessibility analyzer over this outcome's graph, using
    /// the crawl users' own `claims_action` and a keyboard-ability-shaped
    /// `is_keyboard_action` predicate. `style_contrast` defaults to
    /// [`analyzer::focus::style_string_contrast_proxy`] when the caller
    /// has no real style data to compare.
    pub fn analyze(&self, crawl_users: &[UserModel]) -> AnalysisReport {
        let names: Vec<String> = self.crawl_users.clone();
        let claims_action = |user: &str, action: &str| {
            crawl_users
                .iter()
                .find(|u| u.name() == user)
                .is_some_and(|u| u.claims_action(action))
        };
        let is_keyboard_action = |action: &str| action.starts_with(KEY_PRESS_PREFIX) || action == "form_fill";
        analyzer::analyze(
            &self.graph,
            &self.build_user,
            &names,
            claims_action,
            is_keyboard_action,
            analyzer::focus::style_string_contrast_proxy,
        )
    }
}

/// Drives a fixture `Scenario` through a full build-and-recrawl pass,
/// the same sequence `demodocus-cli`'s crawl command runs against a real
/// page (§4.11).
pub struct GraphTestHarness {
    actions: Arc<ActionRegistry>,
}

impl Default for GraphTestHarness {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphTestHarness {
    /// A harness sharing one action registry across every crawl it runs.
    /// The registry's contents come from a throwaway `FixtureAccess`
    /// instance — `Action` implementations are stateless, so any
    /// scenario's registry is interchangeable with any other's.
    pub fn new() -> Self {
        let actions = FixtureAccess::new(Scenario::TogglePage).action_registry();
        Self { actions }
    }

    /// Run `scenario` to exhaustion for `build_user`, then simulate a
    /// re-crawl for each of `crawl_users` in turn, returning the finished
    /// graph and the report-sink call log.
    pub fn crawl(&self, scenario: Scenario, build_user: UserModel, crawl_users: Vec<UserModel>) -> Result<CrawlOutcome> {
        self.run_crawl(scenario, build_user, crawl_users, false, None)
    }

    /// Like [`Self::crawl`], but in reduced-DFS mode (§4.8 "Reduced DFS"):
    /// child exploration is restricted to each state's reachability delta
    /// and repeatable actions are chained and reversed.
    pub fn crawl_reduced(&self, scenario: Scenario, build_user: UserModel, crawl_users: Vec<UserModel>) -> Result<CrawlOutcome> {
        self.run_crawl(scenario, build_user, crawl_users, true, None)
    }

    /// Like [`Self::crawl`], but scheduled across `num_threads` pooled
    /// workers (§4.8 "Pooled explorer") instead of a single thread.
    pub fn crawl_pooled(
        &self,
        scenario: Scenario,
        build_user: UserModel,
        crawl_users: Vec<UserModel>,
        num_threads: usize,
    ) -> Result<CrawlOutcome> {
        self.run_crawl(scenario, build_user, crawl_users, false, Some(num_threads))
    }

    fn run_crawl(
        &self,
        scenario: Scenario,
        build_user: UserModel,
        crawl_users: Vec<UserModel>,
        reduced: bool,
        num_threads: Option<usize>,
    ) -> Result<CrawlOutcome> {
        let build_user_name = build_user.name().to_string();
        let crawl_user_names = crawl_users.iter().map(|u| u.name().to_string()).collect();

        let mut orchestrator = Orchestrator::new(self.actions.clone(), build_user, crawl_users, reduced);
        if let Some(num_threads) = num_threads {
            orchestrator = orchestrator.with_pool(num_threads);
        }
        let reports = CollectingReportSink::default();
        let entry_points = vec![ENTRY_POINT.to_string()];

        let graphs = orchestrator.run(
            &entry_points,
            default_pipeline,
            move |_entry_point: &str| Ok(Box::new(FixtureAccess::new(scenario)) as Box<dyn InterfaceAccess>),
            &reports,
            None,
        )?;
        let graph = graphs
            .into_iter()
            .next()
            .expect("one entry point was given so one graph is returned");

        Ok(CrawlOutcome {
            graph,
            phases: reports.phases.into_inner().unwrap_or_else(|e| e.into_inner()),
            build_user: build_user_name,
            crawl_users: crawl_user_names,
        })
    }

    /// The shared action registry, for tests that want to exercise
    /// `Action::get_elements`/`execute` directly via `.all()` instead of
    /// going through a full crawl.
    pub fn action_registry(&self) -> Arc<ActionRegistry> {
        self.actions.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_page_build_crawl_discovers_two_states() {
        let harness = GraphTestHarness::new();
        let outcome = harness
            .crawl(Scenario::TogglePage, build_user(), vec![mouse_only_user()])
            .expect("fixture crawl never fails");
        assert_eq!(outcome.graph.state_count(), 2);
        assert!(matches!(outcome.phases[0], RecordedPhase::AfterBuild { .. }));
        assert!(matches!(outcome.phases[1], RecordedPhase::AfterRecrawl { .. }));
    }

    #[test]
    fn reduced_crawl_still_discovers_edges_beyond_the_start_state() {
        let harness = GraphTestHarness::new();
        let outcome = harness
            .crawl_reduced(Scenario::TogglePage, build_user(), vec![mouse_only_user()])
            .expect("reduced fixture crawl never fails");
        assert_eq!(outcome.graph.state_count(), 2);
    }

    #[test]
    fn pooled_crawl_matches_single_threaded_state_count() {
        let harness = GraphTestHarness::new();
        let single = harness
            .crawl(Scenario::TogglePage, build_user(), vec![mouse_only_user()])
            .expect("single-threaded fixture crawl never fails");
        let pooled = harness
            .crawl_pooled(Scenario::TogglePage, build_user(), vec![mouse_only_user()], 4)
            .expect("pooled fixture crawl never fails");
        assert_eq!(single.graph.state_count(), pooled.graph.state_count());
        assert!(matches!(pooled.phases[0], RecordedPhase::AfterBuild { .. }));
    }

    #[test]
    fn keyboard_trap_crawl_flags_a_tab_order_trap() {
        let harness = GraphTestHarness::new();
        let outcome = harness
            .crawl(Scenario::KeyboardTrap, build_user(), vec![keyboard_only_user()])
            .expect("fixture crawl never fails");
        let report = outcome.analyze(&[keyboard_only_user()]);
        let total_violations: usize = report.states.values().map(|sv| sv.violations.len()).sum();
        assert!(total_violations > 0 || !report.layouts.is_empty());
    }

    #[test]
    fn mouse_only_user_cannot_reach_keyboard_only_form() {
        let harness = GraphTestHarness::new();
        let outcome = harness
            .crawl(Scenario::RequiredEmailForm, build_user(), vec![mouse_only_user()])
            .expect("fixture crawl never fails");
        assert_eq!(outcome.build_user, "build");
        assert_eq!(outcome.crawl_users, vec!["mouse_only".to_string()]);
    }
}
