//! C10: the graph analyzer (§4.10).
//!
//! Runs after a build pass (and any simulated re-crawls) to derive
//! per-user reachability, an accessible-if frontier, network layouts, focus
//! analysis, and rule-evaluator violations, folded into one dense
//! per-state violation map.

pub mod focus;
pub mod frontier;
pub mod layout;
pub mod rules;
pub mod subgraph;
pub mod violation;

use crate::graph::{Graph, StateId};
use crate::web::WebStateData;
use focus::analyze_focus;
use frontier::{accessible_if_frontier, FrontierCandidate};
use layout::{compute_layouts, LayoutSet};
use rules::RuleContext;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use subgraph::{path_diff, PathDiffRow, UserSubgraph};
use violation::{StateViolations, Violation};

/// Everything the analyzer produces for one crawl user.
pub struct UserAnalysis {
    pub subgraph: UserSubgraph,
    pub path_diff: Vec<PathDiffRow>,
    pub frontier: Vec<FrontierCandidate>,
}

/// Full analyzer output (§4.10): per-state violations plus the supporting
/// per-user analyses and the shared network layouts.
pub struct AnalysisReport {
    pub states: HashMap<StateId, StateViolations>,
    pub per_user: HashMap<String, UserAnalysis>,
    pub layouts: LayoutSet,
}

/// Run the full analyzer over `graph` for `build_user` and every entry in
/// `crawl_users`. `claims_action`/`is_keyboard_action` let the analyzer
/// reason about a user's action set without depending on `UserModel`
/// directly (the analyzer only needs yes/no predicates, not scoring).
pub fn analyze(
    graph: &Graph<WebStateData>,
    build_user: &str,
    crawl_users: &[String],
    claims_action: impl Fn(&str, &str) -> bool,
    is_keyboard_action: impl Fn(&str) -> bool,
    style_contrast: impl Fn(&str, &str) -> f64,
) -> AnalysisReport {
    let build_subgraph = UserSubgraph::build(graph, build_user);

    let mut per_user = HashMap::new();
    for user in crawl_users {
        let subgraph = UserSubgraph::build(graph, user);
        let diff = path_diff(&build_subgraph, &subgraph);
        let frontier = accessible_if_frontier(graph, &subgraph, |action| claims_action(user, action));
        per_user.insert(
            user.clone(),
            UserAnalysis {
                subgraph,
                path_diff: diff,
                frontier,
            },
        );
    }

    let layouts = compute_layouts(graph);

    let group_id_counter = AtomicU64::new(0);
    let next_group_id = || group_id_counter.fetch_add(1, Ordering::Relaxed);

    let mut states = HashMap::new();
    let mut atomic_counts: HashMap<StateId, usize> = HashMap::new();

    for state in graph.states() {
        let incoming: Vec<_> = graph
            .all_edges()
            .into_iter()
            .filter(|e| e.dst() == state.id() && e.supports(build_user))
            .collect();
        let outgoing = graph.edges_for_state(state.id(), Some(build_user), true);

        let focus_finding = state
            .data()
            .tab_order
            .as_ref()
            .map(|tab_order| analyze_focus(tab_order, &style_contrast));

        let ctx = RuleContext {
            state: &state,
            incoming: &incoming,
            outgoing: &outgoing,
            focus: focus_finding.as_ref(),
            build_user,
            next_group_id: &next_group_id,
        };
        let violations = rules::run_base_rules(&ctx, &is_keyboard_action);
        atomic_counts.insert(state.id(), violations.len());

        let src = incoming.first().map(|e| e.src());
        states.insert(state.id(), StateViolations { src, violations });
    }

    // Composite violations: for every edge (s, t) where t's subtree (here,
    // just t itself — recursive subtree rollup is future work) carries at
    // least one atomic violation, record a composite on s.
    for edge in graph.all_edges() {
        if !edge.supports(build_user) {
            continue;
        }
        let num_issues = *atomic_counts.get(&edge.dst()).unwrap_or(&0);
        if num_issues == 0 {
            continue;
        }
        let Some(src_entry) = states.get_mut(&edge.src()) else { continue };
        src_entry.violations.push(Violation::Composite {
            level: violation::Level::Warning,
            element: violation::ElementLocator {
                x: 0.0,
                y: 0.0,
                width: 0.0,
                height: 0.0,
                xpath: edge.element().to_string(),
                text: String::new(),
                tag: String::new(),
            },
            num_issues,
            state_link: edge.dst(),
            group_id: next_group_id(),
        });
    }

    AnalysisReport {
        states,
        per_user,
        layouts,
    }
}
