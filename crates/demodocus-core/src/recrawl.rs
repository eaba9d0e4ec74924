//! C9: simulated re-crawl (§4.9).
//!
//! Given a graph already built by the build user, a non-build user re-walks
//! it purely from cached `BuildData` — no interface mutation occurs, which
//! is what makes this "simulated".

use crate::ability::{Axes, UserModel};
use crate::build_data::BuildData;
use crate::error::Result;
use crate::graph::{EdgeMetrics, Graph, StateId};
use crate::interface::InterfaceAccess;
use crate::web::WebStateData;
use std::collections::{HashSet, VecDeque};

/// Walk `graph` BFS from `start_state` with `user`, scoring every outgoing
/// edge whose `BuildData` was captured during the build pass and attaching
/// the result under `user.name()`. `measurement` supplies whatever
/// read-only measurement queries a scoring ability needs beyond what's
/// already cached in `BuildData` (e.g. a fixture backing store); it is
/// never mutated and no action is ever re-executed.
pub fn simulate_recrawl(
    graph: &Graph<WebStateData>,
    user: &UserModel,
    build_user_name: &str,
    measurement: &dyn InterfaceAccess,
) -> Result<()> {
    let Some(start) = graph.start_state() else {
        return Ok(());
    };

    let mut visited = HashSet::new();
    let mut queue = VecDeque::new();
    visited.insert(start);
    queue.push_back(start);

    while let Some(state_id) = queue.pop_front() {
        for edge in graph.edges_for_state(state_id, Some(build_user_name), true) {
            let Some(build_metrics) = edge.metrics_for(build_user_name) else {
                continue;
            };
            let Some(build_data) = build_metrics.build_data.clone() else {
                // §4.6: an edge whose BuildData was never captured is
                // rejected from re-crawl, logged rather than failed.
                tracing::warn!(
                    edge.element = edge.element(),
                    edge.action = edge.action(),
                    "skipping edge with uncaptured build data during simulated re-crawl"
                );
                continue;
            };

            let scored = score_edge(user, build_data, measurement, edge.element(), edge.action())?;
            if scored.ability_score <= 0.0 {
                continue;
            }

            edge.record_metrics(user.name(), scored.clone());
            let dst = edge.dst();
            if visited.insert(dst) {
                if let Some(dst_state) = graph.state(dst) {
                    let mut path = graph
                        .state(state_id)
                        .and_then(|s| s.path_for_user(user.name()))
                        .unwrap_or_default();
                    path.push(edge.clone());
                    dst_state.set_path_for_user_if_absent(user.name(), path);
                    if !dst_state.is_stub() {
                        queue.push_back(dst);
                    }
                }
            }
        }
    }

    Ok(())
}

fn score_edge(
    user: &UserModel,
    build_data: BuildData,
    measurement: &dyn InterfaceAccess,
    element: &str,
    action_name: &str,
) -> Result<EdgeMetrics> {
    let mut build_data = build_data;
    let result = user.score(Axes::ALL, &mut build_data, measurement, element, Some(action_name))?;
    let mut metrics = EdgeMetrics {
        ability_score: result.combined,
        pcv_score: result.pcv,
        nav_score: result.nav,
        act_score: result.act,
        act_time: None,
        error: None,
        build_data: Some(build_data),
    };
    if result.combined <= 0.0 {
        metrics.error = Some(format!("user '{}' scores 0 on action '{action_name}' at {element}", user.name()));
    }
    Ok(metrics)
}

#[allow(dead_code)]
fn _unused_state_id_type_check(_: StateId) {}
