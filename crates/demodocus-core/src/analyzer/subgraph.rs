//! Per-user subgraph and path-diff against the build user (§4.10).

use crate::graph::{Graph, StateId};
use crate::web::WebStateData;
use std::collections::{HashMap, HashSet, VecDeque};

/// The edge-induced subgraph reachable by `user`: every state reachable
/// from `start_state` via edges with a positive `user` ability score, plus
/// the start state itself regardless of whether it has any such edges.
pub struct UserSubgraph {
    pub user: String,
    pub states: HashSet<StateId>,
    adjacency: HashMap<StateId, Vec<(StateId, f64)>>,
}

impl UserSubgraph {
    pub fn build(graph: &Graph<WebStateData>, user: &str) -> Self {
        let mut states = HashSet::new();
        let mut adjacency: HashMap<StateId, Vec<(StateId, f64)>> = HashMap::new();

        let Some(start) = graph.start_state() else {
            return Self {
                user: user.to_string(),
                states,
                adjacency,
            };
        };
        states.insert(start);

        let mut queue = VecDeque::from([start]);
        let mut seen = HashSet::from([start]);
        while let Some(state_id) = queue.pop_front() {
            for edge in graph.edges_for_state(state_id, Some(user), true) {
                let Some(metrics) = edge.metrics_for(user) else { continue };
                if metrics.ability_score <= 0.0 {
                    continue;
                }
                let dst = edge.dst();
                states.insert(dst);
                adjacency
                    .entry(state_id)
                    .or_default()
                    .push((dst, 1.0 - metrics.ability_score));
                if seen.insert(dst) {
                    queue.push_back(dst);
                }
            }
        }

        Self {
            user: user.to_string(),
            states,
            adjacency,
        }
    }

    /// Unweighted and weighted shortest-path lengths from `start` to every
    /// state in this subgraph (weights = `1 − ability_score`, §4.10).
    pub fn shortest_paths(&self, start: StateId) -> HashMap<StateId, (u32, f64)> {
        let mut best: HashMap<StateId, (u32, f64)> = HashMap::new();
        best.insert(start, (0, 0.0));

        // Bellman-Ford style relaxation: edge weights are non-negative
        // (`1 − ability_score` with `ability_score ∈ (0, 1]`), so a bounded
        // number of passes over the (typically small) subgraph suffices
        // without pulling in a dedicated shortest-path crate dependency.
        let nodes: Vec<StateId> = self.states.iter().copied().collect();
        for _ in 0..nodes.len().max(1) {
            let mut changed = false;
            for &u in &nodes {
                let Some(&(hops, weight)) = best.get(&u) else { continue };
                for &(v, edge_weight) in self.adjacency.get(&u).map(|e| e.as_slice()).unwrap_or(&[]) {
                    let candidate = (hops + 1, weight + edge_weight);
                    let better = match best.get(&v) {
                        None => true,
                        Some(&(_, existing_weight)) => candidate.1 < existing_weight,
                    };
                    if better {
                        best.insert(v, candidate);
                        changed = true;
                    }
                }
            }
            if !changed {
                break;
            }
        }
        best
    }
}

/// One row of the path-diff table (§4.10).
#[derive(Debug, Clone)]
pub struct PathDiffRow {
    pub from: StateId,
    pub to: StateId,
    pub hop_increase: i64,
    pub weight_delta: f64,
}

/// Compare `user_graph`'s shortest paths against `build_graph`'s, over every
/// ordered pair reachable in the user subgraph, sorted by
/// `(hop_increase desc, weight_delta desc)` (§4.10).
pub fn path_diff(build_graph: &UserSubgraph, user_graph: &UserSubgraph) -> Vec<PathDiffRow> {
    let mut rows = Vec::new();
    for &from in &user_graph.states {
        let user_paths = user_graph.shortest_paths(from);
        let build_paths = build_graph.shortest_paths(from);
        for (&to, &(user_hops, user_weight)) in &user_paths {
            if to == from {
                continue;
            }
            let Some(&(build_hops, build_weight)) = build_paths.get(&to) else {
                continue;
            };
            rows.push(PathDiffRow {
                from,
                to,
                hop_increase: user_hops as i64 - build_hops as i64,
                weight_delta: user_weight - build_weight,
            });
        }
    }
    rows.sort_by(|a, b| {
        b.hop_increase
            .cmp(&a.hop_increase)
            .then(b.weight_delta.partial_cmp(&a.weight_delta).unwrap_or(std::cmp::Ordering::Equal))
    });
    rows
}
