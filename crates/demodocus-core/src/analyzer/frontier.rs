//! Accessible-if frontier (§4.10).

use super::subgraph::UserSubgraph;
use crate::graph::{Graph, StateId};
use crate::web::WebStateData;
use std::collections::HashSet;

/// One candidate state that would become reachable for `user` if the
/// elements in `blocking_elements` were made accessible.
#[derive(Debug, Clone)]
pub struct FrontierCandidate {
    pub state: StateId,
    pub new_states_included: usize,
    pub blocking_elements: Vec<String>,
}

/// Iteratively grow `user`'s subgraph with states just outside it that have
/// at least one incoming edge from inside the subgraph and at least one
/// outgoing edge whose action is already in `user`'s claimed action set
/// (§4.10 "Accessible-if frontier").
pub fn accessible_if_frontier(
    graph: &Graph<WebStateData>,
    subgraph: &UserSubgraph,
    claims_action: impl Fn(&str) -> bool,
) -> Vec<FrontierCandidate> {
    let mut included: HashSet<StateId> = subgraph.states.clone();
    let mut candidates = Vec::new();

    loop {
        let mut round_additions: Vec<(StateId, Vec<String>)> = Vec::new();

        for &state_id in &included.clone() {
            for edge in graph.all_edges() {
                if edge.src() != state_id || included.contains(&edge.dst()) {
                    continue;
                }
                let target = edge.dst();
                let Some(target_state) = graph.state(target) else { continue };
                if target_state.is_stub() {
                    continue;
                }
                let actions_capable = graph
                    .edges_for_state(target, None, false)
                    .into_iter()
                    .any(|e| claims_action(e.action()));
                if !actions_capable {
                    continue;
                }
                round_additions
                    .entry_or_push(target, edge.element().to_string());
            }
        }

        if round_additions.is_empty() {
            break;
        }

        let mut new_this_round = 0usize;
        for (state, blocking_elements) in round_additions {
            if included.insert(state) {
                new_this_round += 1;
                candidates.push(FrontierCandidate {
                    state,
                    new_states_included: new_this_round,
                    blocking_elements,
                });
            }
        }
    }

    candidates
}

trait EntryOrPush {
    fn entry_or_push(&mut self, state: StateId, element: String);
}

impl EntryOrPush for Vec<(StateId, Vec<String>)> {
    fn entry_or_push(&mut self, state: StateId, element: String) {
        if let Some(entry) = self.iter_mut().find(|entry| entry.0 == state) {
            if !entry.1.contains(&element) {
                entry.1.push(element);
            }
        } else {
            self.push((state, vec![element]));
        }
    }
}
