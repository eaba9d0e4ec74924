//! Single-threaded DFS explorer (§4.8 "Single-threaded DFS", "Reduced DFS").

use crate::ability::UserModel;
use crate::action::{Action, ActionRegistry};
use crate::comparator::Pipeline;
use crate::error::{Error, Result};
use crate::graph::{Edge, Graph, State, StateId};
use crate::interface::InterfaceAccess;
use crate::web::{ElementToExplore, WebStateData};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use super::reachability_delta;

/// Bound on how many times a repeatable action may be chained to the same
/// element before the reduced explorer gives up revealing further states
/// (§4.8 point 2).
const MAX_REPEAT_CHAIN: u32 = 16;

/// Drives one `InterfaceAccess` through a DFS over reachable states,
/// building a `Graph<WebStateData>` as it goes (§4.8).
pub struct SingleThreadedExplorer {
    graph: Arc<Graph<WebStateData>>,
    actions: Arc<ActionRegistry>,
    user: UserModel,
    access: Box<dyn InterfaceAccess>,
    reduced: bool,
}

impl SingleThreadedExplorer {
    /// Build an explorer over a fresh graph using `pipeline` for state
    /// equality. `reduced` selects the restricted-child/repeat/reverse
    /// behavior of §4.8's "Reduced DFS"; otherwise every `(action,
    /// element)` pair is attempted at every non-stub state.
    pub fn new(
        access: Box<dyn InterfaceAccess>,
        actions: Arc<ActionRegistry>,
        pipeline: Pipeline,
        user: UserModel,
        reduced: bool,
    ) -> Self {
        Self {
            graph: Arc::new(Graph::new(pipeline)),
            actions,
            user,
            access,
            reduced,
        }
    }

    /// The graph built so far (shareable; cheap to clone the `Arc`).
    pub fn graph(&self) -> Arc<Graph<WebStateData>> {
        self.graph.clone()
    }

    /// This explorer's interface, reused by the orchestrator for simulated
    /// re-crawls (which only ever read cached `BuildData` through it).
    pub fn access(&self) -> &dyn InterfaceAccess {
        self.access.as_ref()
    }

    /// Run the DFS from `entry_point` to exhaustion: every state reachable
    /// from `start_state` via edges supporting the build user is visited
    /// and, unless a stub, fully expanded once.
    pub fn run(&mut self, entry_point: &str) -> Result<()> {
        if !self.access.load(entry_point)? {
            return Err(Error::Config(format!("failed to load entry point '{entry_point}'")));
        }

        let data = self.access.state_data()?;
        let valid = self.access.is_state_valid()?;
        let (_, start) = self.graph.add_state(data, !valid)?;

        if self.reduced {
            // No prior state to diff against: every currently reachable
            // candidate is fair game from the entry point (§4.8 point 1,
            // mirroring the original's behavior of seeding the start
            // state's restriction set from all reachable elements).
            let initial = self.all_candidate_elements()?;
            start.data_mut().elements_to_explore = initial;
        }

        let mut stack = vec![start.id()];
        let mut paths: HashMap<StateId, Vec<Arc<Edge>>> = HashMap::new();
        paths.insert(start.id(), Vec::new());
        let mut visited_for_expansion: HashSet<StateId> = HashSet::new();

        while let Some(state_id) = stack.pop() {
            if !visited_for_expansion.insert(state_id) {
                continue;
            }
            let Some(state) = self.graph.state(state_id) else {
                continue;
            };
            if state.is_stub() {
                continue;
            }
            self.expand_state(&state, &mut paths, &mut stack)?;
        }

        Ok(())
    }

    fn expand_state(
        &mut self,
        state: &Arc<State<WebStateData>>,
        paths: &mut HashMap<StateId, Vec<Arc<Edge>>>,
        stack: &mut Vec<StateId>,
    ) -> Result<()> {
        self.restore(state)?;
        self.ensure_tab_order(state)?;

        let restrict = if self.reduced {
            Some(state.data().elements_to_explore.clone())
        } else {
            None
        };

        let mut candidates: Vec<(Arc<dyn Action>, String)> = Vec::new();
        let mut sorted_actions = self.actions.all();
        sorted_actions.sort_by(|a, b| a.name().cmp(b.name()));
        for action in sorted_actions {
            let elements = action.get_elements(self.access.as_mut())?;
            for element in elements {
                if let Some(set) = &restrict {
                    if !set.contains(&(action.name().to_string(), element.clone())) {
                        continue;
                    }
                }
                candidates.push((action.clone(), element));
            }
        }
        candidates.sort_by(|a, b| (a.0.name(), a.1.as_str()).cmp(&(b.0.name(), b.1.as_str())));

        for (action, element) in candidates {
            self.try_one(&action, &element, state, paths, stack)?;
            self.restore(state)?;
        }

        Ok(())
    }

    /// Attempt `action` on `element` from `state`; on success, chain
    /// repeatable actions and reverse them in reduced mode (§4.8 points
    /// 2-3).
    fn try_one(
        &mut self,
        action: &Arc<dyn Action>,
        element: &str,
        state: &Arc<State<WebStateData>>,
        paths: &mut HashMap<StateId, Vec<Arc<Edge>>>,
        stack: &mut Vec<StateId>,
    ) -> Result<()> {
        let metrics = action.execute(self.access.as_mut(), &self.user, element)?;
        if metrics.ability_score <= 0.0 {
            return Ok(());
        }

        let (new_state, edge) = self.observe_transition(state, element, action.name(), metrics)?;
        self.record_discovery(state.id(), &new_state, &edge, paths, stack)?;

        if self.reduced && action.repeatable() && !new_state.is_stub() {
            self.chain_repeatable(action, element, &new_state, paths, stack)?;
        }

        Ok(())
    }

    /// Repeat `action` on `element` from `chain_head` up to
    /// `MAX_REPEAT_CHAIN` times, recording each new state and edge, then
    /// walk the chain backwards attempting `action.reverse()` (§4.8 points
    /// 2-3).
    fn chain_repeatable(
        &mut self,
        action: &Arc<dyn Action>,
        element: &str,
        chain_head: &Arc<State<WebStateData>>,
        paths: &mut HashMap<StateId, Vec<Arc<Edge>>>,
        stack: &mut Vec<StateId>,
    ) -> Result<()> {
        let mut chain = vec![chain_head.clone()];
        let mut current = chain_head.clone();

        for _ in 0..MAX_REPEAT_CHAIN {
            self.restore(&current)?;
            let metrics = action.execute(self.access.as_mut(), &self.user, element)?;
            if metrics.ability_score <= 0.0 {
                break;
            }
            let (new_state, edge) = self.observe_transition(&current, element, action.name(), metrics)?;
            let is_new = self.record_discovery(current.id(), &new_state, &edge, paths, stack)?;
            if !is_new || new_state.is_stub() {
                break;
            }
            chain.push(new_state.clone());
            current = new_state;
        }

        let Some(reverse) = action.reverse() else {
            return Ok(());
        };
        for window in chain.windows(2).rev() {
            let [from, to] = window else { unreachable!() };
            let _ = to;
            self.restore(from)?;
            let metrics = reverse.execute(self.access.as_mut(), &self.user, element)?;
            if metrics.ability_score <= 0.0 {
                break;
            }
            let (landed, edge) = self.observe_transition(from, element, reverse.name(), metrics)?;
            self.record_discovery(from.id(), &landed, &edge, paths, stack)?;
            if !reverse.repeatable() {
                break;
            }
        }
        Ok(())
    }

    fn observe_transition(
        &mut self,
        src_state: &Arc<State<WebStateData>>,
        element: &str,
        action_name: &str,
        metrics: crate::graph::EdgeMetrics,
    ) -> Result<(Arc<State<WebStateData>>, Arc<Edge>)> {
        let mut new_data = self.access.state_data()?;
        let valid = self.access.is_state_valid()?;
        new_data.elements_to_explore = if self.reduced {
            let prior_raw_dom = src_state.data().raw_dom.clone();
            self.elements_to_explore_from_delta(&prior_raw_dom, &new_data.raw_dom)?
        } else {
            HashSet::new()
        };
        let (_, new_state) = self.graph.add_state(new_data, !valid)?;
        let edge = self.graph.add_edge(src_state.id(), new_state.id(), element, action_name);
        edge.record_metrics(self.user.name(), metrics);
        Ok((new_state, edge))
    }

    /// Every `(action, element)` pair currently offered at the live
    /// `access` state, with no restriction (used to seed the start state's
    /// `elements_to_explore` in reduced mode, where there is no prior state
    /// to diff against).
    fn all_candidate_elements(&mut self) -> Result<HashSet<ElementToExplore>> {
        let mut out = HashSet::new();
        for action in self.actions.all() {
            for element in action.get_elements(self.access.as_mut())? {
                out.insert((action.name().to_string(), element));
            }
        }
        Ok(out)
    }

    /// The `(action, element)` pairs whose element just became reachable as
    /// a result of the last transition: the xpaths present in the new DOM
    /// but absent from the prior one (the reachability delta), intersected
    /// per-action with that action's own candidate elements at the new
    /// state (§4.8 point 1).
    fn elements_to_explore_from_delta(
        &mut self,
        prior_raw_dom: &str,
        new_raw_dom: &str,
    ) -> Result<HashSet<ElementToExplore>> {
        let delta = reachability_delta(prior_raw_dom, new_raw_dom);
        if delta.is_empty() {
            return Ok(HashSet::new());
        }
        let mut out = HashSet::new();
        for action in self.actions.all() {
            for element in action.get_elements(self.access.as_mut())? {
                if delta.contains(&element) {
                    out.insert((action.name().to_string(), element));
                }
            }
        }
        Ok(out)
    }

    /// Record the first-discovery path on `new_state` if it is genuinely
    /// new, and push it for expansion. Returns whether this was a new
    /// discovery (as opposed to landing on an already-known state).
    fn record_discovery(
        &mut self,
        src: StateId,
        new_state: &Arc<State<WebStateData>>,
        edge: &Arc<Edge>,
        paths: &mut HashMap<StateId, Vec<Arc<Edge>>>,
        stack: &mut Vec<StateId>,
    ) -> Result<bool> {
        if paths.contains_key(&new_state.id()) {
            return Ok(false);
        }
        let mut path = paths.get(&src).cloned().unwrap_or_default();
        path.push(edge.clone());
        new_state.set_path_for_user_if_absent(self.user.name(), path.clone());
        paths.insert(new_state.id(), path);
        if !new_state.is_stub() {
            stack.push(new_state.id());
        }
        Ok(true)
    }

    fn ensure_tab_order(&mut self, state: &Arc<State<WebStateData>>) -> Result<()> {
        if state.data().tab_order.is_some() {
            return Ok(());
        }
        let tab_order = self.access.generate_tab_order(None)?;
        state.data_mut().tab_order = Some(tab_order);
        Ok(())
    }

    /// Restore the interface to `state`, preferring the cheap
    /// `set_state_direct` and falling back to a full `set_state` replay
    /// (§4.8: "restore the previous state... if the state is considered
    /// drifted").
    fn restore(&mut self, state: &Arc<State<WebStateData>>) -> Result<()> {
        let data = state.data().clone();
        if !self.access.set_state_direct(&data)? {
            self.access.set_state(&data)?;
        }
        Ok(())
    }
}
