//! C3: interned state/edge store (§4.3).

pub mod edge;
pub mod state;

pub use edge::{Edge, EdgeMetrics};
pub use state::{State, StateData, StateId};

use crate::comparator::Pipeline;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

struct Inner<D: StateData> {
    states: Vec<Arc<State<D>>>,
    adjacency: HashMap<StateId, Vec<Arc<Edge>>>,
    start_state: Option<StateId>,
    next_id: StateId,
}

/// The thread-safe state/edge store (§4.3). All mutating operations are
/// serialized by a single writer lock; readers lock only long enough to
/// snapshot what they need.
pub struct Graph<D: StateData> {
    inner: parking_lot::Mutex<Inner<D>>,
    pipeline: Pipeline,
}

impl<D: StateData> Graph<D> {
    /// Build an empty graph using `pipeline` to decide state equality.
    pub fn new(pipeline: Pipeline) -> Self {
        Self {
            inner: parking_lot::Mutex::new(Inner {
                states: Vec::new(),
                adjacency: HashMap::new(),
                start_state: None,
                next_id: 0,
            }),
            pipeline,
        }
    }

    /// Number of states currently in the graph.
    pub fn state_count(&self) -> usize {
        self.inner.lock().states.len()
    }

    /// The first state ever inserted, if any (§3 invariant: set iff
    /// `|states| > 0`).
    pub fn start_state(&self) -> Option<StateId> {
        self.inner.lock().start_state
    }

    /// Look up a state by id.
    pub fn state(&self, id: StateId) -> Option<Arc<State<D>>> {
        let guard = self.inner.lock();
        guard.states.iter().find(|s| s.id() == id).cloned()
    }

    /// All states currently in the graph, in insertion order.
    pub fn states(&self) -> Vec<Arc<State<D>>> {
        self.inner.lock().states.clone()
    }

    /// ADD STATE (§4.3): insert `data` if no existing state compares equal
    /// via the comparator pipeline; otherwise return the existing state.
    /// Returns `(inserted, state)`.
    pub fn add_state(&self, data: D, stub: bool) -> crate::error::Result<(bool, Arc<State<D>>)> {
        let representation = data.representation();
        let mut guard = self.inner.lock();

        for existing in &guard.states {
            if self.pipeline.compare(&existing.representation(), &representation)? {
                return Ok((false, existing.clone()));
            }
        }

        let id = guard.next_id;
        guard.next_id += 1;
        let state = Arc::new(State::new(id, data, stub));
        guard.states.push(state.clone());
        guard.adjacency.entry(id).or_default();
        if guard.start_state.is_none() {
            guard.start_state = Some(id);
        }
        Ok((true, state))
    }

    /// Insert a new edge. Duplicates are allowed (multigraph).
    pub fn add_edge(&self, src: StateId, dst: StateId, element: impl Into<String>, action: impl Into<String>) -> Arc<Edge> {
        let edge = Arc::new(Edge::new(src, dst, element, action));
        let mut guard = self.inner.lock();
        guard.adjacency.entry(src).or_default().push(edge.clone());
        edge
    }

    /// Outgoing edges of `state`, optionally filtered to only those that
    /// `user` has a recorded metrics entry for, optionally sorted
    /// deterministically by `(src, dst)`.
    pub fn edges_for_state(&self, state: StateId, user: Option<&str>, sorted: bool) -> Vec<Arc<Edge>> {
        let mut edges = {
            let guard = self.inner.lock();
            guard.adjacency.get(&state).cloned().unwrap_or_default()
        };
        if let Some(user) = user {
            edges.retain(|e| e.supports(user));
        }
        if sorted {
            edges.sort_by_key(|e| (e.src(), e.dst()));
        }
        edges
    }

    /// All edges in the graph (used by the analyzer).
    pub fn all_edges(&self) -> Vec<Arc<Edge>> {
        let guard = self.inner.lock();
        guard.adjacency.values().flatten().cloned().collect()
    }

    /// BFS over edges supporting `user`, returning the first discovered
    /// shortest path from `s1` to `s2` as an ordered list of edges, or
    /// `None` if unreachable. If `s1` is the graph's start state, the
    /// cached path on `s2` is returned instead (§4.3).
    pub fn path(&self, s1: StateId, s2: StateId, user: &str) -> Option<Vec<Arc<Edge>>> {
        if s1 == s2 {
            return Some(Vec::new());
        }
        if Some(s1) == self.start_state() {
            if let Some(state) = self.state(s2) {
                if let Some(cached) = state.path_for_user(user) {
                    return Some(cached);
                }
            }
        }

        let mut visited = std::collections::HashSet::new();
        let mut queue = VecDeque::new();
        visited.insert(s1);
        queue.push_back((s1, Vec::<Arc<Edge>>::new()));

        while let Some((current, path)) = queue.pop_front() {
            if current == s2 {
                return Some(path);
            }
            for edge in self.edges_for_state(current, Some(user), true) {
                let next = edge.dst();
                if visited.insert(next) {
                    let mut next_path = path.clone();
                    next_path.push(edge);
                    queue.push_back((next, next_path));
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comparator::default_pipeline;

    #[derive(Debug, Clone)]
    struct Data(String);
    impl StateData for Data {
        fn representation(&self) -> String {
            self.0.clone()
        }
    }

    #[test]
    fn start_state_is_set_iff_nonempty() {
        let g = Graph::new(default_pipeline());
        assert!(g.start_state().is_none());
        g.add_state(Data("<html></html>".into()), false).unwrap();
        assert!(g.start_state().is_some());
    }

    #[test]
    fn add_state_dedupes_and_returns_inserted_false_on_repeat() {
        let g = Graph::new(default_pipeline());
        let (ins1, s1) = g.add_state(Data("<html><body>a</body></html>".into()), false).unwrap();
        let (ins2, s2) = g.add_state(Data("<html><body>a</body></html>".into()), false).unwrap();
        assert!(ins1);
        assert!(!ins2);
        assert_eq!(s1.id(), s2.id());
    }

    #[test]
    fn path_to_self_is_empty() {
        let g = Graph::new(default_pipeline());
        let (_, s) = g.add_state(Data("<html></html>".into()), false).unwrap();
        assert_eq!(g.path(s.id(), s.id(), "build"), Some(Vec::new()));
    }

    #[test]
    fn path_follows_edges_supporting_user() {
        let g = Graph::new(default_pipeline());
        let (_, s0) = g.add_state(Data("<html><body>0</body></html>".into()), false).unwrap();
        let (_, s1) = g.add_state(Data("<html><body>1</body></html>".into()), false).unwrap();
        let edge = g.add_edge(s0.id(), s1.id(), "/html/body/button[1]", "click");
        edge.record_metrics("build", EdgeMetrics { ability_score: 1.0, ..Default::default() });
        let path = g.path(s0.id(), s1.id(), "build").unwrap();
        assert_eq!(path.len(), 1);
    }

    #[test]
    fn edges_for_state_filters_by_user_support() {
        let g = Graph::new(default_pipeline());
        let (_, s0) = g.add_state(Data("<html><body>0</body></html>".into()), false).unwrap();
        let (_, s1) = g.add_state(Data("<html><body>1</body></html>".into()), false).unwrap();
        let edge = g.add_edge(s0.id(), s1.id(), "/html/body/button[1]", "click");
        edge.record_metrics("build", EdgeMetrics { ability_score: 1.0, ..Default::default() });
        assert_eq!(g.edges_for_state(s0.id(), Some("build"), true).len(), 1);
        assert_eq!(g.edges_for_state(s0.id(), Some("screenreader"), true).len(), 0);
    }
}
