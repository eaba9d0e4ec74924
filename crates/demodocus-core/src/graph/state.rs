//! State nodes (§3 "State").

use super::edge::Edge;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Dense, monotone state id assigned at insertion. Never reused.
pub type StateId = u64;

/// Opaque per-state payload. The web specialization (`WebStateData`) lives
/// in [`crate::web`]; the graph store itself only needs a string
/// representation to feed the comparator pipeline (C1).
pub trait StateData: fmt::Debug + Send + Sync {
    /// A string representation of this state used by the comparator
    /// pipeline to decide equality with other states.
    fn representation(&self) -> String;
}

/// A node in the graph.
#[derive(Debug)]
pub struct State<D: StateData> {
    id: StateId,
    data: parking_lot::RwLock<D>,
    /// Terminal/off-scope: never re-expanded (§3 invariant).
    stub: AtomicBool,
    /// Per-user shortest known path as an ordered list of edges, cached at
    /// first-discovery time by the explorer/simulated re-crawl.
    user_paths: parking_lot::Mutex<HashMap<String, Vec<Arc<Edge>>>>,
}

impl<D: StateData> State<D> {
    pub(crate) fn new(id: StateId, data: D, stub: bool) -> Self {
        Self {
            id,
            data: parking_lot::RwLock::new(data),
            stub: AtomicBool::new(stub),
            user_paths: parking_lot::Mutex::new(HashMap::new()),
        }
    }

    /// This state's dense id.
    pub fn id(&self) -> StateId {
        self.id
    }

    /// Whether this state is a stub (terminal/off-scope); stubs are never
    /// expanded by the explorer.
    pub fn is_stub(&self) -> bool {
        self.stub.load(Ordering::Acquire)
    }

    /// Mark this state as a stub.
    pub fn mark_stub(&self) {
        self.stub.store(true, Ordering::Release);
    }

    /// Read the state's payload.
    pub fn data(&self) -> parking_lot::RwLockReadGuard<'_, D> {
        self.data.read()
    }

    /// Mutably access the state's payload (e.g. to update
    /// `elements_to_explore` after discovery).
    pub fn data_mut(&self) -> parking_lot::RwLockWriteGuard<'_, D> {
        self.data.write()
    }

    /// The string representation used for comparator-pipeline equality.
    pub fn representation(&self) -> String {
        self.data.read().representation()
    }

    /// The cached shortest path for `user`, if one has been recorded.
    pub fn path_for_user(&self, user: &str) -> Option<Vec<Arc<Edge>>> {
        self.user_paths.lock().get(user).cloned()
    }

    /// Record the shortest path for `user`, but only if none is recorded
    /// yet (paths are set on first discovery and never overwritten).
    pub fn set_path_for_user_if_absent(&self, user: &str, path: Vec<Arc<Edge>>) {
        self.user_paths.lock().entry(user.to_string()).or_insert(path);
    }

    /// All users with a recorded path to this state.
    pub fn users_with_paths(&self) -> Vec<String> {
        self.user_paths.lock().keys().cloned().collect()
    }
}
