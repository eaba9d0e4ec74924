//! Edges and per-user edge metrics (§3 "Edge", "EdgeMetrics").

use crate::build_data::BuildData;
use std::collections::HashMap;

use super::state::StateId;

/// Per-user numeric outcome of traversing one edge (§3 "EdgeMetrics").
///
/// All fields obey monotone-best update: overwrite only if strictly better
/// on that field (higher for scores, lower for timings) — see
/// [`EdgeMetrics::merge_best`].
#[derive(Debug, Clone, Default)]
pub struct EdgeMetrics {
    /// Combined perceive+navigate+act ability score in `[0, 1]`.
    pub ability_score: f64,
    /// Perceive-axis score in `[0, 1]`.
    pub pcv_score: f64,
    /// Navigate-axis score in `[0, 1]`.
    pub nav_score: f64,
    /// Act-axis score in `[0, 1]`.
    pub act_score: f64,
    /// Wall-clock time the action took to execute, if it ran.
    pub act_time: Option<std::time::Duration>,
    /// Set when the action failed or was never attempted.
    pub error: Option<String>,
    /// Interface measurements captured during the build pass.
    pub build_data: Option<BuildData>,
}

impl EdgeMetrics {
    /// A zero-score result, used when an action is gated out or fails.
    pub fn zero_with_error(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Default::default()
        }
    }

    /// Merge `new` into `self`, keeping the maximum-ability observation per
    /// field (§3 "Edge" invariant): scores take the max, `act_time` takes
    /// the min, `build_data`/`error` are taken from `new` only if `self`
    /// doesn't already have one.
    pub fn merge_best(&mut self, new: EdgeMetrics) {
        self.ability_score = self.ability_score.max(new.ability_score);
        self.pcv_score = self.pcv_score.max(new.pcv_score);
        self.nav_score = self.nav_score.max(new.nav_score);
        self.act_score = self.act_score.max(new.act_score);
        self.act_time = match (self.act_time, new.act_time) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (Some(a), None) => Some(a),
            (None, b) => b,
        };
        if self.build_data.is_none() {
            self.build_data = new.build_data;
        }
        if new.error.is_none() {
            self.error = None;
        } else if self.error.is_none() {
            self.error = new.error;
        }
    }
}

/// A directed transition between states, labeled by `(element, action)`.
/// The graph is a multigraph: duplicate `(src, dst, element, action)`
/// tuples are allowed.
#[derive(Debug)]
pub struct Edge {
    src: StateId,
    dst: StateId,
    element: String,
    action: String,
    user_metrics: parking_lot::Mutex<HashMap<String, EdgeMetrics>>,
}

impl Edge {
    pub(crate) fn new(src: StateId, dst: StateId, element: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            src,
            dst,
            element: element.into(),
            action: action.into(),
            user_metrics: parking_lot::Mutex::new(HashMap::new()),
        }
    }

    /// Source state id.
    pub fn src(&self) -> StateId {
        self.src
    }

    /// Destination state id.
    pub fn dst(&self) -> StateId {
        self.dst
    }

    /// The element xpath/identifier this edge was taken on.
    pub fn element(&self) -> &str {
        &self.element
    }

    /// The action name this edge represents.
    pub fn action(&self) -> &str {
        &self.action
    }

    /// Whether `user` has a (possibly zero-score) recorded metrics entry.
    pub fn supports(&self, user: &str) -> bool {
        self.user_metrics.lock().contains_key(user)
    }

    /// Whether `user`'s recorded metrics have a positive ability score.
    pub fn is_traversable_by(&self, user: &str) -> bool {
        self.user_metrics
            .lock()
            .get(user)
            .map(|m| m.ability_score > 0.0)
            .unwrap_or(false)
    }

    /// Snapshot of `user`'s metrics, if recorded.
    pub fn metrics_for(&self, user: &str) -> Option<EdgeMetrics> {
        self.user_metrics.lock().get(user).cloned()
    }

    /// All users with recorded metrics on this edge.
    pub fn users(&self) -> Vec<String> {
        self.user_metrics.lock().keys().cloned().collect()
    }

    /// Merge `metrics` into the stored entry for `user` using the
    /// monotone-best policy (§3 "Edge" invariant), inserting a fresh entry
    /// if `user` has none yet.
    pub fn record_metrics(&self, user: &str, metrics: EdgeMetrics) {
        let mut guard = self.user_metrics.lock();
        guard
            .entry(user.to_string())
            .and_modify(|existing| existing.merge_best(metrics.clone()))
            .or_insert(metrics);
    }
}
