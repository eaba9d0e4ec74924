//! C8: the explorer (§4.8).
//!
//! Two variants share the module: [`single::SingleThreadedExplorer`] runs
//! the base DFS (optionally in "reduced" mode, which restricts child
//! exploration and chases repeatable/reverse action chains), and
//! [`pooled::PooledExplorer`] runs the same per-state expansion logic across
//! a fixed worker pool sharing one `Graph`.

pub mod pooled;
pub mod single;

pub use pooled::PooledExplorer;
pub use single::SingleThreadedExplorer;

use std::collections::HashSet;

/// The xpaths present in `new_raw_dom` but absent from `prior_raw_dom`: the
/// reachability delta a transition produced (§4.8 point 1, "elements that
/// became reachable as a result of the last action").
pub(crate) fn reachability_delta(prior_raw_dom: &str, new_raw_dom: &str) -> HashSet<String> {
    let prior: HashSet<String> = crate::template::tree::Arena::parse(prior_raw_dom)
        .xpaths()
        .into_values()
        .collect();
    let new: HashSet<String> = crate::template::tree::Arena::parse(new_raw_dom)
        .xpaths()
        .into_values()
        .collect();
    new.difference(&prior).cloned().collect()
}
