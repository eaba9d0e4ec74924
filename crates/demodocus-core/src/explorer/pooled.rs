//! Pooled explorer (§4.8 "Pooled explorer").
//!
//! A fixed-size worker pool shares one `Graph`; each worker owns its own
//! `InterfaceAccess` (strict affinity, §5). Work items are `(continuation,
//! args)` pairs realized here as a small `Task` enum pulled off a shared
//! channel. A worker that discovers `N` new states keeps the last for its
//! own continuation (skipping the channel) and enqueues the other `N - 1`
//! for peers; termination is a cooperative stop signal, one no-op per
//! worker, drained after the outstanding-task counter reaches zero.

use crate::ability::UserModel;
use crate::action::ActionRegistry;
use crate::comparator::Pipeline;
use crate::error::Result;
use crate::graph::{Graph, State, StateId};
use crate::interface::InterfaceAccess;
use crate::web::{ElementToExplore, WebStateData};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};

use super::reachability_delta;

enum Task {
    Bootstrap(String),
    Expand(StateId),
    Stop,
}

/// Builds a `Graph<WebStateData>` the same way [`super::single`] does, but
/// spread across `num_workers` threads, each driving its own
/// `InterfaceAccess` produced by a factory closure.
pub struct PooledExplorer {
    graph: Arc<Graph<WebStateData>>,
    actions: Arc<ActionRegistry>,
    user: UserModel,
    num_workers: usize,
    reduced: bool,
}

impl PooledExplorer {
    /// `reduced` restricts each worker's child exploration to the
    /// reachability delta the same way `SingleThreadedExplorer` does
    /// (§4.8 point 1); it does not add repeatable/reverse chaining, which
    /// stays single-threaded-only.
    pub fn new(
        actions: Arc<ActionRegistry>,
        pipeline: Pipeline,
        user: UserModel,
        num_workers: usize,
        reduced: bool,
    ) -> Self {
        Self {
            graph: Arc::new(Graph::new(pipeline)),
            actions,
            user,
            num_workers: num_workers.max(1),
            reduced,
        }
    }

    /// The graph built so far.
    pub fn graph(&self) -> Arc<Graph<WebStateData>> {
        self.graph.clone()
    }

    /// Run the pool to completion. `access_factory` is called once per
    /// worker thread to construct that worker's own `InterfaceAccess`.
    pub fn run<F>(&self, entry_point: &str, access_factory: F) -> Result<()>
    where
        F: Fn() -> Result<Box<dyn InterfaceAccess>> + Send + Sync + 'static,
    {
        let (tx, rx) = mpsc::channel::<Task>();
        let rx = Arc::new(Mutex::new(rx));
        let pending = Arc::new(AtomicUsize::new(1));
        let access_factory = Arc::new(access_factory);

        #[allow(clippy::expect_used)]
        tx.send(Task::Bootstrap(entry_point.to_string()))
            .expect("receiver outlives this send: workers haven't been spawned yet");

        std::thread::scope(|scope| {
            for _ in 0..self.num_workers {
                let rx = rx.clone();
                let tx = tx.clone();
                let graph = self.graph.clone();
                let actions = self.actions.clone();
                let user = self.user.clone();
                let factory = access_factory.clone();
                let pending = pending.clone();
                let num_workers = self.num_workers;

                let reduced = self.reduced;

                scope.spawn(move || {
                    let Ok(mut access) = factory() else { return };
                    let mut carried: Option<StateId> = None;

                    loop {
                        let task = if let Some(state_id) = carried.take() {
                            Task::Expand(state_id)
                        } else {
                            let Ok(task) = rx.lock().unwrap_or_else(|e| e.into_inner()).recv() else {
                                break;
                            };
                            task
                        };

                        match task {
                            Task::Stop => break,
                            Task::Bootstrap(entry) => {
                                let discovered =
                                    bootstrap(&graph, &actions, access.as_mut(), &entry, reduced).unwrap_or_default();
                                carried = dispatch(discovered, &tx, &pending);
                                pending.fetch_sub(1, Ordering::SeqCst);
                            }
                            Task::Expand(state_id) => {
                                if let Some(state) = graph.state(state_id) {
                                    if !state.is_stub() {
                                        let discovered =
                                            expand_state(&graph, &actions, &user, access.as_mut(), &state, reduced)
                                                .unwrap_or_default();
                                        carried = dispatch(discovered, &tx, &pending);
                                    }
                                }
                                pending.fetch_sub(1, Ordering::SeqCst);
                            }
                        }

                        if carried.is_none() && pending.load(Ordering::SeqCst) == 0 {
                            for _ in 0..num_workers {
                                let _ = tx.send(Task::Stop);
                            }
                            break;
                        }
                    }
                    access.shutdown();
                });
            }
        });

        Ok(())
    }
}

/// Send every discovered state except the last over the channel (bumping
/// `pending` for each), and return the last as this worker's own
/// continuation.
fn dispatch(mut discovered: Vec<StateId>, tx: &mpsc::Sender<Task>, pending: &AtomicUsize) -> Option<StateId> {
    let carried = discovered.pop();
    if !discovered.is_empty() {
        pending.fetch_add(discovered.len(), Ordering::SeqCst);
        for state_id in discovered {
            let _ = tx.send(Task::Expand(state_id));
        }
    }
    if carried.is_some() {
        pending.fetch_add(1, Ordering::SeqCst);
    }
    carried
}

fn bootstrap(
    graph: &Graph<WebStateData>,
    actions: &ActionRegistry,
    access: &mut dyn InterfaceAccess,
    entry_point: &str,
    reduced: bool,
) -> Result<Vec<StateId>> {
    if !access.load(entry_point)? {
        return Err(crate::error::Error::Config(format!(
            "failed to load entry point '{entry_point}'"
        )));
    }
    let data = access.state_data()?;
    let valid = access.is_state_valid()?;
    let (_, start) = graph.add_state(data, !valid)?;
    if reduced {
        start.data_mut().elements_to_explore = all_candidate_elements(actions, access)?;
    }
    Ok(vec![start.id()])
}

/// Every `(action, element)` pair currently offered at the live `access`
/// state, with no restriction.
fn all_candidate_elements(
    actions: &ActionRegistry,
    access: &mut dyn InterfaceAccess,
) -> Result<HashSet<ElementToExplore>> {
    let mut out = HashSet::new();
    for action in actions.all() {
        for element in action.get_elements(access)? {
            out.insert((action.name().to_string(), element));
        }
    }
    Ok(out)
}

/// The `(action, element)` pairs whose element just became reachable as a
/// result of the last transition, intersected per-action with that
/// action's own candidate elements at the new state (§4.8 point 1).
fn elements_to_explore_from_delta(
    actions: &ActionRegistry,
    access: &mut dyn InterfaceAccess,
    prior_raw_dom: &str,
    new_raw_dom: &str,
) -> Result<HashSet<ElementToExplore>> {
    let delta = reachability_delta(prior_raw_dom, new_raw_dom);
    if delta.is_empty() {
        return Ok(HashSet::new());
    }
    let mut out = HashSet::new();
    for action in actions.all() {
        for element in action.get_elements(access)? {
            if delta.contains(&element) {
                out.insert((action.name().to_string(), element));
            }
        }
    }
    Ok(out)
}

/// Expand one state: try every `(action, element)` pair in deterministic
/// order (restricted to `elements_to_explore` when `reduced`), recording
/// edges and newly discovered non-stub states. Unlike
/// [`super::single::SingleThreadedExplorer`], the pooled explorer does not
/// chase repeatable/reverse chains — that refinement is only specified for
/// the reduced single-threaded mode.
fn expand_state(
    graph: &Graph<WebStateData>,
    actions: &ActionRegistry,
    user: &UserModel,
    access: &mut dyn InterfaceAccess,
    state: &Arc<State<WebStateData>>,
    reduced: bool,
) -> Result<Vec<StateId>> {
    let data = state.data().clone();
    if !access.set_state_direct(&data)? {
        access.set_state(&data)?;
    }
    if state.data().tab_order.is_none() {
        let tab_order = access.generate_tab_order(None)?;
        state.data_mut().tab_order = Some(tab_order);
    }

    let restrict = if reduced {
        Some(state.data().elements_to_explore.clone())
    } else {
        None
    };

    let mut sorted_actions = actions.all();
    sorted_actions.sort_by(|a, b| a.name().cmp(b.name()));

    let mut discovered = Vec::new();
    for action in sorted_actions {
        let mut elements = action.get_elements(access)?;
        elements.sort();
        for element in elements {
            if let Some(set) = &restrict {
                if !set.contains(&(action.name().to_string(), element.clone())) {
                    continue;
                }
            }

            let metrics = action.execute(access, user, &element)?;
            if metrics.ability_score <= 0.0 {
                let data = state.data().clone();
                if !access.set_state_direct(&data)? {
                    access.set_state(&data)?;
                }
                continue;
            }

            let mut new_data = access.state_data()?;
            let valid = access.is_state_valid()?;
            new_data.elements_to_explore = if reduced {
                elements_to_explore_from_delta(actions, access, &state.data().raw_dom, &new_data.raw_dom)?
            } else {
                HashSet::new()
            };
            let (inserted, new_state) = graph.add_state(new_data, !valid)?;
            let edge = graph.add_edge(state.id(), new_state.id(), element.as_str(), action.name());
            edge.record_metrics(user.name(), metrics);

            if inserted {
                let mut path = state.path_for_user(user.name()).unwrap_or_default();
                path.push(edge);
                new_state.set_path_for_user_if_absent(user.name(), path);
                if !new_state.is_stub() {
                    discovered.push(new_state.id());
                }
            }

            let data = state.data().clone();
            if !access.set_state_direct(&data)? {
                access.set_state(&data)?;
            }
        }
    }

    Ok(discovered)
}
