//! C11: the orchestrator (§4.11).
//!
//! Sequences entry points through the build pass, report emission,
//! simulated re-crawls, and re-emission. Report writing itself is an
//! external collaborator's job (`demodocus-cli`'s GML/JSON/Markdown/CSV
//! writers, §4.14) — the orchestrator only decides *when* to call it.

use crate::ability::UserModel;
use crate::action::ActionRegistry;
use crate::comparator::Pipeline;
use crate::config::Multi;
use crate::error::Result;
use crate::explorer::{PooledExplorer, SingleThreadedExplorer};
use crate::graph::Graph;
use crate::interface::InterfaceAccess;
use crate::recrawl::simulate_recrawl;
use crate::web::WebStateData;
use std::sync::Arc;

/// Which point in one entry point's lifecycle a report emission call
/// corresponds to.
pub enum ReportPhase<'a> {
    /// The build pass for `entry_point` just finished.
    AfterBuild { entry_point: &'a str },
    /// A simulated re-crawl for `user` just finished.
    AfterRecrawl { entry_point: &'a str, user: &'a str },
}

/// An external collaborator that turns a finished graph into on-disk
/// reports. `demodocus-cli` provides the concrete GML/JSON/Markdown/CSV
/// implementation; the orchestrator only calls this at the right times.
pub trait ReportSink {
    fn emit(&self, graph: &Graph<WebStateData>, phase: ReportPhase<'_>) -> Result<()>;
}

/// A no-op sink, useful for tests and for `demo`-style runs that only want
/// the in-memory graph.
pub struct NullReportSink;
impl ReportSink for NullReportSink {
    fn emit(&self, _graph: &Graph<WebStateData>, _phase: ReportPhase<'_>) -> Result<()> {
        Ok(())
    }
}

/// Drives one crawl across every configured entry point (§4.11).
pub struct Orchestrator {
    actions: Arc<ActionRegistry>,
    build_user: UserModel,
    crawl_users: Vec<UserModel>,
    reduced: bool,
    multi: Multi,
    num_threads: usize,
}

impl Orchestrator {
    /// `reduced` selects §4.8's "Reduced DFS" behavior regardless of
    /// scheduling mode. `multi`/`num_threads` select between the *Single*
    /// and *Pooled* scheduling modes of §4.11/§5; `num_threads` is ignored
    /// under `Multi::Single`.
    pub fn new(actions: Arc<ActionRegistry>, build_user: UserModel, crawl_users: Vec<UserModel>, reduced: bool) -> Self {
        Self {
            actions,
            build_user,
            crawl_users,
            reduced,
            multi: Multi::Single,
            num_threads: 1,
        }
    }

    /// Select *Pooled* scheduling with `num_threads` workers (§4.11/§5),
    /// in place of the default single-threaded DFS.
    pub fn with_pool(mut self, num_threads: usize) -> Self {
        self.multi = Multi::Pooled;
        self.num_threads = num_threads.max(1);
        self
    }

    /// Run the full sequence for `entry_points`, each materialized through
    /// `access_factory` (called with the entry point being processed).
    /// Reports are emitted through `reports` after the build pass and
    /// after each crawl user's simulated re-crawl. Returns one graph per
    /// entry point, in order.
    ///
    /// `stop_pool`, if given, is invoked once after every entry point has
    /// been processed (§4.11: "After all entry points, stop the pool, if
    /// any") — a hook for a caller that shares a `PooledExplorer`'s workers
    /// across entry points rather than recreating them each time.
    pub fn run<F>(
        &self,
        entry_points: &[String],
        pipeline_factory: impl Fn() -> Pipeline,
        access_factory: F,
        reports: &dyn ReportSink,
        stop_pool: Option<&dyn Fn()>,
    ) -> Result<Vec<Arc<Graph<WebStateData>>>>
    where
        F: Fn(&str) -> Result<Box<dyn InterfaceAccess>> + Send + Sync + 'static,
    {
        let access_factory = Arc::new(access_factory);
        let mut graphs = Vec::with_capacity(entry_points.len());

        for entry_point in entry_points {
            let graph = match self.multi {
                Multi::Single => self.run_single(entry_point, pipeline_factory(), &access_factory, reports)?,
                Multi::Pooled => self.run_pooled(entry_point, pipeline_factory(), &access_factory, reports)?,
            };
            graphs.push(graph);
        }

        if let Some(stop_pool) = stop_pool {
            stop_pool();
        }

        Ok(graphs)
    }

    fn run_single<F>(
        &self,
        entry_point: &str,
        pipeline: Pipeline,
        access_factory: &Arc<F>,
        reports: &dyn ReportSink,
    ) -> Result<Arc<Graph<WebStateData>>>
    where
        F: Fn(&str) -> Result<Box<dyn InterfaceAccess>>,
    {
        let access = access_factory.as_ref()(entry_point)?;
        let mut explorer =
            SingleThreadedExplorer::new(access, self.actions.clone(), pipeline, self.build_user.clone(), self.reduced);
        explorer.run(entry_point)?;
        let graph = explorer.graph();

        reports.emit(&graph, ReportPhase::AfterBuild { entry_point })?;

        for user in &self.crawl_users {
            simulate_recrawl(&graph, user, self.build_user.name(), explorer.access())?;
            reports.emit(
                &graph,
                ReportPhase::AfterRecrawl {
                    entry_point,
                    user: user.name(),
                },
            )?;
        }

        Ok(graph)
    }

    fn run_pooled<F>(
        &self,
        entry_point: &str,
        pipeline: Pipeline,
        access_factory: &Arc<F>,
        reports: &dyn ReportSink,
    ) -> Result<Arc<Graph<WebStateData>>>
    where
        F: Fn(&str) -> Result<Box<dyn InterfaceAccess>> + Send + Sync + 'static,
    {
        let explorer = PooledExplorer::new(
            self.actions.clone(),
            pipeline,
            self.build_user.clone(),
            self.num_threads,
            self.reduced,
        );
        let worker_factory = access_factory.clone();
        let owned_entry_point = entry_point.to_string();
        explorer.run(entry_point, move || worker_factory.as_ref()(&owned_entry_point))?;
        let graph = explorer.graph();

        reports.emit(&graph, ReportPhase::AfterBuild { entry_point })?;

        // The pool's own `InterfaceAccess` instances are scoped to its worker
        // threads and discarded when `run` returns; the simulated re-crawl
        // needs its own, freshly built against the same entry point.
        for user in &self.crawl_users {
            let recrawl_access = access_factory.as_ref()(entry_point)?;
            simulate_recrawl(&graph, user, self.build_user.name(), recrawl_access.as_ref())?;
            reports.emit(
                &graph,
                ReportPhase::AfterRecrawl {
                    entry_point,
                    user: user.name(),
                },
            )?;
        }

        Ok(graph)
    }
}
