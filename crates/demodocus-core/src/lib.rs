//! Core crate: state-space explorer, HTML template engine, user-ability
//! scoring, and accessibility graph analyzer.
//!
//! This crate defines the `InterfaceAccess` capability contract and builds
//! everything else — the graph store, the action model, scoring, the
//! explorer, simulated re-crawl, and the analyzer — against it. Concrete
//! actions live in `demodocus-actions`; a concrete `InterfaceAccess` lives
//! in `demodocus-access-fixture` (and, out of scope here, a real browser
//! driver).

pub mod ability;
pub mod action;
pub mod analyzer;
pub mod build_data;
pub mod comparator;
pub mod config;
pub mod error;
pub mod explorer;
pub mod graph;
pub mod interface;
pub mod orchestrator;
pub mod recrawl;
pub mod template;
pub mod web;

pub use ability::{Axes, ScoreResult, UserAbility, UserModel};
pub use action::{Action, ActionRegistry};
pub use build_data::BuildData;
pub use comparator::{default_pipeline, Comparator, Pipeline, Stage, StageFlags};
pub use config::CrawlConfig;
pub use error::{Error, Result};
pub use explorer::{PooledExplorer, SingleThreadedExplorer};
pub use graph::{Edge, EdgeMetrics, Graph, State, StateData, StateId};
pub use interface::{ElementMeasurement, FocusStyle, InterfaceAccess, TabOrder};
pub use orchestrator::{NullReportSink, Orchestrator, ReportPhase, ReportSink};
pub use template::HtmlTemplate;
