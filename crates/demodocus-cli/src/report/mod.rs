//! Report emission (§4.14): turns a finished graph into the on-disk
//! artifacts `CrawlConfig.reports` asks for, under `output_dir`.

pub mod gml;
pub mod layouts;
pub mod summary;
pub mod violations;

use anyhow::{Context, Result};
use demodocus_core::ability::UserModel;
use demodocus_core::analyzer::{self, focus::style_string_contrast_proxy};
use demodocus_core::config::ReportKind;
use demodocus_core::graph::Graph;
use demodocus_core::orchestrator::{ReportPhase, ReportSink};
use demodocus_core::web::ability::KEY_PRESS_PREFIX;
use demodocus_core::web::WebStateData;
use std::fs;
use std::path::{Path, PathBuf};

/// Writes every report `CrawlConfig.reports` names to `output_dir`,
/// regenerating them from the graph's current state each time the
/// orchestrator calls `emit` (after the build pass, then after each
/// simulated re-crawl) so the files on disk after the last call reflect
/// the fully re-crawled graph.
pub struct FileReportSink {
    output_dir: PathBuf,
    reports: Vec<ReportKind>,
    build_user: UserModel,
    crawl_users: Vec<UserModel>,
}

impl FileReportSink {
    pub fn new(output_dir: impl Into<PathBuf>, reports: Vec<ReportKind>, build_user: UserModel, crawl_users: Vec<UserModel>) -> Self {
        Self { output_dir: output_dir.into(), reports, build_user, crawl_users }
    }

    fn wants(&self, kind: ReportKind) -> bool {
        self.reports.contains(&ReportKind::All) || self.reports.contains(&kind)
    }

    fn crawl_user_names(&self) -> Vec<String> {
        self.crawl_users.iter().map(|u| u.name().to_string()).collect()
    }

    fn write(&self, relative: &str, contents: &str) -> Result<()> {
        fs::create_dir_all(&self.output_dir)
            .with_context(|| format!("creating output dir '{}'", self.output_dir.display()))?;
        let path = self.output_dir.join(relative);
        fs::write(&path, contents).with_context(|| format!("writing report file '{}'", path.display()))
    }

    fn write_states(&self, graph: &Graph<WebStateData>) -> Result<()> {
        let states_dir = self.output_dir.join("states");
        fs::create_dir_all(&states_dir).with_context(|| format!("creating states dir '{}'", states_dir.display()))?;
        for state in graph.states() {
            let data = state.data();
            let page_path = states_dir.join(format!("state-{}.html", state.id()));
            fs::write(&page_path, &data.raw_dom).with_context(|| format!("writing '{}'", page_path.display()))?;

            let fields = serde_json::json!({
                "url": data.url,
                "stub": state.is_stub(),
                "initial_focus": data.initial_focus,
                "has_tab_order": data.tab_order.is_some(),
                "elements_to_explore": data.elements_to_explore.len(),
            });
            let fields_path = states_dir.join(format!("state-fields-{}.json", state.id()));
            fs::write(&fields_path, serde_json::to_string_pretty(&fields)?)
                .with_context(|| format!("writing '{}'", fields_path.display()))?;
        }
        Ok(())
    }

    fn write_gml(&self, graph: &Graph<WebStateData>) -> Result<()> {
        let report = analyzer::analyze(
            graph,
            self.build_user.name(),
            &self.crawl_user_names(),
            |user, action| self.crawl_users.iter().find(|u| u.name() == user).is_some_and(|u| u.claims_action(action)),
            |action| action.starts_with(KEY_PRESS_PREFIX) || action == "form_fill",
            style_string_contrast_proxy,
        );
        let layouts = gml::layout_labels(&report.layouts);
        let rendered = gml::write_gml(graph, self.build_user.name(), &self.crawl_user_names(), &layouts);
        self.write("graph.gml", &rendered)
    }

    fn write_analysis(&self, graph: &Graph<WebStateData>) -> Result<()> {
        let report = analyzer::analyze(
            graph,
            self.build_user.name(),
            &self.crawl_user_names(),
            |user, action| self.crawl_users.iter().find(|u| u.name() == user).is_some_and(|u| u.claims_action(action)),
            |action| action.starts_with(KEY_PRESS_PREFIX) || action == "form_fill",
            style_string_contrast_proxy,
        );
        let json = violations::write_violations_json(&report)?;
        self.write("violations.json", &json)?;
        let markdown = summary::write_markdown_summary(&report, graph);
        self.write("summary.md", &markdown)?;
        let csv_text = summary::write_csv_summary(&report)?;
        self.write("summary.csv", &csv_text)?;
        Ok(())
    }

    fn write_metrics(&self, graph: &Graph<WebStateData>) -> Result<()> {
        let mut edges = graph.all_edges();
        edges.sort_by_key(|e| (e.src(), e.dst()));
        let mut out = String::new();
        use std::fmt::Write as _;
        let _ = writeln!(out, "src,dst,element,action,user,ability_score,pcv_score,nav_score,act_score");
        for edge in &edges {
            for user in std::iter::once(self.build_user.name().to_string()).chain(self.crawl_user_names()) {
                let Some(metrics) = edge.metrics_for(&user) else { continue };
                let _ = writeln!(
                    out,
                    "{},{},{},{},{},{},{},{},{}",
                    edge.src(),
                    edge.dst(),
                    edge.element(),
                    edge.action(),
                    user,
                    metrics.ability_score,
                    metrics.pcv_score,
                    metrics.nav_score,
                    metrics.act_score,
                );
            }
        }
        self.write("metrics.csv", &out)
    }

    fn write_config(&self) -> Result<()> {
        let config = serde_json::json!({
            "build_user": self.build_user.name(),
            "crawl_users": self.crawl_user_names(),
        });
        self.write("config.json", &serde_json::to_string_pretty(&config)?)
    }
}

impl ReportSink for FileReportSink {
    fn emit(&self, graph: &Graph<WebStateData>, _phase: ReportPhase<'_>) -> demodocus_core::error::Result<()> {
        let result: Result<()> = (|| {
            if self.wants(ReportKind::States) {
                self.write_states(graph)?;
            }
            if self.wants(ReportKind::Gml) {
                self.write_gml(graph)?;
            }
            if self.wants(ReportKind::Metrics) {
                self.write_metrics(graph)?;
            }
            if self.wants(ReportKind::Analysis) {
                self.write_analysis(graph)?;
            }
            if self.wants(ReportKind::Config) {
                self.write_config()?;
            }
            Ok(())
        })();
        result.map_err(|err| demodocus_core::error::Error::Config(format!("report emission failed: {err:#}")))
    }
}

/// Where the replay server (§4.15) finds the state/violation files this
/// sink just wrote.
pub fn states_dir(output_dir: &Path) -> PathBuf {
    output_dir.join("states")
}
