//! Default command: run a build crawl plus simulated re-crawls over one or
//! more entry points and write the configured reports (§4.11, §6).

use crate::{config, fixture, logging, report, users};
use anyhow::{bail, Context, Result};
use clap::Args;
use demodocus_access_fixture::FixtureAccess;
use demodocus_core::config::{CrawlConfigOverrides, Multi};
use demodocus_core::interface::InterfaceAccess;
use demodocus_core::orchestrator::Orchestrator;
use demodocus_core::ActionRegistry;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
pub struct CrawlArgs {
    /// A single entry point to crawl (a fixture scenario name, e.g.
    /// `toggle-page`). Mutually exclusive with `-i`.
    pub entry_point: Option<String>,

    /// Read entry points from `file`, one per line, instead of a single
    /// positional entry point.
    #[arg(short = 'i', long = "input-file")]
    pub input_file: Option<PathBuf>,

    /// Directory reports are written to; overrides the config file's
    /// `output_dir`.
    #[arg(long)]
    pub output_dir: Option<String>,

    /// Path to a crawl config TOML file; falls back to the bundled
    /// default when omitted.
    #[arg(short = 'm', long = "mode")]
    pub mode: Option<PathBuf>,

    /// Debug-level logging (overrides `-v` and the config's `log_level`).
    #[arg(short = 'd', long)]
    pub debug: bool,

    /// Info-level logging.
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

pub async fn run(args: CrawlArgs) -> Result<()> {
    let config = config::load(
        args.mode.as_deref(),
        CrawlConfigOverrides { output_dir: args.output_dir.clone(), ..Default::default() },
    )
    .context("loading crawl config")?;

    logging::init(logging::Verbosity::from_flags(args.debug, args.verbose), &config.log_level);

    let entry_points = resolve_entry_points(&args)?;
    if entry_points.is_empty() {
        bail!("no entry points given; pass one positionally or with -i/--input-file");
    }

    let build_user = users::build_user(&config.build_user);
    let crawl_users: Vec<_> = config.crawl_users.iter().map(|name| users::crawl_user(name)).collect();

    let registry = Arc::new(ActionRegistry::new());
    demodocus_actions::register_default_actions(&registry);

    let mut orchestrator = Orchestrator::new(registry, build_user.clone(), crawl_users.clone(), config.reduced_crawl);
    if config.multi == Multi::Pooled {
        orchestrator = orchestrator.with_pool(config.num_threads);
    }

    let sink = report::FileReportSink::new(config.output_dir.clone(), config.reports.clone(), build_user, crawl_users);

    // Resolve every entry point's scenario up front so a typo surfaces
    // before any crawling starts, and so the access factory below (which
    // may be called from pooled worker threads, once per worker, for the
    // same entry point) never needs to re-parse or propagate a parse
    // failure of its own.
    let scenarios: std::collections::HashMap<String, _> = entry_points
        .iter()
        .map(|ep| fixture::parse_scenario(ep).map(|scenario| (ep.clone(), scenario)))
        .collect::<Result<_>>()?;

    let graphs = orchestrator.run(
        &entry_points,
        demodocus_core::comparator::default_pipeline,
        move |entry_point: &str| {
            let scenario = *scenarios
                .get(entry_point)
                .expect("entry point was resolved to a scenario up front");
            Ok(Box::new(FixtureAccess::new(scenario)) as Box<dyn InterfaceAccess>)
        },
        &sink,
        None,
    );

    let graphs = graphs.map_err(|err| anyhow::anyhow!("crawl failed: {err}"))?;
    println!("crawled {} entry point(s), {} graph(s) produced", entry_points.len(), graphs.len());
    Ok(())
}

fn resolve_entry_points(args: &CrawlArgs) -> Result<Vec<String>> {
    if let Some(path) = &args.input_file {
        let contents = std::fs::read_to_string(path).with_context(|| format!("reading entry-point file '{}'", path.display()))?;
        Ok(contents.lines().map(str::trim).filter(|line| !line.is_empty()).map(str::to_string).collect())
    } else if let Some(entry_point) = &args.entry_point {
        Ok(vec![entry_point.clone()])
    } else {
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_prefers_input_file_over_positional() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("entries.txt");
        std::fs::write(&path, "toggle-page\nkeyboard-trap\n").unwrap();
        let args = CrawlArgs {
            entry_point: Some("expandable-list".to_string()),
            input_file: Some(path),
            output_dir: None,
            mode: None,
            debug: false,
            verbose: false,
        };
        let resolved = resolve_entry_points(&args).unwrap();
        assert_eq!(resolved, vec!["toggle-page".to_string(), "keyboard-trap".to_string()]);
    }

    #[test]
    fn resolve_falls_back_to_positional() {
        let args = CrawlArgs {
            entry_point: Some("toggle-page".to_string()),
            input_file: None,
            output_dir: None,
            mode: None,
            debug: false,
            verbose: false,
        };
        assert_eq!(resolve_entry_points(&args).unwrap(), vec!["toggle-page".to_string()]);
    }
}
