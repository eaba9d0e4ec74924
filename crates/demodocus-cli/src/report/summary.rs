//! Human-facing crawl summary: violation counts by category/level and
//! per-user reachability, as Markdown, CSV, and a colored terminal table
//! (§4.14). The terminal table follows the teacher's status-command
//! style: a `comfy_table::Table` built with `set_header`/`add_row`,
//! `colored::Colorize` for severity coloring.

use anyhow::{Context, Result};
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Table};
use demodocus_core::analyzer::violation::Level;
use demodocus_core::analyzer::AnalysisReport;
use demodocus_core::graph::Graph;
use demodocus_core::web::WebStateData;
use std::collections::BTreeMap;
use std::fmt::Write as _;

/// One category's tally, sorted into the summary by category name.
struct CategoryCount {
    category: String,
    warnings: usize,
    errors: usize,
}

fn count_by_category(report: &AnalysisReport) -> Vec<CategoryCount> {
    let mut tally: BTreeMap<String, (usize, usize)> = BTreeMap::new();
    for state in report.states.values() {
        for violation in &state.violations {
            let entry = tally.entry(violation.category().to_string()).or_default();
            match violation.level() {
                Level::Warning => entry.0 += 1,
                Level::Error => entry.1 += 1,
            }
        }
    }
    tally
        .into_iter()
        .map(|(category, (warnings, errors))| CategoryCount { category, warnings, errors })
        .collect()
}

/// Count of states each crawl user can reach, out of the graph's total.
fn reachability_counts(report: &AnalysisReport, graph: &Graph<WebStateData>) -> Vec<(String, usize, usize)> {
    let total = graph.state_count();
    let mut users: Vec<&String> = report.per_user.keys().collect();
    users.sort();
    users
        .into_iter()
        .map(|user| {
            let reached = report.per_user[user].subgraph.states.len();
            (user.clone(), reached, total)
        })
        .collect()
}

/// Render a Markdown summary: one table of violation counts by category
/// and level, one of per-user reachability.
pub fn write_markdown_summary(report: &AnalysisReport, graph: &Graph<WebStateData>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# Crawl summary");
    let _ = writeln!(out);
    let _ = writeln!(out, "## Violations by category");
    let _ = writeln!(out);
    let _ = writeln!(out, "| Category | Warnings | Errors |");
    let _ = writeln!(out, "|---|---|---|");
    for count in count_by_category(report) {
        let _ = writeln!(out, "| {} | {} | {} |", count.category, count.warnings, count.errors);
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "## Reachability by user");
    let _ = writeln!(out);
    let _ = writeln!(out, "| User | States reached | Total states |");
    let _ = writeln!(out, "|---|---|---|");
    for (user, reached, total) in reachability_counts(report, graph) {
        let _ = writeln!(out, "| {user} | {reached} | {total} |");
    }
    out
}

/// Render the violation-by-category tally as CSV (`category,warnings,errors`).
pub fn write_csv_summary(report: &AnalysisReport) -> Result<String> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer
        .write_record(["category", "warnings", "errors"])
        .context("writing csv header")?;
    for count in count_by_category(report) {
        writer
            .write_record([count.category.as_str(), &count.warnings.to_string(), &count.errors.to_string()])
            .context("writing csv row")?;
    }
    let bytes = writer.into_inner().context("flushing csv writer")?;
    String::from_utf8(bytes).context("csv output was not utf-8")
}

fn create_table() -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table
}

/// Print the violation-by-category tally and per-user reachability to the
/// terminal, colored by severity.
pub fn print_terminal_summary(report: &AnalysisReport, graph: &Graph<WebStateData>) {
    println!();
    println!("{}", "Crawl summary".bright_white().bold());
    println!("{}", "=".repeat(40).bright_black());
    println!();

    let mut violations = create_table();
    violations.set_header(vec!["Category", "Warnings", "Errors"]);
    for count in count_by_category(report) {
        let errors_str = if count.errors > 0 {
            count.errors.to_string().bright_red().to_string()
        } else {
            count.errors.to_string()
        };
        let warnings_str = if count.warnings > 0 {
            count.warnings.to_string().bright_yellow().to_string()
        } else {
            count.warnings.to_string()
        };
        violations.add_row(vec![count.category, warnings_str, errors_str]);
    }
    println!("{violations}");

    println!();
    let mut reach = create_table();
    reach.set_header(vec!["User", "States reached", "Total states"]);
    for (user, reached, total) in reachability_counts(report, graph) {
        let reached_str = if reached == total {
            reached.to_string().bright_green().to_string()
        } else {
            reached.to_string().bright_yellow().to_string()
        };
        reach.add_row(vec![user, reached_str, total.to_string()]);
    }
    println!("{reach}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use demodocus_core::analyzer::violation::{ElementLocator, StateViolations, Violation};
    use demodocus_core::comparator::default_pipeline;
    use std::collections::HashMap;

    fn sample_report() -> AnalysisReport {
        let mut states = HashMap::new();
        states.insert(
            1u64,
            StateViolations {
                src: None,
                violations: vec![Violation::Atomic {
                    level: Level::Error,
                    category: "contrast".to_string(),
                    element: ElementLocator {
                        x: 0.0,
                        y: 0.0,
                        width: 10.0,
                        height: 10.0,
                        xpath: "/html/body/a".to_string(),
                        text: "link".to_string(),
                        tag: "a".to_string(),
                    },
                    replay: vec![],
                    code: "min-contrast".to_string(),
                    group_id: 1,
                }],
            },
        );
        AnalysisReport { states, per_user: HashMap::new(), layouts: HashMap::new() }
    }

    #[test]
    fn markdown_summary_lists_category_and_counts() {
        let graph: Graph<WebStateData> = Graph::new(default_pipeline());
        let _ = graph.add_state(WebStateData::new("u", "<html></html>"), false).unwrap();
        let markdown = write_markdown_summary(&sample_report(), &graph);
        assert!(markdown.contains("contrast"));
        assert!(markdown.contains("| contrast | 0 | 1 |"));
    }

    #[test]
    fn csv_summary_has_header_and_one_data_row() {
        let csv_text = write_csv_summary(&sample_report()).unwrap();
        let mut lines = csv_text.lines();
        assert_eq!(lines.next(), Some("category,warnings,errors"));
        assert_eq!(lines.next(), Some("contrast,0,1"));
    }
}
