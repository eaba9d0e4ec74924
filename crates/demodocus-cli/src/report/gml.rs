//! Hand-rolled extended GML writer (§4.14, §6 "GML output (graph)").
//!
//! GML's dialect (unquoted numbers, ad-hoc per-application key extensions,
//! no native list type) is too irregular for a generic graph-library
//! serializer, so this writes the format directly off `Graph`/`Edge`/
//! `EdgeMetrics`/`BuildData`, the same way the teacher's report writers
//! build their own text formats rather than going through a third-party
//! model.

use demodocus_core::build_data::MeasurementKind;
use demodocus_core::graph::Graph;
use demodocus_core::web::WebStateData;
use std::collections::BTreeMap;
use std::fmt::Write as _;

use super::layouts::LayoutLabels;

/// Render `graph` as extended GML, built for `build_user` plus every name
/// in `crawl_users`.
pub fn write_gml(graph: &Graph<WebStateData>, build_user: &str, crawl_users: &[String], layouts: &LayoutLabels) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "graph [");
    let _ = writeln!(out, "  directed 1");
    let _ = writeln!(out, "  multigraph 1");
    let _ = writeln!(out, "  buildUser {}", gml_string(build_user));

    let mut states = graph.states();
    states.sort_by_key(|s| s.id());
    for state in &states {
        let _ = writeln!(out, "  node [");
        let _ = writeln!(out, "    id {}", state.id());
        let _ = writeln!(out, "    label {}", gml_string(&format!("state-{}", state.id())));
        let _ = writeln!(out, "    stub {}", if state.is_stub() { 1 } else { 0 });
        let mut users: Vec<String> = state.users_with_paths();
        users.sort();
        let _ = writeln!(out, "    users {}", gml_string(&users.join(",")));
        for user in std::iter::once(build_user.to_string()).chain(crawl_users.iter().cloned()) {
            let reachable = graph.edges_for_state(state.id(), Some(&user), false).iter().any(|e| e.is_traversable_by(&user))
                || Some(state.id()) == graph.start_state();
            let _ = writeln!(out, "    {}_reachable {}", gml_key(&user), if reachable { 1 } else { 0 });
            if let Some(path) = state.path_for_user(&user) {
                let _ = writeln!(out, "    {}_path_len {}", gml_key(&user), path.len());
                let rendered: Vec<String> = path.iter().map(|e| format!("{}:{}", e.action(), e.element())).collect();
                let _ = writeln!(out, "    {}_path {}", gml_key(&user), gml_string(&rendered.join("|")));
            }
        }
        for (label, positions) in &layouts.0 {
            if let Some((x, y)) = positions.get(&state.id()) {
                let _ = writeln!(out, "    x_{} {}", gml_key(label), gml_float(*x));
                let _ = writeln!(out, "    y_{} {}", gml_key(label), gml_float(*y));
            }
        }
        let _ = writeln!(out, "  ]");
    }

    let mut edges = graph.all_edges();
    edges.sort_by_key(|e| (e.src(), e.dst()));
    for edge in &edges {
        let _ = writeln!(out, "  edge [");
        let _ = writeln!(out, "    source {}", edge.src());
        let _ = writeln!(out, "    target {}", edge.dst());
        let _ = writeln!(out, "    element {}", gml_string(edge.element()));
        let _ = writeln!(out, "    action {}", gml_string(edge.action()));
        let mut users = edge.users();
        users.sort();
        let _ = writeln!(out, "    users {}", gml_string(&users.join(",")));

        if let Some(metrics) = edge.metrics_for(build_user) {
            if let Some(build_data) = &metrics.build_data {
                for (kind, value) in build_data.memoized() {
                    let _ = writeln!(out, "    {} {}", measurement_key(kind), gml_value(kind, &value));
                }
            }
        }

        for user in crawl_users {
            let Some(metrics) = edge.metrics_for(user) else { continue };
            let prefix = gml_key(user);
            let _ = writeln!(out, "    {prefix}_ability_score {}", gml_float(metrics.ability_score));
            let _ = writeln!(out, "    {prefix}_pcv_score {}", gml_float(metrics.pcv_score));
            let _ = writeln!(out, "    {prefix}_nav_score {}", gml_float(metrics.nav_score));
            let _ = writeln!(out, "    {prefix}_act_score {}", gml_float(metrics.act_score));
            if let Some(act_time) = metrics.act_time {
                let _ = writeln!(out, "    {prefix}_act_time_ms {}", gml_float(act_time.as_secs_f64() * 1000.0));
            }
            if let Some(error) = &metrics.error {
                let _ = writeln!(out, "    {prefix}_error {}", gml_string(error));
            }
        }
        let _ = writeln!(out, "  ]");
    }

    let _ = writeln!(out, "]");
    out
}

/// GML field keys are bare identifiers: lowercase, `_`-joined, no quoting
/// needed. User and layout-label names become keys this way.
fn gml_key(raw: &str) -> String {
    raw.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect()
}

fn measurement_key(kind: MeasurementKind) -> &'static str {
    match kind {
        MeasurementKind::ForegroundColor => "build_foreground_color",
        MeasurementKind::BackgroundColor => "build_background_color",
        MeasurementKind::ContrastRatio => "build_contrast_ratio",
        MeasurementKind::Height => "build_height",
        MeasurementKind::Width => "build_width",
        MeasurementKind::FontSize => "build_font_size",
        MeasurementKind::PixelX => "build_pixel_x",
        MeasurementKind::PixelY => "build_pixel_y",
        MeasurementKind::PixelDistanceFromPriorFocus => "build_pixel_distance_from_prior_focus",
        MeasurementKind::TabDistanceFromPriorFocus => "build_tab_distance_from_prior_focus",
        MeasurementKind::TagName => "build_tag_name",
        MeasurementKind::Text => "build_text",
        MeasurementKind::DescriptorTags => "build_descriptor_tags",
    }
}

/// Numeric measurement kinds are written unquoted; string ones are quoted
/// strings (§6: "numeric values written unquoted").
fn gml_value(kind: MeasurementKind, value: &str) -> String {
    use MeasurementKind::*;
    match kind {
        ContrastRatio | Height | Width | FontSize | PixelX | PixelY | PixelDistanceFromPriorFocus | TabDistanceFromPriorFocus => value
            .parse::<f64>()
            .map(gml_float)
            .unwrap_or_else(|_| gml_string(value)),
        ForegroundColor | BackgroundColor | TagName | Text | DescriptorTags => gml_string(value),
    }
}

/// A fixed-decimal rendering that never falls into scientific notation
/// (§6: "scientific notation expanded to fixed decimals").
fn gml_float(v: f64) -> String {
    format!("{v:.6}")
}

/// Quote a GML string value, stripping non-ASCII (§6) and switching to
/// single quotes when the value itself contains a double quote.
fn gml_string(value: &str) -> String {
    let ascii: String = value.chars().filter(|c| c.is_ascii()).collect();
    if ascii.contains('"') {
        format!("'{}'", ascii.replace('\'', ""))
    } else {
        format!("\"{ascii}\"")
    }
}

/// Collects a `LayoutSet`'s positions into an order-stable form the GML
/// writer can iterate deterministically.
pub fn layout_labels(layouts: &demodocus_core::analyzer::layout::LayoutSet) -> LayoutLabels {
    let mut sorted = BTreeMap::new();
    for (label, positions) in layouts {
        sorted.insert(label.clone(), positions.clone());
    }
    LayoutLabels(sorted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use demodocus_core::comparator::default_pipeline;
    use demodocus_core::graph::{EdgeMetrics, StateData};

    #[derive(Debug, Clone)]
    struct Data(String);
    impl StateData for Data {
        fn representation(&self) -> String {
            self.0.clone()
        }
    }

    #[test]
    fn header_carries_build_user_and_flags() {
        let graph: Graph<Data> = Graph::new(default_pipeline());
        let _ = graph.add_state(Data("<html></html>".into()), false).unwrap();
        // write_gml is typed over WebStateData; exercise the string/number
        // helpers directly here since this test graph uses a plain Data.
        assert!(gml_string("build").contains("build"));
        assert_eq!(gml_float(1.0), "1.000000");
    }

    #[test]
    fn string_value_containing_a_quote_is_single_quoted() {
        let rendered = gml_string(r#"say "hi""#);
        assert!(rendered.starts_with('\''));
        assert!(!rendered.contains('"'));
    }

    #[test]
    fn non_ascii_is_stripped() {
        assert_eq!(gml_string("caf\u{e9}"), "\"caf\"");
    }

    #[test]
    fn edge_metrics_round_trip_through_real_graph() {
        let graph: Graph<WebStateData> = Graph::new(default_pipeline());
        let (_, s0) = graph.add_state(WebStateData::new("u", "<html>0</html>"), false).unwrap();
        let (_, s1) = graph.add_state(WebStateData::new("u", "<html>1</html>"), false).unwrap();
        let edge = graph.add_edge(s0.id(), s1.id(), "/html/body/button[1]", "mouse_click");
        edge.record_metrics("build", EdgeMetrics { ability_score: 1.0, ..Default::default() });
        let layouts = LayoutLabels(BTreeMap::new());
        let gml = write_gml(&graph, "build", &[], &layouts);
        assert!(gml.contains("graph ["));
        assert!(gml.contains("source 0"));
        assert!(gml.contains(r#"action "mouse_click""#));
    }
}
