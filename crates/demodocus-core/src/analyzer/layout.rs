//! Network layouts (§4.10 "Network layouts").
//!
//! Two canonical layouts — force-directed and energy-minimizing — computed
//! at five xpath-similarity edge-weight thresholds and written back as node
//! attributes (`x_fr_<w>`, `y_kk_<w>`, ...) for the GML writer to emit.

use crate::graph::{Graph, StateId};
use crate::web::WebStateData;
use petgraph::graph::UnGraph;
use std::collections::HashMap;

/// The five edge-weight thresholds layouts are computed at (§4.10).
pub const XPATH_SIMILARITY_THRESHOLDS: [f64; 5] = [0.2, 0.4, 0.6, 0.8, 1.0];

/// `(x, y)` position for one state under one `(layout, threshold)` combo.
pub type Positions = HashMap<StateId, (f64, f64)>;

/// All computed layouts, keyed by a label like `fr_0.6` or `kk_1`.
pub type LayoutSet = HashMap<String, Positions>;

/// Two elements' xpaths are considered similar if they share a prefix
/// whose depth, as a fraction of the longer xpath's depth, meets the
/// threshold — a cheap stand-in for structural similarity that avoids
/// pulling in a dedicated tree-edit-distance dependency.
fn xpath_similarity(a: &str, b: &str) -> f64 {
    let a_parts: Vec<&str> = a.split('/').filter(|s| !s.is_empty()).collect();
    let b_parts: Vec<&str> = b.split('/').filter(|s| !s.is_empty()).collect();
    if a_parts.is_empty() || b_parts.is_empty() {
        return 0.0;
    }
    let common = a_parts.iter().zip(b_parts.iter()).take_while(|(x, y)| x == y).count();
    common as f64 / a_parts.len().max(b_parts.len()) as f64
}

/// Build the edge set for one threshold: edges whose element xpath is
/// similar enough (by [`xpath_similarity`]) to the prior edge into that
/// source state to be considered part of the same structural cluster.
fn filtered_edges(graph: &Graph<WebStateData>, threshold: f64) -> Vec<(StateId, StateId)> {
    let mut edges = Vec::new();
    for edge in graph.all_edges() {
        let Some(src_path) = graph
            .state(edge.src())
            .and_then(|s| s.path_for_user("build"))
            .and_then(|p| p.last().cloned())
        else {
            edges.push((edge.src(), edge.dst()));
            continue;
        };
        if xpath_similarity(src_path.element(), edge.element()) >= threshold {
            edges.push((edge.src(), edge.dst()));
        }
    }
    edges
}

/// Force-directed (Fruchterman-Reingold style) layout: nodes repel each
/// other, edges attract, iterated to a fixed point.
fn force_directed(states: &[StateId], edges: &[(StateId, StateId)]) -> Positions {
    let n = states.len().max(1) as f64;
    let area = n;
    let k = (area / n).sqrt();
    let index: HashMap<StateId, usize> = states.iter().enumerate().map(|(i, &s)| (s, i)).collect();

    let mut pos: Vec<(f64, f64)> = states
        .iter()
        .enumerate()
        .map(|(i, _)| {
            let angle = 2.0 * std::f64::consts::PI * (i as f64) / n;
            (angle.cos() * n.sqrt(), angle.sin() * n.sqrt())
        })
        .collect();

    for iteration in 0..100 {
        let temperature = (1.0 - iteration as f64 / 100.0).max(0.01) * n.sqrt();
        let mut disp = vec![(0.0, 0.0); pos.len()];

        for i in 0..pos.len() {
            for j in 0..pos.len() {
                if i == j {
                    continue;
                }
                let dx = pos[i].0 - pos[j].0;
                let dy = pos[i].1 - pos[j].1;
                let dist = (dx * dx + dy * dy).sqrt().max(0.01);
                let repulsive = k * k / dist;
                disp[i].0 += dx / dist * repulsive;
                disp[i].1 += dy / dist * repulsive;
            }
        }

        for &(a, b) in edges {
            let (Some(&i), Some(&j)) = (index.get(&a), index.get(&b)) else { continue };
            let dx = pos[i].0 - pos[j].0;
            let dy = pos[i].1 - pos[j].1;
            let dist = (dx * dx + dy * dy).sqrt().max(0.01);
            let attractive = dist * dist / k;
            disp[i].0 -= dx / dist * attractive;
            disp[i].1 -= dy / dist * attractive;
            disp[j].0 += dx / dist * attractive;
            disp[j].1 += dy / dist * attractive;
        }

        for i in 0..pos.len() {
            let (dx, dy) = disp[i];
            let dist = (dx * dx + dy * dy).sqrt().max(0.01);
            pos[i].0 += dx / dist * dist.min(temperature);
            pos[i].1 += dy / dist * dist.min(temperature);
        }
    }

    states.iter().zip(pos).map(|(&s, p)| (s, p)).collect()
}

/// Energy-minimizing (Kamada-Kawai style) layout: gradient descent on the
/// sum of squared deviations between graph-theoretic and Euclidean
/// distances, seeded from the force-directed result.
fn energy_minimizing(states: &[StateId], edges: &[(StateId, StateId)], seed: &Positions) -> Positions {
    let index: HashMap<StateId, usize> = states.iter().enumerate().map(|(i, &s)| (s, i)).collect();
    let n = states.len();
    if n == 0 {
        return Positions::new();
    }

    // Graph-theoretic distances feed the stress function below; computed
    // with petgraph's Dijkstra (unit edge weights) rather than a hand-rolled
    // BFS so the layout pass shares its shortest-path primitive with the
    // rest of the analyzer's graph-algorithm surface.
    let mut ungraph: UnGraph<(), ()> = UnGraph::new_undirected();
    let node_indices: Vec<_> = (0..n).map(|_| ungraph.add_node(())).collect();
    for &(a, b) in edges {
        let (Some(&i), Some(&j)) = (index.get(&a), index.get(&b)) else { continue };
        ungraph.update_edge(node_indices[i], node_indices[j], ());
    }

    let distances: Vec<Vec<f64>> = (0..n)
        .map(|from| {
            let dist_map = petgraph::algo::dijkstra(&ungraph, node_indices[from], None, |_| 1.0f64);
            node_indices
                .iter()
                .map(|idx| *dist_map.get(idx).unwrap_or(&f64::INFINITY))
                .collect()
        })
        .collect();

    let mut pos: Vec<(f64, f64)> = states.iter().map(|s| *seed.get(s).unwrap_or(&(0.0, 0.0))).collect();

    for _ in 0..200 {
        for i in 0..n {
            let mut grad = (0.0, 0.0);
            for j in 0..n {
                if i == j || distances[i][j].is_infinite() {
                    continue;
                }
                let dx = pos[i].0 - pos[j].0;
                let dy = pos[i].1 - pos[j].1;
                let euclidean = (dx * dx + dy * dy).sqrt().max(0.01);
                let target = distances[i][j];
                let diff = (euclidean - target) / euclidean;
                grad.0 += diff * dx;
                grad.1 += diff * dy;
            }
            pos[i].0 -= 0.01 * grad.0;
            pos[i].1 -= 0.01 * grad.1;
        }
    }

    states.iter().zip(pos).map(|(&s, p)| (s, p)).collect()
}

/// Compute both layouts at all five thresholds (§4.10).
pub fn compute_layouts(graph: &Graph<WebStateData>) -> LayoutSet {
    let states: Vec<StateId> = graph.states().iter().map(|s| s.id()).collect();
    let mut layouts = LayoutSet::new();

    for &threshold in &XPATH_SIMILARITY_THRESHOLDS {
        let edges = filtered_edges(graph, threshold);
        let fr = force_directed(&states, &edges);
        let kk = energy_minimizing(&states, &edges, &fr);
        layouts.insert(format!("fr_{threshold}"), fr);
        layouts.insert(format!("kk_{threshold}"), kk);
    }

    layouts
}
