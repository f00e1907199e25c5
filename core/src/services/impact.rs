//! Stability metrics and change-impact risk.
//!
//! A file is risky when editing it can ripple through many stable (heavily
//! depended-upon) modules; closer dependents weigh more.

use std::collections::{BTreeMap, VecDeque};

use rustc_hash::FxHashSet;

use crate::models::graph::DependencyGraph;
use crate::models::result::StabilityMetric;

/// Stability per node: `ce / (ca + ce)`, isolated nodes pinned to 0.
pub fn stability_metrics(graph: &DependencyGraph) -> BTreeMap<String, StabilityMetric> {
    graph
        .nodes
        .iter()
        .map(|(path, node)| {
            let ca = node.imported_by.len();
            let ce = node.imports.len();
            let stability = if ca + ce == 0 {
                0.0
            } else {
                ce as f64 / (ca + ce) as f64
            };
            (path.clone(), StabilityMetric { ca, ce, stability })
        })
        .collect()
}

/// Breadth-first walk over reverse edges from `path`, returning every
/// transitively impacted file with its distance (`depth > 0`).
pub fn impacted_files(graph: &DependencyGraph, path: &str) -> Vec<(String, usize)> {
    let mut impacted = Vec::new();
    let mut seen: FxHashSet<&str> = FxHashSet::default();
    let mut queue: VecDeque<(&str, usize)> = VecDeque::new();

    seen.insert(path);
    queue.push_back((path, 0));

    while let Some((current, depth)) = queue.pop_front() {
        if depth > 0 {
            impacted.push((current.to_string(), depth));
        }
        if let Some(node) = graph.node(current) {
            let mut dependents: Vec<&String> = node.imported_by.iter().collect();
            dependents.sort();
            for dependent in dependents {
                if seen.insert(dependent.as_str()) {
                    queue.push_back((dependent.as_str(), depth + 1));
                }
            }
        }
    }

    impacted
}

/// `risk(f) = Σ over impacted nodes n of (1 − stability(n)) · 1/(depth(n)+1)`.
pub fn risk_scores(
    graph: &DependencyGraph,
    stability: &BTreeMap<String, StabilityMetric>,
) -> BTreeMap<String, f64> {
    graph
        .nodes
        .keys()
        .map(|path| {
            let risk = impacted_files(graph, path)
                .into_iter()
                .map(|(impacted_path, depth)| {
                    let node_stability = stability
                        .get(&impacted_path)
                        .map(|s| s.stability)
                        .unwrap_or(0.0);
                    (1.0 - node_stability) * (1.0 / (depth as f64 + 1.0))
                })
                .sum();
            (path.clone(), risk)
        })
        .collect()
}
