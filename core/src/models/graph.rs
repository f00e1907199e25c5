//! Module dependency graph.
//!
//! The graph owns its nodes; neighbor lists store file-path keys rather than
//! references, which keeps `imports`/`importedBy` symmetric without a
//! reference cycle and gives O(1) lookup by path.

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

/// One module (file) in the dependency graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyNode {
    pub file_path: String,
    /// Out-neighbors: files this module imports.
    #[serde(default)]
    pub imports: Vec<String>,
    /// In-neighbors: files importing this module.
    #[serde(default)]
    pub imported_by: Vec<String>,
    /// `ce / (ca + ce)`; `0` for isolated nodes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instability: Option<f64>,
}

impl DependencyNode {
    pub fn new(file_path: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
            imports: Vec::new(),
            imported_by: Vec::new(),
            instability: None,
        }
    }
}

/// Directed module graph keyed by absolute file path.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DependencyGraph {
    pub nodes: FxHashMap<String, DependencyNode>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert the node if absent, returning a mutable handle either way.
    pub fn ensure_node(&mut self, path: &str) -> &mut DependencyNode {
        self.nodes
            .entry(path.to_string())
            .or_insert_with(|| DependencyNode::new(path))
    }

    pub fn node(&self, path: &str) -> Option<&DependencyNode> {
        self.nodes.get(path)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Add a `from -> to` edge, keeping both neighbor lists deduplicated and
    /// mutually consistent.
    pub fn add_edge(&mut self, from: &str, to: &str) {
        let from_node = self.ensure_node(from);
        if !from_node.imports.iter().any(|p| p == to) {
            from_node.imports.push(to.to_string());
        }
        let to_node = self.ensure_node(to);
        if !to_node.imported_by.iter().any(|p| p == from) {
            to_node.imported_by.push(from.to_string());
        }
    }

    /// Recompute `instability` for every node.
    pub fn compute_instability(&mut self) {
        for node in self.nodes.values_mut() {
            let ce = node.imports.len() as f64;
            let ca = node.imported_by.len() as f64;
            node.instability = Some(if ca + ce == 0.0 { 0.0 } else { ce / (ca + ce) });
        }
    }

    /// All elementary cycles reachable by depth-first back-edges.
    ///
    /// Each cycle is rotated so it starts at its lexicographically smallest
    /// member and closed by repeating that member at the end, making the
    /// output independent of visitation order. Runs in O(V + E).
    pub fn circular_dependencies(&self) -> Vec<Vec<String>> {
        let mut paths: Vec<&String> = self.nodes.keys().collect();
        paths.sort();

        let mut visited: FxHashSet<&str> = FxHashSet::default();
        let mut cycles: Vec<Vec<String>> = Vec::new();
        let mut seen_cycles: FxHashSet<String> = FxHashSet::default();

        for start in paths {
            if !visited.contains(start.as_str()) {
                let mut stack: Vec<&str> = Vec::new();
                let mut on_stack: FxHashSet<&str> = FxHashSet::default();
                self.visit(
                    start,
                    &mut visited,
                    &mut stack,
                    &mut on_stack,
                    &mut cycles,
                    &mut seen_cycles,
                );
            }
        }

        cycles
    }

    fn visit<'a>(
        &'a self,
        path: &'a str,
        visited: &mut FxHashSet<&'a str>,
        stack: &mut Vec<&'a str>,
        on_stack: &mut FxHashSet<&'a str>,
        cycles: &mut Vec<Vec<String>>,
        seen_cycles: &mut FxHashSet<String>,
    ) {
        visited.insert(path);
        stack.push(path);
        on_stack.insert(path);

        if let Some(node) = self.nodes.get(path) {
            let mut targets: Vec<&String> = node.imports.iter().collect();
            targets.sort();
            for target in targets {
                if !self.nodes.contains_key(target.as_str()) {
                    continue;
                }
                if on_stack.contains(target.as_str()) {
                    let from = stack
                        .iter()
                        .position(|p| *p == target.as_str())
                        .expect("on-stack node must be in the stack");
                    let cycle = normalize_cycle(&stack[from..]);
                    let key = cycle.join(" -> ");
                    if seen_cycles.insert(key) {
                        cycles.push(cycle);
                    }
                } else if !visited.contains(target.as_str()) {
                    self.visit(target, visited, stack, on_stack, cycles, seen_cycles);
                }
            }
        }

        stack.pop();
        on_stack.remove(path);
    }
}

/// Rotate so the smallest element leads, then close the loop on it.
fn normalize_cycle(members: &[&str]) -> Vec<String> {
    let smallest = members
        .iter()
        .enumerate()
        .min_by_key(|(_, p)| **p)
        .map(|(i, _)| i)
        .unwrap_or(0);

    let mut cycle: Vec<String> = members[smallest..]
        .iter()
        .chain(members[..smallest].iter())
        .map(|p| p.to_string())
        .collect();
    cycle.push(cycle[0].clone());
    cycle
}
