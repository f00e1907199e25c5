//! Per-language adapters from concrete syntax trees to the unified node
//! model. One adapter per language, registered as strategy objects; the
//! fallback adapter keeps unsupported grammars from breaking the pipeline.

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use rustc_hash::FxHashMap;
use tree_sitter::{Node, Tree};

use crate::models::finding::SourceLocation;
use crate::models::unified::{Language, UnifiedNode};

mod fallback;
#[cfg(feature = "python-ast")]
mod python;
mod typescript;

pub use fallback::FallbackAdapter;
#[cfg(feature = "python-ast")]
pub use python::PythonAdapter;
pub use typescript::TypeScriptAdapter;
pub(crate) use typescript::function_name;

/// Conversion strategy for one language family.
pub trait NodeAdapter: Send + Sync {
    /// Convert a whole tree into one module root plus its descendants.
    fn to_unified_nodes(&self, tree: &Tree, source: &str, path: &Path) -> Result<Vec<UnifiedNode>>;

    /// Convert a single raw node, or `None` when the node is not a tracked
    /// kind (the caller then recurses into its children).
    fn convert_node(&self, node: Node<'_>, source: &str) -> Option<UnifiedNode>;

    /// Ratio of error nodes to total nodes over the whole tree.
    fn error_ratio(&self, tree: &Tree) -> f64 {
        tree_error_ratio(tree)
    }
}

/// Registry of adapters keyed by language.
pub struct AdapterRegistry {
    adapters: FxHashMap<Language, Arc<dyn NodeAdapter>>,
    fallback: Arc<dyn NodeAdapter>,
}

impl Default for AdapterRegistry {
    fn default() -> Self {
        let mut adapters: FxHashMap<Language, Arc<dyn NodeAdapter>> = FxHashMap::default();

        let ts = Arc::new(TypeScriptAdapter) as Arc<dyn NodeAdapter>;
        adapters.insert(Language::TypeScript, ts.clone());
        adapters.insert(Language::JavaScript, ts);

        #[cfg(feature = "python-ast")]
        adapters.insert(Language::Python, Arc::new(PythonAdapter) as Arc<dyn NodeAdapter>);

        Self {
            adapters,
            fallback: Arc::new(FallbackAdapter),
        }
    }
}

impl AdapterRegistry {
    pub fn adapter_for(&self, language: Language) -> Arc<dyn NodeAdapter> {
        self.adapters
            .get(&language)
            .cloned()
            .unwrap_or_else(|| self.fallback.clone())
    }

    pub fn register(&mut self, language: Language, adapter: Arc<dyn NodeAdapter>) {
        self.adapters.insert(language, adapter);
    }
}

/// UTF-8 text of a node, empty on slicing errors.
pub(crate) fn node_text(node: Node<'_>, source: &str) -> String {
    node.utf8_text(source.as_bytes()).unwrap_or("").to_string()
}

/// 1-based inclusive location of a node.
pub(crate) fn location_of(node: Node<'_>) -> SourceLocation {
    let start = node.start_position();
    let end = node.end_position();
    SourceLocation::new(
        start.row as u32 + 1,
        start.column as u32 + 1,
        end.row as u32 + 1,
        (end.column as u32).max(1),
    )
}

/// Count every node in the tree (anonymous included) and the subset the
/// grammar flagged as broken.
pub(crate) fn tree_error_ratio(tree: &Tree) -> f64 {
    let mut cursor = tree.root_node().walk();
    let mut total = 0usize;
    let mut errors = 0usize;

    'outer: loop {
        let node = cursor.node();
        total += 1;
        if node.is_error() || node.is_missing() {
            errors += 1;
        }

        if cursor.goto_first_child() {
            continue;
        }
        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                break 'outer;
            }
        }
    }

    if total == 0 {
        0.0
    } else {
        errors as f64 / total as f64
    }
}

/// Shared skeleton for adapters: walk the raw tree, appending converted
/// nodes under the nearest converted ancestor.
pub(crate) fn collect_children(
    adapter: &dyn NodeAdapter,
    raw: Node<'_>,
    source: &str,
    parent: &mut UnifiedNode,
) {
    let mut cursor = raw.walk();
    for child in raw.children(&mut cursor) {
        match adapter.convert_node(child, source) {
            Some(mut unified) => {
                collect_children(adapter, child, source, &mut unified);
                parent.children.push(unified);
            }
            None => collect_children(adapter, child, source, parent),
        }
    }
}
