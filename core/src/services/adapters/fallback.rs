//! Fallback adapter for grammars without a dedicated strategy: empty
//! unified view, zero error ratio.

use std::path::Path;

use anyhow::Result;
use tree_sitter::{Node, Tree};

use crate::models::unified::UnifiedNode;

use super::NodeAdapter;

pub struct FallbackAdapter;

impl NodeAdapter for FallbackAdapter {
    fn to_unified_nodes(
        &self,
        _tree: &Tree,
        _source: &str,
        _path: &Path,
    ) -> Result<Vec<UnifiedNode>> {
        Ok(Vec::new())
    }

    fn convert_node(&self, _node: Node<'_>, _source: &str) -> Option<UnifiedNode> {
        None
    }

    fn error_ratio(&self, _tree: &Tree) -> f64 {
        0.0
    }
}
