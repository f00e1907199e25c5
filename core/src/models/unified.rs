//! Language-neutral node model produced by the per-language adapters.
//!
//! Adapters convert concrete syntax trees into one `Module` root per file
//! plus its tracked descendants. The structure is a strict tree: every node
//! is owned by exactly one parent and there are no back-edges.

use serde::{Deserialize, Serialize};

use super::finding::SourceLocation;

/// Languages the grammar registry can parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    TypeScript,
    JavaScript,
    Python,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::TypeScript => "typescript",
            Language::JavaScript => "javascript",
            Language::Python => "python",
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind tag plus kind-specific payload for a unified node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum UnifiedNodeKind {
    Module,
    Function {
        parameters: Vec<String>,
        return_type: Option<String>,
        is_async: bool,
    },
    Method {
        parameters: Vec<String>,
        return_type: Option<String>,
        is_async: bool,
    },
    Class {
        super_class: Option<String>,
        implements: Vec<String>,
        decorators: Vec<String>,
    },
    Import {
        source: String,
        symbols: Vec<String>,
        is_default: bool,
        is_namespace: bool,
    },
    Call {
        callee: String,
        arguments: Vec<String>,
    },
    Interface,
    TypeAlias,
    Enum,
    Variable {
        type_annotation: Option<String>,
        initializer: Option<String>,
    },
}

impl UnifiedNodeKind {
    /// Short tag used for logging and name-keyed lookups.
    pub fn tag(&self) -> &'static str {
        match self {
            UnifiedNodeKind::Module => "module",
            UnifiedNodeKind::Function { .. } => "function",
            UnifiedNodeKind::Method { .. } => "method",
            UnifiedNodeKind::Class { .. } => "class",
            UnifiedNodeKind::Import { .. } => "import",
            UnifiedNodeKind::Call { .. } => "call",
            UnifiedNodeKind::Interface => "interface",
            UnifiedNodeKind::TypeAlias => "typeAlias",
            UnifiedNodeKind::Enum => "enum",
            UnifiedNodeKind::Variable { .. } => "variable",
        }
    }
}

/// One node of the unified tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnifiedNode {
    pub kind: UnifiedNodeKind,
    /// Declared name, or `"anonymous"` when the construct has none and no
    /// enclosing declarator supplies one.
    pub name: String,
    pub location: SourceLocation,
    #[serde(default)]
    pub children: Vec<UnifiedNode>,
}

impl UnifiedNode {
    pub fn new(kind: UnifiedNodeKind, name: impl Into<String>, location: SourceLocation) -> Self {
        Self {
            kind,
            name: name.into(),
            location,
            children: Vec::new(),
        }
    }

    /// Total node count of this subtree, the root included.
    pub fn subtree_len(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(UnifiedNode::subtree_len)
            .sum::<usize>()
    }

    /// Depth-first pre-order walk over the subtree.
    pub fn walk(&self, f: &mut impl FnMut(&UnifiedNode)) {
        f(self);
        for child in &self.children {
            child.walk(f);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc() -> SourceLocation {
        SourceLocation::new(1, 1, 1, 10)
    }

    #[test]
    fn language_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&Language::TypeScript).unwrap(),
            "\"typescript\""
        );
    }

    #[test]
    fn walk_visits_pre_order() {
        let mut module = UnifiedNode::new(UnifiedNodeKind::Module, "mod.ts", loc());
        let mut class = UnifiedNode::new(
            UnifiedNodeKind::Class {
                super_class: None,
                implements: vec![],
                decorators: vec![],
            },
            "Widget",
            loc(),
        );
        class.children.push(UnifiedNode::new(
            UnifiedNodeKind::Method {
                parameters: vec!["value".to_string()],
                return_type: None,
                is_async: false,
            },
            "render",
            loc(),
        ));
        module.children.push(class);

        let mut order = Vec::new();
        module.walk(&mut |n| order.push(n.name.clone()));
        assert_eq!(order, vec!["mod.ts", "Widget", "render"]);
        assert_eq!(module.subtree_len(), 3);
    }
}
