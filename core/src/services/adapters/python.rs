//! Python adapter.

use std::path::Path;

use anyhow::Result;
use tree_sitter::{Node, Tree};

use crate::models::unified::{UnifiedNode, UnifiedNodeKind};

use super::{collect_children, location_of, node_text, NodeAdapter};

pub struct PythonAdapter;

impl NodeAdapter for PythonAdapter {
    fn to_unified_nodes(&self, tree: &Tree, source: &str, path: &Path) -> Result<Vec<UnifiedNode>> {
        let root = tree.root_node();
        let mut module = UnifiedNode::new(
            UnifiedNodeKind::Module,
            path.to_string_lossy(),
            location_of(root),
        );
        collect_children(self, root, source, &mut module);
        Ok(vec![module])
    }

    fn convert_node(&self, node: Node<'_>, source: &str) -> Option<UnifiedNode> {
        match node.kind() {
            "function_definition" => Some(self.convert_function(node, source)),
            "class_definition" => Some(self.convert_class(node, source)),
            "import_statement" => self.convert_import(node, source),
            "import_from_statement" => self.convert_import_from(node, source),
            "call" => Some(self.convert_call(node, source)),
            "assignment" => self.convert_assignment(node, source),
            _ => None,
        }
    }
}

impl PythonAdapter {
    fn convert_function(&self, node: Node<'_>, source: &str) -> UnifiedNode {
        let name = node
            .child_by_field_name("name")
            .map(|n| node_text(n, source))
            .unwrap_or_else(|| "anonymous".to_string());
        let parameters = node
            .child_by_field_name("parameters")
            .map(|params| {
                let mut cursor = params.walk();
                params
                    .named_children(&mut cursor)
                    .map(|p| node_text(p, source))
                    .collect()
            })
            .unwrap_or_default();
        let return_type = node
            .child_by_field_name("return_type")
            .map(|n| node_text(n, source));
        let is_async = {
            let mut cursor = node.walk();
            let is_async = node.children(&mut cursor).any(|c| c.kind() == "async");
            is_async
        };

        // methods are functions whose enclosing block sits in a class body
        let inside_class = node
            .parent()
            .and_then(|p| p.parent())
            .map(|grandparent| grandparent.kind() == "class_definition")
            .unwrap_or(false);

        let kind = if inside_class {
            UnifiedNodeKind::Method {
                parameters,
                return_type,
                is_async,
            }
        } else {
            UnifiedNodeKind::Function {
                parameters,
                return_type,
                is_async,
            }
        };
        UnifiedNode::new(kind, name, location_of(node))
    }

    fn convert_class(&self, node: Node<'_>, source: &str) -> UnifiedNode {
        let name = node
            .child_by_field_name("name")
            .map(|n| node_text(n, source))
            .unwrap_or_else(|| "anonymous".to_string());

        let mut bases: Vec<String> = node
            .child_by_field_name("superclasses")
            .map(|args| {
                let mut cursor = args.walk();
                args.named_children(&mut cursor)
                    .map(|base| node_text(base, source))
                    .collect()
            })
            .unwrap_or_default();

        let super_class = if bases.is_empty() {
            None
        } else {
            Some(bases.remove(0))
        };

        let decorators = node
            .parent()
            .filter(|p| p.kind() == "decorated_definition")
            .map(|wrapper| {
                let mut cursor = wrapper.walk();
                wrapper
                    .children(&mut cursor)
                    .filter(|c| c.kind() == "decorator")
                    .map(|d| node_text(d, source))
                    .collect()
            })
            .unwrap_or_default();

        UnifiedNode::new(
            UnifiedNodeKind::Class {
                super_class,
                implements: bases,
                decorators,
            },
            name,
            location_of(node),
        )
    }

    /// `import a.b, c` — one unified import per statement, first module as
    /// the source specifier.
    fn convert_import(&self, node: Node<'_>, source: &str) -> Option<UnifiedNode> {
        let mut cursor = node.walk();
        let mut modules = node
            .named_children(&mut cursor)
            .map(|m| match m.kind() {
                "aliased_import" => m
                    .child_by_field_name("name")
                    .map(|n| node_text(n, source))
                    .unwrap_or_default(),
                _ => node_text(m, source),
            })
            .filter(|m| !m.is_empty());

        let first = modules.next()?;
        let rest: Vec<String> = modules.collect();

        Some(UnifiedNode::new(
            UnifiedNodeKind::Import {
                source: first.clone(),
                symbols: rest,
                is_default: false,
                is_namespace: false,
            },
            first,
            location_of(node),
        ))
    }

    fn convert_import_from(&self, node: Node<'_>, source: &str) -> Option<UnifiedNode> {
        let module = node
            .child_by_field_name("module_name")
            .map(|n| node_text(n, source))?;

        let mut symbols = Vec::new();
        let mut is_namespace = false;
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            match child.kind() {
                "wildcard_import" => is_namespace = true,
                "dotted_name" | "identifier" if node_text(child, source) != module => {
                    symbols.push(node_text(child, source));
                }
                "aliased_import" => {
                    if let Some(alias) = child.child_by_field_name("alias") {
                        symbols.push(node_text(alias, source));
                    }
                }
                _ => {}
            }
        }

        Some(UnifiedNode::new(
            UnifiedNodeKind::Import {
                source: module.clone(),
                symbols,
                is_default: false,
                is_namespace,
            },
            module,
            location_of(node),
        ))
    }

    fn convert_call(&self, node: Node<'_>, source: &str) -> UnifiedNode {
        let callee = node
            .child_by_field_name("function")
            .map(|f| node_text(f, source))
            .unwrap_or_default();
        let arguments = node
            .child_by_field_name("arguments")
            .map(|args| {
                let mut cursor = args.walk();
                args.named_children(&mut cursor)
                    .map(|arg| node_text(arg, source))
                    .collect()
            })
            .unwrap_or_default();

        UnifiedNode::new(
            UnifiedNodeKind::Call {
                callee: callee.clone(),
                arguments,
            },
            callee,
            location_of(node),
        )
    }

    /// Simple `name = value` bindings at any level; tuple targets are skipped.
    fn convert_assignment(&self, node: Node<'_>, source: &str) -> Option<UnifiedNode> {
        let left = node.child_by_field_name("left")?;
        if left.kind() != "identifier" {
            return None;
        }
        let name = node_text(left, source);
        let type_annotation = node
            .child_by_field_name("type")
            .map(|n| node_text(n, source));
        let initializer = node
            .child_by_field_name("right")
            .map(|n| node_text(n, source))
            .filter(|text| text != &name);

        Some(UnifiedNode::new(
            UnifiedNodeKind::Variable {
                type_annotation,
                initializer,
            },
            name,
            location_of(node),
        ))
    }
}
