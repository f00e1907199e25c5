//! TypeScript / JavaScript adapter.
//!
//! The two grammars share node vocabulary for everything this adapter
//! tracks, so a single strategy serves both languages (TSX included).

use std::path::Path;

use anyhow::Result;
use tree_sitter::{Node, Tree};

use crate::models::unified::{UnifiedNode, UnifiedNodeKind};

use super::{collect_children, location_of, node_text, NodeAdapter};

pub struct TypeScriptAdapter;

impl NodeAdapter for TypeScriptAdapter {
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
            "function_declaration" | "function_expression" | "arrow_function" => {
                Some(self.convert_function(node, source, false))
            }
            "method_definition" => Some(self.convert_function(node, source, true)),
            "class_declaration" => Some(self.convert_class(node, source)),
            "import_statement" => self.convert_import(node, source),
            "call_expression" => Some(self.convert_call(node, source)),
            "interface_declaration" => Some(UnifiedNode::new(
                UnifiedNodeKind::Interface,
                declared_name(node, source),
                location_of(node),
            )),
            "type_alias_declaration" => Some(UnifiedNode::new(
                UnifiedNodeKind::TypeAlias,
                declared_name(node, source),
                location_of(node),
            )),
            "enum_declaration" => Some(UnifiedNode::new(
                UnifiedNodeKind::Enum,
                declared_name(node, source),
                location_of(node),
            )),
            "variable_declarator" => Some(self.convert_variable(node, source)),
            _ => None,
        }
    }
}

impl TypeScriptAdapter {
    fn convert_function(&self, node: Node<'_>, source: &str, method: bool) -> UnifiedNode {
        let name = function_name(node, source);
        let parameters = match node.child_by_field_name("parameters") {
            Some(params) => parameter_names(params, source),
            // `x => x` exposes the bare identifier as `parameter`
            None => node
                .child_by_field_name("parameter")
                .map(|p| vec![node_text(p, source)])
                .unwrap_or_default(),
        };
        let return_type = node
            .child_by_field_name("return_type")
            .map(|n| node_text(n, source).trim_start_matches(':').trim().to_string());
        let is_async = has_leading_token(node, "async");

        let kind = if method {
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
        let mut super_class = None;
        let mut implements = Vec::new();
        let mut decorators = Vec::new();

        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            match child.kind() {
                "class_heritage" => {
                    let mut heritage_cursor = child.walk();
                    for clause in child.children(&mut heritage_cursor) {
                        match clause.kind() {
                            "extends_clause" => {
                                super_class = clause
                                    .named_child(0)
                                    .map(|target| node_text(target, source));
                            }
                            "implements_clause" => {
                                let mut clause_cursor = clause.walk();
                                implements.extend(
                                    clause
                                        .named_children(&mut clause_cursor)
                                        .map(|ty| node_text(ty, source)),
                                );
                            }
                            _ => {}
                        }
                    }
                    if super_class.is_none() {
                        // javascript grammar: `extends` expr sits directly
                        // under class_heritage without a clause node
                        super_class = child.named_child(0).map(|t| node_text(t, source));
                    }
                }
                "decorator" => decorators.push(node_text(child, source)),
                _ => {}
            }
        }

        // decorators of an exported class hang off the export statement
        if decorators.is_empty() {
            if let Some(parent) = node.parent().filter(|p| p.kind() == "export_statement") {
                let mut parent_cursor = parent.walk();
                decorators.extend(
                    parent
                        .children(&mut parent_cursor)
                        .filter(|c| c.kind() == "decorator")
                        .map(|d| node_text(d, source)),
                );
            }
        }

        UnifiedNode::new(
            UnifiedNodeKind::Class {
                super_class,
                implements,
                decorators,
            },
            declared_name(node, source),
            location_of(node),
        )
    }

    fn convert_import(&self, node: Node<'_>, source: &str) -> Option<UnifiedNode> {
        let source_literal = node
            .child_by_field_name("source")
            .map(|n| strip_quotes(&node_text(n, source)))?;

        let mut symbols = Vec::new();
        let mut is_default = false;
        let mut is_namespace = false;

        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if child.kind() != "import_clause" {
                continue;
            }
            let mut clause_cursor = child.walk();
            for part in child.children(&mut clause_cursor) {
                match part.kind() {
                    "identifier" => {
                        is_default = true;
                        symbols.push(node_text(part, source));
                    }
                    "namespace_import" => {
                        is_namespace = true;
                        if let Some(alias) = part.named_child(0) {
                            symbols.push(node_text(alias, source));
                        }
                    }
                    "named_imports" => {
                        let mut spec_cursor = part.walk();
                        for spec in part.named_children(&mut spec_cursor) {
                            if spec.kind() != "import_specifier" {
                                continue;
                            }
                            // `{a as b}` binds b; keep the bound-name side
                            let bound = spec
                                .child_by_field_name("alias")
                                .or_else(|| spec.child_by_field_name("name"));
                            if let Some(bound) = bound {
                                symbols.push(node_text(bound, source));
                            }
                        }
                    }
                    _ => {}
                }
            }
        }

        Some(UnifiedNode::new(
            UnifiedNodeKind::Import {
                source: source_literal.clone(),
                symbols,
                is_default,
                is_namespace,
            },
            source_literal,
            location_of(node),
        ))
    }

    fn convert_call(&self, node: Node<'_>, source: &str) -> UnifiedNode {
        let callee = node
            .named_child(0)
            .map(|target| node_text(target, source))
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

    fn convert_variable(&self, node: Node<'_>, source: &str) -> UnifiedNode {
        let name = node
            .child_by_field_name("name")
            .map(|n| node_text(n, source))
            .unwrap_or_else(|| "anonymous".to_string());
        let type_annotation = node
            .child_by_field_name("type")
            .map(|n| node_text(n, source).trim_start_matches(':').trim().to_string());
        let initializer = node
            .child_by_field_name("value")
            .map(|n| node_text(n, source))
            .filter(|text| text != &name);

        UnifiedNode::new(
            UnifiedNodeKind::Variable {
                type_annotation,
                initializer,
            },
            name,
            location_of(node),
        )
    }
}

/// Name from the declaration's `name` field or first identifier child.
pub(crate) fn declared_name(node: Node<'_>, source: &str) -> String {
    if let Some(name) = node.child_by_field_name("name") {
        return node_text(name, source);
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() == "identifier" || child.kind() == "type_identifier" {
            return node_text(child, source);
        }
    }
    "anonymous".to_string()
}

/// Function name, falling back to the enclosing variable declarator (or
/// property assignment) when the function itself is anonymous.
pub(crate) fn function_name(node: Node<'_>, source: &str) -> String {
    if let Some(name) = node.child_by_field_name("name") {
        return node_text(name, source);
    }
    let mut ancestor = node.parent();
    while let Some(parent) = ancestor {
        match parent.kind() {
            "variable_declarator" | "pair" | "public_field_definition" => {
                if let Some(name) = parent
                    .child_by_field_name("name")
                    .or_else(|| parent.child_by_field_name("key"))
                {
                    return node_text(name, source);
                }
                break;
            }
            // stop at statement boundaries; only immediate declarators count
            "parenthesized_expression" => ancestor = parent.parent(),
            _ => break,
        }
    }
    "anonymous".to_string()
}

/// Parameter list text, one entry per formal parameter.
fn parameter_names(params: Node<'_>, source: &str) -> Vec<String> {
    let mut cursor = params.walk();
    params
        .named_children(&mut cursor)
        .filter(|p| {
            matches!(
                p.kind(),
                "identifier" | "required_parameter" | "optional_parameter" | "rest_parameter"
            )
        })
        .map(|p| node_text(p, source))
        .collect()
}

fn has_leading_token(node: Node<'_>, token: &str) -> bool {
    let mut cursor = node.walk();
    let found = node.children(&mut cursor).any(|c| c.kind() == token);
    found
}

fn strip_quotes(literal: &str) -> String {
    literal
        .trim_matches(|c| c == '"' || c == '\'' || c == '`')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::unified::Language;
    use crate::services::parser::SourceParser;

    fn unify(source: &str) -> UnifiedNode {
        let mut parser = SourceParser::new();
        let result = parser
            .parse(source, Language::TypeScript, Some(Path::new("mod.ts")))
            .unwrap();
        result.unified.unwrap().remove(0)
    }

    fn find<'a>(root: &'a UnifiedNode, tag: &str) -> Vec<&'a UnifiedNode> {
        let mut hits = Vec::new();
        collect(root, tag, &mut hits);
        hits
    }

    fn collect<'a>(node: &'a UnifiedNode, tag: &str, hits: &mut Vec<&'a UnifiedNode>) {
        if node.kind.tag() == tag {
            hits.push(node);
        }
        for child in &node.children {
            collect(child, tag, hits);
        }
    }

    #[test]
    fn extracts_named_function_with_parameters() {
        let module = unify("async function fetchUser(id: string, retries = 3) { return id; }");
        let functions = find(&module, "function");
        assert_eq!(functions.len(), 1);
        let f = functions[0];
        assert_eq!(f.name, "fetchUser");
        match &f.kind {
            UnifiedNodeKind::Function {
                parameters,
                is_async,
                ..
            } => {
                assert_eq!(parameters.len(), 2);
                assert!(is_async);
            }
            other => panic!("expected function, got {other:?}"),
        }
    }

    #[test]
    fn anonymous_arrow_takes_declarator_name() {
        let module = unify("const sum = (a: number, b: number) => a + b;");
        let functions = find(&module, "function");
        assert_eq!(functions.len(), 1);
        assert_eq!(functions[0].name, "sum");
    }

    #[test]
    fn class_heritage_is_extracted() {
        let module = unify(
            "class Button extends Component implements Clickable, Focusable { render() {} }",
        );
        let classes = find(&module, "class");
        assert_eq!(classes.len(), 1);
        match &classes[0].kind {
            UnifiedNodeKind::Class {
                super_class,
                implements,
                ..
            } => {
                assert_eq!(super_class.as_deref(), Some("Component"));
                assert_eq!(implements, &["Clickable", "Focusable"]);
            }
            other => panic!("expected class, got {other:?}"),
        }
        let methods = find(&module, "method");
        assert_eq!(methods[0].name, "render");
    }

    #[test]
    fn exported_class_keeps_its_decorators() {
        let module = unify("@injectable()\nexport class Service {}\n");
        let classes = find(&module, "class");
        match &classes[0].kind {
            UnifiedNodeKind::Class { decorators, .. } => {
                assert_eq!(decorators, &["@injectable()"]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn import_clause_variants_are_recognized() {
        let module = unify(
            "import def from './a';\nimport * as ns from './b';\nimport { x, y as z } from './c';",
        );
        let imports = find(&module, "import");
        assert_eq!(imports.len(), 3);

        match &imports[0].kind {
            UnifiedNodeKind::Import {
                source,
                symbols,
                is_default,
                ..
            } => {
                assert_eq!(source, "./a");
                assert_eq!(symbols, &["def"]);
                assert!(is_default);
            }
            other => panic!("unexpected {other:?}"),
        }
        match &imports[1].kind {
            UnifiedNodeKind::Import {
                is_namespace,
                symbols,
                ..
            } => {
                assert!(is_namespace);
                assert_eq!(symbols, &["ns"]);
            }
            other => panic!("unexpected {other:?}"),
        }
        match &imports[2].kind {
            UnifiedNodeKind::Import { symbols, .. } => {
                // `y as z` binds z
                assert_eq!(symbols, &["x", "z"]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn interface_alias_and_enum_are_tracked() {
        let module = unify(
            "interface Shape { area(): number }\ntype Point = { x: number };\nenum Color { Red }",
        );
        assert_eq!(find(&module, "interface")[0].name, "Shape");
        assert_eq!(find(&module, "typeAlias")[0].name, "Point");
        assert_eq!(find(&module, "enum")[0].name, "Color");
    }

    #[test]
    fn call_captures_callee_and_argument_text() {
        let module = unify("register(handler, { once: true });");
        let calls = find(&module, "call");
        assert_eq!(calls.len(), 1);
        match &calls[0].kind {
            UnifiedNodeKind::Call { callee, arguments } => {
                assert_eq!(callee, "register");
                assert_eq!(arguments.len(), 2);
                assert_eq!(arguments[0], "handler");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn variable_initializer_equal_to_name_is_dropped() {
        let module = unify("let alias = alias;");
        let variables = find(&module, "variable");
        match &variables[0].kind {
            UnifiedNodeKind::Variable { initializer, .. } => assert!(initializer.is_none()),
            other => panic!("unexpected {other:?}"),
        }
    }
}
