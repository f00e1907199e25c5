//! Structural extraction: functions, classes and raw import specifiers.
//!
//! Everything here reads the raw tree; the unified view is not required, so
//! structure extraction still works when an adapter fails.

use serde::{Deserialize, Serialize};
use tree_sitter::Node;

use crate::models::finding::SourceLocation;
use crate::models::unified::Language;
use crate::services::adapters::{function_name, location_of, node_text};
use crate::services::complexity::{cognitive_complexity, cyclomatic_complexity};

/// One function (or method) with its local complexity numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionInfo {
    pub name: String,
    pub location: SourceLocation,
    pub cyclomatic_complexity: u32,
    pub cognitive_complexity: u32,
    pub parameter_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodInfo {
    pub name: String,
    pub location: SourceLocation,
    pub is_static: bool,
    pub is_private: bool,
    pub is_async: bool,
    pub parameter_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassInfo {
    pub name: String,
    pub location: SourceLocation,
    pub methods: Vec<MethodInfo>,
    pub property_count: usize,
    pub static_member_count: usize,
    pub super_class: Option<String>,
}

/// Every function-like construct in the file, nested ones included,
/// in DFS pre-order.
pub fn analyze_functions(root: Node<'_>, source: &str, language: Language) -> Vec<FunctionInfo> {
    let mut functions = Vec::new();
    collect_functions(root, source, language, &mut functions);
    functions
}

fn collect_functions(
    node: Node<'_>,
    source: &str,
    language: Language,
    out: &mut Vec<FunctionInfo>,
) {
    if is_function_kind(node, language) {
        out.push(FunctionInfo {
            name: function_display_name(node, source, language),
            location: location_of(node),
            cyclomatic_complexity: cyclomatic_complexity(node, language),
            cognitive_complexity: cognitive_complexity(node, language),
            parameter_count: parameter_count(node, language),
        });
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_functions(child, source, language, out);
    }
}

fn is_function_kind(node: Node<'_>, language: Language) -> bool {
    match language {
        Language::TypeScript | Language::JavaScript => matches!(
            node.kind(),
            "function_declaration" | "function_expression" | "arrow_function" | "method_definition"
        ),
        Language::Python => matches!(node.kind(), "function_definition" | "lambda"),
    }
}

fn function_display_name(node: Node<'_>, source: &str, language: Language) -> String {
    match language {
        Language::TypeScript | Language::JavaScript => function_name(node, source),
        Language::Python => node
            .child_by_field_name("name")
            .map(|n| node_text(n, source))
            .unwrap_or_else(|| "anonymous".to_string()),
    }
}

/// Count formal parameters. `identifier`, `required_parameter`,
/// `optional_parameter` and `rest_parameter` each count as one.
fn parameter_count(node: Node<'_>, language: Language) -> usize {
    let Some(params) = node.child_by_field_name("parameters") else {
        // `x => x` exposes the bare identifier as `parameter`
        return usize::from(node.child_by_field_name("parameter").is_some());
    };
    let mut cursor = params.walk();
    match language {
        Language::TypeScript | Language::JavaScript => params
            .named_children(&mut cursor)
            .filter(|p| {
                matches!(
                    p.kind(),
                    "identifier" | "required_parameter" | "optional_parameter" | "rest_parameter"
                )
            })
            .count(),
        Language::Python => params.named_children(&mut cursor).count(),
    }
}

/// Classes with their method tables and member counts.
pub fn analyze_classes(root: Node<'_>, source: &str, language: Language) -> Vec<ClassInfo> {
    let mut classes = Vec::new();
    collect_classes(root, source, language, &mut classes);
    classes
}

fn collect_classes(node: Node<'_>, source: &str, language: Language, out: &mut Vec<ClassInfo>) {
    let is_class = match language {
        Language::TypeScript | Language::JavaScript => node.kind() == "class_declaration",
        Language::Python => node.kind() == "class_definition",
    };
    if is_class {
        out.push(match language {
            Language::TypeScript | Language::JavaScript => convert_ts_class(node, source, language),
            Language::Python => convert_py_class(node, source),
        });
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_classes(child, source, language, out);
    }
}

fn convert_ts_class(node: Node<'_>, source: &str, language: Language) -> ClassInfo {
    let name = node
        .child_by_field_name("name")
        .map(|n| node_text(n, source))
        .unwrap_or_else(|| "anonymous".to_string());

    let super_class = child_of_kind(node, "class_heritage").and_then(|heritage| {
        child_of_kind(heritage, "extends_clause")
            .and_then(|extends| extends.named_child(0))
            // javascript grammar puts the extends target directly in the heritage
            .or_else(|| heritage.named_child(0))
            .map(|target| node_text(target, source))
    });

    let mut methods = Vec::new();
    let mut property_count = 0;
    let mut static_member_count = 0;

    if let Some(body) = node.child_by_field_name("body") {
        let mut cursor = body.walk();
        for member in body.named_children(&mut cursor) {
            match member.kind() {
                "method_definition" => {
                    let is_static = has_child_token(member, "static");
                    if is_static {
                        static_member_count += 1;
                    }
                    methods.push(MethodInfo {
                        name: member
                            .child_by_field_name("name")
                            .map(|n| node_text(n, source))
                            .unwrap_or_else(|| "anonymous".to_string()),
                        location: location_of(member),
                        is_static,
                        is_private: is_private_member(member, source),
                        is_async: has_child_token(member, "async"),
                        parameter_count: parameter_count(member, language),
                    });
                }
                "public_field_definition" | "field_definition" => {
                    property_count += 1;
                    if has_child_token(member, "static") {
                        static_member_count += 1;
                    }
                }
                _ => {}
            }
        }
    }

    ClassInfo {
        name,
        location: location_of(node),
        methods,
        property_count,
        static_member_count,
        super_class,
    }
}

fn convert_py_class(node: Node<'_>, source: &str) -> ClassInfo {
    let name = node
        .child_by_field_name("name")
        .map(|n| node_text(n, source))
        .unwrap_or_else(|| "anonymous".to_string());

    let super_class = node
        .child_by_field_name("superclasses")
        .and_then(|args| args.named_child(0))
        .map(|base| node_text(base, source));

    let mut methods = Vec::new();
    let mut property_count = 0;
    let mut static_member_count = 0;

    if let Some(body) = node.child_by_field_name("body") {
        let mut cursor = body.walk();
        for member in body.named_children(&mut cursor) {
            let (function, decorators) = match member.kind() {
                "function_definition" => (Some(member), Vec::new()),
                "decorated_definition" => {
                    let mut inner_cursor = member.walk();
                    let decorators: Vec<String> = member
                        .children(&mut inner_cursor)
                        .filter(|c| c.kind() == "decorator")
                        .map(|d| node_text(d, source))
                        .collect();
                    (child_of_kind(member, "function_definition"), decorators)
                }
                "expression_statement" => {
                    if child_of_kind(member, "assignment").is_some() {
                        property_count += 1;
                    }
                    (None, Vec::new())
                }
                _ => (None, Vec::new()),
            };

            if let Some(function) = function {
                let is_static = decorators.iter().any(|d| d.contains("staticmethod"));
                if is_static {
                    static_member_count += 1;
                }
                let name = function
                    .child_by_field_name("name")
                    .map(|n| node_text(n, source))
                    .unwrap_or_else(|| "anonymous".to_string());
                methods.push(MethodInfo {
                    is_private: name.starts_with('_'),
                    is_async: has_child_token(function, "async"),
                    parameter_count: parameter_count(function, Language::Python),
                    location: location_of(function),
                    is_static,
                    name,
                });
            }
        }
    }

    ClassInfo {
        name,
        location: location_of(node),
        methods,
        property_count,
        static_member_count,
        super_class,
    }
}

/// Raw import specifiers in source order: static imports, `require(...)`
/// calls whose callee is literally `require`, and dynamic `import(...)`
/// expressions. Returned verbatim, never resolved.
pub fn analyze_module_dependencies(
    root: Node<'_>,
    source: &str,
    language: Language,
) -> Vec<String> {
    let mut specifiers = Vec::new();
    collect_dependencies(root, source, language, &mut specifiers);
    specifiers
}

fn collect_dependencies(
    node: Node<'_>,
    source: &str,
    language: Language,
    out: &mut Vec<String>,
) {
    match language {
        Language::TypeScript | Language::JavaScript => match node.kind() {
            "import_statement" | "import_declaration" => {
                if let Some(spec) = node
                    .child_by_field_name("source")
                    .map(|n| strip_quotes(&node_text(n, source)))
                {
                    out.push(spec);
                }
            }
            "call_expression" => {
                if let Some(function) = node.child_by_field_name("function") {
                    let callee = node_text(function, source);
                    // aliased requires are intentionally missed
                    if callee == "require" || function.kind() == "import" {
                        if let Some(spec) = first_string_argument(node, source) {
                            out.push(spec);
                        }
                    }
                }
            }
            _ => {}
        },
        Language::Python => match node.kind() {
            "import_statement" => {
                let mut cursor = node.walk();
                for imported in node.named_children(&mut cursor) {
                    let module = match imported.kind() {
                        "aliased_import" => imported
                            .child_by_field_name("name")
                            .map(|n| node_text(n, source)),
                        "dotted_name" => Some(node_text(imported, source)),
                        _ => None,
                    };
                    if let Some(module) = module {
                        out.push(module);
                    }
                }
            }
            "import_from_statement" => {
                if let Some(module) = node
                    .child_by_field_name("module_name")
                    .map(|n| node_text(n, source))
                {
                    out.push(module);
                }
            }
            _ => {}
        },
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_dependencies(child, source, language, out);
    }
}

fn first_string_argument(call: Node<'_>, source: &str) -> Option<String> {
    let args = call.child_by_field_name("arguments")?;
    let mut cursor = args.walk();
    let found = args
        .named_children(&mut cursor)
        .find(|arg| matches!(arg.kind(), "string" | "template_string"))
        .map(|arg| strip_quotes(&node_text(arg, source)));
    found
}

fn child_of_kind<'tree>(node: Node<'tree>, kind: &str) -> Option<Node<'tree>> {
    let mut cursor = node.walk();
    let found = node.children(&mut cursor).find(|c| c.kind() == kind);
    found
}

fn has_child_token(node: Node<'_>, token: &str) -> bool {
    let mut cursor = node.walk();
    let found = node.children(&mut cursor).any(|c| c.kind() == token);
    found
}

fn is_private_member(member: Node<'_>, source: &str) -> bool {
    if let Some(name) = member.child_by_field_name("name") {
        if name.kind() == "private_property_identifier" {
            return true;
        }
    }
    let mut cursor = member.walk();
    let found = member
        .children(&mut cursor)
        .any(|c| c.kind() == "accessibility_modifier" && node_text(c, source) == "private");
    found
}

fn strip_quotes(literal: &str) -> String {
    literal
        .trim_matches(|c| c == '"' || c == '\'' || c == '`')
        .to_string()
}
