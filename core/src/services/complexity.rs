//! Cyclomatic and cognitive complexity over raw syntax trees.
//!
//! Both calculators are pure DFS pre-order walks; given the same tree they
//! always produce the same number, which the orchestrator relies on for
//! snapshot idempotence.

use tree_sitter::Node;

use crate::models::unified::Language;

/// McCabe cyclomatic complexity: base 1 plus one per decision point.
pub fn cyclomatic_complexity(root: Node<'_>, language: Language) -> u32 {
    1 + decision_points(root, language)
}

fn decision_points(node: Node<'_>, language: Language) -> u32 {
    let mut count = u32::from(is_decision_point(node, language));
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        count += decision_points(child, language);
    }
    count
}

fn is_decision_point(node: Node<'_>, language: Language) -> bool {
    match language {
        Language::TypeScript | Language::JavaScript => match node.kind() {
            "if_statement" | "switch_case" | "for_statement" | "for_in_statement"
            | "while_statement" | "do_statement" | "catch_clause" | "ternary_expression" => true,
            "binary_expression" => is_short_circuit(node),
            _ => false,
        },
        Language::Python => matches!(
            node.kind(),
            "if_statement"
                | "elif_clause"
                | "for_statement"
                | "while_statement"
                | "except_clause"
                | "conditional_expression"
                | "boolean_operator"
        ),
    }
}

fn is_short_circuit(node: Node<'_>) -> bool {
    node.child_by_field_name("operator")
        .map(|op| matches!(op.kind(), "&&" | "||"))
        .unwrap_or(false)
}

/// Cognitive complexity, the SonarSource method in simplified form:
/// +1 per increment structure, +nesting-level extra when the structure is
/// itself nested, +1 per flow-break statement. The extra uses the nesting
/// level at entry; entering any nesting structure deepens by one.
pub fn cognitive_complexity(root: Node<'_>, language: Language) -> u32 {
    let mut total = 0;
    visit_cognitive(root, 0, language, &mut total);
    total
}

fn visit_cognitive(node: Node<'_>, nesting: u32, language: Language, total: &mut u32) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if is_increment_structure(child, language) {
            *total += 1 + nesting;
        } else if is_flow_break(child, language) {
            *total += 1;
        }

        let next_nesting = if is_nesting_structure(child, language) {
            nesting + 1
        } else {
            nesting
        };
        visit_cognitive(child, next_nesting, language, total);
    }
}

fn is_increment_structure(node: Node<'_>, language: Language) -> bool {
    match language {
        // for_in_statement covers both for-in and for-of in this grammar
        Language::TypeScript | Language::JavaScript => matches!(
            node.kind(),
            "if_statement"
                | "ternary_expression"
                | "switch_statement"
                | "for_statement"
                | "for_in_statement"
                | "while_statement"
                | "do_statement"
                | "catch_clause"
        ),
        Language::Python => matches!(
            node.kind(),
            "if_statement"
                | "elif_clause"
                | "conditional_expression"
                | "for_statement"
                | "while_statement"
                | "except_clause"
        ),
    }
}

fn is_nesting_structure(node: Node<'_>, language: Language) -> bool {
    if is_increment_structure(node, language) {
        return true;
    }
    match language {
        Language::TypeScript | Language::JavaScript => matches!(
            node.kind(),
            "function_declaration"
                | "function_expression"
                | "generator_function"
                | "generator_function_declaration"
                | "arrow_function"
                | "method_definition"
        ),
        Language::Python => matches!(node.kind(), "function_definition" | "lambda"),
    }
}

fn is_flow_break(node: Node<'_>, language: Language) -> bool {
    match language {
        Language::TypeScript | Language::JavaScript => matches!(
            node.kind(),
            "return_statement" | "throw_statement" | "break_statement" | "continue_statement"
        ),
        Language::Python => matches!(
            node.kind(),
            "return_statement" | "raise_statement" | "break_statement" | "continue_statement"
        ),
    }
}
