//! Complexity counting over a tree-sitter function body
//!
//! The walk uses an explicit work stack of `(node, nesting)` frames and
//! threads a single [`Tally`] through it, so deeply nested sources cannot
//! exhaust the call stack.

use super::FunctionMetrics;
use tree_sitter::Node;

#[derive(Debug, Default)]
struct Tally {
    cyclomatic: u32,
    cognitive: u32,
    max_nesting: u32,
}

impl Tally {
    fn visit(&mut self, kind: &str, nesting: u32) {
        match kind {
            "if_statement" | "elif_clause" | "for_statement" | "while_statement" => {
                self.cyclomatic += 1;
                self.cognitive += 1 + nesting;
            }
            "except_clause" | "except_group_clause" | "with_statement" => {
                self.cyclomatic += 1;
                self.cognitive += 1;
            }
            "assert_statement" => self.cyclomatic += 1,
            // One node per `and`/`or` operator: a chain of n operands yields n - 1
            "boolean_operator" => self.cyclomatic += 1,
            "lambda" => self.cognitive += 1,
            "list_comprehension"
            | "dictionary_comprehension"
            | "set_comprehension"
            | "generator_expression" => self.cognitive += 1 + nesting,
            _ => {}
        }
    }
}

/// Definitions nested inside a function are scored as entities of their own.
fn is_nested_definition(kind: &str) -> bool {
    matches!(
        kind,
        "function_definition" | "class_definition" | "decorated_definition"
    )
}

/// Compute metrics for a `function_definition` node
pub fn analyze_function(node: &Node, parameter_count: u32) -> FunctionMetrics {
    let line_start = node.start_position().row as u32 + 1;
    let line_end = node.end_position().row as u32 + 1;

    let mut tally = Tally {
        cyclomatic: 1,
        ..Default::default()
    };

    let mut stack: Vec<(Node, u32)> = Vec::new();
    if let Some(body) = node.child_by_field_name("body") {
        let mut cursor = body.walk();
        stack.extend(body.children(&mut cursor).map(|c| (c, 0)));
    }

    while let Some((current, nesting)) = stack.pop() {
        let kind = current.kind();
        if is_nested_definition(kind) {
            continue;
        }

        let nesting = if kind == "block" {
            let level = nesting + 1;
            tally.max_nesting = tally.max_nesting.max(level);
            level
        } else {
            nesting
        };

        tally.visit(kind, nesting);

        let mut cursor = current.walk();
        stack.extend(current.children(&mut cursor).map(|c| (c, nesting)));
    }

    FunctionMetrics {
        cyclomatic_complexity: tally.cyclomatic,
        cognitive_complexity: tally.cognitive,
        lines_of_code: line_end.saturating_sub(line_start) + 1,
        parameter_count,
        max_nesting_depth: tally.max_nesting,
    }
}
