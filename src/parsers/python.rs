//! Python parser using tree-sitter
//!
//! Extracts classes, functions (at any depth) and imports from Python source.
//! Parent/child relations come from an explicit stack walk over the syntax
//! tree, never from matching names.

use crate::error::{CortexError, Result};
use crate::metrics::analyze_function;
use crate::parsers::{DefKind, Definition, ImportRef, ParsedModule};
use std::path::Path;
use tree_sitter::{Node, Parser};

/// Parse a Python file and extract all code entities
pub fn parse(path: &Path) -> Result<ParsedModule> {
    let bytes = std::fs::read(path)?;
    let source = String::from_utf8(bytes)
        .map_err(|_| CortexError::Parse(format!("{} is not valid UTF-8", path.display())))?;
    parse_source(&source, path)
}

/// Parse Python source code directly (useful for testing)
pub fn parse_source(source: &str, path: &Path) -> Result<ParsedModule> {
    let mut parser = Parser::new();
    let language = tree_sitter_python::LANGUAGE;
    parser
        .set_language(&language.into())
        .map_err(|e| CortexError::Parse(format!("failed to set Python language: {}", e)))?;

    let tree = parser
        .parse(source, None)
        .ok_or_else(|| CortexError::Parse(format!("no syntax tree for {}", path.display())))?;

    let root = tree.root_node();
    if root.has_error() {
        let line = first_error_line(&root).unwrap_or(1);
        return Err(CortexError::Parse(format!(
            "syntax error in {} near line {}",
            path.display(),
            line
        )));
    }

    let source_bytes = source.as_bytes();
    let mut result = ParsedModule {
        line_count: source.lines().count() as u32,
        ..Default::default()
    };

    walk(&root, source_bytes, &mut result);

    Ok(result)
}

/// Stack-based walk collecting definitions and imports.
///
/// Each frame carries the index of the innermost enclosing definition.
fn walk(root: &Node, source: &[u8], result: &mut ParsedModule) {
    let mut stack: Vec<(Node, Option<usize>)> = Vec::new();
    push_children(&mut stack, root, None);

    while let Some((node, parent)) = stack.pop() {
        match node.kind() {
            "function_definition" | "class_definition" => {
                match definition(&node, source, parent, result) {
                    Some(def) => {
                        let index = result.definitions.len();
                        result.definitions.push(def);
                        push_children(&mut stack, &node, Some(index));
                    }
                    None => push_children(&mut stack, &node, parent),
                }
            }
            "import_statement" => extract_import(&node, source, result),
            "import_from_statement" => extract_from_import(&node, source, result),
            _ => push_children(&mut stack, &node, parent),
        }
    }
}

/// Children are pushed in reverse so the stack pops them in source order.
fn push_children<'t>(
    stack: &mut Vec<(Node<'t>, Option<usize>)>,
    node: &Node<'t>,
    parent: Option<usize>,
) {
    let mut cursor = node.walk();
    let children: Vec<Node<'t>> = node.children(&mut cursor).collect();
    stack.extend(children.into_iter().rev().map(|c| (c, parent)));
}

fn definition(
    node: &Node,
    source: &[u8],
    parent: Option<usize>,
    result: &ParsedModule,
) -> Option<Definition> {
    let name = node
        .child_by_field_name("name")?
        .utf8_text(source)
        .ok()?
        .to_string();

    let qualified_name = match parent {
        Some(p) => format!("{}.{}", result.definitions[p].qualified_name, name),
        None => name.clone(),
    };

    let line_start = node.start_position().row as u32 + 1;
    let line_end = node.end_position().row as u32 + 1;

    if node.kind() == "class_definition" {
        return Some(Definition {
            kind: DefKind::Class,
            name,
            qualified_name,
            parent,
            line_start,
            line_end,
            parameters: vec![],
            bases: extract_bases(node, source),
            is_async: false,
            metrics: None,
        });
    }

    let parameters = extract_parameters(node.child_by_field_name("parameters"), source);
    let metrics = analyze_function(node, parameters.len() as u32);
    let is_async = node
        .child(0)
        .is_some_and(|first| first.kind() == "async");

    Some(Definition {
        kind: DefKind::Function,
        name,
        qualified_name,
        parent,
        line_start,
        line_end,
        parameters,
        bases: vec![],
        is_async,
        metrics: Some(metrics),
    })
}

/// Extract parameter names from a parameters node
///
/// Includes `self`, `*args`, `**kwargs` and keyword-only parameters; bare
/// `*` and `/` separators are not parameters.
fn extract_parameters(params_node: Option<Node>, source: &[u8]) -> Vec<String> {
    let Some(node) = params_node else {
        return vec![];
    };

    let mut params = Vec::new();
    let mut cursor = node.walk();

    for child in node.children(&mut cursor) {
        match child.kind() {
            "identifier" => {
                if let Ok(text) = child.utf8_text(source) {
                    params.push(text.to_string());
                }
            }
            "typed_parameter" | "default_parameter" | "typed_default_parameter" => {
                if let Some(name) = parameter_name(&child, source) {
                    params.push(name);
                }
            }
            "list_splat_pattern" | "dictionary_splat_pattern" => {
                let prefix = if child.kind() == "list_splat_pattern" {
                    "*"
                } else {
                    "**"
                };
                if let Some(name) = first_identifier(&child, source) {
                    params.push(format!("{}{}", prefix, name));
                }
            }
            _ => {}
        }
    }

    params
}

fn parameter_name(node: &Node, source: &[u8]) -> Option<String> {
    if let Some(name_node) = node.child_by_field_name("name") {
        return name_node.utf8_text(source).ok().map(str::to_string);
    }

    // typed_parameter has no name field; its first child is the name or a splat
    let first = node.named_child(0)?;
    match first.kind() {
        "identifier" => first.utf8_text(source).ok().map(str::to_string),
        "list_splat_pattern" => first_identifier(&first, source).map(|n| format!("*{}", n)),
        "dictionary_splat_pattern" => first_identifier(&first, source).map(|n| format!("**{}", n)),
        _ => None,
    }
}

fn first_identifier(node: &Node, source: &[u8]) -> Option<String> {
    let mut cursor = node.walk();
    let found = node
        .children(&mut cursor)
        .find(|c| c.kind() == "identifier")?;
    found.utf8_text(source).ok().map(str::to_string)
}

/// Extract base class names from a class definition
fn extract_bases(class_node: &Node, source: &[u8]) -> Vec<String> {
    let Some(args) = class_node.child_by_field_name("superclasses") else {
        return vec![];
    };

    let mut bases = Vec::new();
    let mut cursor = args.walk();
    for arg in args.children(&mut cursor) {
        if let Some(base_name) = extract_base_name(&arg, source) {
            bases.push(base_name);
        }
    }
    bases
}

fn extract_base_name(node: &Node, source: &[u8]) -> Option<String> {
    match node.kind() {
        "identifier" | "attribute" => node.utf8_text(source).ok().map(str::to_string),
        // Generic[T] - keep the base
        "subscript" => node
            .child_by_field_name("value")
            .and_then(|n| extract_base_name(&n, source)),
        // metaclass=..., punctuation
        _ => None,
    }
}

/// `import a.b, c as d`
fn extract_import(node: &Node, source: &[u8], result: &mut ParsedModule) {
    let mut cursor = node.walk();
    for child in node.children_by_field_name("name", &mut cursor) {
        let module_node = if child.kind() == "aliased_import" {
            child.child_by_field_name("name")
        } else {
            Some(child)
        };
        if let Some(text) = module_node.and_then(|n| n.utf8_text(source).ok()) {
            result.imports.push(ImportRef {
                module: text.to_string(),
                level: 0,
                names: vec![],
                line: node.start_position().row as u32 + 1,
            });
        }
    }
}

/// `from a.b import c`, `from ..x import y`, `from . import z`
fn extract_from_import(node: &Node, source: &[u8], result: &mut ParsedModule) {
    let Some(module_node) = node.child_by_field_name("module_name") else {
        return;
    };

    let (module, level) = if module_node.kind() == "relative_import" {
        let mut level = 0;
        let mut module = String::new();
        let mut cursor = module_node.walk();
        for part in module_node.children(&mut cursor) {
            match part.kind() {
                "import_prefix" => {
                    level = part.utf8_text(source).map_or(0, |t| t.matches('.').count() as u32)
                }
                "dotted_name" => module = part.utf8_text(source).unwrap_or("").to_string(),
                _ => {}
            }
        }
        (module, level)
    } else {
        (module_node.utf8_text(source).unwrap_or("").to_string(), 0)
    };

    let mut names = Vec::new();
    let mut cursor = node.walk();
    for child in node.children_by_field_name("name", &mut cursor) {
        let name_node = if child.kind() == "aliased_import" {
            child.child_by_field_name("name")
        } else {
            Some(child)
        };
        if let Some(text) = name_node.and_then(|n| n.utf8_text(source).ok()) {
            names.push(text.to_string());
        }
    }

    result.imports.push(ImportRef {
        module,
        level,
        names,
        line: node.start_position().row as u32 + 1,
    });
}

fn first_error_line(root: &Node) -> Option<u32> {
    let mut stack = vec![*root];
    while let Some(node) = stack.pop() {
        if node.is_error() || node.is_missing() {
            return Some(node.start_position().row as u32 + 1);
        }
        if node.has_error() {
            let mut cursor = node.walk();
            let children: Vec<Node> = node.children(&mut cursor).collect();
            stack.extend(children.into_iter().rev());
        }
    }
    None
}
