//! Source code parsers using tree-sitter
//!
//! Only Python is supported. The parser yields raw facts per file
//! ([`ParsedModule`]); the scanner turns them into graph nodes and edges.

pub mod python;

use crate::error::Result;
use crate::metrics::FunctionMetrics;
use std::path::Path;

/// File extensions the scanner picks up
pub const PYTHON_EXTENSIONS: &[&str] = &["py", "pyi"];

/// Parse a file and extract all code entities
pub fn parse_file(path: &Path) -> Result<ParsedModule> {
    python::parse(path)
}

pub fn is_python_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| PYTHON_EXTENSIONS.contains(&ext))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefKind {
    Class,
    Function,
}

/// A class or function definition at any depth
#[derive(Debug, Clone)]
pub struct Definition {
    pub kind: DefKind,
    pub name: String,
    /// Dotted chain of enclosing definition names, e.g. `Outer.method`
    pub qualified_name: String,
    /// Index of the innermost enclosing definition in `ParsedModule::definitions`
    pub parent: Option<usize>,
    pub line_start: u32,
    pub line_end: u32,
    pub parameters: Vec<String>,
    pub bases: Vec<String>,
    pub is_async: bool,
    /// Present for functions only
    pub metrics: Option<FunctionMetrics>,
}

/// One `import` or `from ... import` statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRef {
    /// Dotted module path as written, without leading dots
    pub module: String,
    /// Number of leading dots for relative imports (0 = absolute)
    pub level: u32,
    /// Names listed after `import` in a from-import
    pub names: Vec<String>,
    pub line: u32,
}

impl ImportRef {
    /// The import as it appears in source, e.g. `..pkg.mod`
    pub fn display_name(&self) -> String {
        let dots = ".".repeat(self.level as usize);
        format!("{}{}", dots, self.module)
    }
}

/// Result of parsing a single file
#[derive(Debug, Clone, Default)]
pub struct ParsedModule {
    /// Definitions in source order; parents always precede children
    pub definitions: Vec<Definition>,
    pub imports: Vec<ImportRef>,
    pub line_count: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_python_file() {
        assert!(is_python_file(Path::new("a/b.py")));
        assert!(is_python_file(Path::new("stubs/b.pyi")));
        assert!(!is_python_file(Path::new("README.md")));
        assert!(!is_python_file(Path::new("Makefile")));
    }

    #[test]
    fn test_import_display_name() {
        let import = ImportRef {
            module: "pkg.mod".to_string(),
            level: 2,
            names: vec![],
            line: 1,
        };
        assert_eq!(import.display_name(), "..pkg.mod");
    }
}
