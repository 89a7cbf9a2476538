//! Source scanner
//!
//! Walks a project tree, parses each Python file in parallel and emits the
//! raw graph facts: nodes, edges and per-function metrics. No scoring
//! happens here.

pub mod imports;
pub mod walk;

use crate::config::ScanConfig;
use crate::error::{CortexError, Result};
use crate::graph::{ClassNode, CodeEdge, CodeNode, FunctionNode};
use crate::metrics::FunctionMetrics;
use crate::models::SkippedFile;
use crate::parsers::{self, DefKind, ParsedModule};
use imports::{ImportResolver, ImportTarget};
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Facts produced by one scan
#[derive(Debug, Default)]
pub struct ScanOutput {
    pub nodes: Vec<CodeNode>,
    pub edges: Vec<CodeEdge>,
    pub function_metrics: HashMap<String, FunctionMetrics>,
    pub skipped: Vec<SkippedFile>,
    /// Files parsed successfully
    pub files_scanned: usize,
}

pub struct Scanner {
    ignore: HashSet<String>,
    follow_links: bool,
    max_file_bytes: u64,
}

impl Scanner {
    pub fn new(config: &ScanConfig) -> Self {
        Self {
            ignore: config.ignore_set(),
            follow_links: config.follow_links,
            max_file_bytes: config.max_file_bytes,
        }
    }

    /// Scan every `.py`/`.pyi` file under `root`
    pub fn scan(&self, root: &Path) -> Result<ScanOutput> {
        if !root.is_dir() {
            return Err(CortexError::InvalidInput(format!(
                "scan root {} is not a directory",
                root.display()
            )));
        }

        let files: Vec<(String, PathBuf)> = walk::collect_files(root, &self.ignore, self.follow_links)
            .into_iter()
            .filter(|p| parsers::is_python_file(p))
            .filter_map(|p| walk::relative_id(root, &p).map(|id| (id, p)))
            .collect();
        debug!("Found {} Python files under {}", files.len(), root.display());

        let results: Vec<(String, std::result::Result<ParsedModule, String>)> = files
            .par_iter()
            .map(|(id, path)| (id.clone(), self.parse_one(path)))
            .collect();

        let known: HashSet<String> = files.iter().map(|(id, _)| id.clone()).collect();
        let resolver = ImportResolver::new(&known);

        let mut output = ScanOutput::default();
        let mut modules: BTreeMap<String, CodeNode> = BTreeMap::new();

        for (file_id, result) in results {
            match result {
                Ok(parsed) => {
                    emit_file(&file_id, &parsed, &resolver, &mut output, &mut modules);
                    output.files_scanned += 1;
                }
                Err(reason) => {
                    warn!("Skipping {}: {}", file_id, reason);
                    output.skipped.push(SkippedFile {
                        path: file_id,
                        reason,
                    });
                }
            }
        }

        output.nodes.extend(modules.into_values());

        info!(
            "Scanned {} files ({} skipped): {} nodes, {} edges",
            output.files_scanned,
            output.skipped.len(),
            output.nodes.len(),
            output.edges.len()
        );

        Ok(output)
    }

    fn parse_one(&self, path: &Path) -> std::result::Result<ParsedModule, String> {
        let size = std::fs::metadata(path).map_err(|e| e.to_string())?.len();
        if size > self.max_file_bytes {
            return Err(format!(
                "file too large ({} bytes, limit {})",
                size, self.max_file_bytes
            ));
        }
        parsers::parse_file(path).map_err(|e| e.to_string())
    }
}

/// Turn one parsed file into nodes and edges
fn emit_file(
    file_id: &str,
    parsed: &ParsedModule,
    resolver: &ImportResolver<'_>,
    output: &mut ScanOutput,
    modules: &mut BTreeMap<String, CodeNode>,
) {
    output.nodes.push(CodeNode::file(file_id, parsed.line_count));

    let ids: Vec<String> = parsed
        .definitions
        .iter()
        .map(|d| format!("{}:{}", file_id, d.qualified_name))
        .collect();

    // First class of each name wins as an inheritance target within the file
    let mut classes_by_name: HashMap<&str, &str> = HashMap::new();
    for (def, id) in parsed.definitions.iter().zip(&ids) {
        if def.kind == DefKind::Class {
            classes_by_name.entry(def.name.as_str()).or_insert(id.as_str());
        }
    }

    for (def, id) in parsed.definitions.iter().zip(&ids) {
        let node = match def.kind {
            DefKind::Class => CodeNode::Class(ClassNode {
                id: id.clone(),
                name: def.name.clone(),
                file_path: file_id.to_string(),
                line_start: def.line_start,
                line_end: def.line_end,
                bases: def.bases.clone(),
            }),
            DefKind::Function => CodeNode::Function(FunctionNode {
                id: id.clone(),
                name: def.name.clone(),
                file_path: file_id.to_string(),
                line_start: def.line_start,
                line_end: def.line_end,
                parameters: def.parameters.clone(),
                is_async: def.is_async,
            }),
        };
        output.nodes.push(node);

        if let Some(m) = def.metrics {
            output.function_metrics.insert(id.clone(), m);
        }

        let edge = match def.parent {
            None => CodeEdge::contains(file_id, id),
            Some(p) => {
                let parent = &parsed.definitions[p];
                if parent.kind == DefKind::Class && def.kind == DefKind::Function {
                    CodeEdge::method(&ids[p], id)
                } else {
                    CodeEdge::contains(&ids[p], id)
                }
            }
        };
        output.edges.push(edge);

        for base in &def.bases {
            let target = classes_by_name
                .get(base.as_str())
                .map(|s| s.to_string())
                .unwrap_or_else(|| base.clone());
            output.edges.push(CodeEdge::inherits(id, &target));
        }
    }

    let targets: BTreeSet<ImportTarget> = parsed
        .imports
        .iter()
        .flat_map(|import| resolver.resolve(file_id, import))
        .collect();

    for target in targets {
        match target {
            ImportTarget::Internal(target_id) => {
                output.edges.push(CodeEdge::imports(file_id, &target_id));
            }
            ImportTarget::External(name) => {
                modules
                    .entry(name.clone())
                    .or_insert_with(|| CodeNode::module(&name));
                output.edges.push(CodeEdge::imports(file_id, &name));
            }
        }
    }
    debug!(
        "{}: {} definitions, {} imports",
        file_id,
        parsed.definitions.len(),
        parsed.imports.len()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{EdgeKind, NodeKind};
    use std::fs;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    fn has_edge(output: &ScanOutput, src: &str, dst: &str, kind: EdgeKind) -> bool {
        output
            .edges
            .iter()
            .any(|e| e.source_id == src && e.target_id == dst && e.kind == kind)
    }

    fn scan(root: &Path) -> ScanOutput {
        Scanner::new(&ScanConfig::default()).scan(root).unwrap()
    }

    #[test]
    fn test_structural_edges() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "shapes.py",
            r#"
class Shape:
    def area(self):
        return 0

class Square(Shape, abc.ABC):
    def area(self):
        def helper():
            return 1
        return helper()

def build():
    return Square()
"#,
        );

        let out = scan(dir.path());
        assert_eq!(out.files_scanned, 1);
        assert!(has_edge(&out, "shapes.py", "shapes.py:Shape", EdgeKind::Contains));
        assert!(has_edge(&out, "shapes.py", "shapes.py:build", EdgeKind::Contains));
        assert!(has_edge(&out, "shapes.py:Shape", "shapes.py:Shape.area", EdgeKind::Method));
        assert!(has_edge(
            &out,
            "shapes.py:Square.area",
            "shapes.py:Square.area.helper",
            EdgeKind::Contains
        ));
        assert!(has_edge(&out, "shapes.py:Square", "shapes.py:Shape", EdgeKind::Inherits));
        assert!(has_edge(&out, "shapes.py:Square", "abc.ABC", EdgeKind::Inherits));
        assert!(out.function_metrics.contains_key("shapes.py:Square.area.helper"));
        assert!(!out.function_metrics.contains_key("shapes.py:Square"));
    }

    #[test]
    fn test_imports_internal_and_external() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "app/__init__.py", "");
        write(dir.path(), "app/models.py", "import os\n");
        write(
            dir.path(),
            "app/views.py",
            "from . import models\nfrom .models import User\nimport requests\n",
        );

        let out = scan(dir.path());
        assert!(has_edge(&out, "app/views.py", "app/models.py", EdgeKind::Imports));
        assert!(has_edge(&out, "app/views.py", "requests", EdgeKind::Imports));
        assert!(has_edge(&out, "app/models.py", "os", EdgeKind::Imports));

        // deduplicated per file
        let views_to_models = out
            .edges
            .iter()
            .filter(|e| e.source_id == "app/views.py" && e.target_id == "app/models.py")
            .count();
        assert_eq!(views_to_models, 1);

        let modules: Vec<_> = out
            .nodes
            .iter()
            .filter(|n| n.kind() == NodeKind::Module)
            .map(|n| n.id())
            .collect();
        assert_eq!(modules, vec!["os", "requests"]);
    }

    #[test]
    fn test_parse_failures_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "good.py", "def ok():\n    pass\n");
        write(dir.path(), "bad.py", "def broken(:\n");
        fs::write(dir.path().join("latin1.py"), [0x63, 0x3d, 0xe9, 0x0a]).unwrap();

        let out = scan(dir.path());
        assert_eq!(out.files_scanned, 1);
        let skipped: Vec<_> = out.skipped.iter().map(|s| s.path.as_str()).collect();
        assert_eq!(skipped, vec!["bad.py", "latin1.py"]);
        assert!(out.skipped.iter().all(|s| !s.reason.is_empty()));
    }

    #[test]
    fn test_ignore_set_and_extensions() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "src/a.py", "");
        write(dir.path(), "src/b.pyi", "");
        write(dir.path(), "__pycache__/a.py", "");
        write(dir.path(), "venv/lib/x.py", "");
        write(dir.path(), "README.md", "# hi");

        let out = scan(dir.path());
        let files: Vec<_> = out
            .nodes
            .iter()
            .filter(|n| n.kind() == NodeKind::File)
            .map(|n| n.id())
            .collect();
        assert_eq!(files, vec!["src/a.py", "src/b.pyi"]);
    }

    #[test]
    fn test_oversized_files_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "big.py", &"x = 1\n".repeat(100));
        let config = ScanConfig {
            max_file_bytes: 10,
            ..Default::default()
        };
        let out = Scanner::new(&config).scan(dir.path()).unwrap();
        assert_eq!(out.files_scanned, 0);
        assert!(out.skipped[0].reason.contains("too large"));
    }

    #[test]
    fn test_root_must_be_directory() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        let err = Scanner::new(&ScanConfig::default()).scan(&missing);
        assert!(matches!(err, Err(CortexError::InvalidInput(_))));
    }
}
