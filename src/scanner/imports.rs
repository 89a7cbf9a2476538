//! Internal vs. external import classification

use crate::parsers::ImportRef;
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum ImportTarget {
    /// File node id under the scan root
    Internal(String),
    /// Import string as written
    External(String),
}

/// Resolves imports against the set of source files found by the walk
pub struct ImportResolver<'a> {
    files: &'a HashSet<String>,
}

impl<'a> ImportResolver<'a> {
    pub fn new(files: &'a HashSet<String>) -> Self {
        Self { files }
    }

    /// Resolve one import statement made from `importer` (a file id)
    pub fn resolve(&self, importer: &str, import: &ImportRef) -> Vec<ImportTarget> {
        let Some(base) = package_base(importer, import.level) else {
            return vec![ImportTarget::External(import.display_name())];
        };

        let parts: Vec<&str> = import.module.split('.').filter(|p| !p.is_empty()).collect();

        if !parts.is_empty() {
            let mut path = base.clone();
            path.extend(parts);
            let target = match self.lookup(&path) {
                Some(file) => ImportTarget::Internal(file),
                None => ImportTarget::External(import.display_name()),
            };
            return vec![target];
        }

        // `from . import a, b`: each name may be a sibling module
        let dots = ".".repeat(import.level as usize);
        let mut targets = Vec::new();
        let mut unresolved = Vec::new();
        for name in &import.names {
            let mut path = base.clone();
            path.push(name.as_str());
            match self.lookup(&path) {
                Some(file) => targets.push(ImportTarget::Internal(file)),
                None => unresolved.push(name.as_str()),
            }
        }

        if !unresolved.is_empty() || import.names.is_empty() {
            match self.lookup(&base) {
                Some(init) => targets.push(ImportTarget::Internal(init)),
                None if import.names.is_empty() => targets.push(ImportTarget::External(dots)),
                None => targets.extend(
                    unresolved
                        .into_iter()
                        .map(|n| ImportTarget::External(format!("{}{}", dots, n))),
                ),
            }
        }

        targets
    }

    /// `a/b/c.py`, `a/b/c.pyi`, then `a/b/c/__init__.py`
    fn lookup(&self, parts: &[&str]) -> Option<String> {
        let joined = parts.join("/");
        let candidates = if joined.is_empty() {
            vec!["__init__.py".to_string(), "__init__.pyi".to_string()]
        } else {
            vec![
                format!("{}.py", joined),
                format!("{}.pyi", joined),
                format!("{}/__init__.py", joined),
                format!("{}/__init__.pyi", joined),
            ]
        };
        candidates.into_iter().find(|c| self.files.contains(c))
    }
}

/// Directory components a relative import of `level` dots starts from.
///
/// `None` when the import climbs above the scan root.
fn package_base(importer: &str, level: u32) -> Option<Vec<&str>> {
    if level == 0 {
        return Some(Vec::new());
    }
    let mut dir: Vec<&str> = importer.split('/').collect();
    // drop the file name
    dir.pop();
    for _ in 1..level {
        dir.pop()?;
    }
    Some(dir)
}
