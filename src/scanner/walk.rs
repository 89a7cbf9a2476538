//! Directory walking shared by the scanner and the change auditor

use ignore::WalkBuilder;
use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Collect every regular file under `root`, pruning directories whose name is
/// in `ignore`. No `.gitignore` or hidden-file rules apply; the ignore-set is
/// the only filter.
pub fn collect_files(root: &Path, ignore: &HashSet<String>, follow_links: bool) -> Vec<PathBuf> {
    let ignore = Arc::new(ignore.clone());
    let mut builder = WalkBuilder::new(root);
    builder
        .standard_filters(false)
        .follow_links(follow_links)
        .filter_entry(move |entry| {
            if entry.depth() == 0 {
                return true;
            }
            let is_dir = entry.file_type().is_some_and(|t| t.is_dir());
            !(is_dir && ignore.contains(entry.file_name().to_string_lossy().as_ref()))
        });

    let mut files = Vec::new();
    for entry in builder.build() {
        match entry {
            Ok(entry) if entry.file_type().is_some_and(|t| t.is_file()) => {
                files.push(entry.into_path());
            }
            Ok(_) => {}
            Err(e) => debug!("Walk error under {}: {}", root.display(), e),
        }
    }
    files.sort();
    files
}

/// `/`-separated path of `path` relative to `root`
pub fn relative_id(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = rel
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn ignore_set(names: &[&str]) -> HashSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_ignored_directories_are_pruned() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("pkg")).unwrap();
        fs::create_dir_all(dir.path().join("node_modules/dep")).unwrap();
        fs::create_dir_all(dir.path().join(".hidden")).unwrap();
        fs::write(dir.path().join("pkg/a.py"), "").unwrap();
        fs::write(dir.path().join("node_modules/dep/b.py"), "").unwrap();
        fs::write(dir.path().join(".hidden/c.py"), "").unwrap();

        let files = collect_files(dir.path(), &ignore_set(&["node_modules"]), false);
        let ids: Vec<_> = files
            .iter()
            .filter_map(|p| relative_id(dir.path(), p))
            .collect();
        assert_eq!(ids, vec![".hidden/c.py", "pkg/a.py"]);
    }

    #[test]
    fn test_ignore_matches_directories_only() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("build"), "not a dir").unwrap();
        let files = collect_files(dir.path(), &ignore_set(&["build"]), false);
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn test_relative_id_uses_forward_slashes() {
        let root = Path::new("/repo");
        assert_eq!(
            relative_id(root, Path::new("/repo/a/b/c.py")).as_deref(),
            Some("a/b/c.py")
        );
        assert_eq!(relative_id(root, Path::new("/repo")), None);
        assert_eq!(relative_id(root, Path::new("/other/x.py")), None);
    }
}
