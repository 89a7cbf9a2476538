//! Content-hash snapshots and change detection

use super::merkle::merkle_root;
use crate::config::ScanConfig;
use crate::error::Result;
use crate::scanner::walk;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::{debug, warn};

const READ_BUFFER_BYTES: usize = 64 * 1024;

/// Immutable content summary of a project tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditSnapshot {
    merkle_root: String,
    file_hashes: BTreeMap<String, String>,
}

impl AuditSnapshot {
    pub fn from_hashes(file_hashes: BTreeMap<String, String>) -> Self {
        let merkle_root = merkle_root(file_hashes.iter().map(|(p, h)| (p.as_str(), h.as_str())));
        Self {
            merkle_root,
            file_hashes,
        }
    }

    pub fn merkle_root(&self) -> &str {
        &self.merkle_root
    }

    pub fn file_hashes(&self) -> &BTreeMap<String, String> {
        &self.file_hashes
    }

    pub fn len(&self) -> usize {
        self.file_hashes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.file_hashes.is_empty()
    }

    /// Stored root matches the stored hashes
    pub fn verify(&self) -> bool {
        let expected =
            merkle_root(self.file_hashes.iter().map(|(p, h)| (p.as_str(), h.as_str())));
        expected == self.merkle_root
    }
}

/// Differences between two snapshots, by category
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSet {
    pub added: Vec<String>,
    pub modified: Vec<String>,
    pub deleted: Vec<String>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.modified.is_empty() && self.deleted.is_empty()
    }

    pub fn len(&self) -> usize {
        self.added.len() + self.modified.len() + self.deleted.len()
    }
}

/// Hashes a project tree with the scanner's ignore-set
pub struct ChangeAuditor {
    ignore: HashSet<String>,
    follow_links: bool,
}

impl ChangeAuditor {
    pub fn new(config: &ScanConfig) -> Self {
        Self {
            ignore: config.ignore_set(),
            follow_links: config.follow_links,
        }
    }

    /// Hash every file under `root` in parallel
    ///
    /// Files that vanish or become unreadable mid-walk are left out.
    pub fn snapshot(&self, root: &Path) -> Result<AuditSnapshot> {
        let files = walk::collect_files(root, &self.ignore, self.follow_links);

        let file_hashes: BTreeMap<String, String> = files
            .par_iter()
            .filter_map(|path| {
                let id = walk::relative_id(root, path)?;
                match hash_file(path) {
                    Ok(hash) => Some((id, hash)),
                    Err(e) => {
                        warn!("Cannot hash {}: {}", path.display(), e);
                        None
                    }
                }
            })
            .collect();

        let snapshot = AuditSnapshot::from_hashes(file_hashes);
        debug!(
            "Audit snapshot: {} files, root {}",
            snapshot.len(),
            snapshot.merkle_root()
        );
        Ok(snapshot)
    }
}

/// SHA-256 of a file's content, streamed through a 64 KiB buffer
pub fn hash_file(path: &Path) -> std::io::Result<String> {
    let file = File::open(path)?;
    let mut reader = BufReader::with_capacity(READ_BUFFER_BYTES, file);
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; READ_BUFFER_BYTES];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

/// Paths whose content differs between `previous` and `current`, sorted
///
/// With no previous snapshot every current path counts as changed. Deleted
/// paths are included.
pub fn detect_changes(previous: Option<&AuditSnapshot>, current: &AuditSnapshot) -> Vec<String> {
    let Some(previous) = previous else {
        return current.file_hashes.keys().cloned().collect();
    };
    if previous.merkle_root == current.merkle_root {
        return Vec::new();
    }

    let paths: BTreeSet<&String> = previous
        .file_hashes
        .keys()
        .chain(current.file_hashes.keys())
        .collect();

    paths
        .into_iter()
        .filter(|p| previous.file_hashes.get(*p) != current.file_hashes.get(*p))
        .cloned()
        .collect()
}

/// Same paths as [`detect_changes`], split into added, modified and deleted
pub fn classify_changes(previous: Option<&AuditSnapshot>, current: &AuditSnapshot) -> ChangeSet {
    let mut changes = ChangeSet::default();
    for path in detect_changes(previous, current) {
        let before = previous.and_then(|p| p.file_hashes.get(&path));
        let after = current.file_hashes.get(&path);
        match (before, after) {
            (None, Some(_)) => changes.added.push(path),
            (Some(_), Some(_)) => changes.modified.push(path),
            (Some(_), None) => changes.deleted.push(path),
            (None, None) => {}
        }
    }
    changes
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn snap(pairs: &[(&str, &str)]) -> AuditSnapshot {
        AuditSnapshot::from_hashes(
            pairs
                .iter()
                .map(|(p, h)| (p.to_string(), h.to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_first_run_reports_everything() {
        let current = snap(&[("b.py", "2"), ("a.py", "1")]);
        assert_eq!(detect_changes(None, &current), vec!["a.py", "b.py"]);
        assert_eq!(classify_changes(None, &current).added, vec!["a.py", "b.py"]);
    }

    #[test]
    fn test_identical_snapshot_reports_nothing() {
        let current = snap(&[("a.py", "1"), ("b.py", "2")]);
        let again = current.clone();
        assert!(detect_changes(Some(&again), &current).is_empty());
        assert!(classify_changes(Some(&again), &current).is_empty());
    }

    #[test]
    fn test_deletions_are_reported_and_classified() {
        let previous = snap(&[("a.py", "1"), ("b.py", "2"), ("c.py", "3")]);
        let current = snap(&[("a.py", "1"), ("b.py", "9"), ("d.py", "4")]);

        assert_eq!(
            detect_changes(Some(&previous), &current),
            vec!["b.py", "c.py", "d.py"]
        );

        let changes = classify_changes(Some(&previous), &current);
        assert_eq!(changes.added, vec!["d.py"]);
        assert_eq!(changes.modified, vec!["b.py"]);
        assert_eq!(changes.deleted, vec!["c.py"]);
        assert_eq!(changes.len(), 3);
    }

    #[test]
    fn test_tampered_snapshot_fails_verification() {
        let good = snap(&[("a.py", "1")]);
        assert!(good.verify());

        let mut json = serde_json::to_value(&good).unwrap();
        json["file_hashes"]["a.py"] = serde_json::json!("2");
        let tampered: AuditSnapshot = serde_json::from_value(json).unwrap();
        assert!(!tampered.verify());
    }

    #[test]
    fn test_snapshot_of_tree_respects_ignore_set() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("pkg")).unwrap();
        fs::create_dir_all(dir.path().join(".git")).unwrap();
        fs::write(dir.path().join("pkg/a.py"), "x = 1\n").unwrap();
        fs::write(dir.path().join("notes.txt"), "hello").unwrap();
        fs::write(dir.path().join(".git/HEAD"), "ref").unwrap();

        let auditor = ChangeAuditor::new(&ScanConfig::default());
        let first = auditor.snapshot(dir.path()).unwrap();
        let paths: Vec<_> = first.file_hashes().keys().cloned().collect();
        assert_eq!(paths, vec!["notes.txt", "pkg/a.py"]);

        let second = auditor.snapshot(dir.path()).unwrap();
        assert_eq!(first.merkle_root(), second.merkle_root());

        fs::write(dir.path().join("pkg/a.py"), "x = 2\n").unwrap();
        let third = auditor.snapshot(dir.path()).unwrap();
        assert_eq!(detect_changes(Some(&first), &third), vec!["pkg/a.py"]);
    }

    #[test]
    fn test_hash_file_large_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.bin");
        let content = vec![7u8; READ_BUFFER_BYTES * 3 + 17];
        fs::write(&path, &content).unwrap();
        assert_eq!(hash_file(&path).unwrap(), crate::audit::sha256_hex(&content));
    }
}
