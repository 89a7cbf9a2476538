//! Durable audit snapshot checkpoint
//!
//! A checkpoint that cannot be parsed or whose Merkle root does not match its
//! hashes is moved aside as `<file>.corrupt-<unix_ts>` and treated as absent.

use super::snapshot::AuditSnapshot;
use crate::cache::{get_cache_dir, get_snapshot_path};
use crate::config::StateConfig;
use crate::error::Result;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct Checkpoint {
    path: PathBuf,
}

impl Checkpoint {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Checkpoint for a project: `[state] dir` if set, else the cache dir
    pub fn for_project(root: &Path, config: &StateConfig) -> Self {
        let dir = config.dir.clone().unwrap_or_else(|| get_cache_dir(root));
        Self::new(get_snapshot_path(&dir))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the stored snapshot, if one exists and is intact
    pub fn load(&self) -> Option<AuditSnapshot> {
        if !self.path.exists() {
            debug!("No checkpoint at {}", self.path.display());
            return None;
        }

        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) => {
                warn!("Cannot read checkpoint {}: {}", self.path.display(), e);
                return None;
            }
        };

        match serde_json::from_str::<AuditSnapshot>(&content) {
            Ok(snapshot) if snapshot.verify() => {
                debug!(
                    "Loaded checkpoint {} ({} files)",
                    self.path.display(),
                    snapshot.len()
                );
                Some(snapshot)
            }
            Ok(_) => {
                self.quarantine("merkle root does not match file hashes");
                None
            }
            Err(e) => {
                self.quarantine(&e.to_string());
                None
            }
        }
    }

    /// Write atomically (temp file + rename)
    pub fn save(&self, snapshot: &AuditSnapshot) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_vec_pretty(snapshot)?)?;
        std::fs::rename(&tmp, &self.path)?;
        debug!("Saved checkpoint {}", self.path.display());
        Ok(())
    }

    fn quarantine(&self, reason: &str) {
        let backup = self.backup_path(chrono::Utc::now().timestamp());
        match std::fs::rename(&self.path, &backup) {
            Ok(()) => info!(
                "Corrupt checkpoint ({}) moved to {}",
                reason,
                backup.display()
            ),
            Err(e) => warn!(
                "Corrupt checkpoint {} ({}) could not be moved aside: {}",
                self.path.display(),
                reason,
                e
            ),
        }
    }

    fn backup_path(&self, unix_ts: i64) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(format!(".corrupt-{}", unix_ts));
        self.path.with_file_name(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn sample() -> AuditSnapshot {
        let mut hashes = BTreeMap::new();
        hashes.insert("a.py".to_string(), "00ff".to_string());
        AuditSnapshot::from_hashes(hashes)
    }

    #[test]
    fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let checkpoint = Checkpoint::new(dir.path().join("nested/snap.json"));
        assert!(checkpoint.load().is_none());

        checkpoint.save(&sample()).unwrap();
        assert_eq!(checkpoint.load(), Some(sample()));
    }

    #[test]
    fn test_corrupt_file_is_backed_up() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snap.json");
        std::fs::write(&path, "{ not json").unwrap();

        let checkpoint = Checkpoint::new(&path);
        assert!(checkpoint.load().is_none());
        assert!(!path.exists());

        let backups: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .filter(|n| n.starts_with("snap.json.corrupt-"))
            .collect();
        assert_eq!(backups.len(), 1);
    }

    #[test]
    fn test_mismatched_root_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snap.json");
        std::fs::write(
            &path,
            r#"{"merkle_root":"deadbeef","file_hashes":{"a.py":"1"}}"#,
        )
        .unwrap();
        assert!(Checkpoint::new(&path).load().is_none());
        assert!(!path.exists());
    }

    #[test]
    fn test_state_dir_override() {
        let dir = tempfile::tempdir().unwrap();
        let config = StateConfig {
            checkpoint: true,
            dir: Some(dir.path().to_path_buf()),
        };
        let checkpoint = Checkpoint::for_project(Path::new("/srv/project"), &config);
        assert!(checkpoint.path().starts_with(dir.path()));
    }
}
