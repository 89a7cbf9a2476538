//! Where per-project engine state lives
//!
//! `<cache_dir>/cortex/<basename>-<sha256(canonical path)[..12]>/`, so two
//! checkouts with the same name never share a checkpoint and nothing is
//! written inside the scanned tree.

use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

const STATE_NAMESPACE: &str = "cortex";
const SNAPSHOT_FILE: &str = "audit_snapshot.json";
const KEY_HEX_LEN: usize = 12;
const MAX_LABEL_CHARS: usize = 20;

fn base_dir() -> PathBuf {
    dirs::cache_dir()
        .or_else(|| dirs::home_dir().map(|h| h.join(".cache")))
        .unwrap_or_else(std::env::temp_dir)
}

/// Per-project state directory (not created)
pub fn get_cache_dir(project_root: &Path) -> PathBuf {
    base_dir().join(STATE_NAMESPACE).join(project_key(project_root))
}

pub fn get_snapshot_path(state_dir: &Path) -> PathBuf {
    state_dir.join(SNAPSHOT_FILE)
}

fn project_key(project_root: &Path) -> String {
    let canonical = project_root
        .canonicalize()
        .unwrap_or_else(|_| project_root.to_path_buf());
    let digest = format!("{:x}", Sha256::digest(canonical.to_string_lossy().as_bytes()));

    let label: String = canonical
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "root".to_string())
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        .take(MAX_LABEL_CHARS)
        .collect();

    format!("{}-{}", label, &digest[..KEY_HEX_LEN])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_is_stable_and_path_specific() {
        let one = project_key(Path::new("/srv/a/service"));
        assert_eq!(one, project_key(Path::new("/srv/a/service")));
        assert_ne!(one, project_key(Path::new("/srv/b/service")));
        assert!(one.starts_with("service-"));
        assert_eq!(one.len(), "service-".len() + KEY_HEX_LEN);
    }

    #[test]
    fn test_filesystem_root_gets_a_label() {
        assert!(project_key(Path::new("/")).starts_with("root-"));
    }

    #[test]
    fn test_snapshot_lives_under_namespace() {
        let dir = get_cache_dir(Path::new("/home/dev/billing-api"));
        assert!(dir.to_string_lossy().contains(STATE_NAMESPACE));
        assert!(dir.file_name().unwrap().to_string_lossy().starts_with("billing-api-"));
        assert!(get_snapshot_path(&dir).ends_with(SNAPSHOT_FILE));
    }
}
