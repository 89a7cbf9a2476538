//! Project boundary check for scan roots
//!
//! A requested path is resolved against the project root, canonicalized
//! (following symlinks) and rejected if it lands outside the root or inside a
//! disallowed directory such as `.git`.

use crate::config::ScanConfig;
use crate::error::{CortexError, Result};
use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

#[derive(Debug, Clone)]
pub struct PathGuard {
    root: PathBuf,
    disallowed: HashSet<String>,
}

impl PathGuard {
    /// `root` must already be canonical
    pub fn new(root: PathBuf, config: &ScanConfig) -> Self {
        Self {
            root,
            disallowed: config.disallowed_dirs.iter().cloned().collect(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve `path` and return its canonical form if it is allowed
    pub fn check(&self, path: &Path) -> Result<PathBuf> {
        let joined = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        };

        let resolved = joined.canonicalize().map_err(|e| {
            CortexError::InvalidInput(format!("cannot resolve {}: {}", joined.display(), e))
        })?;

        let relative = resolved
            .strip_prefix(&self.root)
            .map_err(|_| CortexError::permission_denied(&resolved, "outside project root"))?;

        for component in relative.components() {
            if let Component::Normal(name) = component {
                let name = name.to_string_lossy();
                if self.disallowed.contains(name.as_ref()) {
                    return Err(CortexError::permission_denied(
                        &resolved,
                        format!("'{}' is a disallowed directory", name),
                    ));
                }
            }
        }

        Ok(resolved)
    }
}
