//! Project configuration loaded from `cortex.toml`
//!
//! Example:
//!
//! ```toml
//! [scan]
//! extra_ignore = ["fixtures", "generated"]
//! max_file_bytes = 1048576
//!
//! [health]
//! top_n = 5
//!
//! [events]
//! bridge_capacity = 512
//!
//! [tools]
//! timeout_ms = 10000
//!
//! [state]
//! checkpoint = false
//!
//! [history]
//! max_scans = 20
//! ```
//!
//! A missing file yields the defaults. An unreadable or malformed file logs a
//! warning and also yields the defaults; configuration never aborts startup.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

pub const CONFIG_FILE_NAME: &str = "cortex.toml";

/// Directory names the scanner and the change auditor never descend into
pub const DEFAULT_IGNORE_DIRS: &[&str] = &[
    ".git",
    ".hg",
    ".svn",
    "__pycache__",
    ".mypy_cache",
    ".pytest_cache",
    ".tox",
    ".venv",
    "venv",
    "env",
    "node_modules",
    "build",
    "dist",
    ".eggs",
    "site-packages",
    "assets",
    "static",
    "media",
    ".idea",
    ".vscode",
];

/// Directory names a scan root may never resolve into
pub const DEFAULT_DISALLOWED_DIRS: &[&str] = &[".git", ".hg", ".svn", ".ssh"];

/// Project-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CortexConfig {
    #[serde(default)]
    pub scan: ScanConfig,

    #[serde(default)]
    pub health: HealthConfig,

    #[serde(default)]
    pub events: EventsConfig,

    #[serde(default)]
    pub tools: ToolsConfig,

    #[serde(default)]
    pub state: StateConfig,

    #[serde(default)]
    pub history: HistoryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Replaces the built-in ignore-set when given
    #[serde(default = "default_ignore")]
    pub ignore: Vec<String>,

    /// Added on top of `ignore`
    #[serde(default)]
    pub extra_ignore: Vec<String>,

    /// Path components a scan root may not contain
    #[serde(default = "default_disallowed")]
    pub disallowed_dirs: Vec<String>,

    /// Larger source files are skipped
    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: u64,

    #[serde(default)]
    pub follow_links: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            ignore: default_ignore(),
            extra_ignore: Vec::new(),
            disallowed_dirs: default_disallowed(),
            max_file_bytes: default_max_file_bytes(),
            follow_links: false,
        }
    }
}

impl ScanConfig {
    /// Effective ignore-set (`ignore` plus `extra_ignore`)
    pub fn ignore_set(&self) -> HashSet<String> {
        self.ignore
            .iter()
            .chain(self.extra_ignore.iter())
            .cloned()
            .collect()
    }
}

fn default_ignore() -> Vec<String> {
    DEFAULT_IGNORE_DIRS.iter().map(|s| s.to_string()).collect()
}

fn default_disallowed() -> Vec<String> {
    DEFAULT_DISALLOWED_DIRS.iter().map(|s| s.to_string()).collect()
}

fn default_max_file_bytes() -> u64 {
    2 * 1024 * 1024
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthConfig {
    /// Highest-risk nodes listed in the health report
    #[serde(default = "default_top_n")]
    pub top_n: usize,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            top_n: default_top_n(),
        }
    }
}

fn default_top_n() -> usize {
    10
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventsConfig {
    /// Capacity of the Cortex -> bus hand-off queue
    #[serde(default = "default_bridge_capacity")]
    pub bridge_capacity: usize,

    /// Per-observer outbound queue capacity
    #[serde(default = "default_observer_capacity")]
    pub observer_capacity: usize,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            bridge_capacity: default_bridge_capacity(),
            observer_capacity: default_observer_capacity(),
        }
    }
}

fn default_bridge_capacity() -> usize {
    256
}

fn default_observer_capacity() -> usize {
    64
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl ToolsConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

fn default_timeout_ms() -> u64 {
    30_000
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateConfig {
    /// Persist the latest audit snapshot across restarts
    #[serde(default = "default_true")]
    pub checkpoint: bool,

    /// Overrides the per-repository cache directory
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            checkpoint: true,
            dir: None,
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    #[serde(default = "default_max_scans")]
    pub max_scans: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_scans: default_max_scans(),
        }
    }
}

fn default_max_scans() -> usize {
    50
}

/// Load `cortex.toml` from the project root, falling back to defaults
pub fn load_project_config(repo_path: &Path) -> CortexConfig {
    let toml_path = repo_path.join(CONFIG_FILE_NAME);
    if !toml_path.exists() {
        debug!("No project config found, using defaults");
        return CortexConfig::default();
    }

    match load_toml_config(&toml_path) {
        Ok(config) => {
            debug!("Loaded project config from {}", toml_path.display());
            config
        }
        Err(e) => {
            warn!("Failed to load {}: {}", toml_path.display(), e);
            CortexConfig::default()
        }
    }
}

fn load_toml_config(path: &Path) -> anyhow::Result<CortexConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: CortexConfig = toml::from_str(&content)?;
    Ok(config)
}
