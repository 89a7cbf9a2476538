//! Configuration module for Cortex
//!
//! This module handles project-level configuration (`cortex.toml`):
//! - Scan ignore-set and path guard
//! - Health report defaults
//! - Event queue capacities
//! - Tool-call timeouts
//! - Checkpoint and history retention

mod project_config;

pub use project_config::{
    load_project_config, CortexConfig, EventsConfig, HealthConfig, HistoryConfig, ScanConfig,
    StateConfig, ToolsConfig, CONFIG_FILE_NAME, DEFAULT_DISALLOWED_DIRS, DEFAULT_IGNORE_DIRS,
};
