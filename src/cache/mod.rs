//! On-disk locations for persisted engine state

pub mod paths;

pub use paths::{get_cache_dir, get_snapshot_path};
