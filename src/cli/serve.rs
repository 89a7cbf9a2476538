//! `serve` and `live` command handlers

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;

/// Run the tool server
pub fn serve(repo_path: &Path) -> Result<()> {
    let cortex = Arc::new(super::open(repo_path)?);
    cortex::tools::run_server(cortex)?;
    Ok(())
}

/// Run the live channel on a tokio runtime
pub fn live(repo_path: &Path) -> Result<()> {
    let cortex = Arc::new(super::open(repo_path)?);
    let rt = tokio::runtime::Runtime::new().context("Failed to create tokio runtime")?;
    rt.block_on(cortex::events::live::run_stdio(cortex))?;
    Ok(())
}
