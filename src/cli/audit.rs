//! `cortex audit` - content drift since the last checkpointed scan

use super::print_json;
use anyhow::Result;
use console::style;
use std::path::Path;

pub fn run(path: &Path, json: bool) -> Result<()> {
    let cortex = super::open(path)?;
    let report = cortex.audit()?;
    if json {
        return print_json(&report);
    }

    println!(
        "\n{} {} files, merkle root {}",
        style("Audit").bold(),
        report.files,
        style(&report.merkle_root).dim()
    );
    let Some(previous) = &report.previous_root else {
        println!(
            "  No checkpoint yet. Run {} to record one.",
            style("cortex scan").cyan()
        );
        return Ok(());
    };

    if report.changes.is_empty() {
        println!("  {} Unchanged since {}", style("✓").green(), &previous[..12.min(previous.len())]);
        return Ok(());
    }

    for file in &report.changes.added {
        println!("  {} {}", style("+").green(), file);
    }
    for file in &report.changes.modified {
        println!("  {} {}", style("~").yellow(), file);
    }
    for file in &report.changes.deleted {
        println!("  {} {}", style("-").red(), file);
    }
    println!("\n  {} changed", report.changes.len());
    Ok(())
}
