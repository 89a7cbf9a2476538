//! `cortex watch` - rescan on file changes
//!
//! Debounced filesystem events trigger `Cortex::refresh`, so a burst of
//! saves that leaves the tree byte-identical does not cost a rescan.

use anyhow::{Context, Result};
use console::style;
use cortex::parsers::is_python_file;
use cortex::ScanOutcome;
use notify::RecursiveMode;
use notify_debouncer_full::{new_debouncer, DebounceEventResult};
use std::collections::HashSet;
use std::path::{Component, Path};
use std::sync::mpsc;
use std::time::Duration;
use tracing::warn;

pub fn run(path: &Path, debounce_ms: u64, json: bool) -> Result<()> {
    let cortex = super::open(path)?;
    let repo_path = cortex.root().to_path_buf();
    let ignore = cortex.config().scan.ignore_set();

    let stats = cortex.scan(".").context("Initial scan failed")?;
    if json {
        println!("{}", serde_json::to_string(&stats)?);
    } else {
        println!(
            "\n{} {} for changes...",
            style("Watching").bold(),
            style(repo_path.display()).cyan()
        );
        println!("  {} Press Ctrl+C to stop", style("→").dim());
        super::analyze::print_scan_summary(&stats);
    }

    let (tx, rx) = mpsc::channel();
    let mut debouncer = new_debouncer(
        Duration::from_millis(debounce_ms),
        None,
        move |result: DebounceEventResult| {
            if let Ok(events) = result {
                let _ = tx.send(events);
            }
        },
    )?;
    debouncer.watch(&repo_path, RecursiveMode::Recursive)?;

    while let Ok(events) = rx.recv() {
        let relevant = events
            .iter()
            .flat_map(|event| event.paths.iter())
            .any(|p| is_python_file(p) && !is_ignored_path(p, &repo_path, &ignore));
        if !relevant {
            continue;
        }

        match cortex.refresh() {
            Ok(ScanOutcome::Unchanged { .. }) => {}
            Ok(ScanOutcome::Scanned(stats)) => {
                if json {
                    println!("{}", serde_json::to_string(&stats)?);
                } else {
                    super::analyze::print_scan_summary(&stats);
                }
            }
            Err(e) => warn!("Rescan failed: {}", e),
        }
    }
    Ok(())
}

/// True when any component below `repo_path` is in the ignore-set
fn is_ignored_path(path: &Path, repo_path: &Path, ignore: &HashSet<String>) -> bool {
    let rel = path.strip_prefix(repo_path).unwrap_or(path);
    rel.components().any(|c| match c {
        Component::Normal(name) => name
            .to_str()
            .is_some_and(|n| ignore.contains(n)),
        _ => false,
    })
}
