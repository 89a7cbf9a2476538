//! Graph commands - export, impact, search and cycles

use super::{open_scanned, print_json};
use anyhow::{Context, Result};
use console::style;
use cortex::graph::NodeKind;
use std::path::Path;

pub fn export(path: &Path, output: Option<&Path>) -> Result<()> {
    let cortex = open_scanned(path)?;
    let export = cortex.graph_export();
    let body = serde_json::to_string_pretty(&export)?;

    match output {
        Some(file) => {
            std::fs::write(file, body)
                .with_context(|| format!("Failed to write {}", file.display()))?;
            eprintln!(
                "{} {} nodes, {} links -> {}",
                style("Exported").green(),
                export.stats.total_nodes,
                export.stats.total_edges,
                file.display()
            );
        }
        None => println!("{}", body),
    }
    Ok(())
}

pub fn impact(path: &Path, node_id: &str, depth: usize, json: bool) -> Result<()> {
    let cortex = open_scanned(path)?;
    let report = cortex.impact(node_id, depth)?;
    if json {
        return print_json(&report);
    }

    println!(
        "\n{} {} (depth {}): {} dependents, total risk {:.1}\n",
        style("Impact of").bold(),
        style(&report.node_id).cyan(),
        report.max_depth,
        report.dependents.len(),
        report.total_risk
    );
    for dep in &report.dependents {
        println!(
            "  {:>2}  {:<8} {:>5.1}  {}",
            dep.distance,
            dep.kind.as_str(),
            dep.risk_score,
            dep.node_id
        );
    }
    Ok(())
}

pub fn search(path: &Path, query: &str, kind: Option<&str>, limit: usize, json: bool) -> Result<()> {
    let kind: Option<NodeKind> = kind
        .map(str::parse)
        .transpose()
        .map_err(anyhow::Error::msg)?;
    let cortex = open_scanned(path)?;
    let hits = cortex.search(query, kind, limit)?;
    if json {
        return print_json(&hits);
    }

    println!("\n{} ({})\n", style("Matches").bold(), hits.len());
    for hit in &hits {
        println!(
            "  {:<8} {}  {}",
            hit.kind.as_str(),
            style(&hit.name).cyan(),
            style(&hit.id).dim()
        );
    }
    Ok(())
}

pub fn cycles(path: &Path, json: bool) -> Result<()> {
    let cortex = open_scanned(path)?;
    let cycles = cortex.cycles();
    if json {
        return print_json(&cycles);
    }

    if cycles.is_empty() {
        println!("\n{} No import cycles", style("✓").green());
        return Ok(());
    }
    println!("\n{} ({})\n", style("Import cycles").bold(), cycles.len());
    for cycle in &cycles {
        let mut chain = cycle.clone();
        if let Some(first) = cycle.first() {
            chain.push(first.clone());
        }
        println!("  {}", chain.join(" -> "));
    }
    Ok(())
}
