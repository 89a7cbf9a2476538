//! `scan`, `health`, `smells` and `metrics` commands

use super::{open_scanned, print_json};
use anyhow::{Context, Result};
use console::style;
use cortex::metrics::EntityMetrics;
use cortex::models::{ScanStats, Severity};
use serde_json::json;
use std::path::Path;

const MAX_LISTED: usize = 50;

fn grade_style(grade: &str) -> console::StyledObject<&str> {
    match grade {
        "A" | "B" => style(grade).green().bold(),
        "C" => style(grade).yellow().bold(),
        _ => style(grade).red().bold(),
    }
}

fn severity_style(severity: Severity) -> console::StyledObject<String> {
    let label = severity.to_string();
    match severity {
        Severity::Critical => style(label).red().bold(),
        Severity::Warning => style(label).yellow(),
        Severity::Info => style(label).dim(),
    }
}

pub(super) fn print_scan_summary(stats: &ScanStats) {
    println!(
        "\n{} {} files ({} skipped) in {}ms",
        style("Scanned").bold(),
        style(stats.files_scanned).cyan(),
        stats.skipped.len(),
        stats.elapsed_ms
    );
    println!(
        "  {} nodes, {} edges, {} smells, {} cycles",
        stats.total_nodes, stats.total_edges, stats.total_smells, stats.cycle_count
    );
    println!("  merkle root {}", style(&stats.merkle_root[..12.min(stats.merkle_root.len())]).dim());
    for skipped in stats.skipped.iter().take(10) {
        println!("  {} {} ({})", style("skip").yellow(), skipped.path, skipped.reason);
    }
}

pub fn scan(path: &Path, json: bool) -> Result<()> {
    let cortex = super::open(path)?;
    let stats = cortex.scan(".").context("Scan failed")?;
    if json {
        return print_json(&stats);
    }
    print_scan_summary(&stats);
    Ok(())
}

pub fn health(path: &Path, top: Option<usize>, json: bool) -> Result<()> {
    let cortex = open_scanned(path)?;
    let report = cortex.health_report(top);
    if json {
        return print_json(&report);
    }

    println!(
        "\n{} {:.1} ({})",
        style("Health").bold(),
        report.health.score,
        grade_style(&report.health.grade)
    );
    println!(
        "  smell penalty {:.1}, risk penalty {:.1} (mean risk {:.1})",
        report.health.smell_penalty, report.health.risk_penalty, report.health.mean_risk
    );
    let counts = &report.node_counts;
    println!(
        "  {} files, {} classes, {} functions, {} modules",
        counts.files, counts.classes, counts.functions, counts.modules
    );
    println!(
        "  smells: {} critical, {} warning, {} info",
        style(report.smells.critical).red(),
        style(report.smells.warning).yellow(),
        report.smells.info
    );

    if !report.top_risks.is_empty() {
        println!("\n{}", style("Highest risk").bold());
        for risk in &report.top_risks {
            println!("  {:>5.1}  {}", risk.score, style(&risk.node_id).cyan());
            for factor in &risk.contributing_factors {
                println!("         {} {}", style("·").dim(), factor);
            }
        }
    }

    if !report.cycles.is_empty() {
        println!("\n{} ({})", style("Import cycles").bold(), report.cycles.len());
        for cycle in &report.cycles {
            println!("  {}", cycle.join(" -> "));
        }
    }
    Ok(())
}

pub fn smells(path: &Path, severity: Option<&str>, json: bool) -> Result<()> {
    let severity: Option<Severity> = severity
        .map(str::parse)
        .transpose()
        .map_err(anyhow::Error::msg)?;
    let cortex = open_scanned(path)?;
    let smells = cortex.smells(severity);
    if json {
        return print_json(&smells);
    }

    println!("\n{} ({})\n", style("Code smells").bold(), smells.len());
    for smell in smells.iter().take(MAX_LISTED) {
        println!(
            "  {:<8} {:<16} {}",
            severity_style(smell.severity),
            smell.smell_kind.as_str(),
            style(&smell.node_id).cyan()
        );
        println!("           {}", style(&smell.description).dim());
    }
    if smells.len() > MAX_LISTED {
        println!("  ... and {} more", smells.len() - MAX_LISTED);
    }
    Ok(())
}

pub fn metrics(path: &Path, node_id: &str, json: bool) -> Result<()> {
    let cortex = open_scanned(path)?;
    let metrics = cortex.metrics(node_id)?;
    let risk = cortex.risk(node_id)?;
    if json {
        return print_json(&json!({ "node_id": node_id, "metrics": metrics, "risk": risk }));
    }

    println!("\n{}", style(node_id).cyan().bold());
    println!("  cyclomatic complexity  {}", metrics.cyclomatic());
    println!("  cognitive complexity   {}", metrics.cognitive());
    println!("  lines of code          {}", metrics.lines_of_code());
    println!("  max nesting depth      {}", metrics.max_nesting());
    match metrics {
        EntityMetrics::Function(m) => println!("  parameters             {}", m.parameter_count),
        EntityMetrics::Class(m) => println!("  methods                {}", m.method_count),
    }
    println!("  risk                   {:.1}", risk.score);
    for factor in &risk.contributing_factors {
        println!("    {} {}", style("·").dim(), factor);
    }
    Ok(())
}
