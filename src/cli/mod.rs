//! CLI command definitions and handlers

mod analyze;
mod audit;
mod graph;
mod serve;
mod watch;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use cortex::config::load_project_config;
use cortex::Cortex;
use std::path::{Path, PathBuf};

/// Parse and validate impact depth (1-10)
fn parse_depth(s: &str) -> Result<usize, String> {
    let n: usize = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;
    if n == 0 {
        Err("depth must be at least 1".to_string())
    } else if n > cortex::cortex::MAX_IMPACT_DEPTH {
        Err(format!(
            "depth cannot exceed {}",
            cortex::cortex::MAX_IMPACT_DEPTH
        ))
    } else {
        Ok(n)
    }
}

/// Cortex - code intelligence for Python projects
#[derive(Parser, Debug)]
#[command(name = "cortex")]
#[command(
    version,
    about = "Dependency graph, complexity, smells, risk and import cycles for Python trees",
    after_help = "\
Examples:
  cortex scan                          Scan the current directory
  cortex health --top 5                Health score and the 5 riskiest nodes
  cortex impact pkg/core.py --depth 3  What depends on core.py?
  cortex smells --severity critical    Only critical smells
  cortex graph --json > graph.json     Export nodes and links
  cortex serve                         Tool server on stdio"
)]
pub struct Cli {
    /// Project root (default: current directory)
    #[arg(long, short = 'p', global = true, default_value = ".")]
    pub path: PathBuf,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "info", value_parser = ["error", "warn", "info", "debug", "trace"])]
    pub log_level: String,

    /// Machine-readable JSON on stdout
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan the project and print a summary
    Scan,

    /// Export the graph with metrics and risk overlaid
    Graph {
        /// Write to a file instead of stdout
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Health score, smell counts, riskiest nodes and cycles
    Health {
        /// Number of high-risk nodes to list (default: [health] top_n)
        #[arg(long)]
        top: Option<usize>,
    },

    /// Nodes that transitively depend on a node
    Impact {
        node_id: String,

        #[arg(long, short = 'd', default_value = "3", value_parser = parse_depth)]
        depth: usize,
    },

    /// Find nodes by name
    Search {
        query: String,

        /// Restrict to one kind: file, class, function, module
        #[arg(long, value_parser = ["file", "class", "function", "module"])]
        kind: Option<String>,

        #[arg(long, short = 'n', default_value = "20")]
        limit: usize,
    },

    /// List code smells
    Smells {
        /// Exact severity: critical, warning, info
        #[arg(long, value_parser = ["critical", "warning", "info"])]
        severity: Option<String>,
    },

    /// Metrics and risk for one class or function
    Metrics { node_id: String },

    /// Import cycles
    Cycles,

    /// Files added, modified or deleted since the last checkpointed scan
    Audit,

    /// Tool server: line-delimited JSON requests on stdin
    Serve,

    /// Live channel: actions on stdin, broadcast envelopes on stdout
    Live,

    /// Rescan whenever the tree changes
    Watch {
        /// Debounce window in milliseconds
        #[arg(long, default_value = "500")]
        debounce_ms: u64,
    },
}

/// Open the project at `path` with its `cortex.toml`
pub(crate) fn open(path: &Path) -> Result<Cortex> {
    let root = path
        .canonicalize()
        .with_context(|| format!("Path does not exist: {}", path.display()))?;
    let config = load_project_config(&root);
    Cortex::open(&root, config).with_context(|| format!("Failed to open {}", root.display()))
}

/// Open and scan
pub(crate) fn open_scanned(path: &Path) -> Result<Cortex> {
    let cortex = open(path)?;
    cortex.scan(".").context("Scan failed")?;
    Ok(cortex)
}

pub(crate) fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn run(cli: Cli) -> Result<()> {
    let path = cli.path.as_path();
    let json = cli.json;

    match cli.command {
        Commands::Scan => analyze::scan(path, json),
        Commands::Health { top } => analyze::health(path, top, json),
        Commands::Smells { severity } => analyze::smells(path, severity.as_deref(), json),
        Commands::Metrics { node_id } => analyze::metrics(path, &node_id, json),
        Commands::Graph { output } => graph::export(path, output.as_deref()),
        Commands::Impact { node_id, depth } => graph::impact(path, &node_id, depth, json),
        Commands::Search { query, kind, limit } => {
            graph::search(path, &query, kind.as_deref(), limit, json)
        }
        Commands::Cycles => graph::cycles(path, json),
        Commands::Audit => audit::run(path, json),
        Commands::Serve => serve::serve(path),
        Commands::Live => serve::live(path),
        Commands::Watch { debounce_ms } => watch::run(path, debounce_ms, json),
    }
}
