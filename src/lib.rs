//! Cortex - code-intelligence engine for Python source trees
//!
//! Builds a dependency graph of files, classes, functions and modules,
//! computes complexity metrics, flags structural smells, scores risk, finds
//! import cycles and audits content drift with a Merkle snapshot. Runtime
//! telemetry can be attached to graph nodes and streamed to observers.
//!
//! ```no_run
//! use cortex::{config::CortexConfig, Cortex};
//!
//! # fn main() -> cortex::Result<()> {
//! let cortex = Cortex::open(".", CortexConfig::default())?;
//! let stats = cortex.scan(".")?;
//! println!("{} files, {} smells", stats.files_scanned, stats.total_smells);
//! for risk in cortex.health_report(Some(5)).top_risks {
//!     println!("{:5.1} {}", risk.score, risk.node_id);
//! }
//! # Ok(())
//! # }
//! ```

pub mod audit;
pub mod cache;
pub mod config;
pub mod cortex;
pub mod detectors;
pub mod error;
pub mod events;
pub mod graph;
pub mod metrics;
pub mod models;
pub mod parsers;
pub mod scanner;
pub mod scoring;
pub mod tools;

pub use crate::cortex::{Cortex, CortexEvent, ScanOutcome};
pub use error::{CortexError, Result};
