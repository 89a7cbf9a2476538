//! Tool parameter types

use crate::graph::NodeKind;
use crate::models::Severity;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ── Scanning ──

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ScanParams {
    /// Directory to scan, relative to the project root (default: the root)
    pub path: Option<PathBuf>,
}

// ── Graph queries ──

#[derive(Debug, Serialize, Deserialize)]
pub struct NodeParams {
    pub node_id: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct HealthParams {
    /// Highest-risk nodes to list (default: `[health] top_n`)
    pub top_n: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ImpactParams {
    pub node_id: String,
    /// 1-10 (default: 3)
    pub depth: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SearchParams {
    pub query: String,
    pub kind: Option<NodeKind>,
    /// Maximum hits (default: 20)
    pub limit: Option<usize>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct SmellsParams {
    /// Exact severity filter
    pub severity: Option<Severity>,
}

// ── Telemetry & history ──

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct TelemetryReadParams {
    pub node_id: Option<String>,
    /// Maximum events (default: 50)
    pub limit: Option<usize>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct HistoryParams {
    /// Maximum scans (default: 10)
    pub limit: Option<usize>,
}
