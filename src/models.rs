//! Core data models for Cortex
//!
//! These models are used throughout the codebase for representing
//! findings, risk assessments, telemetry and scan results. Graph nodes and
//! edges live in [`crate::graph`], metrics in [`crate::metrics`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Severity levels for code smells
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Info,
    Warning,
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Critical => write!(f, "critical"),
        }
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "info" => Ok(Severity::Info),
            "warning" | "warn" => Ok(Severity::Warning),
            "critical" => Ok(Severity::Critical),
            other => Err(format!("unknown severity '{}'", other)),
        }
    }
}

/// Named structural quality issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SmellKind {
    GodClass,
    LongMethod,
    DeepNesting,
    HighComplexity,
    ManyParameters,
}

impl SmellKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SmellKind::GodClass => "god_class",
            SmellKind::LongMethod => "long_method",
            SmellKind::DeepNesting => "deep_nesting",
            SmellKind::HighComplexity => "high_complexity",
            SmellKind::ManyParameters => "many_parameters",
        }
    }
}

impl std::fmt::Display for SmellKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A code smell derived from an entity's metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeSmell {
    pub node_id: String,
    pub smell_kind: SmellKind,
    pub severity: Severity,
    pub description: String,
}

/// Smell counts by severity
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmellSummary {
    pub critical: usize,
    pub warning: usize,
    pub info: usize,
    pub total: usize,
}

impl SmellSummary {
    pub fn from_smells(smells: &[CodeSmell]) -> Self {
        let mut summary = Self::default();
        for s in smells {
            match s.severity {
                Severity::Critical => summary.critical += 1,
                Severity::Warning => summary.warning += 1,
                Severity::Info => summary.info += 1,
            }
            summary.total += 1;
        }
        summary
    }
}

/// Bounded risk estimate for a single entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub node_id: String,
    /// Always within `[0, 100]`
    pub score: f64,
    /// Human-readable reasons, in scoring-term order
    pub contributing_factors: Vec<String>,
}

/// Kind of runtime observation attached to a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TelemetryEventType {
    Execution,
    Error,
    VariableUpdate,
    Warning,
}

impl std::str::FromStr for TelemetryEventType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "execution" => Ok(Self::Execution),
            "error" => Ok(Self::Error),
            "variable_update" => Ok(Self::VariableUpdate),
            "warning" => Ok(Self::Warning),
            other => Err(format!("unknown telemetry event type '{}'", other)),
        }
    }
}

/// A timestamped runtime observation tied to a graph node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryEvent {
    pub id: String,
    pub node_id: String,
    pub event_type: TelemetryEventType,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Inbound telemetry record contract
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryRecord {
    pub node_id: String,
    pub event_type: TelemetryEventType,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
    #[serde(default)]
    pub session_id: Option<String>,
}

/// A file the scanner could not analyze
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedFile {
    pub path: String,
    pub reason: String,
}

/// Statistics for one completed scan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanStats {
    pub scan_id: String,
    pub root: String,
    pub files_scanned: usize,
    pub skipped: Vec<SkippedFile>,
    pub total_nodes: usize,
    pub total_edges: usize,
    pub total_smells: usize,
    pub cycle_count: usize,
    pub merkle_root: String,
    pub started_at: DateTime<Utc>,
    pub elapsed_ms: u64,
}

/// Letter grade for a health score
pub fn grade_from_score(score: f64) -> String {
    match score {
        s if s >= 90.0 => "A".to_string(),
        s if s >= 80.0 => "B".to_string(),
        s if s >= 70.0 => "C".to_string(),
        s if s >= 60.0 => "D".to_string(),
        _ => "F".to_string(),
    }
}
