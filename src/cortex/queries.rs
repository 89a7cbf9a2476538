//! Read-only queries over a published `CortexState`

use super::state::CortexState;
use crate::error::{CortexError, Result};
use crate::graph::{CodeNode, NodeKind, TreeNode};
use crate::metrics::EntityMetrics;
use crate::models::{CodeSmell, RiskAssessment, Severity, SmellSummary};
use crate::scoring::{HealthBreakdown, HealthScorer};
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};

/// Upper bound for impact traversal depth
pub const MAX_IMPACT_DEPTH: usize = 10;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphExport {
    pub nodes: Vec<ExportNode>,
    pub links: Vec<ExportLink>,
    pub stats: ExportStats,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportNode {
    pub id: String,
    pub kind: NodeKind,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<EntityMetrics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_score: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportLink {
    pub source: String,
    pub target: String,
    pub kind: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportStats {
    pub total_nodes: usize,
    pub total_edges: usize,
    pub total_smells: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeCounts {
    pub files: usize,
    pub classes: usize,
    pub functions: usize,
    pub modules: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    pub node_counts: NodeCounts,
    pub smells: SmellSummary,
    pub health: HealthBreakdown,
    pub top_risks: Vec<RiskAssessment>,
    pub cycles: Vec<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dependent {
    pub node_id: String,
    pub kind: NodeKind,
    /// Hops from the queried node
    pub distance: usize,
    pub risk_score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImpactReport {
    pub node_id: String,
    /// Depth actually used, after clamping
    pub max_depth: usize,
    pub dependents: Vec<Dependent>,
    pub total_risk: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchKind {
    Exact,
    Prefix,
    Substring,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: String,
    pub name: String,
    pub kind: NodeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    pub match_kind: MatchKind,
}

impl CortexState {
    fn node(&self, node_id: &str) -> Result<&CodeNode> {
        self.graph
            .get_node(node_id)
            .ok_or_else(|| CortexError::NodeNotFound(node_id.to_string()))
    }

    /// Nodes and links with metrics and risk overlaid
    pub fn graph_export(&self) -> GraphExport {
        let mut nodes: Vec<ExportNode> = self
            .graph
            .nodes()
            .map(|n| ExportNode {
                id: n.id().to_string(),
                kind: n.kind(),
                label: n.name().to_string(),
                file_path: n.file_path().map(str::to_string),
                metrics: self.metrics.get(n.id()).copied(),
                risk_score: self.risk_score(n.id()),
            })
            .collect();
        nodes.sort_by(|a, b| a.id.cmp(&b.id));

        let links: Vec<ExportLink> = self
            .graph
            .edges()
            .into_iter()
            .map(|e| ExportLink {
                source: e.source_id,
                target: e.target_id,
                kind: e.kind.as_str().to_string(),
            })
            .collect();

        GraphExport {
            stats: ExportStats {
                total_nodes: nodes.len(),
                total_edges: links.len(),
                total_smells: self.smells.len(),
            },
            nodes,
            links,
        }
    }

    /// Nested contains/method tree below a file or class
    pub fn hierarchy(&self, node_id: &str) -> Result<TreeNode> {
        self.node(node_id)?;
        self.graph
            .subtree(node_id)
            .ok_or_else(|| CortexError::NodeNotFound(node_id.to_string()))
    }

    pub fn node_counts(&self) -> NodeCounts {
        let stats = self.graph.stats();
        NodeCounts {
            files: stats.total_files,
            classes: stats.total_classes,
            functions: stats.total_functions,
            modules: stats.total_modules,
        }
    }

    pub fn health_report(&self, top_n: usize) -> HealthReport {
        let node_counts = self.node_counts();
        let smells = SmellSummary::from_smells(&self.smells);
        let risks: Vec<f64> = self.risk.values().map(|r| r.score).collect();
        let health = HealthScorer.score(node_counts.classes + node_counts.functions, &smells, &risks);

        HealthReport {
            top_risks: self.top_risks(top_n),
            cycles: self.cycles.clone(),
            node_counts,
            smells,
            health,
        }
    }

    /// Highest risk first, ties broken by node id
    pub fn top_risks(&self, n: usize) -> Vec<RiskAssessment> {
        let mut all: Vec<&RiskAssessment> = self.risk.values().collect();
        all.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.node_id.cmp(&b.node_id))
        });
        all.into_iter().take(n).cloned().collect()
    }

    /// Breadth-first walk over predecessors up to `max_depth` hops
    pub fn impact(&self, node_id: &str, max_depth: usize) -> Result<ImpactReport> {
        self.node(node_id)?;
        let max_depth = max_depth.min(MAX_IMPACT_DEPTH);

        let mut seen: HashSet<&str> = HashSet::from([node_id]);
        let mut queue: VecDeque<(&str, usize)> = VecDeque::from([(node_id, 0)]);
        let mut dependents = Vec::new();

        while let Some((current, distance)) = queue.pop_front() {
            if distance >= max_depth {
                continue;
            }
            let mut preds = self.graph.predecessors(current);
            preds.sort_by(|a, b| a.id().cmp(b.id()));
            for pred in preds {
                if !seen.insert(pred.id()) {
                    continue;
                }
                dependents.push(Dependent {
                    node_id: pred.id().to_string(),
                    kind: pred.kind(),
                    distance: distance + 1,
                    risk_score: self.risk_score(pred.id()).unwrap_or(0.0),
                });
                queue.push_back((pred.id(), distance + 1));
            }
        }

        let total_risk = dependents.iter().map(|d| d.risk_score).sum();
        Ok(ImpactReport {
            node_id: node_id.to_string(),
            max_depth,
            dependents,
            total_risk,
        })
    }

    /// Case-insensitive name match: exact, then prefix, then substring
    pub fn search(&self, query: &str, kind: Option<NodeKind>, limit: usize) -> Result<Vec<SearchHit>> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Err(CortexError::InvalidInput("search query is empty".to_string()));
        }

        let mut hits: Vec<SearchHit> = self
            .graph
            .nodes()
            .filter(|n| kind.map_or(true, |k| n.kind() == k))
            .filter_map(|n| {
                let name = n.name().to_lowercase();
                let match_kind = if name == needle {
                    MatchKind::Exact
                } else if name.starts_with(&needle) {
                    MatchKind::Prefix
                } else if name.contains(&needle) {
                    MatchKind::Substring
                } else {
                    return None;
                };
                Some(SearchHit {
                    id: n.id().to_string(),
                    name: n.name().to_string(),
                    kind: n.kind(),
                    file_path: n.file_path().map(str::to_string),
                    match_kind,
                })
            })
            .collect();

        hits.sort_by(|a, b| {
            a.match_kind
                .cmp(&b.match_kind)
                .then_with(|| a.name.len().cmp(&b.name.len()))
                .then_with(|| a.id.cmp(&b.id))
        });
        hits.truncate(limit);
        Ok(hits)
    }

    pub fn metrics_for(&self, node_id: &str) -> Result<EntityMetrics> {
        let node = self.node(node_id)?;
        self.metrics.get(node_id).copied().ok_or_else(|| {
            CortexError::InvalidInput(format!(
                "{} is a {} node; metrics exist for classes and functions",
                node_id,
                node.kind()
            ))
        })
    }

    pub fn risk_for(&self, node_id: &str) -> Result<RiskAssessment> {
        let node = self.node(node_id)?;
        self.risk.get(node_id).cloned().ok_or_else(|| {
            CortexError::InvalidInput(format!(
                "{} is a {} node; risk is scored for classes and functions",
                node_id,
                node.kind()
            ))
        })
    }

    pub fn smells_with(&self, severity: Option<Severity>) -> Vec<CodeSmell> {
        self.smells
            .iter()
            .filter(|s| severity.map_or(true, |sev| s.severity == sev))
            .cloned()
            .collect()
    }
}
