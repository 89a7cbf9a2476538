//! Immutable per-scan analysis state
//!
//! A `CortexState` is built off to the side from scanner output and then
//! published whole; readers hold an `Arc` to whichever state was current when
//! they started.

use crate::detectors::{find_import_cycles, RiskScorer, SmellDetector};
use crate::error::Result;
use crate::graph::GraphStore;
use crate::metrics::{self, EntityMetrics};
use crate::models::{CodeSmell, RiskAssessment, ScanStats, SkippedFile};
use crate::scanner::ScanOutput;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

#[derive(Debug, Default)]
pub struct CortexState {
    pub graph: GraphStore,
    pub metrics: HashMap<String, EntityMetrics>,
    /// Ordered by node id, then rule order
    pub smells: Vec<CodeSmell>,
    pub risk: HashMap<String, RiskAssessment>,
    pub cycles: Vec<Vec<String>>,
    pub skipped: Vec<SkippedFile>,
    pub files_scanned: usize,
    /// Set once the state has been published by a scan
    pub stats: Option<ScanStats>,
}

impl CortexState {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Graph -> metrics -> smells + risk -> cycles
    pub fn build(output: ScanOutput) -> Result<Self> {
        let ScanOutput {
            nodes,
            edges,
            function_metrics,
            skipped,
            files_scanned,
        } = output;

        let graph = GraphStore::from_facts(nodes, edges)?;
        let metrics = metrics::analyze(&graph, &function_metrics);

        let ordered: BTreeMap<&String, &EntityMetrics> = metrics.iter().collect();
        let detector = SmellDetector::new();
        let scorer = RiskScorer;

        let mut smells = Vec::new();
        let mut risk = HashMap::with_capacity(metrics.len());
        for (id, m) in ordered {
            smells.extend(detector.detect(id, m.node_kind(), m));
            let assessment = scorer.assess(id, m, graph.fan_in(id), graph.fan_out(id));
            risk.insert(id.clone(), assessment);
        }

        let cycles = find_import_cycles(&graph);
        debug!(
            "Analysis: {} entities, {} smells, {} cycles",
            metrics.len(),
            smells.len(),
            cycles.len()
        );

        Ok(Self {
            graph,
            metrics,
            smells,
            risk,
            cycles,
            skipped,
            files_scanned,
            stats: None,
        })
    }

    pub fn has_graph(&self) -> bool {
        self.stats.is_some()
    }

    pub fn risk_score(&self, node_id: &str) -> Option<f64> {
        self.risk.get(node_id).map(|r| r.score)
    }
}
