//! Base smell rule trait
//!
//! Every smell in the threshold table is one `SmellRule`. Rules are stateless:
//! the same metrics always produce the same findings.

use crate::graph::NodeKind;
use crate::metrics::EntityMetrics;
use crate::models::{CodeSmell, Severity, SmellKind};

/// A threshold rule over one entity's metrics
pub trait SmellRule: Send + Sync {
    fn kind(&self) -> SmellKind;

    fn severity(&self) -> Severity;

    /// Entity kind the rule is evaluated for
    fn applies_to(&self) -> NodeKind;

    /// Human-readable description when the rule fires, `None` otherwise
    fn evaluate(&self, metrics: &EntityMetrics) -> Option<String>;

    /// Check one entity and build the finding
    fn check(&self, node_id: &str, kind: NodeKind, metrics: &EntityMetrics) -> Option<CodeSmell> {
        if kind != self.applies_to() || metrics.node_kind() != kind {
            return None;
        }
        let description = self.evaluate(metrics)?;
        Some(CodeSmell {
            node_id: node_id.to_string(),
            smell_kind: self.kind(),
            severity: self.severity(),
            description,
        })
    }
}
