//! High cyclomatic complexity rule

use crate::detectors::base::SmellRule;
use crate::graph::NodeKind;
use crate::metrics::EntityMetrics;
use crate::models::{Severity, SmellKind};

pub const HIGH_COMPLEXITY: u32 = 15;

#[derive(Debug, Clone, Default)]
pub struct HighComplexityRule;

impl SmellRule for HighComplexityRule {
    fn kind(&self) -> SmellKind {
        SmellKind::HighComplexity
    }

    fn severity(&self) -> Severity {
        Severity::Critical
    }

    fn applies_to(&self) -> NodeKind {
        NodeKind::Function
    }

    fn evaluate(&self, metrics: &EntityMetrics) -> Option<String> {
        let cc = metrics.cyclomatic();
        (cc >= HIGH_COMPLEXITY)
            .then(|| format!("Cyclomatic complexity {} (threshold: {})", cc, HIGH_COMPLEXITY))
    }
}
