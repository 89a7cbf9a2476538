//! Deep nesting rule - control flow nested four or more blocks deep

use crate::detectors::base::SmellRule;
use crate::graph::NodeKind;
use crate::metrics::EntityMetrics;
use crate::models::{Severity, SmellKind};

pub const DEEP_NESTING_DEPTH: u32 = 4;

#[derive(Debug, Clone, Default)]
pub struct DeepNestingRule;

impl SmellRule for DeepNestingRule {
    fn kind(&self) -> SmellKind {
        SmellKind::DeepNesting
    }

    fn severity(&self) -> Severity {
        Severity::Warning
    }

    fn applies_to(&self) -> NodeKind {
        NodeKind::Function
    }

    fn evaluate(&self, metrics: &EntityMetrics) -> Option<String> {
        let depth = metrics.max_nesting();
        (depth >= DEEP_NESTING_DEPTH).then(|| {
            format!(
                "Nesting depth {} (threshold: {}); consider early returns or extracting helpers",
                depth, DEEP_NESTING_DEPTH
            )
        })
    }
}
