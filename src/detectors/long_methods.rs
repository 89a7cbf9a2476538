//! Long method rule

use crate::detectors::base::SmellRule;
use crate::graph::NodeKind;
use crate::metrics::EntityMetrics;
use crate::models::{Severity, SmellKind};

pub const LONG_METHOD_LINES: u32 = 50;

#[derive(Debug, Clone, Default)]
pub struct LongMethodRule;

impl SmellRule for LongMethodRule {
    fn kind(&self) -> SmellKind {
        SmellKind::LongMethod
    }

    fn severity(&self) -> Severity {
        Severity::Warning
    }

    fn applies_to(&self) -> NodeKind {
        NodeKind::Function
    }

    fn evaluate(&self, metrics: &EntityMetrics) -> Option<String> {
        let loc = metrics.lines_of_code();
        (loc >= LONG_METHOD_LINES)
            .then(|| format!("Function is {} lines long (threshold: {})", loc, LONG_METHOD_LINES))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::FunctionMetrics;

    #[test]
    fn test_long_method() {
        let at = |loc| {
            EntityMetrics::Function(FunctionMetrics {
                cyclomatic_complexity: 1,
                lines_of_code: loc,
                ..Default::default()
            })
        };
        assert!(LongMethodRule.check("f", NodeKind::Function, &at(49)).is_none());
        let smell = LongMethodRule.check("f", NodeKind::Function, &at(50)).unwrap();
        assert_eq!(smell.smell_kind, SmellKind::LongMethod);
        assert_eq!(smell.severity, Severity::Warning);
    }
}
