//! God class rule - classes with too many methods
//!
//! A class that accumulates this many methods almost always carries more than
//! one responsibility.

use crate::detectors::base::SmellRule;
use crate::graph::NodeKind;
use crate::metrics::EntityMetrics;
use crate::models::{Severity, SmellKind};

/// Method count at which a class is a god class
pub const GOD_CLASS_METHODS: u32 = 20;

#[derive(Debug, Clone, Default)]
pub struct GodClassRule;

impl SmellRule for GodClassRule {
    fn kind(&self) -> SmellKind {
        SmellKind::GodClass
    }

    fn severity(&self) -> Severity {
        Severity::Critical
    }

    fn applies_to(&self) -> NodeKind {
        NodeKind::Class
    }

    fn evaluate(&self, metrics: &EntityMetrics) -> Option<String> {
        let EntityMetrics::Class(m) = metrics else {
            return None;
        };
        (m.method_count >= GOD_CLASS_METHODS).then(|| {
            format!(
                "Class has {} methods (threshold: {})",
                m.method_count, GOD_CLASS_METHODS
            )
        })
    }
}
