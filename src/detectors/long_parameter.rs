//! Long parameter list rule
//!
//! Counts every declared parameter, including `self`, `*args` and
//! `**kwargs`.

use crate::detectors::base::SmellRule;
use crate::graph::NodeKind;
use crate::metrics::EntityMetrics;
use crate::models::{Severity, SmellKind};

pub const MANY_PARAMETERS: u32 = 7;

#[derive(Debug, Clone, Default)]
pub struct ManyParametersRule;

impl SmellRule for ManyParametersRule {
    fn kind(&self) -> SmellKind {
        SmellKind::ManyParameters
    }

    fn severity(&self) -> Severity {
        Severity::Info
    }

    fn applies_to(&self) -> NodeKind {
        NodeKind::Function
    }

    fn evaluate(&self, metrics: &EntityMetrics) -> Option<String> {
        let EntityMetrics::Function(m) = metrics else {
            return None;
        };
        (m.parameter_count >= MANY_PARAMETERS).then(|| {
            format!(
                "Function takes {} parameters (threshold: {}); consider a parameter object",
                m.parameter_count, MANY_PARAMETERS
            )
        })
    }
}
