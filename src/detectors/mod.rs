//! Code smell, risk and cycle detection
//!
//! - Smell rules (`god_class`, `long_methods`, `deep_nesting`,
//!   `high_complexity`, `long_parameter`) threshold one entity's metrics
//! - `risk_analyzer` scores an entity from metrics plus coupling
//! - `circular_dependency` finds import cycles over the graph

pub mod base;
pub mod circular_dependency;
pub mod deep_nesting;
pub mod god_class;
pub mod high_complexity;
pub mod long_methods;
pub mod long_parameter;
pub mod risk_analyzer;

pub use base::SmellRule;
pub use circular_dependency::find_import_cycles;
pub use deep_nesting::DeepNestingRule;
pub use god_class::GodClassRule;
pub use high_complexity::HighComplexityRule;
pub use long_methods::LongMethodRule;
pub use long_parameter::ManyParametersRule;
pub use risk_analyzer::{RiskInputs, RiskScorer};

use crate::graph::NodeKind;
use crate::metrics::EntityMetrics;
use crate::models::CodeSmell;

/// The fixed rule table, in reporting order
pub fn default_rules() -> Vec<Box<dyn SmellRule>> {
    vec![
        Box::new(GodClassRule),
        Box::new(LongMethodRule),
        Box::new(DeepNestingRule),
        Box::new(HighComplexityRule),
        Box::new(ManyParametersRule),
    ]
}

/// Runs every rule over entity metrics
pub struct SmellDetector {
    rules: Vec<Box<dyn SmellRule>>,
}

impl Default for SmellDetector {
    fn default() -> Self {
        Self {
            rules: default_rules(),
        }
    }
}

impl SmellDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn detect(&self, node_id: &str, kind: NodeKind, metrics: &EntityMetrics) -> Vec<CodeSmell> {
        self.rules
            .iter()
            .filter_map(|rule| rule.check(node_id, kind, metrics))
            .collect()
    }
}

/// Evaluate the default rule table for one entity
pub fn detect_smells(node_id: &str, kind: NodeKind, metrics: &EntityMetrics) -> Vec<CodeSmell> {
    SmellDetector::default().detect(node_id, kind, metrics)
}
