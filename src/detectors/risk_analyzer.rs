//! Risk scorer
//!
//! Combines an entity's metrics with its graph coupling into a bounded
//! 0-100 score. The score is a sum of seven capped terms:
//!
//! | term | weight | cap |
//! |---|---|---|
//! | cyclomatic complexity | ×3 | 30 |
//! | cognitive complexity | ×2 | 20 |
//! | lines of code | ×0.2 | 10 |
//! | max nesting depth | ×5 | 15 |
//! | fan-in | ×4 | 20 |
//! | fan-out | ×1.5 | 10 |
//! | parameters (methods for classes) | ×1 | 5 |
//!
//! Every term is non-decreasing in its input and capped, so the total is
//! monotone and can never exceed 100.

use crate::metrics::EntityMetrics;
use crate::models::RiskAssessment;

/// Raw values feeding the score
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RiskInputs {
    pub cyclomatic: u32,
    pub cognitive: u32,
    pub lines_of_code: u32,
    pub max_nesting: u32,
    pub fan_in: usize,
    pub fan_out: usize,
    pub arity: u32,
}

impl RiskInputs {
    pub fn new(metrics: &EntityMetrics, fan_in: usize, fan_out: usize) -> Self {
        Self {
            cyclomatic: metrics.cyclomatic(),
            cognitive: metrics.cognitive(),
            lines_of_code: metrics.lines_of_code(),
            max_nesting: metrics.max_nesting(),
            fan_in,
            fan_out,
            arity: metrics.arity(),
        }
    }
}

// Secondary thresholds that add an explanatory factor
const FACTOR_CYCLOMATIC: u32 = 15;
const FACTOR_COGNITIVE: u32 = 20;
const FACTOR_LOC: u32 = 50;
const FACTOR_NESTING: u32 = 4;
const FACTOR_FAN_IN: usize = 5;
const FACTOR_FAN_OUT: usize = 10;

fn capped(value: f64, weight: f64, cap: f64) -> f64 {
    (value * weight).min(cap)
}

/// Score one set of inputs
pub fn score(inputs: &RiskInputs) -> (f64, Vec<String>) {
    let total = capped(inputs.cyclomatic as f64, 3.0, 30.0)
        + capped(inputs.cognitive as f64, 2.0, 20.0)
        + capped(inputs.lines_of_code as f64, 0.2, 10.0)
        + capped(inputs.max_nesting as f64, 5.0, 15.0)
        + capped(inputs.fan_in as f64, 4.0, 20.0)
        + capped(inputs.fan_out as f64, 1.5, 10.0)
        + capped(inputs.arity as f64, 1.0, 5.0);

    let mut factors = Vec::new();
    if inputs.cyclomatic >= FACTOR_CYCLOMATIC {
        factors.push(format!("High cyclomatic complexity ({})", inputs.cyclomatic));
    }
    if inputs.cognitive >= FACTOR_COGNITIVE {
        factors.push(format!("High cognitive complexity ({})", inputs.cognitive));
    }
    if inputs.lines_of_code >= FACTOR_LOC {
        factors.push(format!("Long implementation ({} lines)", inputs.lines_of_code));
    }
    if inputs.max_nesting >= FACTOR_NESTING {
        factors.push(format!("Deep nesting ({} levels)", inputs.max_nesting));
    }
    if inputs.fan_in >= FACTOR_FAN_IN {
        factors.push(format!("High fan-in ({} dependents)", inputs.fan_in));
    }
    if inputs.fan_out >= FACTOR_FAN_OUT {
        factors.push(format!("High fan-out ({} dependencies)", inputs.fan_out));
    }

    (total.clamp(0.0, 100.0), factors)
}

/// Stateless scorer
#[derive(Debug, Clone, Copy, Default)]
pub struct RiskScorer;

impl RiskScorer {
    pub fn assess(
        &self,
        node_id: &str,
        metrics: &EntityMetrics,
        fan_in: usize,
        fan_out: usize,
    ) -> RiskAssessment {
        let (score, contributing_factors) = score(&RiskInputs::new(metrics, fan_in, fan_out));
        RiskAssessment {
            node_id: node_id.to_string(),
            score,
            contributing_factors,
        }
    }
}
