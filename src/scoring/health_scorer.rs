//! Smell/risk density scorer

use crate::models::{grade_from_score, SmellSummary};
use serde::{Deserialize, Serialize};
use tracing::debug;

const CRITICAL_WEIGHT: f64 = 10.0;
const WARNING_WEIGHT: f64 = 4.0;
const INFO_WEIGHT: f64 = 1.0;
const SMELL_DENSITY_SCALE: f64 = 10.0;
const MAX_SMELL_PENALTY: f64 = 60.0;
const RISK_SCALE: f64 = 0.4;
const MAX_RISK_PENALTY: f64 = 40.0;

/// Score with its components, for transparency
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthBreakdown {
    pub score: f64,
    pub grade: String,
    pub smell_penalty: f64,
    pub risk_penalty: f64,
    pub mean_risk: f64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct HealthScorer;

impl HealthScorer {
    /// Score a snapshot from its smell counts and per-entity risk scores
    pub fn score(&self, entities: usize, smells: &SmellSummary, risks: &[f64]) -> HealthBreakdown {
        let entities = entities.max(1) as f64;

        let weighted = CRITICAL_WEIGHT * smells.critical as f64
            + WARNING_WEIGHT * smells.warning as f64
            + INFO_WEIGHT * smells.info as f64;
        let smell_penalty = (SMELL_DENSITY_SCALE * weighted / entities).min(MAX_SMELL_PENALTY);

        let mean_risk = if risks.is_empty() {
            0.0
        } else {
            risks.iter().sum::<f64>() / risks.len() as f64
        };
        let risk_penalty = (RISK_SCALE * mean_risk).min(MAX_RISK_PENALTY);

        let score = (100.0 - smell_penalty - risk_penalty).clamp(0.0, 100.0);
        debug!(
            "Health score {:.1} (smell penalty {:.1}, risk penalty {:.1})",
            score, smell_penalty, risk_penalty
        );

        HealthBreakdown {
            grade: grade_from_score(score),
            score,
            smell_penalty,
            risk_penalty,
            mean_risk,
        }
    }
}
