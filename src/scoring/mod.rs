//! Health scoring
//!
//! Folds smell density and average risk into a single 0-100 score.
//!
//! # Scoring Formula
//!
//! ```text
//! Score = clamp(100 - smell_penalty - risk_penalty, 0, 100)
//!
//! smell_penalty = min(60, 10 × (10·critical + 4·warning + 1·info) / entities)
//! risk_penalty  = min(40, 0.4 × mean_risk)
//! ```
//!
//! `entities` is the number of classes and functions (at least 1). Both
//! penalties are non-decreasing in their inputs, so adding a smell or raising
//! any risk score never raises the health score.
//!
//! # Example
//!
//! 40 entities, 2 critical + 5 warning smells, mean risk 25:
//! - smell penalty = 10 × (20 + 20) / 40 = 10
//! - risk penalty = 0.4 × 25 = 10
//!
//! Score = 80 (grade B)

mod health_scorer;

pub use health_scorer::{HealthBreakdown, HealthScorer};
