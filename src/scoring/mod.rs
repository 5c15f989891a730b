//! Deterministic risk scoring alongside the learned risk model
//!
//! * `rules` - per-category weighted-rule scoring over raw features
//! * `recommendations` - advisory strings from scores and raw features

pub mod recommendations;
pub mod rules;

pub use recommendations::RecommendationGenerator;
pub use rules::{RISK_RULES, RiskRule, RuleBasedRiskScorer, Trigger};
