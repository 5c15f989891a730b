//! Rule-based per-category risk scoring
//!
//! Each category's score starts at 0 and accumulates a fixed increment for
//! every rule whose trigger fires, in table order, then is clamped to [0, 1].
//! Missing values count as 0, so absence never raises a score.

use crate::error::Result;
use crate::features::{FeatureSchema, HealthRecord, RawRecord};
use crate::models::{RiskCategory, RiskProfile};

use RiskCategory::{Cardiovascular, Diabetes, Hypertension, Respiratory};
use Trigger::{Above, Flag};

/// Condition on a single feature value
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Trigger {
    /// Value strictly above the threshold, missing read as 0
    Above(f64),
    /// Present value strictly below the threshold
    Below(f64),
    /// Value set to anything other than 0, missing read as 0
    Flag,
}

impl Trigger {
    #[must_use]
    pub fn fires(self, value: Option<f64>) -> bool {
        match self {
            Self::Above(threshold) => value.unwrap_or(0.0) > threshold,
            Self::Below(threshold) => value.is_some_and(|v| v < threshold),
            Self::Flag => value.unwrap_or(0.0) != 0.0,
        }
    }
}

/// One row of the scoring table
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskRule {
    pub category: RiskCategory,
    pub feature: &'static str,
    pub trigger: Trigger,
    pub increment: f64,
}

const fn rule(category: RiskCategory, feature: &'static str, trigger: Trigger, increment: f64) -> RiskRule {
    RiskRule {
        category,
        feature,
        trigger,
        increment,
    }
}

/// The canonical scoring table
pub const RISK_RULES: &[RiskRule] = &[
    rule(Cardiovascular, "age", Above(45.0), 0.2),
    rule(Cardiovascular, "bp_systolic", Above(140.0), 0.3),
    rule(Cardiovascular, "cholesterol", Above(240.0), 0.2),
    rule(Cardiovascular, "bmi", Above(30.0), 0.1),
    rule(Cardiovascular, "smoking", Flag, 0.3),
    rule(Cardiovascular, "family_history_cvd", Flag, 0.2),
    rule(Diabetes, "age", Above(45.0), 0.2),
    rule(Diabetes, "bmi", Above(25.0), 0.2),
    rule(Diabetes, "glucose", Above(100.0), 0.3),
    rule(Diabetes, "family_history_diabetes", Flag, 0.3),
    rule(Hypertension, "bp_systolic", Above(130.0), 0.4),
    rule(Hypertension, "bp_diastolic", Above(85.0), 0.3),
    rule(Hypertension, "salt_intake", Above(2300.0), 0.2),
    rule(Hypertension, "stress_level", Above(7.0), 0.1),
    rule(Respiratory, "smoking", Flag, 0.4),
    rule(Respiratory, "air_quality", Above(100.0), 0.3),
    rule(Respiratory, "allergies", Flag, 0.2),
    rule(Respiratory, "respiratory_infections", Above(2.0), 0.1),
];

/// Deterministic scorer over [`RISK_RULES`]
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleBasedRiskScorer;

impl RuleBasedRiskScorer {
    /// Score any schema record
    #[must_use]
    pub fn score<S: FeatureSchema>(&self, record: &S) -> RiskProfile {
        let mut totals = [0.0_f64; 4];
        for rule in RISK_RULES {
            if rule.trigger.fires(record.feature_value(rule.feature)) {
                totals[rule.category as usize] += rule.increment;
            }
        }

        let mut profile = RiskProfile::default();
        for category in RiskCategory::ALL {
            profile.set(category, totals[category as usize]);
        }
        profile
    }

    /// Coerce a raw record into a [`HealthRecord`] and score it
    pub fn score_raw(&self, raw: &RawRecord) -> Result<RiskProfile> {
        Ok(self.score(&HealthRecord::from_raw(raw)?))
    }
}
