//! Advisory strings derived from risk scores and raw features
//!
//! Categories are visited in fixed order. A category whose score exceeds
//! [`CATEGORY_THRESHOLD`] contributes its headline followed by any
//! conditional advice whose trigger fires. A lifestyle pass runs last, and
//! an empty result is replaced by a single generic message.

use crate::features::FeatureSchema;
use crate::models::{RiskCategory, RiskProfile};
use crate::scoring::rules::Trigger;

/// A category block fires above this score
pub const CATEGORY_THRESHOLD: f64 = 0.5;

/// Emitted when nothing else applies
pub const HEALTHY_HABITS: &str = "Continue maintaining healthy lifestyle habits";

/// Advice appended when `feature` satisfies `trigger`
#[derive(Debug, Clone, Copy)]
pub struct ConditionalAdvice {
    pub feature: &'static str,
    pub trigger: Trigger,
    pub text: &'static str,
}

/// Headline and conditional advice for one risk category
#[derive(Debug, Clone, Copy)]
pub struct CategoryAdvice {
    pub category: RiskCategory,
    pub headline: &'static str,
    pub conditional: &'static [ConditionalAdvice],
}

const fn advice(feature: &'static str, trigger: Trigger, text: &'static str) -> ConditionalAdvice {
    ConditionalAdvice {
        feature,
        trigger,
        text,
    }
}

/// Per-category advice in emission order
pub const CATEGORY_ADVICE: &[CategoryAdvice] = &[
    CategoryAdvice {
        category: RiskCategory::Cardiovascular,
        headline: "Consider cardiovascular screening with your doctor",
        conditional: &[
            advice("smoking", Trigger::Flag, "Quit smoking to reduce cardiovascular risk"),
            advice("bp_systolic", Trigger::Above(140.0), "Monitor blood pressure regularly"),
            advice("cholesterol", Trigger::Above(240.0), "Consider cholesterol management"),
        ],
    },
    CategoryAdvice {
        category: RiskCategory::Diabetes,
        headline: "Consider diabetes screening",
        conditional: &[
            advice("bmi", Trigger::Above(25.0), "Consider weight management"),
            advice("physical_activity", Trigger::Below(3.0), "Increase physical activity"),
        ],
    },
    CategoryAdvice {
        category: RiskCategory::Hypertension,
        headline: "Monitor blood pressure regularly",
        conditional: &[
            advice("salt_intake", Trigger::Above(2300.0), "Reduce sodium intake"),
            advice("stress_level", Trigger::Above(7.0), "Consider stress management techniques"),
        ],
    },
    CategoryAdvice {
        category: RiskCategory::Respiratory,
        headline: "Consider respiratory health assessment",
        conditional: &[
            advice(
                "air_quality",
                Trigger::Above(100.0),
                "Limit outdoor activities during poor air quality",
            ),
            advice("allergies", Trigger::Flag, "Manage allergies with appropriate treatment"),
        ],
    },
];

/// Advice checked regardless of category scores
pub const LIFESTYLE_ADVICE: &[ConditionalAdvice] = &[advice(
    "sleep_hours",
    Trigger::Below(6.0),
    "Aim for 7-8 hours of sleep per night",
)];

/// Deterministic recommendation generator
#[derive(Debug, Clone, Copy, Default)]
pub struct RecommendationGenerator;

impl RecommendationGenerator {
    #[must_use]
    pub fn generate<S: FeatureSchema>(&self, record: &S, scores: &RiskProfile) -> Vec<String> {
        let fires = |item: &ConditionalAdvice| item.trigger.fires(record.feature_value(item.feature));
        let mut recommendations = Vec::new();

        for block in CATEGORY_ADVICE {
            if scores.get(block.category) > CATEGORY_THRESHOLD {
                recommendations.push(block.headline.to_string());
                recommendations.extend(
                    block
                        .conditional
                        .iter()
                        .filter(|item| fires(item))
                        .map(|item| item.text.to_string()),
                );
            }
        }

        recommendations.extend(
            LIFESTYLE_ADVICE
                .iter()
                .filter(|item| fires(item))
                .map(|item| item.text.to_string()),
        );

        if recommendations.is_empty() {
            recommendations.push(HEALTHY_HABITS.to_string());
        }
        recommendations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::HealthRecord;
    use crate::scoring::RuleBasedRiskScorer;

    fn recommend(record: &HealthRecord) -> Vec<String> {
        let scores = RuleBasedRiskScorer.score(record);
        RecommendationGenerator.generate(record, &scores)
    }

    #[test]
    fn test_short_sleep_only() {
        let record = HealthRecord {
            sleep_hours: Some(4.0),
            ..HealthRecord::default()
        };
        assert_eq!(recommend(&record), vec!["Aim for 7-8 hours of sleep per night"]);
    }

    #[test]
    fn test_healthy_record() {
        let record = HealthRecord {
            age: Some(30.0),
            sleep_hours: Some(8.0),
            ..HealthRecord::default()
        };
        assert_eq!(recommend(&record), vec![HEALTHY_HABITS]);
        assert_eq!(recommend(&HealthRecord::default()), vec![HEALTHY_HABITS]);
    }

    #[test]
    fn test_category_blocks_in_fixed_order() {
        let record = HealthRecord {
            age: Some(55.0),
            bp_systolic: Some(150.0),
            bp_diastolic: Some(95.0),
            bmi: Some(28.0),
            glucose: Some(110.0),
            cholesterol: Some(250.0),
            smoking: Some(1.0),
            physical_activity: Some(2.0),
            stress_level: Some(8.0),
            family_history_cvd: Some(1.0),
            family_history_diabetes: Some(0.0),
            ..HealthRecord::default()
        };

        assert_eq!(
            recommend(&record),
            vec![
                "Consider cardiovascular screening with your doctor",
                "Quit smoking to reduce cardiovascular risk",
                "Monitor blood pressure regularly",
                "Consider cholesterol management",
                "Consider diabetes screening",
                "Consider weight management",
                "Increase physical activity",
                "Monitor blood pressure regularly",
                "Consider stress management techniques",
            ]
        );
    }

    #[test]
    fn test_score_at_threshold_does_not_fire() {
        let record = HealthRecord {
            smoking: Some(1.0),
            ..HealthRecord::default()
        };
        // cardiovascular 0.3, respiratory 0.4
        assert_eq!(recommend(&record), vec![HEALTHY_HABITS]);

        let mut scores = RiskProfile::default();
        scores.set(RiskCategory::Respiratory, 0.5);
        assert_eq!(
            RecommendationGenerator.generate(&HealthRecord::default(), &scores),
            vec![HEALTHY_HABITS]
        );
    }
}
