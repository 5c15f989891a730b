//! Prediction result types returned to the request layer
//!
//! All of these serialise directly to the JSON shape callers consume.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::text::CategorizedSymptoms;

/// Coarse overall risk judged by the learned model
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskTier {
    Low,
    Medium,
    High,
}

impl RiskTier {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    #[must_use]
    pub const fn all() -> [Self; 3] {
        [Self::Low, Self::Medium, Self::High]
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RiskTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(format!("unknown risk tier {other:?}")),
        }
    }
}

/// Independently scored risk category
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskCategory {
    Cardiovascular,
    Diabetes,
    Hypertension,
    Respiratory,
}

impl RiskCategory {
    /// Fixed iteration order for scoring and recommendations
    pub const ALL: [Self; 4] = [
        Self::Cardiovascular,
        Self::Diabetes,
        Self::Hypertension,
        Self::Respiratory,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cardiovascular => "cardiovascular",
            Self::Diabetes => "diabetes",
            Self::Hypertension => "hypertension",
            Self::Respiratory => "respiratory",
        }
    }
}

impl fmt::Display for RiskCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-category scores, each clamped to [0, 1] on its own
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RiskProfile {
    scores: [f64; 4],
}

impl RiskProfile {
    /// Store `score` clamped to [0, 1]
    pub fn set(&mut self, category: RiskCategory, score: f64) {
        self.scores[category as usize] = score.clamp(0.0, 1.0);
    }

    #[must_use]
    pub const fn get(&self, category: RiskCategory) -> f64 {
        self.scores[category as usize]
    }

    /// `(category, score)` in fixed category order
    pub fn iter(&self) -> impl Iterator<Item = (RiskCategory, f64)> + '_ {
        RiskCategory::ALL.iter().map(|&c| (c, self.get(c)))
    }
}

impl Serialize for RiskProfile {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(RiskCategory::ALL.len()))?;
        for (category, score) in self.iter() {
            map.serialize_entry(category.as_str(), &score)?;
        }
        map.end()
    }
}

/// Output of the symptom classifier
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResult {
    pub predicted_condition: String,
    pub confidence: f64,
    pub symptoms_extracted: Vec<String>,
    pub symptoms_categorized: CategorizedSymptoms,
    /// Probability per training label, in label order
    pub all_probabilities: BTreeMap<String, f64>,
}

/// Output of the risk predictor
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskPredictionResult {
    pub overall_risk: RiskTier,
    pub confidence: f64,
    pub risk_scores: RiskProfile,
    pub recommendations: Vec<String>,
    pub all_probabilities: BTreeMap<RiskTier, f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_risk_profile_clamps_and_serialises_in_order() {
        let mut profile = RiskProfile::default();
        profile.set(RiskCategory::Respiratory, 0.4);
        profile.set(RiskCategory::Cardiovascular, 1.2);
        profile.set(RiskCategory::Diabetes, -0.1);

        assert_eq!(profile.get(RiskCategory::Cardiovascular), 1.0);
        assert_eq!(profile.get(RiskCategory::Diabetes), 0.0);
        assert_eq!(
            serde_json::to_string(&profile).unwrap(),
            r#"{"cardiovascular":1.0,"diabetes":0.0,"hypertension":0.0,"respiratory":0.4}"#
        );
    }

    #[test]
    fn test_risk_tier_text_forms() {
        assert_eq!("High".parse::<RiskTier>(), Ok(RiskTier::High));
        assert!("extreme".parse::<RiskTier>().is_err());
        assert_eq!(serde_json::to_string(&RiskTier::Medium).unwrap(), "\"medium\"");
    }
}
