//! The canonical health record schema
//!
//! Demographics, vitals, labs, lifestyle, environment and family history,
//! plus the one-hot expanded gender. Field order is the feature order.

use macros::FeatureSchema;
use serde::{Deserialize, Serialize};

/// One person's structured measurements; every field is optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, FeatureSchema)]
#[schema(name = "health_record", version = 1)]
pub struct HealthRecord {
    pub age: Option<f64>,
    pub bp_systolic: Option<f64>,
    pub bp_diastolic: Option<f64>,
    pub heart_rate: Option<f64>,
    /// Body temperature in °F
    pub temperature: Option<f64>,
    /// Height in cm
    pub height: Option<f64>,
    /// Weight in kg
    pub weight: Option<f64>,
    pub bmi: Option<f64>,
    /// Fasting glucose, mg/dL
    pub glucose: Option<f64>,
    /// Total cholesterol, mg/dL
    pub cholesterol: Option<f64>,
    #[field(kind = "flag")]
    pub smoking: Option<f64>,
    /// Drinks per week
    pub alcohol_consumption: Option<f64>,
    /// Hours per week
    pub physical_activity: Option<f64>,
    pub sleep_hours: Option<f64>,
    /// 1-10 scale
    pub stress_level: Option<f64>,
    /// Air quality index
    pub air_quality: Option<f64>,
    pub pollen_count: Option<f64>,
    #[field(kind = "flag")]
    pub family_history_cvd: Option<f64>,
    #[field(kind = "flag")]
    pub family_history_diabetes: Option<f64>,
    #[field(kind = "flag")]
    pub family_history_hypertension: Option<f64>,
    /// 1-10 scale
    pub diet_score: Option<f64>,
    /// Sodium, mg per day
    pub salt_intake: Option<f64>,
    #[field(kind = "flag")]
    pub allergies: Option<f64>,
    /// Infections in the last year
    pub respiratory_infections: Option<f64>,
    /// Percent of predicted
    pub lung_function: Option<f64>,
    #[field(kind = "categorical", categories = "male,female")]
    pub gender: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HealthInsightError;
    use crate::features::{FeatureSchema, RawRecord};

    #[test]
    fn test_feature_order() {
        let names = HealthRecord::feature_names();
        assert_eq!(names.len(), 27);
        assert_eq!(names[0], "age");
        assert_eq!(names[10], "smoking");
        assert_eq!(names[24], "lung_function");
        assert_eq!(&names[25..], &["gender_male", "gender_female"]);
        assert_eq!(HealthRecord::SCHEMA_NAME, "health_record");
        assert_eq!(HealthRecord::SCHEMA_VERSION, 1);
    }

    #[test]
    fn test_from_raw_and_one_hot_gender() {
        let raw = RawRecord::new()
            .with("age", 55)
            .with("gender", "Male")
            .with("smoking", true)
            .with("unknown_key", "ignored");
        let record = HealthRecord::from_raw(&raw).unwrap();

        assert_eq!(record.age, Some(55.0));
        assert_eq!(record.smoking, Some(1.0));
        assert_eq!(record.feature_value("gender_male"), Some(1.0));
        assert_eq!(record.feature_value("gender_female"), Some(0.0));
        assert_eq!(record.feature_value("bmi"), None);

        let values = record.feature_values();
        assert_eq!(values.len(), 27);
        assert_eq!(values[0], Some(55.0));
        assert_eq!(values[1], None);
    }

    #[test]
    fn test_missing_gender_leaves_both_columns_missing() {
        let record = HealthRecord::from_raw(&RawRecord::new()).unwrap();
        assert_eq!(record.feature_value("gender_male"), None);
        assert!(record.feature_values().iter().all(Option::is_none));
    }

    #[test]
    fn test_every_malformed_field_is_reported() {
        let raw = RawRecord::new()
            .with("age", "old")
            .with("gender", 1)
            .with("bmi", 22);
        let err = HealthRecord::from_raw(&raw).unwrap_err();
        let HealthInsightError::MalformedFeature { fields } = &err else {
            panic!("expected MalformedFeature, got {err:?}");
        };
        let names: Vec<&str> = fields.iter().map(|f| f.field.as_str()).collect();
        assert_eq!(names, vec!["age", "gender"]);
    }
}
