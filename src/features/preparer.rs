//! Mapping typed records onto the training-time feature layout
//!
//! The preparer's vocabulary is the ordered list of schema features that
//! occurred in the training records. At inference a schema feature outside
//! the vocabulary is dropped, and a vocabulary feature the record lacks is
//! carried as missing. Imputation happens downstream.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{HealthInsightError, Result};
use crate::features::schema::{FeatureSchema, RawRecord};

/// Ordered named values with explicit missing markers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    names: Vec<String>,
    values: Vec<Option<f64>>,
}

impl FeatureVector {
    /// Pair names with values; both must have the same length
    pub fn new(names: Vec<String>, values: Vec<Option<f64>>) -> Result<Self> {
        if names.len() != values.len() {
            return Err(HealthInsightError::FeatureMismatch {
                found: vec![format!("{} values", values.len())],
                expected: names,
            });
        }
        Ok(Self { names, values })
    }

    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    #[must_use]
    pub fn values(&self) -> &[Option<f64>] {
        &self.values
    }

    /// Value of a named feature; `None` when absent or missing
    #[must_use]
    pub fn get(&self, name: &str) -> Option<f64> {
        self.names
            .iter()
            .position(|n| n == name)
            .and_then(|index| self.values[index])
    }

    #[must_use]
    pub fn missing_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_none()).count()
    }
}

/// Frozen feature vocabulary for one schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeaturePreparer {
    schema_name: String,
    schema_version: u32,
    feature_names: Vec<String>,
}

impl FeaturePreparer {
    /// Vocabulary covering every feature of the schema
    #[must_use]
    pub fn for_schema<S: FeatureSchema>() -> Self {
        Self {
            schema_name: S::SCHEMA_NAME.to_string(),
            schema_version: S::SCHEMA_VERSION,
            feature_names: S::feature_names().iter().map(|n| (*n).to_string()).collect(),
        }
    }

    /// Vocabulary of the schema features present in at least one record
    pub fn fit<S: FeatureSchema>(records: &[S]) -> Result<Self> {
        let names = S::feature_names();
        let mut seen = vec![false; names.len()];
        for record in records {
            for (slot, value) in seen.iter_mut().zip(record.feature_values()) {
                *slot |= value.is_some();
            }
        }

        let feature_names: Vec<String> = names
            .iter()
            .zip(&seen)
            .filter(|(_, present)| **present)
            .map(|(name, _)| (*name).to_string())
            .collect();

        if feature_names.is_empty() {
            return Err(HealthInsightError::insufficient_data(
                "no training record carries any feature value",
            ));
        }
        if feature_names.len() < names.len() {
            debug!(
                "{} of {} {} features never present in training data and excluded",
                names.len() - feature_names.len(),
                names.len(),
                S::SCHEMA_NAME
            );
        }

        Ok(Self {
            schema_name: S::SCHEMA_NAME.to_string(),
            schema_version: S::SCHEMA_VERSION,
            feature_names,
        })
    }

    /// Lay a record out in vocabulary order
    pub fn prepare<S: FeatureSchema>(&self, record: &S) -> Result<FeatureVector> {
        if S::SCHEMA_NAME != self.schema_name || S::SCHEMA_VERSION != self.schema_version {
            return Err(HealthInsightError::FeatureMismatch {
                expected: self.feature_names.clone(),
                found: S::feature_names().iter().map(|n| (*n).to_string()).collect(),
            });
        }

        let values = self
            .feature_names
            .iter()
            .map(|name| record.feature_value(name))
            .collect();

        Ok(FeatureVector {
            names: self.feature_names.clone(),
            values,
        })
    }

    /// Coerce a raw record through the schema, then lay it out
    pub fn prepare_raw<S: FeatureSchema>(&self, raw: &RawRecord) -> Result<FeatureVector> {
        self.prepare(&S::from_raw(raw)?)
    }

    #[must_use]
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    #[must_use]
    pub fn schema_name(&self) -> &str {
        &self.schema_name
    }

    pub(crate) fn check_consistency<S: FeatureSchema>(&self) -> std::result::Result<(), String> {
        if self.schema_name != S::SCHEMA_NAME || self.schema_version != S::SCHEMA_VERSION {
            return Err(format!(
                "artifact was trained on schema {} v{}, expected {} v{}",
                self.schema_name,
                self.schema_version,
                S::SCHEMA_NAME,
                S::SCHEMA_VERSION
            ));
        }
        let known = S::feature_names();
        if let Some(unknown) = self
            .feature_names
            .iter()
            .find(|name| !known.contains(&name.as_str()))
        {
            return Err(format!("unknown feature {unknown} in vocabulary"));
        }
        if self.feature_names.is_empty() {
            return Err("feature vocabulary is empty".to_string());
        }
        Ok(())
    }
}
