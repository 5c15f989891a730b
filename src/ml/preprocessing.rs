//! Frozen feature transforms: median imputation and standard scaling
//!
//! Both are fitted once on training data and applied verbatim afterwards.
//! Neither has a refit path at inference time.

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::error::{HealthInsightError, Result};
use crate::utils::logging::log_feature_fallback;

/// Replaces missing values with the training median of their feature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedianImputer {
    feature_names: Vec<String>,
    medians: Vec<f64>,
}

fn median(values: &[f64]) -> Option<f64> {
    let sorted: Vec<f64> = values.iter().copied().sorted_by(f64::total_cmp).collect();
    let n = sorted.len();
    match n {
        0 => None,
        _ if n % 2 == 1 => Some(sorted[n / 2]),
        _ => Some((sorted[n / 2 - 1] + sorted[n / 2]) / 2.0),
    }
}

impl MedianImputer {
    /// Learn per-feature medians over the present values
    ///
    /// A feature with no present value at all imputes to 0.0.
    pub fn fit(feature_names: &[String], rows: &[Vec<Option<f64>>]) -> Result<Self> {
        if let Some(row) = rows.iter().find(|row| row.len() != feature_names.len()) {
            return Err(HealthInsightError::insufficient_data(format!(
                "row has {} values for {} features",
                row.len(),
                feature_names.len()
            )));
        }

        let medians = feature_names
            .iter()
            .enumerate()
            .map(|(column, name)| {
                let present: Vec<f64> = rows.iter().filter_map(|row| row[column]).collect();
                median(&present).unwrap_or_else(|| {
                    log_feature_fallback(name, 0.0);
                    0.0
                })
            })
            .collect();

        Ok(Self {
            feature_names: feature_names.to_vec(),
            medians,
        })
    }

    /// Fill the gaps of a row laid out as `feature_names`
    pub fn transform(&self, feature_names: &[String], row: &[Option<f64>]) -> Result<Vec<f64>> {
        if feature_names != self.feature_names.as_slice() || row.len() != self.medians.len() {
            return Err(HealthInsightError::FeatureMismatch {
                expected: self.feature_names.clone(),
                found: feature_names.to_vec(),
            });
        }
        Ok(row
            .iter()
            .zip(&self.medians)
            .map(|(value, median)| value.unwrap_or(*median))
            .collect())
    }

    /// Training-time feature ordering
    #[must_use]
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    #[must_use]
    pub fn medians(&self) -> &[f64] {
        &self.medians
    }

    pub(crate) fn check_consistency(&self) -> std::result::Result<(), String> {
        if self.medians.len() != self.feature_names.len() {
            return Err(format!(
                "imputer has {} medians for {} features",
                self.medians.len(),
                self.feature_names.len()
            ));
        }
        Ok(())
    }
}

/// Centres each feature and scales it to unit variance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    means: Vec<f64>,
    scales: Vec<f64>,
}

impl StandardScaler {
    /// Learn population mean and standard deviation per column
    ///
    /// Zero-variance columns get a scale of 1.0.
    #[allow(clippy::cast_precision_loss)]
    pub fn fit(rows: &[Vec<f64>]) -> Result<Self> {
        let Some(width) = rows.first().map(Vec::len) else {
            return Err(HealthInsightError::insufficient_data(
                "cannot fit a scaler on zero rows",
            ));
        };
        let n = rows.len() as f64;

        let means: Vec<f64> = (0..width)
            .map(|column| rows.iter().map(|row| row[column]).sum::<f64>() / n)
            .collect();
        let scales = (0..width)
            .map(|column| {
                let variance = rows
                    .iter()
                    .map(|row| (row[column] - means[column]).powi(2))
                    .sum::<f64>()
                    / n;
                let std = variance.sqrt();
                if std > 0.0 { std } else { 1.0 }
            })
            .collect();

        Ok(Self { means, scales })
    }

    #[must_use]
    pub fn transform(&self, row: &[f64]) -> Vec<f64> {
        row.iter()
            .zip(self.means.iter().zip(&self.scales))
            .map(|(value, (mean, scale))| (value - mean) / scale)
            .collect()
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.means.len()
    }

    pub(crate) fn check_consistency(&self, width: usize) -> std::result::Result<(), String> {
        if self.means.len() != width || self.scales.len() != width {
            return Err(format!(
                "scaler covers {} features, expected {width}",
                self.means.len()
            ));
        }
        if self.scales.iter().any(|s| !(s.is_finite() && *s > 0.0)) {
            return Err("scaler holds a non-positive scale".to_string());
        }
        Ok(())
    }
}
