//! Learning primitives shared by the two pipelines.

pub mod boosting;
pub mod forest;
pub mod label_encoder;
pub mod metrics;
pub mod preprocessing;
pub mod tree;

pub use boosting::{BoostingParams, GradientBoostingClassifier};
pub use forest::{ForestParams, RandomForestClassifier};
pub use label_encoder::LabelEncoder;
pub use preprocessing::{MedianImputer, StandardScaler};

use crate::error::{HealthInsightError, Result};

/// Index of the largest value; the first one wins ties
#[must_use]
pub fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (index, value) in values.iter().enumerate() {
        if *value > values[best] {
            best = index;
        }
    }
    best
}

/// Validate a training matrix and return its width
pub(crate) fn check_matrix(rows: &[Vec<f64>], labels: &[usize], n_classes: usize) -> Result<usize> {
    if n_classes < 2 {
        return Err(HealthInsightError::insufficient_data(format!(
            "need at least 2 distinct labels, found {n_classes}"
        )));
    }
    if rows.is_empty() || rows.len() != labels.len() {
        return Err(HealthInsightError::insufficient_data(format!(
            "{} rows for {} labels",
            rows.len(),
            labels.len()
        )));
    }
    let width = rows[0].len();
    if width == 0 || rows.iter().any(|row| row.len() != width) {
        return Err(HealthInsightError::insufficient_data(
            "rows must share a non-zero width",
        ));
    }
    if let Some(label) = labels.iter().find(|&&label| label >= n_classes) {
        return Err(HealthInsightError::insufficient_data(format!(
            "label {label} outside 0..{n_classes}"
        )));
    }
    Ok(width)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argmax_prefers_first_maximum() {
        assert_eq!(argmax(&[0.2, 0.4, 0.4]), 1);
        assert_eq!(argmax(&[]), 0);
    }

    #[test]
    fn test_check_matrix_rejects_ragged_rows() {
        let rows = vec![vec![1.0, 2.0], vec![1.0]];
        assert!(check_matrix(&rows, &[0, 1], 2).is_err());
        assert_eq!(check_matrix(&[vec![1.0], vec![2.0]], &[0, 1], 2).unwrap(), 1);
    }
}
