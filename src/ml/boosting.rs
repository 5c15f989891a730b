//! Multinomial gradient boosting classifier
//!
//! Raw scores start at the log class priors. Each stage fits one regression
//! tree per class to the residuals `y_k - p_k` of the current softmax
//! probabilities, replaces each leaf with a single Newton step
//! `(K-1)/K * sum(r) / sum(|r| (1 - |r|))`, and adds the tree scaled by the
//! learning rate.

use log::{debug, info};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{HealthInsightError, Result};
use crate::ml::tree::{DecisionTree, GrowthParams, SquaredError, grow_tree};
use crate::ml::{argmax, check_matrix};
use crate::utils::logging::{create_training_progress_bar, finish_progress_bar};

/// Boosting hyperparameters
#[derive(Debug, Clone)]
pub struct BoostingParams {
    pub n_stages: usize,
    pub max_depth: usize,
    pub learning_rate: f64,
    pub show_progress: bool,
}

impl Default for BoostingParams {
    fn default() -> Self {
        Self {
            n_stages: 100,
            max_depth: 6,
            learning_rate: 0.1,
            show_progress: false,
        }
    }
}

/// Fitted gradient boosting classifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientBoostingClassifier {
    n_classes: usize,
    n_features: usize,
    learning_rate: f64,
    initial_scores: Vec<f64>,
    /// `stages[s][k]` is the tree for class `k` at stage `s`
    stages: Vec<Vec<DecisionTree>>,
}

/// Numerically stable softmax
#[must_use]
pub fn softmax(scores: &[f64]) -> Vec<f64> {
    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = scores.iter().map(|s| (s - max).exp()).collect();
    let total: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / total).collect()
}

impl GradientBoostingClassifier {
    /// Fit the ensemble on dense rows and encoded labels
    #[allow(clippy::cast_precision_loss)]
    pub fn fit(rows: &[Vec<f64>], labels: &[usize], n_classes: usize, params: &BoostingParams) -> Result<Self> {
        let n_features = check_matrix(rows, labels, n_classes)?;
        let n_samples = rows.len();

        let mut counts = vec![0_usize; n_classes];
        for &label in labels {
            counts[label] += 1;
        }
        if let Some(missing) = counts.iter().position(|&c| c == 0) {
            return Err(HealthInsightError::insufficient_data(format!(
                "class {missing} has no training samples"
            )));
        }
        let initial_scores: Vec<f64> = counts
            .iter()
            .map(|&c| (c as f64 / n_samples as f64).ln())
            .collect();

        info!(
            "Fitting gradient boosting: {} stages, depth {}, learning rate {}, {n_samples} samples, {n_classes} classes",
            params.n_stages, params.max_depth, params.learning_rate
        );

        let growth = GrowthParams {
            max_depth: Some(params.max_depth),
            min_samples_split: 2,
            max_features: usize::MAX,
        };
        let newton_factor = (n_classes as f64 - 1.0) / n_classes as f64;

        let mut scores: Vec<Vec<f64>> = vec![initial_scores.clone(); n_samples];
        let mut stages = Vec::with_capacity(params.n_stages);
        let pb = create_training_progress_bar(
            params.n_stages as u64,
            Some("Boosting stages"),
            params.show_progress,
        );

        for stage in 0..params.n_stages {
            let probabilities: Vec<Vec<f64>> = scores.iter().map(|s| softmax(s)).collect();

            let trees: Vec<DecisionTree> = (0..n_classes)
                .into_par_iter()
                .map(|class| {
                    let residuals: Vec<f64> = probabilities
                        .iter()
                        .zip(labels)
                        .map(|(p, &label)| f64::from(u8::from(label == class)) - p[class])
                        .collect();

                    let criterion = SquaredError {
                        targets: &residuals,
                        leaf: |samples: &[usize]| {
                            let numerator: f64 = samples.iter().map(|&s| residuals[s]).sum();
                            let denominator: f64 = samples
                                .iter()
                                .map(|&s| residuals[s].abs() * (1.0 - residuals[s].abs()))
                                .sum();
                            if denominator.abs() < 1e-150 {
                                0.0
                            } else {
                                newton_factor * numerator / denominator
                            }
                        },
                    };
                    grow_tree(rows, (0..n_samples).collect(), &criterion, &growth, None)
                })
                .collect();

            for (row, row_scores) in rows.iter().zip(scores.iter_mut()) {
                for (class, tree) in trees.iter().enumerate() {
                    row_scores[class] += params.learning_rate * tree.leaf_value(row)[0];
                }
            }

            if stage % 10 == 0 {
                let loss = log_loss(&scores, labels);
                debug!("Boosting stage {stage}: training log loss {loss:.5}");
            }

            stages.push(trees);
            pb.inc(1);
        }

        finish_progress_bar(&pb, Some("Boosting complete"));

        Ok(Self {
            n_classes,
            n_features,
            learning_rate: params.learning_rate,
            initial_scores,
            stages,
        })
    }

    /// Raw additive scores for one row
    #[must_use]
    pub fn decision_function(&self, row: &[f64]) -> Vec<f64> {
        let mut scores = self.initial_scores.clone();
        for trees in &self.stages {
            for (score, tree) in scores.iter_mut().zip(trees) {
                *score += self.learning_rate * tree.leaf_value(row)[0];
            }
        }
        scores
    }

    /// Softmax class probabilities for one row
    #[must_use]
    pub fn predict_proba(&self, row: &[f64]) -> Vec<f64> {
        softmax(&self.decision_function(row))
    }

    /// Most probable class; ties go to the lowest class index
    #[must_use]
    pub fn predict(&self, row: &[f64]) -> usize {
        argmax(&self.predict_proba(row))
    }

    #[must_use]
    pub const fn n_classes(&self) -> usize {
        self.n_classes
    }

    #[must_use]
    pub const fn n_features(&self) -> usize {
        self.n_features
    }

    #[must_use]
    pub fn n_stages(&self) -> usize {
        self.stages.len()
    }

    pub(crate) fn check_consistency(&self) -> std::result::Result<(), String> {
        if self.initial_scores.len() != self.n_classes {
            return Err(format!(
                "boosting model has {} initial scores for {} classes",
                self.initial_scores.len(),
                self.n_classes
            ));
        }
        if self.stages.is_empty() {
            return Err("boosting model has no stages".to_string());
        }
        for (index, trees) in self.stages.iter().enumerate() {
            if trees.len() != self.n_classes {
                return Err(format!("stage {index} has {} trees", trees.len()));
            }
            for tree in trees {
                tree.check_consistency(self.n_features, 1)?;
            }
        }
        Ok(())
    }
}

#[allow(clippy::cast_precision_loss)]
fn log_loss(scores: &[Vec<f64>], labels: &[usize]) -> f64 {
    let total: f64 = scores
        .iter()
        .zip(labels)
        .map(|(s, &label)| -softmax(s)[label].max(1e-15).ln())
        .sum();
    total / labels.len().max(1) as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_bands() -> (Vec<Vec<f64>>, Vec<usize>) {
        let mut rows = Vec::new();
        let mut labels = Vec::new();
        for i in 0..45 {
            rows.push(vec![f64::from(i), f64::from(i % 4)]);
            labels.push(usize::try_from(i / 15).unwrap());
        }
        (rows, labels)
    }

    fn params() -> BoostingParams {
        BoostingParams {
            n_stages: 20,
            max_depth: 3,
            learning_rate: 0.1,
            show_progress: false,
        }
    }

    #[test]
    fn test_softmax_sums_to_one() {
        let p = softmax(&[1000.0, 1000.0, 999.0]);
        assert!((p.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert!((p[0] - p[1]).abs() < 1e-12);
    }

    #[test]
    fn test_initial_scores_are_log_priors() {
        let (rows, labels) = three_bands();
        let model = GradientBoostingClassifier::fit(&rows, &labels, 3, &params()).unwrap();
        for score in &model.initial_scores {
            assert!((score - (1.0_f64 / 3.0).ln()).abs() < 1e-12);
        }
        assert_eq!(model.n_stages(), 20);
        assert!(model.check_consistency().is_ok());
    }

    #[test]
    fn test_boosting_separates_bands() {
        let (rows, labels) = three_bands();
        let model = GradientBoostingClassifier::fit(&rows, &labels, 3, &params()).unwrap();

        assert_eq!(model.predict(&[2.0, 2.0]), 0);
        assert_eq!(model.predict(&[22.0, 2.0]), 1);
        assert_eq!(model.predict(&[40.0, 0.0]), 2);

        let p = model.predict_proba(&[22.0, 2.0]);
        assert!((p.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        assert!(p[1] > 0.5);
    }

    #[test]
    fn test_missing_class_is_insufficient_data() {
        let rows = vec![vec![0.0], vec![1.0]];
        let err = GradientBoostingClassifier::fit(&rows, &[0, 2], 3, &params()).unwrap_err();
        assert!(matches!(err, HealthInsightError::InsufficientData { .. }));
    }
}
