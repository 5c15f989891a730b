//! Random forest classifier with balanced class weights
//!
//! Each tree is grown on a bootstrap sample, expressed as per-sample weights
//! (bootstrap multiplicity × class weight), and visits `sqrt(n_features)`
//! non-constant candidate features per split. Trees are independent and
//! are grown in parallel with their own seeded rng, so the fitted forest
//! does not depend on thread scheduling.

use log::{debug, info};
use rand::prelude::*;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::ml::tree::{DecisionTree, Gini, GrowthParams, grow_tree};
use crate::ml::{argmax, check_matrix};
use crate::utils::logging::{create_training_progress_bar, finish_progress_bar};

/// Forest hyperparameters
#[derive(Debug, Clone)]
pub struct ForestParams {
    pub n_estimators: usize,
    pub random_seed: u64,
    /// `None` grows every tree until its leaves are pure
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub show_progress: bool,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            random_seed: 42,
            max_depth: None,
            min_samples_split: 2,
            show_progress: false,
        }
    }
}

/// Fitted random forest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForestClassifier {
    n_classes: usize,
    n_features: usize,
    trees: Vec<DecisionTree>,
}

/// `n / (k * count_c)` for each class
#[allow(clippy::cast_precision_loss)]
fn balanced_class_weights(labels: &[usize], n_classes: usize) -> Vec<f64> {
    let mut counts = vec![0_usize; n_classes];
    for &label in labels {
        counts[label] += 1;
    }
    let n = labels.len() as f64;
    counts
        .iter()
        .map(|&count| {
            if count == 0 {
                0.0
            } else {
                n / (n_classes as f64 * count as f64)
            }
        })
        .collect()
}

impl RandomForestClassifier {
    /// Fit the forest on dense rows and encoded labels
    pub fn fit(rows: &[Vec<f64>], labels: &[usize], n_classes: usize, params: &ForestParams) -> Result<Self> {
        let n_features = check_matrix(rows, labels, n_classes)?;
        let n_samples = rows.len();
        let class_weights = balanced_class_weights(labels, n_classes);

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
        let max_features = ((n_features as f64).sqrt() as usize).max(1);
        let growth = GrowthParams {
            max_depth: params.max_depth,
            min_samples_split: params.min_samples_split,
            max_features,
        };

        info!(
            "Fitting random forest: {} trees, {n_samples} samples, {n_features} features, {n_classes} classes",
            params.n_estimators
        );

        let pb = create_training_progress_bar(
            params.n_estimators as u64,
            Some("Growing trees"),
            params.show_progress,
        );

        let trees: Vec<DecisionTree> = (0..params.n_estimators)
            .into_par_iter()
            .map(|i| {
                let mut rng = StdRng::seed_from_u64(params.random_seed.wrapping_add(i as u64));

                let mut multiplicity = vec![0_u32; n_samples];
                for _ in 0..n_samples {
                    multiplicity[rng.random_range(0..n_samples)] += 1;
                }
                let weights: Vec<f64> = multiplicity
                    .iter()
                    .zip(labels)
                    .map(|(&m, &label)| f64::from(m) * class_weights[label])
                    .collect();
                let samples: Vec<usize> = (0..n_samples).filter(|&s| multiplicity[s] > 0).collect();

                let criterion = Gini {
                    labels,
                    weights: &weights,
                    n_classes,
                };
                let tree = grow_tree(rows, samples, &criterion, &growth, Some(&mut rng));
                pb.inc(1);
                tree
            })
            .collect();

        finish_progress_bar(&pb, Some("Forest complete"));
        debug!(
            "Forest node counts: min {} max {}",
            trees.iter().map(DecisionTree::node_count).min().unwrap_or(0),
            trees.iter().map(DecisionTree::node_count).max().unwrap_or(0)
        );

        Ok(Self {
            n_classes,
            n_features,
            trees,
        })
    }

    /// Mean of the trees' leaf class distributions
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn predict_proba(&self, row: &[f64]) -> Vec<f64> {
        let mut probabilities = vec![0.0; self.n_classes];
        for tree in &self.trees {
            for (p, v) in probabilities.iter_mut().zip(tree.leaf_value(row)) {
                *p += v;
            }
        }
        let n_trees = self.trees.len().max(1) as f64;
        for p in &mut probabilities {
            *p /= n_trees;
        }
        probabilities
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
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub(crate) fn check_consistency(&self) -> std::result::Result<(), String> {
        if self.trees.is_empty() {
            return Err("forest has no trees".to_string());
        }
        self.trees
            .iter()
            .try_for_each(|tree| tree.check_consistency(self.n_features, self.n_classes))
    }
}
