//! CART decision trees
//!
//! Trees are grown depth-first into a flat node vector. Split quality is
//! pluggable through [`Criterion`]: weighted gini impurity for the forest's
//! classification trees, squared error for the boosting stages' regression
//! trees.

use rand::prelude::*;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Two feature values closer than this are treated as equal
const FEATURE_THRESHOLD: f64 = 1e-7;

/// Node of a fitted tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TreeNode {
    /// Rows with `row[feature] <= threshold` go left
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    /// Class distribution for classification, a single value for regression
    Leaf { value: Vec<f64> },
}

/// Fitted decision tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<TreeNode>,
}

impl DecisionTree {
    /// Leaf value reached by `row`
    #[must_use]
    pub fn leaf_value(&self, row: &[f64]) -> &[f64] {
        let mut index = 0;
        loop {
            match &self.nodes[index] {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    index = if row[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
                TreeNode::Leaf { value } => return value,
            }
        }
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        fn walk(nodes: &[TreeNode], index: usize) -> usize {
            match &nodes[index] {
                TreeNode::Split { left, right, .. } => 1 + walk(nodes, *left).max(walk(nodes, *right)),
                TreeNode::Leaf { .. } => 0,
            }
        }
        walk(&self.nodes, 0)
    }

    /// Check a deserialised tree can be evaluated without panicking
    pub(crate) fn check_consistency(
        &self,
        n_features: usize,
        leaf_width: usize,
    ) -> std::result::Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }
        for (index, node) in self.nodes.iter().enumerate() {
            match node {
                TreeNode::Split {
                    feature,
                    left,
                    right,
                    ..
                } => {
                    if *feature >= n_features {
                        return Err(format!("node {index} splits on unknown feature {feature}"));
                    }
                    // children are always allocated after their parent
                    if *left <= index || *right <= index || *left >= self.nodes.len() || *right >= self.nodes.len() {
                        return Err(format!("node {index} has invalid children"));
                    }
                }
                TreeNode::Leaf { value } => {
                    if value.len() != leaf_width {
                        return Err(format!(
                            "leaf {index} holds {} values, expected {leaf_width}",
                            value.len()
                        ));
                    }
                }
            }
        }
        Ok(())
    }
}

/// Split quality measure and leaf value for one kind of tree
pub trait Criterion {
    /// Sufficient statistics of a set of samples
    type Stats: Clone;

    fn empty(&self) -> Self::Stats;
    fn add(&self, stats: &mut Self::Stats, sample: usize);
    fn remove(&self, stats: &mut Self::Stats, sample: usize);

    /// Larger is better; the split maximising `proxy(left) + proxy(right)` wins
    fn proxy(&self, stats: &Self::Stats) -> f64;

    /// No split can improve a pure node
    fn is_pure(&self, stats: &Self::Stats) -> bool;

    fn leaf_value(&self, samples: &[usize], stats: &Self::Stats) -> Vec<f64>;

    fn stats_of(&self, samples: &[usize]) -> Self::Stats {
        let mut stats = self.empty();
        for &sample in samples {
            self.add(&mut stats, sample);
        }
        stats
    }
}

/// Weighted class counts
#[derive(Debug, Clone)]
pub struct ClassCounts {
    counts: Vec<f64>,
    total: f64,
}

/// Weighted gini impurity
pub struct Gini<'a> {
    pub labels: &'a [usize],
    pub weights: &'a [f64],
    pub n_classes: usize,
}

impl Criterion for Gini<'_> {
    type Stats = ClassCounts;

    fn empty(&self) -> ClassCounts {
        ClassCounts {
            counts: vec![0.0; self.n_classes],
            total: 0.0,
        }
    }

    fn add(&self, stats: &mut ClassCounts, sample: usize) {
        let weight = self.weights[sample];
        stats.counts[self.labels[sample]] += weight;
        stats.total += weight;
    }

    fn remove(&self, stats: &mut ClassCounts, sample: usize) {
        let weight = self.weights[sample];
        stats.counts[self.labels[sample]] -= weight;
        stats.total -= weight;
    }

    fn proxy(&self, stats: &ClassCounts) -> f64 {
        if stats.total <= 0.0 {
            return 0.0;
        }
        stats.counts.iter().map(|c| c * c).sum::<f64>() / stats.total
    }

    fn is_pure(&self, stats: &ClassCounts) -> bool {
        stats.counts.iter().filter(|&&c| c > 0.0).count() <= 1
    }

    fn leaf_value(&self, _samples: &[usize], stats: &ClassCounts) -> Vec<f64> {
        if stats.total <= 0.0 {
            return vec![0.0; self.n_classes];
        }
        stats.counts.iter().map(|c| c / stats.total).collect()
    }
}

/// Running sums of regression targets
#[derive(Debug, Clone, Copy)]
pub struct TargetSums {
    sum: f64,
    sum_sq: f64,
    count: f64,
}

/// Squared error with a caller-supplied leaf value
pub struct SquaredError<'a, F> {
    pub targets: &'a [f64],
    pub leaf: F,
}

impl<F> Criterion for SquaredError<'_, F>
where
    F: Fn(&[usize]) -> f64,
{
    type Stats = TargetSums;

    fn empty(&self) -> TargetSums {
        TargetSums {
            sum: 0.0,
            sum_sq: 0.0,
            count: 0.0,
        }
    }

    fn add(&self, stats: &mut TargetSums, sample: usize) {
        let t = self.targets[sample];
        stats.sum += t;
        stats.sum_sq += t * t;
        stats.count += 1.0;
    }

    fn remove(&self, stats: &mut TargetSums, sample: usize) {
        let t = self.targets[sample];
        stats.sum -= t;
        stats.sum_sq -= t * t;
        stats.count -= 1.0;
    }

    fn proxy(&self, stats: &TargetSums) -> f64 {
        if stats.count <= 0.0 {
            return 0.0;
        }
        stats.sum * stats.sum / stats.count
    }

    fn is_pure(&self, stats: &TargetSums) -> bool {
        if stats.count <= 0.0 {
            return true;
        }
        let mean = stats.sum / stats.count;
        stats.sum_sq / stats.count - mean * mean <= 1e-14
    }

    fn leaf_value(&self, samples: &[usize], _stats: &TargetSums) -> Vec<f64> {
        vec![(self.leaf)(samples)]
    }
}

/// Stopping rules and feature sampling for tree growth
#[derive(Debug, Clone, Copy)]
pub struct GrowthParams {
    /// `None` grows until leaves are pure
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    /// Non-constant features evaluated per split
    pub max_features: usize,
}

/// Grow a tree over `samples` (row indices into `rows`)
///
/// With an rng, candidate features are visited in a fresh random order at
/// every node; without one they are visited in column order.
pub fn grow_tree<C: Criterion>(
    rows: &[Vec<f64>],
    samples: Vec<usize>,
    criterion: &C,
    params: &GrowthParams,
    mut rng: Option<&mut StdRng>,
) -> DecisionTree {
    let n_features = rows.first().map_or(0, Vec::len);
    let mut nodes = vec![TreeNode::Leaf { value: Vec::new() }];
    let mut stack = vec![(0_usize, samples, 0_usize)];

    while let Some((id, samples, depth)) = stack.pop() {
        let stats = criterion.stats_of(&samples);
        let splittable = samples.len() >= params.min_samples_split
            && params.max_depth.is_none_or(|max| depth < max)
            && !criterion.is_pure(&stats);

        let split = if splittable {
            best_split(
                rows,
                &samples,
                &stats,
                criterion,
                n_features,
                params.max_features,
                rng.as_deref_mut(),
            )
        } else {
            None
        };

        match split {
            Some((feature, threshold)) => {
                let (left, right): (Vec<usize>, Vec<usize>) = samples
                    .into_iter()
                    .partition(|&s| rows[s][feature] <= threshold);
                let left_id = nodes.len();
                let right_id = left_id + 1;
                nodes.push(TreeNode::Leaf { value: Vec::new() });
                nodes.push(TreeNode::Leaf { value: Vec::new() });
                nodes[id] = TreeNode::Split {
                    feature,
                    threshold,
                    left: left_id,
                    right: right_id,
                };
                stack.push((right_id, right, depth + 1));
                stack.push((left_id, left, depth + 1));
            }
            None => {
                nodes[id] = TreeNode::Leaf {
                    value: criterion.leaf_value(&samples, &stats),
                };
            }
        }
    }

    DecisionTree { nodes }
}

fn best_split<C: Criterion>(
    rows: &[Vec<f64>],
    samples: &[usize],
    stats: &C::Stats,
    criterion: &C,
    n_features: usize,
    max_features: usize,
    rng: Option<&mut StdRng>,
) -> Option<(usize, f64)> {
    let mut features: SmallVec<[usize; 64]> = (0..n_features).collect();
    if let Some(rng) = rng {
        features.shuffle(rng);
    }

    let mut order = samples.to_vec();
    let mut best: Option<(f64, usize, f64)> = None;
    let mut evaluated = 0;

    for &feature in &features {
        if evaluated >= max_features {
            break;
        }

        order.sort_by(|&a, &b| rows[a][feature].total_cmp(&rows[b][feature]));
        let (Some(&first), Some(&last)) = (order.first(), order.last()) else {
            return None;
        };
        if rows[last][feature] <= rows[first][feature] + FEATURE_THRESHOLD {
            continue;
        }
        evaluated += 1;

        let mut left = criterion.empty();
        let mut right = stats.clone();
        for pair in order.windows(2) {
            criterion.add(&mut left, pair[0]);
            criterion.remove(&mut right, pair[0]);

            let current = rows[pair[0]][feature];
            let next = rows[pair[1]][feature];
            if next <= current + FEATURE_THRESHOLD {
                continue;
            }

            let score = criterion.proxy(&left) + criterion.proxy(&right);
            if best.is_none_or(|(best_score, _, _)| score > best_score) {
                let mut threshold = current / 2.0 + next / 2.0;
                if threshold >= next {
                    threshold = current;
                }
                best = Some((score, feature, threshold));
            }
        }
    }

    best.map(|(_, feature, threshold)| (feature, threshold))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unlimited() -> GrowthParams {
        GrowthParams {
            max_depth: None,
            min_samples_split: 2,
            max_features: usize::MAX,
        }
    }

    #[test]
    fn test_gini_tree_separates_classes() {
        let rows = vec![vec![0.0, 5.0], vec![1.0, 5.0], vec![2.0, 5.0], vec![3.0, 5.0]];
        let labels = vec![0, 0, 1, 1];
        let weights = vec![1.0; 4];
        let criterion = Gini {
            labels: &labels,
            weights: &weights,
            n_classes: 2,
        };

        let tree = grow_tree(&rows, (0..4).collect(), &criterion, &unlimited(), None);
        assert_eq!(tree.node_count(), 3);
        assert_eq!(tree.leaf_value(&[0.5, 5.0]), &[1.0, 0.0]);
        assert_eq!(tree.leaf_value(&[2.5, 5.0]), &[0.0, 1.0]);
        assert!(tree.check_consistency(2, 2).is_ok());
    }

    #[test]
    fn test_constant_features_produce_a_single_leaf() {
        let rows = vec![vec![1.0], vec![1.0], vec![1.0]];
        let labels = vec![0, 1, 1];
        let weights = vec![1.0, 1.0, 2.0];
        let criterion = Gini {
            labels: &labels,
            weights: &weights,
            n_classes: 2,
        };

        let tree = grow_tree(&rows, (0..3).collect(), &criterion, &unlimited(), None);
        assert_eq!(tree.node_count(), 1);
        assert_eq!(tree.leaf_value(&[1.0]), &[0.25, 0.75]);
    }

    #[test]
    fn test_regression_tree_respects_max_depth() {
        let rows: Vec<Vec<f64>> = (0..8).map(|i| vec![f64::from(i)]).collect();
        let targets: Vec<f64> = (0..8).map(f64::from).collect();
        let criterion = SquaredError {
            targets: &targets,
            leaf: |samples: &[usize]| {
                samples.iter().map(|&s| targets[s]).sum::<f64>() / samples.len() as f64
            },
        };
        let params = GrowthParams {
            max_depth: Some(1),
            ..unlimited()
        };

        let tree = grow_tree(&rows, (0..8).collect(), &criterion, &params, None);
        assert_eq!(tree.depth(), 1);
        assert!((tree.leaf_value(&[0.0])[0] - 1.5).abs() < 1e-12);
        assert!((tree.leaf_value(&[7.0])[0] - 5.5).abs() < 1e-12);
    }

    #[test]
    fn test_inconsistent_tree_is_reported() {
        let tree = DecisionTree {
            nodes: vec![TreeNode::Split {
                feature: 3,
                threshold: 0.0,
                left: 1,
                right: 2,
            }],
        };
        assert!(tree.check_consistency(2, 1).is_err());
    }
}
