//! Evaluation metrics and the stratified validation split

use rand::prelude::*;
use rustc_hash::FxHashMap;

/// Fraction of positions where `predicted` equals `actual`
///
/// `None` for an empty evaluation set.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn accuracy(actual: &[usize], predicted: &[usize]) -> Option<f64> {
    if actual.is_empty() {
        return None;
    }
    let correct = actual.iter().zip(predicted).filter(|(a, p)| a == p).count();
    Some(correct as f64 / actual.len() as f64)
}

/// Area under the ROC curve via the Mann-Whitney statistic
///
/// Tied scores receive their average rank. Returns `None` when either the
/// positive or the negative class is absent.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn roc_auc(scores: &[f64], positives: &[bool]) -> Option<f64> {
    let n_pos = positives.iter().filter(|&&p| p).count();
    let n_neg = positives.len() - n_pos;
    if n_pos == 0 || n_neg == 0 || scores.len() != positives.len() {
        return None;
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));

    let mut positive_rank_sum = 0.0;
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && scores[order[end]] == scores[order[start]] {
            end += 1;
        }
        // ranks are 1-based; the tie group spans ranks start+1 ..= end
        let average_rank = (start + 1 + end) as f64 / 2.0;
        let tied_positives = order[start..end].iter().filter(|&&i| positives[i]).count();
        positive_rank_sum += average_rank * tied_positives as f64;
        start = end;
    }

    let n_pos = n_pos as f64;
    let n_neg = n_neg as f64;
    Some((positive_rank_sum - n_pos * (n_pos + 1.0) / 2.0) / (n_pos * n_neg))
}

/// Row indices of a stratified train/validation split
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StratifiedSplit {
    pub train: Vec<usize>,
    pub validation: Vec<usize>,
}

/// Split rows per class, holding out `round(n_c * fraction)` rows of each
///
/// Every class keeps at least one training row. Classes are visited in
/// label order and each is shuffled with the same seeded rng, so the split
/// is reproducible.
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn stratified_split(labels: &[usize], fraction: f64, seed: u64) -> StratifiedSplit {
    let mut by_class: FxHashMap<usize, Vec<usize>> = FxHashMap::default();
    for (row, &label) in labels.iter().enumerate() {
        by_class.entry(label).or_default().push(row);
    }
    let mut classes: Vec<usize> = by_class.keys().copied().collect();
    classes.sort_unstable();

    let mut rng = StdRng::seed_from_u64(seed);
    let mut train = Vec::new();
    let mut validation = Vec::new();

    for class in classes {
        let Some(mut rows) = by_class.remove(&class) else {
            continue;
        };
        rows.shuffle(&mut rng);
        let held_out = ((rows.len() as f64 * fraction).round() as usize).min(rows.len() - 1);
        validation.extend_from_slice(&rows[..held_out]);
        train.extend_from_slice(&rows[held_out..]);
    }

    train.sort_unstable();
    validation.sort_unstable();
    StratifiedSplit { train, validation }
}
