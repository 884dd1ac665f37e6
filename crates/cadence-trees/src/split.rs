use std::str::FromStr;

use rand::Rng;

use crate::TreeError;

/// Criterion for measuring the quality of a classification split.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitCriterion {
    /// Gini impurity: 1 - Σ(p_i²)
    Gini,
    /// Information entropy: -Σ(p_i · ln(p_i))
    Entropy,
}

impl SplitCriterion {
    /// Compute the impurity of a node from its class counts.
    ///
    /// Returns zero impurity when `n_samples` is zero.
    #[must_use]
    pub fn impurity(&self, class_counts: &[usize], n_samples: usize) -> f64 {
        if n_samples == 0 {
            return 0.0;
        }
        let n = n_samples as f64;
        match self {
            SplitCriterion::Gini => {
                let sum_sq: f64 = class_counts
                    .iter()
                    .map(|&c| {
                        let p = c as f64 / n;
                        p * p
                    })
                    .sum();
                1.0 - sum_sq
            }
            SplitCriterion::Entropy => -class_counts
                .iter()
                .filter(|&&c| c > 0)
                .map(|&c| {
                    let p = c as f64 / n;
                    p * p.ln()
                })
                .sum::<f64>(),
        }
    }
}

impl FromStr for SplitCriterion {
    type Err = TreeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gini" => Ok(SplitCriterion::Gini),
            "entropy" => Ok(SplitCriterion::Entropy),
            _ => Err(TreeError::UnknownCriterion {
                spec: s.to_string(),
            }),
        }
    }
}

/// A chosen split: feature, threshold, score, and the partitioned samples.
#[derive(Debug, Clone)]
pub(crate) struct SplitResult {
    pub(crate) feature: usize,
    pub(crate) threshold: f64,
    /// Criterion-specific improvement (impurity decrease or gain).
    pub(crate) score: f64,
    pub(crate) left_indices: Vec<usize>,
    pub(crate) right_indices: Vec<usize>,
}

/// Pick `max_features` distinct feature columns with a partial Fisher-Yates shuffle.
pub(crate) fn sample_features(
    n_features: usize,
    max_features: usize,
    rng: &mut impl Rng,
) -> Vec<usize> {
    let mut order: Vec<usize> = (0..n_features).collect();
    let take = max_features.min(n_features);
    for i in 0..take {
        let j = rng.gen_range(i..n_features);
        order.swap(i, j);
    }
    order.truncate(take);
    order
}

/// Sort `(value, sample)` pairs for one column over the node's samples.
pub(crate) fn sorted_column(column: &[f64], sample_indices: &[usize]) -> Vec<(f64, usize)> {
    let mut sorted: Vec<(f64, usize)> = sample_indices
        .iter()
        .map(|&si| (column[si], si))
        .collect();
    sorted.sort_unstable_by(|a, b| a.0.total_cmp(&b.0));
    sorted
}

/// Partition samples on `column[si] <= threshold`.
pub(crate) fn partition(
    column: &[f64],
    sample_indices: &[usize],
    threshold: f64,
) -> (Vec<usize>, Vec<usize>) {
    sample_indices
        .iter()
        .copied()
        .partition(|&si| column[si] <= threshold)
}

/// Find the best classification split among a random subset of features.
///
/// For each of `max_features` randomly chosen features, sorts the node's
/// samples by value, scans left-to-right with incremental class counts,
/// and keeps the split with the largest sample-weighted impurity decrease.
///
/// Returns `None` when no valid split exists (all values identical, or
/// every boundary would violate `min_samples_leaf`).
///
/// `columns` is column-major: `columns[feature_idx][sample_idx]`.
#[allow(clippy::too_many_arguments)]
pub(crate) fn find_best_split(
    columns: &[Vec<f64>],
    labels: &[usize],
    sample_indices: &[usize],
    n_classes: usize,
    criterion: SplitCriterion,
    max_features: usize,
    min_samples_leaf: usize,
    rng: &mut impl Rng,
) -> Option<SplitResult> {
    let n_samples = sample_indices.len();
    if n_samples < 2 || columns.is_empty() {
        return None;
    }

    let mut parent_counts = vec![0usize; n_classes];
    for &si in sample_indices {
        parent_counts[labels[si]] += 1;
    }
    let parent_impurity = criterion.impurity(&parent_counts, n_samples);

    let mut best_decrease = f64::NEG_INFINITY;
    let mut best: Option<(usize, f64)> = None;

    for feat_idx in sample_features(columns.len(), max_features, rng) {
        let sorted = sorted_column(&columns[feat_idx], sample_indices);

        let mut left_counts = vec![0usize; n_classes];
        let mut right_counts = parent_counts.clone();

        for i in 0..(n_samples - 1) {
            let (val_i, si) = sorted[i];
            left_counts[labels[si]] += 1;
            right_counts[labels[si]] -= 1;

            let val_next = sorted[i + 1].0;
            if val_i == val_next {
                continue;
            }

            let n_left = i + 1;
            let n_right = n_samples - n_left;
            if n_left < min_samples_leaf || n_right < min_samples_leaf {
                continue;
            }

            let left_impurity = criterion.impurity(&left_counts, n_left);
            let right_impurity = criterion.impurity(&right_counts, n_right);

            // Weighted by sample count, as in scikit-learn's MDI.
            let decrease = (n_samples as f64) * parent_impurity
                - (n_left as f64) * left_impurity
                - (n_right as f64) * right_impurity;

            if decrease > best_decrease {
                best_decrease = decrease;
                best = Some((feat_idx, (val_i + val_next) / 2.0));
            }
        }
    }

    let (feat_idx, threshold) = best?;
    let (left_indices, right_indices) = partition(&columns[feat_idx], sample_indices, threshold);

    Some(SplitResult {
        feature: feat_idx,
        threshold,
        score: best_decrease,
        left_indices,
        right_indices,
    })
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;

    #[test]
    fn gini_pure_and_balanced() {
        assert!(SplitCriterion::Gini.impurity(&[10, 0, 0], 10).abs() < f64::EPSILON);
        let imp = SplitCriterion::Gini.impurity(&[5, 5], 10);
        assert!((imp - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn entropy_binary_balanced() {
        let imp = SplitCriterion::Entropy.impurity(&[5, 5], 10);
        assert!((imp - 2.0_f64.ln()).abs() < 1e-10);
    }

    #[test]
    fn criterion_parses_by_name() {
        assert_eq!("gini".parse::<SplitCriterion>().unwrap(), SplitCriterion::Gini);
        assert_eq!("Entropy".parse::<SplitCriterion>().unwrap(), SplitCriterion::Entropy);
        assert!(matches!(
            "variance".parse::<SplitCriterion>(),
            Err(TreeError::UnknownCriterion { spec }) if spec == "variance"
        ));
    }

    #[test]
    fn separable_data_finds_midpoint_threshold() {
        let columns = vec![vec![1.0, 2.0, 3.0, 10.0, 11.0, 12.0]];
        let labels = vec![0, 0, 0, 1, 1, 1];
        let samples: Vec<usize> = (0..6).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(42);

        let split = find_best_split(
            &columns,
            &labels,
            &samples,
            2,
            SplitCriterion::Gini,
            1,
            1,
            &mut rng,
        )
        .expect("should find a split");

        assert_eq!(split.feature, 0);
        assert!((split.threshold - 6.5).abs() < f64::EPSILON);
        assert_eq!(split.left_indices, vec![0, 1, 2]);
        assert_eq!(split.right_indices, vec![3, 4, 5]);
        // 6 * 0.5 - 3 * 0 - 3 * 0
        assert!((split.score - 3.0).abs() < 1e-10);
    }

    #[test]
    fn constant_feature_returns_none() {
        let columns = vec![vec![5.0, 5.0, 5.0, 5.0]];
        let labels = vec![0, 0, 1, 1];
        let samples: Vec<usize> = (0..4).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let result = find_best_split(
            &columns,
            &labels,
            &samples,
            2,
            SplitCriterion::Gini,
            1,
            1,
            &mut rng,
        );
        assert!(result.is_none());
    }

    #[test]
    fn min_samples_leaf_enforced() {
        let columns = vec![vec![1.0, 10.0]];
        let labels = vec![0, 1];
        let samples: Vec<usize> = (0..2).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let result = find_best_split(
            &columns,
            &labels,
            &samples,
            2,
            SplitCriterion::Gini,
            1,
            2,
            &mut rng,
        );
        assert!(result.is_none());
    }

    #[test]
    fn sample_features_distinct_and_bounded() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let picked = sample_features(10, 4, &mut rng);
        assert_eq!(picked.len(), 4);
        let mut dedup = picked.clone();
        dedup.sort_unstable();
        dedup.dedup();
        assert_eq!(dedup.len(), 4);
        assert!(picked.iter().all(|&f| f < 10));
    }
}
