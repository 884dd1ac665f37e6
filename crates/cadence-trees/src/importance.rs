//! Feature importance aggregation across trees.

/// Average per-tree importance vectors and normalize to sum to 1.0.
///
/// Entries beyond `n_features` are ignored. All zeros when no tree split.
pub(crate) fn aggregate_importances(per_tree: &[Vec<f64>], n_features: usize) -> Vec<f64> {
    let mut totals = vec![0.0f64; n_features];
    if per_tree.is_empty() {
        return totals;
    }

    for tree_imp in per_tree {
        for (total, &val) in totals.iter_mut().zip(tree_imp) {
            *total += val;
        }
    }

    let sum: f64 = totals.iter().sum();
    if sum > 0.0 {
        totals.iter_mut().for_each(|v| *v /= sum);
    }
    totals
}

/// Return feature indices sorted by descending importance.
///
/// Ties keep ascending index order.
#[must_use]
pub fn rank_features(importances: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..importances.len()).collect();
    order.sort_by(|&a, &b| importances[b].total_cmp(&importances[a]));
    order
}
