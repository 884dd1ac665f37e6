//! Second-order regression trees fitted to gradient/hessian pairs.
//!
//! Leaf weight: `w = -G / (H + lambda)`.
//! Split gain: `0.5 * (GL²/(HL+λ) + GR²/(HR+λ) - G²/(H+λ))`.

use crate::node::Arena;
use crate::split::{partition, sorted_column};

/// Growth limits for one regression tree.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RegressionParams {
    pub(crate) max_depth: usize,
    pub(crate) min_samples_leaf: usize,
    pub(crate) lambda: f64,
}

/// A fitted gradient regression tree; each leaf holds its regularized weight.
#[derive(Debug, Clone)]
pub(crate) struct RegressionTree {
    arena: Arena<f64>,
}

impl RegressionTree {
    /// Fit a tree to per-sample gradients and hessians over `sample_indices`.
    ///
    /// `columns` is column-major: `columns[feature_idx][sample_idx]`.
    pub(crate) fn fit(
        columns: &[Vec<f64>],
        grad: &[f64],
        hess: &[f64],
        sample_indices: &[usize],
        params: RegressionParams,
    ) -> Self {
        let mut arena = Arena::new();
        build(columns, grad, hess, sample_indices, 0, params, &mut arena);
        Self { arena }
    }

    /// Return the additive score for one sample. The caller checks width.
    pub(crate) fn predict(&self, sample: &[f64]) -> f64 {
        *self.arena.leaf_for(sample)
    }

    /// Add each split's gain to `totals[feature]`.
    pub(crate) fn accumulate_gain(&self, totals: &mut [f64]) {
        self.arena.accumulate_gain(totals);
    }
}

fn leaf_weight(g: f64, h: f64, lambda: f64) -> f64 {
    -g / (h + lambda)
}

fn score(g: f64, h: f64, lambda: f64) -> f64 {
    g * g / (h + lambda)
}

fn build(
    columns: &[Vec<f64>],
    grad: &[f64],
    hess: &[f64],
    sample_indices: &[usize],
    depth: usize,
    params: RegressionParams,
    arena: &mut Arena<f64>,
) -> usize {
    let g_total: f64 = sample_indices.iter().map(|&i| grad[i]).sum();
    let h_total: f64 = sample_indices.iter().map(|&i| hess[i]).sum();
    let weight = leaf_weight(g_total, h_total, params.lambda);

    let best = if depth >= params.max_depth || sample_indices.len() < 2 * params.min_samples_leaf {
        None
    } else {
        best_split(columns, grad, hess, sample_indices, g_total, h_total, params)
    };

    let Some((feature, threshold, gain)) = best else {
        return arena.push_leaf(weight);
    };

    let (left_indices, right_indices) = partition(&columns[feature], sample_indices, threshold);

    let node_idx = arena.open_split(feature, threshold, gain);
    let left = build(columns, grad, hess, &left_indices, depth + 1, params, arena);
    let right = build(columns, grad, hess, &right_indices, depth + 1, params, arena);
    arena.link(node_idx, left, right);
    node_idx
}

/// Exact greedy scan over every feature. Only positive gains qualify.
fn best_split(
    columns: &[Vec<f64>],
    grad: &[f64],
    hess: &[f64],
    sample_indices: &[usize],
    g_total: f64,
    h_total: f64,
    params: RegressionParams,
) -> Option<(usize, f64, f64)> {
    let n = sample_indices.len();
    let lambda = params.lambda;
    let parent = score(g_total, h_total, lambda);
    let mut best: Option<(usize, f64, f64)> = None;

    for (feat_idx, column) in columns.iter().enumerate() {
        let sorted = sorted_column(column, sample_indices);
        let mut g_left = 0.0;
        let mut h_left = 0.0;

        for i in 0..(n - 1) {
            let (val_i, si) = sorted[i];
            g_left += grad[si];
            h_left += hess[si];

            let val_next = sorted[i + 1].0;
            if val_i == val_next {
                continue;
            }
            let n_left = i + 1;
            if n_left < params.min_samples_leaf || n - n_left < params.min_samples_leaf {
                continue;
            }

            let g_right = g_total - g_left;
            let h_right = h_total - h_left;
            let gain = 0.5 * (score(g_left, h_left, lambda) + score(g_right, h_right, lambda) - parent);

            if gain > best.map_or(0.0, |b| b.2) {
                best = Some((feat_idx, (val_i + val_next) / 2.0, gain));
            }
        }
    }
    best
}
