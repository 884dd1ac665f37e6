//! Variance explained by the principal components of the standardized features.

use cadence_io::FeatureTable;
use nalgebra::{DMatrix, SymmetricEigen};
use serde::Serialize;
use tracing::{info, instrument};

use crate::error::PrepError;
use crate::scale::standardize;

/// One principal component.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrincipalComponent {
    /// 1-based component number, ordered by eigenvalue descending.
    pub component: usize,
    /// Variance along the component.
    pub eigenvalue: f64,
    /// Share of total variance.
    pub proportion: f64,
    /// Running share of total variance up to this component.
    pub cumulative: f64,
    /// Unit eigenvector, one weight per feature. The largest-magnitude weight is positive.
    pub loadings: Vec<f64>,
}

/// Components of a table's standardized covariance matrix.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VarianceExplained {
    /// Features the loadings refer to.
    pub feature_names: Vec<String>,
    /// Components, eigenvalue descending.
    pub components: Vec<PrincipalComponent>,
}

impl VarianceExplained {
    /// Smallest number of components whose cumulative share reaches `share`.
    #[must_use]
    pub fn components_for(&self, share: f64) -> usize {
        self.components
            .iter()
            .position(|c| c.cumulative >= share)
            .map_or(self.components.len(), |i| i + 1)
    }
}

/// Sample covariance matrix (divisor `n - 1`) of the feature columns.
///
/// # Errors
///
/// Returns [`PrepError::TooFewRows`] with fewer than 2 rows.
pub fn covariance(table: &FeatureTable) -> Result<Vec<Vec<f64>>, PrepError> {
    let n = table.n_tracks();
    if n < 2 {
        return Err(PrepError::TooFewRows {
            operation: "covariance",
            required: 2,
            got: n,
        });
    }
    let centered: Vec<Vec<f64>> = table
        .columns()
        .into_iter()
        .map(|column| {
            let m = column.iter().sum::<f64>() / n as f64;
            column.into_iter().map(|v| v - m).collect()
        })
        .collect();
    let p = centered.len();
    let mut cov = vec![vec![0.0; p]; p];
    for i in 0..p {
        for j in i..p {
            let c = centered[i]
                .iter()
                .zip(&centered[j])
                .map(|(a, b)| a * b)
                .sum::<f64>()
                / (n - 1) as f64;
            cov[i][j] = c;
            cov[j][i] = c;
        }
    }
    Ok(cov)
}

/// Standardize, take the covariance, and decompose it.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`PrepError::TooFewRows`] | Fewer than 2 rows |
/// | [`PrepError::ConstantColumn`] | A column has zero variance |
#[instrument(skip_all, fields(n_rows = table.n_tracks(), n_features = table.n_features()))]
pub fn variance_explained(table: &FeatureTable) -> Result<VarianceExplained, PrepError> {
    if table.n_tracks() < 2 {
        return Err(PrepError::TooFewRows {
            operation: "variance explained",
            required: 2,
            got: table.n_tracks(),
        });
    }
    let scaled = standardize(table)?;
    let cov = covariance(&scaled)?;
    let p = cov.len();

    let eigen = SymmetricEigen::new(DMatrix::from_fn(p, p, |i, j| cov[i][j]));

    let mut order: Vec<usize> = (0..p).collect();
    order.sort_by(|&a, &b| eigen.eigenvalues[b].total_cmp(&eigen.eigenvalues[a]));

    // Round-off can push tiny eigenvalues below zero.
    let total: f64 = eigen.eigenvalues.iter().map(|v| v.max(0.0)).sum();
    let mut cumulative = 0.0;
    let components = order
        .iter()
        .enumerate()
        .map(|(rank, &idx)| {
            let eigenvalue = eigen.eigenvalues[idx].max(0.0);
            let proportion = if total > 0.0 { eigenvalue / total } else { 0.0 };
            cumulative += proportion;
            let mut loadings: Vec<f64> = eigen.eigenvectors.column(idx).iter().copied().collect();
            let dominant = loadings
                .iter()
                .copied()
                .fold(0.0f64, |best, v| if v.abs() > best.abs() { v } else { best });
            if dominant < 0.0 {
                loadings.iter_mut().for_each(|v| *v = -*v);
            }
            PrincipalComponent {
                component: rank + 1,
                eigenvalue,
                proportion,
                cumulative,
                loadings,
            }
        })
        .collect::<Vec<_>>();

    info!(
        n_components = components.len(),
        first_proportion = components.first().map(|c| c.proportion),
        "variance explained computed"
    );
    Ok(VarianceExplained {
        feature_names: table.feature_names().to_vec(),
        components,
    })
}
