//! Descriptive statistics used to pick features before modelling.

use cadence_io::FeatureTable;
use serde::Serialize;
use tracing::{debug, instrument};

use crate::error::PrepError;
use crate::stats::{mean, population_std, quantile_sorted, sorted_copy};

/// Six-number summary of one feature column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureSummary {
    /// Feature name.
    pub feature: String,
    /// Minimum.
    pub min: f64,
    /// First quartile (type 7).
    pub q1: f64,
    /// Median.
    pub median: f64,
    /// Arithmetic mean.
    pub mean: f64,
    /// Third quartile (type 7).
    pub q3: f64,
    /// Maximum.
    pub max: f64,
}

/// A feature pair and its Pearson correlation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelatedPair {
    /// First feature (earlier column).
    pub a: String,
    /// Second feature.
    pub b: String,
    /// Pearson r.
    pub r: f64,
}

/// Square, symmetric Pearson correlation matrix over a table's features.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationMatrix {
    feature_names: Vec<String>,
    values: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    /// Feature names labelling rows and columns.
    #[must_use]
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Row-major matrix values.
    #[must_use]
    pub fn values(&self) -> &[Vec<f64>] {
        &self.values
    }

    /// Correlation between two named features, if both exist.
    #[must_use]
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.feature_names.iter().position(|n| n == a)?;
        let j = self.feature_names.iter().position(|n| n == b)?;
        Some(self.values[i][j])
    }
}

/// Summarize every feature column.
///
/// # Errors
///
/// Returns [`PrepError::TooFewRows`] when the table is empty.
#[instrument(skip_all, fields(n_rows = table.n_tracks(), n_features = table.n_features()))]
pub fn summarize(table: &FeatureTable) -> Result<Vec<FeatureSummary>, PrepError> {
    if table.is_empty() {
        return Err(PrepError::TooFewRows {
            operation: "summarize",
            required: 1,
            got: 0,
        });
    }
    let summaries = table
        .feature_names()
        .iter()
        .zip(table.columns())
        .map(|(name, column)| {
            let sorted = sorted_copy(&column);
            FeatureSummary {
                feature: name.clone(),
                min: sorted[0],
                q1: quantile_sorted(&sorted, 0.25),
                median: quantile_sorted(&sorted, 0.5),
                mean: mean(&column),
                q3: quantile_sorted(&sorted, 0.75),
                max: sorted[sorted.len() - 1],
            }
        })
        .collect();
    Ok(summaries)
}

/// Pearson correlation between every pair of features.
///
/// A constant column correlates 0 with everything, itself included.
///
/// # Errors
///
/// Returns [`PrepError::TooFewRows`] with fewer than 2 rows.
#[instrument(skip_all, fields(n_rows = table.n_tracks(), n_features = table.n_features()))]
pub fn correlation_matrix(table: &FeatureTable) -> Result<CorrelationMatrix, PrepError> {
    let n = table.n_tracks();
    if n < 2 {
        return Err(PrepError::TooFewRows {
            operation: "correlation matrix",
            required: 2,
            got: n,
        });
    }
    let centered: Vec<(Vec<f64>, f64)> = table
        .columns()
        .into_iter()
        .map(|column| {
            let m = mean(&column);
            let sd = population_std(&column, m);
            (column.into_iter().map(|v| v - m).collect(), sd)
        })
        .collect();

    let p = centered.len();
    let mut values = vec![vec![0.0; p]; p];
    for i in 0..p {
        for j in i..p {
            let (ci, sdi) = &centered[i];
            let (cj, sdj) = &centered[j];
            let r = if *sdi == 0.0 || *sdj == 0.0 {
                0.0
            } else {
                let cov = ci.iter().zip(cj).map(|(a, b)| a * b).sum::<f64>() / n as f64;
                (cov / (sdi * sdj)).clamp(-1.0, 1.0)
            };
            values[i][j] = r;
            values[j][i] = r;
        }
    }
    debug!(n_pairs = p * p.saturating_sub(1) / 2, "correlation matrix computed");
    Ok(CorrelationMatrix {
        feature_names: table.feature_names().to_vec(),
        values,
    })
}

/// Off-diagonal pairs with `|r| >= threshold`, strongest first.
#[must_use]
pub fn correlated_pairs(matrix: &CorrelationMatrix, threshold: f64) -> Vec<CorrelatedPair> {
    let names = matrix.feature_names();
    let mut pairs: Vec<CorrelatedPair> = Vec::new();
    for i in 0..names.len() {
        for j in (i + 1)..names.len() {
            let r = matrix.values[i][j];
            if r.abs() >= threshold {
                pairs.push(CorrelatedPair {
                    a: names[i].clone(),
                    b: names[j].clone(),
                    r,
                });
            }
        }
    }
    pairs.sort_by(|x, y| y.r.abs().total_cmp(&x.r.abs()));
    pairs
}

#[cfg(test)]
mod tests {
    use cadence_io::Genre;

    use super::*;

    fn table() -> FeatureTable {
        FeatureTable::new(
            vec!["energy".into(), "loudness".into(), "valence".into(), "mode".into()],
            vec![Genre::new("pop").unwrap(); 5],
            vec![
                vec![0.1, -20.0, 0.9, 1.0],
                vec![0.3, -15.0, 0.2, 1.0],
                vec![0.5, -10.0, 0.7, 1.0],
                vec![0.7, -5.0, 0.4, 1.0],
                vec![0.9, 0.0, 0.5, 1.0],
            ],
        )
        .unwrap()
    }

    #[test]
    fn summary_of_known_column() {
        let summaries = summarize(&table()).unwrap();
        let energy = &summaries[0];
        assert_eq!(energy.feature, "energy");
        assert!((energy.min - 0.1).abs() < 1e-12);
        assert!((energy.q1 - 0.3).abs() < 1e-12);
        assert!((energy.median - 0.5).abs() < 1e-12);
        assert!((energy.mean - 0.5).abs() < 1e-12);
        assert!((energy.q3 - 0.7).abs() < 1e-12);
        assert!((energy.max - 0.9).abs() < 1e-12);
    }

    #[test]
    fn perfectly_correlated_pair_detected() {
        let matrix = correlation_matrix(&table()).unwrap();
        assert!((matrix.get("energy", "loudness").unwrap() - 1.0).abs() < 1e-12);
        assert!((matrix.get("energy", "energy").unwrap() - 1.0).abs() < 1e-12);
        assert_eq!(matrix.get("mode", "energy"), Some(0.0));
        assert_eq!(matrix.get("energy", "missing"), None);

        let pairs = correlated_pairs(&matrix, 0.8);
        assert_eq!(pairs.len(), 1);
        assert_eq!((pairs[0].a.as_str(), pairs[0].b.as_str()), ("energy", "loudness"));
    }

    #[test]
    fn matrix_is_symmetric() {
        let matrix = correlation_matrix(&table()).unwrap();
        let v = matrix.values();
        for i in 0..v.len() {
            for j in 0..v.len() {
                assert!((v[i][j] - v[j][i]).abs() < 1e-15);
            }
        }
    }

    #[test]
    fn pairs_sorted_by_strength() {
        let matrix = correlation_matrix(&table()).unwrap();
        let pairs = correlated_pairs(&matrix, 0.0);
        assert!(pairs.windows(2).all(|w| w[0].r.abs() >= w[1].r.abs()));
        assert_eq!(pairs.len(), 6);
    }

    #[test]
    fn too_few_rows() {
        let single = table().select_rows(&[0]);
        assert!(matches!(
            correlation_matrix(&single),
            Err(PrepError::TooFewRows { required: 2, got: 1, .. })
        ));
    }
}
