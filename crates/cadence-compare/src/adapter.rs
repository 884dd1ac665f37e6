//! The adapter contract every classifier family implements, plus the
//! schema bookkeeping shared by the tree-based adapters.

use std::collections::HashSet;

use cadence_io::{FeatureTable, Genre};

use crate::error::ModelError;
use crate::importance::RawImportance;

/// Uniform fit / predict / importance surface over one model family.
///
/// Hyperparameters (seed included) live in the adapter value, so the same
/// adapter and training table always yield the same model.
pub trait ClassifierAdapter: Sync {
    /// Fitted model artifact. Opaque to the pipeline.
    type Model: Send + Sync;

    /// Stable identifier used to key records and tables.
    fn name(&self) -> &str;

    /// Fit a model on `train`.
    ///
    /// # Errors
    ///
    /// [`ModelError::Training`] when `train` has fewer than 2 distinct
    /// genres or zero feature columns.
    fn fit(&self, train: &FeatureTable) -> Result<Self::Model, ModelError>;

    /// Predict one genre per row of `test`, in row order.
    ///
    /// # Errors
    ///
    /// [`ModelError::Inference`] when the feature-name set of `test` differs
    /// from the one seen at fit time. A reordering of the same set is accepted.
    fn predict(&self, model: &Self::Model, test: &FeatureTable) -> Result<Vec<Genre>, ModelError>;

    /// Non-negative importance for every fitted feature.
    fn feature_importance(&self, model: &Self::Model) -> RawImportance;
}

/// Feature order and genre encoding captured at fit time.
#[derive(Debug, Clone, PartialEq)]
pub struct FittedSchema {
    feature_names: Vec<String>,
    classes: Vec<Genre>,
}

impl FittedSchema {
    /// Capture the schema of `train` and encode its genres as class indices.
    ///
    /// Classes are the sorted distinct genres.
    ///
    /// # Errors
    ///
    /// [`ModelError::Training`] with fewer than 2 classes or zero features.
    pub fn from_training(model: &str, train: &FeatureTable) -> Result<(Self, Vec<usize>), ModelError> {
        if train.n_features() == 0 {
            return Err(ModelError::Training {
                model: model.to_string(),
                reason: "training table has zero feature columns".to_string(),
            });
        }
        let classes = train.distinct_genres();
        if classes.len() < 2 {
            return Err(ModelError::Training {
                model: model.to_string(),
                reason: format!("need at least 2 distinct genres, got {}", classes.len()),
            });
        }
        let labels = train
            .genres()
            .iter()
            .map(|g| classes.binary_search(g).unwrap_or_default())
            .collect();
        Ok((
            Self {
                feature_names: train.feature_names().to_vec(),
                classes,
            },
            labels,
        ))
    }

    /// Feature names in fit order.
    #[must_use]
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Genres indexed by class id.
    #[must_use]
    pub fn classes(&self) -> &[Genre] {
        &self.classes
    }

    /// Rows of `test` with columns rearranged into fit order.
    ///
    /// # Errors
    ///
    /// [`ModelError::Inference`] when the feature-name sets differ.
    pub fn align(&self, model: &str, test: &FeatureTable) -> Result<Vec<Vec<f64>>, ModelError> {
        let expected: HashSet<&str> = self.feature_names.iter().map(String::as_str).collect();
        let got: HashSet<&str> = test.feature_names().iter().map(String::as_str).collect();
        if expected != got || test.n_features() != self.feature_names.len() {
            let mut missing: Vec<&str> = expected.difference(&got).copied().collect();
            let mut extra: Vec<&str> = got.difference(&expected).copied().collect();
            missing.sort_unstable();
            extra.sort_unstable();
            return Err(ModelError::Inference {
                model: model.to_string(),
                reason: format!("feature mismatch: missing {missing:?}, unexpected {extra:?}"),
            });
        }
        if test.feature_names() == self.feature_names.as_slice() {
            return Ok(test.rows().to_vec());
        }
        let reordered = test
            .select_features(&self.feature_names)
            .map_err(|e| ModelError::Inference {
                model: model.to_string(),
                reason: e.to_string(),
            })?;
        Ok(reordered.rows().to_vec())
    }

    /// Map class ids back to genres.
    #[must_use]
    pub fn decode(&self, class_ids: &[usize]) -> Vec<Genre> {
        class_ids.iter().map(|&c| self.classes[c].clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn train() -> FeatureTable {
        FeatureTable::new(
            vec!["energy".into(), "tempo".into()],
            vec![
                Genre::new("rock").unwrap(),
                Genre::new("pop").unwrap(),
                Genre::new("rock").unwrap(),
            ],
            vec![vec![0.9, 120.0], vec![0.4, 100.0], vec![0.8, 130.0]],
        )
        .unwrap()
    }

    #[test]
    fn labels_follow_sorted_classes() {
        let (schema, labels) = FittedSchema::from_training("m", &train()).unwrap();
        assert_eq!(schema.classes(), &[Genre::new("pop").unwrap(), Genre::new("rock").unwrap()]);
        assert_eq!(labels, vec![1, 0, 1]);
        assert_eq!(schema.decode(&[0, 1]), vec![Genre::new("pop").unwrap(), Genre::new("rock").unwrap()]);
    }

    #[test]
    fn single_class_is_training_error() {
        let table = train().select_rows(&[0, 2]);
        let err = FittedSchema::from_training("m", &table).unwrap_err();
        assert!(matches!(err, ModelError::Training { .. }));
    }

    #[test]
    fn zero_features_is_training_error() {
        let table = train().select_features(&[]).unwrap();
        let err = FittedSchema::from_training("m", &table).unwrap_err();
        assert!(matches!(err, ModelError::Training { .. }));
    }

    #[test]
    fn reordered_columns_are_realigned() {
        let (schema, _) = FittedSchema::from_training("m", &train()).unwrap();
        let swapped = train()
            .select_features(&["tempo".to_string(), "energy".to_string()])
            .unwrap();
        let rows = schema.align("m", &swapped).unwrap();
        assert_eq!(rows[0], vec![0.9, 120.0]);
    }

    #[test]
    fn different_feature_set_is_inference_error() {
        let (schema, _) = FittedSchema::from_training("m", &train()).unwrap();
        let narrower = train().select_features(&["energy".to_string()]).unwrap();
        let err = schema.align("m", &narrower).unwrap_err();
        assert!(matches!(err, ModelError::Inference { .. }));
    }
}
