//! Prediction methods for the Random Forest ensemble.

use rayon::iter::{IntoParallelIterator, ParallelIterator};

use crate::error::TreeError;
use crate::forest::RandomForest;

/// Class probability distribution from a prediction.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassDistribution {
    probs: Vec<f64>,
}

impl ClassDistribution {
    pub(crate) fn new(probs: Vec<f64>) -> Self {
        Self { probs }
    }

    /// Return the predicted class (argmax of probabilities).
    ///
    /// Ties go to the lowest class index.
    #[must_use]
    pub fn predicted_class(&self) -> usize {
        self.probs
            .iter()
            .enumerate()
            .fold((0usize, f64::NEG_INFINITY), |best, (idx, &p)| {
                if p > best.1 {
                    (idx, p)
                } else {
                    best
                }
            })
            .0
    }

    /// Return the probability distribution as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.probs
    }
}

impl RandomForest {
    /// Predict the class label for a single sample.
    ///
    /// Returns the argmax of the averaged probability distribution.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::PredictionFeatureMismatch`] when `sample.len() != n_features`.
    pub fn predict(&self, sample: &[f64]) -> Result<usize, TreeError> {
        Ok(self.predict_proba(sample)?.predicted_class())
    }

    /// Return the averaged class probability distribution for a single sample.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::PredictionFeatureMismatch`] when `sample.len() != n_features`.
    pub fn predict_proba(&self, sample: &[f64]) -> Result<ClassDistribution, TreeError> {
        if sample.len() != self.n_features {
            return Err(TreeError::PredictionFeatureMismatch {
                expected: self.n_features,
                got: sample.len(),
            });
        }

        let mut avg = vec![0.0f64; self.n_classes];
        for tree in &self.trees {
            let proba = tree.predict_proba(sample)?;
            for (acc, p) in avg.iter_mut().zip(proba) {
                *acc += p;
            }
        }
        let n = self.trees.len() as f64;
        avg.iter_mut().for_each(|v| *v /= n);

        Ok(ClassDistribution::new(avg))
    }

    /// Predict class labels for a batch of samples in parallel.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::PredictionFeatureMismatch`] if any sample has the wrong feature count.
    pub fn predict_batch(&self, features: &[Vec<f64>]) -> Result<Vec<usize>, TreeError> {
        features
            .into_par_iter()
            .map(|sample| self.predict(sample))
            .collect()
    }

    /// Return the number of features this forest was trained on.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Return the number of classes.
    #[must_use]
    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    /// Return the number of trees in the ensemble.
    #[must_use]
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

#[cfg(test)]
mod tests {
    use super::ClassDistribution;
    use crate::config::RandomForestConfig;

    #[test]
    fn predicted_class_prefers_lowest_on_tie() {
        let dist = ClassDistribution::new(vec![0.4, 0.4, 0.2]);
        assert_eq!(dist.predicted_class(), 0);
    }

    #[test]
    fn averaged_votes_sum_to_one_and_match_batch() {
        let features: Vec<Vec<f64>> = (0..30).map(|i| vec![i as f64, (i % 3) as f64]).collect();
        let labels: Vec<usize> = (0..30).map(|i| usize::from(i >= 15)).collect();
        let forest = RandomForestConfig::new(10)
            .unwrap()
            .fit(&features, &labels)
            .unwrap();

        let batch = forest.predict_batch(&features).unwrap();
        for (i, sample) in features.iter().enumerate() {
            let proba = forest.predict_proba(sample).unwrap();
            assert_eq!(batch[i], proba.predicted_class());
            let total: f64 = proba.as_slice().iter().sum();
            assert!((total - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn wrong_width_rejected() {
        let features = vec![vec![0.0], vec![1.0], vec![2.0], vec![3.0]];
        let forest = RandomForestConfig::new(3)
            .unwrap()
            .fit(&features, &[0, 0, 1, 1])
            .unwrap();
        assert!(forest.predict(&[1.0, 2.0]).is_err());
    }
}
