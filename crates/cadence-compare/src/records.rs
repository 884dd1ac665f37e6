use cadence_io::Genre;
use serde::Serialize;

use crate::error::CompareError;

/// One test-row prediction made by one model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PredictionRecord {
    /// Observed genre.
    pub truth: Genre,
    /// Predicted genre.
    pub predicted: Genre,
    /// Model that made the prediction.
    pub model: String,
}

impl PredictionRecord {
    /// Return `true` when the prediction matches the observed genre.
    #[must_use]
    pub fn is_correct(&self) -> bool {
        self.truth == self.predicted
    }

    /// Pair true and predicted labels row by row.
    ///
    /// # Errors
    ///
    /// [`CompareError::LengthMismatch`] when the slices differ in length.
    pub fn from_predictions(
        model: &str,
        truth: &[Genre],
        predicted: &[Genre],
    ) -> Result<Vec<Self>, CompareError> {
        if truth.len() != predicted.len() {
            return Err(CompareError::LengthMismatch {
                model: model.to_string(),
                n_truth: truth.len(),
                n_predicted: predicted.len(),
            });
        }
        Ok(truth
            .iter()
            .zip(predicted)
            .map(|(t, p)| Self {
                truth: t.clone(),
                predicted: p.clone(),
                model: model.to_string(),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pairs_in_row_order() {
        let truth = vec![Genre::new("pop").unwrap(), Genre::new("rock").unwrap()];
        let pred = vec![Genre::new("pop").unwrap(), Genre::new("pop").unwrap()];
        let records = PredictionRecord::from_predictions("m", &truth, &pred).unwrap();
        assert!(records[0].is_correct());
        assert!(!records[1].is_correct());
        assert_eq!(records[1].truth, Genre::new("rock").unwrap());
    }

    #[test]
    fn length_mismatch_rejected() {
        let err = PredictionRecord::from_predictions("m", &[Genre::new("pop").unwrap()], &[]).unwrap_err();
        assert!(matches!(
            err,
            CompareError::LengthMismatch { n_truth: 1, n_predicted: 0, .. }
        ));
    }
}
