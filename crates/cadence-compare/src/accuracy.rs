//! Overall and per-class accuracy, keyed by (model, class).

use cadence_io::{ClassAccuracyEntry, Genre, ModelEntry};
use tracing::{debug, info, instrument};

use crate::confusion::ConfusionMatrix;
use crate::error::CompareError;
use crate::records::PredictionRecord;

/// Accuracy of one model within one true class.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassAccuracy {
    /// True class.
    pub class: Genre,
    /// Correct predictions within the class.
    pub correct: usize,
    /// Rows whose true class is `class`.
    pub support: usize,
    /// `correct / support`.
    pub accuracy: f64,
    /// Share of predictions of this class that were right.
    pub precision: f64,
    /// Share of this class's rows predicted correctly (equals `accuracy`).
    pub recall: f64,
    /// Harmonic mean of precision and recall.
    pub f1: f64,
}

/// Accuracy summary of one model.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelAccuracy {
    /// Model name.
    pub model: String,
    /// Matches over total.
    pub overall: f64,
    /// Number of records.
    pub n_predictions: usize,
    /// One entry per observed true class, class order.
    pub per_class: Vec<ClassAccuracy>,
    /// Labelled confusion matrix.
    pub confusion: ConfusionMatrix,
}

/// Accuracy results of several models.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccuracyTable {
    models: Vec<ModelAccuracy>,
}

impl AccuracyTable {
    /// Per-model summaries, first-seen order.
    #[must_use]
    pub fn models(&self) -> &[ModelAccuracy] {
        &self.models
    }

    /// Summary of one model.
    #[must_use]
    pub fn model(&self, name: &str) -> Option<&ModelAccuracy> {
        self.models.iter().find(|m| m.model == name)
    }

    /// Accuracy of `model` on true class `class`.
    #[must_use]
    pub fn class_accuracy(&self, model: &str, class: &Genre) -> Option<f64> {
        self.model(model)?
            .per_class
            .iter()
            .find(|c| &c.class == class)
            .map(|c| c.accuracy)
    }

    /// Flatten into per-model writer entries.
    #[must_use]
    pub fn model_entries(&self) -> Vec<ModelEntry> {
        self.models
            .iter()
            .map(|m| ModelEntry {
                model: m.model.clone(),
                accuracy: m.overall,
                n_predictions: m.n_predictions,
                classes: m.confusion.classes().iter().map(ToString::to_string).collect(),
                confusion: m.confusion.as_rows().to_vec(),
            })
            .collect()
    }

    /// Flatten into (model, class) writer entries.
    #[must_use]
    pub fn class_entries(&self) -> Vec<ClassAccuracyEntry> {
        self.models
            .iter()
            .flat_map(|m| {
                m.per_class.iter().map(move |c| ClassAccuracyEntry {
                    model: m.model.clone(),
                    class: c.class.to_string(),
                    correct: c.correct,
                    support: c.support,
                    accuracy: c.accuracy,
                    precision: c.precision,
                    recall: c.recall,
                    f1: c.f1,
                })
            })
            .collect()
    }
}

/// Builds an [`AccuracyTable`] from prediction records.
#[derive(Debug, Clone, Copy, Default)]
pub struct AccuracyAggregator;

impl AccuracyAggregator {
    /// Accuracy summary of a single model's records.
    ///
    /// # Errors
    ///
    /// [`CompareError::NoPredictions`] when `records` is empty.
    pub fn summarize(&self, model: &str, records: &[PredictionRecord]) -> Result<ModelAccuracy, CompareError> {
        if records.is_empty() {
            return Err(CompareError::NoPredictions {
                model: model.to_string(),
            });
        }
        let truth: Vec<Genre> = records.iter().map(|r| r.truth.clone()).collect();
        let predicted: Vec<Genre> = records.iter().map(|r| r.predicted.clone()).collect();
        let confusion = ConfusionMatrix::from_labels(&truth, &predicted);

        // Classes that were only ever predicted have no support and no row.
        let per_class = confusion
            .class_metrics()
            .into_iter()
            .filter(|m| m.support > 0)
            .map(|m| {
                let correct = confusion.count(&m.class, &m.class);
                ClassAccuracy {
                    accuracy: correct as f64 / m.support as f64,
                    correct,
                    support: m.support,
                    precision: m.precision,
                    recall: m.recall,
                    f1: m.f1,
                    class: m.class,
                }
            })
            .collect();

        Ok(ModelAccuracy {
            model: model.to_string(),
            overall: confusion.accuracy(),
            n_predictions: records.len(),
            per_class,
            confusion,
        })
    }

    /// Group records by model (first-seen order) and summarize each.
    ///
    /// # Errors
    ///
    /// [`CompareError::NoPredictions`] when `records` is empty.
    #[instrument(skip_all, fields(n_records = records.len()))]
    pub fn aggregate(&self, records: &[PredictionRecord]) -> Result<AccuracyTable, CompareError> {
        if records.is_empty() {
            return Err(CompareError::NoPredictions {
                model: "<any>".to_string(),
            });
        }
        let mut names: Vec<&str> = Vec::new();
        for r in records {
            if !names.contains(&r.model.as_str()) {
                names.push(&r.model);
            }
        }

        let mut models = Vec::with_capacity(names.len());
        for name in names {
            let own: Vec<PredictionRecord> = records.iter().filter(|r| r.model == name).cloned().collect();
            let summary = self.summarize(name, &own)?;
            info!(model = name, accuracy = summary.overall, n = summary.n_predictions, "model accuracy");
            debug!(model = name, "confusion matrix (rows true, columns predicted)\n{}", summary.confusion);
            models.push(summary);
        }
        Ok(AccuracyTable { models })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records(model: &str, pairs: &[(&str, &str)]) -> Vec<PredictionRecord> {
        pairs
            .iter()
            .map(|(t, p)| PredictionRecord {
                truth: Genre::new(*t).unwrap(),
                predicted: Genre::new(*p).unwrap(),
                model: model.to_string(),
            })
            .collect()
    }

    #[test]
    fn majority_predictor() {
        let mut pairs = Vec::new();
        pairs.extend(std::iter::repeat(("a", "a")).take(50));
        pairs.extend(std::iter::repeat(("b", "a")).take(30));
        pairs.extend(std::iter::repeat(("c", "a")).take(20));
        let table = AccuracyAggregator.aggregate(&records("majority", &pairs)).unwrap();

        let m = table.model("majority").unwrap();
        assert!((m.overall - 0.5).abs() < 1e-12);
        assert_eq!(table.class_accuracy("majority", &Genre::new("a").unwrap()), Some(1.0));
        assert_eq!(table.class_accuracy("majority", &Genre::new("b").unwrap()), Some(0.0));
        assert_eq!(table.class_accuracy("majority", &Genre::new("c").unwrap()), Some(0.0));
    }

    #[test]
    fn weighted_per_class_equals_overall() {
        let pairs = [
            ("pop", "pop"),
            ("pop", "rock"),
            ("rock", "rock"),
            ("rock", "rock"),
            ("rock", "rap"),
            ("rap", "rap"),
        ];
        let m = AccuracyAggregator.summarize("m", &records("m", &pairs)).unwrap();
        let weighted: f64 = m
            .per_class
            .iter()
            .map(|c| c.accuracy * c.support as f64)
            .sum::<f64>()
            / m.n_predictions as f64;
        assert!((weighted - m.overall).abs() < 1e-12);
        assert!((m.overall - 4.0 / 6.0).abs() < 1e-12);
    }

    #[test]
    fn only_true_classes_get_per_class_rows() {
        let m = AccuracyAggregator
            .summarize("m", &records("m", &[("pop", "edm"), ("pop", "pop")]))
            .unwrap();
        assert_eq!(m.per_class.len(), 1);
        assert_eq!(m.confusion.n_classes(), 2);
    }

    #[test]
    fn per_class_carries_confusion_breakdown() {
        // rock: predicted 3 times, 2 right; rock rows: 3, 2 right.
        let pairs = [
            ("pop", "pop"),
            ("pop", "rock"),
            ("rock", "rock"),
            ("rock", "rock"),
            ("rock", "rap"),
            ("rap", "rap"),
        ];
        let m = AccuracyAggregator.summarize("m", &records("m", &pairs)).unwrap();
        let rock = m.per_class.iter().find(|c| c.class.as_str() == "rock").unwrap();
        assert!((rock.precision - 2.0 / 3.0).abs() < 1e-12);
        assert!((rock.recall - rock.accuracy).abs() < 1e-12);
        assert!((rock.f1 - 2.0 / 3.0).abs() < 1e-12);

        let rap = m.per_class.iter().find(|c| c.class.as_str() == "rap").unwrap();
        assert!((rap.precision - 0.5).abs() < 1e-12);
        assert!((rap.recall - 1.0).abs() < 1e-12);
        assert!((rap.f1 - 2.0 / 3.0).abs() < 1e-12);

        let table = AccuracyAggregator.aggregate(&records("m", &pairs)).unwrap();
        let entry = table
            .class_entries()
            .into_iter()
            .find(|e| e.class == "rap")
            .unwrap();
        assert!((entry.precision - 0.5).abs() < 1e-12);
    }

    #[test]
    fn models_kept_separate() {
        let mut all = records("tree", &[("a", "a"), ("b", "a")]);
        all.extend(records("forest", &[("a", "a"), ("b", "b")]));
        let table = AccuracyAggregator.aggregate(&all).unwrap();
        assert_eq!(table.models().len(), 2);
        assert_eq!(table.models()[0].model, "tree");
        assert!((table.model("tree").unwrap().overall - 0.5).abs() < 1e-12);
        assert!((table.model("forest").unwrap().overall - 1.0).abs() < 1e-12);
        assert_eq!(table.class_entries().len(), 4);
        assert_eq!(table.model_entries()[1].classes, vec!["a", "b"]);
    }

    #[test]
    fn empty_records_rejected() {
        assert!(matches!(
            AccuracyAggregator.aggregate(&[]),
            Err(CompareError::NoPredictions { .. })
        ));
    }
}
