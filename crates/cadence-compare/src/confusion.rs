//! Labelled confusion matrix and per-class classification metrics.

use std::fmt;

use cadence_io::Genre;

/// A confusion matrix over genre labels.
///
/// `matrix[t][p]` counts rows whose true genre is `classes[t]` and whose
/// predicted genre is `classes[p]`. Classes are the sorted union of every
/// true and predicted label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfusionMatrix {
    classes: Vec<Genre>,
    matrix: Vec<Vec<usize>>,
}

/// Per-class precision, recall, and F1 score.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassMetrics {
    /// The class label.
    pub class: Genre,
    /// Precision: TP / (TP + FP). 0.0 if no predictions for this class.
    pub precision: f64,
    /// Recall: TP / (TP + FN). 0.0 if no true samples for this class.
    pub recall: f64,
    /// F1: 2 * precision * recall / (precision + recall). 0.0 if both are zero.
    pub f1: f64,
    /// Number of true samples in this class.
    pub support: usize,
}

impl ConfusionMatrix {
    /// Build a matrix from paired true and predicted labels.
    ///
    /// Pairs beyond the shorter slice are ignored; callers check lengths.
    #[must_use]
    pub fn from_labels(truth: &[Genre], predicted: &[Genre]) -> Self {
        let mut classes: Vec<Genre> = truth.iter().chain(predicted).cloned().collect();
        classes.sort();
        classes.dedup();

        let n = classes.len();
        let mut matrix = vec![vec![0usize; n]; n];
        for (t, p) in truth.iter().zip(predicted) {
            // Both labels are in `classes` by construction.
            let (Ok(ti), Ok(pi)) = (classes.binary_search(t), classes.binary_search(p)) else {
                continue;
            };
            matrix[ti][pi] += 1;
        }
        Self { classes, matrix }
    }

    /// Overall accuracy: proportion of correct predictions.
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        let correct: usize = (0..self.n_classes()).map(|i| self.matrix[i][i]).sum();
        let total = self.total();
        if total == 0 {
            0.0
        } else {
            correct as f64 / total as f64
        }
    }

    /// Number of counted pairs.
    #[must_use]
    pub fn total(&self) -> usize {
        self.matrix.iter().flatten().sum()
    }

    /// Count of rows with true class `truth` predicted as `predicted`.
    #[must_use]
    pub fn count(&self, truth: &Genre, predicted: &Genre) -> usize {
        match (self.classes.binary_search(truth), self.classes.binary_search(predicted)) {
            (Ok(t), Ok(p)) => self.matrix[t][p],
            _ => 0,
        }
    }

    /// Per-class precision, recall, F1, and support, in class order.
    #[must_use]
    pub fn class_metrics(&self) -> Vec<ClassMetrics> {
        let n = self.n_classes();
        (0..n)
            .map(|c| {
                let tp = self.matrix[c][c];
                let fp: usize = (0..n).filter(|&i| i != c).map(|i| self.matrix[i][c]).sum();
                let fn_: usize = (0..n).filter(|&j| j != c).map(|j| self.matrix[c][j]).sum();
                let support = tp + fn_;
                let precision = if tp + fp == 0 {
                    0.0
                } else {
                    tp as f64 / (tp + fp) as f64
                };
                let recall = if support == 0 {
                    0.0
                } else {
                    tp as f64 / support as f64
                };
                let f1 = if precision + recall == 0.0 {
                    0.0
                } else {
                    2.0 * precision * recall / (precision + recall)
                };
                ClassMetrics {
                    class: self.classes[c].clone(),
                    precision,
                    recall,
                    f1,
                    support,
                }
            })
            .collect()
    }

    /// Class labels indexing rows and columns.
    #[must_use]
    pub fn classes(&self) -> &[Genre] {
        &self.classes
    }

    /// Return the underlying matrix rows.
    #[must_use]
    pub fn as_rows(&self) -> &[Vec<usize>] {
        &self.matrix
    }

    /// Return the number of classes.
    #[must_use]
    pub fn n_classes(&self) -> usize {
        self.classes.len()
    }
}

impl fmt::Display for ConfusionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .classes
            .iter()
            .map(|c| c.as_str().len())
            .max()
            .unwrap_or(0)
            .max(5);

        write!(f, "{:>width$}", "")?;
        for class in &self.classes {
            write!(f, " {:>width$}", class.as_str())?;
        }
        writeln!(f)?;

        for (class, row) in self.classes.iter().zip(&self.matrix) {
            write!(f, "{:>width$}", class.as_str())?;
            for val in row {
                write!(f, " {val:>width$}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn genres(list: &[&str]) -> Vec<Genre> {
        list.iter().map(|s| Genre::new(*s).unwrap()).collect()
    }

    #[test]
    fn perfect_predictions() {
        let labels = genres(&["pop", "pop", "rap", "rap", "rock", "rock"]);
        let cm = ConfusionMatrix::from_labels(&labels, &labels);
        assert!((cm.accuracy() - 1.0).abs() < f64::EPSILON);
        for m in cm.class_metrics() {
            assert!((m.precision - 1.0).abs() < f64::EPSILON);
            assert!((m.recall - 1.0).abs() < f64::EPSILON);
            assert!((m.f1 - 1.0).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn known_confusion_matrix() {
        let truth = genres(&["a", "a", "a", "b", "b", "b", "c", "c", "c"]);
        let pred = genres(&["a", "a", "b", "b", "b", "c", "c", "c", "a"]);
        let cm = ConfusionMatrix::from_labels(&truth, &pred);

        let metrics = cm.class_metrics();
        assert!((metrics[0].precision - 2.0 / 3.0).abs() < 1e-10);
        assert!((metrics[0].recall - 2.0 / 3.0).abs() < 1e-10);
        assert_eq!(metrics[0].support, 3);
        assert!((cm.accuracy() - 6.0 / 9.0).abs() < 1e-10);
        assert_eq!(cm.count(&Genre::new("c").unwrap(), &Genre::new("a").unwrap()), 1);
    }

    #[test]
    fn classes_are_union_of_truth_and_predictions() {
        let truth = genres(&["rock", "rock"]);
        let pred = genres(&["rock", "edm"]);
        let cm = ConfusionMatrix::from_labels(&truth, &pred);
        assert_eq!(cm.classes(), genres(&["edm", "rock"]).as_slice());
        assert_eq!(cm.as_rows(), &[vec![0, 0], vec![1, 1]]);
        let edm = &cm.class_metrics()[0];
        assert_eq!(edm.support, 0);
        assert!(edm.recall.abs() < f64::EPSILON);
    }

    #[test]
    fn display_has_labels() {
        let labels = genres(&["latin", "pop"]);
        let output = format!("{}", ConfusionMatrix::from_labels(&labels, &labels));
        assert!(output.contains("latin"));
        assert!(output.contains("pop"));
    }
}
