//! Domain types for cadence-io.

use std::collections::HashSet;

use crate::IoError;

/// A genre label as it appears in the input table.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize)]
#[serde(transparent)]
pub struct Genre(String);

impl Genre {
    /// Create a genre label from its textual form.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::EmptyGenre`] if the label is empty or only whitespace.
    pub fn new(label: impl Into<String>) -> Result<Self, IoError> {
        let label = label.into();
        if label.trim().is_empty() {
            return Err(IoError::EmptyGenre);
        }
        Ok(Self(label))
    }

    /// Return the label as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Genre {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A validated experiment name for output file naming.
///
/// Must match `[a-zA-Z0-9_-]+`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExperimentName(String);

impl ExperimentName {
    /// Parse and validate an experiment name.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::InvalidExperimentName`] if the name is empty or
    /// contains characters outside `[a-zA-Z0-9_-]`.
    pub fn new(name: String) -> Result<Self, IoError> {
        if name.is_empty()
            || !name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(IoError::InvalidExperimentName { name });
        }
        Ok(Self(name))
    }

    /// Return the experiment name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ExperimentName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Borrowed view of one row of a [`FeatureTable`].
#[derive(Debug, Clone, Copy)]
pub struct Track<'a> {
    /// Genre label of the song.
    pub genre: &'a Genre,
    /// Feature values in the table's column order.
    pub values: &'a [f64],
}

/// An ordered table of tracks sharing one feature schema.
///
/// Genres and feature rows are stored in parallel vectors:
/// `genres[i]` labels `rows[i]`, and `rows[i][j]` is the value of
/// `feature_names[j]`. Every value is finite.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureTable {
    feature_names: Vec<String>,
    genres: Vec<Genre>,
    rows: Vec<Vec<f64>>,
}

impl FeatureTable {
    /// Build a table from parallel vectors.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`IoError::DuplicateFeature`] | A feature name appears twice |
    /// | [`IoError::ShapeMismatch`] | `genres` and `rows` differ in length, or a row has the wrong width |
    /// | [`IoError::NonNumericValue`] | A value is NaN or infinite |
    pub fn new(
        feature_names: Vec<String>,
        genres: Vec<Genre>,
        rows: Vec<Vec<f64>>,
    ) -> Result<Self, IoError> {
        let mut seen: HashSet<&str> = HashSet::with_capacity(feature_names.len());
        for name in &feature_names {
            if !seen.insert(name.as_str()) {
                return Err(IoError::DuplicateFeature { name: name.clone() });
            }
        }
        if genres.len() != rows.len() {
            return Err(IoError::ShapeMismatch {
                reason: format!("{} genres for {} rows", genres.len(), rows.len()),
            });
        }
        for (row_index, row) in rows.iter().enumerate() {
            if row.len() != feature_names.len() {
                return Err(IoError::ShapeMismatch {
                    reason: format!(
                        "row {row_index} has {} values, expected {}",
                        row.len(),
                        feature_names.len()
                    ),
                });
            }
            if let Some(col_index) = row.iter().position(|v| !v.is_finite()) {
                return Err(IoError::NonNumericValue {
                    column: feature_names[col_index].clone(),
                    row_index,
                    raw: row[col_index].to_string(),
                });
            }
        }
        Ok(Self {
            feature_names,
            genres,
            rows,
        })
    }

    /// Return the feature column names.
    #[must_use]
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Return the genre labels, one per row.
    #[must_use]
    pub fn genres(&self) -> &[Genre] {
        &self.genres
    }

    /// Return the feature matrix (row-major).
    #[must_use]
    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    /// Return the number of rows.
    #[must_use]
    pub fn n_tracks(&self) -> usize {
        self.rows.len()
    }

    /// Return the number of feature columns.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }

    /// Return `true` when the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Iterate over rows as [`Track`] views.
    pub fn tracks(&self) -> impl Iterator<Item = Track<'_>> {
        self.genres
            .iter()
            .zip(&self.rows)
            .map(|(genre, values)| Track { genre, values })
    }

    /// Return the position of a feature column.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::UnknownFeature`] if no column has this name.
    pub fn feature_index(&self, name: &str) -> Result<usize, IoError> {
        self.feature_names
            .iter()
            .position(|n| n == name)
            .ok_or_else(|| IoError::UnknownFeature {
                name: name.to_string(),
            })
    }

    /// Copy out one feature column.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::UnknownFeature`] if no column has this name.
    pub fn column(&self, name: &str) -> Result<Vec<f64>, IoError> {
        let idx = self.feature_index(name)?;
        Ok(self.rows.iter().map(|row| row[idx]).collect())
    }

    /// Return the column-major copy of the feature matrix.
    #[must_use]
    pub fn columns(&self) -> Vec<Vec<f64>> {
        (0..self.n_features())
            .map(|j| self.rows.iter().map(|row| row[j]).collect())
            .collect()
    }

    /// Build a new table from the given row positions, in the given order.
    ///
    /// # Panics
    ///
    /// Panics if an index is out of bounds.
    #[must_use]
    pub fn select_rows(&self, indices: &[usize]) -> Self {
        Self {
            feature_names: self.feature_names.clone(),
            genres: indices.iter().map(|&i| self.genres[i].clone()).collect(),
            rows: indices.iter().map(|&i| self.rows[i].clone()).collect(),
        }
    }

    /// Build a new table keeping only rows where `keep[i]` is `true`.
    ///
    /// # Panics
    ///
    /// Panics if `keep.len()` differs from the row count.
    #[must_use]
    pub fn retain_rows(&self, keep: &[bool]) -> Self {
        assert_eq!(keep.len(), self.n_tracks(), "mask length must match row count");
        let indices: Vec<usize> = keep
            .iter()
            .enumerate()
            .filter_map(|(i, &k)| k.then_some(i))
            .collect();
        self.select_rows(&indices)
    }

    /// Build a new table with only the named feature columns, in the given order.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`IoError::UnknownFeature`] | A name is not a column of this table |
    /// | [`IoError::DuplicateFeature`] | A name is requested twice |
    pub fn select_features(&self, names: &[String]) -> Result<Self, IoError> {
        let positions = names
            .iter()
            .map(|n| self.feature_index(n))
            .collect::<Result<Vec<_>, _>>()?;
        let rows = self
            .rows
            .iter()
            .map(|row| positions.iter().map(|&j| row[j]).collect())
            .collect();
        Self::new(names.to_vec(), self.genres.clone(), rows)
    }

    /// Return the distinct genres in sorted order.
    #[must_use]
    pub fn distinct_genres(&self) -> Vec<Genre> {
        let mut genres = self.genres.clone();
        genres.sort();
        genres.dedup();
        genres
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_table() -> FeatureTable {
        FeatureTable::new(
            vec!["energy".into(), "tempo".into(), "valence".into()],
            vec![
                Genre::new("rock").unwrap(),
                Genre::new("pop").unwrap(),
                Genre::new("rock").unwrap(),
            ],
            vec![
                vec![0.9, 120.0, 0.4],
                vec![0.6, 100.0, 0.8],
                vec![0.8, 140.0, 0.3],
            ],
        )
        .unwrap()
    }

    #[test]
    fn genre_rejects_blank_label() {
        assert!(matches!(Genre::new(""), Err(IoError::EmptyGenre)));
        assert!(matches!(Genre::new("  "), Err(IoError::EmptyGenre)));
        assert_eq!(Genre::new("r&b").unwrap().as_str(), "r&b");
    }

    #[test]
    fn experiment_name_valid() {
        let name = ExperimentName::new("genre-run_01".to_string());
        assert_eq!(name.unwrap().as_str(), "genre-run_01");
    }

    #[test]
    fn experiment_name_rejects_special_chars() {
        let name = ExperimentName::new("my run!".to_string());
        assert!(matches!(name, Err(IoError::InvalidExperimentName { .. })));
    }

    #[test]
    fn column_lookup_by_name() {
        let table = small_table();
        assert_eq!(table.column("tempo").unwrap(), vec![120.0, 100.0, 140.0]);
        assert!(matches!(
            table.column("loudness"),
            Err(IoError::UnknownFeature { .. })
        ));
    }

    #[test]
    fn select_features_reorders_columns() {
        let table = small_table();
        let projected = table
            .select_features(&["valence".to_string(), "energy".to_string()])
            .unwrap();
        assert_eq!(projected.feature_names(), &["valence", "energy"]);
        assert_eq!(projected.rows()[1], vec![0.8, 0.6]);
        assert_eq!(projected.genres(), table.genres());
    }

    #[test]
    fn retain_rows_keeps_order() {
        let table = small_table();
        let kept = table.retain_rows(&[true, false, true]);
        assert_eq!(kept.n_tracks(), 2);
        assert_eq!(kept.genres()[1].as_str(), "rock");
        assert_eq!(kept.rows()[1][1], 140.0);
    }

    #[test]
    fn duplicate_feature_rejected() {
        let err = FeatureTable::new(
            vec!["tempo".into(), "tempo".into()],
            vec![Genre::new("pop").unwrap()],
            vec![vec![1.0, 2.0]],
        )
        .unwrap_err();
        assert!(matches!(err, IoError::DuplicateFeature { .. }));
    }

    #[test]
    fn non_finite_value_rejected() {
        let err = FeatureTable::new(
            vec!["tempo".into()],
            vec![Genre::new("pop").unwrap()],
            vec![vec![f64::INFINITY]],
        )
        .unwrap_err();
        assert!(matches!(err, IoError::NonNumericValue { row_index: 0, .. }));
    }

    #[test]
    fn distinct_genres_sorted() {
        let table = small_table();
        let genres = table.distinct_genres();
        assert_eq!(genres, vec![Genre::new("pop").unwrap(), Genre::new("rock").unwrap()]);
    }
}
