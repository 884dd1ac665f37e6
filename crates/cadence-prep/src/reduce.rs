//! Static feature exclusion.

use cadence_io::FeatureTable;
use tracing::{debug, instrument};

use crate::error::PrepError;

/// Feature excluded by default (strongly correlated with `energy`).
pub const DEFAULT_EXCLUDED: &[&str] = &["loudness"];

/// Drops a configured set of feature names.
///
/// An explicit list from [`FeatureReducer::new`] must name loaded features.
/// The [`Default`] reducer carries [`DEFAULT_EXCLUDED`] and skips any of those
/// names the table never loaded.
#[derive(Debug, Clone)]
pub struct FeatureReducer {
    excluded: Vec<String>,
    skip_absent: bool,
}

impl FeatureReducer {
    /// Create a reducer that removes `excluded`.
    #[must_use]
    pub fn new(excluded: Vec<String>) -> Self {
        Self {
            excluded,
            skip_absent: false,
        }
    }

    /// Return the exclusions that apply to `names`, in exclusion-list order.
    #[must_use]
    pub fn removed(&self, names: &[String]) -> Vec<String> {
        self.excluded
            .iter()
            .filter(|e| names.contains(*e))
            .cloned()
            .collect()
    }

    /// Return `names` minus the exclusions, first-occurrence order, no duplicates.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`PrepError::UnknownExclusion`] | An explicitly excluded name is not in `names` |
    /// | [`PrepError::NoFeaturesLeft`] | Nothing remains |
    pub fn reduce(&self, names: &[String]) -> Result<Vec<String>, PrepError> {
        if let Some(unknown) = self.excluded.iter().find(|e| !names.contains(*e)) {
            if !self.skip_absent {
                return Err(PrepError::UnknownExclusion {
                    name: unknown.clone(),
                });
            }
            debug!(name = %unknown, "default exclusion not loaded, skipped");
        }
        let mut kept: Vec<String> = Vec::with_capacity(names.len());
        for name in names {
            if !self.excluded.contains(name) && !kept.contains(name) {
                kept.push(name.clone());
            }
        }
        if kept.is_empty() {
            return Err(PrepError::NoFeaturesLeft {
                n_excluded: self.excluded.len(),
            });
        }
        Ok(kept)
    }

    /// Project `table` onto the reduced feature list.
    ///
    /// # Errors
    ///
    /// Same as [`FeatureReducer::reduce`].
    #[instrument(skip_all, fields(n_features = table.n_features(), n_excluded = self.excluded.len()))]
    pub fn apply(&self, table: &FeatureTable) -> Result<FeatureTable, PrepError> {
        let kept = self.reduce(table.feature_names())?;
        debug!(kept = ?kept, "features retained");
        Ok(table.select_features(&kept)?)
    }
}

impl Default for FeatureReducer {
    fn default() -> Self {
        Self {
            excluded: DEFAULT_EXCLUDED.iter().map(|s| (*s).to_string()).collect(),
            skip_absent: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use cadence_io::Genre;

    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn removes_exclusions_preserving_order() {
        let reducer = FeatureReducer::new(names(&["loudness"]));
        let out = reducer
            .reduce(&names(&["energy", "loudness", "tempo", "valence"]))
            .unwrap();
        assert_eq!(out, names(&["energy", "tempo", "valence"]));
    }

    #[test]
    fn duplicates_removed() {
        let reducer = FeatureReducer::new(vec![]);
        let out = reducer.reduce(&names(&["a", "b", "a", "c", "b"])).unwrap();
        assert_eq!(out, names(&["a", "b", "c"]));
    }

    #[test]
    fn unknown_exclusion_is_error() {
        let reducer = FeatureReducer::new(names(&["loudnes"]));
        let err = reducer.reduce(&names(&["energy", "loudness"])).unwrap_err();
        assert!(matches!(err, PrepError::UnknownExclusion { name } if name == "loudnes"));
    }

    #[test]
    fn default_exclusion_skips_unloaded_feature() {
        let loaded = names(&["danceability", "energy", "duration"]);
        let reducer = FeatureReducer::default();
        assert_eq!(reducer.reduce(&loaded).unwrap(), loaded);
        assert!(reducer.removed(&loaded).is_empty());
    }

    #[test]
    fn explicit_exclusion_of_default_name_stays_strict() {
        let reducer = FeatureReducer::new(names(&["loudness"]));
        let err = reducer.reduce(&names(&["danceability", "energy"])).unwrap_err();
        assert!(matches!(err, PrepError::UnknownExclusion { name } if name == "loudness"));
    }

    #[test]
    fn removed_lists_applied_exclusions() {
        let reducer = FeatureReducer::default();
        assert_eq!(
            reducer.removed(&names(&["energy", "loudness"])),
            names(&["loudness"])
        );
    }

    #[test]
    fn excluding_everything_is_error() {
        let reducer = FeatureReducer::new(names(&["a", "b"]));
        let err = reducer.reduce(&names(&["a", "b"])).unwrap_err();
        assert!(matches!(err, PrepError::NoFeaturesLeft { n_excluded: 2 }));
    }

    #[test]
    fn apply_projects_table() {
        let table = FeatureTable::new(
            names(&["energy", "loudness", "tempo"]),
            vec![Genre::new("pop").unwrap()],
            vec![vec![0.7, -5.0, 120.0]],
        )
        .unwrap();
        let reduced = FeatureReducer::default().apply(&table).unwrap();
        assert_eq!(reduced.feature_names(), names(&["energy", "tempo"]).as_slice());
        assert_eq!(reduced.rows()[0], vec![0.7, 120.0]);
    }
}
