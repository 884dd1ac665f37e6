use cadence_io::FeatureTable;
use tracing::instrument;

use crate::error::PrepError;
use crate::stats::{mean, population_std};

/// Z-score every feature column with its population mean and standard deviation.
///
/// Genres and feature names are carried over unchanged.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`PrepError::TooFewRows`] | The table is empty |
/// | [`PrepError::ConstantColumn`] | A column has zero variance |
#[instrument(skip_all, fields(n_rows = table.n_tracks(), n_features = table.n_features()))]
pub fn standardize(table: &FeatureTable) -> Result<FeatureTable, PrepError> {
    if table.is_empty() {
        return Err(PrepError::TooFewRows {
            operation: "standardize",
            required: 1,
            got: 0,
        });
    }
    let mut moments = Vec::with_capacity(table.n_features());
    for (name, column) in table.feature_names().iter().zip(table.columns()) {
        let m = mean(&column);
        let sd = population_std(&column, m);
        if sd == 0.0 {
            return Err(PrepError::ConstantColumn { name: name.clone() });
        }
        moments.push((m, sd));
    }
    let rows = table
        .rows()
        .iter()
        .map(|row| {
            row.iter()
                .zip(&moments)
                .map(|(v, (m, sd))| (v - m) / sd)
                .collect()
        })
        .collect();
    Ok(FeatureTable::new(
        table.feature_names().to_vec(),
        table.genres().to_vec(),
        rows,
    )?)
}
