//! Decision tree, random forest, and gradient boosting behind [`ClassifierAdapter`].

use cadence_io::{FeatureTable, Genre};
use cadence_trees::{
    DecisionTree, DecisionTreeConfig, GradientBoostedTrees, GradientBoostingConfig, RandomForest,
    RandomForestConfig, TreeError,
};
use tracing::{debug, instrument};

use crate::adapter::{ClassifierAdapter, FittedSchema};
use crate::error::ModelError;
use crate::importance::RawImportance;

fn engine_error(model: &str) -> impl Fn(TreeError) -> ModelError + '_ {
    move |source| ModelError::Engine {
        model: model.to_string(),
        source,
    }
}

/// A fitted model together with the schema it was trained under.
#[derive(Debug, Clone)]
pub struct Fitted<M> {
    schema: FittedSchema,
    model: M,
}

impl<M> Fitted<M> {
    /// Schema captured at fit time.
    #[must_use]
    pub fn schema(&self) -> &FittedSchema {
        &self.schema
    }

    /// The engine model.
    #[must_use]
    pub fn model(&self) -> &M {
        &self.model
    }
}

/// Single CART tree with Gini splits; importance is mean decrease in impurity.
#[derive(Debug, Clone)]
pub struct TreeAdapter {
    config: DecisionTreeConfig,
}

impl TreeAdapter {
    /// Name used in records and tables.
    pub const NAME: &'static str = "decision_tree";

    /// Wrap a tree config.
    #[must_use]
    pub fn new(config: DecisionTreeConfig) -> Self {
        Self { config }
    }
}

impl Default for TreeAdapter {
    fn default() -> Self {
        Self::new(DecisionTreeConfig::new())
    }
}

impl ClassifierAdapter for TreeAdapter {
    type Model = Fitted<DecisionTree>;

    fn name(&self) -> &str {
        Self::NAME
    }

    #[instrument(skip_all, fields(model = Self::NAME, n_rows = train.n_tracks(), n_features = train.n_features()))]
    fn fit(&self, train: &FeatureTable) -> Result<Self::Model, ModelError> {
        let (schema, labels) = FittedSchema::from_training(Self::NAME, train)?;
        let model = self
            .config
            .fit(train.rows(), &labels)
            .map_err(engine_error(Self::NAME))?;
        debug!(
            n_nodes = model.n_nodes(),
            n_leaves = model.n_leaves(),
            depth = model.depth(),
            "decision tree fitted"
        );
        Ok(Fitted { schema, model })
    }

    fn predict(&self, model: &Self::Model, test: &FeatureTable) -> Result<Vec<Genre>, ModelError> {
        let rows = model.schema.align(Self::NAME, test)?;
        let ids = model
            .model
            .predict_batch(&rows)
            .map_err(engine_error(Self::NAME))?;
        Ok(model.schema.decode(&ids))
    }

    fn feature_importance(&self, model: &Self::Model) -> RawImportance {
        RawImportance::ImpurityDecrease(RawImportance::zip(
            model.schema.feature_names(),
            &model.model.feature_importances(),
        ))
    }
}

/// Bagged CART trees with per-split feature subsampling; importance is MDI
/// averaged over trees.
#[derive(Debug, Clone)]
pub struct ForestAdapter {
    config: RandomForestConfig,
}

impl ForestAdapter {
    /// Name used in records and tables.
    pub const NAME: &'static str = "random_forest";

    /// Wrap a forest config.
    #[must_use]
    pub fn new(config: RandomForestConfig) -> Self {
        Self { config }
    }
}

impl ClassifierAdapter for ForestAdapter {
    type Model = Fitted<RandomForest>;

    fn name(&self) -> &str {
        Self::NAME
    }

    #[instrument(skip_all, fields(model = Self::NAME, n_rows = train.n_tracks(), n_features = train.n_features()))]
    fn fit(&self, train: &FeatureTable) -> Result<Self::Model, ModelError> {
        let (schema, labels) = FittedSchema::from_training(Self::NAME, train)?;
        let model = self
            .config
            .fit(train.rows(), &labels)
            .map_err(engine_error(Self::NAME))?;
        debug!(n_trees = model.n_trees(), "random forest fitted");
        Ok(Fitted { schema, model })
    }

    fn predict(&self, model: &Self::Model, test: &FeatureTable) -> Result<Vec<Genre>, ModelError> {
        let rows = model.schema.align(Self::NAME, test)?;
        let ids = model
            .model
            .predict_batch(&rows)
            .map_err(engine_error(Self::NAME))?;
        Ok(model.schema.decode(&ids))
    }

    fn feature_importance(&self, model: &Self::Model) -> RawImportance {
        RawImportance::MeanImpurityDecrease(RawImportance::zip(
            model.schema.feature_names(),
            &model.model.feature_importances(),
        ))
    }
}

/// Softmax gradient boosting over regression trees; importance is total split gain.
#[derive(Debug, Clone)]
pub struct BoostedAdapter {
    config: GradientBoostingConfig,
}

impl BoostedAdapter {
    /// Name used in records and tables.
    pub const NAME: &'static str = "gradient_boosting";

    /// Wrap a boosting config.
    #[must_use]
    pub fn new(config: GradientBoostingConfig) -> Self {
        Self { config }
    }
}

impl ClassifierAdapter for BoostedAdapter {
    type Model = Fitted<GradientBoostedTrees>;

    fn name(&self) -> &str {
        Self::NAME
    }

    #[instrument(skip_all, fields(model = Self::NAME, n_rows = train.n_tracks(), n_features = train.n_features()))]
    fn fit(&self, train: &FeatureTable) -> Result<Self::Model, ModelError> {
        let (schema, labels) = FittedSchema::from_training(Self::NAME, train)?;
        let model = self
            .config
            .fit(train.rows(), &labels)
            .map_err(engine_error(Self::NAME))?;
        debug!(n_rounds = model.n_rounds(), "gradient boosting fitted");
        Ok(Fitted { schema, model })
    }

    fn predict(&self, model: &Self::Model, test: &FeatureTable) -> Result<Vec<Genre>, ModelError> {
        let rows = model.schema.align(Self::NAME, test)?;
        let ids = model
            .model
            .predict_batch(&rows)
            .map_err(engine_error(Self::NAME))?;
        Ok(model.schema.decode(&ids))
    }

    fn feature_importance(&self, model: &Self::Model) -> RawImportance {
        RawImportance::SplitGain(RawImportance::zip(
            model.schema.feature_names(),
            &model.model.feature_gains(),
        ))
    }
}
