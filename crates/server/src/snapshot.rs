//! An immutable, fully trained set of models plus their evaluation.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use tracing::{info, instrument};

use data_loader::{item_names, Interaction, ItemId};
use evaluation::{
    compute_ensemble_weights, ensemble_recommend, select_best_model, train_test_split,
    EnsembleWeights, Evaluator, MetricsRecord,
};
use models::{ItemCf, MatrixFactorization, ModelKind, Recommender, ScoredItem, UserCf};

use crate::config::ManagerConfig;

/// Which model (or blend) should answer a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelChoice {
    /// The model selected by the configured criterion
    Best,
    /// Metric-weighted blend of all three models
    Ensemble,
    Model(ModelKind),
}

impl fmt::Display for ModelChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelChoice::Best => f.write_str("best"),
            ModelChoice::Ensemble => f.write_str("ensemble"),
            ModelChoice::Model(kind) => write!(f, "{}", kind),
        }
    }
}

impl FromStr for ModelChoice {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "best" => Ok(ModelChoice::Best),
            "ensemble" => Ok(ModelChoice::Ensemble),
            other => other.parse().map(ModelChoice::Model),
        }
    }
}

/// Output of one retrain.
///
/// Never mutated after construction; the manager replaces it wholesale.
pub struct ModelSnapshot {
    fingerprint: String,
    generation: u64,
    rows: usize,
    user_cf: UserCf,
    item_cf: ItemCf,
    mf: MatrixFactorization,
    metrics: BTreeMap<ModelKind, MetricsRecord>,
    weights: EnsembleWeights,
    best: ModelKind,
    ensemble_depth: usize,
    item_names: BTreeMap<ItemId, String>,
}

impl ModelSnapshot {
    /// Run the full pipeline: split, fit all three models, evaluate them on
    /// both tasks, select the best and derive ensemble weights.
    #[instrument(skip(interactions, fingerprint, config), fields(rows = interactions.len()))]
    pub fn train(
        interactions: &[Interaction],
        fingerprint: String,
        generation: u64,
        config: &ManagerConfig,
    ) -> Result<Self> {
        let split = train_test_split(interactions, config.test_ratio, config.seed)
            .context("Failed to split interactions")?;
        info!(
            "Training generation {} on {} rows ({} held out)",
            generation,
            split.train.len(),
            split.test.len()
        );

        let (user_cf, (item_cf, mf)) = rayon::join(
            || UserCf::fit(&split.train, config.cf.clone()),
            || {
                rayon::join(
                    || ItemCf::fit(&split.train, config.cf.clone()),
                    || MatrixFactorization::fit(&split.train, config.mf.clone()),
                )
            },
        );
        let mf = mf.context("Failed to train matrix factorization")?;

        let models: [&dyn Recommender; 3] = [&user_cf, &item_cf, &mf];
        let metrics = Evaluator::new(config.top_k).evaluate_models(&models, &split);
        for (kind, record) in &metrics {
            info!("{} metrics: {:?}", kind, record);
        }

        let best = select_best_model(&metrics, config.criterion, config.selection_task())
            .context("Failed to select best model")?;
        let weights = compute_ensemble_weights(&metrics);

        Ok(Self {
            fingerprint,
            generation,
            rows: interactions.len(),
            user_cf,
            item_cf,
            mf,
            metrics,
            weights,
            best,
            ensemble_depth: config.ensemble_depth,
            item_names: item_names(interactions),
        })
    }

    /// Content hash of the dataset this snapshot was trained on
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// 1 for the first retrain, incremented on every retrain after it
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Number of interactions in the dataset (train and test)
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn best(&self) -> ModelKind {
        self.best
    }

    pub fn metrics(&self) -> &BTreeMap<ModelKind, MetricsRecord> {
        &self.metrics
    }

    pub fn weights(&self) -> &EnsembleWeights {
        &self.weights
    }

    /// Display name of a book, if the dataset carried one
    pub fn item_name(&self, item: &str) -> Option<&str> {
        self.item_names.get(item).map(String::as_str)
    }

    pub fn user_cf(&self) -> &UserCf {
        &self.user_cf
    }

    pub fn item_cf(&self) -> &ItemCf {
        &self.item_cf
    }

    pub fn mf(&self) -> &MatrixFactorization {
        &self.mf
    }

    pub fn model(&self, kind: ModelKind) -> &dyn Recommender {
        match kind {
            ModelKind::UserCf => &self.user_cf,
            ModelKind::ItemCf => &self.item_cf,
            ModelKind::Mf => &self.mf,
        }
    }

    pub fn best_model(&self) -> &dyn Recommender {
        self.model(self.best)
    }

    /// All three models in `ModelKind` order
    pub fn models(&self) -> [&dyn Recommender; 3] {
        [&self.user_cf, &self.item_cf, &self.mf]
    }

    pub fn recommend_best(&self, user: &str, n: usize) -> Result<Vec<ScoredItem>> {
        self.best_model().recommend_top_n(user, n)
    }

    pub fn recommend_ensemble(&self, user: &str, n: usize) -> Vec<ScoredItem> {
        ensemble_recommend(&self.models(), user, n, &self.weights, self.ensemble_depth)
    }

    pub fn recommend(&self, choice: ModelChoice, user: &str, n: usize) -> Result<Vec<ScoredItem>> {
        match choice {
            ModelChoice::Best => self.recommend_best(user, n),
            ModelChoice::Ensemble => Ok(self.recommend_ensemble(user, n)),
            ModelChoice::Model(kind) => self.model(kind).recommend_top_n(user, n),
        }
    }

    /// Recommend with a one-off explicit/implicit blend weight.
    ///
    /// Only the CF models blend; any other choice is an error.
    pub fn recommend_with_alpha(
        &self,
        choice: ModelChoice,
        user: &str,
        n: usize,
        alpha: f64,
    ) -> Result<Vec<ScoredItem>> {
        if !(0.0..=1.0).contains(&alpha) {
            bail!("alpha must be within [0, 1], got {}", alpha);
        }
        let kind = match choice {
            ModelChoice::Best => self.best,
            ModelChoice::Model(kind) => kind,
            ModelChoice::Ensemble => bail!("alpha does not apply to the ensemble"),
        };
        match kind {
            ModelKind::UserCf => Ok(self.user_cf.recommend_top_n_with_alpha(user, n, alpha)),
            ModelKind::ItemCf => Ok(self.item_cf.recommend_top_n_with_alpha(user, n, alpha)),
            ModelKind::Mf => bail!("alpha does not apply to {}", kind),
        }
    }

    pub fn predict(&self, choice: ModelChoice, user: &str, item: &str) -> Result<Option<f64>> {
        match choice {
            ModelChoice::Best => self.best_model().predict_rating(user, item),
            ModelChoice::Model(kind) => self.model(kind).predict_rating(user, item),
            ModelChoice::Ensemble => bail!("the ensemble only produces recommendations"),
        }
    }
}

impl fmt::Debug for ModelSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelSnapshot")
            .field("fingerprint", &self.fingerprint)
            .field("generation", &self.generation)
            .field("rows", &self.rows)
            .field("best", &self.best)
            .field("metrics", &self.metrics)
            .field("weights", &self.weights)
            .finish_non_exhaustive()
    }
}
