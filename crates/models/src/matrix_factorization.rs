//! Matrix Factorization using stochastic gradient descent
//!
//! Learns `k`-dimensional user and item factors whose dot product
//! approximates a combined interaction strength: `rating + implicit_score`
//! (a missing signal counts as 0). Cells where the combined value is 0 are
//! not observations and are skipped by SGD.

use crate::config::MfConfig;
use crate::error::{ModelError, Result};
use crate::neighborhood::normalize_rating;
use crate::traits::Recommender;
use crate::types::{rank_top_n, ModelKind, ScoredItem};
use data_loader::{sorted_items, sorted_users, Interaction, ItemId, UserId};
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use std::collections::{HashMap, HashSet};
use tracing::{debug, instrument};

/// A trained SGD matrix factorization model
#[derive(Debug, Clone)]
pub struct MatrixFactorization {
    config: MfConfig,
    users: Vec<UserId>,
    items: Vec<ItemId>,
    user_index: HashMap<UserId, usize>,
    item_index: HashMap<ItemId, usize>,
    /// User latent factors: [num_users x factors]
    user_factors: Array2<f64>,
    /// Item latent factors: [num_items x factors]
    item_factors: Array2<f64>,
    /// Items each user explicitly rated in training, by user position
    rated: Vec<HashSet<usize>>,
}

impl MatrixFactorization {
    /// Train on `train` with the given hyper-parameters.
    ///
    /// Factors are re-drawn from `N(0, 1/k)` with `config.seed` on every call.
    #[instrument(skip(train, config), fields(rows = train.len(), factors = config.factors))]
    pub fn fit(train: &[Interaction], config: MfConfig) -> Result<Self> {
        validate(&config)?;

        let users = sorted_users(train);
        let items = sorted_items(train);
        let user_index = index_of(&users);
        let item_index = index_of(&items);

        let mut combined = Array2::<f64>::zeros((users.len(), items.len()));
        let mut rated = vec![HashSet::new(); users.len()];
        for interaction in train {
            let u = user_index[&interaction.user_id];
            let i = item_index[&interaction.item_id];
            combined[[u, i]] =
                interaction.rating.unwrap_or(0.0) + interaction.implicit_score.unwrap_or(0.0);
            if interaction.rating.is_some() {
                rated[u].insert(i);
            }
        }

        let (mut user_factors, mut item_factors) =
            initial_factors(&config, users.len(), items.len())?;

        let observed = combined.iter().filter(|&&v| v != 0.0).count();
        debug!(
            "Training MF on {}x{} matrix with {} observed cells",
            users.len(),
            items.len(),
            observed
        );

        let lr = config.learning_rate;
        let reg = config.regularization;
        for _ in 0..config.iterations {
            for ((u, i), &value) in combined.indexed_iter() {
                if value == 0.0 {
                    continue;
                }
                let err = value - user_factors.row(u).dot(&item_factors.row(i));
                for f in 0..config.factors {
                    let p = user_factors[[u, f]];
                    let q = item_factors[[i, f]];
                    user_factors[[u, f]] += lr * (err * q - reg * p);
                    item_factors[[i, f]] += lr * (err * p - reg * q);
                }
            }
        }

        Ok(Self {
            config,
            users,
            items,
            user_index,
            item_index,
            user_factors,
            item_factors,
            rated,
        })
    }

    pub fn config(&self) -> &MfConfig {
        &self.config
    }

    pub fn users(&self) -> &[UserId] {
        &self.users
    }

    pub fn items(&self) -> &[ItemId] {
        &self.items
    }

    pub fn user_factors(&self) -> &Array2<f64> {
        &self.user_factors
    }

    pub fn item_factors(&self) -> &Array2<f64> {
        &self.item_factors
    }

    /// Raw dot product of the user and item factors
    pub fn score(&self, user: &str, item: &str) -> Option<f64> {
        let u = *self.user_index.get(user)?;
        let i = *self.item_index.get(item)?;
        Some(self.user_factors.row(u).dot(&self.item_factors.row(i)))
    }

    /// Normalized prediction in [0, 1]; `None` if either id is unknown
    pub fn predict_rating(&self, user: &str, item: &str) -> Option<f64> {
        normalize_rating(self.score(user, item))
    }

    /// Top `n` items for `user` that they did not explicitly rate in training
    #[instrument(skip(self), fields(model = "mf"))]
    pub fn recommend_top_n(&self, user: &str, n: usize) -> Vec<ScoredItem> {
        let Some(&u) = self.user_index.get(user) else {
            return Vec::new();
        };

        let scores = self.item_factors.dot(&self.user_factors.row(u));
        let scored: Vec<ScoredItem> = self
            .items
            .iter()
            .enumerate()
            .filter(|(i, _)| !self.rated[u].contains(i))
            .filter_map(|(i, item)| {
                normalize_rating(Some(scores[i]))
                    .filter(|s| s.is_finite())
                    .map(|s| ScoredItem::new(item.as_str(), s))
            })
            .collect();

        rank_top_n(scored, n)
    }
}

impl Recommender for MatrixFactorization {
    fn kind(&self) -> ModelKind {
        ModelKind::Mf
    }

    fn predict_rating(&self, user: &str, item: &str) -> anyhow::Result<Option<f64>> {
        Ok(MatrixFactorization::predict_rating(self, user, item))
    }

    fn recommend_top_n(&self, user: &str, n: usize) -> anyhow::Result<Vec<ScoredItem>> {
        Ok(MatrixFactorization::recommend_top_n(self, user, n))
    }
}

fn validate(config: &MfConfig) -> Result<()> {
    if config.factors == 0 {
        return Err(ModelError::InvalidConfig {
            field: "factors".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }
    if !config.learning_rate.is_finite() || config.learning_rate <= 0.0 {
        return Err(ModelError::InvalidConfig {
            field: "learning_rate".to_string(),
            reason: format!("must be positive, got {}", config.learning_rate),
        });
    }
    if !config.regularization.is_finite() || config.regularization < 0.0 {
        return Err(ModelError::InvalidConfig {
            field: "regularization".to_string(),
            reason: format!("must be non-negative, got {}", config.regularization),
        });
    }
    Ok(())
}

/// Seeded `N(0, 1/k)` draws: all user rows first, then all item rows
fn initial_factors(
    config: &MfConfig,
    num_users: usize,
    num_items: usize,
) -> Result<(Array2<f64>, Array2<f64>)> {
    let normal = Normal::new(0.0, 1.0 / config.factors as f64).map_err(|e| {
        ModelError::InvalidConfig {
            field: "factors".to_string(),
            reason: e.to_string(),
        }
    })?;
    let mut rng = StdRng::seed_from_u64(config.seed);
    let user_factors =
        Array2::from_shape_simple_fn((num_users, config.factors), || normal.sample(&mut rng));
    let item_factors =
        Array2::from_shape_simple_fn((num_items, config.factors), || normal.sample(&mut rng));
    Ok((user_factors, item_factors))
}

fn index_of(labels: &[String]) -> HashMap<String, usize> {
    labels
        .iter()
        .enumerate()
        .map(|(i, label)| (label.clone(), i))
        .collect()
}
