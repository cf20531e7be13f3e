//! ItemCF - item-based collaborative filtering
//!
//! "Books similar to the ones you rated." Same dual structure as UserCF, but
//! similarities are computed between items (the user x item matrices are
//! transposed first) and the neighbours of a prediction are the other
//! books the target user has interacted with.
//!
//! Fallbacks differ from UserCF: an item unseen in training, or a
//! prediction with no eligible neighbour, falls back to the user's own mean
//! (explicit or implicit), never to "no prediction".

use crate::config::CfConfig;
use crate::matrix::{InteractionMatrix, Signal};
use crate::neighborhood::{
    blend, normalize_implicit, normalize_rating, select_neighbors, weighted_average,
    weighted_residual, Neighbor,
};
use crate::similarity::{cosine_similarity_full, pearson_matrix, SimilarityMatrix};
use crate::traits::Recommender;
use crate::types::{rank_top_n, ModelKind, ScoredItem};
use data_loader::{sorted_items, sorted_users, Interaction};
use std::collections::BTreeSet;
use tracing::{debug, instrument};

/// A trained item-based CF model.
///
/// Invariant: item position `i` is both column `i` of the user-major
/// matrices and row `i` of the item-major ones (and of both similarity
/// matrices), since the latter are transposes of the former.
#[derive(Debug, Clone)]
pub struct ItemCf {
    config: CfConfig,
    /// users x items
    ratings: InteractionMatrix,
    /// users x items
    implicit: InteractionMatrix,
    /// items x users
    item_ratings: InteractionMatrix,
    /// items x users
    item_implicit: InteractionMatrix,
    rating_sims: SimilarityMatrix,
    implicit_sims: SimilarityMatrix,
}

impl ItemCf {
    /// Build both item-item similarity matrices from `train`
    #[instrument(skip(train, config), fields(rows = train.len()))]
    pub fn fit(train: &[Interaction], config: CfConfig) -> Self {
        let users = sorted_users(train);
        let items = sorted_items(train);

        let ratings = InteractionMatrix::pivot(train, &users, &items, Signal::Rating);
        let implicit = InteractionMatrix::pivot(train, &users, &items, Signal::Implicit);
        let item_ratings = ratings.transpose();
        let item_implicit = implicit.transpose();

        let (rating_sims, implicit_sims) = rayon::join(
            || pearson_matrix(&item_ratings),
            || cosine_similarity_full(&item_implicit),
        );

        debug!(
            "ItemCF fitted: {} items, {} users, {} ratings, {} implicit events",
            items.len(),
            users.len(),
            ratings.observed(),
            implicit.observed()
        );

        Self {
            config,
            ratings,
            implicit,
            item_ratings,
            item_implicit,
            rating_sims,
            implicit_sims,
        }
    }

    pub fn config(&self) -> &CfConfig {
        &self.config
    }

    /// Item-major explicit matrix (the similarity basis)
    pub fn item_rating_matrix(&self) -> &InteractionMatrix {
        &self.item_ratings
    }

    /// Item-major implicit matrix (the similarity basis)
    pub fn item_implicit_matrix(&self) -> &InteractionMatrix {
        &self.item_implicit
    }

    /// Pearson item-item similarities, indexed like `item_rating_matrix().rows()`
    pub fn rating_similarities(&self) -> &SimilarityMatrix {
        &self.rating_sims
    }

    /// Cosine item-item similarities, indexed like `item_implicit_matrix().rows()`
    pub fn implicit_similarities(&self) -> &SimilarityMatrix {
        &self.implicit_sims
    }

    /// Raw explicit prediction using the configured neighbourhood size
    pub fn predict_rating(&self, user: &str, item: &str) -> Option<f64> {
        self.predict_rating_within(user, item, self.config.neighborhood_size)
    }

    /// Raw explicit prediction keeping at most `k` neighbour items.
    ///
    /// The baseline is the target item's mean rating; neighbours are the
    /// other items `user` rated, centred on their own item means.
    pub fn predict_rating_within(&self, user: &str, item: &str, k: Option<usize>) -> Option<f64> {
        let u = self.ratings.row_position(user)?;
        let user_mean = self.ratings.row_mean(u).unwrap_or(0.0);

        let Some(i) = self.item_ratings.row_position(item) else {
            return Some(user_mean);
        };

        if let Some(observed) = self.ratings.get(u, i) {
            return Some(observed);
        }

        let item_mean = self.item_ratings.row_mean(i).unwrap_or(0.0);

        let mut neighbors = Vec::new();
        for j in 0..self.item_ratings.nrows() {
            if j == i {
                continue;
            }
            let Some(rating) = self.ratings.get(u, j) else {
                continue;
            };
            let sim = self.rating_sims[[i, j]];
            if sim == 0.0 {
                continue;
            }
            let neighbor_mean = self.item_ratings.row_mean(j).unwrap_or(0.0);
            neighbors.push(Neighbor::new(sim, rating - neighbor_mean));
        }

        if neighbors.is_empty() {
            return Some(user_mean);
        }

        let neighbors = select_neighbors(neighbors, k);
        Some(item_mean + weighted_residual(&neighbors))
    }

    /// Raw implicit prediction using the configured neighbourhood size
    pub fn predict_implicit(&self, user: &str, item: &str) -> Option<f64> {
        self.predict_implicit_within(user, item, self.config.neighborhood_size)
    }

    /// Raw implicit prediction keeping at most `k` neighbour items.
    ///
    /// Falls back to the user's mean implicit score (or `0.0`) whenever no
    /// weighted average can be formed.
    pub fn predict_implicit_within(&self, user: &str, item: &str, k: Option<usize>) -> Option<f64> {
        let u = self.implicit.row_position(user)?;
        let user_mean = self.implicit.row_mean(u).unwrap_or(0.0);

        let Some(i) = self.item_implicit.row_position(item) else {
            return Some(user_mean);
        };

        if let Some(observed) = self.implicit.get(u, i) {
            return Some(observed);
        }

        let neighbors: Vec<Neighbor> = (0..self.item_implicit.nrows())
            .filter(|&j| j != i)
            .filter_map(|j| {
                let score = self.implicit.get(u, j)?;
                let sim = self.implicit_sims[[i, j]];
                (sim != 0.0).then(|| Neighbor::new(sim, score))
            })
            .collect();

        if neighbors.is_empty() {
            return Some(user_mean);
        }

        Some(weighted_average(&select_neighbors(neighbors, k)).unwrap_or(user_mean))
    }

    /// Blend of the normalized explicit and implicit predictions
    pub fn ensemble_predict(&self, user: &str, item: &str, alpha: f64) -> Option<f64> {
        blend(
            normalize_rating(self.predict_rating(user, item)),
            normalize_implicit(self.predict_implicit(user, item)),
            alpha,
        )
    }

    /// Top `n` items for `user` scored by `ensemble_predict`, skipping items
    /// the user explicitly rated
    #[instrument(skip(self), fields(model = "item_cf"))]
    pub fn recommend_top_n_with_alpha(&self, user: &str, n: usize, alpha: f64) -> Vec<ScoredItem> {
        let candidates: BTreeSet<&String> = self
            .ratings
            .cols()
            .iter()
            .chain(self.implicit.cols())
            .collect();

        let scored: Vec<ScoredItem> = candidates
            .into_iter()
            .filter(|item| self.ratings.lookup(user, item).is_none())
            .filter_map(|item| {
                self.ensemble_predict(user, item, alpha)
                    .map(|score| ScoredItem::new(item.as_str(), score))
            })
            .collect();

        debug!("Scored {} candidate items", scored.len());
        rank_top_n(scored, n)
    }
}

impl Recommender for ItemCf {
    fn kind(&self) -> ModelKind {
        ModelKind::ItemCf
    }

    fn predict_rating(&self, user: &str, item: &str) -> anyhow::Result<Option<f64>> {
        Ok(ItemCf::predict_rating(self, user, item))
    }

    fn recommend_top_n(&self, user: &str, n: usize) -> anyhow::Result<Vec<ScoredItem>> {
        Ok(self.recommend_top_n_with_alpha(user, n, self.config.alpha))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_train_set() -> Vec<Interaction> {
        vec![
            Interaction::new("u1", "B1").with_rating(5.0),
            Interaction::new("u1", "B2").with_rating(4.0).with_implicit_score(2.0),
            Interaction::new("u2", "B1").with_rating(2.0),
            Interaction::new("u2", "B2").with_rating(1.0),
            Interaction::new("u2", "B3").with_rating(4.0).with_implicit_score(4.0),
            Interaction::new("u3", "B1").with_rating(4.0),
            Interaction::new("u3", "B2").with_rating(5.0).with_implicit_score(3.0),
            Interaction::new("u3", "B3").with_rating(2.0),
            Interaction::new("u3", "B4").with_implicit_score(5.0),
            Interaction::new("u4", "B4").with_implicit_score(2.0),
        ]
    }

    #[test]
    fn test_unknown_user_has_no_prediction() {
        let model = ItemCf::fit(&create_train_set(), CfConfig::default());
        assert_eq!(model.predict_rating("ghost", "B1"), None);
        assert_eq!(model.predict_implicit("ghost", "B1"), None);
        assert!(model.recommend_top_n_with_alpha("ghost", 3, 0.6).is_empty());
    }

    #[test]
    fn test_unknown_item_falls_back_to_user_means() {
        let model = ItemCf::fit(&create_train_set(), CfConfig::default());
        assert_eq!(model.predict_rating("u1", "B99"), Some(4.5));
        assert_eq!(model.predict_implicit("u1", "B99"), Some(2.0));
        // u4 has no explicit ratings at all
        assert_eq!(model.predict_rating("u4", "B99"), Some(0.0));
    }

    #[test]
    fn test_prediction_uses_item_mean_baseline() {
        let model = ItemCf::fit(&create_train_set(), CfConfig::default());
        let items = model.item_rating_matrix();
        let b1 = items.row_position("B1").unwrap();
        let b2 = items.row_position("B2").unwrap();
        let b3 = items.row_position("B3").unwrap();

        let s31 = model.rating_similarities()[[b3, b1]];
        let s32 = model.rating_similarities()[[b3, b2]];
        let mean1 = items.row_mean(b1).unwrap();
        let mean2 = items.row_mean(b2).unwrap();
        let mean3 = items.row_mean(b3).unwrap();

        let (num, den) = [(s31, 5.0 - mean1), (s32, 4.0 - mean2)]
            .iter()
            .filter(|(s, _)| *s != 0.0)
            .fold((0.0_f64, 0.0_f64), |(n, d), (s, v)| (n + s * v, d + s.abs()));
        let expected = if den == 0.0 {
            4.5 // user mean fallback
        } else {
            mean3 + num / den
        };

        let predicted = model.predict_rating("u1", "B3").unwrap();
        assert!((predicted - expected).abs() < 1e-9);
    }

    #[test]
    fn test_neighborhood_truncation_keeps_strongest_item() {
        let model = ItemCf::fit(&create_train_set(), CfConfig::default());
        let items = model.item_rating_matrix();
        let b1 = items.row_position("B1").unwrap();
        let b2 = items.row_position("B2").unwrap();
        let b3 = items.row_position("B3").unwrap();
        let s31 = model.rating_similarities()[[b3, b1]];
        let s32 = model.rating_similarities()[[b3, b2]];

        // u1 rated B1 = 5 and B2 = 4
        let (strongest, sim, rating) =
            if s31.abs() >= s32.abs() { (b1, s31, 5.0) } else { (b2, s32, 4.0) };
        let expected = items.row_mean(b3).unwrap()
            + sim.signum() * (rating - items.row_mean(strongest).unwrap());

        let predicted = model.predict_rating_within("u1", "B3", Some(1)).unwrap();
        assert!((predicted - expected).abs() < 1e-9);

        let full = model.predict_rating_within("u1", "B3", None).unwrap();
        assert!((predicted - full).abs() > 1e-3);
    }

    #[test]
    fn test_implicit_without_neighbors_falls_back_to_user_mean() {
        let model = ItemCf::fit(&create_train_set(), CfConfig::default());
        // B1 has no implicit signal, so its cosine similarity to B3 is zero
        assert_eq!(model.predict_implicit("u2", "B1"), Some(4.0));
    }

    #[test]
    fn test_similarity_is_symmetric() {
        let model = ItemCf::fit(&create_train_set(), CfConfig::default());
        let sims = model.rating_similarities();
        for i in 0..sims.nrows() {
            for j in 0..sims.ncols() {
                assert_eq!(sims[[i, j]], sims[[j, i]]);
            }
        }
    }

    #[test]
    fn test_recommendations_exclude_rated_items() {
        let model = ItemCf::fit(&create_train_set(), CfConfig::default());
        let recs = model.recommend_top_n_with_alpha("u1", 10, 0.6);
        let ids: Vec<_> = recs.iter().map(|r| r.item_id.as_str()).collect();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&"B3"));
        assert!(ids.contains(&"B4"));
        for rec in &recs {
            assert!((0.0..=1.0).contains(&rec.score));
        }
        assert!(recs[0].score >= recs[1].score);
    }
}
