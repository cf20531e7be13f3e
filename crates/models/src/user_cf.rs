//! UserCF - user-based collaborative filtering
//!
//! "Users who rate like you rated this book like so."
//!
//! Two independent predictors on the same user axis:
//! - explicit: Pearson similarity between users' ratings, prediction is the
//!   user's mean plus the similarity-weighted mean-centred neighbour ratings
//! - implicit: cosine similarity between users' implicit vectors, prediction
//!   is the similarity-weighted average of neighbour scores
//!
//! Both are normalized to [0, 1] and blended with `alpha`.

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

/// A trained user-based CF model
#[derive(Debug, Clone)]
pub struct UserCf {
    config: CfConfig,
    /// users x items
    ratings: InteractionMatrix,
    /// users x items
    implicit: InteractionMatrix,
    rating_sims: SimilarityMatrix,
    implicit_sims: SimilarityMatrix,
}

impl UserCf {
    /// Build both user-user similarity matrices from `train`
    #[instrument(skip(train, config), fields(rows = train.len()))]
    pub fn fit(train: &[Interaction], config: CfConfig) -> Self {
        let users = sorted_users(train);
        let items = sorted_items(train);

        let ratings = InteractionMatrix::pivot(train, &users, &items, Signal::Rating);
        let implicit = InteractionMatrix::pivot(train, &users, &items, Signal::Implicit);

        let (rating_sims, implicit_sims) = rayon::join(
            || pearson_matrix(&ratings),
            || cosine_similarity_full(&implicit),
        );

        debug!(
            "UserCF fitted: {} users, {} items, {} ratings, {} implicit events",
            users.len(),
            items.len(),
            ratings.observed(),
            implicit.observed()
        );

        Self {
            config,
            ratings,
            implicit,
            rating_sims,
            implicit_sims,
        }
    }

    pub fn config(&self) -> &CfConfig {
        &self.config
    }

    pub fn rating_matrix(&self) -> &InteractionMatrix {
        &self.ratings
    }

    pub fn implicit_matrix(&self) -> &InteractionMatrix {
        &self.implicit
    }

    /// Pearson user-user similarities, indexed like `rating_matrix().rows()`
    pub fn rating_similarities(&self) -> &SimilarityMatrix {
        &self.rating_sims
    }

    /// Cosine user-user similarities, indexed like `implicit_matrix().rows()`
    pub fn implicit_similarities(&self) -> &SimilarityMatrix {
        &self.implicit_sims
    }

    /// Raw explicit prediction using the configured neighbourhood size
    pub fn predict_rating(&self, user: &str, item: &str) -> Option<f64> {
        self.predict_rating_within(user, item, self.config.neighborhood_size)
    }

    /// Raw explicit prediction keeping at most `k` neighbours.
    ///
    /// `None` only when `user` was never seen in training. An observed
    /// rating is returned as-is; with no eligible neighbour the user's mean
    /// (or `0.0` if they rated nothing) is returned.
    pub fn predict_rating_within(&self, user: &str, item: &str, k: Option<usize>) -> Option<f64> {
        let u = self.ratings.row_position(user)?;
        let col = self.ratings.col_position(item);

        if let Some(observed) = col.and_then(|c| self.ratings.get(u, c)) {
            return Some(observed);
        }

        let baseline = self.ratings.row_mean(u).unwrap_or(0.0);

        let mut neighbors = Vec::new();
        if let Some(c) = col {
            for other in 0..self.ratings.nrows() {
                if other == u {
                    continue;
                }
                let Some(rating) = self.ratings.get(other, c) else {
                    continue;
                };
                let sim = self.rating_sims[[u, other]];
                if sim == 0.0 {
                    continue;
                }
                let other_mean = self.ratings.row_mean(other).unwrap_or(0.0);
                neighbors.push(Neighbor::new(sim, rating - other_mean));
            }
        }

        if neighbors.is_empty() {
            return Some(baseline);
        }

        let neighbors = select_neighbors(neighbors, k);
        Some(baseline + weighted_residual(&neighbors))
    }

    /// Raw implicit prediction using the configured neighbourhood size
    pub fn predict_implicit(&self, user: &str, item: &str) -> Option<f64> {
        self.predict_implicit_within(user, item, self.config.neighborhood_size)
    }

    /// Raw implicit prediction keeping at most `k` neighbours.
    ///
    /// Unlike the explicit path there is no fallback: no eligible neighbour
    /// means no prediction.
    pub fn predict_implicit_within(&self, user: &str, item: &str, k: Option<usize>) -> Option<f64> {
        let u = self.implicit.row_position(user)?;
        let c = self.implicit.col_position(item)?;

        if let Some(observed) = self.implicit.get(u, c) {
            return Some(observed);
        }

        let neighbors: Vec<Neighbor> = (0..self.implicit.nrows())
            .filter(|&other| other != u)
            .filter_map(|other| {
                let score = self.implicit.get(other, c)?;
                let sim = self.implicit_sims[[u, other]];
                (sim != 0.0).then(|| Neighbor::new(sim, score))
            })
            .collect();

        if neighbors.is_empty() {
            return None;
        }

        weighted_average(&select_neighbors(neighbors, k))
    }

    /// Blend of the normalized explicit and implicit predictions
    pub fn ensemble_predict(&self, user: &str, item: &str, alpha: f64) -> Option<f64> {
        blend(
            normalize_rating(self.predict_rating(user, item)),
            normalize_implicit(self.predict_implicit(user, item)),
            alpha,
        )
    }

    /// Top `n` items for `user` scored by `ensemble_predict`.
    ///
    /// Items the user explicitly rated are skipped; implicit-only
    /// interactions do not exclude an item.
    #[instrument(skip(self), fields(model = "user_cf"))]
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

impl Recommender for UserCf {
    fn kind(&self) -> ModelKind {
        ModelKind::UserCf
    }

    fn predict_rating(&self, user: &str, item: &str) -> anyhow::Result<Option<f64>> {
        Ok(UserCf::predict_rating(self, user, item))
    }

    fn recommend_top_n(&self, user: &str, n: usize) -> anyhow::Result<Vec<ScoredItem>> {
        Ok(self.recommend_top_n_with_alpha(user, n, self.config.alpha))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Three users with overlapping tastes plus implicit signals
    fn create_train_set() -> Vec<Interaction> {
        vec![
            Interaction::new("u1", "B1").with_rating(5.0),
            Interaction::new("u1", "B2").with_rating(3.0),
            Interaction::new("u1", "B3").with_rating(4.0).with_implicit_score(2.0),
            Interaction::new("u2", "B1").with_rating(4.0),
            Interaction::new("u2", "B2").with_rating(2.0),
            Interaction::new("u2", "B3").with_rating(5.0),
            Interaction::new("u2", "B4").with_rating(4.0).with_implicit_score(3.0),
            Interaction::new("u3", "B1").with_rating(1.0),
            Interaction::new("u3", "B2").with_rating(5.0),
            Interaction::new("u3", "B4").with_rating(2.0).with_implicit_score(4.0),
            Interaction::new("u3", "B5").with_implicit_score(5.0),
            Interaction::new("u4", "B3").with_implicit_score(1.0),
        ]
    }

    #[test]
    fn test_unknown_user_has_no_prediction() {
        let model = UserCf::fit(&create_train_set(), CfConfig::default());
        assert_eq!(model.predict_rating("ghost", "B1"), None);
        assert_eq!(model.predict_implicit("ghost", "B1"), None);
        assert_eq!(model.ensemble_predict("ghost", "B1", 0.6), None);
        assert!(model.recommend_top_n_with_alpha("ghost", 5, 0.6).is_empty());
    }

    #[test]
    fn test_observed_rating_is_returned_verbatim() {
        let model = UserCf::fit(&create_train_set(), CfConfig::default());
        assert_eq!(model.predict_rating("u2", "B3"), Some(5.0));
        assert_eq!(model.predict_implicit("u3", "B5"), Some(5.0));
    }

    #[test]
    fn test_prediction_adds_weighted_residual_to_user_mean() {
        let model = UserCf::fit(&create_train_set(), CfConfig::default());
        let ratings = model.rating_matrix();
        let u1 = ratings.row_position("u1").unwrap();
        let u2 = ratings.row_position("u2").unwrap();
        let u3 = ratings.row_position("u3").unwrap();

        let s12 = model.rating_similarities()[[u1, u2]];
        let s13 = model.rating_similarities()[[u1, u3]];
        let mean1 = ratings.row_mean(u1).unwrap();
        let mean2 = ratings.row_mean(u2).unwrap();
        let mean3 = ratings.row_mean(u3).unwrap();

        let expected =
            mean1 + (s12 * (4.0 - mean2) + s13 * (2.0 - mean3)) / (s12.abs() + s13.abs());
        let predicted = model.predict_rating("u1", "B4").unwrap();
        assert!((predicted - expected).abs() < 1e-9);
    }

    #[test]
    fn test_neighborhood_truncation_keeps_strongest() {
        let model = UserCf::fit(&create_train_set(), CfConfig::default());
        let ratings = model.rating_matrix();
        let u1 = ratings.row_position("u1").unwrap();
        let u2 = ratings.row_position("u2").unwrap();
        let u3 = ratings.row_position("u3").unwrap();
        let s12 = model.rating_similarities()[[u1, u2]];
        let s13 = model.rating_similarities()[[u1, u3]];

        let (strongest, sim, rating) =
            if s12.abs() >= s13.abs() { (u2, s12, 4.0) } else { (u3, s13, 2.0) };
        // a single neighbour contributes its residual with the sign of its similarity
        let expected = ratings.row_mean(u1).unwrap()
            + sim.signum() * (rating - ratings.row_mean(strongest).unwrap());

        let predicted = model.predict_rating_within("u1", "B4", Some(1)).unwrap();
        assert!((predicted - expected).abs() < 1e-9);

        let full = model.predict_rating_within("u1", "B4", None).unwrap();
        assert!((predicted - full).abs() > 1e-3);
    }

    #[test]
    fn test_user_without_ratings_falls_back_to_zero() {
        // u4 only has an implicit event, so it has a row but no mean
        let model = UserCf::fit(&create_train_set(), CfConfig::default());
        let predicted = model.predict_rating("u4", "B9");
        assert_eq!(predicted, Some(0.0));
    }

    #[test]
    fn test_implicit_without_neighbors_is_unknown() {
        let model = UserCf::fit(&create_train_set(), CfConfig::default());
        // Nobody has an implicit score for B2
        assert_eq!(model.predict_implicit("u1", "B2"), None);
    }

    #[test]
    fn test_recommendations_skip_rated_items_and_are_sorted() {
        let model = UserCf::fit(&create_train_set(), CfConfig::default());
        let recs = model.recommend_top_n_with_alpha("u1", 10, 0.6);

        assert!(!recs.is_empty());
        for rec in &recs {
            assert!(!["B1", "B2", "B3"].contains(&rec.item_id.as_str()));
            assert!((0.0..=1.0).contains(&rec.score));
        }
        for pair in recs.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    #[test]
    fn test_implicit_only_interaction_does_not_exclude_item() {
        let model = UserCf::fit(&create_train_set(), CfConfig::default());
        let recs = model.recommend_top_n_with_alpha("u4", 10, 0.6);
        assert!(recs.iter().any(|r| r.item_id == "B3"));
    }

    #[test]
    fn test_recommend_respects_n() {
        let model = UserCf::fit(&create_train_set(), CfConfig::default());
        assert!(model.recommend_top_n_with_alpha("u4", 2, 0.6).len() <= 2);
        assert!(model.recommend_top_n_with_alpha("u4", 0, 0.6).is_empty());
    }
}
