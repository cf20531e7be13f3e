//! Metric-driven ensemble weights and weighted score blending.

use crate::metrics::{Metric, MetricsRecord};
use models::{rank_top_n, ModelKind, Recommender, ScoredItem};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// RMSE assumed for a model that was never scored on ratings
pub const MISSING_RMSE: f64 = 1e5;

/// How many items each model contributes before blending
pub const DEFAULT_ENSEMBLE_DEPTH: usize = 10;

/// Share of the final weight given to rating performance (the rest goes to ranking)
const RATING_SHARE: f64 = 0.5;

/// Per-model weights, summing to 1 across models
pub type EnsembleWeights = BTreeMap<ModelKind, f64>;

/// Blend rating performance (`1 / RMSE`) and ranking performance (`NDCG@K`)
/// into one weight per model.
///
/// Each component is normalized to sum to 1 on its own before the 50/50
/// blend. A component whose total is zero is spread uniformly.
pub fn compute_ensemble_weights(metrics: &BTreeMap<ModelKind, MetricsRecord>) -> EnsembleWeights {
    if metrics.is_empty() {
        return EnsembleWeights::new();
    }

    let rating: BTreeMap<ModelKind, f64> = metrics
        .iter()
        .map(|(kind, record)| {
            let rmse = record.get(Metric::Rmse).unwrap_or(MISSING_RMSE).max(f64::EPSILON);
            (*kind, 1.0 / rmse)
        })
        .collect();
    let ranking: BTreeMap<ModelKind, f64> = metrics
        .iter()
        .map(|(kind, record)| (*kind, record.get(Metric::NdcgAtK).unwrap_or(0.0).max(0.0)))
        .collect();

    let rating = normalize(rating);
    let ranking = normalize(ranking);

    let weights: EnsembleWeights = metrics
        .keys()
        .map(|kind| {
            let weight = RATING_SHARE * rating[kind] + (1.0 - RATING_SHARE) * ranking[kind];
            (*kind, weight)
        })
        .collect();
    debug!("Ensemble weights: {:?}", weights);
    weights
}

fn normalize(scores: BTreeMap<ModelKind, f64>) -> BTreeMap<ModelKind, f64> {
    let total: f64 = scores.values().sum();
    if total > 0.0 && total.is_finite() {
        scores.into_iter().map(|(k, v)| (k, v / total)).collect()
    } else {
        let uniform = 1.0 / scores.len() as f64;
        scores.into_keys().map(|k| (k, uniform)).collect()
    }
}

/// Weighted blend of each model's own top-`depth` list.
///
/// Every item accumulates `weight * score` from each model that
/// recommended it; there is no correction for partial coverage. A model
/// that fails to recommend, or has no weight, contributes nothing. Ties are
/// broken by item id.
pub fn ensemble_recommend(
    models: &[&dyn Recommender],
    user: &str,
    n: usize,
    weights: &EnsembleWeights,
    depth: usize,
) -> Vec<ScoredItem> {
    let mut blended: BTreeMap<String, f64> = BTreeMap::new();

    for model in models {
        let weight = weights.get(&model.kind()).copied().unwrap_or(0.0);
        let recs = model.recommend_top_n(user, depth).unwrap_or_else(|e| {
            warn!("{} failed to recommend for {}: {}", model.kind(), user, e);
            Vec::new()
        });
        for rec in recs {
            *blended.entry(rec.item_id).or_insert(0.0) += weight * rec.score;
        }
    }

    let scored = blended
        .into_iter()
        .map(|(item_id, score)| ScoredItem::new(item_id, score))
        .collect();
    rank_top_n(scored, n)
}
