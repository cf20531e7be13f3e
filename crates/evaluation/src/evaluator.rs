//! Scores any [`Recommender`] against a held-out test set.
//!
//! Model failures never abort a run: a failed rating prediction skips the
//! sample and a failed recommendation counts as an empty list.

use crate::metrics::{mae, ndcg_at_k, precision_at_k, recall_at_k, rmse, Metric, MetricsRecord, Task};
use crate::split::Split;
use models::{ModelKind, Recommender};
use rayon::prelude::*;
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, instrument, warn};

#[derive(Debug, Clone, Copy)]
pub struct Evaluator {
    top_k: usize,
}

impl Default for Evaluator {
    fn default() -> Self {
        Self { top_k: 10 }
    }
}

impl Evaluator {
    pub fn new(top_k: usize) -> Self {
        Self { top_k }
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Score `model` on one task
    #[instrument(skip(self, model, split), fields(kind = %model.kind(), test_rows = split.test.len()))]
    pub fn evaluate(&self, model: &dyn Recommender, split: &Split, task: Task) -> MetricsRecord {
        match task {
            Task::Rating => self.evaluate_rating(model, split),
            Task::Ranking => self.evaluate_ranking(model, split),
        }
    }

    /// Score `model` on both tasks and merge the results
    pub fn evaluate_all(&self, model: &dyn Recommender, split: &Split) -> MetricsRecord {
        let mut record = self.evaluate(model, split, Task::Ranking);
        record.extend(self.evaluate(model, split, Task::Rating));
        record
    }

    /// Score several models on both tasks, in parallel
    pub fn evaluate_models(
        &self,
        models: &[&dyn Recommender],
        split: &Split,
    ) -> BTreeMap<ModelKind, MetricsRecord> {
        models
            .par_iter()
            .map(|model| (model.kind(), self.evaluate_all(*model, split)))
            .collect()
    }

    /// RMSE and MAE over every test row with an explicit rating.
    ///
    /// Reports nothing when no prediction could be collected.
    fn evaluate_rating(&self, model: &dyn Recommender, split: &Split) -> MetricsRecord {
        let mut pairs = Vec::new();
        for row in &split.test {
            let Some(truth) = row.rating else {
                continue;
            };
            match model.predict_rating(&row.user_id, &row.item_id) {
                Ok(Some(prediction)) => pairs.push((prediction, truth)),
                Ok(None) => {}
                Err(e) => {
                    warn!("{} failed to predict ({}, {}): {}", model.kind(), row.user_id, row.item_id, e);
                }
            }
        }

        debug!("Collected {} rating pairs", pairs.len());
        let mut record = MetricsRecord::new();
        if let (Some(rmse), Some(mae)) = (rmse(&pairs), mae(&pairs)) {
            record.insert(Metric::Rmse, rmse);
            record.insert(Metric::Mae, mae);
        }
        record
    }

    /// Precision@K, Recall@K and NDCG@K averaged over the test users.
    ///
    /// Each defaults to 0.0 when no user qualifies.
    fn evaluate_ranking(&self, model: &dyn Recommender, split: &Split) -> MetricsRecord {
        let k = self.top_k;
        let mut precisions = Vec::new();
        let mut recalls = Vec::new();
        let mut ndcgs = Vec::new();

        for user in split.test_users() {
            let relevant: HashSet<&str> = split
                .test
                .iter()
                .filter(|row| row.user_id == user)
                .map(|row| row.item_id.as_str())
                .collect();
            if relevant.is_empty() {
                continue;
            }

            let recs = model.recommend_top_n(user, k).unwrap_or_else(|e| {
                warn!("{} failed to recommend for {}: {}", model.kind(), user, e);
                Vec::new()
            });
            let recommended: Vec<&str> = recs.iter().map(|r| r.item_id.as_str()).collect();

            precisions.push(precision_at_k(&recommended, &relevant, k));
            recalls.push(recall_at_k(&recommended, &relevant, k));
            ndcgs.push(ndcg_at_k(&recommended, &relevant, k));
        }

        debug!("Ranked for {} test users", ndcgs.len());
        [
            (Metric::PrecisionAtK, mean_or_zero(&precisions)),
            (Metric::RecallAtK, mean_or_zero(&recalls)),
            (Metric::NdcgAtK, mean_or_zero(&ndcgs)),
        ]
        .into_iter()
        .collect()
    }
}

fn mean_or_zero(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}
