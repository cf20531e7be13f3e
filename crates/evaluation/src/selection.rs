//! Best-model selection by a single metric.

use crate::error::{EvaluationError, Result};
use crate::metrics::{Metric, MetricsRecord, Task};
use models::ModelKind;
use std::collections::BTreeMap;
use tracing::info;

/// Pick the model with the best value of `criterion`.
///
/// Ranking metrics are maximised and rating (error) metrics minimised,
/// following `task`. Records without the criterion are skipped. Ties go to
/// the model that comes first in `ModelKind` order.
pub fn select_best_model(
    metrics: &BTreeMap<ModelKind, MetricsRecord>,
    criterion: Metric,
    task: Task,
) -> Result<ModelKind> {
    if metrics.is_empty() {
        return Err(EvaluationError::NoModels);
    }

    let mut best: Option<(ModelKind, f64)> = None;
    for (kind, record) in metrics {
        let Some(score) = record.get(criterion) else {
            continue;
        };
        let better = match best {
            None => true,
            Some((_, current)) => match task {
                Task::Ranking => score > current,
                Task::Rating => score < current,
            },
        };
        if better {
            best = Some((*kind, score));
        }
    }

    let (kind, score) = best.ok_or_else(|| EvaluationError::CriterionMissing(criterion.to_string()))?;
    info!("Best model by {} ({}): {} = {:.4}", criterion, task, kind, score);
    Ok(kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pairs: &[(Metric, f64)]) -> MetricsRecord {
        pairs.iter().copied().collect()
    }

    fn create_metrics() -> BTreeMap<ModelKind, MetricsRecord> {
        BTreeMap::from([
            (ModelKind::UserCf, record(&[(Metric::NdcgAtK, 0.3), (Metric::Rmse, 1.2)])),
            (ModelKind::ItemCf, record(&[(Metric::NdcgAtK, 0.5), (Metric::Rmse, 1.5)])),
            (ModelKind::Mf, record(&[(Metric::NdcgAtK, 0.1), (Metric::Rmse, 0.9)])),
        ])
    }

    #[test]
    fn test_ranking_maximises() {
        let best = select_best_model(&create_metrics(), Metric::NdcgAtK, Task::Ranking).unwrap();
        assert_eq!(best, ModelKind::ItemCf);
    }

    #[test]
    fn test_rating_minimises() {
        let best = select_best_model(&create_metrics(), Metric::Rmse, Task::Rating).unwrap();
        assert_eq!(best, ModelKind::Mf);
    }

    #[test]
    fn test_ties_go_to_first_model() {
        let metrics = BTreeMap::from([
            (ModelKind::Mf, record(&[(Metric::NdcgAtK, 0.4)])),
            (ModelKind::ItemCf, record(&[(Metric::NdcgAtK, 0.4)])),
        ]);
        let best = select_best_model(&metrics, Metric::NdcgAtK, Task::Ranking).unwrap();
        assert_eq!(best, ModelKind::ItemCf);
    }

    #[test]
    fn test_records_without_criterion_are_skipped() {
        let metrics = BTreeMap::from([
            (ModelKind::UserCf, record(&[(Metric::NdcgAtK, 0.4)])),
            (ModelKind::Mf, record(&[(Metric::NdcgAtK, 0.2), (Metric::Mae, 0.7)])),
        ]);
        assert_eq!(
            select_best_model(&metrics, Metric::Mae, Task::Rating).unwrap(),
            ModelKind::Mf
        );
    }

    #[test]
    fn test_missing_criterion_errors() {
        let metrics = BTreeMap::from([(ModelKind::UserCf, record(&[(Metric::NdcgAtK, 0.4)]))]);
        assert!(matches!(
            select_best_model(&metrics, Metric::Rmse, Task::Rating),
            Err(EvaluationError::CriterionMissing(_))
        ));
        assert!(matches!(
            select_best_model(&BTreeMap::new(), Metric::Rmse, Task::Rating),
            Err(EvaluationError::NoModels)
        ));
    }
}
