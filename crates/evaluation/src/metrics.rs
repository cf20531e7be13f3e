//! Regression and ranking metrics.
//!
//! Ranking metrics use binary relevance: an item is relevant if it is in
//! the user's held-out set.

use crate::error::EvaluationError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;

/// Which kind of output a metric scores
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Task {
    /// Rating predictions against held-out explicit ratings
    Rating,
    /// Top-K lists against held-out items
    Ranking,
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Task::Rating => f.write_str("rating"),
            Task::Ranking => f.write_str("ranking"),
        }
    }
}

/// Serializes to its display name; parses case-insensitively from text and JSON alike
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum Metric {
    #[serde(rename = "RMSE")]
    Rmse,
    #[serde(rename = "MAE")]
    Mae,
    #[serde(rename = "Precision@K")]
    PrecisionAtK,
    #[serde(rename = "Recall@K")]
    RecallAtK,
    #[serde(rename = "NDCG@K")]
    NdcgAtK,
}

impl Metric {
    pub const ALL: [Metric; 5] = [
        Metric::Rmse,
        Metric::Mae,
        Metric::PrecisionAtK,
        Metric::RecallAtK,
        Metric::NdcgAtK,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Rmse => "RMSE",
            Metric::Mae => "MAE",
            Metric::PrecisionAtK => "Precision@K",
            Metric::RecallAtK => "Recall@K",
            Metric::NdcgAtK => "NDCG@K",
        }
    }

    /// Error metrics (lower is better) belong to the rating task
    pub fn task(&self) -> Task {
        match self {
            Metric::Rmse | Metric::Mae => Task::Rating,
            Metric::PrecisionAtK | Metric::RecallAtK | Metric::NdcgAtK => Task::Ranking,
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = EvaluationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Metric::ALL
            .into_iter()
            .find(|metric| metric.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| EvaluationError::UnknownMetric(s.to_string()))
    }
}

impl TryFrom<String> for Metric {
    type Error = EvaluationError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Metric values produced for one model; absent keys were not evaluated
/// or had no eligible samples
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetricsRecord(BTreeMap<Metric, f64>);

impl MetricsRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, metric: Metric) -> Option<f64> {
        self.0.get(&metric).copied()
    }

    pub fn insert(&mut self, metric: Metric, value: f64) {
        self.0.insert(metric, value);
    }

    /// Merge another record into this one (the other record wins on overlap)
    pub fn extend(&mut self, other: MetricsRecord) {
        self.0.extend(other.0);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Metric, f64)> + '_ {
        self.0.iter().map(|(metric, value)| (*metric, *value))
    }
}

impl FromIterator<(Metric, f64)> for MetricsRecord {
    fn from_iter<I: IntoIterator<Item = (Metric, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Root mean squared error over `(prediction, truth)` pairs; `None` if empty
pub fn rmse(pairs: &[(f64, f64)]) -> Option<f64> {
    if pairs.is_empty() {
        return None;
    }
    let sum: f64 = pairs.iter().map(|(p, t)| (p - t).powi(2)).sum();
    Some((sum / pairs.len() as f64).sqrt())
}

/// Mean absolute error over `(prediction, truth)` pairs; `None` if empty
pub fn mae(pairs: &[(f64, f64)]) -> Option<f64> {
    if pairs.is_empty() {
        return None;
    }
    let sum: f64 = pairs.iter().map(|(p, t)| (p - t).abs()).sum();
    Some(sum / pairs.len() as f64)
}

fn hits(recommended: &[&str], relevant: &HashSet<&str>, k: usize) -> usize {
    recommended
        .iter()
        .take(k)
        .collect::<HashSet<_>>()
        .into_iter()
        .filter(|item| relevant.contains(**item))
        .count()
}

/// Relevant items among the first `k` recommendations, divided by `k`
pub fn precision_at_k(recommended: &[&str], relevant: &HashSet<&str>, k: usize) -> f64 {
    if recommended.is_empty() || k == 0 {
        return 0.0;
    }
    hits(recommended, relevant, k) as f64 / k as f64
}

/// Relevant items among the first `k` recommendations, divided by the
/// number of relevant items
pub fn recall_at_k(recommended: &[&str], relevant: &HashSet<&str>, k: usize) -> f64 {
    if relevant.is_empty() {
        return 0.0;
    }
    hits(recommended, relevant, k) as f64 / relevant.len() as f64
}

/// Binary-relevance NDCG over the first `k` recommendations.
///
/// The ideal DCG assumes `min(|relevant|, k)` relevant items at the top.
pub fn ndcg_at_k(recommended: &[&str], relevant: &HashSet<&str>, k: usize) -> f64 {
    let dcg: f64 = recommended
        .iter()
        .take(k)
        .enumerate()
        .filter(|(_, item)| relevant.contains(**item))
        .map(|(rank, _)| 1.0 / ((rank + 2) as f64).log2())
        .sum();

    let idcg: f64 = (0..relevant.len().min(k))
        .map(|rank| 1.0 / ((rank + 2) as f64).log2())
        .sum();

    if idcg > 0.0 { dcg / idcg } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set<'a>(items: &[&'a str]) -> HashSet<&'a str> {
        items.iter().copied().collect()
    }

    #[test]
    fn test_ndcg_single_relevant_at_rank_two() {
        let ndcg = ndcg_at_k(&["itemY", "itemX", "itemZ"], &set(&["itemX"]), 3);
        let expected = 2f64.log2() / 3f64.log2();
        assert!((ndcg - expected).abs() < 1e-12);
        assert!((ndcg - 0.6309).abs() < 1e-4);
    }

    #[test]
    fn test_ndcg_perfect_and_empty() {
        let relevant = set(&["a", "b"]);
        assert!((ndcg_at_k(&["a", "b", "c"], &relevant, 3) - 1.0).abs() < 1e-12);
        assert_eq!(ndcg_at_k(&[], &relevant, 3), 0.0);
        assert_eq!(ndcg_at_k(&["a"], &set(&[]), 3), 0.0);
    }

    #[test]
    fn test_precision_divides_by_k() {
        let relevant = set(&["a", "c"]);
        assert_eq!(precision_at_k(&["a", "b"], &relevant, 4), 0.25);
        assert_eq!(precision_at_k(&[], &relevant, 4), 0.0);
        // only the first k count
        assert_eq!(precision_at_k(&["b", "a"], &relevant, 1), 0.0);
    }

    #[test]
    fn test_recall_divides_by_relevant_count() {
        let relevant = set(&["a", "c", "d"]);
        assert!((recall_at_k(&["a", "c", "x"], &relevant, 3) - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(recall_at_k(&["a"], &set(&[]), 3), 0.0);
    }

    #[test]
    fn test_rmse_and_mae() {
        let pairs = [(3.0, 1.0), (2.0, 2.0), (1.0, 2.0)];
        assert!((rmse(&pairs).unwrap() - (5.0f64 / 3.0).sqrt()).abs() < 1e-12);
        assert!((mae(&pairs).unwrap() - 1.0).abs() < 1e-12);
        assert_eq!(rmse(&[]), None);
        assert_eq!(mae(&[]), None);
    }

    #[test]
    fn test_metric_names_round_trip() {
        for metric in Metric::ALL {
            assert_eq!(metric.as_str().parse::<Metric>().unwrap(), metric);
        }
        assert_eq!("ndcg@k".parse::<Metric>().unwrap(), Metric::NdcgAtK);
        assert!("F1".parse::<Metric>().is_err());
        assert_eq!(Metric::Mae.task(), Task::Rating);
        assert_eq!(Metric::RecallAtK.task(), Task::Ranking);
    }

    #[test]
    fn test_record_serializes_with_display_names() {
        let mut record = MetricsRecord::new();
        record.insert(Metric::NdcgAtK, 0.5);
        record.insert(Metric::Rmse, 1.25);
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"RMSE":1.25,"NDCG@K":0.5}"#);

        let back: MetricsRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_json_accepts_any_case_like_the_command_line() {
        let metric: Metric = serde_json::from_str(r#""ndcg@k""#).unwrap();
        assert_eq!(metric, Metric::NdcgAtK);
        assert_eq!(metric, "ndcg@k".parse().unwrap());

        let record: MetricsRecord = serde_json::from_str(r#"{"rmse":0.5}"#).unwrap();
        assert_eq!(record.get(Metric::Rmse), Some(0.5));

        assert!(serde_json::from_str::<Metric>(r#""F1""#).is_err());
    }
}
