//! The prediction contract every model exposes.

use crate::types::{ModelKind, ScoredItem};
use anyhow::Result;

/// Core trait shared by UserCF, ItemCF and matrix factorization.
///
/// ## Design Note
/// - `Send + Sync` so trained models can sit inside a shared snapshot
/// - `Ok(None)` means "no prediction" (unknown user or item); `Err` is a
///   model failure, which the evaluator treats as a skipped sample
pub trait Recommender: Send + Sync {
    /// Which model family this is (for logging and selection)
    fn kind(&self) -> ModelKind;

    /// Predict the rating `user` would give `item`
    fn predict_rating(&self, user: &str, item: &str) -> Result<Option<f64>>;

    /// Best `n` items for `user`, highest score first
    fn recommend_top_n(&self, user: &str, n: usize) -> Result<Vec<ScoredItem>>;
}
