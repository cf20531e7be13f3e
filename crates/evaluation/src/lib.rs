//! Evaluation harness for the recommendation models.
//!
//! This crate provides:
//! - A seeded per-user train/test split
//! - Rating metrics (RMSE, MAE) and ranking metrics (Precision@K, Recall@K, NDCG@K)
//! - `Evaluator` for scoring any `Recommender` on either task
//! - Ensemble weights derived from metrics, and weighted ensemble recommendations
//! - Best-model selection by a single metric
//!
//! ## Flow
//! 1. `train_test_split` partitions the interactions
//! 2. Each model is fitted on `split.train`
//! 3. `Evaluator::evaluate_models` scores them against `split.test`
//! 4. `select_best_model` and `compute_ensemble_weights` turn the scores into
//!    a serving decision
//!
//! ## Example Usage
//! ```ignore
//! use evaluation::{train_test_split, select_best_model, Evaluator, Metric, Task};
//!
//! let split = train_test_split(&interactions, 0.2, 42)?;
//! let user_cf = UserCf::fit(&split.train, CfConfig::default());
//! let item_cf = ItemCf::fit(&split.train, CfConfig::default());
//!
//! let metrics = Evaluator::new(10).evaluate_models(&[&user_cf, &item_cf], &split);
//! let best = select_best_model(&metrics, Metric::NdcgAtK, Task::Ranking)?;
//! ```

pub mod ensemble;
pub mod error;
pub mod evaluator;
pub mod metrics;
pub mod selection;
pub mod split;

// Re-export main types
pub use ensemble::{compute_ensemble_weights, ensemble_recommend, EnsembleWeights, DEFAULT_ENSEMBLE_DEPTH};
pub use error::{EvaluationError, Result};
pub use evaluator::Evaluator;
pub use metrics::{Metric, MetricsRecord, Task};
pub use selection::select_best_model;
pub use split::{train_test_split, Split};
