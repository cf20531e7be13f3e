//! Error types for evaluation and model selection.

use thiserror::Error;

/// Structurally invalid input to the evaluation harness.
///
/// Everything else (missing predictions, failed recommendations, users
/// with no eligible samples) degrades to a default instead of erroring.
#[derive(Error, Debug)]
pub enum EvaluationError {
    #[error("Cannot split an empty interaction set")]
    EmptyDataset,

    #[error("Test ratio must be within [0, 1], got {0}")]
    InvalidTestRatio(f64),

    /// The selection criterion is not a known metric name
    #[error("Unknown metric '{0}'")]
    UnknownMetric(String),

    /// No metrics record carries the requested criterion
    #[error("No model was scored on {0}")]
    CriterionMissing(String),

    #[error("No models to choose from")]
    NoModels,
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, EvaluationError>;
