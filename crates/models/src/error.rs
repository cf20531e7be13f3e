//! Error types for model training.

use thiserror::Error;

/// Errors raised while fitting a model.
///
/// Prediction never errors: an unknown user or item is `None`.
#[derive(Error, Debug)]
pub enum ModelError {
    /// A hyper-parameter is outside its valid range
    #[error("Invalid configuration for {field}: {reason}")]
    InvalidConfig { field: String, reason: String },
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, ModelError>;
