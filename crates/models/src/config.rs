//! Hyper-parameters for the three model families.
//!
//! `k` means two different things here: the neighbourhood size of the CF
//! models (`CfConfig::neighborhood_size`) and the latent dimensionality of
//! matrix factorization (`MfConfig::factors`).

use serde::{Deserialize, Serialize};

/// Settings shared by UserCF and ItemCF
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CfConfig {
    /// Weight of the explicit-rating prediction when blending with implicit
    pub alpha: f64,
    /// Keep only this many most-similar neighbours per prediction
    pub neighborhood_size: Option<usize>,
}

impl Default for CfConfig {
    fn default() -> Self {
        Self {
            alpha: 0.6,
            neighborhood_size: None,
        }
    }
}

impl CfConfig {
    /// Configure the explicit/implicit blend weight (default: 0.6)
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    /// Configure neighbourhood truncation (default: use every neighbour)
    pub fn with_neighborhood_size(mut self, k: usize) -> Self {
        self.neighborhood_size = Some(k);
        self
    }
}

/// Settings for SGD matrix factorization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MfConfig {
    /// Latent dimensionality
    pub factors: usize,
    pub learning_rate: f64,
    pub regularization: f64,
    /// Full sweeps over the observed cells
    pub iterations: usize,
    /// Seed for factor initialization
    pub seed: u64,
}

impl Default for MfConfig {
    fn default() -> Self {
        Self {
            factors: 3,
            learning_rate: 0.01,
            regularization: 0.05,
            iterations: 30,
            seed: 42,
        }
    }
}

impl MfConfig {
    pub fn with_factors(mut self, factors: usize) -> Self {
        self.factors = factors;
        self
    }

    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    pub fn with_regularization(mut self, regularization: f64) -> Self {
        self.regularization = regularization;
        self
    }

    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}
