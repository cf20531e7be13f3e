//! Retrain pipeline settings.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use evaluation::{Metric, Task, DEFAULT_ENSEMBLE_DEPTH};
use models::{CfConfig, MfConfig};

/// Everything the model manager needs to run a retrain.
///
/// Missing fields in a JSON file take their default value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    /// Fraction of each user's interactions held out for evaluation
    pub test_ratio: f64,
    /// Seed for the train/test split
    pub seed: u64,
    /// Cutoff for the ranking metrics
    pub top_k: usize,
    /// Metric the best model is chosen by
    pub criterion: Metric,
    /// Items requested from each model before ensemble blending
    pub ensemble_depth: usize,
    pub cf: CfConfig,
    pub mf: MfConfig,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            test_ratio: 0.2,
            seed: 42,
            top_k: 10,
            criterion: Metric::NdcgAtK,
            ensemble_depth: DEFAULT_ENSEMBLE_DEPTH,
            cf: CfConfig::default(),
            mf: MfConfig::default().with_iterations(20),
        }
    }
}

impl ManagerConfig {
    /// Load from a JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse config {}", path.display()))
    }

    /// The task `criterion` belongs to (decides maximise vs minimise)
    pub fn selection_task(&self) -> Task {
        self.criterion.task()
    }

    pub fn with_criterion(mut self, criterion: Metric) -> Self {
        self.criterion = criterion;
        self
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self.mf.seed = seed;
        self
    }

    pub fn with_test_ratio(mut self, test_ratio: f64) -> Self {
        self.test_ratio = test_ratio;
        self
    }
}
