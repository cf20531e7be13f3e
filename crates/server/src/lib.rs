//! Server crate for the book recommendation engine.
//!
//! This crate contains the model manager that keeps a trained, evaluated
//! set of models in sync with the interaction data, plus the settings that
//! drive a retrain.

pub mod config;
pub mod manager;
pub mod snapshot;

pub use config::ManagerConfig;
pub use manager::ModelManager;
pub use snapshot::{ModelChoice, ModelSnapshot};

use std::sync::Arc;

use anyhow::{Context, Result};
use data_loader::InteractionRepository;

/// Run `reload_if_needed` on the blocking pool so an async caller is not
/// stalled by a retrain
pub async fn reload_in_background<R>(manager: Arc<ModelManager<R>>) -> Result<Arc<ModelSnapshot>>
where
    R: InteractionRepository + 'static,
{
    tokio::task::spawn_blocking(move || manager.reload_if_needed())
        .await
        .context("Reload task panicked")?
}
