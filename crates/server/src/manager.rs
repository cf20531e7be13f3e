//! # Model Manager
//!
//! Owns the published [`ModelSnapshot`] and retrains when the dataset
//! changes:
//! 1. Load the interactions from the repository
//! 2. Fingerprint them
//! 3. If the fingerprint matches the published snapshot, return it as is
//! 4. Otherwise train a new snapshot and publish it
//!
//! Readers take an `Arc` clone of the current snapshot under a short read
//! lock, so they never observe a partially retrained state. Retrains are
//! serialized by a separate mutex and only swap the pointer once training
//! has fully succeeded.

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use parking_lot::{Mutex, RwLock};
use tracing::{debug, info};

use data_loader::{fingerprint, InteractionRepository};

use crate::config::ManagerConfig;
use crate::snapshot::ModelSnapshot;

pub struct ModelManager<R> {
    repository: R,
    config: ManagerConfig,
    current: RwLock<Option<Arc<ModelSnapshot>>>,
    retrain: Mutex<()>,
}

impl<R: InteractionRepository> ModelManager<R> {
    /// Create an uninitialized manager; nothing is trained until the first
    /// `reload_if_needed`
    pub fn new(repository: R, config: ManagerConfig) -> Self {
        Self {
            repository,
            config,
            current: RwLock::new(None),
            retrain: Mutex::new(()),
        }
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    /// The published snapshot, if any retrain has succeeded yet
    pub fn current(&self) -> Option<Arc<ModelSnapshot>> {
        self.current.read().clone()
    }

    /// Retrain if the dataset changed since the published snapshot.
    ///
    /// Returns the snapshot that is current afterwards. On failure (empty
    /// dataset, repository error, no model scored on the criterion) the
    /// previously published snapshot stays in place.
    pub fn reload_if_needed(&self) -> Result<Arc<ModelSnapshot>> {
        let _guard = self.retrain.lock();

        let interactions = self
            .repository
            .load_interactions()
            .context("Failed to load interactions")?;
        let fingerprint = fingerprint(&interactions);

        let previous = self.current();
        if let Some(snapshot) = &previous {
            if snapshot.fingerprint() == fingerprint {
                debug!("Dataset unchanged, serving generation {}", snapshot.generation());
                return Ok(Arc::clone(snapshot));
            }
        }

        let generation = previous.as_ref().map_or(1, |s| s.generation() + 1);
        info!(
            "Dataset changed ({} rows, fingerprint {}), retraining",
            interactions.len(),
            &fingerprint[..12]
        );

        let start_time = Instant::now();
        let snapshot = Arc::new(ModelSnapshot::train(
            &interactions,
            fingerprint,
            generation,
            &self.config,
        )?);
        *self.current.write() = Some(Arc::clone(&snapshot));

        info!(
            "Published generation {} in {:.2?}, best model: {}",
            generation,
            start_time.elapsed(),
            snapshot.best()
        );
        Ok(snapshot)
    }
}
