//! Sources of interaction data.
//!
//! The production store is a relational database owned by the web shop;
//! this crate only defines the boundary ([`InteractionRepository`]) plus two
//! implementations: a CSV export re-read on every call, and an in-memory
//! table used by tests and embedders.

use crate::error::{DataLoadError, Result};
use crate::parser;
use crate::types::Interaction;
use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Anything that can materialize the current interaction table.
///
/// `Send + Sync` so a single repository can be shared by the model manager
/// and whatever serves requests.
pub trait InteractionRepository: Send + Sync {
    /// Fetch the full table as it is right now
    fn load_interactions(&self) -> Result<Vec<Interaction>>;
}

/// Reads a CSV export from disk each time it is asked
#[derive(Debug, Clone)]
pub struct CsvRepository {
    path: PathBuf,
}

impl CsvRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl InteractionRepository for CsvRepository {
    fn load_interactions(&self) -> Result<Vec<Interaction>> {
        let rows = parser::parse_interactions(&self.path)?;
        debug!("Loaded {} interactions from {}", rows.len(), self.path.display());
        if rows.is_empty() {
            return Err(DataLoadError::EmptyDataset);
        }
        Ok(rows)
    }
}

/// Interaction table held in memory behind a lock
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    rows: RwLock<Vec<Interaction>>,
}

impl InMemoryRepository {
    pub fn new(rows: Vec<Interaction>) -> Self {
        Self {
            rows: RwLock::new(rows),
        }
    }

    /// Swap the whole table
    pub fn replace(&self, rows: Vec<Interaction>) {
        *self.rows.write() = rows;
    }

    /// Append a single row
    pub fn push(&self, row: Interaction) {
        self.rows.write().push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.read().is_empty()
    }
}

impl InteractionRepository for InMemoryRepository {
    fn load_interactions(&self) -> Result<Vec<Interaction>> {
        let rows = self.rows.read().clone();
        if rows.is_empty() {
            return Err(DataLoadError::EmptyDataset);
        }
        Ok(rows)
    }
}
