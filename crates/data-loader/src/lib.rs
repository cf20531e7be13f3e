//! # Data Loader Crate
//!
//! This crate handles loading the user/book interaction table the
//! recommendation models are trained on.
//!
//! ## Main Components
//!
//! - **types**: Core domain types (Interaction, UserId, ItemId)
//! - **parser**: Parse CSV exports into Rust structs
//! - **repository**: The `InteractionRepository` boundary and its CSV / in-memory implementations
//! - **fingerprint**: Content hash used to detect dataset changes
//! - **error**: Error types for data loading
//!
//! ## Example Usage
//!
//! ```ignore
//! use data_loader::{CsvRepository, InteractionRepository, fingerprint};
//!
//! let repo = CsvRepository::new("data/interactions.csv");
//! let rows = repo.load_interactions()?;
//! println!("{} rows, fingerprint {}", rows.len(), fingerprint(&rows));
//! ```

// Public modules
pub mod error;
pub mod fingerprint;
pub mod parser;
pub mod repository;
pub mod types;

// Re-export commonly used types for convenience
pub use error::{DataLoadError, Result};
pub use fingerprint::fingerprint;
pub use parser::parse_interactions;
pub use repository::{CsvRepository, InMemoryRepository, InteractionRepository};
pub use types::{item_names, sorted_items, sorted_users, Interaction, ItemId, UserId};
