//! # Models Crate
//!
//! This crate implements the three book recommendation model families.
//!
//! ## Components
//!
//! ### UserCF (user-based collaborative filtering)
//! "Readers like you also liked...":
//! - Pearson similarity between users over explicit ratings
//! - Cosine similarity between users over implicit scores
//! - Blended into one score with `alpha`
//!
//! ### ItemCF (item-based collaborative filtering)
//! "Books similar to the ones you rated": the same two similarities,
//! computed between items.
//!
//! ### Matrix Factorization
//! Latent user/item factors trained by SGD on the combined
//! `rating + implicit_score` signal.
//!
//! All three implement [`Recommender`], so evaluation and ensembling can treat
//! them uniformly.
//!
//! ## Example Usage
//!
//! ```ignore
//! use models::{CfConfig, MfConfig, MatrixFactorization, Recommender, UserCf};
//!
//! let user_cf = UserCf::fit(&train, CfConfig::default());
//! let mf = MatrixFactorization::fit(&train, MfConfig::default())?;
//!
//! let recs = user_cf.recommend_top_n("u1", 10)?;
//! let score = mf.predict_rating("u1", "B7")?;
//! ```

// Public modules
pub mod config;
pub mod error;
pub mod item_cf;
pub mod matrix;
pub mod matrix_factorization;
pub mod neighborhood;
pub mod similarity;
pub mod traits;
pub mod types;
pub mod user_cf;

// Re-export commonly used types
pub use config::{CfConfig, MfConfig};
pub use error::{ModelError, Result};
pub use item_cf::ItemCf;
pub use matrix::{InteractionMatrix, Signal};
pub use matrix_factorization::MatrixFactorization;
pub use similarity::{cosine_similarity_full, pearson_matrix, SimilarityMatrix};
pub use traits::Recommender;
pub use types::{rank_top_n, ModelKind, ScoredItem};
pub use user_cf::UserCf;
