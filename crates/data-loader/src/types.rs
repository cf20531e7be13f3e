//! Core domain types for the interaction dataset.
//!
//! Every observation the store hands us is an [`Interaction`]: one user,
//! one book, and up to two signals. Missing signals are `None`, never `0.0`,
//! because a zero rating is a legitimate value and must not be confused
//! with "the user never rated this book".

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

// =============================================================================
// Type Aliases
// =============================================================================

/// Opaque identifier for a user. Ordered lexicographically wherever the
/// models need a deterministic axis.
pub type UserId = String;

/// Opaque identifier for an item (a book in the shop).
pub type ItemId = String;

// =============================================================================
// Interaction
// =============================================================================

/// A single (user, item) observation.
///
/// At least one of `rating` / `implicit_score` is expected to be present;
/// the CSV parser rejects rows with neither.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    pub user_id: UserId,
    pub item_id: ItemId,
    /// Explicit score given by the user
    pub rating: Option<f64>,
    /// Behaviour-derived signal (views, add-to-cart, purchases)
    pub implicit_score: Option<f64>,
    /// Display name of the book, when the export carries one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_name: Option<String>,
}

impl Interaction {
    /// Create an interaction with no signals attached yet
    pub fn new(user_id: impl Into<UserId>, item_id: impl Into<ItemId>) -> Self {
        Self {
            user_id: user_id.into(),
            item_id: item_id.into(),
            rating: None,
            implicit_score: None,
            item_name: None,
        }
    }

    /// Attach an explicit rating (builder style)
    pub fn with_rating(mut self, rating: f64) -> Self {
        self.rating = Some(rating);
        self
    }

    /// Attach an implicit score (builder style)
    pub fn with_implicit_score(mut self, score: f64) -> Self {
        self.implicit_score = Some(score);
        self
    }

    pub fn with_item_name(mut self, name: impl Into<String>) -> Self {
        self.item_name = Some(name.into());
        self
    }

    /// Both signals absent: the row carries no information
    pub fn is_empty(&self) -> bool {
        self.rating.is_none() && self.implicit_score.is_none()
    }
}

/// Distinct user ids in ascending order
pub fn sorted_users(interactions: &[Interaction]) -> Vec<UserId> {
    interactions
        .iter()
        .map(|i| i.user_id.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Distinct item ids in ascending order
pub fn sorted_items(interactions: &[Interaction]) -> Vec<ItemId> {
    interactions
        .iter()
        .map(|i| i.item_id.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Item id to display name; a later row overrides an earlier one
pub fn item_names(interactions: &[Interaction]) -> BTreeMap<ItemId, String> {
    interactions
        .iter()
        .filter_map(|i| Some((i.item_id.clone(), i.item_name.clone()?)))
        .collect()
}
