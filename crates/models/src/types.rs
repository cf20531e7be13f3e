//! Shared types: model identity and scored recommendations.

use data_loader::ItemId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identity of each model family, as used in metrics and selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    UserCf,
    ItemCf,
    Mf,
}

impl ModelKind {
    /// Every model, in evaluation order
    pub const ALL: [ModelKind; 3] = [ModelKind::UserCf, ModelKind::ItemCf, ModelKind::Mf];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelKind::UserCf => "user_cf",
            ModelKind::ItemCf => "item_cf",
            ModelKind::Mf => "mf",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for ModelKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user_cf" => Ok(ModelKind::UserCf),
            "item_cf" => Ok(ModelKind::ItemCf),
            "mf" => Ok(ModelKind::Mf),
            other => Err(format!("unknown model '{}'", other)),
        }
    }
}

/// An item together with the score a model assigned to it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredItem {
    pub item_id: ItemId,
    pub score: f64,
}

impl ScoredItem {
    pub fn new(item_id: impl Into<ItemId>, score: f64) -> Self {
        Self {
            item_id: item_id.into(),
            score,
        }
    }
}

/// Sort by score descending and keep the first `n`.
///
/// The sort is stable, so equal scores keep their input order.
pub fn rank_top_n(mut scored: Vec<ScoredItem>, n: usize) -> Vec<ScoredItem> {
    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
    scored.truncate(n);
    scored
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_kind_identity_strings() {
        for kind in ModelKind::ALL {
            assert_eq!(kind.to_string().parse::<ModelKind>().unwrap(), kind);
        }
        assert_eq!(ModelKind::ItemCf.as_str(), "item_cf");
        assert!("svd".parse::<ModelKind>().is_err());
    }

    #[test]
    fn test_rank_top_n_is_stable_on_ties() {
        let ranked = rank_top_n(
            vec![
                ScoredItem::new("B1", 0.5),
                ScoredItem::new("B2", 0.9),
                ScoredItem::new("B3", 0.5),
                ScoredItem::new("B4", 0.1),
            ],
            3,
        );
        let ids: Vec<_> = ranked.iter().map(|s| s.item_id.as_str()).collect();
        assert_eq!(ids, vec!["B2", "B1", "B3"]);
    }
}
