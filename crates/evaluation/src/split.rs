//! Seeded per-user train/test split.

use crate::error::{EvaluationError, Result};
use data_loader::{Interaction, UserId};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// A partition of an interaction set
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Split {
    pub train: Vec<Interaction>,
    pub test: Vec<Interaction>,
}

impl Split {
    /// Distinct users of the test set, in order of first appearance
    pub fn test_users(&self) -> Vec<&str> {
        let mut seen = BTreeSet::new();
        self.test
            .iter()
            .map(|row| row.user_id.as_str())
            .filter(|user| seen.insert(*user))
            .collect()
    }
}

/// Hold out `max(1, floor(len * test_ratio))` interactions of every user.
///
/// Users are visited in ascending id order and one RNG seeded with `seed`
/// drives every draw, so the same input and seed always give the same
/// partition. Within each user, rows keep their input order. A user with a
/// single interaction ends up entirely in `test`.
pub fn train_test_split(
    interactions: &[Interaction],
    test_ratio: f64,
    seed: u64,
) -> Result<Split> {
    if interactions.is_empty() {
        return Err(EvaluationError::EmptyDataset);
    }
    if !(0.0..=1.0).contains(&test_ratio) {
        return Err(EvaluationError::InvalidTestRatio(test_ratio));
    }

    let mut by_user: BTreeMap<&UserId, Vec<&Interaction>> = BTreeMap::new();
    for row in interactions {
        by_user.entry(&row.user_id).or_default().push(row);
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut split = Split::default();

    for rows in by_user.values() {
        let n_test = ((rows.len() as f64 * test_ratio).floor() as usize).clamp(1, rows.len());
        let held_out: BTreeSet<usize> =
            rand::seq::index::sample(&mut rng, rows.len(), n_test).into_iter().collect();

        for (i, row) in rows.iter().enumerate() {
            if held_out.contains(&i) {
                split.test.push((*row).clone());
            } else {
                split.train.push((*row).clone());
            }
        }
    }

    debug!(
        "Split {} interactions of {} users into {} train / {} test",
        interactions.len(),
        by_user.len(),
        split.train.len(),
        split.test.len()
    );
    Ok(split)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_rows() -> Vec<Interaction> {
        let mut rows = Vec::new();
        for u in 0..6 {
            for i in 0..(u + 1) {
                rows.push(
                    Interaction::new(format!("u{u}"), format!("B{i}")).with_rating((i % 5 + 1) as f64),
                );
            }
        }
        rows
    }

    #[test]
    fn test_split_is_deterministic_for_seed() {
        let rows = create_rows();
        let a = train_test_split(&rows, 0.2, 42).unwrap();
        let b = train_test_split(&rows, 0.2, 42).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_every_user_has_a_test_row() {
        let rows = create_rows();
        let split = train_test_split(&rows, 0.2, 7).unwrap();

        let users: BTreeSet<_> = rows.iter().map(|r| r.user_id.clone()).collect();
        let test_users: BTreeSet<_> = split.test.iter().map(|r| r.user_id.clone()).collect();
        assert_eq!(users, test_users);
        assert_eq!(split.train.len() + split.test.len(), rows.len());
    }

    #[test]
    fn test_hold_out_size_per_user() {
        let rows = create_rows();
        let split = train_test_split(&rows, 0.5, 1).unwrap();
        // u5 has 6 rows -> 3 held out; u0 has 1 row -> 1 held out
        let count = |user: &str| split.test.iter().filter(|r| r.user_id == user).count();
        assert_eq!(count("u5"), 3);
        assert_eq!(count("u0"), 1);
        assert_eq!(count("u2"), 1);
    }

    #[test]
    fn test_single_interaction_user_goes_to_test() {
        let rows = vec![Interaction::new("solo", "B1").with_rating(4.0)];
        let split = train_test_split(&rows, 0.2, 42).unwrap();
        assert!(split.train.is_empty());
        assert_eq!(split.test, rows);
    }

    #[test]
    fn test_invalid_input() {
        assert!(matches!(
            train_test_split(&[], 0.2, 42),
            Err(EvaluationError::EmptyDataset)
        ));
        assert!(matches!(
            train_test_split(&create_rows(), 1.5, 42),
            Err(EvaluationError::InvalidTestRatio(_))
        ));
    }

    #[test]
    fn test_test_users_in_first_appearance_order() {
        let split = Split {
            train: Vec::new(),
            test: vec![
                Interaction::new("u2", "B1").with_rating(1.0),
                Interaction::new("u1", "B1").with_rating(1.0),
                Interaction::new("u2", "B2").with_rating(1.0),
            ],
        };
        assert_eq!(split.test_users(), vec!["u2", "u1"]);
    }
}
