//! Dense interaction matrices with explicit missing cells.
//!
//! A cell is `Option<f64>`: `None` means "no observation", which is not the
//! same as an observed `0.0`. Means and similarities only ever look at
//! `Some` cells.

use data_loader::{Interaction, ItemId, UserId};
use ndarray::{Array2, ArrayView1};
use std::collections::HashMap;

/// Which signal of an [`Interaction`] a matrix is pivoted on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Rating,
    Implicit,
}

impl Signal {
    fn of(self, interaction: &Interaction) -> Option<f64> {
        match self {
            Signal::Rating => interaction.rating,
            Signal::Implicit => interaction.implicit_score,
        }
    }
}

/// A labelled `rows x cols` matrix of optional values.
///
/// Row and column labels are kept in the order they were given (callers pass
/// sorted axes), and each row's mean over its observed cells is computed once
/// at construction.
#[derive(Debug, Clone)]
pub struct InteractionMatrix {
    rows: Vec<String>,
    cols: Vec<String>,
    row_index: HashMap<String, usize>,
    col_index: HashMap<String, usize>,
    cells: Array2<Option<f64>>,
    means: Vec<Option<f64>>,
}

impl InteractionMatrix {
    /// Pivot `interactions` onto a users x items grid.
    ///
    /// Rows whose `signal` is missing leave their cell empty. If the same
    /// (user, item) pair appears more than once the last value wins.
    pub fn pivot(
        interactions: &[Interaction],
        users: &[UserId],
        items: &[ItemId],
        signal: Signal,
    ) -> Self {
        let row_index = index_of(users);
        let col_index = index_of(items);
        let mut cells = Array2::from_elem((users.len(), items.len()), None);

        for interaction in interactions {
            let Some(value) = signal.of(interaction) else {
                continue;
            };
            if let (Some(&r), Some(&c)) = (
                row_index.get(&interaction.user_id),
                col_index.get(&interaction.item_id),
            ) {
                cells[[r, c]] = Some(value);
            }
        }

        Self::from_parts(users.to_vec(), items.to_vec(), cells)
    }

    fn from_parts(rows: Vec<String>, cols: Vec<String>, cells: Array2<Option<f64>>) -> Self {
        let means = cells.rows().into_iter().map(mean_of).collect();
        Self {
            row_index: index_of(&rows),
            col_index: index_of(&cols),
            rows,
            cols,
            cells,
            means,
        }
    }

    /// Swap rows and columns (users x items becomes items x users)
    pub fn transpose(&self) -> Self {
        Self::from_parts(
            self.cols.clone(),
            self.rows.clone(),
            self.cells.t().to_owned(),
        )
    }

    pub fn rows(&self) -> &[String] {
        &self.rows
    }

    pub fn cols(&self) -> &[String] {
        &self.cols
    }

    pub fn nrows(&self) -> usize {
        self.rows.len()
    }

    pub fn ncols(&self) -> usize {
        self.cols.len()
    }

    pub fn row_position(&self, key: &str) -> Option<usize> {
        self.row_index.get(key).copied()
    }

    pub fn col_position(&self, key: &str) -> Option<usize> {
        self.col_index.get(key).copied()
    }

    /// Value at (row, col); `None` if unobserved
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        self.cells[[row, col]]
    }

    /// Value at (row label, col label); `None` if either label is unknown
    /// or the cell is unobserved
    pub fn lookup(&self, row: &str, col: &str) -> Option<f64> {
        self.get(self.row_position(row)?, self.col_position(col)?)
    }

    pub fn row(&self, row: usize) -> ArrayView1<'_, Option<f64>> {
        self.cells.row(row)
    }

    /// Mean over the observed cells of `row`, `None` if it has none
    pub fn row_mean(&self, row: usize) -> Option<f64> {
        self.means[row]
    }

    /// Copy with missing cells replaced by `0.0`
    pub fn filled(&self) -> Array2<f64> {
        self.cells.mapv(|cell| cell.unwrap_or(0.0))
    }

    /// Number of observed cells
    pub fn observed(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_some()).count()
    }
}

fn index_of(labels: &[String]) -> HashMap<String, usize> {
    labels
        .iter()
        .enumerate()
        .map(|(i, label)| (label.clone(), i))
        .collect()
}

/// Mean over the `Some` entries of a row
pub fn mean_of(row: ArrayView1<'_, Option<f64>>) -> Option<f64> {
    let (sum, count) = row
        .iter()
        .flatten()
        .fold((0.0_f64, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}
