//! Similarity Engine
//!
//! Two metric families, each computed over every pair of rows of an
//! [`InteractionMatrix`]:
//!
//! - **Pearson** over explicit ratings. Only positions observed in both rows
//!   count, but each row is centred on the mean of *all* its observed cells.
//! - **Cosine** over implicit scores, with missing cells read as `0.0`.
//!
//! Degenerate cases (fewer than two overlapping cells, zero variance, zero
//! norm) have similarity `0.0`. Results are symmetric by construction: only
//! the upper triangle is computed and then mirrored.

use crate::matrix::{mean_of, InteractionMatrix};
use ndarray::{Array2, ArrayView1};
use rayon::prelude::*;
use tracing::{debug, instrument};

/// Square matrix indexed by the row positions of its source matrix
pub type SimilarityMatrix = Array2<f64>;

/// Pearson correlation between two rows with missing cells.
///
/// Each row is centred on its own full observed mean. Returns `0.0` when
/// fewer than two positions are observed in both rows or when either row
/// has zero variance over the overlap.
pub fn pearson_row_similarity(
    a: ArrayView1<'_, Option<f64>>,
    b: ArrayView1<'_, Option<f64>>,
) -> f64 {
    match (mean_of(a), mean_of(b)) {
        (Some(mean_a), Some(mean_b)) => pearson_centered(a, b, mean_a, mean_b),
        _ => 0.0,
    }
}

fn pearson_centered(
    a: ArrayView1<'_, Option<f64>>,
    b: ArrayView1<'_, Option<f64>>,
    mean_a: f64,
    mean_b: f64,
) -> f64 {
    let mut overlap = 0usize;
    let mut numerator = 0.0;
    let mut sum_sq_a = 0.0;
    let mut sum_sq_b = 0.0;

    for (x, y) in a.iter().zip(b.iter()) {
        if let (Some(x), Some(y)) = (x, y) {
            let dx = x - mean_a;
            let dy = y - mean_b;
            numerator += dx * dy;
            sum_sq_a += dx * dx;
            sum_sq_b += dy * dy;
            overlap += 1;
        }
    }

    if overlap < 2 {
        return 0.0;
    }
    let denominator = (sum_sq_a * sum_sq_b).sqrt();
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

/// Pearson similarity between every pair of rows of `matrix`
#[instrument(skip(matrix), fields(rows = matrix.nrows(), cols = matrix.ncols()))]
pub fn pearson_matrix(matrix: &InteractionMatrix) -> SimilarityMatrix {
    let sims = symmetric_from_fn(matrix.nrows(), |i, j| {
        match (matrix.row_mean(i), matrix.row_mean(j)) {
            (Some(mean_i), Some(mean_j)) => {
                pearson_centered(matrix.row(i), matrix.row(j), mean_i, mean_j)
            }
            _ => 0.0,
        }
    });
    debug!("Built {}x{} Pearson similarity matrix", sims.nrows(), sims.ncols());
    sims
}

/// Cosine similarity between every pair of rows, missing cells read as `0.0`.
///
/// The source matrix is not modified. A pair where either row has zero norm
/// has similarity `0.0`; every other row is ~1.0 with itself.
#[instrument(skip(matrix), fields(rows = matrix.nrows(), cols = matrix.ncols()))]
pub fn cosine_similarity_full(matrix: &InteractionMatrix) -> SimilarityMatrix {
    let filled = matrix.filled();
    let norms: Vec<f64> = filled
        .rows()
        .into_iter()
        .map(|row| row.dot(&row).sqrt())
        .collect();

    let sims = symmetric_from_fn(filled.nrows(), |i, j| {
        if norms[i] == 0.0 || norms[j] == 0.0 {
            0.0
        } else {
            filled.row(i).dot(&filled.row(j)) / (norms[i] * norms[j])
        }
    });
    debug!("Built {}x{} cosine similarity matrix", sims.nrows(), sims.ncols());
    sims
}

/// Fill an `n x n` matrix from `f(i, j)` for `i <= j`, mirroring the rest.
///
/// Rows of the upper triangle are computed in parallel.
fn symmetric_from_fn<F>(n: usize, f: F) -> SimilarityMatrix
where
    F: Fn(usize, usize) -> f64 + Sync,
{
    let upper: Vec<Vec<f64>> = (0..n)
        .into_par_iter()
        .map(|i| (i..n).map(|j| f(i, j)).collect())
        .collect();

    let mut sims = Array2::zeros((n, n));
    for (i, row) in upper.into_iter().enumerate() {
        for (offset, value) in row.into_iter().enumerate() {
            let j = i + offset;
            sims[[i, j]] = value;
            sims[[j, i]] = value;
        }
    }
    sims
}
