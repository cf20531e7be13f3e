//! Neighbour aggregation and score normalization shared by the CF models.

/// One eligible neighbour of a prediction: its similarity to the target and
/// the value it contributes (a mean-centred rating, or a raw implicit score).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub similarity: f64,
    pub value: f64,
}

impl Neighbor {
    pub fn new(similarity: f64, value: f64) -> Self {
        Self { similarity, value }
    }
}

/// Keep the `k` neighbours with the largest |similarity|.
///
/// `None` or `Some(0)` keeps everyone. The sort is stable, so among equal
/// magnitudes the earlier neighbour survives.
pub fn select_neighbors(mut neighbors: Vec<Neighbor>, k: Option<usize>) -> Vec<Neighbor> {
    if let Some(k) = k.filter(|&k| k > 0) {
        if neighbors.len() > k {
            neighbors.sort_by(|a, b| b.similarity.abs().total_cmp(&a.similarity.abs()));
            neighbors.truncate(k);
        }
    }
    neighbors
}

/// `(sum(sim * value), sum(|sim|))`
fn accumulate(neighbors: &[Neighbor]) -> (f64, f64) {
    neighbors.iter().fold((0.0, 0.0), |(num, den), n| {
        (num + n.similarity * n.value, den + n.similarity.abs())
    })
}

/// Similarity-weighted mean residual; `0.0` when the weights sum to zero
pub fn weighted_residual(neighbors: &[Neighbor]) -> f64 {
    let (num, den) = accumulate(neighbors);
    if den == 0.0 { 0.0 } else { num / den }
}

/// Similarity-weighted average; `None` when the weights sum to zero
pub fn weighted_average(neighbors: &[Neighbor]) -> Option<f64> {
    let (num, den) = accumulate(neighbors);
    (den != 0.0).then(|| num / den)
}

/// Clamp an explicit prediction to [-10, 10] and rescale to [0, 1]
pub fn normalize_rating(pred: Option<f64>) -> Option<f64> {
    pred.filter(|p| !p.is_nan())
        .map(|p| (p.clamp(-10.0, 10.0) + 10.0) / 20.0)
}

/// Clamp an implicit prediction to [0, 5] and rescale to [0, 1]
pub fn normalize_implicit(pred: Option<f64>) -> Option<f64> {
    pred.filter(|p| !p.is_nan())
        .map(|p| p.clamp(0.0, 5.0) / 5.0)
}

/// `alpha * rating + (1 - alpha) * implicit`, or whichever side exists
pub fn blend(rating: Option<f64>, implicit: Option<f64>, alpha: f64) -> Option<f64> {
    match (rating, implicit) {
        (Some(r), Some(i)) => Some(alpha * r + (1.0 - alpha) * i),
        (Some(r), None) => Some(r),
        (None, Some(i)) => Some(i),
        (None, None) => None,
    }
}
