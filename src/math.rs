use rand::Rng;

/// Draw an index with probability proportional to `weights`.
///
/// `total` must be the sum of `weights`. A single uniform draw is scaled to
/// `total` and located on the cumulative weights. All weights must be
/// non-negative and `total` must be positive and finite.
#[inline]
pub(crate) fn sample_weighted<R: Rng + ?Sized>(weights: &[f64], total: f64, rng: &mut R) -> usize {
    debug_assert!(!weights.is_empty());
    debug_assert!(total.is_finite() && total > 0.);
    let target = rng.random::<f64>() * total;
    let mut cumulative = 0f64;
    for (idx, &weight) in weights.iter().enumerate() {
        cumulative += weight;
        if target < cumulative {
            return idx;
        }
    }
    // Rounding can leave `target` just above the accumulated sum.
    weights
        .iter()
        .rposition(|&weight| weight > 0.)
        .unwrap_or(weights.len() - 1)
}

/// Indices of the `n` largest values, largest first. Ties keep the lower index first.
pub(crate) fn top_indices(values: &[f64], n: usize) -> Vec<usize> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[b].total_cmp(&values[a]).then(a.cmp(&b)));
    order.truncate(n);
    order
}

/// Perplexity from a log-likelihood over `num_tokens` tokens.
///
/// An empty corpus has perplexity 1.
#[inline]
pub(crate) fn perplexity(log_likelihood: f64, num_tokens: usize) -> f64 {
    if num_tokens == 0 {
        return 1.;
    }
    (-log_likelihood / num_tokens as f64).exp()
}
