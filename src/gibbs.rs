//! One sweep of collapsed Gibbs sampling over all tokens.

use itertools::izip;
use rand::Rng;

use crate::{definition::ModelDefinition, math::sample_weighted, state::Counts, LatentState};

/// Diagnostics recorded after a sweep.
#[derive(Debug, Clone, Copy, PartialEq)]
#[non_exhaustive]
pub struct SweepStats {
    /// Number of sweeps completed, including this one.
    pub sweep: u64,
    /// Tokens whose topic changed during the sweep.
    pub num_changed: usize,
    pub log_likelihood: f64,
    pub perplexity: f64,
}

/// Unnormalized full conditional of a token of `term` in `doc` whose own
/// assignment has been retracted.
///
/// Writes `(n[doc][k] + alpha) * (n[k][term] + beta) / (n[k] + V * beta)`
/// into `weights` and returns their sum.
#[inline]
pub(crate) fn conditional(
    counts: &Counts,
    definition: &ModelDefinition,
    doc: usize,
    term: usize,
    weights: &mut [f64],
) -> f64 {
    let alpha = definition.alpha();
    let beta = definition.beta();
    let beta_sum = definition.beta_sum();

    let mut total = 0f64;
    izip!(
        weights.iter_mut(),
        counts.doc_topic(doc),
        counts.topic_totals()
    )
    .enumerate()
    .for_each(|(topic, (weight, &doc_count, &topic_total))| {
        let term_count = counts.topic_term_count(topic, term) as f64;
        *weight = (doc_count as f64 + alpha) * (term_count + beta) / (topic_total as f64 + beta_sum);
        total += *weight;
    });
    total
}

/// Resample the topic of every token, documents in corpus order and tokens
/// in slot order. Returns the number of tokens whose topic changed.
///
/// `weights` is scratch space and is resized to the number of topics.
pub(crate) fn sweep<R: Rng + ?Sized>(
    state: &mut LatentState,
    weights: &mut Vec<f64>,
    rng: &mut R,
) -> usize {
    let (definition, docs, assignments, counts) = state.parts_mut();
    weights.resize(definition.n_topics(), 0f64);

    let mut num_changed = 0;
    for (doc, (terms, topics)) in docs.iter().zip(assignments.iter_mut()).enumerate() {
        let mut slots = topics.iter_mut();
        for &(term, count) in terms {
            for slot in slots.by_ref().take(count) {
                let old = *slot;
                counts.retract(doc, term, old);
                let total = conditional(counts, definition, doc, term, weights);
                let new = sample_weighted(weights, total, rng);
                counts.commit(doc, term, new);
                *slot = new;
                if new != old {
                    num_changed += 1;
                }
            }
        }
    }
    num_changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::SparseDocument;
    use approx::assert_abs_diff_eq;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn two_topic_state() -> LatentState {
        let corpus = vec![
            SparseDocument::new([(0, 2), (1, 1)]),
            SparseDocument::new([(2, 3)]),
        ];
        let defn = ModelDefinition::new(2, 3, 2, 0.1, 0.1).unwrap();
        let mut rng = StdRng::seed_from_u64(42);
        LatentState::initialize(&defn, &corpus, &mut rng).unwrap()
    }

    #[test]
    fn conditional_matches_formula() {
        let state = two_topic_state();
        let defn = *state.definition();
        let mut weights = vec![0f64; 2];
        let total = conditional(state.counts(), &defn, 0, 1, &mut weights);

        let mut expected_total = 0.;
        for topic in 0..2 {
            let expected = (state.doc_topic_counts(0)[topic] as f64 + 0.1)
                * (state.topic_term_counts(topic)[1] as f64 + 0.1)
                / (state.topic_totals()[topic] as f64 + 0.3);
            assert_abs_diff_eq!(weights[topic], expected, epsilon = 1e-12);
            expected_total += expected;
        }
        assert_abs_diff_eq!(total, expected_total, epsilon = 1e-12);
        assert!(weights.iter().all(|&w| w > 0.));
    }

    #[test]
    fn sweep_keeps_counts_consistent() {
        let mut state = two_topic_state();
        let mut rng = StdRng::seed_from_u64(1);
        let mut weights = vec![];
        for _ in 0..50 {
            sweep(&mut state, &mut weights, &mut rng);
            state.check_consistency().unwrap();
        }
        assert_eq!(weights.len(), 2);
        assert_eq!(state.doc_topic_counts(0).iter().sum::<usize>(), 3);
        assert_eq!(state.doc_topic_counts(1).iter().sum::<usize>(), 3);
        let perplexity = state.perplexity();
        assert!(perplexity.is_finite() && perplexity > 0.);
    }

    #[test]
    fn sweep_is_deterministic() {
        let mut a = two_topic_state();
        let mut b = two_topic_state();
        let mut rng_a = StdRng::seed_from_u64(9);
        let mut rng_b = StdRng::seed_from_u64(9);
        let mut weights = vec![];
        for _ in 0..10 {
            let changed_a = sweep(&mut a, &mut weights, &mut rng_a);
            let changed_b = sweep(&mut b, &mut weights, &mut rng_b);
            assert_eq!(changed_a, changed_b);
        }
        assert_eq!(a, b);
    }

    proptest! {
        #[test]
        fn counts_stay_consistent(
            docs in prop::collection::vec(
                prop::collection::vec((0usize..8, 0usize..5), 0..6),
                1..6,
            ),
            n_topics in 1usize..5,
            seed in any::<u64>(),
            n_sweeps in 0usize..5,
        ) {
            let corpus: Vec<SparseDocument> = docs.into_iter().map(SparseDocument::new).collect();
            let defn = ModelDefinition::new(corpus.len(), 8, n_topics, 0.3, 0.2).unwrap();
            let mut rng = StdRng::seed_from_u64(seed);
            let mut state = LatentState::initialize(&defn, &corpus, &mut rng).unwrap();
            let mut weights = vec![];
            for _ in 0..n_sweeps {
                sweep(&mut state, &mut weights, &mut rng);
            }
            prop_assert!(state.check_consistency().is_ok());
            for (doc, document) in corpus.iter().enumerate() {
                prop_assert_eq!(
                    state.doc_topic_counts(doc).iter().sum::<usize>(),
                    crate::Document::num_tokens(document)
                );
            }
            prop_assert_eq!(
                state.topic_totals().iter().sum::<usize>(),
                crate::corpus::total_tokens(&corpus)
            );
            for row in state.document_distribution() {
                prop_assert_eq!(row.len(), n_topics);
                prop_assert!((row.iter().sum::<f64>() - 1.).abs() < 1e-9);
            }
        }
    }
}
