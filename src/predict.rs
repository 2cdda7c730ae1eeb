//! Topic mixtures and perplexity of documents outside the training corpus.
//!
//! New documents are "folded in": their tokens are Gibbs sampled against the
//! topic-term distributions of a fitted [`LatentState`], which stay fixed.

use itertools::izip;
use rand::Rng;

use crate::{
    corpus::Document,
    error::{LdaError, Result},
    math::{self, sample_weighted},
    LatentState,
};

/// Topic-term distributions of a fitted state, frozen for inference.
#[derive(Debug, Clone)]
pub struct FrozenTopics {
    n_topics: usize,
    n_terms: usize,
    alpha: f64,
    alpha_sum: f64,
    // term-major, `phi[term * n_topics + topic]`
    phi: Vec<f64>,
}

impl FrozenTopics {
    pub fn new(state: &LatentState) -> Self {
        let definition = state.definition();
        let n_topics = definition.n_topics();
        let n_terms = definition.n_terms();
        let mut phi = vec![0f64; n_terms * n_topics];
        let mut row = vec![0f64; n_terms];
        for topic in 0..n_topics {
            state.write_topic_term(topic, &mut row);
            for (term, &prob) in row.iter().enumerate() {
                phi[term * n_topics + topic] = prob;
            }
        }
        Self {
            n_topics,
            n_terms,
            alpha: definition.alpha(),
            alpha_sum: definition.alpha_sum(),
            phi,
        }
    }

    fn term_probs(&self, term: usize) -> &[f64] {
        &self.phi[term * self.n_topics..(term + 1) * self.n_topics]
    }

    /// Estimate the topic mixture of `document` from `n_sweeps` Gibbs sweeps
    /// over its tokens, starting from uniformly random assignments.
    pub fn fold_in<D: Document + ?Sized, R: Rng + ?Sized>(
        &self,
        document: &D,
        rng: &mut R,
        n_sweeps: usize,
    ) -> Result<Vec<f64>> {
        let mut tokens = Vec::with_capacity(document.num_tokens());
        for (term, count) in document.term_counts() {
            if count > 0 {
                self.check_term(term)?;
            }
            tokens.extend(std::iter::repeat(term).take(count));
        }

        let mut doc_topic = vec![0usize; self.n_topics];
        let mut topics: Vec<usize> = tokens
            .iter()
            .map(|_| {
                let topic = rng.random_range(0..self.n_topics);
                doc_topic[topic] += 1;
                topic
            })
            .collect();

        let mut weights = vec![0f64; self.n_topics];
        for _ in 0..n_sweeps {
            for (&term, slot) in tokens.iter().zip(topics.iter_mut()) {
                doc_topic[*slot] -= 1;
                let mut total = 0f64;
                izip!(weights.iter_mut(), &doc_topic, self.term_probs(term)).for_each(
                    |(weight, &count, &prob)| {
                        *weight = (count as f64 + self.alpha) * prob;
                        total += *weight;
                    },
                );
                let topic = sample_weighted(&weights, total, rng);
                doc_topic[topic] += 1;
                *slot = topic;
            }
        }

        let norm = (tokens.len() as f64 + self.alpha_sum).recip();
        Ok(doc_topic
            .into_iter()
            .map(|count| (count as f64 + self.alpha) * norm)
            .collect())
    }

    /// Log-likelihood of `document` under the topic mixture `theta`.
    ///
    /// Fails if `theta` does not have one entry per topic or the document
    /// uses a term outside the vocabulary.
    pub fn log_likelihood<D: Document + ?Sized>(&self, document: &D, theta: &[f64]) -> Result<f64> {
        if theta.len() != self.n_topics {
            return Err(LdaError::DimensionMismatch(format!(
                "topic mixture has {} entries but the model has {} topics",
                theta.len(),
                self.n_topics
            )));
        }
        let mut log_likelihood = 0f64;
        for (term, count) in document.term_counts().filter(|&(_, count)| count > 0) {
            self.check_term(term)?;
            let prob: f64 = izip!(theta, self.term_probs(term))
                .map(|(&weight, &prob)| weight * prob)
                .sum();
            log_likelihood += count as f64 * prob.ln();
        }
        Ok(log_likelihood)
    }

    fn check_term(&self, term: usize) -> Result<()> {
        if term >= self.n_terms {
            return Err(LdaError::DimensionMismatch(format!(
                "term {term} is not part of the {} term vocabulary",
                self.n_terms
            )));
        }
        Ok(())
    }
}

/// Fold a single unseen document into a fitted state.
pub fn fold_in<D: Document + ?Sized, R: Rng + ?Sized>(
    state: &LatentState,
    document: &D,
    rng: &mut R,
    n_sweeps: usize,
) -> Result<Vec<f64>> {
    FrozenTopics::new(state).fold_in(document, rng, n_sweeps)
}

/// Perplexity of unseen documents under a fitted state.
///
/// Each document is folded in with `n_sweeps` sweeps, in order, drawing
/// from `rng`. Documents without tokens are skipped.
pub fn held_out_perplexity<D: Document, R: Rng + ?Sized>(
    state: &LatentState,
    docs: &[D],
    rng: &mut R,
    n_sweeps: usize,
) -> Result<f64> {
    let topics = FrozenTopics::new(state);
    let mut log_likelihood = 0f64;
    let mut num_tokens = 0;
    for doc in docs {
        let theta = topics.fold_in(doc, rng, n_sweeps)?;
        log_likelihood += topics.log_likelihood(doc, &theta)?;
        num_tokens += doc.num_tokens();
    }
    tracing::debug!(
        n_docs = docs.len(),
        num_tokens,
        log_likelihood,
        "evaluated held-out documents"
    );
    Ok(math::perplexity(log_likelihood, num_tokens))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{corpus::SparseDocument, ModelDefinition, Runner};
    use approx::assert_abs_diff_eq;
    use pretty_assertions::assert_eq;
    use rand::{rngs::SmallRng, SeedableRng};

    fn fitted() -> LatentState {
        let corpus = vec![
            SparseDocument::new([(0, 20), (1, 20)]),
            SparseDocument::new([(2, 20), (3, 20)]),
            SparseDocument::new([(0, 10), (1, 10)]),
            SparseDocument::new([(2, 10), (3, 10)]),
        ];
        let defn = ModelDefinition::new(4, 4, 2, 0.1, 0.05).unwrap();
        let mut rng = SmallRng::seed_from_u64(17);
        let mut state = LatentState::initialize(&defn, &corpus, &mut rng).unwrap();
        Runner::new(&defn, &corpus, &mut state)
            .unwrap()
            .run(&mut rng, 100);
        state
    }

    #[test]
    fn folded_mixture_is_normalized() {
        let state = fitted();
        let mut rng = SmallRng::seed_from_u64(1);
        let doc = SparseDocument::new([(0, 3), (2, 1)]);
        let theta = fold_in(&state, &doc, &mut rng, 20).unwrap();
        assert_eq!(theta.len(), 2);
        assert_abs_diff_eq!(theta.iter().sum::<f64>(), 1., epsilon = 1e-12);
    }

    #[test]
    fn empty_document_is_uniform() {
        let state = fitted();
        let mut rng = SmallRng::seed_from_u64(1);
        let theta = fold_in(&state, &SparseDocument::default(), &mut rng, 5).unwrap();
        for &weight in &theta {
            assert_abs_diff_eq!(weight, 0.5, epsilon = 1e-12);
        }
    }

    #[test]
    fn rejects_unknown_terms() {
        let state = fitted();
        let mut rng = SmallRng::seed_from_u64(1);
        let doc = SparseDocument::new([(4, 1)]);
        assert!(matches!(
            fold_in(&state, &doc, &mut rng, 5),
            Err(LdaError::DimensionMismatch(_))
        ));
    }

    #[test]
    fn log_likelihood_rejects_bad_input() {
        let topics = FrozenTopics::new(&fitted());
        let unknown = SparseDocument::new([(5, 1)]);
        assert!(matches!(
            topics.log_likelihood(&unknown, &[0.5, 0.5]),
            Err(LdaError::DimensionMismatch(_))
        ));

        let known = SparseDocument::new([(0, 2), (3, 1)]);
        assert!(matches!(
            topics.log_likelihood(&known, &[1.]),
            Err(LdaError::DimensionMismatch(_))
        ));
        let log_likelihood = topics.log_likelihood(&known, &[0.5, 0.5]).unwrap();
        assert!(log_likelihood.is_finite() && log_likelihood < 0.);
    }

    #[test]
    fn matching_documents_have_lower_perplexity() {
        let state = fitted();
        let mut rng = SmallRng::seed_from_u64(2);
        let seen_pattern = vec![
            SparseDocument::new([(0, 5), (1, 5)]),
            SparseDocument::new([(2, 5), (3, 5)]),
        ];
        let mixed_pattern = vec![
            SparseDocument::new([(0, 5), (3, 5)]),
            SparseDocument::new([(1, 5), (2, 5)]),
        ];
        let seen = held_out_perplexity(&state, &seen_pattern, &mut rng, 50).unwrap();
        let mixed = held_out_perplexity(&state, &mixed_pattern, &mut rng, 50).unwrap();
        assert!(seen.is_finite() && mixed.is_finite());
        assert!(seen < mixed, "{seen} >= {mixed}");

        let empty: Vec<SparseDocument> = vec![];
        assert_eq!(held_out_perplexity(&state, &empty, &mut rng, 5).unwrap(), 1.);
    }
}
