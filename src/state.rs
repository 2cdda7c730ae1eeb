//! The mutable state of the collapsed Gibbs sampler.
//!
//! [`LatentState`] owns the per-token topic assignments and the three count
//! tables derived from them. The tables are only ever changed through
//! [`Counts::retract`] and [`Counts::commit`], one token at a time, so they
//! stay in sync with the assignments.

use itertools::izip;
use rand::Rng;

use crate::{
    corpus::Document,
    definition::ModelDefinition,
    error::{LdaError, Result},
    math,
};

/// Sufficient statistics of the topic assignments.
///
/// Tables are stored row-major in flat vectors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Counts {
    n_topics: usize,
    n_terms: usize,
    doc_topic: Vec<usize>,
    topic_term: Vec<usize>,
    topic_totals: Vec<usize>,
}

impl Counts {
    fn new(n_docs: usize, n_terms: usize, n_topics: usize) -> Self {
        Self {
            n_topics,
            n_terms,
            doc_topic: vec![0; n_docs * n_topics],
            topic_term: vec![0; n_topics * n_terms],
            topic_totals: vec![0; n_topics],
        }
    }

    #[inline]
    pub(crate) fn commit(&mut self, doc: usize, term: usize, topic: usize) {
        self.doc_topic[doc * self.n_topics + topic] += 1;
        self.topic_term[topic * self.n_terms + term] += 1;
        self.topic_totals[topic] += 1;
    }

    #[inline]
    pub(crate) fn retract(&mut self, doc: usize, term: usize, topic: usize) {
        let doc_topic = &mut self.doc_topic[doc * self.n_topics + topic];
        let topic_term = &mut self.topic_term[topic * self.n_terms + term];
        let total = &mut self.topic_totals[topic];
        debug_assert!(*doc_topic > 0 && *topic_term > 0 && *total > 0);
        *doc_topic -= 1;
        *topic_term -= 1;
        *total -= 1;
    }

    #[inline]
    pub(crate) fn doc_topic(&self, doc: usize) -> &[usize] {
        &self.doc_topic[doc * self.n_topics..(doc + 1) * self.n_topics]
    }

    #[inline]
    pub(crate) fn topic_term(&self, topic: usize) -> &[usize] {
        &self.topic_term[topic * self.n_terms..(topic + 1) * self.n_terms]
    }

    #[inline]
    pub(crate) fn topic_term_count(&self, topic: usize, term: usize) -> usize {
        self.topic_term[topic * self.n_terms + term]
    }

    #[inline]
    pub(crate) fn topic_totals(&self) -> &[usize] {
        &self.topic_totals
    }
}

/// Topic assignments of every token in a corpus together with their counts.
///
/// Created by [`LatentState::initialize`], advanced in place by a
/// [`Runner`](crate::Runner), and queried through
/// [`document_distribution`](LatentState::document_distribution) and
/// [`perplexity`](LatentState::perplexity).
///
/// Tokens of a document are ordered as its [`Document::term_counts`]: a
/// pair `(v, c)` occupies `c` consecutive assignment slots.
#[derive(Debug, Clone, PartialEq)]
pub struct LatentState {
    definition: ModelDefinition,
    docs: Vec<Vec<(usize, usize)>>,
    doc_lengths: Vec<usize>,
    assignments: Vec<Vec<usize>>,
    counts: Counts,
}

impl LatentState {
    /// Assign every token of `corpus` a topic drawn uniformly at random.
    ///
    /// Topics are drawn in document order and, within a document, in token
    /// order, so a seeded `rng` gives a reproducible state. Fails if the
    /// corpus does not have `definition.n_docs()` documents or uses a term
    /// id outside the vocabulary.
    pub fn initialize<D: Document, R: Rng + ?Sized>(
        definition: &ModelDefinition,
        corpus: &[D],
        rng: &mut R,
    ) -> Result<Self> {
        let docs = collect_documents(definition, corpus)?;
        let n_topics = definition.n_topics();
        let mut counts = Counts::new(docs.len(), definition.n_terms(), n_topics);
        let mut assignments = Vec::with_capacity(docs.len());
        let mut doc_lengths = Vec::with_capacity(docs.len());

        for (doc, terms) in docs.iter().enumerate() {
            let len = terms.iter().map(|&(_, count)| count).sum();
            let mut topics = Vec::with_capacity(len);
            for &(term, count) in terms {
                for _ in 0..count {
                    let topic = rng.random_range(0..n_topics);
                    counts.commit(doc, term, topic);
                    topics.push(topic);
                }
            }
            doc_lengths.push(len);
            assignments.push(topics);
        }

        let state = Self {
            definition: *definition,
            docs,
            doc_lengths,
            assignments,
            counts,
        };
        tracing::debug!(
            n_docs = definition.n_docs(),
            n_terms = definition.n_terms(),
            n_topics,
            num_tokens = state.total_tokens(),
            "initialized latent state"
        );
        Ok(state)
    }

    pub fn definition(&self) -> &ModelDefinition {
        &self.definition
    }

    pub fn n_docs(&self) -> usize {
        self.docs.len()
    }

    /// Number of tokens in document `doc`.
    pub fn doc_len(&self, doc: usize) -> usize {
        self.doc_lengths[doc]
    }

    pub fn total_tokens(&self) -> usize {
        self.counts.topic_totals.iter().sum()
    }

    /// Topic of every token in document `doc`.
    pub fn assignments(&self, doc: usize) -> &[usize] {
        &self.assignments[doc]
    }

    /// Number of tokens in document `doc` assigned to each topic.
    pub fn doc_topic_counts(&self, doc: usize) -> &[usize] {
        self.counts.doc_topic(doc)
    }

    /// Number of tokens of each term assigned to `topic`.
    pub fn topic_term_counts(&self, topic: usize) -> &[usize] {
        self.counts.topic_term(topic)
    }

    /// Number of tokens assigned to each topic.
    pub fn topic_totals(&self) -> &[usize] {
        self.counts.topic_totals()
    }

    /// Smoothed topic mixture of every document, in corpus order.
    ///
    /// Row `d` is `(n[d][k] + alpha) / (len(d) + K * alpha)`. An empty
    /// document gets the uniform mixture.
    pub fn document_distribution(&self) -> Vec<Vec<f64>> {
        (0..self.n_docs())
            .map(|doc| {
                let mut row = vec![0f64; self.definition.n_topics()];
                self.write_doc_topic(doc, &mut row);
                row
            })
            .collect()
    }

    /// Smoothed term distribution of every topic.
    ///
    /// Row `k` is `(n[k][v] + beta) / (n[k] + V * beta)`.
    pub fn topic_term_distribution(&self) -> Vec<Vec<f64>> {
        (0..self.definition.n_topics())
            .map(|topic| {
                let mut row = vec![0f64; self.definition.n_terms()];
                self.write_topic_term(topic, &mut row);
                row
            })
            .collect()
    }

    /// The `n` most probable terms of `topic` with their probabilities.
    ///
    /// # Panics
    ///
    /// Panics if `topic` is not smaller than the number of topics.
    pub fn top_terms(&self, topic: usize, n: usize) -> Vec<(usize, f64)> {
        assert!(topic < self.definition.n_topics(), "topic out of range");
        let mut row = vec![0f64; self.definition.n_terms()];
        self.write_topic_term(topic, &mut row);
        math::top_indices(&row, n)
            .into_iter()
            .map(|term| (term, row[term]))
            .collect()
    }

    /// Log-likelihood of the corpus under the smoothed mixtures of the
    /// current sample.
    ///
    /// Empty documents contribute nothing.
    pub fn log_likelihood(&self) -> f64 {
        let beta = self.definition.beta();
        let beta_sum = self.definition.beta_sum();
        let inv_norm: Vec<f64> = self
            .counts
            .topic_totals()
            .iter()
            .map(|&total| (total as f64 + beta_sum).recip())
            .collect();
        let mut theta = vec![0f64; self.definition.n_topics()];

        let mut log_likelihood = 0f64;
        for (doc, terms) in self.docs.iter().enumerate() {
            if self.doc_lengths[doc] == 0 {
                continue;
            }
            self.write_doc_topic(doc, &mut theta);
            for &(term, count) in terms {
                let prob: f64 = izip!(&theta, &inv_norm)
                    .enumerate()
                    .map(|(topic, (&weight, &inv))| {
                        weight * (self.counts.topic_term_count(topic, term) as f64 + beta) * inv
                    })
                    .sum();
                log_likelihood += count as f64 * prob.ln();
            }
        }
        log_likelihood
    }

    /// `exp(-log_likelihood / total_tokens)`, or 1 for a corpus without tokens.
    pub fn perplexity(&self) -> f64 {
        math::perplexity(self.log_likelihood(), self.total_tokens())
    }

    /// Recompute all count tables from the assignments and compare.
    pub fn check_consistency(&self) -> Result<()> {
        let n_topics = self.definition.n_topics();
        let mut expected = Counts::new(self.n_docs(), self.definition.n_terms(), n_topics);
        for (doc, (terms, topics)) in self.docs.iter().zip(&self.assignments).enumerate() {
            if topics.len() != self.doc_lengths[doc] {
                return Err(LdaError::InconsistentCounts(format!(
                    "document {doc} has {} assignments for {} tokens",
                    topics.len(),
                    self.doc_lengths[doc]
                )));
            }
            let mut slots = topics.iter();
            for &(term, count) in terms {
                for &topic in slots.by_ref().take(count) {
                    if topic >= n_topics {
                        return Err(LdaError::InconsistentCounts(format!(
                            "document {doc} has a token assigned to topic {topic}"
                        )));
                    }
                    expected.commit(doc, term, topic);
                }
            }
        }

        for doc in 0..self.n_docs() {
            if expected.doc_topic(doc) != self.counts.doc_topic(doc) {
                return Err(LdaError::InconsistentCounts(format!(
                    "document-topic counts of document {doc} differ"
                )));
            }
        }
        for topic in 0..n_topics {
            if expected.topic_term(topic) != self.counts.topic_term(topic) {
                return Err(LdaError::InconsistentCounts(format!(
                    "topic-term counts of topic {topic} differ"
                )));
            }
            let row_sum: usize = self.counts.topic_term(topic).iter().sum();
            if row_sum != self.counts.topic_totals[topic] {
                return Err(LdaError::InconsistentCounts(format!(
                    "total of topic {topic} is {} but its terms sum to {row_sum}",
                    self.counts.topic_totals[topic]
                )));
            }
        }
        Ok(())
    }

    /// Check that `corpus` is the corpus this state was initialized from.
    pub fn matches_corpus<D: Document>(&self, corpus: &[D]) -> Result<()> {
        if corpus.len() != self.n_docs() {
            return Err(LdaError::DimensionMismatch(format!(
                "latent state has {} documents but the corpus has {}",
                self.n_docs(),
                corpus.len()
            )));
        }
        for (doc, (stored, document)) in self.docs.iter().zip(corpus).enumerate() {
            let same = stored
                .iter()
                .copied()
                .eq(document.term_counts().filter(|&(_, count)| count > 0));
            if !same {
                return Err(LdaError::DimensionMismatch(format!(
                    "document {doc} differs from the one the latent state was initialized with"
                )));
            }
        }
        Ok(())
    }

    pub(crate) fn parts_mut(
        &mut self,
    ) -> (
        &ModelDefinition,
        &[Vec<(usize, usize)>],
        &mut [Vec<usize>],
        &mut Counts,
    ) {
        (
            &self.definition,
            &self.docs,
            &mut self.assignments,
            &mut self.counts,
        )
    }

    #[cfg(test)]
    pub(crate) fn counts(&self) -> &Counts {
        &self.counts
    }

    fn write_doc_topic(&self, doc: usize, out: &mut [f64]) {
        let alpha = self.definition.alpha();
        let norm = (self.doc_lengths[doc] as f64 + self.definition.alpha_sum()).recip();
        izip!(out.iter_mut(), self.counts.doc_topic(doc))
            .for_each(|(out, &count)| *out = (count as f64 + alpha) * norm);
    }

    pub(crate) fn write_topic_term(&self, topic: usize, out: &mut [f64]) {
        let beta = self.definition.beta();
        let norm =
            (self.counts.topic_totals[topic] as f64 + self.definition.beta_sum()).recip();
        izip!(out.iter_mut(), self.counts.topic_term(topic))
            .for_each(|(out, &count)| *out = (count as f64 + beta) * norm);
    }
}

fn collect_documents<D: Document>(
    definition: &ModelDefinition,
    corpus: &[D],
) -> Result<Vec<Vec<(usize, usize)>>> {
    if corpus.len() != definition.n_docs() {
        return Err(LdaError::DimensionMismatch(format!(
            "definition has {} documents but the corpus has {}",
            definition.n_docs(),
            corpus.len()
        )));
    }
    corpus
        .iter()
        .enumerate()
        .map(|(doc, document)| {
            document
                .term_counts()
                .filter(|&(_, count)| count > 0)
                .map(|(term, count)| {
                    if term >= definition.n_terms() {
                        return Err(LdaError::DimensionMismatch(format!(
                            "document {doc} uses term {term} but the vocabulary has {} terms",
                            definition.n_terms()
                        )));
                    }
                    Ok((term, count))
                })
                .collect()
        })
        .collect()
}
