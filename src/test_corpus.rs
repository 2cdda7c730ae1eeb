//! Synthetic corpora drawn from the LDA generative process.
//!
//! Useful for tests, benchmarks and demos where a real corpus is not at
//! hand: documents are generated from known topics, so a sampler fitted to
//! them has structure to find.

use anyhow::{ensure, Context, Result};
use rand::Rng;
use rand_distr::{Distribution, Gamma};

use crate::{corpus::SparseDocument, math::sample_weighted};

/// Parameters of a synthetic corpus.
#[derive(Debug, Clone, Copy)]
pub struct SyntheticCorpus {
    pub n_docs: usize,
    pub n_terms: usize,
    pub n_topics: usize,
    /// Tokens per document.
    pub doc_len: usize,
    /// Concentration of the per-document topic mixtures.
    pub alpha: f64,
    /// Concentration of the per-topic term distributions.
    pub beta: f64,
}

impl Default for SyntheticCorpus {
    fn default() -> Self {
        Self {
            n_docs: 100,
            n_terms: 60,
            n_topics: 4,
            doc_len: 40,
            alpha: 0.2,
            beta: 0.1,
        }
    }
}

/// A generated corpus together with the topics it was drawn from.
#[derive(Debug, Clone)]
pub struct GeneratedCorpus {
    pub docs: Vec<SparseDocument>,
    pub topics: Vec<Vec<f64>>,
    pub mixtures: Vec<Vec<f64>>,
}

impl SyntheticCorpus {
    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<GeneratedCorpus> {
        ensure!(self.n_topics > 0, "Synthetic corpus needs at least one topic");
        ensure!(self.n_terms > 0, "Synthetic corpus needs at least one term");
        let topics = (0..self.n_topics)
            .map(|_| dirichlet(self.beta, self.n_terms, rng))
            .collect::<Result<Vec<_>>>()
            .context("Could not draw topic-term distributions")?;

        let mut docs = Vec::with_capacity(self.n_docs);
        let mut mixtures = Vec::with_capacity(self.n_docs);
        for _ in 0..self.n_docs {
            let mixture = dirichlet(self.alpha, self.n_topics, rng)
                .context("Could not draw document-topic mixture")?;
            let tokens: Vec<usize> = (0..self.doc_len)
                .map(|_| {
                    let topic = sample_weighted(&mixture, mixture.iter().sum(), rng);
                    let terms = &topics[topic];
                    sample_weighted(terms, terms.iter().sum(), rng)
                })
                .collect();
            docs.push(SparseDocument::from_tokens(tokens));
            mixtures.push(mixture);
        }

        Ok(GeneratedCorpus {
            docs,
            topics,
            mixtures,
        })
    }
}

/// Symmetric Dirichlet draw from normalized Gamma variates.
///
/// If every variate underflows to zero all mass goes to one random entry.
fn dirichlet<R: Rng + ?Sized>(concentration: f64, dim: usize, rng: &mut R) -> Result<Vec<f64>> {
    ensure!(dim > 0, "Dirichlet distribution needs a positive dimension");
    let gamma = Gamma::new(concentration, 1f64)?;
    let mut draws: Vec<f64> = (0..dim).map(|_| gamma.sample(rng)).collect();
    let total: f64 = draws.iter().sum();
    if total > 0. && total.is_finite() {
        draws.iter_mut().for_each(|x| *x /= total);
    } else {
        draws.fill(0.);
        draws[rng.random_range(0..dim)] = 1.;
    }
    Ok(draws)
}
