//! Hyperparameters of an LDA model.

use crate::error::{LdaError, Result};

/// The fixed shape and priors of a topic model.
///
/// A definition is validated on construction and never changes afterwards.
/// `n_docs` and `n_terms` have to agree with the corpus that is later passed
/// to [`LatentState::initialize`](crate::LatentState::initialize).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelDefinition {
    n_docs: usize,
    n_terms: usize,
    n_topics: usize,
    alpha: f64,
    beta: f64,
}

impl ModelDefinition {
    /// Create a new model definition.
    ///
    /// `alpha` is the concentration of the per-document topic mixtures and
    /// `beta` the concentration of the per-topic term distributions. All
    /// sizes and both priors must be strictly positive and finite.
    pub fn new(
        n_docs: usize,
        n_terms: usize,
        n_topics: usize,
        alpha: f64,
        beta: f64,
    ) -> Result<Self> {
        check_count("n_docs", n_docs)?;
        check_count("n_terms", n_terms)?;
        check_count("n_topics", n_topics)?;
        check_prior("alpha", alpha)?;
        check_prior("beta", beta)?;
        Ok(Self {
            n_docs,
            n_terms,
            n_topics,
            alpha,
            beta,
        })
    }

    pub fn n_docs(&self) -> usize {
        self.n_docs
    }

    pub fn n_terms(&self) -> usize {
        self.n_terms
    }

    pub fn n_topics(&self) -> usize {
        self.n_topics
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn beta(&self) -> f64 {
        self.beta
    }

    /// `V * beta`, the normalizer of the smoothed topic-term distributions.
    pub(crate) fn beta_sum(&self) -> f64 {
        self.n_terms as f64 * self.beta
    }

    /// `K * alpha`, the normalizer of the smoothed document-topic distributions.
    pub(crate) fn alpha_sum(&self) -> f64 {
        self.n_topics as f64 * self.alpha
    }
}

fn check_count(name: &'static str, value: usize) -> Result<()> {
    if value == 0 {
        return Err(LdaError::InvalidHyperparameter { name, value: 0. });
    }
    Ok(())
}

fn check_prior(name: &'static str, value: f64) -> Result<()> {
    if !(value.is_finite() && value > 0.) {
        return Err(LdaError::InvalidHyperparameter { name, value });
    }
    Ok(())
}
