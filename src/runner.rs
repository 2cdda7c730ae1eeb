use rand::Rng;

use crate::{
    corpus::Document,
    definition::ModelDefinition,
    error::{LdaError, Result},
    gibbs::{sweep, SweepStats},
    LatentState,
};

/// Drives the Gibbs chain of a [`LatentState`].
///
/// All randomness comes from the generator passed to [`Runner::run`].
/// Running `a` sweeps and then `b` sweeps with the same generator gives the
/// same state as running `a + b` sweeps at once.
pub struct Runner<'a> {
    state: &'a mut LatentState,
    weights: Vec<f64>,
    sweeps: u64,
    trace: Option<Vec<SweepStats>>,
    log_every: u64,
}

impl<'a> Runner<'a> {
    /// Create a runner for `state`, which must have been initialized from
    /// `definition` and `corpus`.
    pub fn new<D: Document>(
        definition: &ModelDefinition,
        corpus: &[D],
        state: &'a mut LatentState,
    ) -> Result<Self> {
        if definition != state.definition() {
            return Err(LdaError::DimensionMismatch(
                "latent state was initialized with a different model definition".into(),
            ));
        }
        state.matches_corpus(corpus)?;
        Ok(Self {
            weights: vec![0f64; definition.n_topics()],
            state,
            sweeps: 0,
            trace: None,
            log_every: 50,
        })
    }

    /// Record [`SweepStats`] after every sweep.
    ///
    /// This evaluates the log-likelihood once per sweep.
    pub fn with_trace(mut self) -> Self {
        self.trace.get_or_insert_with(Vec::new);
        self
    }

    /// Emit a debug progress message every `log_every` sweeps. Zero disables it.
    pub fn with_log_every(mut self, log_every: u64) -> Self {
        self.log_every = log_every;
        self
    }

    /// Run `n_sweeps` full sweeps over the corpus.
    pub fn run<R: Rng + ?Sized>(&mut self, rng: &mut R, n_sweeps: usize) {
        for _ in 0..n_sweeps {
            let num_changed = sweep(self.state, &mut self.weights, rng);
            self.sweeps += 1;
            tracing::trace!(sweep = self.sweeps, num_changed, "finished sweep");

            if let Some(trace) = self.trace.as_mut() {
                let log_likelihood = self.state.log_likelihood();
                trace.push(SweepStats {
                    sweep: self.sweeps,
                    num_changed,
                    log_likelihood,
                    perplexity: crate::math::perplexity(
                        log_likelihood,
                        self.state.total_tokens(),
                    ),
                });
            }

            if self.log_every > 0 && self.sweeps % self.log_every == 0 {
                tracing::debug!(
                    sweep = self.sweeps,
                    perplexity = self.state.perplexity(),
                    "gibbs sampling progress"
                );
            }
        }
    }

    /// Number of sweeps run so far.
    pub fn sweeps(&self) -> u64 {
        self.sweeps
    }

    /// Statistics of every sweep since tracing was enabled.
    pub fn trace(&self) -> &[SweepStats] {
        self.trace.as_deref().unwrap_or(&[])
    }

    pub fn into_trace(self) -> Vec<SweepStats> {
        self.trace.unwrap_or_default()
    }

    pub fn state(&self) -> &LatentState {
        &*self.state
    }
}
