use anyhow::{Context, Result};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::{prelude::*, ThreadPoolBuilder};

use crate::{
    corpus::{num_terms, Document},
    definition::ModelDefinition,
    gibbs::SweepStats,
    runner::Runner,
    LatentState,
};

/// Settings for fitting an LDA model
#[derive(Debug, Clone, Copy)]
pub struct LdaSettings {
    /// The number of topics.
    pub num_topics: usize,
    /// Dirichlet prior of the document-topic mixtures.
    pub alpha: f64,
    /// Dirichlet prior of the topic-term distributions.
    pub beta: f64,
    /// The number of Gibbs sweeps per chain.
    pub num_sweeps: u64,
    pub num_chains: usize,
    /// Chain `c` draws from a ChaCha8 generator seeded with `seed` on stream `c`.
    pub seed: u64,
    /// Store log-likelihood and perplexity after every sweep
    pub store_trace: bool,
    /// Log progress every this many sweeps, zero to disable.
    pub log_every: u64,
}

impl Default for LdaSettings {
    fn default() -> Self {
        Self {
            num_topics: 10,
            alpha: 0.1,
            beta: 0.01,
            num_sweeps: 100,
            num_chains: 1,
            seed: 0,
            store_trace: false,
            log_every: 50,
        }
    }
}

impl LdaSettings {
    pub fn definition(&self, n_docs: usize, n_terms: usize) -> crate::Result<ModelDefinition> {
        ModelDefinition::new(n_docs, n_terms, self.num_topics, self.alpha, self.beta)
    }
}

/// The final state of a chain and its optional trace.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct ChainOutput {
    pub chain: u64,
    pub state: LatentState,
    pub trace: Vec<SweepStats>,
}

/// Fit a single chain on the current thread.
///
/// The vocabulary size is taken from the corpus.
pub fn sample_sequentially<D: Document, R: Rng + ?Sized>(
    settings: &LdaSettings,
    corpus: &[D],
    chain: u64,
    rng: &mut R,
) -> crate::Result<ChainOutput> {
    let definition = settings.definition(corpus.len(), num_terms(corpus))?;
    let mut state = LatentState::initialize(&definition, corpus, rng)?;

    let mut runner = Runner::new(&definition, corpus, &mut state)?.with_log_every(settings.log_every);
    if settings.store_trace {
        runner = runner.with_trace();
    }
    runner.run(rng, settings.num_sweeps as usize);
    let trace = runner.into_trace();

    Ok(ChainOutput {
        chain,
        state,
        trace,
    })
}

/// Fit `settings.num_chains` independent chains on a pool of `num_cores`
/// threads. Each chain owns its own latent state.
///
/// Outputs are returned in chain order and depend only on `settings.seed`,
/// not on the number of threads.
pub fn sample_parallel<D: Document + Sync>(
    settings: &LdaSettings,
    corpus: &[D],
    num_cores: usize,
) -> Result<Vec<ChainOutput>> {
    let pool = ThreadPoolBuilder::new()
        .num_threads(num_cores)
        .build()
        .context("Could not create thread pool")?;

    pool.install(|| {
        (0..settings.num_chains)
            .into_par_iter()
            .map(|chain| -> Result<ChainOutput> {
                let chain = chain as u64;
                let mut rng = ChaCha8Rng::seed_from_u64(settings.seed);
                rng.set_stream(chain);

                tracing::info!(chain, "starting chain");
                let output = sample_sequentially(settings, corpus, chain, &mut rng)
                    .with_context(|| format!("Chain {chain} failed"))?;
                tracing::info!(
                    chain,
                    perplexity = output.state.perplexity(),
                    "finished chain"
                );
                Ok(output)
            })
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{corpus::SparseDocument, test_corpus::SyntheticCorpus, LdaError};

    use pretty_assertions::assert_eq;
    use rand::rngs::StdRng;

    fn corpus() -> Vec<SparseDocument> {
        let params = SyntheticCorpus {
            n_docs: 20,
            n_terms: 30,
            n_topics: 3,
            doc_len: 20,
            ..Default::default()
        };
        let mut rng = StdRng::seed_from_u64(123);
        params.generate(&mut rng).unwrap().docs
    }

    #[test]
    fn sample_chain() -> Result<()> {
        let docs = corpus();
        let settings = LdaSettings {
            num_topics: 3,
            num_sweeps: 20,
            store_trace: true,
            ..Default::default()
        };
        let mut rng = StdRng::seed_from_u64(42);
        let output = sample_sequentially(&settings, &docs, 0, &mut rng)?;
        assert_eq!(output.chain, 0);
        assert_eq!(output.trace.len(), 20);
        assert_eq!(output.state.n_docs(), 20);
        assert_eq!(output.state.definition().n_topics(), 3);
        output.state.check_consistency()?;
        Ok(())
    }

    #[test]
    fn sample_parallel_chains() -> Result<()> {
        let docs = corpus();
        let settings = LdaSettings {
            num_topics: 3,
            num_sweeps: 10,
            num_chains: 4,
            seed: 10,
            ..Default::default()
        };
        let chains = sample_parallel(&settings, &docs, 2)?;
        assert_eq!(chains.len(), 4);
        for (idx, output) in chains.iter().enumerate() {
            assert_eq!(output.chain, idx as u64);
            assert!(output.trace.is_empty());
            output.state.check_consistency()?;
        }
        assert!(chains[0].state != chains[1].state);

        let again = sample_parallel(&settings, &docs, 3)?;
        for (a, b) in chains.iter().zip(&again) {
            assert_eq!(a.state, b.state);
        }

        let mut rng = ChaCha8Rng::seed_from_u64(10);
        rng.set_stream(2);
        let single = sample_sequentially(&settings, &docs, 2, &mut rng)?;
        assert_eq!(single.state, chains[2].state);
        Ok(())
    }

    #[test]
    fn invalid_settings() {
        let docs = corpus();
        let settings = LdaSettings {
            alpha: -1.,
            ..Default::default()
        };
        let mut rng = StdRng::seed_from_u64(0);
        let err = sample_sequentially(&settings, &docs, 0, &mut rng).unwrap_err();
        assert!(matches!(err, LdaError::InvalidHyperparameter { name: "alpha", .. }));
        assert!(sample_parallel(&settings, &docs, 1).is_err());
    }
}
