//! Latent Dirichlet Allocation topic models fitted with collapsed Gibbs sampling.
//!
//! ```no_run
//! use lda_rs::{ldac, LatentState, ModelDefinition, Runner};
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! # fn main() -> anyhow::Result<()> {
//! let docs = ldac::read_ldac_file("reuters.ldac", ldac::TermIndexing::ZeroBased)?;
//! let defn = ModelDefinition::new(docs.len(), lda_rs::num_terms(&docs), 10, 0.1, 0.01)?;
//! let mut rng = StdRng::seed_from_u64(12345);
//! let mut latent = LatentState::initialize(&defn, &docs, &mut rng)?;
//! let mut runner = Runner::new(&defn, &docs, &mut latent)?;
//! runner.run(&mut rng, 100);
//! println!("perplexity: {}", latent.perplexity());
//! # Ok(())
//! # }
//! ```

pub(crate) mod corpus;
pub(crate) mod definition;
pub(crate) mod error;
pub(crate) mod gibbs;
pub mod ldac;
pub(crate) mod math;
pub mod predict;
pub(crate) mod runner;
pub(crate) mod sampler;
pub(crate) mod state;
pub mod test_corpus;

pub use corpus::{num_terms, total_tokens, Document, SparseDocument};
pub use definition::ModelDefinition;
pub use error::{LdaError, Result};
pub use gibbs::SweepStats;
pub use runner::Runner;
pub use sampler::{sample_parallel, sample_sequentially, ChainOutput, LdaSettings};
pub use state::LatentState;
