//! Fit a topic model to an LDA-C corpus.
//!
//! ```text
//! cargo run --release --example fit_ldac -- corpus.ldac [num_topics] [num_sweeps]
//! ```
//!
//! Term ids in the corpus file must be zero-based.

use anyhow::{Context, Result};
use lda_rs::{
    ldac::{read_ldac_file, TermIndexing},
    sample_parallel, LdaSettings,
};

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let mut args = std::env::args().skip(1);
    let path = args.next().context(
        "usage: fit_ldac <corpus.ldac> [topics] [sweeps] (term ids in the corpus are zero-based)",
    )?;
    let num_topics = args.next().map(|s| s.parse::<usize>()).transpose()?.unwrap_or(10);
    let num_sweeps = args.next().map(|s| s.parse::<u64>()).transpose()?.unwrap_or(200);

    let docs = read_ldac_file(&path, TermIndexing::ZeroBased)
        .with_context(|| format!("Could not read corpus {path}"))?;
    println!(
        "{} documents, {} terms, {} tokens",
        docs.len(),
        lda_rs::num_terms(&docs),
        lda_rs::total_tokens(&docs)
    );

    let settings = LdaSettings {
        num_topics,
        num_sweeps,
        num_chains: 4,
        seed: 12345,
        ..Default::default()
    };
    let chains = sample_parallel(&settings, &docs, 4)?;

    let best = chains
        .iter()
        .min_by(|a, b| a.state.perplexity().total_cmp(&b.state.perplexity()))
        .context("No chains were sampled")?;
    for output in &chains {
        println!(
            "chain {}: perplexity {:.3}",
            output.chain,
            output.state.perplexity()
        );
    }

    println!("topics of chain {}:", best.chain);
    for topic in 0..num_topics {
        let terms: Vec<String> = best
            .state
            .top_terms(topic, 8)
            .into_iter()
            .map(|(term, prob)| format!("{term}[{prob:.3}]"))
            .collect();
        println!("{topic:>3}: {}", terms.join(" "));
    }
    Ok(())
}
