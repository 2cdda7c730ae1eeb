//! Recover the topics of a synthetic corpus and report held-out perplexity.

use anyhow::Result;
use lda_rs::{
    predict::held_out_perplexity, test_corpus::SyntheticCorpus, LatentState, ModelDefinition,
    Runner,
};
use rand::{rngs::StdRng, SeedableRng};

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let params = SyntheticCorpus {
        n_docs: 300,
        ..Default::default()
    };
    let mut rng = StdRng::seed_from_u64(42);
    let corpus = params.generate(&mut rng)?;
    let (train, test) = corpus.docs.split_at(250);

    let defn = ModelDefinition::new(train.len(), params.n_terms, params.n_topics, 0.1, 0.05)?;
    let mut latent = LatentState::initialize(&defn, train, &mut rng)?;
    let mut runner = Runner::new(&defn, train, &mut latent)?
        .with_trace()
        .with_log_every(100);
    runner.run(&mut rng, 300);

    for stats in runner.trace().iter().step_by(50) {
        println!(
            "sweep {:>4}: perplexity {:.3}, {} tokens moved",
            stats.sweep, stats.perplexity, stats.num_changed
        );
    }

    let held_out = held_out_perplexity(&latent, test, &mut rng, 50)?;
    println!("training perplexity {:.3}", latent.perplexity());
    println!("held-out perplexity {held_out:.3}");

    for topic in 0..params.n_topics {
        let terms: Vec<usize> = latent
            .top_terms(topic, 6)
            .into_iter()
            .map(|(term, _)| term)
            .collect();
        println!("topic {topic}: {terms:?}");
    }
    Ok(())
}
