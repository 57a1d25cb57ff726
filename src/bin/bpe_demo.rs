//! BPE demo - prints each merge learned on the `hug/pug/pun/bun` vocabulary.
//!
//! Usage: `bpe-demo [NUM_MERGES]` (default 4).

use clap::Parser;
use react_agent::bpe::{demo_vocab, learn_merges, pair_statistics};

#[derive(Parser, Debug)]
#[command(name = "bpe-demo", about = "Learn BPE merges on a toy vocabulary")]
struct Args {
    /// Number of merges to learn
    #[arg(default_value_t = 4)]
    num_merges: usize,
}

fn main() -> anyhow::Result<()> {
    let Args { num_merges } = Args::parse();

    let vocab = demo_vocab();
    let mut current = vocab.clone();

    for (i, step) in learn_merges(&vocab, num_merges).iter().enumerate() {
        let pairs = pair_statistics(&current)
            .iter()
            .map(|((a, b), n)| format!("({}, {}): {}", a, b, n))
            .collect::<Vec<_>>()
            .join(", ");
        println!("pairs: {{{}}}", pairs);
        println!("best: ({}, {})", step.pair.0, step.pair.1);
        println!(
            "第{}次合并: ({}, {}) -> {}",
            i + 1,
            step.pair.0,
            step.pair.1,
            step.merged()
        );
        println!("新词表: {:?}", step.vocab.words().collect::<Vec<_>>());
        println!("{}", "-".repeat(20));
        current = step.vocab.clone();
    }

    Ok(())
}
