//! Toy Byte Pair Encoding (BPE) merge learning.
//!
//! A vocabulary maps words, written as space-separated symbols (usually ending
//! in the `</w>` end-of-word marker), to their frequency. Each merge step
//! counts adjacent symbol pairs, picks the most frequent one and fuses it into
//! a single symbol everywhere it occurs.

use std::collections::HashMap;

/// Word (space-separated symbols) → frequency, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Vocab {
    entries: Vec<(String, u64)>,
}

/// Adjacent symbol pair.
pub type Pair = (String, String);

/// One learned merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeStep {
    pub pair: Pair,
    pub count: u64,
    /// Vocabulary after applying the merge.
    pub vocab: Vocab,
}

impl MergeStep {
    /// The new symbol created by this merge.
    pub fn merged(&self) -> String {
        format!("{}{}", self.pair.0, self.pair.1)
    }
}

impl Vocab {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `freq` occurrences of `word`; repeated words accumulate.
    pub fn insert(&mut self, word: impl Into<String>, freq: u64) {
        let word = word.into();
        match self.entries.iter_mut().find(|(w, _)| *w == word) {
            Some((_, f)) => *f += freq,
            None => self.entries.push((word, freq)),
        }
    }

    pub fn get(&self, word: &str) -> Option<u64> {
        self.entries.iter().find(|(w, _)| w == word).map(|(_, f)| *f)
    }

    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(w, _)| w.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.entries.iter().map(|(w, f)| (w.as_str(), *f))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, u64)> for Vocab {
    fn from_iter<I: IntoIterator<Item = (S, u64)>>(iter: I) -> Self {
        let mut vocab = Vocab::new();
        for (word, freq) in iter {
            vocab.insert(word, freq);
        }
        vocab
    }
}

/// Frequency of every adjacent symbol pair, weighted by word frequency.
///
/// Returned in order of first appearance so ties resolve deterministically.
pub fn pair_statistics(vocab: &Vocab) -> Vec<(Pair, u64)> {
    let mut index: HashMap<Pair, usize> = HashMap::new();
    let mut stats: Vec<(Pair, u64)> = Vec::new();

    for (word, freq) in vocab.iter() {
        let symbols: Vec<&str> = word.split_whitespace().collect();
        for window in symbols.windows(2) {
            let pair = (window[0].to_string(), window[1].to_string());
            match index.get(&pair) {
                Some(&i) => stats[i].1 += freq,
                None => {
                    index.insert(pair.clone(), stats.len());
                    stats.push((pair, freq));
                }
            }
        }
    }

    stats
}

/// Most frequent pair; the earliest seen wins a tie.
pub fn best_pair(stats: &[(Pair, u64)]) -> Option<(Pair, u64)> {
    stats
        .iter()
        .fold(None::<&(Pair, u64)>, |best, candidate| match best {
            Some(b) if b.1 >= candidate.1 => Some(b),
            _ => Some(candidate),
        })
        .cloned()
}

/// Replace every occurrence of `pair` as two whole adjacent symbols.
pub fn merge_pair(pair: &Pair, vocab: &Vocab) -> Vocab {
    vocab
        .iter()
        .map(|(word, freq)| (merge_word(pair, word), freq))
        .collect()
}

fn merge_word(pair: &Pair, word: &str) -> String {
    let symbols: Vec<&str> = word.split_whitespace().collect();
    let mut out: Vec<String> = Vec::with_capacity(symbols.len());
    let mut i = 0;
    while i < symbols.len() {
        if i + 1 < symbols.len() && symbols[i] == pair.0 && symbols[i + 1] == pair.1 {
            out.push(format!("{}{}", pair.0, pair.1));
            i += 2;
        } else {
            out.push(symbols[i].to_string());
            i += 1;
        }
    }
    out.join(" ")
}

/// Learn up to `num_merges` merges, stopping early when no pairs remain.
pub fn learn_merges(vocab: &Vocab, num_merges: usize) -> Vec<MergeStep> {
    let mut current = vocab.clone();
    let mut steps = Vec::with_capacity(num_merges);

    for _ in 0..num_merges {
        let stats = pair_statistics(&current);
        let Some((pair, count)) = best_pair(&stats) else {
            tracing::debug!("No symbol pairs left, stopping after {} merges", steps.len());
            break;
        };
        current = merge_pair(&pair, &current);
        steps.push(MergeStep {
            pair,
            count,
            vocab: current.clone(),
        });
    }

    steps
}

/// The classic `hug / pug / pun / bun` example vocabulary.
pub fn demo_vocab() -> Vocab {
    [
        ("h u g </w>", 1),
        ("p u g </w>", 1),
        ("p u n </w>", 1),
        ("b u n </w>", 1),
    ]
    .into_iter()
    .collect()
}
