//! Greedy sentence packing under a token budget

use super::numeric_safety::expand_window_with;
use super::traits::TokenCounter;
use medrag_config::ChunkingConfig;
use std::ops::Range;

/// Token budget configuration for packing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenBudget {
    /// Size a chunk grows towards
    pub target: usize,
    /// Absolute ceiling, never exceeded
    pub max: usize,
    /// Tokens of trailing sentences repeated in the next chunk
    pub overlap: usize,
}

impl TokenBudget {
    pub const fn new(target: usize, max: usize, overlap: usize) -> Self {
        Self {
            target,
            max,
            overlap,
        }
    }

    pub const fn from_config(config: &ChunkingConfig) -> Self {
        Self::new(config.target_tokens, config.max_tokens, config.overlap_tokens)
    }
}

/// A packable unit: a whole sentence or a fragment of an oversized one
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Piece {
    pub text: String,
    /// Continues the previous piece mid-word and joins it without a space
    pub continues: bool,
}

impl Piece {
    fn new(text: impl Into<String>, continues: bool) -> Self {
        Self {
            text: text.into(),
            continues,
        }
    }
}

/// Join pieces back into chunk body text
pub fn join_pieces(pieces: &[Piece]) -> String {
    let mut text = String::new();
    for (i, piece) in pieces.iter().enumerate() {
        if i > 0 && !piece.continues {
            text.push(' ');
        }
        text.push_str(&piece.text);
    }
    text
}

/// Packs consecutive sentences into windows
///
/// Windows are measured through a caller-supplied function so the budget
/// applies to the rendered chunk text (title line and section tag included),
/// not just the sentence bodies.
pub struct SentencePacker<'a> {
    counter: &'a dyn TokenCounter,
    budget: TokenBudget,
}

impl<'a> SentencePacker<'a> {
    pub const fn new(counter: &'a dyn TokenCounter, budget: TokenBudget) -> Self {
        Self { counter, budget }
    }

    /// Split sentences that cannot fit in a chunk on their own
    ///
    /// Oversized sentences are cut at word boundaries, and single words at
    /// character boundaries, until every piece satisfies `fits`. A single
    /// character is always kept whole, fitting or not.
    pub fn split_oversized<F>(sentences: &[&str], fits: F) -> Vec<Piece>
    where
        F: Fn(&str) -> bool,
    {
        let mut pieces = Vec::with_capacity(sentences.len());
        for sentence in sentences {
            if fits(sentence) {
                pieces.push(Piece::new(*sentence, false));
                continue;
            }
            tracing::trace!("Splitting oversized sentence of {} bytes", sentence.len());

            let mut current = String::new();
            for word in sentence.split_whitespace() {
                let candidate = if current.is_empty() {
                    word.to_string()
                } else {
                    format!("{current} {word}")
                };
                if fits(&candidate) {
                    current = candidate;
                    continue;
                }
                if !current.is_empty() {
                    pieces.push(Piece::new(std::mem::take(&mut current), false));
                }
                if fits(word) {
                    current = word.to_string();
                } else {
                    pieces.extend(split_by_chars(word, &fits));
                }
            }
            if !current.is_empty() {
                pieces.push(Piece::new(current, false));
            }
        }
        pieces
    }

    /// Pack sentences into windows of sentence indices
    ///
    /// `measure(first, window)` returns the token count of the chunk rendered
    /// from the sentences in `window`; `first` is true for the first window
    /// produced. Every sentence must fit on its own (see
    /// [`Self::split_oversized`]).
    ///
    /// Windows grow greedily up to the target, are extended past unsafe
    /// numeric boundaries up to the ceiling, and start with the trailing
    /// sentences of the previous window worth at most `overlap` tokens.
    pub fn pack<F>(&self, sentences: &[&str], measure: F) -> Vec<Range<usize>>
    where
        F: Fn(bool, Range<usize>) -> usize,
    {
        let total = sentences.len();
        let mut windows: Vec<Range<usize>> = Vec::new();
        let mut start = 0;
        let mut fresh = 0;

        while fresh < total {
            let first = windows.is_empty();
            let fits = |from: usize, to: usize, limit: usize| to <= total && measure(first, from..to) <= limit;

            // Overlap gives way to new content when both don't fit
            while start < fresh && !fits(start, fresh + 1, self.budget.max) {
                start += 1;
            }

            let mut end = fresh + 1;
            while end < total && fits(start, end + 1, self.budget.target) {
                end += 1;
            }

            let (_, end) = expand_window_with(sentences, start, end, self.budget.max, |from, to| {
                if to <= total {
                    measure(first, from..to)
                } else {
                    usize::MAX
                }
            });

            windows.push(start..end);
            if end >= total {
                break;
            }

            start = self.overlap_start(sentences, start, end);
            fresh = end;
        }

        windows
    }

    /// First sentence of the overlap carried out of `start..end`
    ///
    /// The earliest index after `start` whose tail fits in the overlap
    /// budget; `end` when nothing fits or overlap is disabled.
    fn overlap_start(&self, sentences: &[&str], start: usize, end: usize) -> usize {
        if self.budget.overlap == 0 {
            return end;
        }

        let mut overlap_from = end;
        for k in (start + 1..end).rev() {
            let tail = sentences.get(k..end).map_or_else(String::new, |s| s.join(" "));
            if self.counter.count(&tail) > self.budget.overlap {
                break;
            }
            overlap_from = k;
        }
        overlap_from
    }
}

/// Cut a word into the longest fitting runs of characters
///
/// Every piece after the first continues the word.
fn split_by_chars<F>(word: &str, fits: &F) -> Vec<Piece>
where
    F: Fn(&str) -> bool,
{
    let mut runs = Vec::new();
    let mut current = String::new();
    for c in word.chars() {
        current.push(c);
        if !fits(&current) && current.chars().count() > 1 {
            current.pop();
            runs.push(std::mem::take(&mut current));
            current.push(c);
        }
    }
    if !current.is_empty() {
        runs.push(current);
    }

    runs.into_iter()
        .enumerate()
        .map(|(i, run)| Piece::new(run, i > 0))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunking::whitespace_counter::WhitespaceCounter;

    fn words(window: &[&str]) -> usize {
        window.iter().map(|s| s.split_whitespace().count()).sum()
    }

    fn texts(pieces: &[Piece]) -> Vec<&str> {
        pieces.iter().map(|p| p.text.as_str()).collect()
    }

    fn packed<'s>(sentences: &[&'s str], windows: &[Range<usize>]) -> Vec<Vec<&'s str>> {
        windows.iter().map(|w| sentences[w.clone()].to_vec()).collect()
    }

    #[test]
    fn test_pack_without_overlap() {
        let sentences = ["one two three.", "four five six.", "seven eight nine.", "ten eleven."];
        let packer = SentencePacker::new(&WhitespaceCounter, TokenBudget::new(6, 8, 0));
        let windows = packer.pack(&sentences, |_, w| words(&sentences[w]));

        assert_eq!(windows, vec![0..2, 2..4]);
    }

    #[test]
    fn test_pack_carries_overlap() {
        let sentences = ["a b.", "c d.", "e f.", "g h.", "i j."];
        let packer = SentencePacker::new(&WhitespaceCounter, TokenBudget::new(4, 6, 2));
        let windows = packer.pack(&sentences, |_, w| words(&sentences[w]));

        assert_eq!(windows, vec![0..2, 1..3, 2..4, 3..5]);
        for pair in packed(&sentences, &windows).windows(2) {
            assert_eq!(pair[0].last(), pair[1].first());
        }
    }

    #[test]
    fn test_overlap_dropped_when_it_would_break_ceiling() {
        let sentences = ["a b.", "c d.", "e f g h i."];
        let packer = SentencePacker::new(&WhitespaceCounter, TokenBudget::new(4, 6, 2));
        let windows = packer.pack(&sentences, |_, w| words(&sentences[w]));

        // "c d." would be carried, but "c d. e f g h i." is 7 tokens
        assert_eq!(windows, vec![0..2, 2..3]);
    }

    #[test]
    fn test_measure_sees_first_window_flag() {
        let sentences = ["a b c.", "d e f.", "g h i."];
        let packer = SentencePacker::new(&WhitespaceCounter, TokenBudget::new(6, 6, 0));
        // The first window pays for a three-token title
        let windows = packer.pack(&sentences, |first, w| words(&sentences[w]) + if first { 3 } else { 0 });

        assert_eq!(windows, vec![0..1, 1..3]);
    }

    #[test]
    fn test_numeric_boundary_is_extended() {
        let sentences = ["Risk was reduced by 25%.", "(95% CI 0.68-0.82, p<0.001).", "Next."];
        let packer = SentencePacker::new(&WhitespaceCounter, TokenBudget::new(5, 20, 0));
        let windows = packer.pack(&sentences, |_, w| words(&sentences[w]));

        assert_eq!(windows, vec![0..2, 2..3]);
    }

    #[test]
    fn test_split_oversized_by_words_and_chars() {
        let fits = |s: &str| s.split_whitespace().count() <= 2 && s.len() <= 8;
        let pieces = SentencePacker::split_oversized(&["ok.", "one two three four", "abcdefghijkl"], fits);

        assert_eq!(texts(&pieces), vec!["ok.", "one two", "three", "four", "abcdefgh", "ijkl"]);
        let continues: Vec<bool> = pieces.iter().map(|p| p.continues).collect();
        assert_eq!(continues, vec![false, false, false, false, false, true]);
    }

    #[test]
    fn test_char_split_pieces_rejoin_without_spaces() {
        let pieces = SentencePacker::split_oversized(&["See antidisestablishment."], |s: &str| s.len() <= 10);

        assert!(pieces.iter().all(|p| p.text.chars().count() == 1 || p.text.len() <= 10));
        assert_eq!(join_pieces(&pieces), "See antidisestablishment.");
    }

    #[test]
    fn test_unfittable_characters_are_kept_whole() {
        let pieces = SentencePacker::split_oversized(&["Word."], |_: &str| false);

        assert_eq!(texts(&pieces), vec!["W", "o", "r", "d", "."]);
        assert_eq!(join_pieces(&pieces), "Word.");
    }
}
