//! Keeps statistical claims together with their qualifiers
//!
//! A chunk boundary between "...reduced by 25%." and "(95% CI 0.68-0.82,
//! p<0.001)." strands the interval without the estimate it qualifies. The
//! packer asks [`needs_expansion`] at every boundary it is about to close and
//! grows the window when the split is unsafe.

use super::traits::TokenCounter;
use regex::Regex;
use std::sync::OnceLock;

/// Upper bound on sentences pulled in to protect one boundary
pub const MAX_EXPANSION_SENTENCES: usize = 3;

fn qualifier_regex() -> Option<&'static Regex> {
    static QUALIFIER: OnceLock<Option<Regex>> = OnceLock::new();
    QUALIFIER
        .get_or_init(|| {
            Regex::new(
                r"^[\(\[]?\s*(?:[pP]\s*(?:[<>=≤≥]|-?value)|\d{1,3}(?:\.\d+)?\s*%\s*(?:CI|CrI|confidence|credible)|CI\b|(?i:confidence\s+interval)|(?:a?OR|a?HR|a?RR|IRR|IQR|SD|SEM?|NNT|NNH|ARR|RRR)\b|[nN]\s*=)",
            )
            .ok()
        })
        .as_ref()
}

fn trailing_quantity_regex() -> Option<&'static Regex> {
    static TRAILING_QUANTITY: OnceLock<Option<Regex>> = OnceLock::new();
    TRAILING_QUANTITY
        .get_or_init(|| Regex::new(r"\d\s*%?\s*[A-Za-zµμ/]{0,10}[.!?]*$").ok())
        .as_ref()
}

/// Whether `sentence` opens with a statistical qualifier (p-value, CI, OR/HR, n=)
pub fn opens_with_qualifier(sentence: &str) -> bool {
    qualifier_regex().is_some_and(|re| re.is_match(sentence.trim_start()))
}

/// Whether `sentence` ends in a number, percentage or quantity
pub fn ends_with_quantity(sentence: &str) -> bool {
    trailing_quantity_regex().is_some_and(|re| re.is_match(sentence.trim_end()))
}

/// Whether closing a chunk before `sentences[boundary]` separates a claim
/// from its qualifier
///
/// `boundary` indexes the first sentence after the split; boundaries at
/// either end of the list are always safe.
pub fn needs_expansion(sentences: &[&str], boundary: usize) -> bool {
    if boundary == 0 {
        return false;
    }
    let (Some(before), Some(after)) = (sentences.get(boundary - 1), sentences.get(boundary)) else {
        return false;
    };

    if opens_with_qualifier(after) {
        return true;
    }
    after.trim_start().starts_with(['(', '[']) && ends_with_quantity(before)
}

/// Grow the window `start..end` past unsafe boundaries
///
/// Adds one sentence at a time while the boundary at `end` is unsafe and the
/// measured window stays within `max_tokens`. When the ceiling would be
/// exceeded the unsafe split is accepted.
pub fn expand_window_with<F>(
    sentences: &[&str],
    start: usize,
    end: usize,
    max_tokens: usize,
    measure: F,
) -> (usize, usize)
where
    F: Fn(usize, usize) -> usize,
{
    let mut end = end.min(sentences.len());
    let mut added = 0;

    while added < MAX_EXPANSION_SENTENCES && needs_expansion(sentences, end) {
        let tokens = measure(start, end + 1);
        if tokens > max_tokens {
            tracing::trace!(
                "Accepting unsafe split before sentence {end}: {tokens} tokens exceeds {max_tokens}"
            );
            break;
        }
        tracing::trace!("Expanding window {start}..{end} to keep qualifier attached");
        end += 1;
        added += 1;
    }

    (start, end)
}

/// Grow `start..end` past unsafe boundaries, measuring the joined sentences
pub fn expand_window(
    sentences: &[&str],
    start: usize,
    end: usize,
    counter: &dyn TokenCounter,
    max_tokens: usize,
) -> (usize, usize) {
    expand_window_with(sentences, start, end, max_tokens, |from, to| {
        sentences
            .get(from..to)
            .map_or(0, |window| counter.count(&window.join(" ")))
    })
}
