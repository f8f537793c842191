//! Whitespace word counter used when no model tokenizer is available

use super::traits::TokenCounter;

/// Identifier reported by the fallback counter
pub const WHITESPACE_COUNTER_ID: &str = "fallback:whitespace";

/// Counts whitespace-delimited words
///
/// Always available, so it backs every failed model-tokenizer load.
#[derive(Debug, Clone, Copy, Default)]
pub struct WhitespaceCounter;

impl WhitespaceCounter {
    pub const fn new() -> Self {
        Self
    }
}

impl TokenCounter for WhitespaceCounter {
    fn identifier(&self) -> &str {
        WHITESPACE_COUNTER_ID
    }

    fn count(&self, text: &str) -> usize {
        text.split_whitespace().count()
    }
}
