//! Trait definitions for token counting

use std::sync::Arc;

/// Trait for counting tokens in text
///
/// Implementations must be stateless and reentrant: the same counter is
/// shared across threads chunking independent documents.
pub trait TokenCounter: Send + Sync {
    /// Identifier stamped into chunk metadata (e.g. `hf:<model>`)
    fn identifier(&self) -> &str;

    /// Count tokens in the given text
    ///
    /// Must never fail, must return 0 for the empty string, and must be
    /// deterministic for the same input.
    fn count(&self, text: &str) -> usize;

    /// Count tokens for multiple texts
    fn count_batch(&self, texts: &[&str]) -> Vec<usize> {
        texts.iter().map(|text| self.count(text)).collect()
    }
}

/// Type alias for shared token counter
pub type TokenCounterRef = Arc<dyn TokenCounter>;
