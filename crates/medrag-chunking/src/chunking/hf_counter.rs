//! Hugging Face tokenizer-backed token counter

use super::traits::TokenCounter;
use super::whitespace_counter::WhitespaceCounter;
use crate::error::{ChunkingError, ChunkingResult};
use std::path::Path;
use std::sync::Arc;
use tokenizers::Tokenizer;

/// Token counter for models shipping a `tokenizer.json`
///
/// Counts exclude special tokens so a chunk's budget reflects its own text.
pub struct HfTokenCounter {
    identifier: String,
    tokenizer: Arc<Tokenizer>,
}

impl HfTokenCounter {
    /// Wrap an already loaded tokenizer
    pub fn new(model: &str, tokenizer: Arc<Tokenizer>) -> Self {
        Self {
            identifier: format!("hf:{model}"),
            tokenizer,
        }
    }

    /// Load a tokenizer from a `tokenizer.json` file
    ///
    /// # Errors
    /// Returns `ChunkingError::TokenCountingError` if the file is missing or
    /// cannot be parsed.
    pub fn from_file(model: &str, path: impl AsRef<Path>) -> ChunkingResult<Self> {
        let path = path.as_ref();
        let tokenizer = Tokenizer::from_file(path).map_err(|e| {
            ChunkingError::token_counting_error(format!(
                "Failed to load tokenizer for {model} from {}: {e}",
                path.display()
            ))
        })?;
        tracing::debug!("Loaded tokenizer for {model} from {}", path.display());
        Ok(Self::new(model, Arc::new(tokenizer)))
    }
}

impl TokenCounter for HfTokenCounter {
    fn identifier(&self) -> &str {
        &self.identifier
    }

    fn count(&self, text: &str) -> usize {
        if text.is_empty() {
            return 0;
        }
        match self.tokenizer.encode(text, false) {
            Ok(encoding) => encoding.len(),
            Err(e) => {
                tracing::trace!("{} failed to encode text, counting words: {e}", self.identifier);
                WhitespaceCounter.count(text)
            }
        }
    }
}
