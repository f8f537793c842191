//! Tiktoken-based token counter for OpenAI models

use super::traits::TokenCounter;
use crate::error::{ChunkingError, ChunkingResult};
use tiktoken_rs::{CoreBPE, cl100k_base, o200k_base, p50k_base, r50k_base};

/// Token counter using tiktoken BPE encodings
pub struct TiktokenCounter {
    /// `tiktoken:<model>`
    identifier: String,
    /// The tiktoken encoder
    encoder: CoreBPE,
}

impl TiktokenCounter {
    /// Create a new tiktoken counter for the specified model
    ///
    /// # Errors
    /// Returns `ChunkingError::TokenCountingError` if the encoding cannot be
    /// constructed.
    pub fn new(model_name: &str) -> ChunkingResult<Self> {
        let encoder = Self::get_encoder_for_model(model_name).map_err(|e| {
            ChunkingError::token_counting_error(format!(
                "tiktoken encoder for {model_name}: {e}"
            ))
        })?;

        Ok(Self {
            identifier: format!("tiktoken:{model_name}"),
            encoder,
        })
    }

    /// Get the appropriate encoder for a model name
    fn get_encoder_for_model(model_name: &str) -> anyhow::Result<CoreBPE> {
        let encoder = match model_name {
            // GPT-4o and o-series models use o200k_base
            name if name.starts_with("gpt-4o") || name.starts_with("o1") => o200k_base()?,
            // GPT-4 and GPT-3.5-turbo use cl100k_base
            name if name.starts_with("gpt-4") || name.starts_with("gpt-3.5") => cl100k_base()?,
            // OpenAI embedding models
            name if name.starts_with("text-embedding") => cl100k_base()?,
            // Older GPT-3 models
            name if name.starts_with("text-davinci") || name.starts_with("code-") => {
                p50k_base()?
            }
            // Legacy models
            name if name.starts_with("davinci") || name.starts_with("curie") => r50k_base()?,
            // Default to cl100k_base for unknown models
            _ => cl100k_base()?,
        };

        Ok(encoder)
    }

    /// Counter matching `text-embedding-3-small`/`-large`
    ///
    /// # Errors
    /// Returns an error if the encoding cannot be constructed.
    pub fn text_embedding_3() -> ChunkingResult<Self> {
        Self::new("text-embedding-3-small")
    }

    /// # Errors
    /// Returns an error if the encoding cannot be constructed.
    pub fn gpt4o() -> ChunkingResult<Self> {
        Self::new("gpt-4o")
    }
}

impl TokenCounter for TiktokenCounter {
    fn identifier(&self) -> &str {
        &self.identifier
    }

    fn count(&self, text: &str) -> usize {
        if text.is_empty() {
            return 0;
        }
        self.encoder.encode_ordinary(text).len()
    }
}
