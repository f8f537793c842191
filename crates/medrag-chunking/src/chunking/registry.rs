//! Token counter registry for model selection

use super::hf_counter::HfTokenCounter;
use super::tiktoken_counter::TiktokenCounter;
use super::traits::TokenCounterRef;
use super::whitespace_counter::WhitespaceCounter;
use medrag_config::TokenizerConfig;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Model prefixes served by tiktoken encodings
const TIKTOKEN_PREFIXES: &[&str] = &[
    "gpt-4o",
    "gpt-4",
    "gpt-3.5",
    "o1",
    "text-embedding-3",
    "text-embedding-ada",
    "text-davinci",
    "code-",
];

/// Registry for token counters by model ID
///
/// Resolution never fails: an unknown model or an unloadable tokenizer
/// resolves to the whitespace counter and logs a warning.
pub struct TokenCounterRegistry {
    counters: HashMap<String, TokenCounterRef>,
    fallback: TokenCounterRef,
    cache_dir: Option<PathBuf>,
}

impl TokenCounterRegistry {
    /// Create an empty registry with the whitespace fallback
    pub fn new() -> Self {
        Self {
            counters: HashMap::new(),
            fallback: Arc::new(WhitespaceCounter::new()),
            cache_dir: None,
        }
    }

    /// Directory searched for `<model>/tokenizer.json`
    #[must_use]
    pub fn with_cache_dir(mut self, cache_dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(cache_dir.into());
        self
    }

    /// Resolve the counter described by a tokenizer configuration
    pub fn from_config(config: &TokenizerConfig) -> TokenCounterRef {
        let mut registry = Self::new();
        if let Some(cache_dir) = &config.cache_dir {
            registry = registry.with_cache_dir(cache_dir);
        }

        let Some(model) = config.model.as_deref() else {
            tracing::debug!("No tokenizer model configured, counting whitespace tokens");
            return registry.fallback();
        };

        match config.tokenizer_path.as_deref() {
            Some(path) => registry.load_hf(model, Path::new(path)),
            None => registry.for_model(model),
        }
    }

    /// Get a token counter for the specified model
    pub fn for_model(&self, model_id: &str) -> TokenCounterRef {
        // Try exact match first
        if let Some(counter) = self.counters.get(model_id) {
            return Arc::clone(counter);
        }

        // Longest registered prefix wins for model variants
        if let Some((_, counter)) = self
            .counters
            .iter()
            .filter(|(key, _)| model_id.starts_with(key.as_str()))
            .max_by_key(|(key, _)| key.len())
        {
            return Arc::clone(counter);
        }

        if TIKTOKEN_PREFIXES
            .iter()
            .any(|prefix| model_id.starts_with(prefix))
        {
            return match TiktokenCounter::new(model_id) {
                Ok(counter) => Arc::new(counter),
                Err(e) => self.degrade(model_id, &e),
            };
        }

        match &self.cache_dir {
            Some(cache_dir) => {
                let path = cache_dir.join(model_id).join("tokenizer.json");
                self.load_hf(model_id, &path)
            }
            None => {
                tracing::warn!(
                    "No tokenizer known for {model_id} and no cache dir configured, \
                     falling back to whitespace counting"
                );
                self.fallback()
            }
        }
    }

    fn load_hf(&self, model_id: &str, path: &Path) -> TokenCounterRef {
        match HfTokenCounter::from_file(model_id, path) {
            Ok(counter) => Arc::new(counter),
            Err(e) => self.degrade(model_id, &e),
        }
    }

    fn degrade(&self, model_id: &str, error: &dyn std::fmt::Display) -> TokenCounterRef {
        tracing::warn!(
            "Tokenizer for {model_id} unavailable ({error}), falling back to whitespace counting"
        );
        self.fallback()
    }

    /// The whitespace counter used when nothing better is available
    pub fn fallback(&self) -> TokenCounterRef {
        Arc::clone(&self.fallback)
    }

    /// Register a new counter
    pub fn register(&mut self, model_id: impl Into<String>, counter: TokenCounterRef) {
        self.counters.insert(model_id.into(), counter);
    }

    /// List all registered model IDs
    pub fn list_models(&self) -> Vec<String> {
        let mut models: Vec<String> = self.counters.keys().cloned().collect();
        models.sort();
        models
    }
}

impl Default for TokenCounterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunking::traits::TokenCounter;
    use crate::chunking::whitespace_counter::WHITESPACE_COUNTER_ID;

    struct FixedCounter(&'static str);

    impl TokenCounter for FixedCounter {
        fn identifier(&self) -> &str {
            self.0
        }

        fn count(&self, text: &str) -> usize {
            text.len()
        }
    }

    #[test]
    fn test_exact_and_prefix_lookup() {
        let mut registry = TokenCounterRegistry::new();
        registry.register("bio", Arc::new(FixedCounter("hf:bio")));
        registry.register("biobert-base", Arc::new(FixedCounter("hf:biobert-base")));

        assert_eq!(registry.for_model("bio").identifier(), "hf:bio");
        assert_eq!(
            registry.for_model("biobert-base-cased").identifier(),
            "hf:biobert-base"
        );
        assert_eq!(registry.list_models(), vec!["bio", "biobert-base"]);
    }

    #[test]
    fn test_unknown_model_falls_back() {
        let registry = TokenCounterRegistry::new();
        let counter = registry.for_model("unknown/model");
        assert_eq!(counter.identifier(), WHITESPACE_COUNTER_ID);
        assert_eq!(counter.count("three short words"), 3);
    }

    #[test]
    fn test_missing_cached_tokenizer_falls_back() {
        let dir = tempfile::tempdir().expect("Should create temp dir");
        let registry = TokenCounterRegistry::new().with_cache_dir(dir.path());
        assert_eq!(
            registry.for_model("BAAI/bge-small-en").identifier(),
            WHITESPACE_COUNTER_ID
        );
    }

    #[test]
    fn test_tiktoken_models_resolve() {
        let registry = TokenCounterRegistry::new();
        assert_eq!(
            registry.for_model("gpt-4o-mini").identifier(),
            "tiktoken:gpt-4o-mini"
        );
    }

    #[test]
    fn test_from_config_without_model_uses_fallback() {
        let config = TokenizerConfig {
            model: None,
            tokenizer_path: None,
            cache_dir: None,
        };
        assert_eq!(
            TokenCounterRegistry::from_config(&config).identifier(),
            WHITESPACE_COUNTER_ID
        );
    }

    #[test]
    fn test_from_config_bad_path_uses_fallback() {
        let config = TokenizerConfig {
            model: Some("pubmedbert".to_string()),
            tokenizer_path: Some("/nonexistent/tokenizer.json".to_string()),
            cache_dir: None,
        };
        assert_eq!(
            TokenCounterRegistry::from_config(&config).identifier(),
            WHITESPACE_COUNTER_ID
        );
    }
}
