//! Centralized configuration management for medrag
//!
//! Provides type-safe, validated configuration for the chunking engine, the
//! token counter selection, and logging, with support for multiple sources
//! (defaults, TOML/YAML files, environment).
//!
//! Configuration follows a simple hierarchy:
//! 1. Safe defaults (defined as constants)
//! 2. Configuration file values
//! 3. Environment variable overrides
//! 4. Runtime validation

pub mod error;
pub mod source;
pub mod validation;

use std::collections::BTreeMap;
use std::str::FromStr;

pub use error::{ConfigError, ConfigResult};
pub use validation::Validate;

// =============================================================================
// SAFE DEFAULTS
// =============================================================================

// Chunk packing
const DEFAULT_TARGET_TOKENS: usize = 325;
const DEFAULT_MAX_TOKENS: usize = 450;
const DEFAULT_MIN_TOKENS: usize = 120;
const DEFAULT_OVERLAP_TOKENS: usize = 50;
const DEFAULT_MERGE_SMALL_SECTIONS: bool = false;

/// Version stamped into every chunk's metadata
pub const DEFAULT_CHUNKER_VERSION: &str = "v1.2.0";

// Section relevance hints consumed by downstream ranking
const DEFAULT_SECTION_BOOSTS: &[(&str, f64)] = &[
    ("Background", 0.0),
    ("Objective", 0.0),
    ("Methods", 0.0),
    ("Results", 0.1),
    ("Conclusions", 0.05),
];

// Hard limits used by validation
const MAX_TOKEN_CEILING: u64 = 100_000;

// Telemetry
const DEFAULT_TRACING_LEVEL: &str = "info";
const DEFAULT_JSON_LOGS: bool = false;

/// Parse an environment variable, ignoring unset or malformed values
fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.trim().parse().ok())
}

/// Core configuration for the whole medrag toolchain
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ApplicationConfig {
    /// Chunk packing configuration
    pub chunking: ChunkingConfig,

    /// Token counter selection
    pub tokenizer: TokenizerConfig,

    /// Logging configuration
    pub telemetry: TelemetryConfig,
}

/// Chunk packing configuration
///
/// Treated as read-only once built; a single instance is shared by every
/// chunking call.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Soft packing target in tokens
    pub target_tokens: usize,

    /// Hard ceiling in tokens; no chunk ever exceeds it
    pub max_tokens: usize,

    /// Sections below this size are merge candidates
    pub min_tokens: usize,

    /// Trailing tokens repeated at the start of the next chunk of a section
    pub overlap_tokens: usize,

    /// Version string stamped into chunk metadata
    pub chunker_version: String,

    /// Per-section relevance boost copied into chunk metadata
    pub section_boosts: BTreeMap<String, f64>,

    /// Merge sections smaller than `min_tokens` into their neighbours
    pub merge_small_sections: bool,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            target_tokens: DEFAULT_TARGET_TOKENS,
            max_tokens: DEFAULT_MAX_TOKENS,
            min_tokens: DEFAULT_MIN_TOKENS,
            overlap_tokens: DEFAULT_OVERLAP_TOKENS,
            chunker_version: DEFAULT_CHUNKER_VERSION.to_string(),
            section_boosts: DEFAULT_SECTION_BOOSTS
                .iter()
                .map(|(name, boost)| ((*name).to_string(), *boost))
                .collect(),
            merge_small_sections: DEFAULT_MERGE_SMALL_SECTIONS,
        }
    }
}

impl ChunkingConfig {
    /// Load configuration from environment variables with safe defaults
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Apply `MEDRAG_CHUNKING_*` environment overrides on top of `self`
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(v) = env_parse("MEDRAG_CHUNKING_TARGET_TOKENS") {
            self.target_tokens = v;
        }
        if let Some(v) = env_parse("MEDRAG_CHUNKING_MAX_TOKENS") {
            self.max_tokens = v;
        }
        if let Some(v) = env_parse("MEDRAG_CHUNKING_MIN_TOKENS") {
            self.min_tokens = v;
        }
        if let Some(v) = env_parse("MEDRAG_CHUNKING_OVERLAP_TOKENS") {
            self.overlap_tokens = v;
        }
        if let Some(v) = env_parse("MEDRAG_CHUNKING_MERGE_SMALL_SECTIONS") {
            self.merge_small_sections = v;
        }
        if let Ok(version) = std::env::var("MEDRAG_CHUNKING_VERSION") {
            self.chunker_version = version;
        }
        // Format: "Results=0.1,Conclusions=0.05"
        if let Ok(boosts) = std::env::var("MEDRAG_CHUNKING_SECTION_BOOSTS") {
            for pair in boosts.split(',') {
                let Some((name, value)) = pair.split_once('=') else {
                    tracing::warn!("Ignoring malformed section boost entry: {pair}");
                    continue;
                };
                match value.trim().parse::<f64>() {
                    Ok(boost) => {
                        self.section_boosts.insert(name.trim().to_string(), boost);
                    }
                    Err(e) => tracing::warn!("Ignoring section boost for {name}: {e}"),
                }
            }
        }
        self
    }

    /// Relevance boost for a section name, 0.0 when unlisted
    pub fn section_boost(&self, section: &str) -> f64 {
        self.section_boosts.get(section).copied().unwrap_or(0.0)
    }
}

impl validation::Validate for ChunkingConfig {
    fn validate(&self) -> ConfigResult<()> {
        validation::validate_range(
            self.target_tokens as u64,
            1,
            MAX_TOKEN_CEILING,
            "chunking.target_tokens",
        )?;
        validation::validate_range(
            self.max_tokens as u64,
            1,
            MAX_TOKEN_CEILING,
            "chunking.max_tokens",
        )?;
        validation::validate_ordering(
            self.target_tokens as u64,
            "chunking.target_tokens",
            self.max_tokens as u64,
            "chunking.max_tokens",
        )?;
        validation::validate_ordering(
            self.min_tokens as u64,
            "chunking.min_tokens",
            self.max_tokens as u64,
            "chunking.max_tokens",
        )?;

        // Overlap equal to the target would stall packing
        if self.overlap_tokens >= self.target_tokens {
            return Err(ConfigError::Generic {
                message: format!(
                    "chunking.overlap_tokens ({}) must be smaller than chunking.target_tokens ({})",
                    self.overlap_tokens, self.target_tokens
                ),
            });
        }

        validation::validate_non_empty(&self.chunker_version, "chunking.chunker_version")?;
        for (section, boost) in &self.section_boosts {
            validation::validate_non_empty(section, "chunking.section_boosts")?;
            validation::validate_finite(*boost, &format!("chunking.section_boosts.{section}"))?;
        }
        Ok(())
    }
}

/// Token counter selection
///
/// `model = None` selects the whitespace fallback counter.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct TokenizerConfig {
    /// Model identifier (e.g. "gpt-4o", "microsoft/BiomedNLP-PubMedBERT-base-uncased-abstract")
    pub model: Option<String>,

    /// Explicit path to a Hugging Face `tokenizer.json`
    pub tokenizer_path: Option<String>,

    /// Directory searched for `<model>/tokenizer.json` when no path is given
    pub cache_dir: Option<String>,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            model: None,
            tokenizer_path: None,
            cache_dir: Some(default_tokenizer_cache_dir()),
        }
    }
}

/// `<os cache dir>/medrag/tokenizers`
fn default_tokenizer_cache_dir() -> String {
    dirs::cache_dir()
        .unwrap_or_else(|| std::path::PathBuf::from(".cache"))
        .join("medrag")
        .join("tokenizers")
        .to_string_lossy()
        .to_string()
}

impl TokenizerConfig {
    /// Load configuration from environment variables with safe defaults
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Apply `MEDRAG_TOKENIZER_*` environment overrides on top of `self`
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(model) = std::env::var("MEDRAG_TOKENIZER_MODEL") {
            self.model = Some(model).filter(|m| !m.trim().is_empty());
        }
        if let Ok(path) = std::env::var("MEDRAG_TOKENIZER_PATH") {
            self.tokenizer_path = Some(path);
        }
        if let Ok(dir) = std::env::var("MEDRAG_TOKENIZER_CACHE_DIR") {
            self.cache_dir = Some(dir);
        }
        self
    }
}

impl validation::Validate for TokenizerConfig {
    fn validate(&self) -> ConfigResult<()> {
        if let Some(model) = &self.model {
            validation::validate_non_empty(model, "tokenizer.model")?;
        }
        if let Some(path) = &self.tokenizer_path {
            validation::validate_non_empty(path, "tokenizer.tokenizer_path")?;
        }
        Ok(())
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Tracing level (trace, debug, info, warn, error)
    pub tracing_level: String,

    /// Emit JSON log lines
    pub json_logs: bool,

    /// Optional directory for daily-rotated log files
    pub log_dir: Option<String>,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            tracing_level: DEFAULT_TRACING_LEVEL.to_string(),
            json_logs: DEFAULT_JSON_LOGS,
            log_dir: None,
        }
    }
}

impl TelemetryConfig {
    /// Load configuration from environment variables with safe defaults
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Apply `MEDRAG_TELEMETRY_*` environment overrides on top of `self`
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(level) = std::env::var("MEDRAG_TELEMETRY_TRACING_LEVEL") {
            self.tracing_level = level;
        }
        if let Some(json) = env_parse("MEDRAG_TELEMETRY_JSON_LOGS") {
            self.json_logs = json;
        }
        if let Ok(dir) = std::env::var("MEDRAG_TELEMETRY_LOG_DIR") {
            self.log_dir = Some(dir);
        }
        self
    }
}

impl validation::Validate for TelemetryConfig {
    fn validate(&self) -> ConfigResult<()> {
        match self.tracing_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
            _ => Err(ConfigError::Generic {
                message: format!("Invalid tracing level: {}", self.tracing_level),
            }),
        }
    }
}

impl ApplicationConfig {
    /// Load configuration from environment variables with safe defaults
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Apply every `MEDRAG_*` environment override on top of `self`
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        Self {
            chunking: self.chunking.with_env_overrides(),
            tokenizer: self.tokenizer.with_env_overrides(),
            telemetry: self.telemetry.with_env_overrides(),
        }
    }
}

impl validation::Validate for ApplicationConfig {
    fn validate(&self) -> ConfigResult<()> {
        self.chunking.validate()?;
        self.tokenizer.validate()?;
        self.telemetry.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunking_defaults() {
        let config = ChunkingConfig::default();
        assert_eq!(config.target_tokens, 325);
        assert_eq!(config.max_tokens, 450);
        assert_eq!(config.min_tokens, 120);
        assert_eq!(config.overlap_tokens, 50);
        assert_eq!(config.chunker_version, "v1.2.0");
        assert!(!config.merge_small_sections);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_section_boost_lookup() {
        let config = ChunkingConfig::default();
        assert!((config.section_boost("Results") - 0.1).abs() < f64::EPSILON);
        assert!((config.section_boost("Conclusions") - 0.05).abs() < f64::EPSILON);
        assert!(config.section_boost("Unstructured").abs() < f64::EPSILON);
    }

    #[test]
    fn test_validation_rejects_target_above_max() {
        let config = ChunkingConfig {
            target_tokens: 500,
            max_tokens: 450,
            ..ChunkingConfig::default()
        };
        let err = config.validate();
        assert!(err.is_err_and(|e| e.to_string().contains("must not exceed")));
    }

    #[test]
    fn test_validation_rejects_overlap_at_target() {
        let config = ChunkingConfig {
            target_tokens: 50,
            overlap_tokens: 50,
            ..ChunkingConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_non_finite_boost() {
        let mut config = ChunkingConfig::default();
        config
            .section_boosts
            .insert("Results".to_string(), f64::INFINITY);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_telemetry_config_validation() {
        let mut config = ApplicationConfig::default();
        config.telemetry.tracing_level = "invalid-level".to_string();

        let validation_result = config.validate();
        assert!(validation_result.is_err());

        if let Err(error) = validation_result {
            assert!(error.to_string().contains("Invalid tracing level"));
        }
    }

    #[test]
    fn test_environment_variable_overrides() {
        unsafe {
            std::env::set_var("MEDRAG_CHUNKING_OVERLAP_TOKENS", "0");
            std::env::set_var("MEDRAG_CHUNKING_SECTION_BOOSTS", "Methods=0.02, bogus");
            std::env::set_var("MEDRAG_TOKENIZER_MODEL", "gpt-4o");
        }

        let config = ApplicationConfig::from_env();

        assert_eq!(config.chunking.overlap_tokens, 0);
        assert!((config.chunking.section_boost("Methods") - 0.02).abs() < f64::EPSILON);
        assert!((config.chunking.section_boost("Results") - 0.1).abs() < f64::EPSILON);
        assert_eq!(config.tokenizer.model.as_deref(), Some("gpt-4o"));

        unsafe {
            std::env::remove_var("MEDRAG_CHUNKING_OVERLAP_TOKENS");
            std::env::remove_var("MEDRAG_CHUNKING_SECTION_BOOSTS");
            std::env::remove_var("MEDRAG_TOKENIZER_MODEL");
        }
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let parsed: ApplicationConfig = toml::from_str(
            r#"
            [chunking]
            target_tokens = 200
            max_tokens = 256
            "#,
        )
        .expect("Partial TOML should parse");

        assert_eq!(parsed.chunking.target_tokens, 200);
        assert_eq!(parsed.chunking.max_tokens, 256);
        assert_eq!(parsed.chunking.overlap_tokens, DEFAULT_OVERLAP_TOKENS);
        assert_eq!(parsed.telemetry.tracing_level, DEFAULT_TRACING_LEVEL);
        assert!(parsed.validate().is_ok());
    }

    #[test]
    fn test_configuration_serialization_roundtrip() {
        let original = ApplicationConfig::default();
        let toml_string = toml::to_string(&original).expect("Config should serialize to TOML");
        assert!(toml_string.contains("[chunking]"));

        let parsed: ApplicationConfig =
            toml::from_str(&toml_string).expect("Serialized config should parse");
        assert_eq!(parsed, original);
    }
}
