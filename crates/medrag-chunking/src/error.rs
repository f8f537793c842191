//! Error types for the chunking crate
//!
//! The chunker itself is total: these errors come from building its inputs
//! (documents, token counters), never from `chunk_document`.

use medrag_common::{CommonError, impl_common_conversions};
use thiserror::Error;

/// Chunking-specific error types
#[derive(Error, Debug)]
pub enum ChunkingError {
    /// Document uid is not of the form `<source>:<source_id>`
    #[error("Invalid document uid '{uid}': expected '<source>:<source_id>'")]
    InvalidUid { uid: String },

    /// Document uid disagrees with its source and source id
    #[error("Document uid '{uid}' does not match '{expected}'")]
    UidMismatch { uid: String, expected: String },

    /// Source is not a lowercase alphanumeric identifier
    #[error("Invalid document source '{0}': expected lowercase alphanumeric")]
    InvalidSource(String),

    /// Source-specific identifier is empty
    #[error("Document source_id must not be empty")]
    EmptySourceId,

    /// Token counter could not be constructed
    #[error("Token counting error: {0}")]
    TokenCountingError(String),

    /// Configuration rejected
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(String),

    /// Input could not be parsed
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Other error (fallback)
    #[error("Other error: {0}")]
    Other(String),
}

impl ChunkingError {
    /// Create a token counting error
    pub fn token_counting_error(msg: impl Into<String>) -> Self {
        Self::TokenCountingError(msg.into())
    }
}

impl CommonError for ChunkingError {
    fn io_error(msg: impl Into<String>) -> Self {
        Self::Io(msg.into())
    }

    fn config_error(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    fn parse_error(msg: impl Into<String>) -> Self {
        Self::ParseError(msg.into())
    }

    fn other_error(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }
}

impl_common_conversions!(ChunkingError, with_serde);

impl From<medrag_config::ConfigError> for ChunkingError {
    fn from(e: medrag_config::ConfigError) -> Self {
        Self::config_error(e.to_string())
    }
}

/// Result type alias for chunking operations
pub type ChunkingResult<T> = Result<T, ChunkingError>;
