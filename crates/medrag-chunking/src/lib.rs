//! Medrag document chunking crate
//!
//! Turns biomedical abstracts and other source documents into token-bounded,
//! section-aware chunks with deterministic identifiers, ready for embedding.

pub mod chunk;
pub mod chunking;
pub mod document;
pub mod error;
pub mod legacy;
pub mod parsing;

// Re-export main types
pub use chunk::{CHUNK_NAMESPACE, Chunk, ChunkKind, chunk_uuid};
pub use chunking::{
    AbstractChunker, HfTokenCounter, TiktokenCounter, TokenBudget, TokenCounter, TokenCounterRef,
    TokenCounterRegistry, WhitespaceCounter,
};
pub use document::{Document, DocumentRecord};
pub use error::{ChunkingError, ChunkingResult};
pub use legacy::{
    AbstractMetadata, DocumentChunk, chunk_abstract, chunk_abstract_with, chunk_to_document_chunk,
    document_chunk_to_chunk,
};
pub use parsing::{Section, detect_sections, split_sentences};
