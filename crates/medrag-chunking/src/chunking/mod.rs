//! Token-aware chunking of biomedical documents

pub mod hf_counter;
pub mod numeric_safety;
pub mod packer;
pub mod registry;
pub mod service;
pub mod tiktoken_counter;
pub mod traits;
pub mod whitespace_counter;

pub use hf_counter::HfTokenCounter;
pub use numeric_safety::{expand_window, needs_expansion};
pub use packer::{SentencePacker, TokenBudget};
pub use registry::TokenCounterRegistry;
pub use service::AbstractChunker;
pub use tiktoken_counter::TiktokenCounter;
pub use traits::{TokenCounter, TokenCounterRef};
pub use whitespace_counter::{WHITESPACE_COUNTER_ID, WhitespaceCounter};
