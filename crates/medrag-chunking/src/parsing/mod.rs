//! Text analysis: normalization, section detection and sentence splitting

pub mod normalize;
pub mod sections;
pub mod sentences;

pub use normalize::normalize_whitespace;
pub use sections::{Section, UNSTRUCTURED, canonical_section, detect_sections};
pub use sentences::split_sentences;
