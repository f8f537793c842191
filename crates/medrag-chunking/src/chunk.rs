//! Chunk value object and deterministic chunk identifiers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::{Uuid, uuid};

/// Namespace UUID for medrag chunk UUIDs (randomly generated once)
///
/// Changing this value re-keys every chunk in every downstream index.
pub const CHUNK_NAMESPACE: Uuid = uuid!("6f3b2c1e-8d4a-5b9f-a2c7-41e0d93b7a58");

/// Keys written into [`Chunk::meta`]
pub mod meta_keys {
    pub const CHUNKER_VERSION: &str = "chunker_version";
    pub const TOKENIZER: &str = "tokenizer";
    pub const N_SENTENCES: &str = "n_sentences";
    pub const SECTION_BOOST: &str = "section_boost";
    pub const SRC: &str = "src";
    pub const IDENTIFIERS: &str = "identifiers";
    pub const MERGED_SECTIONS: &str = "merged_sections";
}

/// Generate the deterministic UUID of a chunk
///
/// UUID v5 over `"<parent_uid>:<chunk_id>"`: re-chunking the same document
/// with the same configuration reproduces the same keys, so re-indexing
/// overwrites instead of duplicating.
pub fn chunk_uuid(parent_uid: &str, chunk_id: &str) -> Uuid {
    let data = format!("{parent_uid}:{chunk_id}");
    Uuid::new_v5(&CHUNK_NAMESPACE, data.as_bytes())
}

/// How a chunk was derived, which fixes its id prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkKind {
    /// Packed from a detected abstract section (`s<n>`)
    Section,
    /// Whole-document or sliding-window fallback (`w<n>`)
    Window,
}

impl ChunkKind {
    pub const fn prefix(self) -> char {
        match self {
            Self::Section => 's',
            Self::Window => 'w',
        }
    }

    /// Human-readable id scoped to the parent document, e.g. `s0`, `w3`
    pub fn chunk_id(self, index: usize) -> String {
        format!("{}{index}", self.prefix())
    }
}

/// Whether `id` has the `^[sw]\d+$` shape produced by the chunker
pub fn is_chunker_id(id: &str) -> bool {
    let mut chars = id.chars();
    matches!(chars.next(), Some('s' | 'w'))
        && !chars.as_str().is_empty()
        && chars.all(|c| c.is_ascii_digit())
}

/// A bounded, token-budgeted slice of a document ready for embedding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Stable id within the parent document (`s0`, `w1`, ...)
    pub chunk_id: String,
    /// UUID v5 of `"<parent_uid>:<chunk_id>"`
    pub uuid: Uuid,
    /// Owning document uid
    pub parent_uid: String,
    /// Source copied from the parent document
    pub source: String,
    /// 0-based position among the document's chunks
    pub chunk_idx: usize,
    /// Final chunk text including title line / section tag
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    /// Token count of `text` per the active counter
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n_sentences: Option<usize>,
    #[serde(default)]
    pub meta: Map<String, Value>,
}

impl Chunk {
    /// Whether `uuid` matches the id derived from `parent_uid` and `chunk_id`
    pub fn has_consistent_uuid(&self) -> bool {
        self.uuid == chunk_uuid(&self.parent_uid, &self.chunk_id)
    }

    /// Source-specific metadata threaded from the parent document
    pub fn source_detail(&self) -> Option<&Map<String, Value>> {
        self.meta
            .get(meta_keys::SRC)
            .and_then(|src| src.get(&self.source))
            .and_then(Value::as_object)
    }
}

impl std::fmt::Display for Chunk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Chunk {{ {}#{} idx: {}, section: {}, tokens: {} }}",
            self.parent_uid,
            self.chunk_id,
            self.chunk_idx,
            self.section.as_deref().unwrap_or("-"),
            self.tokens.map_or_else(|| "?".to_string(), |t| t.to_string())
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_uuid_deterministic() {
        let id1 = chunk_uuid("pubmed:12345", "s0");
        let id2 = chunk_uuid("pubmed:12345", "s0");

        assert_eq!(id1, id2, "Same inputs should produce same chunk UUID");
        assert_eq!(id1.get_version(), Some(uuid::Version::Sha1));
    }

    #[test]
    fn test_chunk_uuid_unique() {
        let base = chunk_uuid("pubmed:12345", "s0");

        assert_ne!(base, chunk_uuid("pubmed:12345", "s1"));
        assert_ne!(base, chunk_uuid("pubmed:12345", "w0"));
        assert_ne!(base, chunk_uuid("pubmed:12346", "s0"));
        assert_ne!(base, chunk_uuid("ctgov:12345", "s0"));
    }

    #[test]
    fn test_chunk_uuid_matches_manual_v5() {
        let expected = Uuid::new_v5(&CHUNK_NAMESPACE, b"pubmed:1:w0");
        assert_eq!(chunk_uuid("pubmed:1", "w0"), expected);
    }

    #[test]
    fn test_chunk_kind_ids() {
        assert_eq!(ChunkKind::Section.chunk_id(0), "s0");
        assert_eq!(ChunkKind::Window.chunk_id(12), "w12");
    }

    #[test]
    fn test_is_chunker_id() {
        for id in ["s0", "w1", "s123"] {
            assert!(is_chunker_id(id), "{id} should match");
        }
        for id in ["", "s", "x0", "title", "s1a", "S0", "w-1"] {
            assert!(!is_chunker_id(id), "{id} should not match");
        }
    }
}
