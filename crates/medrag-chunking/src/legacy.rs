//! Flat `DocumentChunk` records for callers of the older PubMed-only API
//!
//! Both entry points delegate to [`AbstractChunker::chunk_document`]; only the
//! record shape and the empty-abstract placeholder differ.

use crate::chunk::{Chunk, chunk_uuid, meta_keys};
use crate::chunking::AbstractChunker;
use crate::document::Document;
use crate::error::ChunkingResult;
use crate::parsing::UNSTRUCTURED;
use chrono::{DateTime, Datelike, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Chunk id of the placeholder emitted for an empty abstract
pub const PLACEHOLDER_CHUNK_ID: &str = "title";
/// Body of the placeholder emitted for an empty abstract
pub const PLACEHOLDER_TEXT: &str = "No content available";
/// Section of the placeholder when the abstract has no title either
pub const PLACEHOLDER_SECTION: &str = "Title Only";

const PMID: &str = "pmid";
const QUALITY_TOTAL: &str = "quality_total";
const YEAR: &str = "year";
const SOURCE_URL: &str = "source_url";

/// Keys with a dedicated `DocumentChunk` field or owned by the chunker
const RESERVED_META_KEYS: &[&str] = &[
    PMID,
    QUALITY_TOTAL,
    YEAR,
    SOURCE_URL,
    meta_keys::CHUNKER_VERSION,
    meta_keys::TOKENIZER,
    meta_keys::N_SENTENCES,
    meta_keys::SECTION_BOOST,
    meta_keys::SRC,
    meta_keys::IDENTIFIERS,
    meta_keys::MERGED_SECTIONS,
];

/// PubMed-specific metadata accepted by [`chunk_abstract`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AbstractMetadata {
    pub quality_total: f64,
    pub year: Option<i32>,
    pub source_url: String,
}

/// Flat chunk record of the legacy API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentChunk {
    pub pmid: String,
    pub chunk_id: String,
    pub title: String,
    pub section: String,
    pub text: String,
    pub tokens: usize,
    #[serde(default)]
    pub quality_total: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(default)]
    pub source_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n_sentences: Option<usize>,
    /// Site-specific fields carried through `Chunk::meta`
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
}

/// Chunk a PubMed abstract with the default chunker
///
/// # Errors
/// Returns an error if `pmid` is empty.
pub fn chunk_abstract(
    pmid: &str,
    title: &str,
    abstract_text: &str,
    metadata: &AbstractMetadata,
) -> ChunkingResult<Vec<DocumentChunk>> {
    chunk_abstract_with(&AbstractChunker::default(), pmid, title, abstract_text, metadata)
}

/// Chunk a PubMed abstract with a configured chunker
///
/// An empty abstract yields exactly one placeholder record whose chunk id is
/// [`PLACEHOLDER_CHUNK_ID`].
///
/// # Errors
/// Returns an error if `pmid` is empty.
pub fn chunk_abstract_with(
    chunker: &AbstractChunker,
    pmid: &str,
    title: &str,
    abstract_text: &str,
    metadata: &AbstractMetadata,
) -> ChunkingResult<Vec<DocumentChunk>> {
    let mut document = Document::new("pubmed", pmid, abstract_text)?
        .with_detail_field(QUALITY_TOTAL, metadata.quality_total)
        .with_detail_field(SOURCE_URL, metadata.source_url.as_str());
    if !title.trim().is_empty() {
        document = document.with_title(title);
    }
    if let Some(year) = metadata.year {
        document = document.with_detail_field(YEAR, year);
        if let Some(published_at) = start_of_year(year) {
            document = document.with_published_at(published_at);
        }
    }

    let chunks = if abstract_text.trim().is_empty() {
        Vec::new()
    } else {
        chunker.chunk_document(&document)
    };

    if chunks.is_empty() {
        tracing::debug!("No content for pubmed:{pmid}, emitting placeholder chunk");
        return Ok(vec![placeholder(chunker, pmid, title, metadata)]);
    }

    Ok(chunks.iter().map(chunk_to_document_chunk).collect())
}

fn placeholder(
    chunker: &AbstractChunker,
    pmid: &str,
    title: &str,
    metadata: &AbstractMetadata,
) -> DocumentChunk {
    let section = if title.trim().is_empty() {
        PLACEHOLDER_SECTION
    } else {
        title
    };
    DocumentChunk {
        pmid: pmid.to_string(),
        chunk_id: PLACEHOLDER_CHUNK_ID.to_string(),
        title: title.to_string(),
        section: section.to_string(),
        text: PLACEHOLDER_TEXT.to_string(),
        tokens: chunker.count_tokens(PLACEHOLDER_TEXT),
        quality_total: metadata.quality_total,
        year: metadata.year,
        source_url: metadata.source_url.clone(),
        n_sentences: Some(1),
        extra: Map::new(),
    }
}

fn start_of_year(year: i32) -> Option<DateTime<Utc>> {
    Utc.with_ymd_and_hms(year, 1, 1, 0, 0, 0).single()
}

/// Legacy field from chunk meta, falling back to the source detail
fn legacy_field<'c>(chunk: &'c Chunk, key: &str) -> Option<&'c Value> {
    chunk
        .meta
        .get(key)
        .or_else(|| chunk.source_detail().and_then(|detail| detail.get(key)))
}

/// Convert a legacy record into a chunk owned by `parent_uid`
///
/// Fields without a `Chunk` counterpart are kept in `meta`.
pub fn document_chunk_to_chunk(doc_chunk: &DocumentChunk, parent_uid: &str, chunk_idx: usize) -> Chunk {
    let source = parent_uid
        .split_once(':')
        .map_or("pubmed", |(source, _)| source);

    let mut meta = Map::new();
    meta.insert(PMID.to_string(), Value::from(doc_chunk.pmid.as_str()));
    meta.insert(QUALITY_TOTAL.to_string(), Value::from(doc_chunk.quality_total));
    if let Some(year) = doc_chunk.year {
        meta.insert(YEAR.to_string(), Value::from(year));
    }
    if !doc_chunk.source_url.is_empty() {
        meta.insert(SOURCE_URL.to_string(), Value::from(doc_chunk.source_url.as_str()));
    }
    if let Some(n_sentences) = doc_chunk.n_sentences {
        meta.insert(meta_keys::N_SENTENCES.to_string(), Value::from(n_sentences));
    }
    for (key, value) in &doc_chunk.extra {
        meta.entry(key.clone()).or_insert_with(|| value.clone());
    }

    Chunk {
        chunk_id: doc_chunk.chunk_id.clone(),
        uuid: chunk_uuid(parent_uid, &doc_chunk.chunk_id),
        parent_uid: parent_uid.to_string(),
        source: source.to_string(),
        chunk_idx,
        text: doc_chunk.text.clone(),
        title: (!doc_chunk.title.is_empty()).then(|| doc_chunk.title.clone()),
        published_at: doc_chunk.year.and_then(start_of_year),
        section: Some(doc_chunk.section.clone()),
        tokens: Some(doc_chunk.tokens),
        n_sentences: doc_chunk.n_sentences,
        meta,
    }
}

/// Convert a chunk into the legacy record shape
pub fn chunk_to_document_chunk(chunk: &Chunk) -> DocumentChunk {
    let pmid = legacy_field(chunk, PMID)
        .and_then(Value::as_str)
        .map(ToString::to_string)
        .or_else(|| {
            chunk
                .parent_uid
                .split_once(':')
                .map(|(_, source_id)| source_id.to_string())
        })
        .unwrap_or_default();

    let year = legacy_field(chunk, YEAR)
        .and_then(Value::as_i64)
        .and_then(|year| i32::try_from(year).ok())
        .or_else(|| chunk.published_at.map(|date| date.year()));

    let n_sentences = chunk.n_sentences.or_else(|| {
        chunk
            .meta
            .get(meta_keys::N_SENTENCES)
            .and_then(Value::as_u64)
            .and_then(|n| usize::try_from(n).ok())
    });

    // Source detail first, so top-level meta wins on a clash
    let extra = chunk
        .source_detail()
        .into_iter()
        .flatten()
        .chain(&chunk.meta)
        .filter(|(key, _)| !RESERVED_META_KEYS.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    DocumentChunk {
        pmid,
        chunk_id: chunk.chunk_id.clone(),
        title: chunk.title.clone().unwrap_or_default(),
        section: chunk
            .section
            .clone()
            .unwrap_or_else(|| UNSTRUCTURED.to_string()),
        text: chunk.text.clone(),
        tokens: chunk.tokens.unwrap_or_default(),
        quality_total: legacy_field(chunk, QUALITY_TOTAL)
            .and_then(Value::as_f64)
            .unwrap_or_default(),
        year,
        source_url: legacy_field(chunk, SOURCE_URL)
            .and_then(Value::as_str)
            .map(ToString::to_string)
            .unwrap_or_default(),
        n_sentences,
        extra,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_abstract_yields_placeholder() {
        let chunks = chunk_abstract("12345", "Title Only", "", &AbstractMetadata::default())
            .expect("Valid pmid");

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].chunk_id, PLACEHOLDER_CHUNK_ID);
        assert_eq!(chunks[0].section, "Title Only");
        assert!(chunks[0].text.contains("No content available"));
    }

    #[test]
    fn test_placeholder_without_title() {
        let chunks = chunk_abstract("7", "", "   ", &AbstractMetadata::default()).expect("Valid pmid");
        assert_eq!(chunks[0].section, PLACEHOLDER_SECTION);
        assert_eq!(chunks[0].title, "");
    }

    #[test]
    fn test_metadata_reaches_records() {
        let metadata = AbstractMetadata {
            quality_total: 4.5,
            year: Some(2021),
            source_url: "https://pubmed.ncbi.nlm.nih.gov/42/".to_string(),
        };
        let chunks = chunk_abstract(
            "42",
            "Statins in the elderly",
            "Results: LDL fell by 30%. Conclusions: Statins are effective.",
            &metadata,
        )
        .expect("Valid pmid");

        assert_eq!(chunks.len(), 2);
        for chunk in &chunks {
            assert_eq!(chunk.pmid, "42");
            assert_eq!(chunk.quality_total, 4.5);
            assert_eq!(chunk.year, Some(2021));
            assert_eq!(chunk.source_url, metadata.source_url);
            assert!(chunk.extra.is_empty());
        }
        assert_eq!(chunks[0].section, "Results");
        assert!(chunks[0].text.starts_with("[Title] Statins in the elderly"));
        assert_eq!(chunks[1].chunk_id, "s1");
    }

    #[test]
    fn test_rejects_empty_pmid() {
        assert!(chunk_abstract("", "T", "Body.", &AbstractMetadata::default()).is_err());
    }

    #[test]
    fn test_converters_preserve_optional_fields() {
        let mut extra = Map::new();
        extra.insert("journal".to_string(), json!("BMJ"));
        let original = DocumentChunk {
            pmid: "99".to_string(),
            chunk_id: "s0".to_string(),
            title: "A title".to_string(),
            section: "Methods".to_string(),
            text: "[Methods] Cohort study.".to_string(),
            tokens: 3,
            quality_total: 2.0,
            year: Some(2019),
            source_url: "https://example.org/99".to_string(),
            n_sentences: Some(1),
            extra,
        };

        let chunk = document_chunk_to_chunk(&original, "pubmed:99", 0);
        assert!(chunk.has_consistent_uuid());
        assert_eq!(chunk.source, "pubmed");
        assert_eq!(chunk.meta["journal"], "BMJ");
        assert_eq!(chunk.published_at.map(|d| d.year()), Some(2019));

        assert_eq!(chunk_to_document_chunk(&chunk), original);
    }

    #[test]
    fn test_chunk_without_legacy_meta() {
        let document = Document::new("ctgov", "NCT9", "Short trial summary.").expect("Valid document");
        let chunk = AbstractChunker::default()
            .chunk_document(&document)
            .remove(0);

        let record = chunk_to_document_chunk(&chunk);
        assert_eq!(record.pmid, "NCT9");
        assert_eq!(record.section, UNSTRUCTURED);
        assert_eq!(record.quality_total, 0.0);
        assert_eq!(record.year, None);
        assert!(record.extra.is_empty());
    }

    #[test]
    fn test_source_detail_survives_conversion() {
        let document = Document::new("pubmed", "314", "Aspirin lowered risk.")
            .expect("Valid document")
            .with_detail_field("journal", "NEJM")
            .with_detail_field("mesh_terms", json!(["Humans"]));
        let chunk = AbstractChunker::default()
            .chunk_document(&document)
            .remove(0);

        let record = chunk_to_document_chunk(&chunk);
        assert_eq!(record.extra["journal"], "NEJM");
        assert_eq!(record.extra["mesh_terms"], json!(["Humans"]));

        let restored = document_chunk_to_chunk(&record, "pubmed:314", 0);
        assert_eq!(restored.meta["journal"], "NEJM");
        assert_eq!(chunk_to_document_chunk(&restored).extra, record.extra);
    }
}
