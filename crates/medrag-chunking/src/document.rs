//! Source-agnostic document value object consumed by the chunker

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ChunkingError, ChunkingResult};

/// A normalized document from any source (PubMed, ClinicalTrials.gov, RAG stores)
///
/// Built once, read-only afterwards. The `uid` is always
/// `"<source>:<source_id>"`; every constructor enforces that, so the chunker
/// never sees a malformed document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "DocumentRecord", into = "DocumentRecord")]
pub struct Document {
    uid: String,
    source: String,
    source_id: String,
    title: Option<String>,
    text: String,
    published_at: Option<DateTime<Utc>>,
    authors: Option<Vec<String>>,
    identifiers: BTreeMap<String, String>,
    detail: Map<String, Value>,
    provenance: Map<String, Value>,
}

impl Document {
    /// Create a document from its source and source-specific id
    ///
    /// # Errors
    /// Returns an error if `source` is not lowercase alphanumeric or
    /// `source_id` is empty.
    pub fn new(
        source: impl Into<String>,
        source_id: impl Into<String>,
        text: impl Into<String>,
    ) -> ChunkingResult<Self> {
        let source = source.into();
        let source_id = source_id.into();
        validate_source(&source)?;
        if source_id.trim().is_empty() {
            return Err(ChunkingError::EmptySourceId);
        }

        Ok(Self {
            uid: format!("{source}:{source_id}"),
            source,
            source_id,
            title: None,
            text: text.into(),
            published_at: None,
            authors: None,
            identifiers: BTreeMap::new(),
            detail: Map::new(),
            provenance: Map::new(),
        })
    }

    /// Create a document from a `"<source>:<source_id>"` uid
    ///
    /// The source id may itself contain colons; only the first one splits.
    ///
    /// # Errors
    /// Returns `ChunkingError::InvalidUid` when either half is missing.
    pub fn from_uid(uid: &str, text: impl Into<String>) -> ChunkingResult<Self> {
        let (source, source_id) = split_uid(uid)?;
        Self::new(source, source_id, text)
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn with_published_at(mut self, published_at: DateTime<Utc>) -> Self {
        self.published_at = Some(published_at);
        self
    }

    #[must_use]
    pub fn with_authors(mut self, authors: Vec<String>) -> Self {
        self.authors = Some(authors);
        self
    }

    /// Add an external identifier (DOI, PMCID, NCT number, ...)
    #[must_use]
    pub fn with_identifier(mut self, kind: impl Into<String>, value: impl Into<String>) -> Self {
        self.identifiers.insert(kind.into(), value.into());
        self
    }

    /// Replace the source-specific detail map
    #[must_use]
    pub fn with_detail(mut self, detail: Map<String, Value>) -> Self {
        self.detail = detail;
        self
    }

    /// Set one source-specific detail field (journal, MeSH terms, quality, ...)
    #[must_use]
    pub fn with_detail_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.detail.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_provenance(mut self, provenance: Map<String, Value>) -> Self {
        self.provenance = provenance;
        self
    }

    pub fn uid(&self) -> &str {
        &self.uid
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub const fn published_at(&self) -> Option<DateTime<Utc>> {
        self.published_at
    }

    pub fn authors(&self) -> Option<&[String]> {
        self.authors.as_deref()
    }

    pub const fn identifiers(&self) -> &BTreeMap<String, String> {
        &self.identifiers
    }

    pub const fn detail(&self) -> &Map<String, Value> {
        &self.detail
    }

    pub const fn provenance(&self) -> &Map<String, Value> {
        &self.provenance
    }
}

/// Split a uid into `(source, source_id)`
fn split_uid(uid: &str) -> ChunkingResult<(&str, &str)> {
    match uid.split_once(':') {
        Some((source, source_id)) if !source.is_empty() && !source_id.is_empty() => {
            Ok((source, source_id))
        }
        _ => Err(ChunkingError::InvalidUid {
            uid: uid.to_string(),
        }),
    }
}

fn validate_source(source: &str) -> ChunkingResult<()> {
    let valid = !source.is_empty()
        && source
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit());
    if valid {
        Ok(())
    } else {
        Err(ChunkingError::InvalidSource(source.to_string()))
    }
}

/// Wire shape of a [`Document`]
///
/// Either `uid` or `source` + `source_id` must be present; when all three
/// are given they must agree.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authors: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub identifiers: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub detail: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub provenance: Map<String, Value>,
}

impl TryFrom<DocumentRecord> for Document {
    type Error = ChunkingError;

    fn try_from(record: DocumentRecord) -> ChunkingResult<Self> {
        let document = match (&record.source, &record.source_id, &record.uid) {
            (Some(source), Some(source_id), uid) => {
                let document = Self::new(source.as_str(), source_id.as_str(), record.text)?;
                if let Some(uid) = uid
                    && uid != document.uid()
                {
                    return Err(ChunkingError::UidMismatch {
                        uid: uid.clone(),
                        expected: document.uid,
                    });
                }
                document
            }
            (_, _, Some(uid)) => Self::from_uid(uid, record.text)?,
            _ => {
                return Err(ChunkingError::InvalidUid {
                    uid: String::new(),
                });
            }
        };

        Ok(Self {
            title: record.title,
            published_at: record.published_at,
            authors: record.authors,
            identifiers: record.identifiers,
            detail: record.detail,
            provenance: record.provenance,
            ..document
        })
    }
}

impl From<Document> for DocumentRecord {
    fn from(document: Document) -> Self {
        Self {
            uid: Some(document.uid),
            source: Some(document.source),
            source_id: Some(document.source_id),
            title: document.title,
            text: document.text,
            published_at: document.published_at,
            authors: document.authors,
            identifiers: document.identifiers,
            detail: document.detail,
            provenance: document.provenance,
        }
    }
}
