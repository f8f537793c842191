//! Document chunking service

use super::packer::{Piece, SentencePacker, TokenBudget, join_pieces};
use super::registry::TokenCounterRegistry;
use super::traits::{TokenCounter, TokenCounterRef};
use super::whitespace_counter::WhitespaceCounter;
use crate::chunk::{Chunk, ChunkKind, chunk_uuid, meta_keys};
use crate::document::Document;
use crate::error::ChunkingResult;
use crate::parsing::{Section, UNSTRUCTURED, detect_sections, normalize_whitespace, split_sentences};
use medrag_config::{ApplicationConfig, ChunkingConfig, Validate};
use serde_json::{Map, Value};
use std::sync::Arc;

/// A section ready for packing, possibly absorbing small neighbours
#[derive(Debug, Clone, PartialEq, Eq)]
struct PackedSection {
    name: &'static str,
    content: String,
    merged: Vec<&'static str>,
}

impl PackedSection {
    fn absorb(&mut self, other: Self) {
        self.content.push_str("\n\n");
        self.content.push_str(&other.content);
        self.merged.push(other.name);
        self.merged.extend(other.merged);
    }

    fn absorb_front(&mut self, carried: Self) {
        self.content = format!("{}\n\n{}", carried.content, self.content);
        let mut merged = carried.merged;
        merged.push(carried.name);
        merged.append(&mut self.merged);
        self.merged = merged;
    }
}

impl From<Section> for PackedSection {
    fn from(section: Section) -> Self {
        Self {
            name: section.name,
            content: section.content,
            merged: Vec::new(),
        }
    }
}

/// Chunk body before ids and metadata are attached
struct DraftChunk {
    kind: ChunkKind,
    section: &'static str,
    text: String,
    n_sentences: usize,
    merged: Vec<&'static str>,
}

/// Render the final chunk text
fn render(title: Option<&str>, section: Option<&str>, body: &str) -> String {
    let mut text = String::new();
    if let Some(title) = title {
        text.push_str("[Title] ");
        text.push_str(title);
        text.push_str("\n\n");
    }
    if let Some(section) = section {
        text.push('[');
        text.push_str(section);
        text.push_str("] ");
    }
    text.push_str(body);
    text.trim_end().to_string()
}

/// Splits documents into token-bounded, section-aware chunks
///
/// Stateless between calls: one chunker can serve any number of threads.
pub struct AbstractChunker {
    config: ChunkingConfig,
    counter: TokenCounterRef,
}

impl AbstractChunker {
    /// Create a chunker counting whitespace-delimited tokens
    ///
    /// # Errors
    /// Returns `ChunkingError::Configuration` if the configuration is invalid.
    pub fn new(config: ChunkingConfig) -> ChunkingResult<Self> {
        Self::with_counter(config, Arc::new(WhitespaceCounter::new()))
    }

    /// Create a chunker with an explicit token counter
    ///
    /// # Errors
    /// Returns `ChunkingError::Configuration` if the configuration is invalid.
    pub fn with_counter(config: ChunkingConfig, counter: TokenCounterRef) -> ChunkingResult<Self> {
        config.validate()?;
        Ok(Self { config, counter })
    }

    /// Create a chunker from the full application configuration
    ///
    /// The tokenizer is resolved through [`TokenCounterRegistry`]; an
    /// unavailable tokenizer degrades to whitespace counting.
    ///
    /// # Errors
    /// Returns `ChunkingError::Configuration` if the configuration is invalid.
    pub fn from_application_config(config: &ApplicationConfig) -> ChunkingResult<Self> {
        let counter = TokenCounterRegistry::from_config(&config.tokenizer);
        Self::with_counter(config.chunking.clone(), counter)
    }

    pub const fn config(&self) -> &ChunkingConfig {
        &self.config
    }

    /// Identifier of the active token counter
    pub fn tokenizer_identifier(&self) -> &str {
        self.counter.identifier()
    }

    pub fn count_tokens(&self, text: &str) -> usize {
        self.counter.count(text)
    }

    /// Chunk one document
    ///
    /// Deterministic for a given document, configuration and counter. Empty
    /// text yields no chunks, or a single title chunk when a title exists.
    pub fn chunk_document(&self, document: &Document) -> Vec<Chunk> {
        let text = normalize_whitespace(document.text());

        let drafts: Vec<DraftChunk> = if text.is_empty() {
            self.fit_title(document.title(), None, 0)
                .as_deref()
                .map(|title| DraftChunk {
                    kind: ChunkKind::Window,
                    section: UNSTRUCTURED,
                    text: render(Some(title), None, ""),
                    n_sentences: 0,
                    merged: Vec::new(),
                })
                .into_iter()
                .collect()
        } else {
            self.draft_chunks(&text, document.title())
        };

        let chunks: Vec<Chunk> = drafts
            .into_iter()
            .enumerate()
            .map(|(idx, draft)| self.build_chunk(document, idx, draft))
            .collect();

        tracing::debug!("Chunked {} into {} chunks", document.uid(), chunks.len());
        chunks
    }

    /// Chunk many documents, concatenating their chunks in input order
    pub fn chunk_batch<'d, I>(&self, documents: I) -> Vec<Chunk>
    where
        I: IntoIterator<Item = &'d Document>,
    {
        documents
            .into_iter()
            .flat_map(|document| self.chunk_document(document))
            .collect()
    }

    fn draft_chunks(&self, text: &str, title: Option<&str>) -> Vec<DraftChunk> {
        let sections = detect_sections(text);
        let unstructured = matches!(sections.as_slice(), [only] if only.is_unstructured());

        if unstructured {
            let title = self.fit_title(title, None, 1);
            let whole = render(title.as_deref(), None, text);
            if self.counter.count(&whole) <= self.config.max_tokens {
                return vec![DraftChunk {
                    kind: ChunkKind::Window,
                    section: UNSTRUCTURED,
                    text: whole,
                    n_sentences: split_sentences(text).len(),
                    merged: Vec::new(),
                }];
            }

            let mut drafts = Vec::new();
            let section = PackedSection {
                name: UNSTRUCTURED,
                content: text.to_string(),
                merged: Vec::new(),
            };
            self.pack_section(&section, ChunkKind::Window, title.as_deref(), &mut drafts);
            return drafts;
        }

        let sections: Vec<PackedSection> = if self.config.merge_small_sections {
            self.merge_small_sections(sections)
        } else {
            sections.into_iter().map(PackedSection::from).collect()
        };

        let first_tag = sections.first().and_then(|section| self.section_tag(section.name));
        let title = self.fit_title(title, first_tag, 1);

        let mut drafts = Vec::new();
        for section in &sections {
            self.pack_section(section, ChunkKind::Section, title.as_deref(), &mut drafts);
        }
        drafts
    }

    /// Pack one section into drafts, appending to `drafts`
    ///
    /// The title line goes on the first chunk of the document only; the
    /// section tag on every chunk of a named section.
    fn pack_section(
        &self,
        section: &PackedSection,
        kind: ChunkKind,
        title: Option<&str>,
        drafts: &mut Vec<DraftChunk>,
    ) {
        let max_tokens = self.config.max_tokens;
        let doc_first = drafts.is_empty();
        let tag = self.section_tag(section.name);
        let title_for = |first: bool| if doc_first && first { title } else { None };

        let sentences = split_sentences(&section.content);
        let pieces: Vec<Piece> = SentencePacker::split_oversized(&sentences, |sentence| {
            self.counter.count(&render(title_for(true), tag, sentence)) <= max_tokens
        });
        let texts: Vec<&str> = pieces.iter().map(|piece| piece.text.as_str()).collect();
        let body = |window: std::ops::Range<usize>| pieces.get(window).map_or_else(String::new, join_pieces);

        let packer = SentencePacker::new(self.counter.as_ref(), TokenBudget::from_config(&self.config));
        let windows = packer.pack(&texts, |first, window| {
            self.counter.count(&render(title_for(first), tag, &body(window)))
        });

        for (ordinal, window) in windows.into_iter().enumerate() {
            let n_sentences = window.len();
            let body_text = body(window);
            let mut text = render(title_for(ordinal == 0), tag, &body_text);
            // Only a lone character can still overflow; it drops the framing
            if self.counter.count(&text) > max_tokens {
                tracing::trace!("Dropping title and tag from an overflowing {} chunk", section.name);
                text = render(None, None, &body_text);
            }
            drafts.push(DraftChunk {
                kind,
                section: section.name,
                text,
                n_sentences,
                merged: section.merged.clone(),
            });
        }
    }

    /// Tag rendered for a section, if it leaves room for body text
    fn section_tag(&self, name: &'static str) -> Option<&'static str> {
        if name == UNSTRUCTURED {
            return None;
        }
        let overhead = self.counter.count(&render(None, Some(name), ""));
        if overhead < self.config.max_tokens {
            Some(name)
        } else {
            tracing::trace!("Section tag {name} does not fit the token ceiling");
            None
        }
    }

    /// Fold sections below `min_tokens` into a neighbour
    ///
    /// A small section is appended to the one before it; a small leading
    /// section is carried forward into the one after it.
    fn merge_small_sections(&self, sections: Vec<Section>) -> Vec<PackedSection> {
        let mut merged: Vec<PackedSection> = Vec::with_capacity(sections.len());
        let mut carried: Option<PackedSection> = None;

        for section in sections {
            let mut current = PackedSection::from(section);
            if let Some(small) = carried.take() {
                current.absorb_front(small);
            }

            let small = self.counter.count(&current.content) < self.config.min_tokens;
            match merged.last_mut() {
                Some(previous) if small => {
                    tracing::trace!("Merging small {} section into {}", current.name, previous.name);
                    previous.absorb(current);
                }
                None if small => carried = Some(current),
                _ => merged.push(current),
            }
        }

        if let Some(small) = carried {
            merged.push(small);
        }
        merged
    }

    /// Title text for the first chunk
    ///
    /// Cut to half the ceiling, and further until the rendered title line
    /// and `tag` leave `reserve` tokens for the body. Dropped when no word
    /// fits.
    fn fit_title(&self, title: Option<&str>, tag: Option<&str>, reserve: usize) -> Option<String> {
        let title = title.map(str::trim).filter(|t| !t.is_empty())?;
        let max_tokens = self.config.max_tokens;
        let fits = |candidate: &str| {
            self.counter.count(candidate) <= max_tokens / 2
                && self
                    .counter
                    .count(&render(Some(candidate), tag, ""))
                    .saturating_add(reserve)
                    <= max_tokens
        };
        if fits(title) {
            return Some(title.to_string());
        }

        let mut fitted = String::new();
        for word in title.split_whitespace() {
            let candidate = if fitted.is_empty() {
                word.to_string()
            } else {
                format!("{fitted} {word}")
            };
            if !fits(&candidate) {
                break;
            }
            fitted = candidate;
        }
        tracing::trace!("Title shortened to fit the token ceiling");
        (!fitted.is_empty()).then_some(fitted)
    }

    fn build_chunk(&self, document: &Document, idx: usize, draft: DraftChunk) -> Chunk {
        let chunk_id = draft.kind.chunk_id(idx);
        let tokens = self.counter.count(&draft.text);

        let mut meta = Map::new();
        meta.insert(
            meta_keys::CHUNKER_VERSION.to_string(),
            Value::from(self.config.chunker_version.clone()),
        );
        meta.insert(
            meta_keys::TOKENIZER.to_string(),
            Value::from(self.counter.identifier()),
        );
        meta.insert(meta_keys::N_SENTENCES.to_string(), Value::from(draft.n_sentences));
        meta.insert(
            meta_keys::SECTION_BOOST.to_string(),
            Value::from(self.config.section_boost(draft.section)),
        );
        let mut src = Map::new();
        src.insert(
            document.source().to_string(),
            Value::Object(document.detail().clone()),
        );
        meta.insert(meta_keys::SRC.to_string(), Value::Object(src));
        if !document.identifiers().is_empty() {
            let identifiers: Map<String, Value> = document
                .identifiers()
                .iter()
                .map(|(kind, value)| (kind.clone(), Value::from(value.as_str())))
                .collect();
            meta.insert(meta_keys::IDENTIFIERS.to_string(), Value::Object(identifiers));
        }
        if !draft.merged.is_empty() {
            meta.insert(
                meta_keys::MERGED_SECTIONS.to_string(),
                Value::from(draft.merged.clone()),
            );
        }

        Chunk {
            uuid: chunk_uuid(document.uid(), &chunk_id),
            chunk_id,
            parent_uid: document.uid().to_string(),
            source: document.source().to_string(),
            chunk_idx: idx,
            text: draft.text,
            title: document.title().map(ToString::to_string),
            published_at: document.published_at(),
            section: Some(draft.section.to_string()),
            tokens: Some(tokens),
            n_sentences: Some(draft.n_sentences),
            meta,
        }
    }
}

impl Default for AbstractChunker {
    fn default() -> Self {
        Self {
            config: ChunkingConfig::default(),
            counter: Arc::new(WhitespaceCounter::new()),
        }
    }
}
