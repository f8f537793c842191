//! `medrag chunk`: documents in, chunks out

use super::write_json_lines;
use crate::input::{InputRecord, parse_documents, read_input};
use medrag_chunking::{AbstractChunker, Chunk};
use medrag_config::ApplicationConfig;
use rayon::prelude::*;
use std::path::PathBuf;

#[derive(clap::Args, Debug)]
pub struct ChunkArgs {
    /// Documents as JSON lines or a JSON array; `-` or omitted reads stdin
    #[arg(long, short = 'i')]
    pub input: Option<PathBuf>,

    /// Tokenizer model id (e.g. `gpt-4o`, or a Hugging Face model in the cache dir)
    #[arg(long)]
    pub tokenizer: Option<String>,

    /// Explicit `tokenizer.json` for the tokenizer model
    #[arg(long, requires = "tokenizer")]
    pub tokenizer_path: Option<PathBuf>,
}

/// Outcome of a chunking run
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ChunkSummary {
    pub documents: usize,
    pub skipped: usize,
    pub chunks: usize,
}

/// Chunk records in parallel, keeping input order
///
/// Rejected records are logged and skipped.
pub fn chunk_records(chunker: &AbstractChunker, records: Vec<InputRecord>) -> (Vec<Chunk>, ChunkSummary) {
    let total = records.len();
    let per_document: Vec<Option<Vec<Chunk>>> = records
        .into_par_iter()
        .map(|record| match record.document {
            Ok(document) => Some(chunker.chunk_document(&document)),
            Err(e) => {
                tracing::warn!("Skipping invalid document at position {}: {e}", record.position);
                None
            }
        })
        .collect();

    let skipped = per_document.iter().filter(|chunks| chunks.is_none()).count();
    let chunks: Vec<Chunk> = per_document.into_iter().flatten().flatten().collect();
    let summary = ChunkSummary {
        documents: total - skipped,
        skipped,
        chunks: chunks.len(),
    };
    (chunks, summary)
}

/// Run the subcommand, writing chunks to stdout
///
/// # Errors
/// Returns an error if the input cannot be read or parsed, the chunker
/// configuration is invalid, or stdout cannot be written.
pub fn run(config: &ApplicationConfig, args: &ChunkArgs) -> anyhow::Result<ChunkSummary> {
    let chunker = AbstractChunker::from_application_config(config)?;
    tracing::info!(
        "Chunking with {} (target {}, max {}, overlap {})",
        chunker.tokenizer_identifier(),
        config.chunking.target_tokens,
        config.chunking.max_tokens,
        config.chunking.overlap_tokens
    );

    let input = read_input(args.input.as_deref())?;
    let records = parse_documents(&input)?;
    let (chunks, summary) = chunk_records(&chunker, records);

    let stdout = std::io::stdout();
    let mut out = std::io::BufWriter::new(stdout.lock());
    write_json_lines(&mut out, &chunks)?;

    tracing::info!(
        "Chunked {} documents into {} chunks ({} skipped)",
        summary.documents,
        summary.chunks,
        summary.skipped
    );
    Ok(summary)
}
