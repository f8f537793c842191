//! `medrag abstract`: one PubMed abstract to legacy records

use super::write_json_lines;
use medrag_chunking::{AbstractChunker, AbstractMetadata, DocumentChunk, chunk_abstract_with};
use medrag_config::ApplicationConfig;

#[derive(clap::Args, Debug)]
pub struct AbstractArgs {
    /// PubMed identifier
    #[arg(long)]
    pub pmid: String,

    /// Article title
    #[arg(long, default_value = "")]
    pub title: String,

    /// Abstract text
    #[arg(long, default_value = "")]
    pub text: String,

    /// Upstream quality score copied into every record
    #[arg(long, default_value_t = 0.0)]
    pub quality_total: f64,

    /// Publication year
    #[arg(long)]
    pub year: Option<i32>,

    /// Link back to the article
    #[arg(long, default_value = "")]
    pub source_url: String,
}

impl AbstractArgs {
    fn metadata(&self) -> AbstractMetadata {
        AbstractMetadata {
            quality_total: self.quality_total,
            year: self.year,
            source_url: self.source_url.clone(),
        }
    }
}

/// Chunk the abstract described by `args`
///
/// # Errors
/// Returns an error for an invalid configuration or an empty PMID.
pub fn abstract_records(config: &ApplicationConfig, args: &AbstractArgs) -> anyhow::Result<Vec<DocumentChunk>> {
    let chunker = AbstractChunker::from_application_config(config)?;
    Ok(chunk_abstract_with(
        &chunker,
        &args.pmid,
        &args.title,
        &args.text,
        &args.metadata(),
    )?)
}

/// Run the subcommand, writing records to stdout
///
/// # Errors
/// Returns an error if chunking fails or stdout cannot be written.
pub fn run(config: &ApplicationConfig, args: &AbstractArgs) -> anyhow::Result<usize> {
    let records = abstract_records(config, args)?;
    let stdout = std::io::stdout();
    let mut out = std::io::BufWriter::new(stdout.lock());
    write_json_lines(&mut out, &records)?;
    tracing::debug!("Wrote {} records for pubmed:{}", records.len(), args.pmid);
    Ok(records.len())
}
