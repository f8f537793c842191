//! Main entry point for the medrag chunking CLI

// Internal modules
mod config;
mod handlers;
mod input;

// Internal imports (std, crate)
use crate::config::CliOverrides;
use crate::handlers::chunk::ChunkArgs;
use crate::handlers::legacy::AbstractArgs;
use std::path::PathBuf;

// External imports (alphabetized)
use clap::{Parser, Subcommand};
use medrag_common::{init_tracing, initialize_environment};

/// medrag biomedical document chunker
///
/// Splits abstracts and other source documents into token-bounded,
/// section-aware chunks. Chunks go to stdout as JSON lines, logs to stderr.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Optional configuration file path (TOML or YAML)
    #[arg(long, short = 'c', global = true)]
    config_file: Option<PathBuf>,

    /// Also write daily-rotated log files to this directory
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    /// Log level used when RUST_LOG is unset
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Chunk documents read as JSON lines or a JSON array
    Chunk(ChunkArgs),
    /// Chunk one PubMed abstract into legacy records
    Abstract(AbstractArgs),
}

impl Args {
    fn overrides(&self) -> CliOverrides {
        let (tokenizer, tokenizer_path) = match &self.command {
            Command::Chunk(chunk) => (chunk.tokenizer.clone(), chunk.tokenizer_path.clone()),
            Command::Abstract(_) => (None, None),
        };
        CliOverrides {
            log_dir: self.log_dir.clone(),
            json_logs: self.json_logs,
            log_level: self.log_level.clone(),
            tokenizer,
            tokenizer_path,
        }
    }
}

fn main() -> anyhow::Result<()> {
    initialize_environment();

    // Parse command line arguments
    let args = Args::parse();

    // Defaults < config file < MEDRAG_* env < flags
    let config = config::load(args.config_file.as_deref(), &args.overrides())?;

    // Keep the guards alive for the whole run so buffered logs are flushed
    let _log_guards = init_tracing(&config::logging_options(&config.telemetry))?;
    tracing::debug!("Configuration loaded: {config:?}");

    match &args.command {
        Command::Chunk(chunk_args) => {
            handlers::chunk::run(&config, chunk_args)?;
        }
        Command::Abstract(abstract_args) => {
            handlers::legacy::run(&config, abstract_args)?;
        }
    }

    Ok(())
}
