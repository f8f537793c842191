//! Document input: JSON lines or a single JSON array

use anyhow::Context;
use medrag_chunking::Document;
use std::io::Read;
use std::path::Path;

/// One input document, or the reason it was rejected
#[derive(Debug)]
pub struct InputRecord {
    /// 1-based line number, or 0-based array index
    pub position: usize,
    pub document: Result<Document, String>,
}

/// Read the whole input from a file, or stdin for `None` / `-`
///
/// # Errors
/// Returns an error if the input cannot be read.
pub fn read_input(path: Option<&Path>) -> anyhow::Result<String> {
    let mut buffer = String::new();
    match path {
        Some(path) if path != Path::new("-") => {
            buffer = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read input file '{}'", path.display()))?;
        }
        _ => {
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read documents from stdin")?;
        }
    }
    Ok(buffer)
}

/// Parse documents from JSON lines, or from one JSON array
///
/// A record that is not a valid document is returned as an error entry so
/// the caller can skip it; only a malformed array fails the whole input.
///
/// # Errors
/// Returns an error if the input looks like a JSON array but is not one.
pub fn parse_documents(input: &str) -> anyhow::Result<Vec<InputRecord>> {
    if input.trim_start().starts_with('[') {
        let values: Vec<serde_json::Value> =
            serde_json::from_str(input).context("Input is not a valid JSON array")?;
        return Ok(values
            .into_iter()
            .enumerate()
            .map(|(position, value)| InputRecord {
                position,
                document: serde_json::from_value(value).map_err(|e| e.to_string()),
            })
            .collect());
    }

    Ok(input
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| InputRecord {
            position: index + 1,
            document: serde_json::from_str(line).map_err(|e| e.to_string()),
        })
        .collect())
}
