//! Subcommand handlers

pub mod chunk;
pub mod legacy;

use serde::Serialize;
use std::io::Write;

/// Write one JSON document per line
///
/// # Errors
/// Returns an error if serialization or the write fails.
pub fn write_json_lines<W, T>(writer: &mut W, items: &[T]) -> anyhow::Result<()>
where
    W: Write,
    T: Serialize,
{
    for item in items {
        serde_json::to_writer(&mut *writer, item)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}
