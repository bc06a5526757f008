//! JSON output for CLI commands
//!
//! Every command that reports something prints exactly one JSON object to
//! stdout.

use std::io::{self, Write};

use serde::Serialize;

use super::errors::CliResult;

/// Write a JSON value to stdout, followed by a newline
pub fn write_json<T: Serialize>(value: &T) -> CliResult<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_json_to(&mut out, value)
}

/// Write a pretty-printed JSON value to `writer`
pub fn write_json_to<W: Write, T: Serialize>(writer: &mut W, value: &T) -> CliResult<()> {
    serde_json::to_writer_pretty(&mut *writer, value)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}
