//! Dump command implementation.

use freezerdb_core::Freezer;
use serde::Serialize;
use std::io::{self, Write};
use std::path::Path;

/// Receipt representation for JSON output.
#[derive(Debug, Serialize)]
pub struct ReceiptInfo {
    /// Sequence number.
    pub sequence: u64,
    /// Length in bytes.
    pub len: usize,
    /// Hex-encoded receipt bytes.
    pub data: String,
}

/// Runs the dump command.
pub fn run(
    path: &Path,
    start: u64,
    limit: Option<u64>,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let freezer = Freezer::open_read_only(path)?;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let written = dump(&freezer, start, limit, format, &mut out)?;
    out.flush()?;

    if written == 0 {
        eprintln!("No receipts at or after sequence {} (head {})", start, freezer.head());
    }
    Ok(())
}

/// Writes receipts `[start, start + limit)` to `out`, clipped to the head.
///
/// Returns the number of receipts written. A damaged receipt stops the
/// dump with its error after everything before it has been written.
pub fn dump(
    freezer: &Freezer,
    start: u64,
    limit: Option<u64>,
    format: &str,
    out: &mut dyn Write,
) -> Result<u64, Box<dyn std::error::Error>> {
    let head = freezer.head();
    let end = match limit {
        Some(limit) => start.saturating_add(limit).min(head),
        None => head,
    };

    let mut written = 0;
    for (sequence, receipt) in (start..).zip(freezer.fetch_range(start, end)) {
        let receipt = receipt?;
        match format {
            "json" => {
                let info = ReceiptInfo {
                    sequence,
                    len: receipt.len(),
                    data: hex::encode(&receipt),
                };
                writeln!(out, "{}", serde_json::to_string(&info)?)?;
            }
            _ => {
                writeln!(out, "{:>10}  {:>6}  {}", sequence, receipt.len(), hex::encode(&receipt))?;
            }
        }
        written += 1;
    }

    Ok(written)
}
