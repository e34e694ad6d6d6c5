//! Output formatting and persistence for benchmark rates.
//!
//! Supports pretty-printing, JSON serialization, and CSV output. Files are
//! serialized fully in memory and written in one call, so a failed run
//! never leaves a partial table behind.

use csv::WriterBuilder;
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::Path;
use tracing::debug;

use crate::error::Result;
use crate::stats::RunStats;
use crate::types::{AreaRates, OutputRecord};

/// Logs output records using Rust's debug pretty-print format.
pub fn print_pretty(records: &[OutputRecord]) {
    debug!("{:#?}", records);
}

/// Renders output records as a pretty-printed JSON array. Ambiguous
/// zipcodes carry `"rate": null`.
pub fn to_json(records: &[OutputRecord]) -> Result<String> {
    Ok(serde_json::to_string_pretty(records)?)
}

/// Writes the `zipcode,rate` table. A missing rate is an empty field.
pub fn write_output<W: Write>(writer: W, records: &[OutputRecord]) -> Result<()> {
    write_rows(writer, &["zipcode", "rate"], records)
}

/// Writes the `rate_area,rate` table of aggregated area rates.
pub fn write_area_rates<W: Write>(writer: W, rates: &AreaRates) -> Result<()> {
    write_rows(writer, &["rate_area", "rate"], &rates.iter().collect::<Vec<_>>())
}

/// Writes the output table to `path`, replacing any existing file.
pub fn write_output_file(path: impl AsRef<Path>, records: &[OutputRecord]) -> Result<()> {
    let mut buf = Vec::new();
    write_output(&mut buf, records)?;
    write_file(path.as_ref(), &buf)
}

/// Writes run statistics to `path` as pretty-printed JSON.
pub fn write_stats_file(path: impl AsRef<Path>, stats: &RunStats) -> Result<()> {
    let body = serde_json::to_vec_pretty(stats)?;
    write_file(path.as_ref(), &body)
}

/// Header is written explicitly so an empty table still names its columns.
fn write_rows<W: Write, T: Serialize>(writer: W, headers: &[&str], rows: &[T]) -> Result<()> {
    let mut wtr = WriterBuilder::new().has_headers(false).from_writer(writer);

    wtr.write_record(headers)?;
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;

    Ok(())
}

fn write_file(path: &Path, body: &[u8]) -> Result<()> {
    debug!(path = %path.display(), bytes = body.len(), "Writing file");
    fs::write(path, body)?;
    Ok(())
}
