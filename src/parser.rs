//! CSV loaders for the plans, zips and target tables.
//!
//! Rows are read as raw strings and validated column by column so that a
//! bad value is reported with its table, line and column. Columns the
//! pipeline does not use (`plan_id`, `state`, `county_code`, `name`, the
//! target `rate`) are ignored.

use csv::{ReaderBuilder, StringRecord, Trim};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::debug;

use crate::error::{Result, SlcspError, Table};
use crate::types::{PlanRecord, TargetZip, ZipAreaRecord};

#[derive(Debug, Deserialize)]
struct RawPlan {
    metal_level: Option<String>,
    rate: Option<String>,
    rate_area: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawZip {
    zipcode: Option<String>,
    rate_area: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawTarget {
    zipcode: Option<String>,
}

/// Reads plan rows. Requires `metal_level`, `rate` and `rate_area` columns.
pub fn read_plans<R: Read>(reader: R) -> Result<Vec<PlanRecord>> {
    let table = Table::Plans;
    let rows: Vec<(u64, RawPlan)> = read_table(reader, table, &["metal_level", "rate", "rate_area"])?;

    let plans = rows
        .into_iter()
        .map(|(line, raw)| -> Result<PlanRecord> {
            Ok(PlanRecord {
                metal_level: required(&raw.metal_level, table, line, "metal_level")?.to_string(),
                rate: parse_rate(&raw.rate, table, line)?,
                rate_area: parse_rate_area(&raw.rate_area, table, line)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    debug!(rows = plans.len(), "Loaded plans table");
    Ok(plans)
}

/// Reads zipcode to rate area rows. Requires `zipcode` and `rate_area` columns.
pub fn read_zips<R: Read>(reader: R) -> Result<Vec<ZipAreaRecord>> {
    let table = Table::Zips;
    let rows: Vec<(u64, RawZip)> = read_table(reader, table, &["zipcode", "rate_area"])?;

    let zips = rows
        .into_iter()
        .map(|(line, raw)| -> Result<ZipAreaRecord> {
            Ok(ZipAreaRecord {
                zipcode: required(&raw.zipcode, table, line, "zipcode")?.to_string(),
                rate_area: parse_rate_area(&raw.rate_area, table, line)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    debug!(rows = zips.len(), "Loaded zips table");
    Ok(zips)
}

/// Reads the target zipcode list. Only `zipcode` is required; a `rate`
/// column, if present, is ignored.
pub fn read_targets<R: Read>(reader: R) -> Result<Vec<TargetZip>> {
    let table = Table::Target;
    let rows: Vec<(u64, RawTarget)> = read_table(reader, table, &["zipcode"])?;

    let targets = rows
        .into_iter()
        .map(|(line, raw)| -> Result<TargetZip> {
            Ok(TargetZip {
                zipcode: required(&raw.zipcode, table, line, "zipcode")?.to_string(),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    debug!(rows = targets.len(), "Loaded target table");
    Ok(targets)
}

pub fn load_plans(path: impl AsRef<Path>) -> Result<Vec<PlanRecord>> {
    read_plans(File::open(path)?)
}

pub fn load_zips(path: impl AsRef<Path>) -> Result<Vec<ZipAreaRecord>> {
    read_zips(File::open(path)?)
}

pub fn load_targets(path: impl AsRef<Path>) -> Result<Vec<TargetZip>> {
    read_targets(File::open(path)?)
}

/// Reads every row of a headed CSV table into `T`, paired with its line
/// number, after checking that the header names every required column.
fn read_table<R: Read, T: DeserializeOwned>(
    reader: R,
    table: Table,
    required_columns: &[&str],
) -> Result<Vec<(u64, T)>> {
    let mut rdr = ReaderBuilder::new().trim(Trim::All).from_reader(reader);
    let headers: StringRecord = rdr.headers()?.clone();

    for column in required_columns {
        if !headers.iter().any(|h| h == *column) {
            return Err(SlcspError::malformed(
                table,
                1,
                column,
                "required column missing from header",
            ));
        }
    }

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result.map_err(|e| {
            let line = e.position().map(|p| p.line()).unwrap_or(0);
            SlcspError::malformed(table, line, "*", e.to_string())
        })?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);

        let row: T = record
            .deserialize(Some(&headers))
            .map_err(|e| SlcspError::malformed(table, line, "*", e.to_string()))?;
        rows.push((line, row));
    }

    Ok(rows)
}

fn required<'a>(value: &'a Option<String>, table: Table, line: u64, column: &str) -> Result<&'a str> {
    match value.as_deref() {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(SlcspError::malformed(table, line, column, "missing value")),
    }
}

fn parse_rate(value: &Option<String>, table: Table, line: u64) -> Result<f64> {
    let raw = required(value, table, line, "rate")?;
    match raw.parse::<f64>() {
        Ok(rate) if rate.is_finite() => Ok(rate),
        _ => Err(SlcspError::malformed(
            table,
            line,
            "rate",
            format!("cannot parse '{raw}' as a decimal rate"),
        )),
    }
}

fn parse_rate_area(value: &Option<String>, table: Table, line: u64) -> Result<u32> {
    let raw = required(value, table, line, "rate_area")?;
    raw.parse::<u32>().map_err(|_| {
        SlcspError::malformed(
            table,
            line,
            "rate_area",
            format!("cannot parse '{raw}' as a rate area number"),
        )
    })
}
