//! Error types for loading tables and computing benchmark rates.

use std::fmt;
use thiserror::Error;

/// Identifies which input table a record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Plans,
    Zips,
    Target,
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Table::Plans => write!(f, "plans"),
            Table::Zips => write!(f, "zips"),
            Table::Target => write!(f, "target"),
        }
    }
}

#[derive(Debug, Error)]
pub enum SlcspError {
    /// A rate area has fewer than two distinct Silver rates, so no
    /// second-lowest value exists.
    #[error(
        "rate area {rate_area} has {distinct} distinct Silver rate(s), at least 2 are needed for a second-lowest rate"
    )]
    InsufficientRates { rate_area: u32, distinct: usize },

    /// A row is missing a required column or holds an unparseable value.
    /// `line` is 1-based and counts the header as line 1.
    #[error("{table} table, line {line}, column '{column}': {reason}")]
    MalformedRecord {
        table: Table,
        line: u64,
        column: String,
        reason: String,
    },

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SlcspError>;

impl SlcspError {
    pub(crate) fn malformed(
        table: Table,
        line: u64,
        column: &str,
        reason: impl Into<String>,
    ) -> Self {
        SlcspError::MalformedRecord {
            table,
            line,
            column: column.to_string(),
            reason: reason.into(),
        }
    }
}
