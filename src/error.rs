use std::num::ParseFloatError;

use chrono::{NaiveDate, NaiveDateTime};
use thiserror::Error;

pub type ReshapeResult<T> = Result<T, ReshapeError>;

#[derive(Debug, Error)]
pub enum ReshapeError {
    #[error(transparent)]
    Window(#[from] WindowError),

    #[error(transparent)]
    Data(#[from] DataError),

    #[error(transparent)]
    Calendar(#[from] CalendarError),

    #[error(transparent)]
    Io(#[from] IoError),
}

/// Errors raised while configuring or evaluating a rolling window.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum WindowError {
    #[error("Window offset must be positive, got {0}")]
    InvalidOffset(String),

    #[error("Failed to parse window offset '{input}': {msg}")]
    OffsetParse { input: String, msg: String },

    #[error("No augmented index entry near {0}")]
    LookupFailed(NaiveDateTime),

    #[error("Shifting {0} by the window offset leaves the representable range")]
    ShiftOutOfRange(NaiveDateTime),
}

/// Errors related to parsing and shaping input tables and records.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("Table has no header line")]
    MissingHeader,

    #[error("Row {line} has {got} columns, header has {expected}")]
    RaggedRow {
        line: usize,
        expected: usize,
        got: usize,
    },

    #[error("Column not found: '{0}'")]
    MissingColumn(String),

    #[error("Failed to parse timestamp '{0}'")]
    TimestampParse(String),

    #[error("Failed to parse float: {0}")]
    ParseFloat(#[from] ParseFloatError),

    #[error("Span '{id}' ends before it starts ({start} > {end})")]
    InvalidSpan {
        id: String,
        start: NaiveDateTime,
        end: NaiveDateTime,
    },

    #[error("Data frame error: {0}")]
    DataFrame(String),
}

/// Errors related to business-day calendars and interval buckets.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CalendarError {
    #[error("Weekmask has no business days")]
    EmptyWeekmask,

    #[error("Invalid weekday in weekmask: '{0}'")]
    InvalidWeekday(String),

    #[error("Invalid interval: start {start} is after end {end}")]
    InvalidInterval {
        start: NaiveDateTime,
        end: NaiveDateTime,
    },

    #[error("Date arithmetic out of range from {0}")]
    OutOfRange(NaiveDate),
}

/// Errors related to file I/O and serialization.
#[derive(Debug, Error)]
pub enum IoError {
    #[error("IO operation failed")]
    Io(#[from] std::io::Error),

    #[error("Serialization failed")]
    Json(#[from] serde_json::Error),
}

impl From<std::io::Error> for ReshapeError {
    fn from(e: std::io::Error) -> Self {
        ReshapeError::Io(IoError::Io(e))
    }
}

impl From<serde_json::Error> for ReshapeError {
    fn from(e: serde_json::Error) -> Self {
        ReshapeError::Io(IoError::Json(e))
    }
}

impl From<ParseFloatError> for ReshapeError {
    fn from(e: ParseFloatError) -> Self {
        ReshapeError::Data(DataError::ParseFloat(e))
    }
}

impl From<polars::error::PolarsError> for ReshapeError {
    fn from(e: polars::error::PolarsError) -> Self {
        ReshapeError::Data(DataError::DataFrame(e.to_string()))
    }
}
