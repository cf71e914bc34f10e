//! Error taxonomy for the analysis pipeline.
//!
//! `InputError` is terminal for the current request and surfaced to the
//! caller. Failures on the secondary path (summary row, behavior profile)
//! are never propagated; they are logged and reported through
//! `SecondaryOutcome` on the analysis result.

use std::fmt;

/// Rejected input. No retry; the caller gets a descriptive message.
#[derive(Debug)]
pub enum InputError {
    /// The batch has zero rows.
    EmptyInput,
    /// No numeric columns remain after filtering.
    NoNumericColumns,
    /// An infinite value survived the zero-fill.
    NonFiniteValue { column: String, row: usize },
    /// The upload bytes could not be parsed as CSV or JSON.
    Parse(String),
}

impl fmt::Display for InputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputError::EmptyInput => write!(f, "Input batch is empty"),
            InputError::NoNumericColumns => {
                write!(f, "No numeric columns available after filtering")
            }
            InputError::NonFiniteValue { column, row } => {
                write!(f, "Non-finite value in column '{}' at row {}", column, row)
            }
            InputError::Parse(msg) => write!(f, "Failed to parse input: {}", msg),
        }
    }
}

impl std::error::Error for InputError {}

/// Persistence failure (analysis-result append, profile upsert, history read).
#[derive(Debug)]
pub enum StorageError {
    Sqlite(rusqlite::Error),
    Io(std::io::Error),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::Sqlite(e) => write!(f, "Database error: {}", e),
            StorageError::Io(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        StorageError::Sqlite(err)
    }
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        StorageError::Io(err)
    }
}
