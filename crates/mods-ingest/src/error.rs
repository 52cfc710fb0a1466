//! Error types for spreadsheet ingestion.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading a metadata spreadsheet.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The file extension maps to no supported spreadsheet format.
    #[error("unknown spreadsheet format: {path}")]
    UnknownFormat { path: PathBuf },

    /// Failed to parse CSV content.
    #[error("failed to parse CSV {path}: {message}")]
    CsvParse { path: PathBuf, message: String },

    /// Failed to open or read a binary workbook.
    #[error("failed to read workbook {path}: {message}")]
    Workbook { path: PathBuf, message: String },

    /// The workbook contains no worksheets.
    #[error("no worksheet found in {path}")]
    NoWorksheet { path: PathBuf },

    /// No row carried all of the sentinel header columns.
    #[error("no header row containing {sentinels:?} found in {path}")]
    NoHeaderRow {
        path: PathBuf,
        sentinels: Vec<String>,
    },
}

/// Result type for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestError>;
