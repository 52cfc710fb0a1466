//! Error types for record assembly.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort an assembly run.
#[derive(Debug, Error)]
pub enum AssembleError {
    /// The template file could not be read.
    #[error("failed to read template {path}: {source}")]
    TemplateRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The output directory could not be created.
    #[error("failed to create output directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A per-row output file could not be written.
    #[error("failed to write {path}: {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A normalized record could not be serialized.
    #[error("failed to serialize record for row {row_number}: {source}")]
    Serialize {
        row_number: usize,
        #[source]
        source: mods_normalize::XmlError,
    },
}

/// Why one row failed while the batch continued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The row has no value for the source-identifier field.
    MissingIdentifier,
    /// The rendered template was not well-formed XML.
    MalformedOutput,
    /// The template engine rejected the row.
    Render,
}

/// One row that could not be converted. Failures are collected and
/// reported; they never abort the remaining rows.
#[derive(Debug, Clone)]
pub struct RowFailure {
    /// 1-based data row number, for operator-facing messages.
    pub row_number: usize,
    pub source_id: Option<String>,
    pub kind: FailureKind,
    pub message: String,
}

impl std::fmt::Display for RowFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.source_id {
            Some(id) => write!(f, "row {} ({}): {}", self.row_number, id, self.message),
            None => write!(f, "row {}: {}", self.row_number, self.message),
        }
    }
}

/// Result type for assembly operations.
pub type Result<T> = std::result::Result<T, AssembleError>;
