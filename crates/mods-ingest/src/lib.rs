//! Spreadsheet ingestion for the MODS transpiler.

pub mod error;
pub mod sheet;

pub use error::IngestError;
pub use sheet::{DEFAULT_SENTINELS, Row, Sheet, SheetOptions, load_sheet, load_sheet_with};
