//! Spreadsheet loading and header discovery.
//!
//! Cataloging spreadsheets open with one or more human-readable "super
//! header" rows before the real field-name header. The header row is found
//! by looking for the sentinel identifier columns; everything above it is
//! discarded and everything below it is data.

use std::path::Path;

use calamine::{Data, DataType, Reader, Xls, Xlsx, open_workbook};
use csv::ReaderBuilder;
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::json;
use tracing::debug;

use crate::error::{IngestError, Result};

/// Default sentinel columns that mark the true header row.
pub const DEFAULT_SENTINELS: [&str; 2] = ["druid", "sourceId"];

/// One data row: field name to value, in header order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    fields: Vec<(String, String)>,
}

impl Serialize for Row {
    /// Serializes as a JSON object with fields in header order.
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (key, value) in &self.fields {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl Row {
    pub fn new(fields: Vec<(String, String)>) -> Self {
        Self { fields }
    }

    /// Value for a field name; keys are case-sensitive.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Iterate over (field, value) pairs in header order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.fields.iter().all(|(_, value)| value.trim().is_empty())
    }
}

/// A loaded spreadsheet: discovered headers plus the data rows below them.
#[derive(Debug, Clone)]
pub struct Sheet {
    pub file_name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Row>,
}

impl Sheet {
    /// JSON export of the loaded sheet, one object per data row.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&json!({
            "filename": self.file_name,
            "rows": self.rows,
        }))
    }
}

/// Which sentinel columns identify the header row.
#[derive(Debug, Clone)]
pub struct SheetOptions {
    pub sentinels: Vec<String>,
}

impl Default for SheetOptions {
    fn default() -> Self {
        Self {
            sentinels: DEFAULT_SENTINELS.iter().map(|s| (*s).to_string()).collect(),
        }
    }
}

/// Load a spreadsheet with the default sentinel columns.
pub fn load_sheet(path: &Path) -> Result<Sheet> {
    load_sheet_with(path, &SheetOptions::default())
}

/// Load a spreadsheet, selecting the reader by file extension.
pub fn load_sheet_with(path: &Path, options: &SheetOptions) -> Result<Sheet> {
    let extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    let raw_rows = match extension.as_str() {
        "csv" => read_csv_rows(path)?,
        "xls" => read_xls_rows(path)?,
        "xlsx" => read_xlsx_rows(path)?,
        _ => {
            return Err(IngestError::UnknownFormat {
                path: path.to_path_buf(),
            });
        }
    };
    build_sheet(path, raw_rows, options)
}

fn build_sheet(path: &Path, raw_rows: Vec<Vec<String>>, options: &SheetOptions) -> Result<Sheet> {
    let header_index = raw_rows
        .iter()
        .position(|row| {
            options
                .sentinels
                .iter()
                .all(|sentinel| row.iter().any(|cell| cell == sentinel))
        })
        .ok_or_else(|| IngestError::NoHeaderRow {
            path: path.to_path_buf(),
            sentinels: options.sentinels.clone(),
        })?;
    let headers = raw_rows[header_index].clone();
    debug!(
        header_row = header_index + 1,
        columns = headers.len(),
        "discovered header row"
    );

    let mut rows = Vec::new();
    for record in raw_rows.iter().skip(header_index + 1) {
        if record.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        let fields = headers
            .iter()
            .enumerate()
            .map(|(index, header)| {
                let value = record.get(index).map(String::as_str).unwrap_or("");
                (header.clone(), value.to_string())
            })
            .collect();
        rows.push(Row::new(fields));
    }

    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(Sheet {
        file_name,
        headers,
        rows,
    })
}

fn normalize_cell(raw: &str) -> String {
    raw.trim().trim_matches('\u{feff}').to_string()
}

fn read_csv_rows(path: &Path) -> Result<Vec<Vec<String>>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(|err| IngestError::CsvParse {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|err| IngestError::CsvParse {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
        rows.push(record.iter().map(normalize_cell).collect());
    }
    Ok(rows)
}

fn read_xls_rows(path: &Path) -> Result<Vec<Vec<String>>> {
    let mut workbook: Xls<_> =
        open_workbook(path).map_err(|err: calamine::XlsError| IngestError::Workbook {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
    range_rows(path, workbook.worksheet_range_at(0))
}

fn read_xlsx_rows(path: &Path) -> Result<Vec<Vec<String>>> {
    let mut workbook: Xlsx<_> =
        open_workbook(path).map_err(|err: calamine::XlsxError| IngestError::Workbook {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
    range_rows(path, workbook.worksheet_range_at(0))
}

fn range_rows<E: std::fmt::Display>(
    path: &Path,
    range: Option<std::result::Result<calamine::Range<Data>, E>>,
) -> Result<Vec<Vec<String>>> {
    let range = range
        .ok_or_else(|| IngestError::NoWorksheet {
            path: path.to_path_buf(),
        })?
        .map_err(|err| IngestError::Workbook {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
    let rows = range
        .rows()
        .map(|row| row.iter().map(|cell| normalize_cell(&cell_text(cell))).collect())
        .collect();
    Ok(rows)
}

fn cell_text(cell: &Data) -> String {
    if cell.is_empty() {
        return String::new();
    }
    // Integer-valued floats come back from workbooks as "1990.0"; catalog
    // identifiers and years must not carry that suffix.
    if let Some(number) = cell.as_f64() {
        if number.fract() == 0.0 && number.abs() < 1e15 {
            return format!("{}", number as i64);
        }
    }
    cell.as_string().unwrap_or_else(|| cell.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".csv")
            .tempfile()
            .expect("create temp csv");
        file.write_all(contents.as_bytes()).expect("write csv");
        file
    }

    #[test]
    fn test_header_discovery_skips_super_headers() {
        let file = write_csv(
            "Catalog batch for accessioning,,\nsome notes,,\ndruid,sourceId,title\naa111bb2222,item-1,First\naa111bb3333,item-2,Second\n",
        );
        let sheet = load_sheet(file.path()).expect("load");
        assert_eq!(sheet.headers, vec!["druid", "sourceId", "title"]);
        assert_eq!(sheet.rows.len(), 2);
        assert_eq!(sheet.rows[0].get("title"), Some("First"));
        assert_eq!(sheet.rows[1].get("sourceId"), Some("item-2"));
    }

    #[test]
    fn test_rows_share_the_header_key_set() {
        let file = write_csv("druid,sourceId,title\naa111bb2222,item-1\n");
        let sheet = load_sheet(file.path()).expect("load");
        // Short rows are padded so every row has every header.
        assert_eq!(sheet.rows[0].get("title"), Some(""));
    }

    #[test]
    fn test_blank_rows_are_skipped() {
        let file = write_csv("druid,sourceId\n,,\naa111bb2222,item-1\n  , \n");
        let sheet = load_sheet(file.path()).expect("load");
        assert_eq!(sheet.rows.len(), 1);
    }

    #[test]
    fn test_missing_sentinels_is_an_error() {
        let file = write_csv("id,name\n1,x\n");
        let err = load_sheet(file.path()).expect_err("no header row");
        assert!(matches!(err, IngestError::NoHeaderRow { .. }));
    }

    #[test]
    fn test_corrupt_workbook_is_a_workbook_error() {
        let mut file = tempfile::Builder::new()
            .suffix(".xlsx")
            .tempfile()
            .expect("create temp xlsx");
        file.write_all(b"not a zip archive").expect("write");
        let err = load_sheet(file.path()).expect_err("corrupt workbook");
        assert!(matches!(err, IngestError::Workbook { .. }));
    }

    #[test]
    fn test_unknown_extension_is_an_error() {
        let err = load_sheet(Path::new("items.ods")).expect_err("unknown format");
        assert!(matches!(err, IngestError::UnknownFormat { .. }));
    }

    #[test]
    fn test_json_export_shape() {
        let file = write_csv("druid,sourceId\naa111bb2222,item-1\n");
        let sheet = load_sheet(file.path()).expect("load");
        let exported = sheet.to_json().expect("to_json");
        let value: serde_json::Value = serde_json::from_str(&exported).expect("parse json");
        assert!(value["filename"].as_str().expect("filename").ends_with(".csv"));
        assert_eq!(value["rows"][0]["sourceId"], "item-1");
    }
}
