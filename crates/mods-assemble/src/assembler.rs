//! Row-to-record orchestration and output aggregation.

use std::fs;
use std::path::Path;

use chrono::{SecondsFormat, Utc};
use regex::Regex;
use tracing::{debug, info, warn};

use mods_ingest::{Row, Sheet};
use mods_normalize::{Normalizer, XmlElement, XmlNode, parse_element};

use crate::error::{AssembleError, FailureKind, Result, RowFailure};
use crate::template::Template;

/// Field naming the catalog object a record belongs to.
pub const ITEM_ID_FIELD: &str = "druid";

/// Field naming per-row output files.
pub const SOURCE_ID_FIELD: &str = "sourceId";

/// Container and per-row results of one batch conversion.
#[derive(Debug)]
pub struct ContainerResult {
    /// The aggregate document, wrappers in exact input row order.
    pub document: XmlElement,
    pub failures: Vec<RowFailure>,
}

/// Drives one row through render, parse, and normalization, and collects
/// the normalized records into aggregate output.
#[derive(Debug)]
pub struct RecordAssembler {
    template: Template,
    normalizer: Normalizer,
    item_id_field: String,
    source_id_field: String,
    leftover_token: Regex,
}

impl RecordAssembler {
    pub fn new(template: Template) -> Self {
        Self {
            template,
            normalizer: Normalizer::default(),
            item_id_field: ITEM_ID_FIELD.to_string(),
            source_id_field: SOURCE_ID_FIELD.to_string(),
            leftover_token: Regex::new(r"\[\[[^\]]+\]\]").expect("valid placeholder pattern"),
        }
    }

    pub fn with_normalizer(mut self, normalizer: Normalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    pub fn with_identifier_fields(
        mut self,
        item_id_field: impl Into<String>,
        source_id_field: impl Into<String>,
    ) -> Self {
        self.item_id_field = item_id_field.into();
        self.source_id_field = source_id_field.into();
        self
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    /// Render one row and strip any placeholder left unmatched because the
    /// spreadsheet lacks a column the template expects.
    pub fn render_row(&self, row: &Row) -> std::result::Result<String, minijinja::Error> {
        let rendered = self.template.render(row)?;
        Ok(self.leftover_token.replace_all(&rendered, "").into_owned())
    }

    /// Convert one row into a normalized record tree.
    ///
    /// `row_number` is the 1-based data row position, carried into failure
    /// messages so the operator can find the offending spreadsheet line.
    pub fn to_record(
        &self,
        row: &Row,
        row_number: usize,
    ) -> std::result::Result<XmlElement, RowFailure> {
        let source_id = row.get(&self.source_id_field).map(str::to_string);
        let rendered = self.render_row(row).map_err(|err| RowFailure {
            row_number,
            source_id: source_id.clone(),
            kind: FailureKind::Render,
            message: format!("template rendering failed: {err}"),
        })?;
        let mut root = parse_element(&rendered).map_err(|err| RowFailure {
            row_number,
            source_id: source_id.clone(),
            kind: FailureKind::MalformedOutput,
            message: format!("rendered template is not well-formed XML: {err}"),
        })?;
        self.normalizer.normalize(&mut root);
        debug!(row_number, root = %root.name, "converted row");
        Ok(root)
    }

    /// Convert every row and aggregate the records under one container.
    ///
    /// Row order in the container matches spreadsheet order exactly;
    /// downstream consumers match records to catalog items by position.
    /// Failed rows are reported in `failures` and leave no wrapper behind.
    pub fn assemble_container(&self, sheet: &Sheet) -> ContainerResult {
        let mut container = XmlElement::new("xmlDocs");
        container.attrs.push((
            "datetime".to_string(),
            Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        ));
        container
            .attrs
            .push(("sourceFile".to_string(), sheet.file_name.clone()));

        let mut failures = Vec::new();
        for (index, row) in sheet.rows.iter().enumerate() {
            let row_number = index + 1;
            match self.to_record(row, row_number) {
                Ok(record) => {
                    let mut wrapper = XmlElement::new("xmlDoc");
                    wrapper
                        .attrs
                        .push(("id".to_string(), "descMetadata".to_string()));
                    wrapper.attrs.push((
                        "objectId".to_string(),
                        row.get(&self.item_id_field).unwrap_or("").to_string(),
                    ));
                    wrapper.children.push(XmlNode::Element(record));
                    container.children.push(XmlNode::Element(wrapper));
                }
                Err(failure) => {
                    warn!(%failure, "skipping row in container");
                    failures.push(failure);
                }
            }
        }
        info!(
            records = container.children.len(),
            failures = failures.len(),
            "assembled container document"
        );
        ContainerResult {
            document: container,
            failures,
        }
    }

    /// Write one normalized record file per row, named after the
    /// source-identifier field.
    ///
    /// A row without that identifier cannot be named and is reported as a
    /// failure before anything is written for it; remaining rows still
    /// process. I/O errors are fatal since the whole batch shares one
    /// output directory.
    pub fn write_record_files(&self, sheet: &Sheet, output_dir: &Path) -> Result<Vec<RowFailure>> {
        fs::create_dir_all(output_dir).map_err(|source| AssembleError::OutputDir {
            path: output_dir.to_path_buf(),
            source,
        })?;
        let mut failures = Vec::new();
        for (index, row) in sheet.rows.iter().enumerate() {
            let row_number = index + 1;
            let source_id = row
                .get(&self.source_id_field)
                .map(str::trim)
                .unwrap_or("");
            if source_id.is_empty() {
                let failure = RowFailure {
                    row_number,
                    source_id: None,
                    kind: FailureKind::MissingIdentifier,
                    message: format!(
                        "missing '{}' value, cannot name output file",
                        self.source_id_field
                    ),
                };
                warn!(%failure, "skipping row");
                failures.push(failure);
                continue;
            }
            let record = match self.to_record(row, row_number) {
                Ok(record) => record,
                Err(failure) => {
                    warn!(%failure, "skipping row");
                    failures.push(failure);
                    continue;
                }
            };
            let path = output_dir.join(format!("{source_id}.xml"));
            let contents = record
                .to_document_string()
                .map_err(|source| AssembleError::Serialize { row_number, source })?;
            fs::write(&path, contents).map_err(|source| AssembleError::FileWrite {
                path: path.clone(),
                source,
            })?;
            debug!(path = %path.display(), "wrote record file");
        }
        Ok(failures)
    }

    /// Advisory spreadsheet/template consistency check.
    ///
    /// Returns headers that never appear in the template text, a strong
    /// hint of a spreadsheet typo. Never blocks conversion.
    pub fn check_headers(&self, sheet: &Sheet) -> Vec<String> {
        let mut unmatched = Vec::new();
        for header in &sheet.headers {
            if header.is_empty() || *header == self.source_id_field {
                continue;
            }
            if !self.template.source().contains(header.as_str()) {
                warn!(header, "spreadsheet header not referenced by template");
                unmatched.push(header.clone());
            }
        }
        unmatched
    }
}
