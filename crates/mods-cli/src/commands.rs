use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, info_span};

use mods_assemble::{RecordAssembler, Template};
use mods_ingest::load_sheet;
use mods_validate::Validator;

use crate::cli::{ConvertArgs, HeadersArgs, SplitArgs, ValidateArgs};
use crate::types::{ConvertResult, SplitResult, ValidateResult};

fn load_template(path: Option<&Path>) -> Result<Template> {
    match path {
        Some(path) => Template::from_file(path)
            .with_context(|| format!("load template {}", path.display())),
        None => Ok(Template::bundled()),
    }
}

pub fn run_convert(args: &ConvertArgs) -> Result<ConvertResult> {
    let span = info_span!("convert", spreadsheet = %args.spreadsheet.display());
    let _guard = span.enter();

    let sheet = load_sheet(&args.spreadsheet).context("load spreadsheet")?;
    info!(rows = sheet.rows.len(), "loaded spreadsheet");
    let template = load_template(args.template.as_deref())?;
    let assembler = RecordAssembler::new(template);
    let unmatched_headers = assembler.check_headers(&sheet);

    let result = assembler.assemble_container(&sheet);
    let records = result.document.child_elements().count();
    let document = result
        .document
        .to_document_string()
        .context("serialize container document")?;

    match &args.output {
        Some(path) => {
            fs::write(path, document).with_context(|| format!("write {}", path.display()))?;
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(document.as_bytes()).context("write stdout")?;
        }
    }

    Ok(ConvertResult {
        spreadsheet: args.spreadsheet.clone(),
        output: args.output.clone(),
        records,
        unmatched_headers,
        failures: result.failures,
    })
}

pub fn run_split(args: &SplitArgs) -> Result<SplitResult> {
    let span = info_span!("split", spreadsheet = %args.spreadsheet.display());
    let _guard = span.enter();

    let sheet = load_sheet(&args.spreadsheet).context("load spreadsheet")?;
    info!(rows = sheet.rows.len(), "loaded spreadsheet");
    let template = load_template(args.template.as_deref())?;
    let assembler = RecordAssembler::new(template);
    let unmatched_headers = assembler.check_headers(&sheet);

    let failures = assembler
        .write_record_files(&sheet, &args.output_dir)
        .context("write record files")?;
    let written = sheet.rows.len() - failures.len();

    Ok(SplitResult {
        spreadsheet: args.spreadsheet.clone(),
        output_dir: args.output_dir.clone(),
        written,
        unmatched_headers,
        failures,
    })
}

pub fn run_validate(args: &ValidateArgs) -> Result<ValidateResult> {
    let validator = Validator::default();
    let mut files = Vec::new();
    for path in &args.files {
        let contents =
            fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        files.push((path.clone(), validator.validate_str(&contents)));
    }
    Ok(ValidateResult { files })
}

pub fn run_headers(args: &HeadersArgs) -> Result<Vec<String>> {
    let sheet = load_sheet(&args.spreadsheet).context("load spreadsheet")?;
    let template = load_template(args.template.as_deref())?;
    let assembler = RecordAssembler::new(template);
    Ok(assembler.check_headers(&sheet))
}
