use std::path::PathBuf;

use mods_assemble::RowFailure;
use mods_validate::Violation;

#[derive(Debug)]
pub struct ConvertResult {
    pub spreadsheet: PathBuf,
    pub output: Option<PathBuf>,
    pub records: usize,
    pub unmatched_headers: Vec<String>,
    pub failures: Vec<RowFailure>,
}

#[derive(Debug)]
pub struct SplitResult {
    pub spreadsheet: PathBuf,
    pub output_dir: PathBuf,
    pub written: usize,
    pub unmatched_headers: Vec<String>,
    pub failures: Vec<RowFailure>,
}

#[derive(Debug)]
pub struct ValidateResult {
    pub files: Vec<(PathBuf, Vec<Violation>)>,
}

impl ValidateResult {
    pub fn violation_count(&self) -> usize {
        self.files.iter().map(|(_, violations)| violations.len()).sum()
    }
}
