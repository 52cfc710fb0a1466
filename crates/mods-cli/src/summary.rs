use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Cell, CellAlignment, Color, ContentArrangement, Table};

use mods_assemble::RowFailure;

use crate::types::{ConvertResult, SplitResult, ValidateResult};

pub fn print_convert_summary(result: &ConvertResult) {
    println!("Spreadsheet: {}", result.spreadsheet.display());
    match &result.output {
        Some(path) => println!("Container: {}", path.display()),
        None => println!("Container: <stdout>"),
    }
    let mut table = new_table(vec!["Records", "Failures", "Unmatched headers"]);
    table.add_row(vec![
        Cell::new(result.records),
        count_cell(result.failures.len()),
        Cell::new(result.unmatched_headers.len()),
    ]);
    println!("{table}");
    print_unmatched_headers(&result.unmatched_headers);
    print_failures(&result.failures);
}

pub fn print_split_summary(result: &SplitResult) {
    println!("Spreadsheet: {}", result.spreadsheet.display());
    println!("Output dir: {}", result.output_dir.display());
    let mut table = new_table(vec!["Files written", "Failures", "Unmatched headers"]);
    table.add_row(vec![
        Cell::new(result.written),
        count_cell(result.failures.len()),
        Cell::new(result.unmatched_headers.len()),
    ]);
    println!("{table}");
    print_unmatched_headers(&result.unmatched_headers);
    print_failures(&result.failures);
}

pub fn print_validate_summary(result: &ValidateResult) {
    let mut table = new_table(vec!["File", "Violations"]);
    for (path, violations) in &result.files {
        table.add_row(vec![
            Cell::new(path.display()),
            count_cell(violations.len()),
        ]);
    }
    println!("{table}");
    for (path, violations) in &result.files {
        for violation in violations {
            eprintln!("{}: {violation}", path.display());
        }
    }
}

fn new_table(headers: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(headers);
    for column in table.column_iter_mut().skip(1) {
        column.set_cell_alignment(CellAlignment::Right);
    }
    table
}

fn count_cell(count: usize) -> Cell {
    if count > 0 {
        Cell::new(count).fg(Color::Red)
    } else {
        Cell::new(count)
    }
}

fn print_unmatched_headers(headers: &[String]) {
    if headers.is_empty() {
        return;
    }
    eprintln!("Headers with no template reference (spreadsheet typo?):");
    for header in headers {
        eprintln!("- {header}");
    }
}

fn print_failures(failures: &[RowFailure]) {
    if failures.is_empty() {
        return;
    }
    eprintln!("Row failures:");
    for failure in failures {
        eprintln!("- {failure}");
    }
}
