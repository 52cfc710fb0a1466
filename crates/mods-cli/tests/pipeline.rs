//! End-to-end tests: spreadsheet file in, normalized records out.

use std::io::Write;

use mods_assemble::{RecordAssembler, Template};
use mods_ingest::load_sheet;
use mods_validate::Validator;

fn write_csv(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".csv")
        .tempfile()
        .expect("create temp csv");
    file.write_all(contents.as_bytes()).expect("write csv");
    file
}

#[test]
fn test_spreadsheet_to_container_round_trip() {
    let csv = write_csv(
        "Accessioning batch,,\n\
         ,,\n\
         druid,sourceId,title\n\
         aa111bb2222,item-1,First title\n\
         aa111bb3333,item-2,Second title\n",
    );
    let sheet = load_sheet(csv.path()).expect("load sheet");
    let assembler = RecordAssembler::new(Template::from_source(
        "<record><title>[[title]]</title><identifier type=\"local\">[[sourceId]]</identifier></record>",
    ));

    let result = assembler.assemble_container(&sheet);
    assert!(result.failures.is_empty());

    let xml = result.document.to_document_string().expect("serialize");
    assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
    let first = xml.find("item-1").expect("first record present");
    let second = xml.find("item-2").expect("second record present");
    assert!(first < second, "container must preserve row order");
    assert!(xml.contains("objectId=\"aa111bb2222\""));
    assert!(xml.contains("<title>First title</title>"));
}

#[test]
fn test_split_writes_schema_valid_records() {
    let csv = write_csv(
        "druid,sourceId,title,abstract\n\
         aa111bb2222,item-1,A Title,Summary text\n",
    );
    let dir = tempfile::tempdir().expect("tempdir");
    let sheet = load_sheet(csv.path()).expect("load sheet");
    let assembler = RecordAssembler::new(Template::bundled());

    let failures = assembler
        .write_record_files(&sheet, dir.path())
        .expect("write");
    assert!(failures.is_empty(), "failures: {failures:?}");

    let record = std::fs::read_to_string(dir.path().join("item-1.xml")).expect("read record");
    let violations = Validator::default().validate_str(&record);
    assert!(violations.is_empty(), "violations: {violations:?}");
}
