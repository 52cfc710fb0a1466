//! Integration tests for row-to-record conversion and aggregation.

use mods_assemble::{FailureKind, RecordAssembler, Template};
use mods_ingest::{Row, Sheet};
use mods_normalize::{XmlElement, XmlNode};

fn sheet(headers: &[&str], rows: &[&[&str]]) -> Sheet {
    let headers: Vec<String> = headers.iter().map(|h| (*h).to_string()).collect();
    let rows = rows
        .iter()
        .map(|cells| {
            Row::new(
                headers
                    .iter()
                    .zip(cells.iter())
                    .map(|(header, cell)| (header.clone(), (*cell).to_string()))
                    .collect(),
            )
        })
        .collect();
    Sheet {
        file_name: "batch.csv".to_string(),
        headers,
        rows,
    }
}

fn wrapper_object_ids(container: &XmlElement) -> Vec<String> {
    container
        .child_elements()
        .map(|wrapper| wrapper.attr("objectId").unwrap_or("").to_string())
        .collect()
}

fn first_record(wrapper: &XmlElement) -> &XmlElement {
    wrapper.child_elements().next().expect("wrapped record")
}

#[test]
fn test_container_preserves_row_order() {
    let assembler = RecordAssembler::new(Template::from_source(
        "<record><title>[[title]]</title></record>",
    ));
    let sheet = sheet(
        &["druid", "sourceId", "title"],
        &[
            &["dd111aa1111", "item-1", "C"],
            &["dd111bb2222", "item-2", "A"],
            &["dd111cc3333", "item-3", "B"],
        ],
    );
    let result = assembler.assemble_container(&sheet);
    assert!(result.failures.is_empty());
    assert_eq!(
        wrapper_object_ids(&result.document),
        vec!["dd111aa1111", "dd111bb2222", "dd111cc3333"]
    );
}

#[test]
fn test_container_root_is_annotated() {
    let assembler =
        RecordAssembler::new(Template::from_source("<record>[[title]]</record>"));
    let sheet = sheet(&["druid", "sourceId", "title"], &[&["d", "s", "t"]]);
    let result = assembler.assemble_container(&sheet);
    assert_eq!(result.document.name, "xmlDocs");
    assert_eq!(result.document.attr("sourceFile"), Some("batch.csv"));
    let datetime = result.document.attr("datetime").expect("datetime");
    assert!(datetime.ends_with('Z'));
    let wrapper = result.document.child_elements().next().expect("wrapper");
    assert_eq!(wrapper.attr("id"), Some("descMetadata"));
}

#[test]
fn test_leftover_placeholders_are_stripped_and_pruned() {
    let assembler = RecordAssembler::new(Template::from_source(
        "<record><x>[[missingField]]</x><title>[[title]]</title></record>",
    ));
    let sheet = sheet(&["druid", "sourceId", "title"], &[&["d", "s", "Kept"]]);
    let result = assembler.assemble_container(&sheet);
    assert!(result.failures.is_empty());
    let record = first_record(result.document.child_elements().next().expect("wrapper"));
    assert_eq!(
        record.to_xml_string().expect("serialize"),
        "<record><title>Kept</title></record>"
    );
}

#[test]
fn test_two_row_end_to_end_scenario() {
    // A row whose every field prunes away keeps its record as an empty
    // element rather than disappearing from the container.
    let assembler = RecordAssembler::new(Template::from_source(
        "<record><title>[[title]]</title></record>",
    ));
    let sheet = sheet(
        &["sourceId", "title"],
        &[&["a1", "Hello"], &["a2", ""]],
    );
    let result = assembler.assemble_container(&sheet);
    assert!(result.failures.is_empty());
    let wrappers: Vec<&XmlElement> = result.document.child_elements().collect();
    assert_eq!(wrappers.len(), 2);
    assert_eq!(
        first_record(wrappers[0]).to_xml_string().expect("serialize"),
        "<record><title>Hello</title></record>"
    );
    assert_eq!(
        first_record(wrappers[1]).to_xml_string().expect("serialize"),
        "<record/>"
    );
}

#[test]
fn test_malformed_render_is_isolated_to_its_row() {
    // A conditional open tag with an unconditional close: rows that skip
    // the branch render a stray end tag and fail to parse.
    let assembler = RecordAssembler::new(Template::from_source(
        "<record>{% if flag %}<open>{% endif %}</open></record>",
    ));
    let sheet = sheet(
        &["sourceId", "flag"],
        &[&["a1", "yes"], &["a2", ""], &["a3", "yes"]],
    );
    let result = assembler.assemble_container(&sheet);
    assert_eq!(result.document.child_elements().count(), 2);
    assert_eq!(result.failures.len(), 1);
    let failure = &result.failures[0];
    assert_eq!(failure.row_number, 2);
    assert_eq!(failure.kind, FailureKind::MalformedOutput);
    assert_eq!(failure.source_id.as_deref(), Some("a2"));
}

#[test]
fn test_write_record_files_names_by_source_id() {
    let dir = tempfile::tempdir().expect("tempdir");
    let assembler = RecordAssembler::new(Template::from_source(
        "<record><title>[[title]]</title></record>",
    ));
    let sheet = sheet(
        &["sourceId", "title"],
        &[&["item-1", "One"], &["item-2", "Two"]],
    );
    let failures = assembler
        .write_record_files(&sheet, dir.path())
        .expect("write");
    assert!(failures.is_empty());
    let contents = std::fs::read_to_string(dir.path().join("item-1.xml")).expect("read");
    assert!(contents.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
    assert!(contents.contains("<record><title>One</title></record>"));
    assert!(dir.path().join("item-2.xml").exists());
}

#[test]
fn test_missing_identifier_does_not_abort_the_batch() {
    let dir = tempfile::tempdir().expect("tempdir");
    let assembler = RecordAssembler::new(Template::from_source(
        "<record><title>[[title]]</title></record>",
    ));
    let sheet = sheet(
        &["sourceId", "title"],
        &[&["", "Nameless"], &["item-2", "Two"]],
    );
    let failures = assembler
        .write_record_files(&sheet, dir.path())
        .expect("write");
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].kind, FailureKind::MissingIdentifier);
    assert_eq!(failures[0].row_number, 1);
    assert!(dir.path().join("item-2.xml").exists());
}

#[test]
fn test_header_check_is_advisory() {
    let assembler = RecordAssembler::new(Template::from_source(
        "<record><title>[[title]]</title></record>",
    ));
    let sheet = sheet(
        &["druid", "sourceId", "title", "ttile"],
        &[&["d", "s", "t", "oops"]],
    );
    let unmatched = assembler.check_headers(&sheet);
    // sourceId is exempt; "druid" and the typo are unreferenced.
    assert_eq!(unmatched, vec!["druid".to_string(), "ttile".to_string()]);
    // The check never blocks conversion.
    assert!(assembler.assemble_container(&sheet).failures.is_empty());
}

#[test]
fn test_bundled_template_normalizes_cleanly() {
    let assembler = RecordAssembler::new(Template::bundled());
    let sheet = sheet(
        &["druid", "sourceId", "title", "dateCreatedStart", "abstract"],
        &[&[
            "dd111aa1111",
            "item-1",
            "A Title",
            "1990.500",
            "line one\\nline two",
        ]],
    );
    let result = assembler.assemble_container(&sheet);
    assert!(result.failures.is_empty(), "failures: {:?}", result.failures);
    let record = first_record(result.document.child_elements().next().expect("wrapper"));
    let xml = record.to_xml_string().expect("serialize");
    assert!(xml.contains("<title>A Title</title>"));
    // Lone start date loses its point qualifier and decimal artifact.
    assert!(xml.contains("<dateCreated keyDate=\"yes\">1990</dateCreated>"));
    assert!(xml.contains("<abstract>line one&#10;line two</abstract>"));
    // Empty template fields are pruned.
    assert!(!xml.contains("subTitle"));
    assert!(!xml.contains("tableOfContents"));
}
