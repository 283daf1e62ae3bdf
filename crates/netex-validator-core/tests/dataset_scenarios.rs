//! End-to-end dataset scenarios exercised through the public entry points.
#![allow(clippy::expect_used)]

use std::io::Write as _;

use netex_validator_core::{validate_content, validate_zip, ValidationOptions};
use netex_validator_core::orchestrator::{CancellationToken, Orchestrator};

fn offline_options() -> ValidationOptions {
    let mut options = ValidationOptions::default();
    options.codespace = "TEST".to_owned();
    options.allow_schema_network = false;
    options
}

fn line_doc(id: &str) -> Vec<u8> {
    format!(
        r#"<PublicationDelivery xmlns="http://www.netex.org.uk/netex" version="1.15">
            <PublicationTimestamp>2023-01-01T12:00:00</PublicationTimestamp>
            <ParticipantRef>TEST</ParticipantRef>
            <dataObjects><Line id="{id}" version="1">
                <Name>Test</Name>
                <TransportMode>bus</TransportMode>
            </Line></dataObjects>
        </PublicationDelivery>"#
    )
    .into_bytes()
}

/// S3 — a common file and a line file both register the same id.
#[test]
fn duplicate_id_across_common_and_line_files() {
    let shared = line_doc("T:Line:1");
    let trips = line_doc("T:Line:1");

    let mut options = offline_options();
    options.skip_schema = true;
    options.validation_cache.enabled = false;

    let orchestrator = Orchestrator::new();
    let report = orchestrator.run(
        vec![("_shared.xml".to_owned(), shared), ("trips.xml".to_owned(), trips)],
        &options,
        "TEST",
        &CancellationToken::new(),
    );

    let dups: Vec<_> = report.entries.iter().filter(|e| e.code == "DUPLICATE-ID").collect();
    assert_eq!(dups.len(), 1, "expected exactly one DUPLICATE-ID entry, got {dups:?}");
}

/// S4 — an unresolved French id is claimed by the default external
/// reference validator and does not surface as UNRESOLVED-REFERENCE.
#[test]
fn french_external_reference_is_not_unresolved() {
    let xml = br#"<PublicationDelivery xmlns="http://www.netex.org.uk/netex" version="1.15">
        <PublicationTimestamp>2023-01-01T12:00:00</PublicationTimestamp>
        <ParticipantRef>TEST</ParticipantRef>
        <dataObjects><Line id="T:Line:1" version="1">
            <Name>Test</Name>
            <TransportMode>bus</TransportMode>
            <QuayRef ref="FR:123:Quay:456:RIV" version="1"/>
        </Line></dataObjects>
    </PublicationDelivery>"#;

    let mut options = offline_options();
    options.skip_schema = true;
    options.validation_cache.enabled = false;

    let report = validate_content(xml, "line.xml", &options);
    assert!(
        !report.entries.iter().any(|e| e.code == "UNRESOLVED-REFERENCE" && e.location.element_id == "FR:123:Quay:456:RIV"),
        "FR-prefixed reference should be claimed by the French validator: {:#?}",
        report.entries
    );
}

/// S5 — with network disallowed and an empty cache, only basic structural
/// schema checks run; no XSD engine errors appear and the run does not hang
/// attempting a network fetch.
#[test]
fn schema_offline_yields_only_basic_checks() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let xml = line_doc("T:Line:1");

    let mut options = offline_options();
    options.schema_cache_dir = tmp.path().to_path_buf();
    options.skip_xpath_rules = true;
    options.validation_cache.enabled = false;

    let report = validate_content(&xml, "line.xml", &options);
    assert!(
        !report.entries.iter().any(|e| e.code.starts_with("SCHEMA-4")),
        "no XSD-engine findings expected offline: {:#?}",
        report.entries
    );
}

/// S6 — validating the same bytes and options twice in sequence hits the
/// cache on the second run and produces an entry-equal report.
#[test]
fn cache_hit_on_second_identical_run() {
    let xml = line_doc("T:Line:1");
    let options = offline_options();

    let first = validate_content(&xml, "line.xml", &options);
    let second = validate_content(&xml, "line.xml", &options);

    assert_eq!(first.entries.len(), second.entries.len());
    let first_codes: Vec<&str> = first.entries.iter().map(|e| e.code.as_str()).collect();
    let second_codes: Vec<&str> = second.entries.iter().map(|e| e.code.as_str()).collect();
    assert_eq!(first_codes, second_codes);
}

/// A ZIP archive with a common file and a line file validates as one
/// dataset, with non-`.xml` members ignored.
#[test]
fn validate_zip_runs_full_dataset() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let zip_path = tmp.path().join("dataset.zip");
    let file = std::fs::File::create(&zip_path).expect("create zip");
    let mut writer = zip::ZipWriter::new(file);
    let opts = zip::write::SimpleFileOptions::default();

    writer.start_file("_shared.xml", opts).expect("start shared entry");
    writer.write_all(&line_doc("T:Line:1")).expect("write shared entry");

    writer.start_file("line.xml", opts).expect("start line entry");
    writer.write_all(&line_doc("T:Line:2")).expect("write line entry");

    writer.start_file("README.txt", opts).expect("start readme entry");
    writer.write_all(b"not xml").expect("write readme entry");

    writer.finish().expect("finish zip");

    let mut options = offline_options();
    options.validation_cache.enabled = false;
    let report = validate_zip(&zip_path, &options);

    assert!(report.error.is_none(), "unexpected report error: {:?}", report.error);
    assert_eq!(report.files_processed, 2, "README.txt should not be counted");
}
