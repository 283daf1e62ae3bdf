//! Integration tests for `netex-validator validate`, driving the compiled
//! binary end to end.
#![allow(clippy::expect_used)]

use std::io::Write as _;
use std::path::PathBuf;
use std::process::Command;

/// Path to the compiled `netex-validator` binary.
fn netex_validator_bin() -> PathBuf {
    let mut path = std::env::current_exe().expect("current exe");
    // current_exe is something like …/deps/cmd_validate-<hash>
    // The binary lives in the parent directory.
    path.pop();
    if path.ends_with("deps") {
        path.pop();
    }
    path.push("netex-validator");
    path
}

fn write_fixture(dir: &tempfile::TempDir, name: &str, contents: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::File::create(&path).expect("create fixture").write_all(contents).expect("write fixture");
    path
}

const VALID_LINE: &[u8] = br#"<PublicationDelivery xmlns="http://www.netex.org.uk/netex" version="1.15">
    <PublicationTimestamp>2023-01-01T12:00:00</PublicationTimestamp>
    <ParticipantRef>TEST</ParticipantRef>
    <dataObjects><Line id="TEST:Line:1" version="1">
        <Name>Test</Name>
        <TransportMode>bus</TransportMode>
        <TransportSubmode>localBus</TransportSubmode>
        <OperatorRef ref="TEST:Operator:1" version="1"/>
    </Line></dataObjects>
</PublicationDelivery>"#;

const MISSING_NAME_AND_MODE: &[u8] = br#"<PublicationDelivery xmlns="http://www.netex.org.uk/netex" version="1.15">
    <PublicationTimestamp>2023-01-01T12:00:00</PublicationTimestamp>
    <ParticipantRef>TEST</ParticipantRef>
    <dataObjects><Line id="TEST:Line:1" version="1"/></dataObjects>
</PublicationDelivery>"#;

#[test]
fn validate_valid_document_exits_0() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_fixture(&dir, "line.xml", VALID_LINE);

    let out = Command::new(netex_validator_bin())
        .args(["validate", path.to_str().expect("path"), "--no-network", "--no-color"])
        .output()
        .expect("run netex-validator validate");

    assert_eq!(out.status.code(), Some(0), "stderr: {}", String::from_utf8_lossy(&out.stderr));
}

#[test]
fn validate_missing_rules_exits_1() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_fixture(&dir, "line.xml", MISSING_NAME_AND_MODE);

    let out = Command::new(netex_validator_bin())
        .args(["validate", path.to_str().expect("path"), "--no-network", "--no-color"])
        .output()
        .expect("run netex-validator validate");

    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("LINE_2"), "stderr: {stderr}");
    assert!(stderr.contains("LINE_4"), "stderr: {stderr}");
}

#[test]
fn validate_missing_path_exits_2() {
    let out = Command::new(netex_validator_bin())
        .args(["validate", "/no/such/dataset.xml", "--no-network"])
        .output()
        .expect("run netex-validator validate");

    assert_eq!(out.status.code(), Some(2));
}

#[test]
fn validate_json_format_emits_parseable_report_on_stdout() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_fixture(&dir, "line.xml", VALID_LINE);

    let out = Command::new(netex_validator_bin())
        .args(["validate", path.to_str().expect("path"), "--no-network", "--format", "json"])
        .output()
        .expect("run netex-validator validate");

    assert_eq!(out.status.code(), Some(0));
    let value: serde_json::Value = serde_json::from_slice(&out.stdout).expect("parse JSON report");
    assert_eq!(value["codespace"], "");
}

#[test]
fn validate_zip_dataset_runs_cross_file_checks() {
    let dir = tempfile::tempdir().expect("tempdir");
    let zip_path = dir.path().join("dataset.zip");
    let file = std::fs::File::create(&zip_path).expect("create zip");
    let mut writer = zip::ZipWriter::new(file);
    let opts = zip::write::SimpleFileOptions::default();

    writer.start_file("_shared.xml", opts).expect("start shared entry");
    writer.write_all(VALID_LINE).expect("write shared entry");
    writer.start_file("line.xml", opts).expect("start line entry");
    writer.write_all(VALID_LINE).expect("write line entry");
    writer.finish().expect("finish zip");

    let out = Command::new(netex_validator_bin())
        .args(["validate", zip_path.to_str().expect("path"), "--no-network", "--no-color"])
        .output()
        .expect("run netex-validator validate");

    assert_eq!(out.status.code(), Some(1), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("DUPLICATE-ID"), "stderr: {stderr}");
}
