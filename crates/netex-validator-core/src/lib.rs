//! `netex-validator-core`: the NetEX Profile validation engine.
//!
//! Three library entry points (`spec.md` §6), from narrowest to broadest:
//! [`validate_content`] validates one in-memory document, [`validate_file`]
//! reads a path and delegates to it, and [`validate_zip`] enumerates a ZIP
//! archive's `.xml` entries and runs the full dataset [`Orchestrator`] over
//! them. Everything else in this crate — the XML model, the XPath evaluator,
//! the rule registry, the schema manager, the id repository, the cache, and
//! the orchestrator itself — is reachable directly for callers that want
//! finer-grained control (the CLI crate uses several of these directly).

pub mod cache;
pub mod id_repository;
pub mod options;
pub mod orchestrator;
pub mod registry;
pub mod report;
pub mod rule;
pub mod rule_runner;
pub mod schema;
pub mod xml;
pub mod xpath;

use std::fs;
use std::io::Read as _;
use std::path::Path;

use orchestrator::{CancellationToken, DatasetEntry, Orchestrator};
use report::ValidationReport;

pub use cache::{CacheStats, ValidationCache};
pub use id_repository::{ExternalReferenceValidator, FrenchReferenceValidator, IdConflict, IdRepository, IdVersion};
pub use options::{CacheOptions, ValidationOptions};
pub use orchestrator::validate_file as validate_single_file_entry;
pub use registry::BUILTIN_RULES;
pub use report::{DataLocation, Finding, RuleMeta, Severity, ValidationReportEntry};
pub use rule::{Category, CustomRuleDef, Rule, RuleDef};
pub use schema::{SchemaManager, XsdEngine};

/// Returns the current version of `netex-validator-core`.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

fn single_document_report(bytes: &[u8], filename: &str, options: &ValidationOptions) -> ValidationReport {
    let orchestrator = Orchestrator::new();
    let entries: Vec<DatasetEntry> = vec![(filename.to_owned(), bytes.to_vec())];
    orchestrator.run(entries, options, &options.codespace, &CancellationToken::new())
}

/// Validates a single in-memory NetEX document (`spec.md` §6).
///
/// Runs the same per-file pipeline the dataset orchestrator uses (parse,
/// schema check, rule evaluation, id/reference harvesting), then the
/// cross-file passes over a dataset of exactly one file — which only
/// surfaces intra-file defects (`spec.md` §3 Lifecycle: "for single-file
/// runs the repository is used only for intra-file checks").
pub fn validate_content(bytes: &[u8], filename: &str, options: &ValidationOptions) -> ValidationReport {
    single_document_report(bytes, filename, options)
}

/// Reads `path` and delegates to [`validate_content`], using the path's file
/// name as the document's identity. Read failures surface as a report-level
/// `error` with no entries, matching the Input Errors row of `spec.md` §7.
pub fn validate_file(path: &Path, options: &ValidationOptions) -> ValidationReport {
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned());

    match fs::read(path) {
        Ok(bytes) => validate_content(&bytes, &filename, options),
        Err(err) => report_level_error(&options.codespace, format!("failed to read '{}': {err}", path.display())),
    }
}

/// Validates every `.xml` entry of a ZIP archive at `path` as a dataset
/// (`spec.md` §6), delegating to the [`Orchestrator`] for the two-phase
/// common/line partitioning, concurrency, and cross-file passes.
pub fn validate_zip(path: &Path, options: &ValidationOptions) -> ValidationReport {
    let file = match fs::File::open(path) {
        Ok(f) => f,
        Err(err) => {
            return report_level_error(&options.codespace, format!("failed to open '{}': {err}", path.display()));
        }
    };

    let mut archive = match zip::ZipArchive::new(file) {
        Ok(a) => a,
        Err(err) => {
            return report_level_error(&options.codespace, format!("'{}' is not a valid ZIP archive: {err}", path.display()));
        }
    };

    let mut entries: Vec<DatasetEntry> = Vec::new();
    for i in 0..archive.len() {
        let mut zip_file = match archive.by_index(i) {
            Ok(f) => f,
            Err(err) => {
                return report_level_error(&options.codespace, format!("'{}' is malformed: {err}", path.display()));
            }
        };
        if !zip_file.is_file() {
            continue;
        }
        let name = zip_file.name().to_owned();
        if !name.to_ascii_lowercase().ends_with(".xml") {
            continue;
        }
        let mut bytes = Vec::new();
        if let Err(err) = zip_file.read_to_end(&mut bytes) {
            return report_level_error(&options.codespace, format!("failed to read '{name}' from archive: {err}"));
        }
        let basename = name.rsplit('/').next().unwrap_or(&name).to_owned();
        entries.push((basename, bytes));
    }

    let orchestrator = Orchestrator::new();
    orchestrator.run(entries, options, &options.codespace, &CancellationToken::new())
}

fn report_level_error(codespace: &str, message: String) -> ValidationReport {
    report::ReportAggregator::new().finish(codespace, String::new(), chrono_now(), Some(message))
}

fn chrono_now() -> String {
    chrono::Utc::now().to_rfc3339()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use super::*;

    #[test]
    fn version_is_semver() {
        let v = version();
        let parts: Vec<&str> = v.split('.').collect();
        assert_eq!(parts.len(), 3, "version should have 3 parts: {v}");
        for part in parts {
            part.parse::<u32>().expect("each part should be a number");
        }
    }

    fn valid_line_doc() -> Vec<u8> {
        br#"<PublicationDelivery xmlns="http://www.netex.org.uk/netex" version="1.15">
            <PublicationTimestamp>2023-01-01T12:00:00</PublicationTimestamp>
            <ParticipantRef>TEST</ParticipantRef>
            <dataObjects>
                <Line id="TEST:Line:1" version="1">
                    <Name>Test</Name>
                    <TransportMode>bus</TransportMode>
                    <TransportSubmode>localBus</TransportSubmode>
                    <OperatorRef ref="TEST:Operator:1" version="1"/>
                </Line>
            </dataObjects>
        </PublicationDelivery>"#
            .to_vec()
    }

    fn no_network_options() -> ValidationOptions {
        let mut options = ValidationOptions::default();
        options.codespace = "TEST".to_owned();
        options.allow_schema_network = false;
        options.validation_cache.enabled = false;
        options
    }

    #[test]
    fn validate_content_minimal_valid_has_no_errors() {
        let options = no_network_options();
        let report = validate_content(&valid_line_doc(), "line.xml", &options);
        assert!(
            !report.has_errors(),
            "unexpected errors: {:#?}",
            report.entries_with_severity(Severity::Error).collect::<Vec<_>>()
        );
    }

    #[test]
    fn validate_content_missing_name_and_mode_flags_two_rules() {
        let xml = br#"<PublicationDelivery xmlns="http://www.netex.org.uk/netex" version="1.15">
            <PublicationTimestamp>2023-01-01T12:00:00</PublicationTimestamp>
            <ParticipantRef>TEST</ParticipantRef>
            <dataObjects><Line id="TEST:Line:1" version="1"/></dataObjects>
        </PublicationDelivery>"#;
        let options = no_network_options();
        let report = validate_content(xml, "line.xml", &options);
        assert!(report.entries.iter().any(|e| e.code == "LINE_2"));
        assert!(report.entries.iter().any(|e| e.code == "LINE_4"));
        assert_eq!(report.entries.iter().filter(|e| e.code == "LINE_2").count(), 1);
        assert_eq!(report.entries.iter().filter(|e| e.code == "LINE_4").count(), 1);
    }

    #[test]
    fn validate_file_missing_path_is_report_level_error() {
        let options = no_network_options();
        let report = validate_file(Path::new("/does/not/exist-for-sure.xml"), &options);
        assert!(report.error.is_some());
        assert!(report.entries.is_empty());
    }

    #[test]
    fn validate_zip_malformed_archive_is_report_level_error() {
        let dir = std::env::temp_dir();
        let path = dir.join("netex-validator-core-not-a-zip.zip");
        std::fs::write(&path, b"not a zip file").expect("write temp file");
        let options = no_network_options();
        let report = validate_zip(&path, &options);
        let _ = std::fs::remove_file(&path);
        assert!(report.error.is_some());
    }
}
