//! Implementation of `netex-validator validate <path>`.
//!
//! Validates a single XML document or a ZIP dataset archive and renders the
//! resulting report, either as colored human-readable lines to stderr or as
//! a single JSON object to stdout.
//!
//! Exit codes:
//! - 0 = no `ERROR`-or-worse finding
//! - 1 = at least one `ERROR`-or-worse finding
//! - 2 = the input could not be read, opened, or parsed as a dataset at all
use std::path::Path;

use netex_validator_core::ValidationOptions;

use crate::OutputFormat;
use crate::error::CliError;
use crate::format::{FormatterConfig, write_entry, write_json_report, write_summary};
use crate::io;

/// Runs the `validate` command.
///
/// # Errors
///
/// - [`CliError::FileNotFound`] / [`CliError::PermissionDenied`] /
///   [`CliError::IoError`] — the path could not be opened.
/// - [`CliError::ReportLevelError`] — the engine itself reported a failure
///   (e.g. a malformed ZIP archive).
/// - [`CliError::ValidationErrors`] — the report has at least one
///   `ERROR`-or-worse finding.
pub fn run(path: &Path, options: &ValidationOptions, format: OutputFormat, quiet: bool, verbose: bool, no_color: bool) -> Result<(), CliError> {
    let report = io::validate_path(path, options)?;

    match format {
        OutputFormat::Json => {
            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            write_json_report(&mut out, &report).map_err(|e| CliError::IoError {
                source: "stdout".to_owned(),
                detail: e.to_string(),
            })?;
        }
        OutputFormat::Human => {
            let fmt_config = FormatterConfig::from_flags(no_color, quiet, verbose);
            let stderr = std::io::stderr();
            let mut err_out = stderr.lock();

            for entry in &report.entries {
                write_entry(&mut err_out, entry, &fmt_config).map_err(|e| CliError::IoError {
                    source: "stderr".to_owned(),
                    detail: e.to_string(),
                })?;
            }

            write_summary(&mut err_out, &report, &fmt_config).map_err(|e| CliError::IoError {
                source: "stderr".to_owned(),
                detail: e.to_string(),
            })?;
        }
    }

    if report.has_errors() {
        Err(CliError::ValidationErrors)
    } else {
        Ok(())
    }
}

/// Builds a [`ValidationOptions`] from the parsed CLI flags.
pub fn options_from_flags(codespace: &str, profile: &str, skip_schema: bool, skip_xpath_rules: bool, no_network: bool, max_findings: u32) -> ValidationOptions {
    let mut options = ValidationOptions::default();
    options.codespace = codespace.to_owned();
    options.profile = profile.to_owned();
    options.skip_schema = skip_schema;
    options.skip_xpath_rules = skip_xpath_rules;
    options.allow_schema_network = !no_network;
    options.max_findings = max_findings;
    options
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]
    #![allow(clippy::panic)]

    use std::io::Write as _;

    use super::*;

    fn valid_doc() -> &'static [u8] {
        br#"<PublicationDelivery xmlns="http://www.netex.org.uk/netex" version="1.15">
            <PublicationTimestamp>2023-01-01T00:00:00</PublicationTimestamp>
            <ParticipantRef>TEST</ParticipantRef>
            <dataObjects><Line id="T:Line:1" version="1"><Name>Test</Name><TransportMode>bus</TransportMode></Line></dataObjects>
        </PublicationDelivery>"#
    }

    fn invalid_doc() -> &'static [u8] {
        br#"<PublicationDelivery xmlns="http://www.netex.org.uk/netex" version="1.15">
            <PublicationTimestamp>2023-01-01T00:00:00</PublicationTimestamp>
            <ParticipantRef>TEST</ParticipantRef>
            <dataObjects><Line id="T:Line:1" version="1"/></dataObjects>
        </PublicationDelivery>"#
    }

    fn write_xml(contents: &[u8]) -> tempfile::NamedTempFile {
        let mut f = tempfile::Builder::new().suffix(".xml").tempfile().expect("tempfile");
        f.write_all(contents).expect("write");
        f
    }

    fn options() -> ValidationOptions {
        let mut options = options_from_flags("TEST", "eu", false, false, true, 0);
        options.validation_cache.enabled = false;
        options
    }

    #[test]
    fn options_from_flags_sets_network_from_no_network() {
        let options = options_from_flags("TEST", "eu", false, false, true, 0);
        assert!(!options.allow_schema_network);
    }

    #[test]
    fn run_valid_file_returns_ok() {
        let f = write_xml(valid_doc());
        let result = run(f.path(), &options(), OutputFormat::Human, false, false, true);
        assert!(result.is_ok(), "expected Ok: {result:?}");
    }

    #[test]
    fn run_invalid_file_returns_validation_errors() {
        let f = write_xml(invalid_doc());
        let result = run(f.path(), &options(), OutputFormat::Human, false, false, true);
        match result {
            Err(CliError::ValidationErrors) => {}
            other => panic!("expected ValidationErrors, got {other:?}"),
        }
    }

    #[test]
    fn run_missing_file_returns_exit_2_error() {
        let result = run(Path::new("/no/such/file.xml"), &options(), OutputFormat::Human, false, false, true);
        let err = result.expect_err("should fail");
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn run_json_format_valid_file_returns_ok() {
        let f = write_xml(valid_doc());
        let result = run(f.path(), &options(), OutputFormat::Json, false, false, true);
        assert!(result.is_ok());
    }
}
