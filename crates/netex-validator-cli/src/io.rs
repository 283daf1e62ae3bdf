/// Input-kind detection and dispatch to the validation engine.
///
/// The engine reads files itself (`validate_file`/`validate_zip` both take a
/// path), so this module's job is narrower than a teacher `io.rs`: decide
/// whether `path` names a ZIP dataset or a single XML document, pre-check
/// that it exists so a missing path reports `FileNotFound` rather than an
/// opaque report-level error, and dispatch accordingly.
use std::path::Path;

use netex_validator_core::{ValidationOptions, report::ValidationReport};

use crate::error::CliError;

/// Validates `path`, treating a `.zip` extension (case-insensitive) as a
/// dataset archive and anything else as a single XML document.
pub fn validate_path(path: &Path, options: &ValidationOptions) -> Result<ValidationReport, CliError> {
    if let Err(err) = std::fs::metadata(path) {
        return Err(CliError::from_io(&err, path));
    }

    let is_zip = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("zip"))
        .unwrap_or(false);

    let report = if is_zip {
        netex_validator_core::validate_zip(path, options)
    } else {
        netex_validator_core::validate_file(path, options)
    };

    if let Some(detail) = &report.error {
        return Err(CliError::ReportLevelError { detail: detail.clone() });
    }

    Ok(report)
}
