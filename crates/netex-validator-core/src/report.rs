//! Report-facing data model: severities, locations, findings, and the
//! immutable report an engine run produces.
//!
//! These types cross the boundary into the (out-of-scope) rendering layer,
//! so the report-facing ones derive `Serialize` — the core never renders
//! JSON/HTML itself, it only hands over a data shape that can be rendered.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

/// Ordered validation severity. `INFO < WARNING < ERROR < CRITICAL`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Info,
    Warning,
    Error,
    Critical,
}

impl Severity {
    /// `true` for `Error` and `Critical`.
    pub fn is_error_or_worse(self) -> bool {
        self >= Severity::Error
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Info => "INFO",
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
            Severity::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lightweight copy of a rule's identity, carried on every `Finding` so the
/// finding remains meaningful without a live reference to the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleMeta {
    pub code: String,
    pub name: String,
    pub message: String,
    pub severity: Severity,
}

/// Where a finding points: file, line, the XPath that matched, and the
/// nearest enclosing element's id, when known. Any field may be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DataLocation {
    pub file_name: String,
    pub line_number: u32,
    pub xpath: String,
    pub element_id: String,
}

impl DataLocation {
    pub fn for_file(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            ..Self::default()
        }
    }
}

/// A single validation observation produced by a rule or a cross-file check.
#[derive(Debug, Clone, Serialize)]
pub struct Finding {
    pub rule: RuleMeta,
    pub location: DataLocation,
    pub message: String,
}

impl Finding {
    pub fn new(rule: RuleMeta, location: DataLocation) -> Self {
        let message = rule.message.clone();
        Self {
            rule,
            location,
            message,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }
}

/// A finding flattened into the shape the Result Aggregator emits.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationReportEntry {
    pub code: String,
    pub name: String,
    pub message: String,
    pub severity: Severity,
    pub file_name: String,
    pub location: DataLocation,
}

impl From<Finding> for ValidationReportEntry {
    fn from(f: Finding) -> Self {
        Self {
            code: f.rule.code,
            name: f.rule.name,
            message: f.message,
            severity: f.rule.severity,
            file_name: f.location.file_name.clone(),
            location: f.location,
        }
    }
}

/// The immutable, final report of a validation run.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub codespace: String,
    pub report_id: String,
    pub creation_time: String,
    pub entries: Vec<ValidationReportEntry>,
    pub count_per_rule: BTreeMap<String, u64>,
    pub error: Option<String>,
    /// Wall-clock time the run took, for the external report's
    /// `summary.processingTime` (`spec.md` §6). `0` if never set.
    pub processing_time_ms: u64,
    pub files_processed: usize,
}

impl ValidationReport {
    /// `true` when any entry has severity `Error` or `Critical`.
    pub fn has_errors(&self) -> bool {
        self.entries
            .iter()
            .any(|e| e.severity.is_error_or_worse())
    }

    pub fn entries_with_severity(&self, severity: Severity) -> impl Iterator<Item = &ValidationReportEntry> {
        self.entries.iter().filter(move |e| e.severity == severity)
    }

    pub fn total_issues(&self) -> usize {
        self.entries.len()
    }
}

/// Accumulates findings across files and cross-file passes, then produces an
/// immutable [`ValidationReport`]. Ordering follows `spec.md` §5: phase, then
/// filename ascending, then emission order — callers append in that order
/// and the aggregator does not re-sort.
#[derive(Debug, Default)]
pub struct ReportAggregator {
    entries: Vec<ValidationReportEntry>,
}

impl ReportAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend(&mut self, findings: impl IntoIterator<Item = Finding>) {
        self.entries
            .extend(findings.into_iter().map(ValidationReportEntry::from));
    }

    pub fn push(&mut self, entry: ValidationReportEntry) {
        self.entries.push(entry);
    }

    pub fn extend_entries(&mut self, entries: impl IntoIterator<Item = ValidationReportEntry>) {
        self.entries.extend(entries);
    }

    /// Finishes the report with `processing_time_ms` and `files_processed`
    /// both set to `0` — for callers (tests, single-document paths before
    /// timing is known) that do not track wall-clock time or file counts.
    pub fn finish(
        self,
        codespace: impl Into<String>,
        report_id: impl Into<String>,
        creation_time: impl Into<String>,
        error: Option<String>,
    ) -> ValidationReport {
        self.finish_with_meta(codespace, report_id, creation_time, error, 0, 0)
    }

    /// Finishes the report, also recording the wall-clock time the run took
    /// and the number of files processed, for the external report's
    /// `summary.processingTime`/`summary.filesProcessed` (`spec.md` §6).
    pub fn finish_with_meta(
        self,
        codespace: impl Into<String>,
        report_id: impl Into<String>,
        creation_time: impl Into<String>,
        error: Option<String>,
        processing_time_ms: u64,
        files_processed: usize,
    ) -> ValidationReport {
        let mut count_per_rule: BTreeMap<String, u64> = BTreeMap::new();
        for entry in &self.entries {
            *count_per_rule.entry(entry.code.clone()).or_insert(0) += 1;
        }
        ValidationReport {
            codespace: codespace.into(),
            report_id: report_id.into(),
            creation_time: creation_time.into(),
            entries: self.entries,
            count_per_rule,
            error,
            processing_time_ms,
            files_processed,
        }
    }
}
