/// Report formatting: human-readable and JSON modes.
///
/// - **Human mode** (default): one line per finding, color-coded by
///   severity, written to stderr. Colors are disabled when `--no-color` is
///   set, the `NO_COLOR` environment variable is present
///   (<https://no-color.org>), or stderr is not a TTY.
/// - **JSON mode**: the whole [`ValidationReport`] is serialized as one
///   JSON object to stdout.
///
/// Both modes honor **quiet** (suppress non-error findings and per-finding
/// lines, print only the summary) and **verbose** (add per-rule counts and
/// timing to the summary).
use std::io::{self, IsTerminal as _, Write};

use netex_validator_core::report::{Severity, ValidationReport, ValidationReportEntry};

// ---------------------------------------------------------------------------
// Color support detection
// ---------------------------------------------------------------------------

/// Returns `true` if ANSI color codes should be emitted to stderr.
pub fn colors_enabled(no_color_flag: bool) -> bool {
    if no_color_flag {
        return false;
    }
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    std::io::stderr().is_terminal()
}

const ANSI_RED: &str = "\x1b[31m";
const ANSI_MAGENTA: &str = "\x1b[35m";
const ANSI_YELLOW: &str = "\x1b[33m";
const ANSI_CYAN: &str = "\x1b[36m";
const ANSI_RESET: &str = "\x1b[0m";

fn severity_tag(severity: Severity) -> &'static str {
    match severity {
        Severity::Critical => "[C]",
        Severity::Error => "[E]",
        Severity::Warning => "[W]",
        Severity::Info => "[I]",
    }
}

fn severity_color(severity: Severity) -> &'static str {
    match severity {
        Severity::Critical => ANSI_MAGENTA,
        Severity::Error => ANSI_RED,
        Severity::Warning => ANSI_YELLOW,
        Severity::Info => ANSI_CYAN,
    }
}

/// Configuration for the report formatter, derived from CLI flags.
#[derive(Debug, Clone)]
pub struct FormatterConfig {
    pub colors: bool,
    pub quiet: bool,
    pub verbose: bool,
}

impl FormatterConfig {
    pub fn from_flags(no_color_flag: bool, quiet: bool, verbose: bool) -> Self {
        Self {
            colors: colors_enabled(no_color_flag),
            quiet,
            verbose,
        }
    }
}

/// Writes a single [`ValidationReportEntry`] to `writer` in human-readable
/// format: `[E] LINE_2  line.xml:12  //Line: missing required Name element`.
pub fn write_entry(writer: &mut impl Write, entry: &ValidationReportEntry, config: &FormatterConfig) -> io::Result<()> {
    if config.quiet && entry.severity < Severity::Error {
        return Ok(());
    }

    let tag = severity_tag(entry.severity);
    let location = if entry.location.line_number > 0 {
        format!("{}:{}", entry.location.file_name, entry.location.line_number)
    } else {
        entry.location.file_name.clone()
    };

    if config.colors {
        let color = severity_color(entry.severity);
        writeln!(writer, "{color}{tag}{ANSI_RESET} {}  {location}: {}", entry.code, entry.message)
    } else {
        writeln!(writer, "{tag} {}  {location}: {}", entry.code, entry.message)
    }
}

/// Writes the summary line: counts by severity, and (verbose) per-rule
/// counts and processing time.
pub fn write_summary(writer: &mut impl Write, report: &ValidationReport, config: &FormatterConfig) -> io::Result<()> {
    let critical = count(report, Severity::Critical);
    let errors = count(report, Severity::Error);
    let warnings = count(report, Severity::Warning);
    let infos = count(report, Severity::Info);

    writeln!(
        writer,
        "{} file(s), {critical} critical, {errors} error(s), {warnings} warning(s), {infos} info",
        report.files_processed
    )?;

    if config.verbose {
        writeln!(writer, "processing time: {} ms", report.processing_time_ms)?;
        for (code, count) in &report.count_per_rule {
            writeln!(writer, "  {code}: {count}")?;
        }
    }

    Ok(())
}

fn count(report: &ValidationReport, severity: Severity) -> usize {
    report.entries_with_severity(severity).count()
}

/// Serializes the whole report as a single pretty-printed JSON object.
///
/// # Errors
///
/// Propagates `serde_json`'s error if the report somehow fails to serialize
/// (it never should — every field is a plain owned type).
pub fn write_json_report(writer: &mut impl Write, report: &ValidationReport) -> serde_json::Result<()> {
    serde_json::to_writer_pretty(writer, report)
}
