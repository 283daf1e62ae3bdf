/// CLI error types with associated exit codes.
///
/// [`CliError`] is the top-level error type for the `netex-validator`
/// binary. Every variant maps to a stable exit code via
/// [`CliError::exit_code`]:
///
/// - Exit code **2** — input failure: the tool could not read, open, or
///   parse the input at all. These errors terminate early before any
///   validation runs.
/// - Exit code **1** — the tool ran to completion and the resulting report
///   has at least one `ERROR`-or-worse finding.
use std::fmt;
use std::path::PathBuf;

/// All error conditions that the `netex-validator` CLI can produce.
#[derive(Debug)]
pub enum CliError {
    /// A file or archive argument could not be found on the filesystem.
    FileNotFound {
        /// The path that was not found.
        path: PathBuf,
    },

    /// The process lacks permission to read a file.
    PermissionDenied {
        /// The path that could not be read.
        path: PathBuf,
    },

    /// A generic I/O error not covered by the more specific variants above.
    IoError {
        /// A human-readable label for the source.
        source: String,
        /// The underlying I/O error message.
        detail: String,
    },

    /// The report's `error` field was set — parsing/acquisition failed
    /// inside the engine itself (malformed ZIP, unreadable archive member).
    ReportLevelError {
        /// The message carried on `ValidationReport.error`.
        detail: String,
    },

    /// The report completed with at least one `ERROR`-or-worse finding.
    ///
    /// The findings have already been printed; this variant exists so
    /// `main` can exit with code 1.
    ValidationErrors,
}

impl CliError {
    /// Returns the process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::FileNotFound { .. } | Self::PermissionDenied { .. } | Self::IoError { .. } | Self::ReportLevelError { .. } => 2,
            Self::ValidationErrors => 1,
        }
    }

    /// Returns a human-readable error message suitable for printing to stderr.
    pub fn message(&self) -> String {
        match self {
            Self::FileNotFound { path } => format!("error: file not found: {}", path.display()),
            Self::PermissionDenied { path } => format!("error: permission denied: {}", path.display()),
            Self::IoError { source, detail } => format!("error: I/O error reading {source}: {detail}"),
            Self::ReportLevelError { detail } => format!("error: {detail}"),
            Self::ValidationErrors => "error: validation failed with one or more errors".to_owned(),
        }
    }

    /// Maps a [`std::io::Error`] encountered while opening `path` to the
    /// appropriate variant.
    pub fn from_io(err: &std::io::Error, path: &std::path::Path) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::FileNotFound { path: path.to_path_buf() },
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { path: path.to_path_buf() },
            _ => Self::IoError {
                source: path.display().to_string(),
                detail: err.to_string(),
            },
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

impl std::error::Error for CliError {}
