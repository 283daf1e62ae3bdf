//! Clap CLI definition: root struct, subcommand, and shared argument types.
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Output format for the `validate` command's summary.
///
/// `Human` emits colored, line-oriented diagnostics to stderr. `Json` emits
/// a single JSON report object to stdout.
#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable, optionally colored output (default).
    #[default]
    Human,
    /// A single structured JSON report object.
    Json,
}

/// Validates a NetEX document or dataset against the EU NeTEx Profile.
#[derive(Parser)]
#[command(name = "netex-validator", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Disable ANSI color in human-mode output.
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Suppress non-error diagnostics; print only the summary line.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Emit extra diagnostic detail (rule counts, timing).
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// All top-level subcommands exposed by the `netex-validator` binary.
#[derive(Subcommand)]
pub enum Command {
    /// Validate a single XML document or a ZIP archive of a dataset.
    Validate {
        /// Path to an `.xml` document or a `.zip` dataset archive.
        #[arg(value_name = "PATH")]
        path: PathBuf,

        /// Organizational codespace reported in the output (reporting only).
        #[arg(long, default_value = "")]
        codespace: String,

        /// Rule profile to apply (`eu` is the only recognized value besides
        /// `all`, which keeps every built-in rule).
        #[arg(long, default_value = "eu")]
        profile: String,

        /// Skip XSD schema validation entirely.
        #[arg(long)]
        skip_schema: bool,

        /// Skip XPath rule evaluation entirely.
        #[arg(long)]
        skip_xpath_rules: bool,

        /// Forbid network access when a schema is not already cached.
        #[arg(long)]
        no_network: bool,

        /// Stop recording findings once this many have been produced for a
        /// single file (`0` = unlimited).
        #[arg(long, default_value_t = 0)]
        max_findings: u32,

        /// Output format for the final report.
        #[arg(long, value_enum, default_value_t = OutputFormat::Human)]
        format: OutputFormat,
    },
}

#[cfg(test)]
mod tests;
