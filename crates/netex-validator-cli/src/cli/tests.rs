use std::path::PathBuf;

use clap::Parser;

use super::*;

fn parse(args: &[&str]) -> Cli {
    let mut full = vec!["netex-validator"];
    full.extend_from_slice(args);
    Cli::parse_from(full)
}

#[test]
fn validate_requires_a_path() {
    let result = Cli::try_parse_from(["netex-validator", "validate"]);
    assert!(result.is_err());
}

#[test]
fn validate_minimal_invocation_uses_defaults() {
    let cli = parse(&["validate", "dataset.xml"]);
    let Command::Validate {
        path,
        codespace,
        profile,
        skip_schema,
        skip_xpath_rules,
        no_network,
        max_findings,
        format,
    } = cli.command;
    assert_eq!(path, PathBuf::from("dataset.xml"));
    assert_eq!(codespace, "");
    assert_eq!(profile, "eu");
    assert!(!skip_schema);
    assert!(!skip_xpath_rules);
    assert!(!no_network);
    assert_eq!(max_findings, 0);
    assert!(matches!(format, OutputFormat::Human));
}

#[test]
fn validate_accepts_all_flags() {
    let cli = parse(&[
        "validate",
        "dataset.zip",
        "--codespace",
        "FR",
        "--profile",
        "all",
        "--skip-schema",
        "--skip-xpath-rules",
        "--no-network",
        "--max-findings",
        "50",
        "--format",
        "json",
    ]);
    let Command::Validate {
        path,
        codespace,
        profile,
        skip_schema,
        skip_xpath_rules,
        no_network,
        max_findings,
        format,
    } = cli.command;
    assert_eq!(path, PathBuf::from("dataset.zip"));
    assert_eq!(codespace, "FR");
    assert_eq!(profile, "all");
    assert!(skip_schema);
    assert!(skip_xpath_rules);
    assert!(no_network);
    assert_eq!(max_findings, 50);
    assert!(matches!(format, OutputFormat::Json));
}

#[test]
fn global_flags_parse_before_or_after_subcommand() {
    let cli = parse(&["--no-color", "--quiet", "validate", "a.xml"]);
    assert!(cli.no_color);
    assert!(cli.quiet);
}

#[test]
fn verbose_flag_parses() {
    let cli = parse(&["validate", "a.xml", "--verbose"]);
    assert!(cli.verbose);
}
