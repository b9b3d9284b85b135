//! Argument parsing tests.

use crate::Cli;
use crate::commands::{ArtifactoryCommands, Commands, MetricsCommands};
use crate::config::OutputFormat;
use clap::Parser;
use pretty_assertions::assert_eq;
use std::path::PathBuf;

#[test]
fn test_matrix_defaults() {
    let cli = Cli::try_parse_from([
        "sslci",
        "matrix",
        "--source-repo",
        "openssl/openssl",
        "--source-sha",
        "abc123",
        "--build-scope",
        "provider",
    ])
    .unwrap();

    let Commands::Matrix(args) = cli.command else {
        panic!("expected matrix command");
    };
    assert_eq!(args.core_changes, "0");
    assert_eq!(args.provider_changes, "0");
    assert_eq!(args.output_format, None);
    assert_eq!(args.output_file, None);
}

#[test]
fn test_matrix_accepts_negative_counts_for_validation() {
    let cli = Cli::try_parse_from([
        "sslci",
        "matrix",
        "--source-repo",
        "r",
        "--source-sha",
        "s",
        "--build-scope",
        "full",
        "--core-changes",
        "-1",
        "--output-format",
        "yaml",
    ])
    .unwrap();

    let Commands::Matrix(args) = cli.command else {
        panic!("expected matrix command");
    };
    assert_eq!(args.core_changes, "-1");
    assert_eq!(args.output_format, Some(OutputFormat::Yaml));
    assert!(sslci_core::ChangeCounts::parse(&args.core_changes, "0", "0", "0").is_err());
}

#[test]
fn test_matrix_rejects_unknown_format() {
    let result = Cli::try_parse_from([
        "sslci",
        "matrix",
        "--source-repo",
        "r",
        "--source-sha",
        "s",
        "--build-scope",
        "full",
        "--output-format",
        "toml",
    ]);
    assert!(result.is_err());
}

#[test]
fn test_artifactory_connection_after_subcommand() {
    let cli = Cli::try_parse_from([
        "sslci",
        "artifactory",
        "cleanup",
        "--retention-days",
        "14",
        "--url",
        "https://artifacts.example.com",
        "--username",
        "ci",
        "--password",
        "secret",
    ])
    .unwrap();

    let Commands::Artifactory {
        connection,
        command,
    } = cli.command
    else {
        panic!("expected artifactory command");
    };
    assert_eq!(connection.url.as_deref(), Some("https://artifacts.example.com"));
    assert!(matches!(
        command,
        ArtifactoryCommands::Cleanup { retention_days: 14 }
    ));
}

#[test]
fn test_metrics_collect_trailing_command() {
    let cli = Cli::try_parse_from([
        "sslci",
        "metrics",
        "collect",
        "--build-id",
        "42",
        "--source-repo",
        "openssl/openssl",
        "--source-sha",
        "abc",
        "--platform",
        "ubuntu-22.04",
        "--profile",
        "linux-gcc-release",
        "--build-scope",
        "full",
        "--output",
        "metrics.json",
        "--artifact",
        "libssl.so",
        "--artifact",
        "libcrypto.so",
        "--",
        "make",
        "-j8",
    ])
    .unwrap();

    let Commands::Metrics {
        command: MetricsCommands::Collect(args),
    } = cli.command
    else {
        panic!("expected metrics collect");
    };
    assert_eq!(args.command, vec!["make".to_string(), "-j8".to_string()]);
    assert_eq!(args.phase, "compile");
    assert_eq!(
        args.artifacts,
        vec![PathBuf::from("libssl.so"), PathBuf::from("libcrypto.so")]
    );
}

#[test]
fn test_metrics_collect_requires_command() {
    let result = Cli::try_parse_from([
        "sslci",
        "metrics",
        "collect",
        "--build-id",
        "42",
        "--source-repo",
        "r",
        "--source-sha",
        "s",
        "--platform",
        "p",
        "--profile",
        "q",
        "--build-scope",
        "full",
        "--output",
        "m.json",
    ]);
    assert!(result.is_err());
}
