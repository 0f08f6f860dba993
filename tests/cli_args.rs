// tests/cli_args.rs

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use codefarm::cli::{CliArgs, LogLevel};
use codefarm::logging::resolve_level;

#[test]
fn parses_lesson_grading_invocation() {
    let args = CliArgs::try_parse_from([
        "codefarm",
        "--config",
        "farm.toml",
        "--lesson",
        "2",
        "--timeout",
        "500ms",
        "--json",
        "solution.py",
    ])
    .unwrap();

    assert_eq!(args.config, Some(PathBuf::from("farm.toml")));
    assert_eq!(args.lesson, Some(2));
    assert_eq!(args.timeout, Some(Duration::from_millis(500)));
    assert!(args.json);
    assert_eq!(args.file, Some(PathBuf::from("solution.py")));
}

#[test]
fn defaults_read_stdin_without_a_config() {
    let args = CliArgs::try_parse_from(["codefarm", "--tests", "True"]).unwrap();

    assert_eq!(args.config, None);
    assert_eq!(args.tests.as_deref(), Some("True"));
    assert_eq!(args.file, None);
    assert!(!args.dry_run);
    assert!(!args.list_lessons);
}

#[test]
fn lesson_and_tests_are_mutually_exclusive() {
    let result = CliArgs::try_parse_from(["codefarm", "--lesson", "1", "--tests", "True"]);
    assert!(result.is_err());
}

#[test]
fn rejects_malformed_timeout() {
    assert!(CliArgs::try_parse_from(["codefarm", "--timeout", "soon"]).is_err());
}

#[test]
fn log_level_flag_wins_over_environment() {
    assert_eq!(
        resolve_level(Some(LogLevel::Debug), Some("error")),
        tracing::Level::DEBUG
    );
    assert_eq!(resolve_level(None, Some(" Warning ")), tracing::Level::WARN);
    assert_eq!(resolve_level(None, Some("nonsense")), tracing::Level::INFO);
    assert_eq!(resolve_level(None, None), tracing::Level::INFO);
}
