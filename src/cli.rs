// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::types::{LessonId, parse_duration};

/// Command-line arguments for `codefarm`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "codefarm",
    version,
    about = "Check and grade a Python submission in a sandboxed interpreter.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `CodeFarm.toml` in the current working directory if it
    /// exists, otherwise built-in defaults with no lessons.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `CODEFARM_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Grade against this lesson's test expression.
    #[arg(long, value_name = "ID", conflicts_with = "tests")]
    pub lesson: Option<LessonId>,

    /// Grade against an ad-hoc test expression instead of a lesson.
    #[arg(long, value_name = "EXPR")]
    pub tests: Option<String>,

    /// Execution deadline, e.g. `500ms` or `10s`.
    ///
    /// Overrides both the lesson's and the sandbox's timeout.
    #[arg(long, value_name = "DURATION", value_parser = parse_duration)]
    pub timeout: Option<Duration>,

    /// Print the grade report as JSON.
    #[arg(long)]
    pub json: bool,

    /// Syntax-check and print the generated harness without running it.
    #[arg(long)]
    pub dry_run: bool,

    /// Print the configured lessons and exit.
    #[arg(long)]
    pub list_lessons: bool,

    /// Submission file; `-` or omitted reads stdin.
    #[arg(value_name = "FILE")]
    pub file: Option<PathBuf>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
