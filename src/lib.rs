// src/lib.rs

pub mod cli;
pub mod config;
pub mod errors;
pub mod grading;
pub mod logging;
pub mod sandbox;
pub mod types;

use std::path::Path;

use anyhow::{Context, Result, bail};
use tokio::io::AsyncReadExt;
use tracing::debug;

use crate::cli::CliArgs;
use crate::config::{ConfigFile, load_or_default};
use crate::errors::CodefarmError;
use crate::grading::{GradeReport, GradingService, LessonCatalog, StaticCatalog};
use crate::sandbox::wrapper::normalize_source;
use crate::sandbox::{
    Executor, HarnessParams, WrappedProgram, validate, validate_test_expression,
};

/// High-level entry point used by `main.rs`.
///
/// Returns whether the submission passed (always `true` for the
/// informational modes), which `main` turns into the exit code.
pub async fn run(args: CliArgs) -> Result<bool> {
    let cfg = load_or_default(args.config.as_deref())?;

    if args.list_lessons {
        print_lessons(&cfg);
        return Ok(true);
    }

    let code = read_submission(args.file.as_deref()).await?;
    let catalog = StaticCatalog::from_config(&cfg);

    let test_expression = match (&args.tests, args.lesson) {
        (Some(expr), _) => expr.clone(),
        (None, Some(id)) => catalog
            .lesson(id)
            .ok_or(CodefarmError::LessonNotFound(id))?
            .tests
            .clone(),
        (None, None) => bail!("nothing to grade against: pass --lesson ID or --tests EXPR"),
    };

    if args.dry_run {
        return Ok(print_dry_run(&cfg, &code, &test_expression));
    }

    let executor = Executor::new(cfg.sandbox.launcher(), cfg.sandbox.settings());
    let service = GradingService::new(catalog, executor, cfg.sandbox.timeout);

    let report = match (args.lesson, args.tests.is_some(), args.timeout) {
        (Some(id), false, None) => service.execute_and_grade(id, &code).await?,
        _ => {
            service
                .grade_with_expression(&test_expression, &code, args.timeout)
                .await
        }
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    Ok(report.success)
}

async fn read_submission(file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) if path != Path::new("-") => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read submission from {}", path.display())),
        _ => {
            let mut code = String::new();
            tokio::io::stdin()
                .read_to_string(&mut code)
                .await
                .context("failed to read submission from stdin")?;
            Ok(code)
        }
    }
}

fn print_lessons(cfg: &ConfigFile) {
    println!("lessons ({}):", cfg.lessons.len());
    for lesson in cfg.lessons.values() {
        println!("  - {}: {}", lesson.id, lesson.title);
        if !lesson.task.is_empty() {
            println!("      task: {}", lesson.task);
        }
        println!("      tests: {}", lesson.tests);
        if let Some(timeout) = lesson.timeout {
            println!("      timeout: {timeout:?}");
        }
    }
}

/// Print the harness that would run, or the syntax error that stops it.
fn print_dry_run(cfg: &ConfigFile, code: &str, test_expression: &str) -> bool {
    let code = normalize_source(code);
    if let Err(detail) = validate(&code) {
        println!("Syntax error: {detail}");
        return false;
    }
    if let Err(detail) = validate_test_expression(test_expression) {
        println!("Invalid test expression: {detail}");
        return false;
    }

    let params = HarnessParams::fresh(cfg.sandbox.max_echo_chars);
    let program = WrappedProgram::render(&code, test_expression, &params);
    print!("{}", program.source());

    debug!("dry-run complete (no execution)");
    true
}

fn print_report(report: &GradeReport) {
    print!("{}", report.output);
    if !report.output.is_empty() && !report.output.ends_with('\n') {
        println!();
    }
    if report.success {
        println!("PASS");
    } else {
        println!("FAIL: {}", report.error);
    }
}
