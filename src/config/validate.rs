// src/config/validate.rs

use std::collections::BTreeMap;
use std::time::Duration;

use crate::config::model::{ConfigFile, LessonConfig, RawConfigFile, SandboxConfig, SandboxSection};
use crate::errors::{CodefarmError, Result};
use crate::grading::Lesson;
use crate::sandbox::validate_test_expression;
use crate::types::{LessonId, parse_duration};

/// Shortest accepted execution deadline.
pub const MIN_TIMEOUT: Duration = Duration::from_millis(1);

/// Longest accepted execution deadline.
pub const MAX_TIMEOUT: Duration = Duration::from_secs(10 * 60);

/// Smallest accepted per-stream capture cap.
pub const MIN_OUTPUT_BYTES: usize = 1024;

/// Banner, marker line and truncation note, in bytes.
const FOOTER_OVERHEAD_BYTES: usize = 512;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::CodefarmError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        let sandbox = validate_sandbox(&raw.sandbox)?;
        let lessons = validate_lessons(&raw.lesson)?;
        Ok(ConfigFile::new_unchecked(sandbox, lessons))
    }
}

/// Run every check without building the validated config.
pub fn validate_config(cfg: &RawConfigFile) -> Result<()> {
    validate_sandbox(&cfg.sandbox)?;
    validate_lessons(&cfg.lesson)?;
    Ok(())
}

fn validate_sandbox(section: &SandboxSection) -> Result<SandboxConfig> {
    if section.interpreter.trim().is_empty() {
        return Err(CodefarmError::ConfigError(
            "[sandbox].interpreter must not be empty".to_string(),
        ));
    }

    let timeout = parse_timeout(&section.timeout, "[sandbox].timeout")?;

    if section.max_output_bytes < MIN_OUTPUT_BYTES {
        return Err(CodefarmError::ConfigError(format!(
            "[sandbox].max_output_bytes must be >= {} (got {})",
            MIN_OUTPUT_BYTES, section.max_output_bytes
        )));
    }

    if section.max_echo_chars == 0 {
        return Err(CodefarmError::ConfigError(
            "[sandbox].max_echo_chars must be >= 1 (got 0)".to_string(),
        ));
    }

    // The echo and the error line are each capped at `max_echo_chars`
    // characters of up to 4 UTF-8 bytes; the marker line comes after them
    // and must not fall past the capture cap.
    let footer_bytes = section
        .max_echo_chars
        .saturating_mul(8)
        .saturating_add(FOOTER_OVERHEAD_BYTES);
    if section.max_output_bytes < footer_bytes {
        return Err(CodefarmError::ConfigError(format!(
            "[sandbox].max_output_bytes ({}) cannot hold a results footer echoing {} characters (needs >= {})",
            section.max_output_bytes, section.max_echo_chars, footer_bytes
        )));
    }

    Ok(SandboxConfig {
        interpreter: section.interpreter.trim().to_string(),
        timeout,
        max_output_bytes: section.max_output_bytes,
        max_echo_chars: section.max_echo_chars,
        work_dir: section.work_dir.clone(),
    })
}

fn validate_lessons(raw: &BTreeMap<String, LessonConfig>) -> Result<BTreeMap<LessonId, Lesson>> {
    let mut lessons = BTreeMap::new();

    for (key, lesson) in raw.iter() {
        let id = parse_lesson_id(key)?;

        if lesson.title.trim().is_empty() {
            return Err(CodefarmError::ConfigError(format!(
                "lesson '{}' has an empty title",
                key
            )));
        }

        if let Err(detail) = validate_test_expression(&lesson.tests) {
            return Err(CodefarmError::ConfigError(format!(
                "lesson '{}' has an invalid `tests` expression ({})",
                key, detail
            )));
        }

        let timeout = lesson
            .timeout
            .as_deref()
            .map(|t| parse_timeout(t, &format!("lesson '{}' timeout", key)))
            .transpose()?;

        if lessons
            .insert(
                id,
                Lesson {
                    id,
                    title: lesson.title.clone(),
                    task: lesson.task.clone(),
                    initial_code: lesson.initial_code.clone(),
                    tests: lesson.tests.trim().to_string(),
                    timeout,
                },
            )
            .is_some()
        {
            return Err(CodefarmError::ConfigError(format!(
                "lesson id {} is defined more than once",
                id
            )));
        }
    }

    Ok(lessons)
}

fn parse_lesson_id(key: &str) -> Result<LessonId> {
    match key.trim().parse::<LessonId>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(CodefarmError::ConfigError(format!(
            "lesson key '{}' must be a positive integer",
            key
        ))),
    }
}

fn parse_timeout(value: &str, what: &str) -> Result<Duration> {
    let timeout = parse_duration(value)
        .map_err(|e| CodefarmError::ConfigError(format!("{}: {}", what, e)))?;

    if timeout < MIN_TIMEOUT || timeout > MAX_TIMEOUT {
        return Err(CodefarmError::ConfigError(format!(
            "{} must be between {:?} and {:?} (got {:?})",
            what, MIN_TIMEOUT, MAX_TIMEOUT, timeout
        )));
    }

    Ok(timeout)
}
