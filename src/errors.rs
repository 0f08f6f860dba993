// src/errors.rs

//! Crate-wide error types.
//!
//! `CodefarmError` is what the outer layers (config loading, lesson lookup,
//! the CLI) return. `SandboxError` stays inside the executor: it is always
//! turned into an `InternalError` result before it reaches a caller.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CodefarmError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Lesson not found: {0}")]
    LessonNotFound(u32),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Infrastructure failures while materialising or running a submission.
#[derive(Error, Debug)]
pub enum SandboxError {
    #[error("creating script artifact: {0}")]
    ArtifactCreate(#[source] std::io::Error),

    #[error("spawning interpreter '{program}' for {script:?}: {source}")]
    Spawn {
        program: String,
        script: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("waiting for interpreter process: {0}")]
    Wait(#[source] std::io::Error),

    #[error("capturing interpreter output: {0}")]
    Capture(#[source] std::io::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, CodefarmError>;
