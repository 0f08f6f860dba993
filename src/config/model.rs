// src/config/model.rs

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::grading::Lesson;
use crate::sandbox::{PythonLauncher, SandboxSettings};
use crate::types::LessonId;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [sandbox]
/// interpreter = "python3"
/// timeout = "10s"
/// max_output_bytes = 65536
///
/// [lesson.1]
/// title = "First program"
/// tests = "check_output_contains('Привет, АгроБот!')"
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    /// Sandbox limits from `[sandbox]`.
    #[serde(default)]
    pub sandbox: SandboxSection,

    /// All lessons from `[lesson.<id>]`.
    ///
    /// Keys are lesson ids as strings (`"1"`, `"2"`, ...); they are parsed
    /// during validation.
    #[serde(default)]
    pub lesson: BTreeMap<String, LessonConfig>,
}

/// `[sandbox]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct SandboxSection {
    /// Interpreter executable, looked up on `PATH` if not absolute.
    #[serde(default = "default_interpreter")]
    pub interpreter: String,

    /// Default wall-clock limit per execution, e.g. `"10s"`.
    #[serde(default = "default_timeout")]
    pub timeout: String,

    /// Cap on bytes captured from each of stdout and stderr.
    #[serde(default = "default_max_output_bytes")]
    pub max_output_bytes: usize,

    /// Cap on characters of learner output echoed in the results footer.
    #[serde(default = "default_max_echo_chars")]
    pub max_echo_chars: usize,

    /// Parent directory for per-execution artifacts.
    ///
    /// If `None`, the system temp directory is used.
    #[serde(default)]
    pub work_dir: Option<PathBuf>,
}

fn default_interpreter() -> String {
    "python3".to_string()
}

fn default_timeout() -> String {
    "10s".to_string()
}

fn default_max_output_bytes() -> usize {
    64 * 1024
}

fn default_max_echo_chars() -> usize {
    crate::sandbox::wrapper::DEFAULT_MAX_ECHO_CHARS
}

impl Default for SandboxSection {
    fn default() -> Self {
        Self {
            interpreter: default_interpreter(),
            timeout: default_timeout(),
            max_output_bytes: default_max_output_bytes(),
            max_echo_chars: default_max_echo_chars(),
            work_dir: None,
        }
    }
}

/// `[lesson.<id>]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct LessonConfig {
    pub title: String,

    /// What the learner is asked to do.
    #[serde(default)]
    pub task: String,

    /// Code pre-filled in the editor.
    #[serde(default)]
    pub initial_code: String,

    /// Test expression built from the grading primitives.
    pub tests: String,

    /// Optional per-lesson override of `[sandbox].timeout`.
    #[serde(default)]
    pub timeout: Option<String>,
}

/// Validated sandbox settings.
#[derive(Debug, Clone)]
pub struct SandboxConfig {
    pub interpreter: String,
    pub timeout: Duration,
    pub max_output_bytes: usize,
    pub max_echo_chars: usize,
    pub work_dir: Option<PathBuf>,
}

impl SandboxConfig {
    pub fn settings(&self) -> SandboxSettings {
        SandboxSettings {
            base_dir: self.work_dir.clone(),
            max_echo_chars: self.max_echo_chars,
        }
    }

    pub fn launcher(&self) -> PythonLauncher {
        PythonLauncher::new(self.interpreter.clone(), self.max_output_bytes)
    }
}

/// Validated configuration; build it with `ConfigFile::try_from(raw)`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub sandbox: SandboxConfig,
    pub lessons: BTreeMap<LessonId, Lesson>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(sandbox: SandboxConfig, lessons: BTreeMap<LessonId, Lesson>) -> Self {
        Self { sandbox, lessons }
    }
}
