#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::PathBuf;

use codefarm::config::{ConfigFile, LessonConfig, RawConfigFile, SandboxSection};
use codefarm::grading::Lesson;
use codefarm::types::LessonId;

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                sandbox: SandboxSection::default(),
                lesson: BTreeMap::new(),
            },
        }
    }

    pub fn with_lesson(mut self, id: LessonId, lesson: LessonConfig) -> Self {
        self.config.lesson.insert(id.to_string(), lesson);
        self
    }

    pub fn with_interpreter(mut self, interpreter: &str) -> Self {
        self.config.sandbox.interpreter = interpreter.to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: &str) -> Self {
        self.config.sandbox.timeout = timeout.to_string();
        self
    }

    pub fn with_max_output_bytes(mut self, bytes: usize) -> Self {
        self.config.sandbox.max_output_bytes = bytes;
        self
    }

    pub fn with_work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.sandbox.work_dir = Some(dir.into());
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `LessonConfig`.
pub struct LessonConfigBuilder {
    lesson: LessonConfig,
}

impl LessonConfigBuilder {
    pub fn new(title: &str, tests: &str) -> Self {
        Self {
            lesson: LessonConfig {
                title: title.to_string(),
                task: String::new(),
                initial_code: String::new(),
                tests: tests.to_string(),
                timeout: None,
            },
        }
    }

    pub fn task(mut self, task: &str) -> Self {
        self.lesson.task = task.to_string();
        self
    }

    pub fn initial_code(mut self, code: &str) -> Self {
        self.lesson.initial_code = code.to_string();
        self
    }

    pub fn timeout(mut self, timeout: &str) -> Self {
        self.lesson.timeout = Some(timeout.to_string());
        self
    }

    pub fn build(self) -> LessonConfig {
        self.lesson
    }
}

/// A validated-looking `Lesson` for catalogs built directly in tests.
pub fn lesson(id: LessonId, title: &str, tests: &str) -> Lesson {
    Lesson {
        id,
        title: title.to_string(),
        task: String::new(),
        initial_code: String::new(),
        tests: tests.to_string(),
        timeout: None,
    }
}
