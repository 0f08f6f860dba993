// src/grading/catalog.rs

//! Lesson lookup.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Serialize;

use crate::config::ConfigFile;
use crate::types::LessonId;

/// One lesson as far as grading is concerned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Lesson {
    pub id: LessonId,
    pub title: String,
    pub task: String,
    pub initial_code: String,
    /// Test expression evaluated by the grading harness.
    pub tests: String,
    /// Overrides the sandbox's default deadline when set.
    #[serde(skip)]
    pub timeout: Option<Duration>,
}

/// Storage interface for lessons, chosen once at startup.
pub trait LessonCatalog: Send + Sync {
    fn lesson(&self, id: LessonId) -> Option<&Lesson>;

    /// All lessons ordered by id.
    fn lessons(&self) -> Vec<&Lesson>;
}

/// In-memory catalog, typically built from the `[lesson.<id>]` config tables.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    lessons: BTreeMap<LessonId, Lesson>,
}

impl StaticCatalog {
    pub fn new(lessons: BTreeMap<LessonId, Lesson>) -> Self {
        Self { lessons }
    }

    pub fn from_config(cfg: &ConfigFile) -> Self {
        Self::new(cfg.lessons.clone())
    }

    pub fn len(&self) -> usize {
        self.lessons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lessons.is_empty()
    }
}

impl FromIterator<Lesson> for StaticCatalog {
    fn from_iter<I: IntoIterator<Item = Lesson>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(|lesson| (lesson.id, lesson)).collect())
    }
}

impl LessonCatalog for StaticCatalog {
    fn lesson(&self, id: LessonId) -> Option<&Lesson> {
        self.lessons.get(&id)
    }

    fn lessons(&self) -> Vec<&Lesson> {
        self.lessons.values().collect()
    }
}
