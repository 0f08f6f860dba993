// src/grading/service.rs

use std::fmt;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::errors::{CodefarmError, Result};
use crate::sandbox::{Executor, ProcessLauncher};
use crate::types::LessonId;

use super::catalog::LessonCatalog;
use super::report::GradeReport;

/// Resolves lessons and runs submissions against their test expressions.
///
/// Holds no per-request state; share it behind an `Arc` across handlers.
pub struct GradingService<C: LessonCatalog, L: ProcessLauncher> {
    catalog: C,
    executor: Executor<L>,
    default_timeout: Duration,
}

impl<C: LessonCatalog, L: ProcessLauncher> fmt::Debug for GradingService<C, L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GradingService")
            .field("executor", &self.executor)
            .field("default_timeout", &self.default_timeout)
            .finish_non_exhaustive()
    }
}

impl<C: LessonCatalog, L: ProcessLauncher> GradingService<C, L> {
    pub fn new(catalog: C, executor: Executor<L>, default_timeout: Duration) -> Self {
        Self {
            catalog,
            executor,
            default_timeout,
        }
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    pub fn executor(&self) -> &Executor<L> {
        &self.executor
    }

    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    /// Grade `learner_code` against lesson `lesson_id`.
    ///
    /// The only error is an unknown lesson; every execution outcome,
    /// including sandbox failures, is reported inside the `GradeReport`.
    pub async fn execute_and_grade(
        &self,
        lesson_id: LessonId,
        learner_code: &str,
    ) -> Result<GradeReport> {
        let lesson = self
            .catalog
            .lesson(lesson_id)
            .ok_or(CodefarmError::LessonNotFound(lesson_id))?;

        let timeout = lesson.timeout.unwrap_or(self.default_timeout);
        debug!(
            lesson_id,
            title = %lesson.title,
            timeout_ms = timeout.as_millis() as u64,
            "grading submission"
        );

        let result = self
            .executor
            .execute(learner_code, &lesson.tests, timeout)
            .await;

        match result.error_kind {
            Some(kind) if kind.is_infrastructure() => {
                warn!(lesson_id, error_kind = %kind, "lesson could not be graded");
            }
            _ => info!(lesson_id, success = result.success, "lesson graded"),
        }
        Ok(GradeReport::from_result(&result, timeout))
    }

    /// Grade `learner_code` against an ad-hoc test expression.
    pub async fn grade_with_expression(
        &self,
        test_expression: &str,
        learner_code: &str,
        timeout: Option<Duration>,
    ) -> GradeReport {
        let timeout = timeout.unwrap_or(self.default_timeout);
        let result = self
            .executor
            .execute(learner_code, test_expression, timeout)
            .await;
        GradeReport::from_result(&result, timeout)
    }
}
