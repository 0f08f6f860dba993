// src/grading/mod.rs

//! Boundary between the sandbox and the web layer that calls it.
//!
//! The route handler resolves nothing itself: it hands a lesson id and the
//! learner's code to [`GradingService::execute_and_grade`] and gets back a
//! [`GradeReport`]. Recording progress and applying the farm update on
//! success stay with the caller.

pub mod catalog;
pub mod report;
pub mod service;

pub use catalog::{Lesson, LessonCatalog, StaticCatalog};
pub use report::GradeReport;
pub use service::GradingService;
