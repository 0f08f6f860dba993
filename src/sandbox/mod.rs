// src/sandbox/mod.rs

//! Sandboxed execution and grading of learner submissions.
//!
//! Pipeline: [`validator`] rejects code that does not parse, [`wrapper`]
//! renders the grading harness around the submission, [`artifact`] puts it
//! on disk, a [`launcher::ProcessLauncher`] runs it under a deadline, and
//! [`executor`] turns whatever happened into an [`ExecutionResult`].
//!
//! - [`process`] holds `PythonLauncher`, the production launcher.
//! - [`result`] holds the result type handed back to callers.

pub mod artifact;
pub mod executor;
pub mod launcher;
pub mod process;
pub mod result;
pub mod validator;
pub mod wrapper;

pub use executor::{Executor, SandboxSettings, code_digest};
pub use launcher::{CapturedStream, LaunchRequest, ProcessLauncher, ProcessOutcome};
pub use process::PythonLauncher;
pub use result::ExecutionResult;
pub use validator::{SyntaxErrorDetail, validate, validate_test_expression};
pub use wrapper::{HarnessParams, Verdict, VerdictMarker, WrappedProgram, build_wrapped_program};
