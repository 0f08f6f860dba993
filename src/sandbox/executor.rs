// src/sandbox/executor.rs

use std::fmt;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use tracing::{debug, error, info};

use crate::errors::SandboxError;
use crate::types::ErrorKind;

use super::artifact::ScriptArtifact;
use super::launcher::{CapturedStream, LaunchRequest, ProcessLauncher, ProcessOutcome};
use super::result::ExecutionResult;
use super::validator::{validate, validate_test_expression};
use super::wrapper::{
    DEFAULT_MAX_ECHO_CHARS, HarnessParams, Verdict, VerdictMarker, WrappedProgram,
    normalize_source,
};

/// Host-side knobs that do not change per submission.
#[derive(Debug, Clone)]
pub struct SandboxSettings {
    /// Parent directory for per-execution artifacts; system temp dir if `None`.
    pub base_dir: Option<PathBuf>,
    /// How much captured output the harness echoes in its footer.
    pub max_echo_chars: usize,
}

impl Default for SandboxSettings {
    fn default() -> Self {
        Self {
            base_dir: None,
            max_echo_chars: DEFAULT_MAX_ECHO_CHARS,
        }
    }
}

/// Validates, wraps and runs submissions, turning every outcome into an
/// [`ExecutionResult`].
///
/// `execute` holds no state between calls: each call renders its own program,
/// owns its own artifact and process, so concurrent calls never observe one
/// another.
#[derive(Clone)]
pub struct Executor<L: ProcessLauncher> {
    launcher: L,
    settings: SandboxSettings,
}

impl<L: ProcessLauncher> fmt::Debug for Executor<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Executor")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl<L: ProcessLauncher> Executor<L> {
    pub fn new(launcher: L, settings: SandboxSettings) -> Self {
        Self { launcher, settings }
    }

    pub fn launcher(&self) -> &L {
        &self.launcher
    }

    pub fn settings(&self) -> &SandboxSettings {
        &self.settings
    }

    /// Run `learner_code` against `test_expression` with a hard deadline.
    ///
    /// Never fails: infrastructure problems come back as
    /// `ErrorKind::InternalError` and are logged here.
    pub async fn execute(
        &self,
        learner_code: &str,
        test_expression: &str,
        timeout: Duration,
    ) -> ExecutionResult {
        let started = Instant::now();
        let digest = code_digest(learner_code);
        let learner_code = normalize_source(learner_code);

        if let Err(detail) = validate(&learner_code) {
            info!(
                code_digest = %digest,
                line = detail.line,
                column = detail.column,
                "submission rejected by syntax check"
            );
            return ExecutionResult::failed_silently(
                ErrorKind::SyntaxError,
                Some(detail.to_string()),
                started.elapsed(),
            );
        }

        if let Err(detail) = validate_test_expression(test_expression) {
            error!(
                code_digest = %digest,
                test_expression,
                error = %detail,
                "lesson test expression does not parse"
            );
            return ExecutionResult::failed_silently(
                ErrorKind::InternalError,
                Some(format!("lesson test expression is invalid: {detail}")),
                started.elapsed(),
            );
        }

        let params = HarnessParams::fresh(self.settings.max_echo_chars);
        let program = WrappedProgram::render(&learner_code, test_expression, &params);

        let artifact = match ScriptArtifact::create(self.settings.base_dir.as_deref(), program.source())
        {
            Ok(artifact) => artifact,
            Err(e) => {
                let err = SandboxError::ArtifactCreate(e);
                error!(code_digest = %digest, error = %err, "sandbox infrastructure failure");
                return ExecutionResult::failed_silently(
                    ErrorKind::InternalError,
                    Some("the sandbox could not prepare the submission".to_string()),
                    started.elapsed(),
                );
            }
        };

        let request = LaunchRequest {
            script: artifact.script_path(),
            work_dir: artifact.dir_path(),
            program: &program,
            deadline: timeout,
        };
        let outcome = self.launcher.launch(request).await;

        artifact.cleanup();

        let result = match outcome {
            Err(err) => {
                error!(code_digest = %digest, error = %err, "sandbox infrastructure failure");
                ExecutionResult::failed_silently(
                    ErrorKind::InternalError,
                    Some("the sandbox could not run the submission".to_string()),
                    started.elapsed(),
                )
            }
            Ok(ProcessOutcome::TimedOut { after }) => {
                debug!(code_digest = %digest, after_ms = after.as_millis() as u64, "execution timed out");
                ExecutionResult::failed_silently(
                    ErrorKind::Timeout,
                    Some(format!(
                        "execution exceeded the {} ms limit",
                        timeout.as_millis()
                    )),
                    started.elapsed(),
                )
            }
            Ok(ProcessOutcome::Exited {
                code,
                success,
                stdout,
                stderr,
            }) => classify_exit(
                program.marker(),
                code,
                success,
                stdout,
                stderr,
                started.elapsed(),
            ),
        };

        info!(
            code_digest = %digest,
            success = result.success,
            error_kind = result.error_kind.map(|k| k.as_str()).unwrap_or("none"),
            elapsed_ms = result.elapsed.as_millis() as u64,
            "execution finished"
        );

        result
    }
}

fn classify_exit(
    marker: &VerdictMarker,
    code: Option<i32>,
    success: bool,
    stdout: CapturedStream,
    stderr: CapturedStream,
    elapsed: Duration,
) -> ExecutionResult {
    let truncated = stdout.truncated || stderr.truncated;

    // Strip the marker line whatever happened so the nonce never leaks.
    let (verdict, stdout_text) = match marker.extract(&stdout.text()) {
        Some((verdict, rest)) => (Some(verdict), rest),
        None => (None, stdout.text()),
    };
    let mut combined = stdout_text;
    combined.push_str(&stderr.text());

    if !success {
        let diagnostic = match code {
            Some(code) => format!("interpreter exited with status {code}"),
            None => "interpreter was terminated by a signal".to_string(),
        };
        return ExecutionResult::failed(
            ErrorKind::RuntimeFailure,
            combined,
            Some(diagnostic),
            truncated,
            elapsed,
        );
    }

    match verdict {
        Some(Verdict::Pass) => ExecutionResult::passed(combined, truncated, elapsed),
        Some(Verdict::Fail) => ExecutionResult::failed(
            ErrorKind::TestsFailed,
            combined,
            Some("lesson checks did not pass".to_string()),
            truncated,
            elapsed,
        ),
        None => ExecutionResult::failed(
            ErrorKind::RuntimeFailure,
            combined,
            Some("grading harness did not report a verdict".to_string()),
            truncated,
            elapsed,
        ),
    }
}

/// Short content digest used to correlate log lines without logging code.
pub fn code_digest(code: &str) -> String {
    let hash = blake3::hash(code.as_bytes());
    hash.to_hex().as_str()[..16].to_string()
}
