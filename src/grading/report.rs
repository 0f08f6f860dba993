// src/grading/report.rs

use std::time::Duration;

use serde::Serialize;

use crate::sandbox::ExecutionResult;
use crate::types::ErrorKind;

/// What the web layer returns to the learner: `{success, output, error}`.
///
/// `error` is empty on success. Infrastructure details never reach it; they
/// are logged by the executor instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GradeReport {
    pub success: bool,
    pub output: String,
    pub error: String,
    pub error_kind: Option<ErrorKind>,
}

impl GradeReport {
    pub fn from_result(result: &ExecutionResult, timeout: Duration) -> Self {
        let error = match result.error_kind {
            None => String::new(),
            Some(ErrorKind::SyntaxError) => match &result.diagnostic {
                Some(detail) => format!("Syntax error: {detail}"),
                None => "Syntax error".to_string(),
            },
            Some(ErrorKind::Timeout) => format!(
                "Execution took too long (limit {})",
                format_limit(timeout)
            ),
            Some(ErrorKind::RuntimeFailure) => match &result.diagnostic {
                Some(detail) => format!("Execution failed: {detail}"),
                None => "Execution failed".to_string(),
            },
            Some(ErrorKind::TestsFailed) => {
                "The program ran, but the lesson checks did not pass".to_string()
            }
            Some(ErrorKind::InternalError) => {
                "Internal error while checking your code; please try again later".to_string()
            }
        };

        Self {
            success: result.success,
            output: result.combined_output.clone(),
            error,
            error_kind: result.error_kind,
        }
    }
}

fn format_limit(timeout: Duration) -> String {
    let millis = timeout.as_millis();
    if millis % 1000 == 0 {
        format!("{}s", millis / 1000)
    } else {
        format!("{millis}ms")
    }
}
