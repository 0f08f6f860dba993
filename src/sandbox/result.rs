// src/sandbox/result.rs

use std::time::Duration;

use serde::Serialize;

use crate::types::ErrorKind;

/// The single, immutable outcome of one `execute` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionResult {
    pub success: bool,
    /// Captured stdout followed by stderr; empty for `SyntaxError`, `Timeout`
    /// and `InternalError`.
    pub combined_output: String,
    /// `None` exactly when `success` is true.
    pub error_kind: Option<ErrorKind>,
    /// Short human-readable detail (parser message, missing verdict, ...).
    pub diagnostic: Option<String>,
    /// True if either output stream hit the capture cap.
    pub output_truncated: bool,
    #[serde(serialize_with = "serialize_millis")]
    pub elapsed: Duration,
}

impl ExecutionResult {
    pub fn passed(combined_output: String, output_truncated: bool, elapsed: Duration) -> Self {
        Self {
            success: true,
            combined_output,
            error_kind: None,
            diagnostic: None,
            output_truncated,
            elapsed,
        }
    }

    pub fn failed(
        kind: ErrorKind,
        combined_output: String,
        diagnostic: Option<String>,
        output_truncated: bool,
        elapsed: Duration,
    ) -> Self {
        Self {
            success: false,
            combined_output,
            error_kind: Some(kind),
            diagnostic,
            output_truncated,
            elapsed,
        }
    }

    /// A failure that produced no output worth showing.
    pub fn failed_silently(kind: ErrorKind, diagnostic: Option<String>, elapsed: Duration) -> Self {
        Self::failed(kind, String::new(), diagnostic, false, elapsed)
    }
}

fn serialize_millis<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_u64(duration.as_millis() as u64)
}
