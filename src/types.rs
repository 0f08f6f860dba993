use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Canonical lesson identifier.
pub type LessonId = u32;

/// Why an execution did not pass.
///
/// - `SyntaxError`: the submission failed the static parse and never ran.
/// - `Timeout`: the wall-clock deadline elapsed and the process group was killed.
/// - `RuntimeFailure`: the interpreter exited non-zero, was killed by a signal,
///   or never reached the end of the grading harness.
/// - `TestsFailed`: the program ran to completion but the lesson's checks
///   evaluated to false.
/// - `InternalError`: the host could not create the artifact or spawn the
///   interpreter, or the lesson's own test expression is malformed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    SyntaxError,
    Timeout,
    RuntimeFailure,
    TestsFailed,
    InternalError,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::SyntaxError => "syntax_error",
            ErrorKind::Timeout => "timeout",
            ErrorKind::RuntimeFailure => "runtime_failure",
            ErrorKind::TestsFailed => "tests_failed",
            ErrorKind::InternalError => "internal_error",
        }
    }

    /// Whether this kind points at the host rather than the learner.
    pub fn is_infrastructure(&self) -> bool {
        matches!(self, ErrorKind::InternalError)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse a duration string such as `"10s"`, `"500ms"`, `"2m"` or `"1h"`.
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }

    // Find the boundary between digits and suffix.
    let idx = s
        .chars()
        .position(|c| !c.is_ascii_digit())
        .ok_or_else(|| "duration missing unit suffix".to_string())?;

    let (num_part, unit_part) = s.split_at(idx);
    let value: u64 = num_part
        .parse()
        .map_err(|e| format!("invalid duration number '{}': {}", num_part, e))?;
    let unit = unit_part.trim().to_lowercase();

    match unit.as_str() {
        "ms" => Ok(Duration::from_millis(value)),
        "s" => Ok(Duration::from_secs(value)),
        "m" => Ok(Duration::from_secs(value.saturating_mul(60))),
        "h" => Ok(Duration::from_secs(value.saturating_mul(60 * 60))),
        _ => Err(format!(
            "unsupported duration unit '{}'; expected ms, s, m, or h",
            unit
        )),
    }
}
