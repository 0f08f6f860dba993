// src/sandbox/wrapper.rs

//! Grading harness generation.
//!
//! A wrapped program is assembled from fixed fragments with four insertion
//! points and nothing else:
//!
//! - the learner code, re-indented one level so it runs inside the harness's
//!   `try` block;
//! - the lesson's test expression, embedded as an escaped string literal and
//!   compiled with `eval` mode at grading time;
//! - the verdict marker, also an escaped literal;
//! - the echo cap, an integer.
//!
//! Because the only text spliced in raw is the (already parse-checked) learner
//! block, a submission cannot close the harness's strings or forge its
//! scaffolding by containing the harness's own delimiters.
//!
//! Grading primitives available to a test expression:
//!
//! - `check_output_contains(text)`: `text` occurs in the captured stdout.
//! - `check_variable_exists(name)`: the submission bound `name` at top level.
//! - `check_function_called(name)`: a function or method named `name` was
//!   actually invoked while the submission ran (tracked via `sys.setprofile`,
//!   so defining a function is not enough).

use uuid::Uuid;

/// First line of the results footer.
pub const RESULTS_BANNER: &str = "=== RESULTS ===";

/// Default cap on how many characters of captured output the footer echoes.
pub const DEFAULT_MAX_ECHO_CHARS: usize = 8_000;

const INDENT: &str = "    ";

const PREAMBLE: &str = r#"# -*- coding: utf-8 -*-
# Generated grading harness.
import builtins as _codefarm_builtins
import io as _codefarm_io
import sys as _codefarm_sys

_codefarm_stdout = _codefarm_sys.stdout
_codefarm_buffer = _codefarm_io.StringIO()
_codefarm_source = __file__
_codefarm_calls = _codefarm_builtins.set()
_codefarm_error = None
_codefarm_verdict = False
_codefarm_output = ""


def _codefarm_describe(exc):
    try:
        detail = _codefarm_builtins.str(exc)
    except _codefarm_builtins.BaseException:
        detail = "<unprintable exception>"
    return _codefarm_builtins.type(exc).__name__ + ": " + detail


def _codefarm_track_calls(frame, event, arg):
    if event == "call" and frame.f_code.co_filename == _codefarm_source:
        _codefarm_calls.add(frame.f_code.co_name)


_codefarm_baseline = _codefarm_builtins.set(_codefarm_builtins.globals())
_codefarm_sys.stdout = _codefarm_buffer
_codefarm_sys.setprofile(_codefarm_track_calls)
try:
"#;

const SUBMISSION_EPILOGUE: &str = r#"
    pass
except _codefarm_builtins.BaseException as _codefarm_exc:
    _codefarm_error = _codefarm_describe(_codefarm_exc)
finally:
    _codefarm_sys.setprofile(None)
    _codefarm_sys.stdout = _codefarm_stdout
    _codefarm_output = _codefarm_buffer.getvalue()

_codefarm_scope = _codefarm_builtins.frozenset(
    _codefarm_name
    for _codefarm_name in _codefarm_builtins.globals()
    if _codefarm_name not in _codefarm_baseline
    and not _codefarm_name.startswith("_codefarm_")
)
"#;

const GRADING: &str = r#"

def _codefarm_check_output_contains(text):
    return _codefarm_builtins.str(text) in _codefarm_output


def _codefarm_check_variable_exists(name):
    return name in _codefarm_scope


def _codefarm_check_function_called(name):
    return name in _codefarm_calls


if _codefarm_error is None:
    try:
        _codefarm_verdict = _codefarm_builtins.bool(
            _codefarm_builtins.eval(
                _codefarm_builtins.compile(_codefarm_test_source, "<lesson-test>", "eval"),
                {
                    "__builtins__": _codefarm_builtins,
                    "check_output_contains": _codefarm_check_output_contains,
                    "check_variable_exists": _codefarm_check_variable_exists,
                    "check_function_called": _codefarm_check_function_called,
                },
            )
        )
    except _codefarm_builtins.BaseException as _codefarm_exc:
        _codefarm_verdict = False
        _codefarm_error = _codefarm_describe(_codefarm_exc)
"#;

const FOOTER: &str = r#"
_codefarm_echo = _codefarm_output
if _codefarm_builtins.len(_codefarm_echo) > _codefarm_max_echo:
    _codefarm_echo = _codefarm_echo[:_codefarm_max_echo] + "\n... [output truncated]"
if _codefarm_echo and not _codefarm_echo.endswith("\n"):
    _codefarm_echo += "\n"
_codefarm_sys.stdout.write(_codefarm_banner + "\n")
_codefarm_sys.stdout.write(_codefarm_echo)
if _codefarm_error is not None:
    _codefarm_sys.stdout.write("Error: " + _codefarm_error[:_codefarm_max_echo] + "\n")
_codefarm_sys.stdout.write(_codefarm_marker + ("pass" if _codefarm_verdict else "fail") + "\n")
_codefarm_sys.stdout.flush()
"#;

/// Per-execution inputs to the harness that are not learner or lesson text.
#[derive(Debug, Clone)]
pub struct HarnessParams {
    pub nonce: String,
    pub max_echo_chars: usize,
}

impl HarnessParams {
    /// Fresh parameters with a random nonce.
    pub fn fresh(max_echo_chars: usize) -> Self {
        Self {
            nonce: Uuid::new_v4().simple().to_string(),
            max_echo_chars,
        }
    }
}

impl Default for HarnessParams {
    fn default() -> Self {
        Self::fresh(DEFAULT_MAX_ECHO_CHARS)
    }
}

/// Outcome of the lesson's test expression as reported by the harness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Pass,
    Fail,
}

impl Verdict {
    fn as_str(&self) -> &'static str {
        match self {
            Verdict::Pass => "pass",
            Verdict::Fail => "fail",
        }
    }
}

/// The nonce-bearing line prefix the harness prints as its last line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerdictMarker {
    tag: String,
}

impl VerdictMarker {
    pub fn new(nonce: &str) -> Self {
        Self {
            tag: format!("codefarm-{nonce}:verdict="),
        }
    }

    /// Line prefix printed right before `pass` / `fail`.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// The full marker line (without newline) for a given verdict.
    pub fn line(&self, verdict: Verdict) -> String {
        format!("{}{}", self.tag, verdict.as_str())
    }

    /// Find the last marker line in `stdout`.
    ///
    /// Returns the verdict and `stdout` with that line removed, or `None` if
    /// the harness never got as far as printing it.
    pub fn extract(&self, stdout: &str) -> Option<(Verdict, String)> {
        for (start, _) in stdout.rmatch_indices(self.tag.as_str()) {
            if start != 0 && !stdout[..start].ends_with('\n') {
                continue;
            }

            let rest = &stdout[start..];
            let (line_len, consumed) = match rest.find('\n') {
                Some(idx) => (idx, idx + 1),
                None => (rest.len(), rest.len()),
            };

            let value = rest[self.tag.len()..line_len].trim_end_matches('\r');
            let verdict = match value {
                "pass" => Verdict::Pass,
                "fail" => Verdict::Fail,
                _ => continue,
            };

            let mut remaining = String::with_capacity(stdout.len());
            remaining.push_str(&stdout[..start]);
            remaining.push_str(&stdout[start + consumed..]);
            return Some((verdict, remaining));
        }
        None
    }
}

/// Generated source text for one execution plus the marker to read it back.
#[derive(Debug, Clone)]
pub struct WrappedProgram {
    source: String,
    marker: VerdictMarker,
}

impl WrappedProgram {
    pub fn render(learner_code: &str, test_expression: &str, params: &HarnessParams) -> Self {
        let marker = VerdictMarker::new(&params.nonce);
        let learner = indent_code(&normalize_source(learner_code));

        let mut source = String::with_capacity(
            PREAMBLE.len()
                + learner.len()
                + SUBMISSION_EPILOGUE.len()
                + GRADING.len()
                + FOOTER.len()
                + test_expression.len()
                + 256,
        );

        source.push_str(PREAMBLE);
        source.push_str(&learner);
        source.push_str(SUBMISSION_EPILOGUE);

        push_binding(
            &mut source,
            "_codefarm_test_source",
            &python_str_literal(test_expression.trim()),
        );
        push_binding(
            &mut source,
            "_codefarm_marker",
            &python_str_literal(marker.tag()),
        );
        push_binding(&mut source, "_codefarm_banner", &python_str_literal(RESULTS_BANNER));
        push_binding(
            &mut source,
            "_codefarm_max_echo",
            &params.max_echo_chars.to_string(),
        );

        source.push_str(GRADING);
        source.push_str(FOOTER);

        Self { source, marker }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn marker(&self) -> &VerdictMarker {
        &self.marker
    }

    pub fn into_source(self) -> String {
        self.source
    }
}

/// Render a wrapped program with fresh harness parameters.
pub fn build_wrapped_program(learner_code: &str, test_expression: &str) -> String {
    WrappedProgram::render(learner_code, test_expression, &HarnessParams::default())
        .into_source()
}

/// Normalise line endings and drop a leading byte-order mark.
///
/// Python reads source with universal newlines, so this does not change what
/// the learner's code means; it only keeps re-indentation line-accurate.
pub fn normalize_source(code: &str) -> String {
    let code = code.strip_prefix('\u{feff}').unwrap_or(code);
    code.replace("\r\n", "\n").replace('\r', "\n")
}

/// Prefix every line of `code` with one indentation level.
pub fn indent_code(code: &str) -> String {
    code.split('\n')
        .map(|line| format!("{INDENT}{line}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render `s` as a double-quoted Python string literal.
pub fn python_str_literal(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() || matches!(c, '\u{2028}' | '\u{2029}' | '\u{feff}') => {
                let code = c as u32;
                if code <= 0xFFFF {
                    out.push_str(&format!("\\u{code:04x}"));
                } else {
                    out.push_str(&format!("\\U{code:08x}"));
                }
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

fn push_binding(source: &mut String, name: &str, value: &str) {
    source.push_str(name);
    source.push_str(" = ");
    source.push_str(value);
    source.push('\n');
}
