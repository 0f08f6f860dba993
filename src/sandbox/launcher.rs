// src/sandbox/launcher.rs

//! Pluggable process launcher abstraction.
//!
//! The executor talks to a `ProcessLauncher` instead of spawning processes
//! itself. Production code uses [`PythonLauncher`](super::process::PythonLauncher);
//! tests can substitute a launcher that counts launches and returns scripted
//! outcomes without touching the OS.

use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::time::Duration;

use crate::errors::SandboxError;

use super::wrapper::WrappedProgram;

/// Everything a launcher needs to run one wrapped program.
#[derive(Debug, Clone, Copy)]
pub struct LaunchRequest<'a> {
    /// Materialised program on disk.
    pub script: &'a Path,
    /// Working directory for the child; owned by the same artifact.
    pub work_dir: &'a Path,
    /// The program that was written to `script`.
    pub program: &'a WrappedProgram,
    /// Hard wall-clock limit.
    pub deadline: Duration,
}

/// Bytes read from one output pipe, capped at the launcher's limit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapturedStream {
    pub bytes: Vec<u8>,
    /// True if the process wrote more than the cap and the rest was dropped.
    pub truncated: bool,
}

impl CapturedStream {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            bytes: text.into().into_bytes(),
            truncated: false,
        }
    }

    /// Lossy UTF-8 view of the captured bytes.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }
}

/// How the child process ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// The process exited on its own (or was killed by a signal it did not
    /// receive from us, in which case `code` is `None`).
    Exited {
        code: Option<i32>,
        success: bool,
        stdout: CapturedStream,
        stderr: CapturedStream,
    },
    /// The deadline elapsed and the process group was force-killed.
    TimedOut { after: Duration },
}

/// Trait abstracting how a wrapped program is run.
pub trait ProcessLauncher: Send + Sync {
    /// Run the program described by `request` to completion or deadline.
    ///
    /// An `Err` means the process could not be started or observed at all;
    /// everything the learner's code can cause is an `Ok(ProcessOutcome)`.
    fn launch<'a>(
        &'a self,
        request: LaunchRequest<'a>,
    ) -> Pin<Box<dyn Future<Output = Result<ProcessOutcome, SandboxError>> + Send + 'a>>;
}
