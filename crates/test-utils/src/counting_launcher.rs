use std::future::Future;
use std::io;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use codefarm::errors::SandboxError;
use codefarm::sandbox::{
    CapturedStream, LaunchRequest, ProcessLauncher, ProcessOutcome, Verdict,
};

/// What the fake "process" does when launched.
#[derive(Debug, Clone)]
pub enum ScriptedOutcome {
    /// The harness ran to completion: prints `output`, then the real marker
    /// line for `verdict`, and exits 0.
    Verdict { output: String, verdict: Verdict },
    /// Exit with the given status and streams; no marker is printed.
    Exit {
        code: i32,
        stdout: String,
        stderr: String,
    },
    /// The deadline elapsed.
    TimedOut,
    /// The interpreter could not be spawned.
    SpawnFailure,
}

/// One observed launch.
#[derive(Debug, Clone)]
pub struct LaunchRecord {
    pub script: PathBuf,
    pub work_dir: PathBuf,
    /// Whether the script was on disk at launch time.
    pub script_existed: bool,
    /// Contents of the script at launch time.
    pub source: String,
    pub deadline: Duration,
}

/// A fake launcher that:
/// - records every launch (a spawn counter)
/// - returns a scripted outcome without touching the OS.
#[derive(Debug, Clone)]
pub struct CountingLauncher {
    outcome: ScriptedOutcome,
    launches: Arc<Mutex<Vec<LaunchRecord>>>,
}

impl CountingLauncher {
    pub fn new(outcome: ScriptedOutcome) -> Self {
        Self {
            outcome,
            launches: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Launcher whose harness always reports `pass` after printing `output`.
    pub fn passing(output: &str) -> Self {
        Self::new(ScriptedOutcome::Verdict {
            output: output.to_string(),
            verdict: Verdict::Pass,
        })
    }

    pub fn count(&self) -> usize {
        self.launches.lock().unwrap().len()
    }

    pub fn launches(&self) -> Vec<LaunchRecord> {
        self.launches.lock().unwrap().clone()
    }
}

impl ProcessLauncher for CountingLauncher {
    fn launch<'a>(
        &'a self,
        request: LaunchRequest<'a>,
    ) -> Pin<Box<dyn Future<Output = Result<ProcessOutcome, SandboxError>> + Send + 'a>> {
        Box::pin(async move {
            {
                let mut guard = self.launches.lock().unwrap();
                guard.push(LaunchRecord {
                    script: request.script.to_path_buf(),
                    work_dir: request.work_dir.to_path_buf(),
                    script_existed: request.script.is_file(),
                    source: std::fs::read_to_string(request.script).unwrap_or_default(),
                    deadline: request.deadline,
                });
            }

            match &self.outcome {
                ScriptedOutcome::Verdict { output, verdict } => {
                    let stdout = format!(
                        "{output}{}\n",
                        request.program.marker().line(*verdict)
                    );
                    Ok(ProcessOutcome::Exited {
                        code: Some(0),
                        success: true,
                        stdout: CapturedStream::from_text(stdout),
                        stderr: CapturedStream::default(),
                    })
                }
                ScriptedOutcome::Exit {
                    code,
                    stdout,
                    stderr,
                } => Ok(ProcessOutcome::Exited {
                    code: Some(*code),
                    success: *code == 0,
                    stdout: CapturedStream::from_text(stdout.clone()),
                    stderr: CapturedStream::from_text(stderr.clone()),
                }),
                ScriptedOutcome::TimedOut => Ok(ProcessOutcome::TimedOut {
                    after: request.deadline,
                }),
                ScriptedOutcome::SpawnFailure => Err(SandboxError::Spawn {
                    program: "fake-python".to_string(),
                    script: request.script.to_path_buf(),
                    source: io::Error::new(io::ErrorKind::NotFound, "no such interpreter"),
                }),
            }
        })
    }
}
