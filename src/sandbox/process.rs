// src/sandbox/process.rs

//! Interpreter process runner.

use std::ffi::OsString;
use std::future::Future;
use std::io;
use std::pin::Pin;
use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::errors::SandboxError;

use super::launcher::{CapturedStream, LaunchRequest, ProcessLauncher, ProcessOutcome};

/// Minimum time granted to drain the output pipes after the child exits.
const CAPTURE_GRACE: Duration = Duration::from_millis(250);

/// Production launcher: runs the wrapped program with a Python interpreter.
///
/// - `-I` (isolated mode): no user site-packages, `PYTHON*` variables ignored,
///   script directory not added to `sys.path`.
/// - `-X utf8`: UTF-8 stdio regardless of the host locale.
/// - The environment is cleared except for `PATH` and `LANG`; stdin is
///   `/dev/null`.
/// - On Unix the child leads its own process group, and the whole group is
///   sent `SIGKILL` when the deadline elapses.
#[derive(Debug, Clone)]
pub struct PythonLauncher {
    interpreter: String,
    max_output_bytes: usize,
    search_path: Option<OsString>,
}

impl PythonLauncher {
    pub fn new(interpreter: impl Into<String>, max_output_bytes: usize) -> Self {
        Self {
            interpreter: interpreter.into(),
            max_output_bytes,
            search_path: std::env::var_os("PATH"),
        }
    }

    pub fn interpreter(&self) -> &str {
        &self.interpreter
    }

    fn command(&self, request: &LaunchRequest<'_>) -> Command {
        let mut cmd = Command::new(&self.interpreter);
        cmd.arg("-I")
            .arg("-X")
            .arg("utf8")
            .arg(request.script)
            .current_dir(request.work_dir)
            .env_clear();

        if let Some(path) = &self.search_path {
            cmd.env("PATH", path);
        }

        cmd.env("LANG", "C.UTF-8")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        #[cfg(unix)]
        cmd.process_group(0);

        cmd
    }

    async fn run(&self, request: LaunchRequest<'_>) -> Result<ProcessOutcome, SandboxError> {
        let started = Instant::now();

        let mut child = self
            .command(&request)
            .spawn()
            .map_err(|source| SandboxError::Spawn {
                program: self.interpreter.clone(),
                script: request.script.to_path_buf(),
                source,
            })?;

        let pid = child.id();
        debug!(
            pid,
            interpreter = %self.interpreter,
            artifact = %request.script.display(),
            deadline_ms = request.deadline.as_millis() as u64,
            "spawned interpreter"
        );

        // Always consume both pipes so the child never blocks on a full buffer.
        let stdout_task = spawn_capture(child.stdout.take(), self.max_output_bytes);
        let stderr_task = spawn_capture(child.stderr.take(), self.max_output_bytes);

        let exited = tokio::time::timeout(request.deadline, wait_for_exit(&mut child)).await;
        match exited {
            Ok(exited) => exited.map_err(SandboxError::Wait)?,
            Err(_) => {
                info!(
                    pid,
                    deadline_ms = request.deadline.as_millis() as u64,
                    "deadline elapsed; killing process group"
                );
                kill_process_group(pid);
                if let Err(e) = child.kill().await {
                    warn!(pid, error = %e, "failed to kill interpreter after deadline");
                }
                stdout_task.abort();
                stderr_task.abort();
                return Ok(ProcessOutcome::TimedOut {
                    after: started.elapsed(),
                });
            }
        }

        // Stragglers the program left behind would keep the pipes open. The
        // leader is still unreaped here, so the group id cannot be recycled.
        kill_process_group(pid);
        let status = child.wait().await.map_err(SandboxError::Wait)?;

        let grace = request
            .deadline
            .saturating_sub(started.elapsed())
            .max(CAPTURE_GRACE);
        let stdout = finish_capture(stdout_task, grace, "stdout").await?;
        let stderr = finish_capture(stderr_task, grace, "stderr").await?;

        debug!(
            pid,
            exit_code = ?status.code(),
            success = status.success(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            stdout_bytes = stdout.bytes.len(),
            stderr_bytes = stderr.bytes.len(),
            "interpreter exited"
        );

        Ok(ProcessOutcome::Exited {
            code: status.code(),
            success: status.success(),
            stdout,
            stderr,
        })
    }
}

impl ProcessLauncher for PythonLauncher {
    fn launch<'a>(
        &'a self,
        request: LaunchRequest<'a>,
    ) -> Pin<Box<dyn Future<Output = Result<ProcessOutcome, SandboxError>> + Send + 'a>> {
        Box::pin(self.run(request))
    }
}

fn spawn_capture<R>(reader: Option<R>, limit: usize) -> JoinHandle<io::Result<CapturedStream>>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        match reader {
            Some(reader) => capture(reader, limit).await,
            None => Ok(CapturedStream::default()),
        }
    })
}

/// Read up to `limit` bytes, then drain and discard the rest.
async fn capture<R>(mut reader: R, limit: usize) -> io::Result<CapturedStream>
where
    R: AsyncRead + Unpin,
{
    let mut bytes = Vec::new();
    (&mut reader).take(limit as u64).read_to_end(&mut bytes).await?;
    let discarded = tokio::io::copy(&mut reader, &mut tokio::io::sink()).await?;
    Ok(CapturedStream {
        bytes,
        truncated: discarded > 0,
    })
}

async fn finish_capture(
    task: JoinHandle<io::Result<CapturedStream>>,
    grace: Duration,
    stream: &'static str,
) -> Result<CapturedStream, SandboxError> {
    let abort = task.abort_handle();
    match tokio::time::timeout(grace, task).await {
        Ok(Ok(result)) => result.map_err(SandboxError::Capture),
        Ok(Err(join_err)) => Err(SandboxError::Capture(io::Error::other(join_err))),
        Err(_) => {
            // A descendant escaped the process group and still holds the pipe.
            warn!(stream, "output pipe still open after exit; dropping captured output");
            abort.abort();
            Ok(CapturedStream {
                bytes: Vec::new(),
                truncated: true,
            })
        }
    }
}

/// Resolve once the child has exited, leaving it unreaped.
#[cfg(unix)]
async fn wait_for_exit(child: &mut Child) -> io::Result<()> {
    let Some(pid) = child.id() else {
        return Ok(());
    };
    tokio::task::spawn_blocking(move || observe_exit(libc::id_t::from(pid)))
        .await
        .map_err(io::Error::other)?
}

#[cfg(unix)]
fn observe_exit(pid: libc::id_t) -> io::Result<()> {
    loop {
        // SAFETY: an all-zero siginfo_t is a valid value, and waitid(2) only
        // writes into the struct we pass. WNOWAIT leaves the child waitable
        // for the later `Child::wait`.
        let rc = unsafe {
            let mut info: libc::siginfo_t = std::mem::zeroed();
            libc::waitid(libc::P_PID, pid, &mut info, libc::WEXITED | libc::WNOWAIT)
        };
        if rc == 0 {
            return Ok(());
        }
        let err = io::Error::last_os_error();
        if err.kind() != io::ErrorKind::Interrupted {
            return Err(err);
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_exit(child: &mut Child) -> io::Result<()> {
    child.wait().await.map(|_| ())
}

#[cfg(unix)]
fn kill_process_group(pid: Option<u32>) {
    let Some(pid) = pid else {
        return;
    };
    let Ok(pgid) = libc::pid_t::try_from(pid) else {
        return;
    };

    // SAFETY: kill(2) takes plain integers and has no memory-safety
    // preconditions; the negative id addresses the group created by
    // `process_group(0)`, whose id equals the leader's pid.
    let rc = unsafe { libc::kill(-pgid, libc::SIGKILL) };
    if rc != 0 {
        let err = io::Error::last_os_error();
        if err.raw_os_error() != Some(libc::ESRCH) {
            warn!(pgid, error = %err, "failed to kill process group");
        }
    }
}

#[cfg(not(unix))]
fn kill_process_group(_pid: Option<u32>) {}
