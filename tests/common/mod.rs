#![allow(dead_code)]

pub use codefarm_test_utils::builders;
pub use codefarm_test_utils::counting_launcher;
pub use codefarm_test_utils::{init_tracing, python_available, with_timeout};

use codefarm::sandbox::{Executor, PythonLauncher, SandboxSettings};

/// Default per-stream capture cap used by interpreter-backed tests.
pub const TEST_OUTPUT_BYTES: usize = 64 * 1024;

/// Executor over a real `python3`, artifacts in the system temp dir.
pub fn python_executor() -> Executor<PythonLauncher> {
    Executor::new(
        PythonLauncher::new("python3", TEST_OUTPUT_BYTES),
        SandboxSettings::default(),
    )
}
