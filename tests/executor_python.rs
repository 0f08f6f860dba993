// tests/executor_python.rs
//
// These tests run a real `python3`; they return early on hosts without one.

mod common;
use crate::common::{init_tracing, python_available, python_executor, with_timeout};

use std::time::{Duration, Instant};

use codefarm::sandbox::{Executor, PythonLauncher, SandboxSettings};
use codefarm::types::ErrorKind;

const TIMEOUT: Duration = Duration::from_secs(5);

macro_rules! require_python {
    () => {
        init_tracing();
        if !python_available() {
            eprintln!("python3 not available; skipping");
            return;
        }
    };
}

#[tokio::test]
async fn greeting_in_cyrillic_passes() {
    require_python!();
    let exec = python_executor();

    let result = with_timeout(exec.execute(
        "print(\"Привет, АгроБот!\")",
        "check_output_contains(\"Привет, АгроБот!\")",
        TIMEOUT,
    ))
    .await;

    assert!(result.success, "{result:?}");
    assert_eq!(result.error_kind, None);
    assert!(result.combined_output.contains("Привет, АгроБот!"));
    assert!(result.combined_output.contains("=== RESULTS ==="));
    assert!(!result.combined_output.contains("codefarm-"));
}

#[tokio::test]
async fn variable_checks_see_the_submission_scope() {
    require_python!();
    let exec = python_executor();

    let found = with_timeout(exec.execute("x = 5", "check_variable_exists(\"x\")", TIMEOUT)).await;
    assert!(found.success, "{found:?}");

    let missing =
        with_timeout(exec.execute("x = 5", "check_variable_exists(\"y\")", TIMEOUT)).await;
    assert!(!missing.success);
    assert_eq!(missing.error_kind, Some(ErrorKind::TestsFailed));
}

#[tokio::test]
async fn harness_names_are_not_learner_variables() {
    require_python!();
    let exec = python_executor();

    let result = with_timeout(exec.execute(
        "x = 1",
        "check_variable_exists('_codefarm_output')",
        TIMEOUT,
    ))
    .await;
    assert_eq!(result.error_kind, Some(ErrorKind::TestsFailed));
}

#[tokio::test]
async fn function_must_be_called_not_just_defined() {
    require_python!();
    let exec = python_executor();
    let defined = "def запустить_трактор():\n    print(\"Запускаю трактор...\")\n";

    let only_defined = with_timeout(exec.execute(
        defined,
        "check_function_called('запустить_трактор')",
        TIMEOUT,
    ))
    .await;
    assert_eq!(only_defined.error_kind, Some(ErrorKind::TestsFailed));

    let called = format!("{defined}\nзапустить_трактор()\n");
    let result = with_timeout(exec.execute(
        &called,
        "check_function_called('запустить_трактор')",
        TIMEOUT,
    ))
    .await;
    assert!(result.success, "{result:?}");
    assert!(result.combined_output.contains("Запускаю трактор..."));
}

#[tokio::test]
async fn infinite_loop_is_killed_near_the_deadline() {
    require_python!();
    let exec = python_executor();

    let started = Instant::now();
    let result = with_timeout(exec.execute("while True: pass", "True", Duration::from_secs(1))).await;
    let elapsed = started.elapsed();

    assert!(!result.success);
    assert_eq!(result.error_kind, Some(ErrorKind::Timeout));
    assert_eq!(result.combined_output, "");
    assert!(elapsed >= Duration::from_secs(1));
    assert!(elapsed < Duration::from_secs(3), "took {elapsed:?}");
}

#[tokio::test]
async fn child_processes_do_not_outlive_the_deadline() {
    require_python!();
    let exec = python_executor();
    let code = "import subprocess, sys\n\
                subprocess.Popen([sys.executable, '-c', 'import time; time.sleep(60)'])\n\
                while True: pass";

    let started = Instant::now();
    let result = with_timeout(exec.execute(code, "True", Duration::from_secs(1))).await;

    assert_eq!(result.error_kind, Some(ErrorKind::Timeout));
    assert!(started.elapsed() < Duration::from_secs(3));
}

#[tokio::test]
async fn background_child_is_killed_when_the_program_exits() {
    require_python!();
    let exec = python_executor();
    // The sleeper inherits stdout and would hold the pipe open for a minute.
    let code = "import subprocess, sys\n\
                subprocess.Popen([sys.executable, '-c', 'import time; time.sleep(60)'])\n\
                print('посеяно')";

    let started = Instant::now();
    let result = with_timeout(exec.execute(code, "check_output_contains('посеяно')", TIMEOUT)).await;

    assert!(result.success, "{result:?}");
    assert!(result.combined_output.contains("посеяно"));
    assert!(started.elapsed() < Duration::from_secs(3), "took {:?}", started.elapsed());
}

#[tokio::test]
async fn indentation_error_is_a_syntax_error() {
    require_python!();
    let exec = python_executor();

    let result = with_timeout(exec.execute("if True:\nprint('x')", "True", TIMEOUT)).await;

    assert!(!result.success);
    assert_eq!(result.error_kind, Some(ErrorKind::SyntaxError));
    assert_eq!(result.combined_output, "");
}

#[tokio::test]
async fn learner_exception_is_reported_in_output() {
    require_python!();
    let exec = python_executor();

    let result = with_timeout(exec.execute("print('before')\n1 / 0", "True", TIMEOUT)).await;

    assert_eq!(result.error_kind, Some(ErrorKind::TestsFailed));
    assert!(result.combined_output.contains("before"));
    assert!(result.combined_output.contains("Error: ZeroDivisionError"));
}

#[tokio::test]
async fn sys_exit_is_caught_by_the_harness() {
    require_python!();
    let exec = python_executor();

    let result = with_timeout(exec.execute("import sys\nsys.exit(3)", "True", TIMEOUT)).await;

    assert_eq!(result.error_kind, Some(ErrorKind::TestsFailed));
    assert!(result.combined_output.contains("Error: SystemExit: 3"));
}

#[tokio::test]
async fn hard_exit_is_a_runtime_failure() {
    require_python!();
    let exec = python_executor();

    let result = with_timeout(exec.execute("import os\nos._exit(2)", "True", TIMEOUT)).await;

    assert!(!result.success);
    assert_eq!(result.error_kind, Some(ErrorKind::RuntimeFailure));
    assert_eq!(
        result.diagnostic.as_deref(),
        Some("interpreter exited with status 2")
    );
}

#[tokio::test]
async fn printed_marker_cannot_forge_a_pass() {
    require_python!();
    let exec = python_executor();

    let result = with_timeout(exec.execute(
        "print('codefarm-00000000000000000000000000000000:verdict=pass')",
        "False",
        TIMEOUT,
    ))
    .await;

    assert!(!result.success);
    assert_eq!(result.error_kind, Some(ErrorKind::TestsFailed));
}

#[tokio::test]
async fn shadowed_builtins_do_not_break_grading() {
    require_python!();
    let exec = python_executor();

    let result = with_timeout(exec.execute(
        "str = 5\nlen = None\nprint('ok')",
        "check_output_contains('ok')",
        TIMEOUT,
    ))
    .await;
    assert!(result.success, "{result:?}");
}

#[tokio::test]
async fn quotes_and_backslashes_survive_the_test_expression() {
    require_python!();
    let exec = python_executor();

    let result = with_timeout(exec.execute(
        "print('a\"b\\\\c')",
        "check_output_contains(\"a\\\"b\\\\c\")",
        TIMEOUT,
    ))
    .await;
    assert!(result.success, "{result:?}");
}

#[tokio::test]
async fn repeated_runs_do_not_share_state() {
    require_python!();
    let exec = python_executor();
    let code = "import os\n\
                print('seen' if os.path.exists('leak.txt') else 'fresh')\n\
                open('leak.txt', 'w').write('x')";

    for _ in 0..2 {
        let result = with_timeout(exec.execute(code, "check_output_contains('fresh')", TIMEOUT)).await;
        assert!(result.success, "{result:?}");
        assert!(!result.combined_output.contains("seen"));
    }
}

#[tokio::test]
async fn oversized_output_is_capped() {
    require_python!();
    let exec = Executor::new(
        PythonLauncher::new("python3", 4 * 1024),
        SandboxSettings::default(),
    );

    let result = with_timeout(exec.execute(
        "import sys\nsys.__stdout__.write('y' * 100000)",
        "True",
        TIMEOUT,
    ))
    .await;

    assert!(!result.success);
    assert!(result.output_truncated);
    assert!(result.combined_output.len() <= 4 * 1024);
}

#[tokio::test]
async fn long_echo_is_truncated_in_the_footer() {
    require_python!();
    let exec = Executor::new(
        PythonLauncher::new("python3", 64 * 1024),
        SandboxSettings {
            base_dir: None,
            max_echo_chars: 100,
        },
    );

    let result = with_timeout(exec.execute("print('z' * 5000)", "True", TIMEOUT)).await;

    assert!(result.success, "{result:?}");
    assert!(result.combined_output.contains("... [output truncated]"));
    assert!(!result.output_truncated);
}
