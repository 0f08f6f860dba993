// tests/executor_fake_launcher.rs

mod common;
use crate::common::counting_launcher::{CountingLauncher, ScriptedOutcome};
use crate::common::init_tracing;

use std::time::Duration;

use tempfile::tempdir;

use codefarm::sandbox::{Executor, SandboxSettings, Verdict};
use codefarm::types::ErrorKind;

const TIMEOUT: Duration = Duration::from_secs(2);

fn executor(outcome: ScriptedOutcome) -> Executor<CountingLauncher> {
    Executor::new(CountingLauncher::new(outcome), SandboxSettings::default())
}

#[tokio::test]
async fn syntax_errors_never_spawn() {
    init_tracing();
    let exec = executor(ScriptedOutcome::TimedOut);

    let invalid = [
        "if True:\nprint(1)",
        "print(\"unterminated)",
        "def f(:\n    pass",
        "    x = 1",
        "x = = 2",
    ];
    for code in invalid {
        let result = exec.execute(code, "True", TIMEOUT).await;
        assert!(!result.success, "{code:?} should fail");
        assert_eq!(result.error_kind, Some(ErrorKind::SyntaxError));
        assert_eq!(result.combined_output, "");
        assert!(result.diagnostic.is_some());
    }

    assert_eq!(exec.launcher().count(), 0);
}

#[tokio::test]
async fn uncompilable_code_never_spawns() {
    init_tracing();
    let exec = executor(ScriptedOutcome::TimedOut);

    let invalid = [
        "1 = x",
        "None = 1",
        "True = 5",
        "f() = 1",
        "a + 1 += 2",
        "del f()",
        "for 1 in []:\n    pass",
        "[x for x in range(3)] = 1",
        "print \"hi\"",
        "break",
        "from __future__ import annotations\nprint(1)",
    ];
    for code in invalid {
        let result = exec.execute(code, "True", TIMEOUT).await;
        assert_eq!(result.error_kind, Some(ErrorKind::SyntaxError), "{code:?}");
        assert!(result.diagnostic.is_some());
    }

    assert_eq!(exec.launcher().count(), 0);
}

#[tokio::test]
async fn passing_verdict_is_success_and_marker_is_stripped() {
    init_tracing();
    let exec = executor(ScriptedOutcome::Verdict {
        output: "=== RESULTS ===\nX\n".to_string(),
        verdict: Verdict::Pass,
    });

    let result = exec
        .execute("print(\"X\")", "check_output_contains(\"X\")", TIMEOUT)
        .await;

    assert!(result.success);
    assert_eq!(result.error_kind, None);
    assert_eq!(result.combined_output, "=== RESULTS ===\nX\n");
    assert!(!result.combined_output.contains("codefarm-"));
    assert_eq!(exec.launcher().count(), 1);
}

#[tokio::test]
async fn failing_verdict_keeps_output() {
    init_tracing();
    let exec = executor(ScriptedOutcome::Verdict {
        output: "=== RESULTS ===\nwrong\n".to_string(),
        verdict: Verdict::Fail,
    });

    let result = exec.execute("print(\"wrong\")", "False", TIMEOUT).await;

    assert!(!result.success);
    assert_eq!(result.error_kind, Some(ErrorKind::TestsFailed));
    assert!(result.combined_output.contains("wrong"));
}

#[tokio::test]
async fn non_zero_exit_is_runtime_failure_with_output() {
    init_tracing();
    let exec = executor(ScriptedOutcome::Exit {
        code: 1,
        stdout: "partial\n".to_string(),
        stderr: "Traceback (most recent call last):\n".to_string(),
    });

    let result = exec.execute("print(1)", "True", TIMEOUT).await;

    assert!(!result.success);
    assert_eq!(result.error_kind, Some(ErrorKind::RuntimeFailure));
    assert_eq!(
        result.combined_output,
        "partial\nTraceback (most recent call last):\n"
    );
    assert_eq!(
        result.diagnostic.as_deref(),
        Some("interpreter exited with status 1")
    );
}

#[tokio::test]
async fn clean_exit_without_verdict_is_runtime_failure() {
    init_tracing();
    let exec = executor(ScriptedOutcome::Exit {
        code: 0,
        stdout: "codefarm-forged:verdict=pass\n".to_string(),
        stderr: String::new(),
    });

    let result = exec.execute("print(1)", "True", TIMEOUT).await;

    assert!(!result.success);
    assert_eq!(result.error_kind, Some(ErrorKind::RuntimeFailure));
    assert_eq!(
        result.diagnostic.as_deref(),
        Some("grading harness did not report a verdict")
    );
}

#[tokio::test]
async fn timeout_discards_output() {
    init_tracing();
    let exec = executor(ScriptedOutcome::TimedOut);

    let result = exec
        .execute("while True: pass", "True", Duration::from_millis(50))
        .await;

    assert!(!result.success);
    assert_eq!(result.error_kind, Some(ErrorKind::Timeout));
    assert_eq!(result.combined_output, "");
    assert_eq!(exec.launcher().launches()[0].deadline, Duration::from_millis(50));
}

#[tokio::test]
async fn spawn_failure_is_internal_error_without_host_details() {
    init_tracing();
    let exec = executor(ScriptedOutcome::SpawnFailure);

    let result = exec.execute("print(1)", "True", TIMEOUT).await;

    assert!(!result.success);
    assert_eq!(result.error_kind, Some(ErrorKind::InternalError));
    assert_eq!(result.combined_output, "");
    let diagnostic = result.diagnostic.unwrap();
    assert!(!diagnostic.contains("fake-python"));
    assert!(!diagnostic.contains("submission.py"));
}

#[tokio::test]
async fn invalid_test_expression_is_internal_error_and_never_spawns() {
    init_tracing();
    let exec = executor(ScriptedOutcome::TimedOut);

    let result = exec.execute("print(1)", "x = 1", TIMEOUT).await;

    assert_eq!(result.error_kind, Some(ErrorKind::InternalError));
    assert_eq!(exec.launcher().count(), 0);
}

#[tokio::test]
async fn artifact_exists_during_launch_and_is_removed_after() {
    init_tracing();
    let exec = executor(ScriptedOutcome::Verdict {
        output: String::new(),
        verdict: Verdict::Fail,
    });

    exec.execute("x = 5", "check_variable_exists('x')", TIMEOUT)
        .await;

    let launches = exec.launcher().launches();
    assert_eq!(launches.len(), 1);
    let record = &launches[0];
    assert!(record.script_existed);
    assert!(record.source.contains("    x = 5"));
    assert_eq!(record.script.parent(), Some(record.work_dir.as_path()));
    assert!(!record.script.exists());
    assert!(!record.work_dir.exists());
}

#[tokio::test]
async fn artifacts_are_created_under_the_configured_base_dir() {
    init_tracing();
    let base = tempdir().unwrap();
    let exec = Executor::new(
        CountingLauncher::passing(""),
        SandboxSettings {
            base_dir: Some(base.path().join("runs")),
            ..SandboxSettings::default()
        },
    );

    exec.execute("print(1)", "True", TIMEOUT).await;

    let record = &exec.launcher().launches()[0];
    assert!(record.work_dir.starts_with(base.path().join("runs")));
    assert!(!record.work_dir.exists());
}

#[tokio::test]
async fn concurrent_executions_get_distinct_artifacts() {
    init_tracing();
    let exec = executor(ScriptedOutcome::Verdict {
        output: "ok\n".to_string(),
        verdict: Verdict::Pass,
    });

    let mut handles = Vec::new();
    for i in 0..8 {
        let exec = exec.clone();
        handles.push(tokio::spawn(async move {
            exec.execute(&format!("print({i})"), "True", TIMEOUT).await
        }));
    }
    for handle in handles {
        assert!(handle.await.unwrap().success);
    }

    let launches = exec.launcher().launches();
    assert_eq!(launches.len(), 8);
    let mut dirs: Vec<_> = launches.iter().map(|r| r.work_dir.clone()).collect();
    dirs.sort();
    dirs.dedup();
    assert_eq!(dirs.len(), 8);
}

#[tokio::test]
async fn each_execution_renders_a_fresh_marker() {
    init_tracing();
    let exec = executor(ScriptedOutcome::Verdict {
        output: String::new(),
        verdict: Verdict::Pass,
    });

    exec.execute("print(1)", "True", TIMEOUT).await;
    exec.execute("print(1)", "True", TIMEOUT).await;

    let launches = exec.launcher().launches();
    assert_ne!(launches[0].source, launches[1].source);
}
