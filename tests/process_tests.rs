// Process runner tests: output capture, failure mapping, timeouts
#![cfg(unix)]

use std::collections::HashMap;
use std::time::Duration;

use tempfile::tempdir;

use pylift::{ProcessConfig, ProcessError, ProcessRunner, PyliftError};

#[tokio::test]
async fn test_successful_run_captures_stdout() {
    let runner = ProcessRunner::new();
    let config = ProcessConfig::new("echo").with_args(vec!["hello", "world"]);

    let output = runner.run(config).await.unwrap();
    assert_eq!(output.stdout.trim(), "hello world");
    assert!(output.stderr.is_empty());
}

#[tokio::test]
async fn test_nonzero_exit_is_execution_failure() {
    let runner = ProcessRunner::new();
    let config = ProcessConfig::new("sh").with_args(vec!["-c", "echo broken >&2; exit 3"]);

    let result = runner.run(config).await;
    match result {
        Err(PyliftError::Process(inner)) => match *inner {
            ProcessError::ExecutionFailed {
                exit_code, stderr, ..
            } => {
                assert_eq!(exit_code, Some(3));
                assert_eq!(stderr.trim(), "broken");
            }
            other => panic!("expected ExecutionFailed, got {other:?}"),
        },
        other => panic!("expected process error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_missing_binary_is_spawn_failure() {
    let runner = ProcessRunner::new();
    let config = ProcessConfig::new("pylift-test-no-such-binary-49281");

    let result = runner.run(config).await;
    match result {
        Err(PyliftError::Process(inner)) => {
            assert!(matches!(*inner, ProcessError::SpawnFailed { .. }));
        }
        other => panic!("expected spawn failure, got {other:?}"),
    }
}

#[tokio::test]
async fn test_working_directory_override() {
    let runner = ProcessRunner::new();
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("marker.txt"), "x").unwrap();

    let config = ProcessConfig::new("ls").with_working_dir(dir.path().to_path_buf());
    let output = runner.run(config).await.unwrap();
    assert!(output.stdout.contains("marker.txt"));
}

#[tokio::test]
async fn test_environment_override() {
    let runner = ProcessRunner::new();
    let mut env = HashMap::new();
    env.insert("PYLIFT_TEST_VAR".to_string(), "payload".to_string());

    let config = ProcessConfig::new("sh")
        .with_args(vec!["-c", "echo $PYLIFT_TEST_VAR"])
        .with_environment(env);
    let output = runner.run(config).await.unwrap();
    assert_eq!(output.stdout.trim(), "payload");
}

#[tokio::test]
async fn test_timeout_kills_the_child() {
    let runner = ProcessRunner::new();
    let config = ProcessConfig::new("sleep")
        .with_args(vec!["30"])
        .with_timeout(Duration::from_millis(200));

    let start = std::time::Instant::now();
    let result = runner.run(config).await;
    assert!(start.elapsed() < Duration::from_secs(5));

    match result {
        Err(PyliftError::Process(inner)) => match *inner {
            ProcessError::Timeout { duration, .. } => {
                assert_eq!(duration, Duration::from_millis(200));
            }
            other => panic!("expected Timeout, got {other:?}"),
        },
        other => panic!("expected timeout error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_stderr_captured_alongside_stdout() {
    let runner = ProcessRunner::new();
    let config = ProcessConfig::new("sh").with_args(vec!["-c", "echo out; echo err >&2"]);

    let output = runner.run(config).await.unwrap();
    assert_eq!(output.stdout.trim(), "out");
    assert_eq!(output.stderr.trim(), "err");
}
