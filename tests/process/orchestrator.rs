//! Copyright © 2025-2026 Wenze Wei. All Rights Reserved.
//!
//! This file is part of Tanxi.
//! The Tanxi project belongs to the Dunimd Team.
//!
//! Licensed under the Apache License, Version 2.0 (the "License");
//! You may not use this file except in compliance with the License.
//! You may obtain a copy of the License at
//!
//!     http://www.apache.org/licenses/LICENSE-2.0
//!
//! Unless required by applicable law or agreed to in writing, software
//! distributed under the License is distributed on an "AS IS" BASIS,
//! WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//! See the License for the specific language governing permissions and
//! limitations under the License.

//! # Tanxi Process Tests - Orchestrator
//!
//! This module contains tests for the process orchestrator. The orchestrator
//! spawns the analysis application, drains both of its output streams and
//! reports how the process ended.
//!
//! ## Test Categories
//!
//! - **Draining Tests**: Verify both pipes are read concurrently, line by line
//! - **Launch Tests**: Verify spawn failures, environment and argument order
//! - **Termination Tests**: Verify timeouts and cancellation, including
//!   descendants that inherit the output pipes
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test --test orchestrator
//! ```

#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tanxi::process::{TanMemorySink, TanProcessOrchestrator, TanProcessRequest, TanStreamKind};
use tanxi::TanError;

/// Upper bound for a run that was stopped at a 300ms deadline.
const PROMPT_STOP: Duration = Duration::from_secs(4);

fn shell(script: &str) -> TanProcessRequest {
    TanProcessRequest::new("sh").arg("-c").arg(script)
}

fn orchestrator() -> (TanProcessOrchestrator, Arc<TanMemorySink>) {
    let sink = Arc::new(TanMemorySink::new());
    (TanProcessOrchestrator::new(sink.clone()), sink)
}

/// Tests that a process flooding both pipes cannot deadlock the orchestrator.
///
/// Writes far more than a pipe buffer to stdout and stderr, exits late with
/// code 3, and expects every line to arrive.
#[tokio::test]
async fn test_drains_both_streams_without_deadlock() {
    let (orchestrator, sink) = orchestrator();
    let request = shell(
        "yes stdout-line | head -n 20000; yes stderr-line | head -n 20000 >&2; sleep 1; exit 3",
    );

    let outcome = orchestrator
        .run(&request, Some(Duration::from_secs(60)))
        .await
        .unwrap();

    assert!(!outcome.timed_out);
    assert_eq!(outcome.exit_code, 3);
    assert!(!outcome.success());
    assert_eq!(outcome.stdout_lines, 20000);
    assert_eq!(outcome.stderr_lines, 20000);

    let stdout = sink.stream(TanStreamKind::Stdout);
    let stderr = sink.stream(TanStreamKind::Stderr);
    assert_eq!(stdout.len(), 20000);
    assert_eq!(stderr.len(), 20000);
    assert!(stdout.iter().all(|line| line == "stdout-line"));
    assert!(stderr.iter().all(|line| line == "stderr-line"));
}

/// Tests that alternating output on both streams arrives as whole lines.
#[tokio::test]
async fn test_interleaved_output_keeps_whole_lines() {
    let (orchestrator, sink) = orchestrator();
    let request = shell(
        "i=0; while [ $i -lt 500 ]; do echo \"out $i\"; echo \"err $i\" >&2; i=$((i+1)); done",
    );
    let outcome = orchestrator.run(&request, None).await.unwrap();
    assert!(outcome.success());

    let stdout = sink.stream(TanStreamKind::Stdout);
    let expected: Vec<String> = (0..500).map(|i| format!("out {}", i)).collect();
    assert_eq!(stdout, expected);
    assert!(sink
        .stream(TanStreamKind::Stderr)
        .iter()
        .all(|line| line.starts_with("err ")));
}

/// Tests that an executable which cannot be started is a launch error.
#[tokio::test]
async fn test_missing_executable_is_a_launch_error() {
    let (orchestrator, sink) = orchestrator();
    let request = TanProcessRequest::new("/nonexistent/tanxi-no-such-binary");
    let err = orchestrator.run(&request, None).await.unwrap_err();
    assert!(matches!(err, TanError::Launch { .. }));
    assert!(sink.lines().is_empty());
}

/// Tests that request variables are added without dropping inherited ones.
#[tokio::test]
async fn test_environment_override_is_additive() {
    let (orchestrator, sink) = orchestrator();
    let request = shell("echo \"$TANXI_MARKER\"; test -n \"$PATH\" && echo path-kept")
        .env("TANXI_MARKER", "hello");
    let outcome = orchestrator.run(&request, None).await.unwrap();
    assert_eq!(outcome.exit_code, 0);
    assert_eq!(sink.stream(TanStreamKind::Stdout), vec!["hello", "path-kept"]);
}

/// Tests that a process outliving its deadline is killed.
#[tokio::test]
async fn test_timeout_kills_the_process() {
    let (orchestrator, _) = orchestrator();
    let request = TanProcessRequest::new("sleep").arg("30");
    let started = Instant::now();
    let outcome = orchestrator
        .run(&request, Some(Duration::from_millis(300)))
        .await
        .unwrap();
    assert!(outcome.timed_out);
    assert!(!outcome.cancelled);
    assert_eq!(outcome.exit_code, -1);
    assert!(started.elapsed() < PROMPT_STOP);
}

/// Tests that a deadline also stops descendants holding the output pipes.
///
/// The shell forks `sleep` instead of exec'ing it, so the sleeping process
/// keeps its own copies of stdout and stderr.
#[tokio::test]
async fn test_timeout_kills_descendants_holding_pipes() {
    let (orchestrator, sink) = orchestrator();
    let request = shell("echo started; sleep 30; echo done");
    let started = Instant::now();
    let outcome = orchestrator
        .run(&request, Some(Duration::from_millis(300)))
        .await
        .unwrap();

    let elapsed = started.elapsed();
    assert!(outcome.timed_out);
    assert!(elapsed < PROMPT_STOP, "run took {:?}", elapsed);
    assert_eq!(sink.stream(TanStreamKind::Stdout), vec!["started"]);
}

/// Tests that cancellation kills the process.
#[tokio::test]
async fn test_cancellation_kills_the_process() {
    let (orchestrator, _) = orchestrator();
    let request = TanProcessRequest::new("sleep").arg("30");
    let outcome = orchestrator
        .run_cancellable(&request, None, tokio::time::sleep(Duration::from_millis(300)))
        .await
        .unwrap();
    assert!(outcome.cancelled);
    assert!(!outcome.timed_out);
    assert!(!outcome.success());
}

/// Tests that cancellation also stops descendants holding the output pipes.
#[tokio::test]
async fn test_cancellation_kills_descendants_holding_pipes() {
    let (orchestrator, _) = orchestrator();
    let request = shell("sleep 30 & sleep 30; echo done");
    let started = Instant::now();
    let outcome = orchestrator
        .run_cancellable(&request, None, tokio::time::sleep(Duration::from_millis(300)))
        .await
        .unwrap();

    let elapsed = started.elapsed();
    assert!(outcome.cancelled);
    assert!(elapsed < PROMPT_STOP, "run took {:?}", elapsed);
    assert_eq!(outcome.stdout_lines, 0);
}

/// Tests that invalid UTF-8 output is decoded lossily and CRLF trimmed.
#[tokio::test]
async fn test_invalid_utf8_is_replaced() {
    let (orchestrator, sink) = orchestrator();
    let request = shell("printf '\\377abc\\r\\n'");
    orchestrator.run(&request, None).await.unwrap();
    assert_eq!(sink.stream(TanStreamKind::Stdout), vec!["\u{FFFD}abc"]);
}

/// Tests that the classpath flag precedes the request arguments.
#[tokio::test]
async fn test_classpath_is_passed_before_arguments() {
    let dir = tempfile::tempdir().unwrap();
    let script = dir.path().join("echo-args");
    std::fs::write(&script, "#!/bin/sh\necho \"$@\"\n").unwrap();
    std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

    let (orchestrator, sink) = orchestrator();
    let mut request = TanProcessRequest::new(&script).arg("Main").arg("-job");
    request.classpath_entries = vec!["/a.jar".into(), "/b.jar".into()];
    let outcome = orchestrator.run(&request, None).await.unwrap();

    assert!(outcome.success());
    assert_eq!(
        sink.stream(TanStreamKind::Stdout),
        vec!["-cp /a.jar:/b.jar Main -job"]
    );
}
