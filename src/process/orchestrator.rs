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

//! # Process Orchestrator
//!
//! Spawns the external application and supervises it until it is gone.
//!
//! ## Lifecycle
//!
//! 1. The argument vector is assembled and the command line logged.
//! 2. The child starts with both output pipes captured; a spawn failure is a
//!    [`TanError::Launch`] and nothing else happens.
//! 3. Two reader tasks drain stdout and stderr into the shared sink, line by
//!    line, each until its own pipe closes.
//! 4. The orchestrator waits for whichever comes first: process exit, the
//!    timeout, or cancellation. On timeout or cancellation the child's whole
//!    process group is killed and the child reaped.
//! 5. Both reader tasks are joined before the outcome is returned. After a
//!    kill the join is bounded by [`READER_GRACE`]; a reader still blocked on
//!    a pipe held open by an escaped descendant is then aborted and awaited.
//!
//! On unix the child leads its own process group, so descendants started
//! without `exec` (a shell wrapper around the JVM) die with it.
//!
//! A non-zero exit code is part of the outcome, not an error.

use std::future::Future;
use std::io;
use std::process::{ExitStatus, Stdio};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;

use crate::errors::{Result, TanError};
use crate::process::command::TanProcessRequest;
use crate::process::sink::{TanLogFacadeSink, TanLogSink, TanStreamKind};

/// How long readers may keep draining after the process group was killed.
pub const READER_GRACE: Duration = Duration::from_secs(2);

/// How a supervised process ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TanProcessOutcome {
    /// Exit code, or `-1` if the process was terminated by a signal.
    pub exit_code: i32,
    pub timed_out: bool,
    pub cancelled: bool,
    pub stdout_lines: u64,
    pub stderr_lines: u64,
}

impl TanProcessOutcome {
    pub fn success(&self) -> bool {
        self.exit_code == 0 && !self.timed_out && !self.cancelled
    }
}

enum TanEnding {
    Exited(io::Result<ExitStatus>),
    TimedOut,
    Cancelled,
}

/// Runs external processes with concurrent output draining.
#[derive(Clone)]
pub struct TanProcessOrchestrator {
    sink: Arc<dyn TanLogSink>,
}

impl Default for TanProcessOrchestrator {
    fn default() -> Self {
        Self::new(Arc::new(TanLogFacadeSink::default()))
    }
}

impl std::fmt::Debug for TanProcessOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TanProcessOrchestrator").finish_non_exhaustive()
    }
}

impl TanProcessOrchestrator {
    pub fn new(sink: Arc<dyn TanLogSink>) -> Self {
        Self { sink }
    }

    pub async fn run(
        &self,
        request: &TanProcessRequest,
        timeout: Option<Duration>,
    ) -> Result<TanProcessOutcome> {
        self.run_cancellable(request, timeout, std::future::pending::<()>())
            .await
    }

    /// Like [`run`](Self::run), additionally killing the process as soon as
    /// `cancel` completes.
    pub async fn run_cancellable<C>(
        &self,
        request: &TanProcessRequest,
        timeout: Option<Duration>,
        cancel: C,
    ) -> Result<TanProcessOutcome>
    where
        C: Future<Output = ()>,
    {
        let executable = request.executable.display().to_string();
        let argv = request.argv()?;
        log::info!("Launching: {}", request.command_line());

        let mut command = std::process::Command::new(&request.executable);
        command
            .args(&argv)
            .envs(&request.working_env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &request.working_dir {
            command.current_dir(dir);
        }
        #[cfg(unix)]
        std::os::unix::process::CommandExt::process_group(&mut command, 0);
        let mut command = Command::from(command);
        command.kill_on_drop(true);

        let mut child = command.spawn().map_err(|e| TanError::Launch {
            executable: executable.clone(),
            message: e.to_string(),
        })?;
        log::debug!("Started {} (pid {:?})", executable, child.id());

        let stdout_reader = spawn_reader(child.stdout.take(), TanStreamKind::Stdout, &self.sink);
        let stderr_reader = spawn_reader(child.stderr.take(), TanStreamKind::Stderr, &self.sink);

        let deadline = async {
            match timeout {
                Some(limit) => tokio::time::sleep(limit).await,
                None => std::future::pending::<()>().await,
            }
        };
        tokio::pin!(deadline);
        tokio::pin!(cancel);

        let ending = tokio::select! {
            status = child.wait() => TanEnding::Exited(status),
            _ = &mut deadline => TanEnding::TimedOut,
            _ = &mut cancel => TanEnding::Cancelled,
        };

        let (status, timed_out, cancelled) = match ending {
            TanEnding::Exited(status) => (status, false, false),
            TanEnding::TimedOut => {
                log::warn!("{} exceeded its time limit, killing it", executable);
                (terminate(&mut child).await, true, false)
            }
            TanEnding::Cancelled => {
                log::info!("Cancelling {}", executable);
                (terminate(&mut child).await, false, true)
            }
        };

        let grace = (timed_out || cancelled).then_some(READER_GRACE);
        let stdout_lines = join_reader(stdout_reader, TanStreamKind::Stdout, grace).await;
        let stderr_lines = join_reader(stderr_reader, TanStreamKind::Stderr, grace).await;

        let status = status.map_err(|e| TanError::Execution(e.to_string()))?;
        let outcome = TanProcessOutcome {
            exit_code: status.code().unwrap_or(-1),
            timed_out,
            cancelled,
            stdout_lines,
            stderr_lines,
        };
        log::debug!("{} finished: {:?}", executable, outcome);
        Ok(outcome)
    }
}

async fn terminate(child: &mut Child) -> io::Result<ExitStatus> {
    #[cfg(unix)]
    kill_group(child);
    if let Err(e) = child.kill().await {
        log::warn!("Failed to kill child process: {}", e);
    }
    child.wait().await
}

/// Kills every process in the child's group. The child itself is left for
/// `Child::kill` to reap.
#[cfg(unix)]
fn kill_group(child: &Child) {
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    let Some(pid) = child.id().and_then(|pid| i32::try_from(pid).ok()) else {
        return;
    };
    if let Err(e) = killpg(Pid::from_raw(pid), Signal::SIGKILL) {
        log::warn!("Failed to kill process group {}: {}", pid, e);
    }
}

/// Reader task plus the line count it has delivered so far.
struct TanReader {
    task: JoinHandle<()>,
    lines: Arc<AtomicU64>,
}

fn spawn_reader<S>(
    stream: Option<S>,
    kind: TanStreamKind,
    sink: &Arc<dyn TanLogSink>,
) -> TanReader
where
    S: AsyncRead + Unpin + Send + 'static,
{
    let sink = Arc::clone(sink);
    let lines = Arc::new(AtomicU64::new(0));
    let counter = Arc::clone(&lines);
    let task = tokio::spawn(async move {
        if let Some(stream) = stream {
            drain_lines(stream, kind, sink.as_ref(), &counter).await;
        }
    });
    TanReader { task, lines }
}

/// Copies `stream` to `sink` line by line until it closes. Invalid UTF-8 is
/// replaced rather than rejected.
async fn drain_lines<S>(stream: S, kind: TanStreamKind, sink: &dyn TanLogSink, lines: &AtomicU64)
where
    S: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(stream);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                if buf.last() == Some(&b'\n') {
                    buf.pop();
                }
                if buf.last() == Some(&b'\r') {
                    buf.pop();
                }
                sink.write_line(kind, &String::from_utf8_lossy(&buf));
                lines.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                log::warn!("Reading child {} failed: {}", kind, e);
                break;
            }
        }
    }
}

/// Waits for a reader, at most `grace` if given. A reader past its grace is
/// aborted and still awaited so no task outlives the run.
async fn join_reader(reader: TanReader, kind: TanStreamKind, grace: Option<Duration>) -> u64 {
    let TanReader { mut task, lines } = reader;
    let joined = match grace {
        Some(limit) => match tokio::time::timeout(limit, &mut task).await {
            Ok(joined) => joined,
            Err(_) => {
                log::warn!("Child {} still open {:?} after kill, dropping the rest", kind, limit);
                task.abort();
                task.await
            }
        },
        None => task.await,
    };
    if let Err(e) = joined {
        if !e.is_cancelled() {
            log::warn!("Child {} reader did not finish cleanly: {}", kind, e);
        }
    }
    lines.load(Ordering::Relaxed)
}
