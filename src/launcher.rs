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

//! # Launcher
//!
//! Composition root of a profiling action. For the session's selected step
//! the launcher
//!
//! 1. opens the host's row stream as a columnar dataset,
//! 2. materializes it to a data file,
//! 3. selects analyzers for the dataset's columns,
//! 4. writes the job and the run configuration,
//! 5. starts the analysis application on a background task.
//!
//! Steps 1 to 4 run on the caller's thread and any failure aborts the launch
//! before a process is spawned; files written up to that point are removed.
//! Step 5 returns a [`TanLaunchHandle`] the caller may await, cancel or
//! detach. Spawning requires a running tokio runtime.

use std::path::PathBuf;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::errors::{Result, TanError};
use crate::export::{
    materialize, TanConfWriter, TanDatastoreDecl, TanJobWriter, TanMaterializeFormat,
};
use crate::ingest::TanColumnarDataset;
use crate::inspect::{TanJobMode, TanJobSpec};
use crate::process::{TanLaunchArgs, TanProcessOrchestrator, TanProcessOutcome, TanProcessRequest};
use crate::schema::{TanColumn, TanProjection};
use crate::session::TanSession;

/// Whether generated files outlive the run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TanRunMode {
    /// Interactive profiling: files are removed once the application exits.
    #[default]
    Transient,
    /// Batch use: files are kept for the caller.
    Persistent,
}

#[derive(Clone, Debug, Default)]
pub struct TanLaunchOptions {
    pub job_mode: TanJobMode,
    pub run_mode: TanRunMode,
    /// Columns to profile; every schema column when `None`.
    pub projection: Option<TanProjection>,
    /// Overrides the settings' materialization format.
    pub materialize_format: Option<TanMaterializeFormat>,
    pub output_type: Option<String>,
    pub output_file: Option<PathBuf>,
    pub extra_args: Vec<String>,
    /// Overrides the settings' timeout.
    pub timeout: Option<Duration>,
}

impl TanLaunchOptions {
    pub fn minimal() -> Self {
        Self {
            job_mode: TanJobMode::Minimal,
            ..Default::default()
        }
    }

    pub fn persistent(mut self) -> Self {
        self.run_mode = TanRunMode::Persistent;
        self
    }
}

/// Files generated for one run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TanArtifacts {
    pub data_file: Option<PathBuf>,
    pub job_file: Option<PathBuf>,
    pub conf_file: Option<PathBuf>,
}

impl TanArtifacts {
    pub fn paths(&self) -> impl Iterator<Item = &PathBuf> {
        [&self.conf_file, &self.job_file, &self.data_file]
            .into_iter()
            .flatten()
    }

    /// Best-effort removal; failures are logged and otherwise ignored.
    pub fn remove(&self) {
        for path in self.paths() {
            match std::fs::remove_file(path) {
                Ok(()) => log::debug!("Removed {}", path.display()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => log::warn!("Failed to remove {}: {}", path.display(), e),
            }
        }
    }
}

/// Result of a finished launch.
#[derive(Clone, Debug, PartialEq)]
pub struct TanLaunchReport {
    pub outcome: TanProcessOutcome,
    pub rows: u64,
    pub job: Option<TanJobSpec>,
    pub artifacts: TanArtifacts,
    /// Whether the artifacts still exist.
    pub retained: bool,
}

/// A launch that is ready to spawn.
#[derive(Clone, Debug)]
pub struct TanPreparedLaunch {
    pub request: TanProcessRequest,
    pub rows: u64,
    pub job: Option<TanJobSpec>,
    pub artifacts: TanArtifacts,
    pub cleanup: bool,
    pub timeout: Option<Duration>,
}

/// Handle on a launched run.
#[derive(Debug)]
pub struct TanLaunchHandle {
    task: JoinHandle<Result<TanLaunchReport>>,
    cancel: Option<oneshot::Sender<()>>,
}

impl TanLaunchHandle {
    /// Waits for the application to exit and cleanup to finish.
    pub async fn wait(self) -> Result<TanLaunchReport> {
        self.task
            .await
            .map_err(|e| TanError::Execution(format!("launch task failed: {}", e)))?
    }

    /// Asks the run to kill the application. The report is still obtained
    /// through [`wait`](Self::wait).
    pub fn cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            let _ = cancel.send(());
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Lets the run continue unobserved.
    pub fn detach(self) {
        log::debug!("Launch detached");
    }
}

#[derive(Clone, Debug, Default)]
pub struct TanLauncher {
    orchestrator: TanProcessOrchestrator,
    job_writer: TanJobWriter,
}

impl TanLauncher {
    pub fn new(orchestrator: TanProcessOrchestrator) -> Self {
        Self {
            orchestrator,
            job_writer: TanJobWriter::default(),
        }
    }

    pub fn with_job_writer(mut self, job_writer: TanJobWriter) -> Self {
        self.job_writer = job_writer;
        self
    }

    /// Profiles the session's step and starts the application on it.
    pub fn profile_step(&self, session: &TanSession, options: TanLaunchOptions) -> Result<TanLaunchHandle> {
        let prepared = self.prepare(session, &options)?;
        Ok(self.spawn(prepared))
    }

    /// Starts the application without a job, configuration or datastore.
    pub fn open_profiler(&self, session: &TanSession) -> Result<TanLaunchHandle> {
        let command = session.settings().application_command()?;
        let prepared = TanPreparedLaunch {
            request: command.request(&TanLaunchArgs::default()),
            rows: 0,
            job: None,
            artifacts: TanArtifacts::default(),
            cleanup: false,
            timeout: session.settings().timeout(),
        };
        Ok(self.spawn(prepared))
    }

    /// Runs every step up to, but excluding, the spawn.
    pub fn prepare(&self, session: &TanSession, options: &TanLaunchOptions) -> Result<TanPreparedLaunch> {
        let settings = session.settings();
        let host = session.host();
        let command = settings.application_command()?;

        let schema = host.row_schema()?;
        let projection = options
            .projection
            .clone()
            .unwrap_or_else(|| TanProjection::all(&schema));
        let mut dataset = TanColumnarDataset::new(schema, &projection, host.open_row_stream()?)?;
        let columns: Vec<TanColumn> = dataset.columns().cloned().collect();

        let format = options.materialize_format.unwrap_or(settings.materialize_format);
        let mut artifacts = TanArtifacts::default();

        let data_file = session.artifact_path("datacleaner-data", format.extension());
        let rows = materialize(&mut dataset, &data_file, format);
        dataset.close();
        let rows = rows?;
        artifacts.data_file = Some(data_file.clone());

        let datastore_name = host.transformation_name().to_string();
        let job = session.selection().build_job(
            datastore_name.clone(),
            data_file.clone(),
            host.step_name(),
            &columns,
            options.job_mode,
        );

        let written = self.write_descriptors(session, &job, format, &mut artifacts);
        if let Err(err) = written {
            artifacts.remove();
            return Err(err);
        }

        let launch = TanLaunchArgs {
            conf_file: artifacts.conf_file.clone(),
            job_file: artifacts.job_file.clone(),
            datastore_name: Some(datastore_name),
            output_type: options.output_type.clone(),
            output_file: options.output_file.clone(),
            extra_args: options.extra_args.clone(),
        };

        Ok(TanPreparedLaunch {
            request: command.request(&launch),
            rows,
            job: Some(job),
            artifacts,
            cleanup: options.run_mode == TanRunMode::Transient && !settings.keep_files,
            timeout: options.timeout.or_else(|| settings.timeout()),
        })
    }

    fn write_descriptors(
        &self,
        session: &TanSession,
        job: &TanJobSpec,
        format: TanMaterializeFormat,
        artifacts: &mut TanArtifacts,
    ) -> Result<()> {
        let job_file = session.artifact_path("datacleaner-job", "xml");
        self.job_writer.write(job, &job_file)?;
        artifacts.job_file = Some(job_file);

        let conf_file = session.artifact_path("datacleaner-conf", "xml");
        let datastore = TanDatastoreDecl::new(
            job.datastore_name.clone(),
            job.datastore_location.clone(),
            format.into(),
        );
        TanConfWriter::new()
            .with_max_threads(session.settings().max_threads)
            .write(&datastore, &conf_file)?;
        artifacts.conf_file = Some(conf_file);
        Ok(())
    }

    /// Starts a prepared launch on the tokio runtime.
    pub fn spawn(&self, prepared: TanPreparedLaunch) -> TanLaunchHandle {
        let (cancel_tx, cancel_rx) = oneshot::channel();
        let orchestrator = self.orchestrator.clone();
        let task = tokio::spawn(async move {
            let cancel = async move {
                if cancel_rx.await.is_err() {
                    std::future::pending::<()>().await;
                }
            };
            run_prepared(orchestrator, prepared, cancel).await
        });
        TanLaunchHandle {
            task,
            cancel: Some(cancel_tx),
        }
    }
}

async fn run_prepared<C>(
    orchestrator: TanProcessOrchestrator,
    prepared: TanPreparedLaunch,
    cancel: C,
) -> Result<TanLaunchReport>
where
    C: std::future::Future<Output = ()>,
{
    let result = orchestrator
        .run_cancellable(&prepared.request, prepared.timeout, cancel)
        .await;

    if prepared.cleanup {
        prepared.artifacts.remove();
    }

    let outcome = result?;
    if outcome.exit_code != 0 {
        log::error!("unexpected exit code {}", outcome.exit_code);
    }

    Ok(TanLaunchReport {
        outcome,
        rows: prepared.rows,
        job: prepared.job,
        retained: !prepared.cleanup && prepared.artifacts.paths().next().is_some(),
        artifacts: prepared.artifacts,
    })
}
