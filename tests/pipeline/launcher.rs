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

//! # Tanxi Pipeline Tests - Launcher
//!
//! This module contains end-to-end tests for the launcher. Each test builds a
//! fake installation whose `java` is a shell script, so the whole flow runs
//! from row stream to subprocess without the real analysis application.
//!
//! ## Test Categories
//!
//! - **Profiling Tests**: Verify data, job and configuration files reach the
//!   application and are cleaned up or kept per run mode
//! - **Failure Tests**: Verify configuration and stream errors stop the launch
//!   before any process is spawned
//! - **Lifecycle Tests**: Verify exit codes, cancellation and the bare
//!   profiler launch
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test --test launcher
//! ```

#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tanxi::inspect::TanAnalyzerKind;
use tanxi::process::{TanMemorySink, TanProcessOrchestrator, TanStreamKind};
use tanxi::{
    TanError, TanLaunchOptions, TanLauncher, TanMemoryHost, TanProjection, TanRowEncoder,
    TanRowSchema, TanSemanticType, TanSession, TanSettings, TanValue,
};

const REPORTING_JAVA: &str = r#"#!/bin/sh
echo "home=$DATACLEANER_HOME"
for a in "$@"; do echo "arg=$a"; done
while [ $# -gt 0 ]; do
  case "$1" in
    -job|-conf) test -s "$2" && echo "exists $1" ;;
  esac
  shift
done
"#;

struct Fixture {
    _dir: tempfile::TempDir,
    root: PathBuf,
    java_home: PathBuf,
    work: PathBuf,
}

impl Fixture {
    fn new(java_script: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("datacleaner");
        std::fs::create_dir_all(root.join("lib")).unwrap();
        std::fs::write(root.join("lib").join("DataCleaner-engine-core-5.1.jar"), b"").unwrap();

        let java_home = dir.path().join("jdk");
        std::fs::create_dir_all(java_home.join("bin")).unwrap();
        let java = java_home.join("bin").join("java");
        std::fs::write(&java, java_script).unwrap();
        std::fs::set_permissions(&java, std::fs::Permissions::from_mode(0o755)).unwrap();

        let work = dir.path().join("work");
        std::fs::create_dir_all(&work).unwrap();

        Self {
            _dir: dir,
            root,
            java_home,
            work,
        }
    }

    fn settings(&self) -> TanSettings {
        TanSettings {
            installation_root: Some(self.root.clone()),
            java_home: Some(self.java_home.clone()),
            temp_dir: Some(self.work.clone()),
            timeout_secs: Some(60),
            ..Default::default()
        }
    }

    fn work_files(&self) -> usize {
        std::fs::read_dir(&self.work).unwrap().count()
    }
}

fn customer_schema() -> TanRowSchema {
    TanRowSchema::new([
        ("id", TanSemanticType::Number),
        ("name", TanSemanticType::String),
        ("signup", TanSemanticType::Date),
    ])
    .unwrap()
}

fn customer_rows() -> Vec<Vec<TanValue>> {
    vec![
        vec![
            TanValue::Number(1.0),
            TanValue::String("Ann".into()),
            TanValue::date_millis(1_577_836_800_000).unwrap(),
        ],
        vec![
            TanValue::Number(2.0),
            TanValue::String("Bo".into()),
            TanValue::date_millis(1_580_601_600_000).unwrap(),
        ],
        vec![TanValue::Number(3.0), TanValue::String("Cy".into()), TanValue::Null],
    ]
}

fn customer_session(fixture: &Fixture) -> TanSession {
    let host = TanMemoryHost::new("customers", "Select values", customer_schema(), &customer_rows())
        .unwrap();
    TanSession::new(fixture.settings(), host)
}

fn launcher() -> (TanLauncher, Arc<TanMemorySink>) {
    let sink = Arc::new(TanMemorySink::new());
    (TanLauncher::new(TanProcessOrchestrator::new(sink.clone())), sink)
}

fn exists(path: &Option<PathBuf>) -> bool {
    path.as_deref().is_some_and(Path::exists)
}

/// Tests the three-customer scenario with persistent files.
///
/// Expects five analyzers in order, the launch arguments and environment seen
/// by the application, and all three files left in the work directory.
#[tokio::test]
async fn test_profiles_three_customers_end_to_end() {
    let fixture = Fixture::new(REPORTING_JAVA);
    let session = customer_session(&fixture);
    let (launcher, sink) = launcher();

    let report = launcher
        .profile_step(&session, TanLaunchOptions::default().persistent())
        .unwrap()
        .wait()
        .await
        .unwrap();

    assert_eq!(report.rows, 3);
    assert_eq!(report.outcome.exit_code, 0);
    assert!(report.retained);

    let job = report.job.as_ref().unwrap();
    assert_eq!(job.datastore_name, "customers");
    assert_eq!(job.table_name, "Select values");
    let kinds: Vec<_> = job.analyzers.iter().map(|a| a.kind).collect();
    assert_eq!(
        kinds,
        vec![
            TanAnalyzerKind::UniqueKeyCheck,
            TanAnalyzerKind::Completeness,
            TanAnalyzerKind::Number,
            TanAnalyzerKind::DateAndTime,
            TanAnalyzerKind::String,
        ]
    );
    assert_eq!(job.analyzers[0].target_columns[0].name, "id");
    assert_eq!(job.analyzers[1].target_columns.len(), 3);
    assert_eq!(job.analyzers[3].target_columns[0].name, "signup");

    let stdout = sink.stream(TanStreamKind::Stdout);
    assert!(stdout.contains(&format!("home={}", fixture.root.display())));
    assert!(stdout.contains(&"arg=-cp".to_string()));
    assert!(stdout.contains(&"arg=-Ddatacleaner.embed.client=Kettle".to_string()));
    assert!(stdout.contains(&"arg=org.eobjects.datacleaner.Main".to_string()));
    assert!(stdout.contains(&"arg=customers".to_string()));
    assert!(stdout.contains(&"exists -job".to_string()));
    assert!(stdout.contains(&"exists -conf".to_string()));

    assert!(exists(&report.artifacts.data_file));
    let job_xml = std::fs::read_to_string(report.artifacts.job_file.as_ref().unwrap()).unwrap();
    assert!(job_xml.contains("<analyzer name=\"Uniqueness of id\">"));
    assert_eq!(fixture.work_files(), 3);
}

/// Tests that a transient run removes every file it generated.
#[tokio::test]
async fn test_transient_runs_remove_their_files() {
    let fixture = Fixture::new(REPORTING_JAVA);
    let session = customer_session(&fixture);
    let (launcher, _) = launcher();

    let report = launcher
        .profile_step(&session, TanLaunchOptions::default())
        .unwrap()
        .wait()
        .await
        .unwrap();

    assert!(!report.retained);
    assert!(!exists(&report.artifacts.job_file));
    assert!(!exists(&report.artifacts.conf_file));
    assert!(!exists(&report.artifacts.data_file));
    assert_eq!(fixture.work_files(), 0);
}

/// Tests that a minimal job declares the source columns and no analyzers.
#[tokio::test]
async fn test_minimal_mode_declares_columns_only() {
    let fixture = Fixture::new(REPORTING_JAVA);
    let session = customer_session(&fixture);
    let (launcher, _) = launcher();

    let report = launcher
        .profile_step(&session, TanLaunchOptions::minimal())
        .unwrap()
        .wait()
        .await
        .unwrap();

    let job = report.job.unwrap();
    assert!(job.analyzers.is_empty());
    assert_eq!(job.source_columns.len(), 3);
}

/// Tests that a failing application is reported through the outcome.
#[tokio::test]
async fn test_non_zero_exit_is_reported_not_raised() {
    let fixture = Fixture::new("#!/bin/sh\necho failing >&2\nexit 7\n");
    let session = customer_session(&fixture);
    let (launcher, sink) = launcher();

    let report = launcher
        .profile_step(&session, TanLaunchOptions::default())
        .unwrap()
        .wait()
        .await
        .unwrap();

    assert_eq!(report.outcome.exit_code, 7);
    assert!(!report.outcome.success());
    assert_eq!(sink.stream(TanStreamKind::Stderr), vec!["failing"]);
    assert_eq!(fixture.work_files(), 0);
}

/// Tests that an unknown projection column fails before anything is written.
#[tokio::test]
async fn test_unknown_projection_blocks_the_launch() {
    let fixture = Fixture::new(REPORTING_JAVA);
    let session = customer_session(&fixture);
    let (launcher, sink) = launcher();

    let options = TanLaunchOptions {
        projection: Some(TanProjection::of(["id", "email"])),
        ..Default::default()
    };
    let err = launcher.profile_step(&session, options).unwrap_err();

    assert_eq!(err, TanError::UnknownColumn { column: "email".into() });
    assert!(err.is_configuration());
    assert_eq!(fixture.work_files(), 0);
    assert!(sink.lines().is_empty());
}

/// Tests that a truncated row stream aborts the launch before spawning.
#[tokio::test]
async fn test_malformed_rows_abort_before_spawn() {
    let fixture = Fixture::new(REPORTING_JAVA);
    let mut encoder = TanRowEncoder::new(Vec::new(), customer_schema());
    for row in customer_rows() {
        encoder.encode(&row).unwrap();
    }
    let mut bytes = encoder.finish().unwrap();
    bytes.truncate(bytes.len() - 2);
    let host = TanMemoryHost::from_bytes("customers", "Select values", customer_schema(), bytes);
    let session = TanSession::new(fixture.settings(), host);
    let (launcher, sink) = launcher();

    let err = launcher
        .profile_step(&session, TanLaunchOptions::default())
        .unwrap_err();

    assert!(matches!(err, TanError::MalformedRow { row: 2, .. }));
    assert_eq!(fixture.work_files(), 0);
    assert!(sink.lines().is_empty());
}

/// Tests that settings without an installation root are rejected.
#[tokio::test]
async fn test_missing_installation_is_a_configuration_error() {
    let fixture = Fixture::new(REPORTING_JAVA);
    let host = TanMemoryHost::new("customers", "Select values", customer_schema(), &[]).unwrap();
    let settings = TanSettings {
        installation_root: None,
        ..fixture.settings()
    };
    let session = TanSession::new(settings, host);
    let (launcher, _) = launcher();

    let err = launcher
        .profile_step(&session, TanLaunchOptions::default())
        .unwrap_err();
    assert!(err.is_configuration());
}

/// Tests the bare profiler launch without job or configuration.
#[tokio::test]
async fn test_open_profiler_passes_no_job() {
    let fixture = Fixture::new(REPORTING_JAVA);
    let session = customer_session(&fixture);
    let (launcher, sink) = launcher();

    let report = launcher.open_profiler(&session).unwrap().wait().await.unwrap();

    assert_eq!(report.outcome.exit_code, 0);
    assert!(report.job.is_none());
    let stdout = sink.stream(TanStreamKind::Stdout);
    assert!(stdout.contains(&"arg=org.eobjects.datacleaner.Main".to_string()));
    assert!(!stdout.iter().any(|line| line == "arg=-job" || line == "arg=-conf"));
    assert_eq!(fixture.work_files(), 0);
}

/// Tests that a cancelled run stops promptly and still cleans up.
///
/// The fake application forks `sleep` rather than exec'ing it, so the
/// sleeping descendant holds the output pipes.
#[tokio::test]
async fn test_cancelled_run_still_cleans_up() {
    let fixture = Fixture::new("#!/bin/sh\necho running\nsleep 30\necho done\n");
    let session = customer_session(&fixture);
    let (launcher, _) = launcher();

    let mut handle = launcher
        .profile_step(&session, TanLaunchOptions::default())
        .unwrap();
    tokio::time::sleep(Duration::from_millis(300)).await;
    let cancelled_at = Instant::now();
    handle.cancel();
    let report = handle.wait().await.unwrap();

    let elapsed = cancelled_at.elapsed();
    assert!(elapsed < Duration::from_secs(4), "cancel took {:?}", elapsed);
    assert!(report.outcome.cancelled);
    assert_eq!(fixture.work_files(), 0);
}

/// Tests edition detection from the fake installation's `lib` directory.
#[tokio::test]
async fn test_edition_is_detected_from_installation() {
    let fixture = Fixture::new(REPORTING_JAVA);
    let session = customer_session(&fixture);
    let edition = session.edition().unwrap();
    assert_eq!(edition.kind, tanxi::TanEditionKind::Community);
    assert_eq!(edition.version, "5.1");
}
