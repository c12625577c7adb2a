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

//! # Tanxi Core Library
//!
//! Tanxi bridges a row-oriented transformation engine and a column-oriented
//! profiling application. It turns a step's live row stream into a columnar
//! dataset, synthesizes an analysis job for the step's columns, and runs the
//! profiling application as a supervised subprocess.
//!
//! ## Module Overview
//!
//! - **schema**: row schemas, columns and projections
//! - **record**: tagged field values, decoded rows and coercion
//! - **ingest**: binary row decoding and the columnar dataset adapter
//! - **inspect**: heuristic analyzer selection and job specifications
//! - **export**: job XML, configuration XML and data file materialization
//! - **process**: command assembly, output sinks and the process orchestrator
//! - **config**: settings and installation discovery
//! - **host**: the transformation engine as seen by Tanxi
//! - **session**: caller-owned profiling session
//! - **launcher**: composition root tying the stages together
//! - **log**: `log` backend with plain or JSON output
//!
//! ## Feature Flags
//!
//! - `csv`: CSV materialization
//! - `yaml`: YAML settings files
//! - `full`: Enables all features
//!
//! ## Quick Start
//!
//! ```rust
//! use tanxi::{TanFileHost, TanLaunchOptions, TanLauncher, TanSession, TanSettings};
//!
//! let settings = TanSettings::load(Path::new("tanxi.yaml"))?;
//! let host = TanFileHost::new("customers", "Select values", "/tmp/customers.bin");
//! let session = TanSession::new(settings, host);
//!
//! let handle = TanLauncher::default().profile_step(&session, TanLaunchOptions::default())?;
//! let report = handle.wait().await?;
//! println!("exit code {}", report.outcome.exit_code);
//! ```
//!
//! ## Error Handling
//!
//! All operations return `Result<T, TanError>`. A non-zero exit code of the
//! profiling application is not an error; it is part of the launch report.

pub mod config;
pub mod errors;
pub mod export;
pub mod host;
pub mod ingest;
pub mod inspect;
pub mod launcher;
pub mod log;
pub mod process;
pub mod record;
pub mod schema;
pub mod session;

pub use config::{TanConfigProvider, TanEdition, TanEditionKind, TanInstallation, TanSettings};
pub use errors::{Result, TanError};
pub use export::{
    materialize, TanConfWriter, TanDatastoreDecl, TanDatastoreKind, TanJobWriter,
    TanMaterializeFormat,
};
pub use host::{TanFileHost, TanHostEnvironment, TanMemoryHost};
pub use ingest::{TanColumnarDataset, TanDatasetState, TanRowDecoder, TanRowEncoder};
pub use inspect::{TanAnalyzerKind, TanAnalyzerSpec, TanJobMode, TanJobSpec, TanSelectionEngine};
pub use launcher::{
    TanArtifacts, TanLaunchHandle, TanLaunchOptions, TanLaunchReport, TanLauncher, TanRunMode,
};
pub use process::{
    TanApplicationCommand, TanLaunchArgs, TanLogSink, TanProcessOrchestrator, TanProcessOutcome,
    TanProcessRequest,
};
pub use record::{TanDecodedRow, TanValue};
pub use schema::{TanColumn, TanProjection, TanRowSchema, TanSemanticType};
pub use session::TanSession;
