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

//! # Profiling Session
//!
//! A [`TanSession`] bundles what a profiling action needs: settings, the host
//! that supplies rows and the selection engine. It is created by the caller
//! and passed by reference to the launcher; nothing in the crate keeps one
//! globally.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::config::{TanConfigProvider, TanEdition, TanSettings};
use crate::host::TanHostEnvironment;
use crate::inspect::TanSelectionEngine;

pub struct TanSession {
    settings: TanSettings,
    host: Box<dyn TanHostEnvironment>,
    selection: TanSelectionEngine,
    artifact_counter: AtomicU64,
}

impl std::fmt::Debug for TanSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TanSession")
            .field("settings", &self.settings)
            .field("transformation", &self.host.transformation_name())
            .field("step", &self.host.step_name())
            .finish_non_exhaustive()
    }
}

impl TanSession {
    pub fn new(settings: TanSettings, host: impl TanHostEnvironment + 'static) -> Self {
        Self {
            settings,
            host: Box::new(host),
            selection: TanSelectionEngine::new(),
            artifact_counter: AtomicU64::new(0),
        }
    }

    pub fn with_selection(mut self, selection: TanSelectionEngine) -> Self {
        self.selection = selection;
        self
    }

    pub fn settings(&self) -> &TanSettings {
        &self.settings
    }

    pub fn host(&self) -> &dyn TanHostEnvironment {
        self.host.as_ref()
    }

    pub fn selection(&self) -> &TanSelectionEngine {
        &self.selection
    }

    pub fn edition(&self) -> Option<TanEdition> {
        self.settings.edition()
    }

    /// Fresh path in the configured temp directory, e.g.
    /// `datacleaner-job-4711-1700000000000-0.xml`.
    pub fn artifact_path(&self, prefix: &str, extension: &str) -> PathBuf {
        let sequence = self.artifact_counter.fetch_add(1, Ordering::Relaxed);
        self.settings.temp_dir().join(format!(
            "{}-{}-{}-{}.{}",
            prefix,
            std::process::id(),
            chrono::Utc::now().timestamp_millis(),
            sequence,
            extension
        ))
    }
}
