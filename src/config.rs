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

//! # Configuration
//!
//! Settings for a profiling run and discovery of the analysis application's
//! installation.
//!
//! ## Sources
//!
//! Settings come from a JSON or YAML file (chosen by extension), then the
//! following environment variables override individual fields:
//!
//! | Variable | Field |
//! |---|---|
//! | `TANXI_INSTALLATION_ROOT` | `installation_root` |
//! | `TANXI_JAVA_HOME` | `java_home` |
//! | `TANXI_TIMEOUT_SECS` | `timeout_secs` |
//!
//! ## Edition Detection
//!
//! The installation's `lib` directory is searched for a file whose name
//! contains `DataCleaner-enterprise-edition-core` (Enterprise) or, failing
//! that, `DataCleaner-engine-core` (Community). The version is the part of
//! that file name between the last `-` and the last `.`.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::{Result, TanError};
use crate::export::conf::DEFAULT_MAX_THREADS;
use crate::export::TanMaterializeFormat;
use crate::process::TanApplicationCommand;

pub const ENV_INSTALLATION_ROOT: &str = "TANXI_INSTALLATION_ROOT";
pub const ENV_JAVA_HOME: &str = "TANXI_JAVA_HOME";
pub const ENV_TIMEOUT_SECS: &str = "TANXI_TIMEOUT_SECS";

const ENTERPRISE_MARKER: &str = "DataCleaner-enterprise-edition-core";
const COMMUNITY_MARKER: &str = "DataCleaner-engine-core";
const UNKNOWN_VERSION: &str = "Unknown";

/// Settings for profiling runs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TanSettings {
    pub installation_root: Option<PathBuf>,
    pub java_home: Option<PathBuf>,
    pub supplemental_classpath: Vec<PathBuf>,
    pub max_threads: u32,
    pub ui_visible: bool,
    pub timeout_secs: Option<u64>,
    /// Directory for job, configuration and data files; system temp dir if unset.
    pub temp_dir: Option<PathBuf>,
    pub materialize_format: TanMaterializeFormat,
    /// Keep generated files after a transient run.
    pub keep_files: bool,
}

impl Default for TanSettings {
    fn default() -> Self {
        Self {
            installation_root: None,
            java_home: None,
            supplemental_classpath: Vec::new(),
            max_threads: DEFAULT_MAX_THREADS,
            ui_visible: true,
            timeout_secs: None,
            temp_dir: None,
            materialize_format: TanMaterializeFormat::default(),
            keep_files: false,
        }
    }
}

impl TanSettings {
    /// Loads settings from `path`, then applies environment overrides.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            TanError::config(format!("cannot read settings '{}': {}", path.display(), e))
        })?;
        let settings = Self::parse(path, &text)?;
        settings.with_env_overrides()
    }

    /// Default settings with environment overrides applied.
    pub fn from_env() -> Result<Self> {
        Self::default().with_env_overrides()
    }

    fn parse(path: &Path, text: &str) -> Result<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Ok(serde_json::from_str(text)?),
            #[cfg(feature = "yaml")]
            Some("yaml") | Some("yml") => Ok(serde_yaml::from_str(text)?),
            other => Err(TanError::config(format!(
                "unsupported settings format {:?} for '{}'",
                other.unwrap_or(""),
                path.display()
            ))),
        }
    }

    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides looked up through `lookup`; empty values are ignored.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(root) = value(ENV_INSTALLATION_ROOT) {
            self.installation_root = Some(PathBuf::from(root));
        }
        if let Some(home) = value(ENV_JAVA_HOME) {
            self.java_home = Some(PathBuf::from(home));
        }
        if let Some(secs) = value(ENV_TIMEOUT_SECS) {
            let secs = secs.trim().parse::<u64>().map_err(|e| {
                TanError::config(format!("{} must be a whole number of seconds: {}", ENV_TIMEOUT_SECS, e))
            })?;
            self.timeout_secs = Some(secs);
        }
        Ok(self)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    pub fn temp_dir(&self) -> PathBuf {
        self.temp_dir.clone().unwrap_or_else(std::env::temp_dir)
    }

    /// Launch recipe for the configured installation.
    pub fn application_command(&self) -> Result<TanApplicationCommand> {
        let root = self
            .installation_root
            .as_ref()
            .ok_or_else(|| TanError::config("no installation root configured"))?;
        let mut command = TanApplicationCommand::new(root);
        command.java_home = self.java_home.clone();
        command.supplemental_classpath = self.supplemental_classpath.clone();
        command.ui_visible = self.ui_visible;
        Ok(command)
    }
}

/// Product edition found in an installation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TanEditionKind {
    Community,
    Enterprise,
}

impl fmt::Display for TanEditionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TanEditionKind::Community => f.write_str("Community"),
            TanEditionKind::Enterprise => f.write_str("Enterprise"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TanEdition {
    pub kind: TanEditionKind,
    pub version: String,
}

/// Source of the installation the launcher starts.
pub trait TanConfigProvider: Send + Sync {
    fn installation_root(&self) -> Option<PathBuf>;

    /// Edition and version of the installation, if one can be identified.
    fn edition(&self) -> Option<TanEdition> {
        self.installation_root()
            .and_then(|root| detect_edition(&root))
    }
}

impl TanConfigProvider for TanSettings {
    fn installation_root(&self) -> Option<PathBuf> {
        self.installation_root.clone()
    }
}

/// An installation directory on disk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TanInstallation {
    root: PathBuf,
}

impl TanInstallation {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn lib_dir(&self) -> PathBuf {
        self.root.join("lib")
    }
}

impl TanConfigProvider for TanInstallation {
    fn installation_root(&self) -> Option<PathBuf> {
        Some(self.root.clone())
    }
}

/// Edition of the installation at `root`; `None` without a recognisable `lib` directory.
pub fn detect_edition(root: &Path) -> Option<TanEdition> {
    let lib = root.join("lib");
    let entries = std::fs::read_dir(&lib).ok()?;
    let mut names: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().map(|ty| !ty.is_dir()).unwrap_or(false))
        .filter_map(|entry| entry.file_name().into_string().ok())
        .collect();
    names.sort();

    let find = |marker: &str| names.iter().find(|name| name.contains(marker));
    let (kind, file) = match find(ENTERPRISE_MARKER) {
        Some(file) => (TanEditionKind::Enterprise, file),
        None => (TanEditionKind::Community, find(COMMUNITY_MARKER)?),
    };

    let edition = TanEdition {
        kind,
        version: version_from_file_name(file),
    };
    log::debug!("Detected {} edition {} from {}", edition.kind, edition.version, file);
    Some(edition)
}

/// Text between the last `-` and the last `.`, or `Unknown`.
pub fn version_from_file_name(file_name: &str) -> String {
    match (file_name.rfind('-'), file_name.rfind('.')) {
        (Some(dash), Some(dot)) if dash < dot => file_name[dash + 1..dot].to_string(),
        _ => UNKNOWN_VERSION.to_string(),
    }
}
