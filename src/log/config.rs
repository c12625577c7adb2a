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

use ::log::LevelFilter;
use serde::{Deserialize, Serialize};

/// Configuration for the [`TanLogger`](super::core::TanLogger).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TanLogConfig {
    /// Minimum level written: `TRACE`, `DEBUG`, `INFO`, `WARN`/`WARNING`, `ERROR` or `OFF`.
    pub default_level: String,
    /// One JSON object per line instead of plain text.
    pub json_format: bool,
}

impl Default for TanLogConfig {
    fn default() -> Self {
        TanLogConfig {
            default_level: "INFO".to_string(),
            json_format: false,
        }
    }
}

impl TanLogConfig {
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.default_level = level.into();
        self
    }

    pub fn with_json(mut self, json_format: bool) -> Self {
        self.json_format = json_format;
        self
    }

    /// Parsed threshold. Unrecognised names fall back to `Info`.
    pub fn level_filter(&self) -> LevelFilter {
        match self.default_level.to_ascii_uppercase().as_str() {
            "OFF" => LevelFilter::Off,
            "TRACE" => LevelFilter::Trace,
            "DEBUG" => LevelFilter::Debug,
            "WARN" | "WARNING" => LevelFilter::Warn,
            "ERROR" => LevelFilter::Error,
            _ => LevelFilter::Info,
        }
    }
}
