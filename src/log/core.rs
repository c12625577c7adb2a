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

use std::io::Write;
use std::sync::OnceLock;
use std::time::{SystemTime, UNIX_EPOCH};

use ::log::{LevelFilter, Log, Metadata, Record};
use serde_json::{json, Map, Value};

use crate::log::config::TanLogConfig;

static LOGGER: OnceLock<TanLogger> = OnceLock::new();
static INSTALLED: OnceLock<bool> = OnceLock::new();

/// Runs `install` on the first call only and replays its result afterwards.
fn install_once(cell: &OnceLock<bool>, install: impl FnOnce() -> bool) -> bool {
    *cell.get_or_init(install)
}

/// `log` backend writing one line per record to stderr.
#[derive(Debug)]
pub struct TanLogger {
    config: TanLogConfig,
    level: LevelFilter,
}

impl TanLogger {
    pub fn new(config: TanLogConfig) -> Self {
        let level = config.level_filter();
        Self { config, level }
    }

    /// Installs the global logger. Safe to call multiple times; the first
    /// call wins and every call returns its result, `false` if another `log`
    /// backend was installed first.
    pub fn init(config: TanLogConfig) -> bool {
        install_once(&INSTALLED, || {
            let logger = LOGGER.get_or_init(|| TanLogger::new(config));
            match ::log::set_logger(logger) {
                Ok(()) => {
                    ::log::set_max_level(logger.level);
                    true
                }
                Err(_) => false,
            }
        })
    }

    pub fn config(&self) -> &TanLogConfig {
        &self.config
    }

    pub fn to_json(record: &Record<'_>) -> Value {
        let ts = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();

        let mut data = Map::new();
        data.insert("level".into(), json!(record.level().as_str()));
        data.insert("target".into(), json!(record.target()));
        data.insert("message".into(), json!(record.args().to_string()));
        data.insert("timestamp_ms".into(), json!(ts));
        Value::Object(data)
    }

    pub fn format(&self, record: &Record<'_>) -> String {
        if self.config.json_format {
            Self::to_json(record).to_string()
        } else {
            format!(
                "{} {:<5} {}: {}",
                chrono::Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ"),
                record.level(),
                record.target(),
                record.args()
            )
        }
    }
}

impl Log for TanLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = self.format(record);
        let stderr = std::io::stderr();
        let mut handle = stderr.lock();
        let _ = writeln!(handle, "{}", line);
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}
