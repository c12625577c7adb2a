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

//! # Output Sinks
//!
//! Destinations for the lines a child process writes. Both stream readers
//! share one sink, so every implementation delivers a line as a unit: lines
//! from the two streams may alternate but never mix within a line.

use std::fmt;
use std::io::Write;
use std::sync::Mutex;

/// Which pipe a line came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TanStreamKind {
    Stdout,
    Stderr,
}

impl fmt::Display for TanStreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TanStreamKind::Stdout => f.write_str("stdout"),
            TanStreamKind::Stderr => f.write_str("stderr"),
        }
    }
}

/// Receives child output one line at a time, without the line terminator.
pub trait TanLogSink: Send + Sync {
    fn write_line(&self, stream: TanStreamKind, line: &str);
}

/// Forwards lines to the `log` facade: stdout at info, stderr at warn.
#[derive(Clone, Debug)]
pub struct TanLogFacadeSink {
    target: String,
}

impl Default for TanLogFacadeSink {
    fn default() -> Self {
        Self::new("tanxi::child")
    }
}

impl TanLogFacadeSink {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
        }
    }
}

impl TanLogSink for TanLogFacadeSink {
    fn write_line(&self, stream: TanStreamKind, line: &str) {
        match stream {
            TanStreamKind::Stdout => log::info!(target: self.target.as_str(), "{}", line),
            TanStreamKind::Stderr => log::warn!(target: self.target.as_str(), "{}", line),
        }
    }
}

/// Writes `[stream] line` records to any writer behind a mutex.
pub struct TanWriterSink<W> {
    inner: Mutex<W>,
}

impl<W: Write + Send> TanWriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            inner: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        match self.inner.into_inner() {
            Ok(writer) => writer,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl<W: Write + Send> TanLogSink for TanWriterSink<W> {
    fn write_line(&self, stream: TanStreamKind, line: &str) {
        let mut writer = match self.inner.lock() {
            Ok(writer) => writer,
            Err(poisoned) => poisoned.into_inner(),
        };
        let _ = writeln!(writer, "[{}] {}", stream, line);
    }
}

/// Keeps every line in memory, in arrival order.
#[derive(Debug, Default)]
pub struct TanMemorySink {
    lines: Mutex<Vec<(TanStreamKind, String)>>,
}

impl TanMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<(TanStreamKind, String)> {
        match self.lines.lock() {
            Ok(lines) => lines.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Lines of one stream only.
    pub fn stream(&self, kind: TanStreamKind) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter(|(stream, _)| *stream == kind)
            .map(|(_, line)| line)
            .collect()
    }
}

impl TanLogSink for TanMemorySink {
    fn write_line(&self, stream: TanStreamKind, line: &str) {
        let mut lines = match self.lines.lock() {
            Ok(lines) => lines,
            Err(poisoned) => poisoned.into_inner(),
        };
        lines.push((stream, line.to_string()));
    }
}
