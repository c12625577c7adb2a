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

//! # Tanxi Error Module
//!
//! This module defines the error taxonomy shared by every stage of a profiling
//! run, from row decoding to the external process.
//!
//! ## Error Categories
//!
//! - **UnknownColumn / DuplicateColumn**: configuration errors, raised before
//!   any data is read or any process is spawned
//! - **MalformedRow / Coercion**: stream corruption or type mismatch, fatal to
//!   the dataset that raised them
//! - **Serialization**: job, configuration or data file could not be written
//! - **Launch**: the external executable could not be started
//! - **Execution**: the started process could not be waited on
//! - **Config**: settings could not be loaded or are inconsistent
//! - **Io**: any other filesystem failure
//!
//! A non-zero exit code of the external application is *not* an error; it is
//! reported through [`crate::process::TanProcessOutcome`].
//!
//! Errors are `Clone` so that a failed dataset can hand the recorded error
//! back on every subsequent call.

use std::io;

use thiserror::Error;

use crate::schema::TanSemanticType;

/// Convenience result type used throughout Tanxi.
pub type Result<T> = std::result::Result<T, TanError>;

/// Canonical error enumeration for Tanxi.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum TanError {
    /// A projection requested a column the row schema does not declare.
    #[error("unknown column '{column}' requested from row schema")]
    UnknownColumn { column: String },

    /// The row schema declares the same column name more than once.
    #[error("duplicate column '{column}' in row schema")]
    DuplicateColumn { column: String },

    /// The byte stream ended mid-row or carried a field that contradicts the schema.
    #[error("malformed row {row} at column '{column}': {message}")]
    MalformedRow {
        row: u64,
        column: String,
        message: String,
    },

    /// A decoded value could not be converted to the projection's declared type.
    #[error("cannot coerce column '{column}' at row {row} from {from} to {to}: {message}")]
    Coercion {
        column: String,
        row: u64,
        from: TanSemanticType,
        to: TanSemanticType,
        message: String,
    },

    /// Job, configuration or data file could not be written.
    #[error("failed to write '{path}': {message}")]
    Serialization { path: String, message: String },

    /// The external executable could not be started.
    #[error("failed to launch '{executable}': {message}")]
    Launch { executable: String, message: String },

    /// The external process was started but could not be waited on.
    #[error("failed to wait for external process: {0}")]
    Execution(String),

    /// Settings are missing, unreadable or inconsistent.
    #[error("configuration error: {0}")]
    Config(String),

    /// Errors originating from filesystem IO outside the categories above.
    #[error("io error: {0}")]
    Io(String),
}

impl From<io::Error> for TanError {
    fn from(err: io::Error) -> Self {
        TanError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for TanError {
    fn from(err: serde_json::Error) -> Self {
        TanError::Config(err.to_string())
    }
}

#[cfg(feature = "yaml")]
impl From<serde_yaml::Error> for TanError {
    fn from(err: serde_yaml::Error) -> Self {
        TanError::Config(err.to_string())
    }
}

impl TanError {
    /// Helper to construct malformed-row errors.
    pub fn malformed(row: u64, column: impl Into<String>, message: impl Into<String>) -> Self {
        TanError::MalformedRow {
            row,
            column: column.into(),
            message: message.into(),
        }
    }

    /// Helper to construct serialization errors for a target path.
    pub fn serialization(path: &std::path::Path, message: impl ToString) -> Self {
        TanError::Serialization {
            path: path.display().to_string(),
            message: message.to_string(),
        }
    }

    /// Helper to construct configuration errors.
    pub fn config<T: Into<String>>(message: T) -> Self {
        TanError::Config(message.into())
    }

    /// Whether this error is a configuration error that must block a run
    /// before any data is read or any process is spawned.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            TanError::UnknownColumn { .. } | TanError::DuplicateColumn { .. } | TanError::Config(_)
        )
    }
}
