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

//! # Data Export Module
//!
//! Everything the analysis application reads from disk is produced here.
//!
//! ## Module Components
//!
//! - **Job** ([job.rs](job/index.html)): analysis job description XML
//! - **Conf** ([conf.rs](conf/index.html)): run configuration XML with the datastore catalog
//! - **Materialize** ([materialize.rs](materialize/index.html)): drains a dataset into a data file
//!
//! ## Atomic Writes
//!
//! Every file is written through [`write_atomic`]: content goes to a temporary
//! file in the target directory which is renamed over the target only after
//! the write completed. A failed write leaves no file behind, so the consumer
//! never sees a partial job, configuration or data file.

pub mod conf;
pub mod job;
pub mod materialize;

pub use conf::{TanConfWriter, TanDatastoreDecl, TanDatastoreKind, KETTLE_DATASTORE_CLASS};
pub use job::{TanJobMetadata, TanJobWriter, JOB_NAMESPACE};
pub use materialize::{materialize, TanMaterializeFormat};

use std::io::{BufWriter, Write};
use std::path::Path;

use crate::errors::{Result, TanError};

/// Writes `path` atomically through `write`.
///
/// Plain IO failures, from the closure or from the rename, are reported as
/// [`TanError::Serialization`] for `path`. Any other error returned by the
/// closure propagates unchanged. In both cases nothing is left at `path`.
pub fn write_atomic<T, F>(path: &Path, write: F) -> Result<T>
where
    F: FnOnce(&mut dyn Write) -> Result<T>,
{
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let temp = tempfile::Builder::new()
        .prefix(".tanxi-")
        .suffix(".tmp")
        .tempfile_in(parent)
        .map_err(|e| TanError::serialization(path, e))?;

    let value = {
        let mut writer = BufWriter::new(temp.as_file());
        let value = write(&mut writer).map_err(|err| as_serialization(path, err))?;
        writer.flush().map_err(|e| TanError::serialization(path, e))?;
        value
    };

    temp.persist(path)
        .map_err(|e| TanError::serialization(path, e.error))?;
    log::debug!("Wrote {}", path.display());
    Ok(value)
}

fn as_serialization(path: &Path, err: TanError) -> TanError {
    match err {
        TanError::Io(message) => TanError::Serialization {
            path: path.display().to_string(),
            message,
        },
        other => other,
    }
}

/// Escapes text for use inside an XML attribute value or element body.
pub fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            other => escaped.push(other),
        }
    }
    escaped
}
