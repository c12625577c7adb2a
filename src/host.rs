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

//! # Host Environment
//!
//! The transformation engine that produces rows is consumed through
//! [`TanHostEnvironment`]: it names the transformation and the selected step,
//! declares the step's row schema and opens a stream of encoded rows.
//!
//! Two hosts ship with the crate. [`TanFileHost`] reads a self-describing
//! row stream file (header followed by rows), as written by the row stream
//! materializer or an engine-side writer. [`TanMemoryHost`] serves rows held
//! in memory.

use std::fs::File;
use std::io::{BufReader, Cursor, Read};
use std::path::{Path, PathBuf};

use crate::errors::{Result, TanError};
use crate::ingest::{read_stream_header, TanRowEncoder};
use crate::record::TanValue;
use crate::schema::TanRowSchema;

/// Row stream handed out by a host.
pub type TanRowStream = Box<dyn Read + Send>;

pub trait TanHostEnvironment {
    /// Name of the active transformation; used as the datastore name.
    fn transformation_name(&self) -> &str;

    /// Name of the selected step; used as the datastore's table name.
    fn step_name(&self) -> &str;

    fn row_schema(&self) -> Result<TanRowSchema>;

    /// Opens the step's rows, positioned on the first row.
    fn open_row_stream(&self) -> Result<TanRowStream>;
}

/// Host backed by a row stream file.
#[derive(Clone, Debug)]
pub struct TanFileHost {
    transformation_name: String,
    step_name: String,
    path: PathBuf,
}

impl TanFileHost {
    pub fn new(
        transformation_name: impl Into<String>,
        step_name: impl Into<String>,
        path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            transformation_name: transformation_name.into(),
            step_name: step_name.into(),
            path: path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open(&self) -> Result<BufReader<File>> {
        let file = File::open(&self.path).map_err(|e| {
            TanError::Io(format!("cannot open row stream '{}': {}", self.path.display(), e))
        })?;
        Ok(BufReader::new(file))
    }
}

impl TanHostEnvironment for TanFileHost {
    fn transformation_name(&self) -> &str {
        &self.transformation_name
    }

    fn step_name(&self) -> &str {
        &self.step_name
    }

    fn row_schema(&self) -> Result<TanRowSchema> {
        read_stream_header(&mut self.open()?)
    }

    fn open_row_stream(&self) -> Result<TanRowStream> {
        let mut reader = self.open()?;
        read_stream_header(&mut reader)?;
        Ok(Box::new(reader))
    }
}

/// Host serving pre-encoded rows from memory.
#[derive(Clone, Debug)]
pub struct TanMemoryHost {
    transformation_name: String,
    step_name: String,
    schema: TanRowSchema,
    rows: Vec<u8>,
}

impl TanMemoryHost {
    /// Encodes `rows` against `schema`; fails if a row does not fit the schema.
    pub fn new(
        transformation_name: impl Into<String>,
        step_name: impl Into<String>,
        schema: TanRowSchema,
        rows: &[Vec<TanValue>],
    ) -> Result<Self> {
        let mut encoder = TanRowEncoder::new(Vec::new(), schema.clone());
        for row in rows {
            encoder.encode(row)?;
        }
        Ok(Self::from_bytes(transformation_name, step_name, schema, encoder.finish()?))
    }

    /// Uses `rows` as the raw stream, without validation.
    pub fn from_bytes(
        transformation_name: impl Into<String>,
        step_name: impl Into<String>,
        schema: TanRowSchema,
        rows: Vec<u8>,
    ) -> Self {
        Self {
            transformation_name: transformation_name.into(),
            step_name: step_name.into(),
            schema,
            rows,
        }
    }
}

impl TanHostEnvironment for TanMemoryHost {
    fn transformation_name(&self) -> &str {
        &self.transformation_name
    }

    fn step_name(&self) -> &str {
        &self.step_name
    }

    fn row_schema(&self) -> Result<TanRowSchema> {
        Ok(self.schema.clone())
    }

    fn open_row_stream(&self) -> Result<TanRowStream> {
        Ok(Box::new(Cursor::new(self.rows.clone())))
    }
}
