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

//! # Columnar Dataset Adapter
//!
//! Presents the host's sequential row stream as a forward-only cursor over a
//! column projection. The adapter is pull-based and single-threaded: every
//! [`TanColumnarDataset::advance`] decodes exactly one row and coerces the
//! projected fields to their declared types.
//!
//! ## States
//!
//! ```text
//! Unstarted --advance--> Active --end of stream--> Exhausted
//!                          |
//!                          +--decode/coercion error--> Failed (sticky)
//! ```
//!
//! Once exhausted the dataset stays exhausted; once failed every further
//! `advance` returns the recorded error without touching the stream again.

use std::io::Read;

use crate::errors::{Result, TanError};
use crate::ingest::decoder::TanRowDecoder;
use crate::record::{TanDecodedRow, TanValue};
use crate::schema::{TanColumn, TanProjection, TanResolvedColumn, TanRowSchema};

/// Lifecycle of a [`TanColumnarDataset`].
#[derive(Clone, Debug, PartialEq)]
pub enum TanDatasetState {
    Unstarted,
    Active,
    Exhausted,
    Failed(TanError),
}

/// Forward-only, column-projected cursor over a binary row stream.
///
/// The dataset exclusively owns the stream until [`close`](Self::close) is
/// called or the dataset is dropped.
#[derive(Debug)]
pub struct TanColumnarDataset<R> {
    decoder: Option<TanRowDecoder<R>>,
    columns: Vec<TanResolvedColumn>,
    raw: TanDecodedRow,
    current: TanDecodedRow,
    state: TanDatasetState,
    rows_read: u64,
}

impl<R: Read> TanColumnarDataset<R> {
    /// Resolves `projection` against `schema` once and takes ownership of `reader`.
    ///
    /// Fails with [`TanError::UnknownColumn`] if a requested column is absent.
    pub fn new(schema: TanRowSchema, projection: &TanProjection, reader: R) -> Result<Self> {
        let columns = projection.resolve(&schema)?;
        Ok(Self {
            decoder: Some(TanRowDecoder::new(reader, schema)),
            raw: TanDecodedRow::default(),
            current: TanDecodedRow::new(0, Vec::with_capacity(columns.len())),
            columns,
            state: TanDatasetState::Unstarted,
            rows_read: 0,
        })
    }

    /// Dataset over every schema column, in schema order.
    pub fn all_columns(schema: TanRowSchema, reader: R) -> Result<Self> {
        let projection = TanProjection::all(&schema);
        Self::new(schema, &projection, reader)
    }

    /// Projected columns, typed as the consumer sees them.
    pub fn columns(&self) -> impl Iterator<Item = &TanColumn> {
        self.columns.iter().map(|resolved| &resolved.column)
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn state(&self) -> &TanDatasetState {
        &self.state
    }

    /// Number of rows successfully produced so far.
    pub fn rows_read(&self) -> u64 {
        self.rows_read
    }

    /// Moves to the next row. Returns `Ok(false)` once the stream is exhausted
    /// and on every call after that.
    pub fn advance(&mut self) -> Result<bool> {
        match &self.state {
            TanDatasetState::Exhausted => return Ok(false),
            TanDatasetState::Failed(err) => return Err(err.clone()),
            TanDatasetState::Unstarted | TanDatasetState::Active => {}
        }

        let Some(decoder) = self.decoder.as_mut() else {
            self.state = TanDatasetState::Exhausted;
            return Ok(false);
        };

        let step = match decoder.decode_next(&mut self.raw) {
            Ok(true) => self.project().map(|_| true),
            other => other,
        };

        match step {
            Ok(true) => {
                self.rows_read += 1;
                self.state = TanDatasetState::Active;
                Ok(true)
            }
            Ok(false) => {
                log::debug!("Row stream exhausted after {} rows", self.rows_read);
                self.state = TanDatasetState::Exhausted;
                self.current.values.clear();
                Ok(false)
            }
            Err(err) => {
                log::warn!("Dataset failed: {}", err);
                self.state = TanDatasetState::Failed(err.clone());
                self.current.values.clear();
                Err(err)
            }
        }
    }

    /// Values of the current row aligned to the projection, or `None` when
    /// the cursor is not positioned on a row.
    pub fn current(&self) -> Option<&[TanValue]> {
        self.current_row().map(|row| row.values.as_slice())
    }

    pub fn current_row(&self) -> Option<&TanDecodedRow> {
        match self.state {
            TanDatasetState::Active => Some(&self.current),
            _ => None,
        }
    }

    /// Releases the underlying stream. Only the first call has an effect.
    pub fn close(&mut self) {
        if let Some(decoder) = self.decoder.take() {
            log::debug!("Closing row stream after {} rows", decoder.rows_decoded());
            drop(decoder.into_inner());
            if matches!(self.state, TanDatasetState::Unstarted | TanDatasetState::Active) {
                self.state = TanDatasetState::Exhausted;
            }
        }
    }

    pub fn is_closed(&self) -> bool {
        self.decoder.is_none()
    }

    fn project(&mut self) -> Result<()> {
        let row = self.raw.ordinal;
        self.current.ordinal = row;
        self.current.values.clear();
        for resolved in &self.columns {
            let raw = &self.raw.values[resolved.source_index];
            let value = raw
                .coerce(resolved.column.semantic_type)
                .map_err(|message| TanError::Coercion {
                    column: resolved.column.name.clone(),
                    row,
                    from: resolved.source_type,
                    to: resolved.column.semantic_type,
                    message,
                })?;
            self.current.values.push(value);
        }
        Ok(())
    }
}
