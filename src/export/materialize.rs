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

//! # Dataset Materialization
//!
//! Drains a [`TanColumnarDataset`] into the data file the analysis
//! application's datastore reads. Rows are pulled one at a time; nothing is
//! buffered beyond the current row.

use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::{Result, TanError};
use crate::export::write_atomic;
use crate::ingest::{TanColumnarDataset, TanRowEncoder};
use crate::schema::TanRowSchema;

/// On-disk layout of a materialized dataset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TanMaterializeFormat {
    /// Stream header followed by binary rows.
    #[default]
    RowStream,
    /// Header row of column names, values as text, nulls as empty cells.
    Csv,
}

impl TanMaterializeFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            TanMaterializeFormat::RowStream => "bin",
            TanMaterializeFormat::Csv => "csv",
        }
    }
}

/// Writes every remaining row of `dataset` to `path` and returns the row count.
///
/// A decode or coercion error aborts the write; the partial file is removed
/// and the error is returned unchanged.
pub fn materialize<R: Read>(
    dataset: &mut TanColumnarDataset<R>,
    path: &Path,
    format: TanMaterializeFormat,
) -> Result<u64> {
    let rows = match format {
        TanMaterializeFormat::RowStream => write_row_stream(dataset, path),
        TanMaterializeFormat::Csv => write_csv(dataset, path),
    };
    match &rows {
        Ok(count) => log::info!("Materialized {} rows to {}", count, path.display()),
        Err(err) => log::warn!("Materialization to {} aborted: {}", path.display(), err),
    }
    rows
}

fn write_row_stream<R: Read>(dataset: &mut TanColumnarDataset<R>, path: &Path) -> Result<u64> {
    let schema = TanRowSchema::new(
        dataset
            .columns()
            .map(|column| (column.name.clone(), column.semantic_type)),
    )?;

    write_atomic(path, |w| {
        let mut encoder = TanRowEncoder::with_header(w, schema)?;
        while dataset.advance()? {
            if let Some(values) = dataset.current() {
                encoder.encode(values)?;
            }
        }
        let rows = encoder.rows_written();
        encoder.finish()?;
        Ok(rows)
    })
}

#[cfg(feature = "csv")]
fn write_csv<R: Read>(dataset: &mut TanColumnarDataset<R>, path: &Path) -> Result<u64> {
    let csv_error = |e: csv::Error| TanError::serialization(path, e);
    let header: Vec<String> = dataset.columns().map(|column| column.name.clone()).collect();

    write_atomic(path, |w| {
        let mut writer = csv::Writer::from_writer(w);
        writer.write_record(&header).map_err(csv_error)?;

        let mut rows = 0u64;
        let mut cells: Vec<String> = Vec::with_capacity(header.len());
        while dataset.advance()? {
            if let Some(values) = dataset.current() {
                cells.clear();
                cells.extend(values.iter().map(|value| value.to_text().unwrap_or_default()));
                writer.write_record(&cells).map_err(csv_error)?;
                rows += 1;
            }
        }
        writer.flush()?;
        Ok(rows)
    })
}

#[cfg(not(feature = "csv"))]
fn write_csv<R: Read>(_dataset: &mut TanColumnarDataset<R>, _path: &Path) -> Result<u64> {
    Err(TanError::config("CSV materialization requires the 'csv' feature"))
}
