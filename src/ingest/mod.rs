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

//! # Data Ingestion Module
//!
//! This module turns the host's live row stream into something the analysis
//! side can consume column by column.
//!
//! ## Module Components
//!
//! - **Decoder** ([decoder.rs](decoder/index.html)): one-row-at-a-time binary
//!   decoding, its inverse encoder and the self-describing stream header
//! - **Dataset** ([dataset.rs](dataset/index.html)): projected, type-coercing,
//!   forward-only cursor with sticky failure
//!
//! ## Usage Patterns
//!
//! ```rust
//! use tanxi::ingest::TanColumnarDataset;
//! use tanxi::schema::TanProjection;
//!
//! let projection = TanProjection::of(["id", "name"]);
//! let mut dataset = TanColumnarDataset::new(schema, &projection, stream)?;
//! while dataset.advance()? {
//!     let values = dataset.current().unwrap_or_default();
//!     // ...
//! }
//! dataset.close();
//! ```

pub mod dataset;
pub mod decoder;

pub use dataset::{TanColumnarDataset, TanDatasetState};
pub use decoder::{
    read_stream_header, write_stream_header, TanRowDecoder, TanRowEncoder, TAN_STREAM_MAGIC,
};
