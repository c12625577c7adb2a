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

//! # Tanxi Schema Module
//!
//! Row schemas describe how a single record of the host's row stream is laid
//! out: an ordered list of named, typed columns. A schema is immutable once
//! built and column names are unique (case-sensitive).
//!
//! Projections select a subset of schema columns, in the order a consumer
//! wants them, optionally re-typing each column.
//!
//! ```rust
//! use tanxi::schema::{TanProjection, TanRowSchema, TanSemanticType};
//!
//! let schema = TanRowSchema::new([
//!     ("id", TanSemanticType::Number),
//!     ("name", TanSemanticType::String),
//! ])?;
//! let projection = TanProjection::of(["name", "id"]).with_target("id", TanSemanticType::String);
//! let resolved = projection.resolve(&schema)?;
//! assert_eq!(resolved[1].source_index, 0);
//! ```

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::{Result, TanError};

/// Semantic type of a column, as understood by the analysis application.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TanSemanticType {
    Number,
    String,
    Boolean,
    Date,
    Other,
}

impl TanSemanticType {
    /// All semantic types in wire-tag order.
    pub const ALL: [TanSemanticType; 5] = [
        TanSemanticType::Number,
        TanSemanticType::String,
        TanSemanticType::Date,
        TanSemanticType::Boolean,
        TanSemanticType::Other,
    ];

    /// One-byte tag identifying this type in the row stream. `0` is reserved for null.
    pub fn tag(self) -> u8 {
        match self {
            TanSemanticType::Number => 1,
            TanSemanticType::String => 2,
            TanSemanticType::Date => 3,
            TanSemanticType::Boolean => 4,
            TanSemanticType::Other => 5,
        }
    }

    pub fn from_tag(tag: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|ty| ty.tag() == tag)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TanSemanticType::Number => "Number",
            TanSemanticType::String => "String",
            TanSemanticType::Boolean => "Boolean",
            TanSemanticType::Date => "Date",
            TanSemanticType::Other => "Other",
        }
    }
}

impl fmt::Display for TanSemanticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named, typed column belonging to exactly one row schema.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TanColumn {
    pub name: String,
    pub semantic_type: TanSemanticType,
    /// Position of the column within its schema.
    pub ordinal: usize,
}

impl TanColumn {
    pub fn new(name: impl Into<String>, semantic_type: TanSemanticType, ordinal: usize) -> Self {
        Self {
            name: name.into(),
            semantic_type,
            ordinal,
        }
    }
}

/// Ordered, immutable column declaration describing how one row is encoded.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TanRowSchema {
    columns: Vec<TanColumn>,
}

impl TanRowSchema {
    /// Builds a schema from `(name, type)` pairs.
    ///
    /// Duplicate names are rejected with [`TanError::DuplicateColumn`]; the
    /// host may hand out such schemas but a name lookup against them would be
    /// ambiguous.
    pub fn new<I, S>(fields: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, TanSemanticType)>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let mut columns = Vec::new();
        for (ordinal, (name, semantic_type)) in fields.into_iter().enumerate() {
            let name = name.into();
            if !seen.insert(name.clone()) {
                return Err(TanError::DuplicateColumn { column: name });
            }
            columns.push(TanColumn::new(name, semantic_type, ordinal));
        }
        Ok(Self { columns })
    }

    pub fn columns(&self) -> &[TanColumn] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn column(&self, name: &str) -> Option<&TanColumn> {
        self.columns.iter().find(|column| column.name == name)
    }

    /// Position of `name` in the schema, or [`TanError::UnknownColumn`].
    pub fn index_of(&self, name: &str) -> Result<usize> {
        self.column(name)
            .map(|column| column.ordinal)
            .ok_or_else(|| TanError::UnknownColumn {
                column: name.to_string(),
            })
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|column| column.name.as_str())
    }
}

/// One requested column of a projection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TanProjectedColumn {
    pub name: String,
    /// Declared output type; `None` keeps the schema type.
    pub target: Option<TanSemanticType>,
}

/// A projection column resolved against a concrete schema.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TanResolvedColumn {
    /// Index of the column in the source schema.
    pub source_index: usize,
    /// Type the decoder produces for this column.
    pub source_type: TanSemanticType,
    /// Column as the consumer sees it; `ordinal` is the projection position.
    pub column: TanColumn,
}

/// Subset and ordering of schema columns requested by a consumer.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TanProjection {
    columns: Vec<TanProjectedColumn>,
}

impl TanProjection {
    /// Projection over every column of `schema`, in schema order.
    pub fn all(schema: &TanRowSchema) -> Self {
        Self::of(schema.column_names())
    }

    /// Projection over the named columns, in the given order.
    pub fn of<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: names
                .into_iter()
                .map(|name| TanProjectedColumn {
                    name: name.into(),
                    target: None,
                })
                .collect(),
        }
    }

    /// Declares the output type of every projected column named `name`.
    pub fn with_target(mut self, name: &str, target: TanSemanticType) -> Self {
        for column in self.columns.iter_mut().filter(|column| column.name == name) {
            column.target = Some(target);
        }
        self
    }

    pub fn columns(&self) -> &[TanProjectedColumn] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Resolves every requested name to its schema position, once.
    pub fn resolve(&self, schema: &TanRowSchema) -> Result<Vec<TanResolvedColumn>> {
        self.columns
            .iter()
            .enumerate()
            .map(|(ordinal, requested)| {
                let source_index = schema.index_of(&requested.name)?;
                let source_type = schema.columns()[source_index].semantic_type;
                Ok(TanResolvedColumn {
                    source_index,
                    source_type,
                    column: TanColumn::new(
                        requested.name.clone(),
                        requested.target.unwrap_or(source_type),
                        ordinal,
                    ),
                })
            })
            .collect()
    }
}
