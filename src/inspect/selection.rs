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

//! # Analyzer Selection
//!
//! Heuristic synthesis of an analysis job from a set of typed columns. The
//! engine is a pure function of its input: the same column sequence always
//! yields the same analyzer sequence, in the same order, so generated job
//! files are reproducible.
//!
//! ## Algorithm (full mode)
//!
//! 1. Columns whose lower-cased name contains an identifier token (`id`,
//!    `pk`, `number`, `no`, `nr`, `key`) once split on whitespace and
//!    `_-|#.,/+!@&()[]` get one unique key check each.
//! 2. One completeness analyzer covers every column.
//! 3. Columns are bucketed by semantic type; every non-empty Number, Date,
//!    Boolean and String bucket gets one analyzer over the whole bucket.
//!
//! Minimal mode skips all three steps and only declares source columns.

use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;
use std::sync::OnceLock;

use regex::Regex;

use crate::schema::{TanColumn, TanSemanticType};

/// Tokens that mark a column as a likely identifier.
pub const IDENTIFIER_TOKENS: [&str; 6] = ["id", "pk", "number", "no", "nr", "key"];

/// Condition attached to every completeness target.
pub const NOT_BLANK_OR_NULL: &str = "NOT_BLANK_OR_NULL";

/// Breaking whitespace plus punctuation. Non-breaking spaces stay inside tokens.
const SEPARATOR_PATTERN: &str = concat!(
    r"[\t\n\x0B\f\r \u{1680}\u{2000}-\u{2006}\u{2008}-\u{200A}\u{2028}\u{2029}\u{205F}\u{3000}",
    r"_\-|#.,/+!@&()\[\]]+",
);

fn separators() -> &'static Regex {
    static SEPARATORS: OnceLock<Regex> = OnceLock::new();
    SEPARATORS.get_or_init(|| Regex::new(SEPARATOR_PATTERN).expect("separator pattern is valid"))
}

/// Analyzers the engine knows how to attach.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TanAnalyzerKind {
    UniqueKeyCheck,
    Completeness,
    Number,
    DateAndTime,
    Boolean,
    String,
}

/// Value type of a configurable analyzer property.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TanPropertyKind {
    Boolean,
    Text,
    TextList,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TanPropertyDescriptor {
    pub name: &'static str,
    pub kind: TanPropertyKind,
}

/// Static description of an analyzer as the analysis application names it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TanAnalyzerDescriptor {
    pub kind: TanAnalyzerKind,
    /// Descriptor name referenced from the job file.
    pub name: &'static str,
    pub properties: &'static [TanPropertyDescriptor],
}

impl TanAnalyzerDescriptor {
    /// Looks up a configurable property; `None` if this analyzer does not offer it.
    pub fn property(&self, name: &str) -> Option<&TanPropertyDescriptor> {
        self.properties.iter().find(|property| property.name == name)
    }
}

const UNIQUE_KEY_CHECK: TanAnalyzerDescriptor = TanAnalyzerDescriptor {
    kind: TanAnalyzerKind::UniqueKeyCheck,
    name: "Unique key check",
    properties: &[],
};

const COMPLETENESS: TanAnalyzerDescriptor = TanAnalyzerDescriptor {
    kind: TanAnalyzerKind::Completeness,
    name: "Completeness analyzer",
    properties: &[
        TanPropertyDescriptor {
            name: "Conditions",
            kind: TanPropertyKind::TextList,
        },
        TanPropertyDescriptor {
            name: "Evaluation mode",
            kind: TanPropertyKind::Text,
        },
    ],
};

const NUMBER: TanAnalyzerDescriptor = TanAnalyzerDescriptor {
    kind: TanAnalyzerKind::Number,
    name: "Number analyzer",
    properties: &[TanPropertyDescriptor {
        name: "Descriptive statistics",
        kind: TanPropertyKind::Boolean,
    }],
};

const DATE_AND_TIME: TanAnalyzerDescriptor = TanAnalyzerDescriptor {
    kind: TanAnalyzerKind::DateAndTime,
    name: "Date/time analyzer",
    properties: &[],
};

const BOOLEAN: TanAnalyzerDescriptor = TanAnalyzerDescriptor {
    kind: TanAnalyzerKind::Boolean,
    name: "Boolean analyzer",
    properties: &[],
};

const STRING: TanAnalyzerDescriptor = TanAnalyzerDescriptor {
    kind: TanAnalyzerKind::String,
    name: "String analyzer",
    properties: &[],
};

impl TanAnalyzerKind {
    pub fn descriptor(self) -> &'static TanAnalyzerDescriptor {
        match self {
            TanAnalyzerKind::UniqueKeyCheck => &UNIQUE_KEY_CHECK,
            TanAnalyzerKind::Completeness => &COMPLETENESS,
            TanAnalyzerKind::Number => &NUMBER,
            TanAnalyzerKind::DateAndTime => &DATE_AND_TIME,
            TanAnalyzerKind::Boolean => &BOOLEAN,
            TanAnalyzerKind::String => &STRING,
        }
    }

    /// Analyzer responsible for a semantic type bucket, if any.
    pub fn for_bucket(ty: TanSemanticType) -> Option<Self> {
        match ty {
            TanSemanticType::Number => Some(TanAnalyzerKind::Number),
            TanSemanticType::Date => Some(TanAnalyzerKind::DateAndTime),
            TanSemanticType::Boolean => Some(TanAnalyzerKind::Boolean),
            TanSemanticType::String => Some(TanAnalyzerKind::String),
            TanSemanticType::Other => None,
        }
    }
}

/// Value of a configured analyzer property.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TanParameterValue {
    Boolean(bool),
    Text(String),
    TextList(Vec<String>),
}

/// One analyzer attached to one or more columns.
#[derive(Clone, Debug, PartialEq)]
pub struct TanAnalyzerSpec {
    pub kind: TanAnalyzerKind,
    /// Never empty; in column order.
    pub target_columns: Vec<TanColumn>,
    pub parameters: BTreeMap<String, TanParameterValue>,
    pub display_name: String,
}

impl TanAnalyzerSpec {
    fn new(kind: TanAnalyzerKind, target_columns: Vec<TanColumn>) -> Self {
        Self {
            kind,
            target_columns,
            parameters: BTreeMap::new(),
            display_name: kind.descriptor().name.to_string(),
        }
    }

    /// Sets `name` only when the analyzer's descriptor declares it.
    fn configure(&mut self, name: &str, value: TanParameterValue) -> bool {
        match self.kind.descriptor().property(name) {
            Some(property) => {
                self.parameters.insert(property.name.to_string(), value);
                true
            }
            None => {
                log::debug!(
                    "{} has no '{}' property, leaving it unset",
                    self.kind.descriptor().name,
                    name
                );
                false
            }
        }
    }

    /// Whether the display name was set explicitly rather than inherited.
    pub fn has_custom_name(&self) -> bool {
        self.display_name != self.kind.descriptor().name
    }
}

/// Whether the engine builds heuristic analyzers or only declares columns.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum TanJobMode {
    #[default]
    Full,
    Minimal,
}

/// Everything the job writer needs to describe an analysis run.
#[derive(Clone, Debug, PartialEq)]
pub struct TanJobSpec {
    pub datastore_name: String,
    pub datastore_location: PathBuf,
    /// Table the datastore exposes; column paths are `table.column`.
    pub table_name: String,
    pub source_columns: Vec<TanColumn>,
    pub analyzers: Vec<TanAnalyzerSpec>,
}

/// Deterministic analyzer selection over a column set.
#[derive(Clone, Debug)]
pub struct TanSelectionEngine {
    identifier_tokens: HashSet<String>,
}

impl Default for TanSelectionEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TanSelectionEngine {
    pub fn new() -> Self {
        Self {
            identifier_tokens: IDENTIFIER_TOKENS.iter().map(|t| t.to_string()).collect(),
        }
    }

    /// Replaces the identifier token set. Tokens are matched lower-cased.
    pub fn with_identifier_tokens<I, S>(mut self, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.identifier_tokens = tokens
            .into_iter()
            .map(|t| t.as_ref().to_lowercase())
            .collect();
        self
    }

    /// Splits a column name into lower-cased, non-empty tokens.
    pub fn tokenize(name: &str) -> Vec<String> {
        separators()
            .split(&name.to_lowercase())
            .filter(|token| !token.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn is_identifier(&self, name: &str) -> bool {
        Self::tokenize(name)
            .iter()
            .any(|token| self.identifier_tokens.contains(token))
    }

    /// Chooses analyzers for `columns`.
    pub fn select(&self, columns: &[TanColumn], mode: TanJobMode) -> Vec<TanAnalyzerSpec> {
        if mode == TanJobMode::Minimal || columns.is_empty() {
            return Vec::new();
        }

        let mut analyzers = Vec::new();

        for column in columns.iter().filter(|c| self.is_identifier(&c.name)) {
            let mut spec = TanAnalyzerSpec::new(TanAnalyzerKind::UniqueKeyCheck, vec![column.clone()]);
            spec.display_name = format!("Uniqueness of {}", column.name);
            analyzers.push(spec);
        }

        let mut completeness = TanAnalyzerSpec::new(TanAnalyzerKind::Completeness, columns.to_vec());
        completeness.configure(
            "Conditions",
            TanParameterValue::TextList(vec![NOT_BLANK_OR_NULL.to_string(); columns.len()]),
        );
        completeness.configure("Evaluation mode", TanParameterValue::Text("ANY_FIELD".into()));
        analyzers.push(completeness);

        for ty in [
            TanSemanticType::Number,
            TanSemanticType::Date,
            TanSemanticType::Boolean,
            TanSemanticType::String,
        ] {
            let bucket: Vec<TanColumn> = columns
                .iter()
                .filter(|c| c.semantic_type == ty)
                .cloned()
                .collect();
            let Some(kind) = TanAnalyzerKind::for_bucket(ty) else {
                continue;
            };
            if bucket.is_empty() {
                continue;
            }
            let mut spec = TanAnalyzerSpec::new(kind, bucket);
            if kind == TanAnalyzerKind::Number {
                spec.configure("Descriptive statistics", TanParameterValue::Boolean(true));
            }
            analyzers.push(spec);
        }

        log::debug!(
            "Selected {} analyzers for {} columns",
            analyzers.len(),
            columns.len()
        );
        analyzers
    }

    /// Builds the full job specification for a datastore.
    pub fn build_job(
        &self,
        datastore_name: impl Into<String>,
        datastore_location: impl Into<PathBuf>,
        table_name: impl Into<String>,
        columns: &[TanColumn],
        mode: TanJobMode,
    ) -> TanJobSpec {
        TanJobSpec {
            datastore_name: datastore_name.into(),
            datastore_location: datastore_location.into(),
            table_name: table_name.into(),
            source_columns: columns.to_vec(),
            analyzers: self.select(columns, mode),
        }
    }
}
