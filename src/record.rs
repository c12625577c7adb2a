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

//! # Tanxi Record Module
//!
//! Field values and decoded rows. Every field of a decoded row is a
//! [`TanValue`], a tagged union over the semantic types of the row schema, so
//! no dynamic type dispatch is needed while decoding.
//!
//! ## Coercion
//!
//! [`TanValue::coerce`] converts a value to another semantic type. Null stays
//! null, identity conversions are free, and the remaining pairs follow a fixed
//! matrix (numbers print in shortest round-trip form, dates print as RFC 3339
//! UTC with millisecond precision, strings parse back with the same rules).
//! Unsupported pairs and unparsable text are reported as a plain message; the
//! dataset attaches column and row context.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};

use crate::schema::TanSemanticType;

/// A single field value.
#[derive(Clone, Debug, PartialEq)]
pub enum TanValue {
    Null,
    Number(f64),
    String(String),
    Boolean(bool),
    Date(DateTime<Utc>),
    Other(Vec<u8>),
}

impl TanValue {
    /// Semantic type of a non-null value.
    pub fn semantic_type(&self) -> Option<TanSemanticType> {
        match self {
            TanValue::Null => None,
            TanValue::Number(_) => Some(TanSemanticType::Number),
            TanValue::String(_) => Some(TanSemanticType::String),
            TanValue::Boolean(_) => Some(TanSemanticType::Boolean),
            TanValue::Date(_) => Some(TanSemanticType::Date),
            TanValue::Other(_) => Some(TanSemanticType::Other),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, TanValue::Null)
    }

    /// Convenience constructor for dates given as epoch milliseconds.
    pub fn date_millis(millis: i64) -> Option<Self> {
        DateTime::from_timestamp_millis(millis).map(TanValue::Date)
    }

    /// Text form used for tabular output; `None` for null.
    pub fn to_text(&self) -> Option<String> {
        match self {
            TanValue::Null => None,
            TanValue::Number(n) => Some(format_number(*n)),
            TanValue::String(s) => Some(s.clone()),
            TanValue::Boolean(b) => Some(b.to_string()),
            TanValue::Date(d) => Some(format_date(d)),
            TanValue::Other(bytes) => Some(String::from_utf8_lossy(bytes).into_owned()),
        }
    }

    /// Converts the value to `target`, or explains why it cannot.
    pub fn coerce(&self, target: TanSemanticType) -> Result<TanValue, String> {
        let Some(source) = self.semantic_type() else {
            return Ok(TanValue::Null);
        };
        if source == target {
            return Ok(self.clone());
        }

        match (self, target) {
            (TanValue::Number(n), TanSemanticType::String) => {
                Ok(TanValue::String(format_number(*n)))
            }
            (TanValue::Number(n), TanSemanticType::Boolean) => Ok(TanValue::Boolean(*n != 0.0)),
            (TanValue::Number(n), TanSemanticType::Date) => {
                if !n.is_finite() || n.fract() != 0.0 {
                    return Err(format!("{} is not a whole number of milliseconds", n));
                }
                DateTime::from_timestamp_millis(*n as i64)
                    .map(TanValue::Date)
                    .ok_or_else(|| format!("{} milliseconds is out of the date range", n))
            }
            (TanValue::String(s), TanSemanticType::Number) => s
                .trim()
                .parse::<f64>()
                .map(TanValue::Number)
                .map_err(|e| format!("'{}' is not a number: {}", s, e)),
            (TanValue::String(s), TanSemanticType::Boolean) => parse_boolean(s)
                .map(TanValue::Boolean)
                .ok_or_else(|| format!("'{}' is not a boolean", s)),
            (TanValue::String(s), TanSemanticType::Date) => parse_date(s)
                .map(TanValue::Date)
                .ok_or_else(|| format!("'{}' is not a recognised date", s)),
            (TanValue::Boolean(b), TanSemanticType::Number) => {
                Ok(TanValue::Number(if *b { 1.0 } else { 0.0 }))
            }
            (TanValue::Boolean(b), TanSemanticType::String) => Ok(TanValue::String(b.to_string())),
            (TanValue::Date(d), TanSemanticType::String) => Ok(TanValue::String(format_date(d))),
            (TanValue::Date(d), TanSemanticType::Number) => {
                Ok(TanValue::Number(d.timestamp_millis() as f64))
            }
            (TanValue::Other(bytes), TanSemanticType::String) => String::from_utf8(bytes.clone())
                .map(TanValue::String)
                .map_err(|_| "binary value is not valid UTF-8".to_string()),
            (value, TanSemanticType::Other) => Ok(TanValue::Other(
                value.to_text().unwrap_or_default().into_bytes(),
            )),
            (_, target) => Err(format!("no conversion from {} to {}", source, target)),
        }
    }
}

/// Shortest round-trip form; whole numbers print without a fraction.
pub fn format_number(n: f64) -> String {
    format!("{}", n)
}

pub fn format_date(d: &DateTime<Utc>) -> String {
    d.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_boolean(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" | "y" | "yes" | "1" => Some(true),
        "false" | "n" | "no" | "0" => Some(false),
        _ => None,
    }
}

fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(s) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(Utc.from_utc_datetime(&naive));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// One decoded row, aligned either to the row schema or to a projection.
///
/// Rows are transient: the dataset reuses a single buffer and hands out a
/// borrowed view for the current step only.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TanDecodedRow {
    /// Zero-based position of the row in its stream.
    pub ordinal: u64,
    pub values: Vec<TanValue>,
}

impl TanDecodedRow {
    pub fn new(ordinal: u64, values: Vec<TanValue>) -> Self {
        Self { ordinal, values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&TanValue> {
        self.values.get(index)
    }
}
