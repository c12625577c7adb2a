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

//! # Tanxi Ingest Tests - Dataset
//!
//! This module contains tests for the columnar dataset adapter, which turns
//! the row stream into a forward-only cursor over projected columns.
//!
//! ## Test Categories
//!
//! - **Cursor Tests**: Verify rows are yielded once and exhaustion is final
//! - **Projection Tests**: Verify column order, retyping and unknown names
//! - **Failure Tests**: Verify coercion and stream errors are sticky
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test --test dataset
//! ```

use std::io::Cursor;

use tanxi::ingest::{TanColumnarDataset, TanDatasetState, TanRowEncoder};
use tanxi::{TanError, TanProjection, TanRowSchema, TanSemanticType, TanValue};

fn customer_schema() -> TanRowSchema {
    TanRowSchema::new([
        ("id", TanSemanticType::Number),
        ("name", TanSemanticType::String),
        ("signup", TanSemanticType::Date),
    ])
    .unwrap()
}

fn date(text: &str) -> TanValue {
    TanValue::String(text.into())
        .coerce(TanSemanticType::Date)
        .unwrap()
}

fn customer_rows() -> Vec<Vec<TanValue>> {
    vec![
        vec![TanValue::Number(1.0), TanValue::String("Ann".into()), date("2020-01-01")],
        vec![TanValue::Number(2.0), TanValue::String("Bo".into()), date("2020-02-02")],
        vec![TanValue::Number(3.0), TanValue::String("Cy".into()), TanValue::Null],
    ]
}

fn encode(schema: &TanRowSchema, rows: &[Vec<TanValue>]) -> Cursor<Vec<u8>> {
    let mut encoder = TanRowEncoder::new(Vec::new(), schema.clone());
    for row in rows {
        encoder.encode(row).unwrap();
    }
    Cursor::new(encoder.finish().unwrap())
}

/// Tests the three-customer stream: three rows, then exhausted for good.
#[test]
fn test_yields_every_row_then_stays_exhausted() {
    let schema = customer_schema();
    let stream = encode(&schema, &customer_rows());
    let mut dataset = TanColumnarDataset::all_columns(schema, stream).unwrap();
    assert_eq!(dataset.state(), &TanDatasetState::Unstarted);
    assert!(dataset.current().is_none());

    let mut seen = Vec::new();
    while dataset.advance().unwrap() {
        let values = dataset.current().unwrap();
        assert_eq!(values.len(), dataset.column_count());
        seen.push(values.to_vec());
    }
    assert_eq!(seen, customer_rows());
    assert_eq!(dataset.state(), &TanDatasetState::Exhausted);

    for _ in 0..3 {
        assert!(!dataset.advance().unwrap());
    }
    assert!(dataset.current().is_none());
    assert_eq!(dataset.rows_read(), 3);
}

/// Tests that a projection reorders columns and converts declared types.
#[test]
fn test_projection_reorders_and_coerces() {
    let schema = customer_schema();
    let stream = encode(&schema, &customer_rows());
    let projection = TanProjection::of(["signup", "id"])
        .with_target("id", TanSemanticType::String)
        .with_target("signup", TanSemanticType::String);
    let mut dataset = TanColumnarDataset::new(schema, &projection, stream).unwrap();

    let names: Vec<_> = dataset.columns().map(|c| c.name.clone()).collect();
    assert_eq!(names, ["signup", "id"]);

    assert!(dataset.advance().unwrap());
    assert_eq!(
        dataset.current().unwrap(),
        &[
            TanValue::String("2020-01-01T00:00:00.000Z".into()),
            TanValue::String("1".into()),
        ]
    );

    dataset.advance().unwrap();
    dataset.advance().unwrap();
    assert_eq!(dataset.current().unwrap()[0], TanValue::Null);
}

/// Tests that projecting an absent column fails at construction.
#[test]
fn test_unknown_projection_column_fails_construction() {
    let schema = customer_schema();
    let stream = encode(&schema, &customer_rows());
    let err = TanColumnarDataset::new(schema, &TanProjection::of(["email"]), stream).unwrap_err();
    assert_eq!(err, TanError::UnknownColumn { column: "email".into() });
}

/// Tests that a coercion failure names its column and row and repeats.
#[test]
fn test_coercion_failure_is_sticky_and_located() {
    let schema = TanRowSchema::new([("amount", TanSemanticType::String)]).unwrap();
    let rows = vec![
        vec![TanValue::String("10".into())],
        vec![TanValue::String("ten".into())],
        vec![TanValue::String("12".into())],
    ];
    let stream = encode(&schema, &rows);
    let projection = TanProjection::of(["amount"]).with_target("amount", TanSemanticType::Number);
    let mut dataset = TanColumnarDataset::new(schema, &projection, stream).unwrap();

    assert!(dataset.advance().unwrap());
    assert_eq!(dataset.current().unwrap(), &[TanValue::Number(10.0)]);

    let first = dataset.advance().unwrap_err();
    match &first {
        TanError::Coercion { column, row, from, to, .. } => {
            assert_eq!(column, "amount");
            assert_eq!(*row, 1);
            assert_eq!(*from, TanSemanticType::String);
            assert_eq!(*to, TanSemanticType::Number);
        }
        other => panic!("expected a coercion error, got {:?}", other),
    }

    assert_eq!(dataset.advance().unwrap_err(), first);
    assert!(matches!(dataset.state(), TanDatasetState::Failed(_)));
    assert!(dataset.current().is_none());
}

/// Tests that a truncated stream fails the dataset at the cut row.
#[test]
fn test_truncated_stream_fails_the_dataset() {
    let schema = customer_schema();
    let mut bytes = encode(&schema, &customer_rows()).into_inner();
    bytes.truncate(bytes.len() - 3);
    let mut dataset = TanColumnarDataset::all_columns(schema, Cursor::new(bytes)).unwrap();

    assert!(dataset.advance().unwrap());
    assert!(dataset.advance().unwrap());
    let err = dataset.advance().unwrap_err();
    assert!(matches!(err, TanError::MalformedRow { row: 2, .. }));
    assert_eq!(dataset.advance().unwrap_err(), err);
}

/// Tests that closing an unread dataset leaves it exhausted.
#[test]
fn test_close_before_reading_exhausts() {
    let schema = customer_schema();
    let stream = encode(&schema, &customer_rows());
    let mut dataset = TanColumnarDataset::all_columns(schema, stream).unwrap();
    dataset.close();
    assert!(dataset.is_closed());
    assert!(!dataset.advance().unwrap());
    dataset.close();
}
