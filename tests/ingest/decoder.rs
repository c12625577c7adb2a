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

//! # Tanxi Ingest Tests - Decoder
//!
//! This module contains tests for the binary row decoder and its encoder. The
//! decoder reads one row per call and tells a clean end of stream apart from
//! a row cut short.
//!
//! ## Test Categories
//!
//! - **Round Trip Tests**: Verify decoding reproduces encoded rows
//! - **Malformed Stream Tests**: Verify truncation and bad tags are reported
//!   with row and column
//! - **Encoder Tests**: Verify values must match the schema
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test --test decoder
//! ```

use std::io::Cursor;

use proptest::prelude::*;
use tanxi::ingest::{read_stream_header, TanRowDecoder, TanRowEncoder};
use tanxi::{TanError, TanRowSchema, TanSemanticType, TanValue};

fn semantic_type() -> impl Strategy<Value = TanSemanticType> {
    prop::sample::select(TanSemanticType::ALL.to_vec())
}

fn value_of(ty: TanSemanticType) -> BoxedStrategy<TanValue> {
    let present = match ty {
        TanSemanticType::Number => any::<f64>()
            .prop_filter("NaN never compares equal", |n| !n.is_nan())
            .prop_map(TanValue::Number)
            .boxed(),
        TanSemanticType::String => any::<String>().prop_map(TanValue::String).boxed(),
        TanSemanticType::Boolean => any::<bool>().prop_map(TanValue::Boolean).boxed(),
        TanSemanticType::Date => (-8_000_000_000_000i64..8_000_000_000_000i64)
            .prop_map(|millis| TanValue::date_millis(millis).unwrap())
            .boxed(),
        TanSemanticType::Other => prop::collection::vec(any::<u8>(), 0..32)
            .prop_map(TanValue::Other)
            .boxed(),
    };
    prop_oneof![1 => Just(TanValue::Null), 4 => present].boxed()
}

fn schema_and_rows() -> impl Strategy<Value = (TanRowSchema, Vec<Vec<TanValue>>)> {
    prop::collection::vec(semantic_type(), 1..6).prop_flat_map(|types| {
        let row = types.iter().map(|ty| value_of(*ty)).collect::<Vec<_>>();
        let schema = TanRowSchema::new(
            types
                .iter()
                .enumerate()
                .map(|(i, ty)| (format!("c{}", i), *ty)),
        )
        .unwrap();
        (Just(schema), prop::collection::vec(row, 0..16))
    })
}

proptest! {
    /// Tests that decoding reproduces any encoded rows for any schema.
    #[test]
    fn test_decoding_reproduces_encoded_rows((schema, rows) in schema_and_rows()) {
        let mut encoder = TanRowEncoder::new(Vec::new(), schema.clone());
        for row in &rows {
            encoder.encode(row).unwrap();
        }
        let bytes = encoder.finish().unwrap();

        let mut decoder = TanRowDecoder::new(Cursor::new(bytes), schema);
        let mut decoded = Vec::new();
        while let Some(row) = decoder.decode_row().unwrap() {
            prop_assert_eq!(row.ordinal, decoded.len() as u64);
            decoded.push(row.values);
        }
        prop_assert_eq!(decoded, rows);
    }
}

fn customer_schema() -> TanRowSchema {
    TanRowSchema::new([
        ("id", TanSemanticType::Number),
        ("name", TanSemanticType::String),
        ("signup", TanSemanticType::Date),
    ])
    .unwrap()
}

/// Tests that a stream header and its rows decode from one reader.
#[test]
fn test_header_and_rows_share_one_stream() {
    let mut encoder = TanRowEncoder::with_header(Vec::new(), customer_schema()).unwrap();
    encoder
        .encode(&[
            TanValue::Number(1.0),
            TanValue::String("Ann".into()),
            TanValue::Null,
        ])
        .unwrap();
    let mut stream = Cursor::new(encoder.finish().unwrap());

    let schema = read_stream_header(&mut stream).unwrap();
    assert_eq!(schema, customer_schema());
    let mut decoder = TanRowDecoder::new(stream, schema);
    let row = decoder.decode_row().unwrap().unwrap();
    assert_eq!(row.values[1], TanValue::String("Ann".into()));
    assert_eq!(row.values[2], TanValue::Null);
    assert_eq!(decoder.decode_row().unwrap(), None);
}

/// Tests that a stream ending inside a row names the row and column.
#[test]
fn test_stream_ending_mid_row_is_malformed() {
    let mut encoder = TanRowEncoder::new(Vec::new(), customer_schema());
    encoder
        .encode(&[
            TanValue::Number(1.0),
            TanValue::String("Ann".into()),
            TanValue::Null,
        ])
        .unwrap();
    let mut bytes = encoder.finish().unwrap();
    bytes.pop();

    let mut decoder = TanRowDecoder::new(Cursor::new(bytes), customer_schema());
    match decoder.decode_row() {
        Err(TanError::MalformedRow { row, column, .. }) => {
            assert_eq!(row, 0);
            assert_eq!(column, "signup");
        }
        other => panic!("expected a malformed row, got {:?}", other),
    }
}

/// Tests that an unknown type tag is rejected.
#[test]
fn test_unknown_tag_is_malformed() {
    let schema = TanRowSchema::new([("flag", TanSemanticType::Boolean)]).unwrap();
    let mut decoder = TanRowDecoder::new(Cursor::new(vec![9u8, 1]), schema);
    assert!(matches!(
        decoder.decode_row(),
        Err(TanError::MalformedRow { .. })
    ));
}

/// Tests that boolean payloads other than 0 and 1 are rejected.
#[test]
fn test_boolean_payload_must_be_zero_or_one() {
    let schema = TanRowSchema::new([("flag", TanSemanticType::Boolean)]).unwrap();
    let bytes = vec![TanSemanticType::Boolean.tag(), 2];
    let mut decoder = TanRowDecoder::new(Cursor::new(bytes), schema);
    assert!(matches!(
        decoder.decode_row(),
        Err(TanError::MalformedRow { .. })
    ));
}

/// Tests that a schema without columns yields no rows.
#[test]
fn test_zero_column_schema_ends_immediately() {
    let mut decoder = TanRowDecoder::new(Cursor::new(vec![1u8, 2, 3]), TanRowSchema::default());
    assert_eq!(decoder.decode_row().unwrap(), None);
}

/// Tests that the encoder refuses values of the wrong type.
#[test]
fn test_encoder_rejects_mistyped_values() {
    let mut encoder = TanRowEncoder::new(Vec::new(), customer_schema());
    let err = encoder
        .encode(&[
            TanValue::String("1".into()),
            TanValue::Null,
            TanValue::Null,
        ])
        .unwrap_err();
    assert!(matches!(err, TanError::MalformedRow { .. }));
}
