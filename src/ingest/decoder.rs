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

//! # Row Stream Codec
//!
//! Binary encoding of the host's row stream. A row is its fields in schema
//! order; every field starts with a one-byte tag (`0` for null, otherwise the
//! tag of the column's semantic type) followed by a big-endian payload:
//!
//! | Type    | Payload                                 |
//! |---------|-----------------------------------------|
//! | Number  | IEEE-754 `f64`, 8 bytes                 |
//! | String  | `i32` byte length, UTF-8 bytes          |
//! | Date    | `i64` milliseconds since the Unix epoch |
//! | Boolean | one byte, `0` or `1`                    |
//! | Other   | `i32` byte length, raw bytes            |
//!
//! Files that carry their own schema start with a header: the magic
//! `TANROWS1`, a `u32` column count, then per column an `i32`-prefixed UTF-8
//! name and the type tag.

use std::io::{self, ErrorKind, Read, Write};

use crate::errors::{Result, TanError};
use crate::record::{TanDecodedRow, TanValue};
use crate::schema::{TanRowSchema, TanSemanticType};

/// Magic bytes opening a self-describing row stream.
pub const TAN_STREAM_MAGIC: &[u8; 8] = b"TANROWS1";

const NULL_TAG: u8 = 0;

/// Pull decoder reading one row per call from a byte stream.
///
/// The decoder keeps no state besides the stream position and the number of
/// rows decoded so far, which is used to label errors.
#[derive(Debug)]
pub struct TanRowDecoder<R> {
    reader: R,
    schema: TanRowSchema,
    rows_decoded: u64,
}

impl<R: Read> TanRowDecoder<R> {
    pub fn new(reader: R, schema: TanRowSchema) -> Self {
        Self {
            reader,
            schema,
            rows_decoded: 0,
        }
    }

    pub fn schema(&self) -> &TanRowSchema {
        &self.schema
    }

    pub fn rows_decoded(&self) -> u64 {
        self.rows_decoded
    }

    pub fn into_inner(self) -> R {
        self.reader
    }

    /// Decodes the next row into `row`, reusing its buffer.
    ///
    /// Returns `Ok(false)` on a clean end of stream, that is when no byte is
    /// available at a row boundary. Running out of bytes anywhere else is a
    /// [`TanError::MalformedRow`].
    pub fn decode_next(&mut self, row: &mut TanDecodedRow) -> Result<bool> {
        if self.schema.is_empty() {
            return Ok(false);
        }

        let ordinal = self.rows_decoded;
        row.ordinal = ordinal;
        row.values.clear();

        for (index, column) in self.schema.columns().iter().enumerate() {
            let tag = if index == 0 {
                match read_first_byte(&mut self.reader)? {
                    Some(tag) => tag,
                    None => return Ok(false),
                }
            } else {
                read_u8(&mut self.reader).map_err(|e| field_error(e, ordinal, &column.name))?
            };

            if tag == NULL_TAG {
                row.values.push(TanValue::Null);
                continue;
            }
            if tag != column.semantic_type.tag() {
                let found = TanSemanticType::from_tag(tag)
                    .map(|ty| ty.to_string())
                    .unwrap_or_else(|| format!("unknown tag {}", tag));
                return Err(TanError::malformed(
                    ordinal,
                    &column.name,
                    format!("found {} where schema declares {}", found, column.semantic_type),
                ));
            }

            let value = read_payload(&mut self.reader, column.semantic_type)
                .map_err(|e| field_error(e, ordinal, &column.name))?;
            row.values.push(value);
        }

        self.rows_decoded += 1;
        Ok(true)
    }

    /// Decodes the next row into a fresh buffer.
    pub fn decode_row(&mut self) -> Result<Option<TanDecodedRow>> {
        let mut row = TanDecodedRow::default();
        Ok(self.decode_next(&mut row)?.then_some(row))
    }
}

/// Writes rows in the exact layout [`TanRowDecoder`] reads.
#[derive(Debug)]
pub struct TanRowEncoder<W> {
    writer: W,
    schema: TanRowSchema,
    rows_written: u64,
}

impl<W: Write> TanRowEncoder<W> {
    pub fn new(writer: W, schema: TanRowSchema) -> Self {
        Self {
            writer,
            schema,
            rows_written: 0,
        }
    }

    /// Writes the self-describing header before any row.
    pub fn with_header(mut writer: W, schema: TanRowSchema) -> Result<Self> {
        write_stream_header(&mut writer, &schema)?;
        Ok(Self::new(writer, schema))
    }

    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }

    /// Encodes one row; `values` must align with the schema.
    pub fn encode(&mut self, values: &[TanValue]) -> Result<()> {
        let ordinal = self.rows_written;
        if values.len() != self.schema.len() {
            return Err(TanError::malformed(
                ordinal,
                "",
                format!(
                    "row has {} values but schema declares {} columns",
                    values.len(),
                    self.schema.len()
                ),
            ));
        }

        for (column, value) in self.schema.columns().iter().zip(values) {
            match value.semantic_type() {
                None => self.writer.write_all(&[NULL_TAG])?,
                Some(ty) if ty == column.semantic_type => {
                    self.writer.write_all(&[ty.tag()])?;
                    write_payload(&mut self.writer, value)
                        .map_err(|message| TanError::malformed(ordinal, &column.name, message))?;
                }
                Some(ty) => {
                    return Err(TanError::malformed(
                        ordinal,
                        &column.name,
                        format!("{} value in {} column", ty, column.semantic_type),
                    ));
                }
            }
        }

        self.rows_written += 1;
        Ok(())
    }

    pub fn finish(mut self) -> Result<W> {
        self.writer.flush()?;
        Ok(self.writer)
    }
}

/// Writes the magic, column count and column declarations.
pub fn write_stream_header<W: Write>(writer: &mut W, schema: &TanRowSchema) -> Result<()> {
    writer.write_all(TAN_STREAM_MAGIC)?;
    let count = u32::try_from(schema.len())
        .map_err(|_| TanError::malformed(0, "", "too many columns for stream header"))?;
    writer.write_all(&count.to_be_bytes())?;
    for column in schema.columns() {
        write_len_prefixed(writer, column.name.as_bytes())
            .map_err(|message| TanError::malformed(0, &column.name, message))?;
        writer.write_all(&[column.semantic_type.tag()])?;
    }
    Ok(())
}

/// Reads a header written by [`write_stream_header`].
pub fn read_stream_header<R: Read>(reader: &mut R) -> Result<TanRowSchema> {
    let header_error = |e: io::Error| TanError::malformed(0, "", format!("invalid stream header: {}", e));

    let mut magic = [0u8; 8];
    reader.read_exact(&mut magic).map_err(header_error)?;
    if &magic != TAN_STREAM_MAGIC {
        return Err(TanError::malformed(0, "", "stream does not start with TANROWS1"));
    }

    let mut count = [0u8; 4];
    reader.read_exact(&mut count).map_err(header_error)?;
    let count = u32::from_be_bytes(count);

    let mut fields = Vec::new();
    for _ in 0..count {
        let name = read_len_prefixed(reader).map_err(header_error)?;
        let name = String::from_utf8(name)
            .map_err(|_| TanError::malformed(0, "", "column name is not valid UTF-8"))?;
        let tag = read_u8(reader).map_err(header_error)?;
        let ty = TanSemanticType::from_tag(tag).ok_or_else(|| {
            TanError::malformed(0, &name, format!("unknown column type tag {}", tag))
        })?;
        fields.push((name, ty));
    }
    TanRowSchema::new(fields)
}

fn field_error(err: io::Error, row: u64, column: &str) -> TanError {
    match err.kind() {
        ErrorKind::UnexpectedEof => TanError::malformed(row, column, "stream ended mid-field"),
        ErrorKind::InvalidData => TanError::malformed(row, column, err.to_string()),
        _ => TanError::Io(err.to_string()),
    }
}

/// Reads one byte, distinguishing a clean end of stream from an error.
fn read_first_byte<R: Read>(reader: &mut R) -> Result<Option<u8>> {
    let mut buf = [0u8; 1];
    loop {
        match reader.read(&mut buf) {
            Ok(0) => return Ok(None),
            Ok(_) => return Ok(Some(buf[0])),
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
}

fn read_u8<R: Read>(reader: &mut R) -> io::Result<u8> {
    let mut buf = [0u8; 1];
    reader.read_exact(&mut buf)?;
    Ok(buf[0])
}

fn read_len_prefixed<R: Read>(reader: &mut R) -> io::Result<Vec<u8>> {
    let mut len = [0u8; 4];
    reader.read_exact(&mut len)?;
    let len = i32::from_be_bytes(len);
    let len = usize::try_from(len).map_err(|_| {
        io::Error::new(ErrorKind::InvalidData, format!("negative length {}", len))
    })?;
    let mut bytes = Vec::new();
    reader.by_ref().take(len as u64).read_to_end(&mut bytes)?;
    if bytes.len() < len {
        return Err(io::Error::new(
            ErrorKind::UnexpectedEof,
            format!("expected {} bytes, stream ended after {}", len, bytes.len()),
        ));
    }
    Ok(bytes)
}

fn read_payload<R: Read>(reader: &mut R, ty: TanSemanticType) -> io::Result<TanValue> {
    match ty {
        TanSemanticType::Number => {
            let mut buf = [0u8; 8];
            reader.read_exact(&mut buf)?;
            Ok(TanValue::Number(f64::from_be_bytes(buf)))
        }
        TanSemanticType::String => {
            let bytes = read_len_prefixed(reader)?;
            String::from_utf8(bytes)
                .map(TanValue::String)
                .map_err(|_| io::Error::new(ErrorKind::InvalidData, "string is not valid UTF-8"))
        }
        TanSemanticType::Date => {
            let mut buf = [0u8; 8];
            reader.read_exact(&mut buf)?;
            let millis = i64::from_be_bytes(buf);
            TanValue::date_millis(millis).ok_or_else(|| {
                io::Error::new(
                    ErrorKind::InvalidData,
                    format!("date {} ms is out of range", millis),
                )
            })
        }
        TanSemanticType::Boolean => match read_u8(reader)? {
            0 => Ok(TanValue::Boolean(false)),
            1 => Ok(TanValue::Boolean(true)),
            other => Err(io::Error::new(
                ErrorKind::InvalidData,
                format!("boolean byte {} is neither 0 nor 1", other),
            )),
        },
        TanSemanticType::Other => read_len_prefixed(reader).map(TanValue::Other),
    }
}

fn write_len_prefixed<W: Write>(writer: &mut W, bytes: &[u8]) -> std::result::Result<(), String> {
    let len = i32::try_from(bytes.len()).map_err(|_| "value longer than i32::MAX bytes".to_string())?;
    writer
        .write_all(&len.to_be_bytes())
        .and_then(|_| writer.write_all(bytes))
        .map_err(|e| e.to_string())
}

fn write_payload<W: Write>(writer: &mut W, value: &TanValue) -> std::result::Result<(), String> {
    let io = |e: io::Error| e.to_string();
    match value {
        TanValue::Null => Ok(()),
        TanValue::Number(n) => writer.write_all(&n.to_be_bytes()).map_err(io),
        TanValue::String(s) => write_len_prefixed(writer, s.as_bytes()),
        TanValue::Date(d) => writer
            .write_all(&d.timestamp_millis().to_be_bytes())
            .map_err(io),
        TanValue::Boolean(b) => writer.write_all(&[u8::from(*b)]).map_err(io),
        TanValue::Other(bytes) => write_len_prefixed(writer, bytes),
    }
}
