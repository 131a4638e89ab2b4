// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error taxonomy of the mapper.
//!
//! All errors are local to the call that produced them and are never
//! retried internally: a schema or data mismatch will not fix itself.
//! Every variant names the record type and, where one is involved, the
//! column so that a mismatch can be diagnosed from the message alone.

use thiserror::Error;

use crate::client::ClientError;
use crate::value::ValueKind;

/// Measurement metadata is missing, malformed or ambiguous.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("type `{type_name}` does not declare a measurement name")]
    MissingMeasurement { type_name: &'static str },

    #[error("type `{type_name}`: attribute `{attribute}` has an empty column name")]
    EmptyColumnName {
        type_name: &'static str,
        attribute: &'static str,
    },

    #[error(
        "type `{type_name}`: column `{column}` is claimed by both `{first}` and `{second}`"
    )]
    DuplicateColumn {
        type_name: &'static str,
        column: String,
        first: &'static str,
        second: &'static str,
    },

    #[error("type `{type_name}`: the `time` column (attribute `{attribute}`) cannot be a tag")]
    TaggedTime {
        type_name: &'static str,
        attribute: &'static str,
    },

    #[error(
        "measurement `{measurement}` of type `{type_name}` should specify a database for this operation"
    )]
    DatabaseRequired {
        type_name: &'static str,
        measurement: String,
    },

    #[error("schema cache holds a foreign entry for type `{type_name}`")]
    CacheEntryMismatch { type_name: &'static str },
}

/// A record could not be turned into a point.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodingError {
    #[error("type `{type_name}`: tag column `{column}` has no value")]
    NullTag {
        type_name: &'static str,
        column: String,
    },

    #[error("type `{type_name}`: unsupported type `{rust_type}` for column `{column}`")]
    UnsupportedType {
        type_name: &'static str,
        column: String,
        rust_type: &'static str,
    },

    #[error(
        "type `{type_name}`: unsupported type `{rust_type}` for time column `{column}`, expected a timestamp"
    )]
    UnsupportedTime {
        type_name: &'static str,
        column: String,
        rust_type: &'static str,
    },

    #[error(
        "type `{type_name}`: column `{column}` declared as {declared} produced a {actual} value"
    )]
    KindMismatch {
        type_name: &'static str,
        column: String,
        declared: ValueKind,
        actual: ValueKind,
    },

    #[error("type `{type_name}`: time column `{column}` is outside the representable range")]
    TimeOutOfRange {
        type_name: &'static str,
        column: String,
    },

    #[error("type `{type_name}`: float field `{column}` is NaN or infinite")]
    NonFiniteField {
        type_name: &'static str,
        column: String,
    },

    #[error("type `{type_name}`: point for measurement `{measurement}` has no fields")]
    NoFields {
        type_name: &'static str,
        measurement: String,
    },
}

/// A query result could not be turned into records.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodingError {
    #[error("query for type `{type_name}` failed: {message}")]
    Query {
        type_name: &'static str,
        message: String,
    },

    #[error("type `{type_name}`: unsupported type `{rust_type}` for column `{column}`")]
    UnsupportedType {
        type_name: &'static str,
        column: String,
        rust_type: &'static str,
    },

    #[error("type `{type_name}`: cannot convert `{raw}` in column `{column}` to {expected}")]
    Conversion {
        type_name: &'static str,
        column: String,
        expected: ValueKind,
        raw: String,
    },

    #[error(
        "type `{type_name}`: row {row} of series `{series}` has {actual} values for {expected} columns"
    )]
    RowShape {
        type_name: &'static str,
        series: String,
        row: usize,
        expected: usize,
        actual: usize,
    },
}

/// Failure of a facade operation.
#[derive(Debug, Error)]
pub enum MapperError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Encoding(#[from] EncodingError),

    #[error(transparent)]
    Decoding(#[from] DecodingError),

    #[error("client error: {0}")]
    Client(#[source] ClientError),
}
