// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Column value kinds and the Rust types bound to them.

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};

/// Kind of value a column holds.
///
/// Closed set: every coercion in the encoder and decoder is an exhaustive
/// match over these variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Bool,
    Int64,
    Float64,
    String,
    Timestamp,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Bool => "bool",
            ValueKind::Int64 => "int64",
            ValueKind::Float64 => "float64",
            ValueKind::String => "string",
            ValueKind::Timestamp => "timestamp",
        };
        f.write_str(name)
    }
}

/// A present column value.
///
/// Absence is modelled as `Option::None` by the accessors, never as a variant.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Int64(i64),
    Float64(f64),
    String(String),
    Timestamp(DateTime<Utc>),
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Bool(_) => ValueKind::Bool,
            Value::Int64(_) => ValueKind::Int64,
            Value::Float64(_) => ValueKind::Float64,
            Value::String(_) => ValueKind::String,
            Value::Timestamp(_) => ValueKind::Timestamp,
        }
    }
}

/// Natural string form, used when a value is written as a tag.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(v) => write!(f, "{}", v),
            Value::Int64(v) => write!(f, "{}", v),
            Value::Float64(v) => write!(f, "{}", v),
            Value::String(v) => f.write_str(v),
            Value::Timestamp(v) => f.write_str(&v.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
        }
    }
}

/// A Rust type that can be bound to a column.
///
/// `from_value` receives a value of kind [`Self::KIND`] and hands it back
/// unchanged when it cannot be represented (e.g. an `i64` outside `i32`).
pub trait ColumnValue: Sized {
    const KIND: ValueKind;

    fn to_value(&self) -> Option<Value>;

    fn from_value(value: Value) -> Result<Self, Value>;
}

impl ColumnValue for bool {
    const KIND: ValueKind = ValueKind::Bool;

    fn to_value(&self) -> Option<Value> {
        Some(Value::Bool(*self))
    }

    fn from_value(value: Value) -> Result<Self, Value> {
        match value {
            Value::Bool(v) => Ok(v),
            other => Err(other),
        }
    }
}

impl ColumnValue for i64 {
    const KIND: ValueKind = ValueKind::Int64;

    fn to_value(&self) -> Option<Value> {
        Some(Value::Int64(*self))
    }

    fn from_value(value: Value) -> Result<Self, Value> {
        match value {
            Value::Int64(v) => Ok(v),
            other => Err(other),
        }
    }
}

/// Stored as INT64; narrowing back is range-checked.
impl ColumnValue for i32 {
    const KIND: ValueKind = ValueKind::Int64;

    fn to_value(&self) -> Option<Value> {
        Some(Value::Int64(i64::from(*self)))
    }

    fn from_value(value: Value) -> Result<Self, Value> {
        match value {
            Value::Int64(v) => i32::try_from(v).map_err(|_| Value::Int64(v)),
            other => Err(other),
        }
    }
}

impl ColumnValue for f64 {
    const KIND: ValueKind = ValueKind::Float64;

    fn to_value(&self) -> Option<Value> {
        Some(Value::Float64(*self))
    }

    fn from_value(value: Value) -> Result<Self, Value> {
        match value {
            Value::Float64(v) => Ok(v),
            other => Err(other),
        }
    }
}

impl ColumnValue for String {
    const KIND: ValueKind = ValueKind::String;

    fn to_value(&self) -> Option<Value> {
        Some(Value::String(self.clone()))
    }

    fn from_value(value: Value) -> Result<Self, Value> {
        match value {
            Value::String(v) => Ok(v),
            other => Err(other),
        }
    }
}

impl ColumnValue for DateTime<Utc> {
    const KIND: ValueKind = ValueKind::Timestamp;

    fn to_value(&self) -> Option<Value> {
        Some(Value::Timestamp(*self))
    }

    fn from_value(value: Value) -> Result<Self, Value> {
        match value {
            Value::Timestamp(v) => Ok(v),
            other => Err(other),
        }
    }
}

impl<T: ColumnValue> ColumnValue for Option<T> {
    const KIND: ValueKind = T::KIND;

    fn to_value(&self) -> Option<Value> {
        self.as_ref().and_then(T::to_value)
    }

    fn from_value(value: Value) -> Result<Self, Value> {
        T::from_value(value).map(Some)
    }
}
