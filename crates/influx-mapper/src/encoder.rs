// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Record to [`Point`] encoding.
//!
//! Rules, per column role:
//! - Tag: the value's natural string form. Absent values follow the
//!   configured [`NullTagPolicy`].
//! - Time: the timestamp converted to the schema's unit; absent falls back
//!   to the wall clock supplied by the caller.
//! - Field: the value of its declared kind, no implicit conversion across
//!   kinds. Absent values are omitted.

use crate::config::NullTagPolicy;
use crate::error::EncodingError;
use crate::point::{FieldValue, Point};
use crate::schema::{Binding, ColumnDescriptor, MeasurementSchema, Role};
use crate::time::TimeUnit;
use crate::value::{Value, ValueKind};

/// Turns records into points using a cached schema.
#[derive(Debug, Clone, Copy, Default)]
pub struct Encoder {
    null_tags: NullTagPolicy,
}

impl Encoder {
    #[must_use]
    pub fn new(null_tags: NullTagPolicy) -> Self {
        Self { null_tags }
    }

    pub fn null_tags(&self) -> NullTagPolicy {
        self.null_tags
    }

    /// Encode `record` into a point addressed to the schema's destination.
    ///
    /// `now_millis` is the wall-clock time in milliseconds, used when the
    /// record has no timestamp.
    pub fn encode<T>(
        &self,
        schema: &MeasurementSchema<T>,
        record: &T,
        now_millis: i64,
    ) -> Result<Point, EncodingError> {
        let unit = schema.time_unit();
        let mut time = None;
        let mut tags = Vec::new();
        let mut fields = Vec::new();

        for column in schema.columns() {
            match column.role() {
                Role::Tag => {
                    let value = match read(schema, column, record)? {
                        Some(value) => value.to_string(),
                        None => match self.null_tags {
                            NullTagPolicy::Reject => {
                                return Err(EncodingError::NullTag {
                                    type_name: schema.type_name(),
                                    column: column.name().to_string(),
                                })
                            }
                            NullTagPolicy::Omit => continue,
                        },
                    };
                    tags.push((column.name(), value));
                }
                Role::Timestamp => {
                    time = encode_time(schema, column, record, unit)?.or(time);
                }
                Role::Field => {
                    let Some(value) = read(schema, column, record)? else {
                        continue;
                    };
                    let field = match value {
                        Value::Bool(v) => FieldValue::Boolean(v),
                        Value::Int64(v) => FieldValue::Integer(v),
                        Value::Float64(v) if !v.is_finite() => {
                            return Err(EncodingError::NonFiniteField {
                                type_name: schema.type_name(),
                                column: column.name().to_string(),
                            })
                        }
                        Value::Float64(v) => FieldValue::Float(v),
                        Value::String(v) => FieldValue::String(v),
                        Value::Timestamp(_) => {
                            return Err(EncodingError::UnsupportedType {
                                type_name: schema.type_name(),
                                column: column.name().to_string(),
                                rust_type: column.rust_type(),
                            })
                        }
                    };
                    fields.push((column.name(), field));
                }
            }
        }

        if fields.is_empty() {
            return Err(EncodingError::NoFields {
                type_name: schema.type_name(),
                measurement: schema.measurement().to_string(),
            });
        }

        let time = time.unwrap_or_else(|| unit.convert(now_millis, TimeUnit::Millis));
        let mut point = Point::new(schema.measurement(), time, unit).with_destination(
            schema.database().map(str::to_string),
            schema.retention_policy().map(str::to_string),
        );
        for (key, value) in tags {
            point = point.tag(key, value);
        }
        for (key, value) in fields {
            point = point.field(key, value);
        }

        log::trace!(
            "[encoder] {} -> {}",
            schema.type_name(),
            point.to_line_protocol()
        );
        Ok(point)
    }
}

/// Encode with the default (rejecting) null-tag policy.
pub fn encode<T>(
    schema: &MeasurementSchema<T>,
    record: &T,
    now_millis: i64,
) -> Result<Point, EncodingError> {
    Encoder::default().encode(schema, record, now_millis)
}

/// Current value of a column, checked against its declared kind.
fn read<T>(
    schema: &MeasurementSchema<T>,
    column: &ColumnDescriptor<T>,
    record: &T,
) -> Result<Option<Value>, EncodingError> {
    match column.binding() {
        Binding::Typed { kind, get, .. } => match get(record) {
            Some(value) if value.kind() != kind => Err(EncodingError::KindMismatch {
                type_name: schema.type_name(),
                column: column.name().to_string(),
                declared: kind,
                actual: value.kind(),
            }),
            value => Ok(value),
        },
        Binding::Unsupported => Err(EncodingError::UnsupportedType {
            type_name: schema.type_name(),
            column: column.name().to_string(),
            rust_type: column.rust_type(),
        }),
    }
}

fn encode_time<T>(
    schema: &MeasurementSchema<T>,
    column: &ColumnDescriptor<T>,
    record: &T,
    unit: TimeUnit,
) -> Result<Option<i64>, EncodingError> {
    if column.kind() != Some(ValueKind::Timestamp) {
        return Err(EncodingError::UnsupportedTime {
            type_name: schema.type_name(),
            column: column.name().to_string(),
            rust_type: column.rust_type(),
        });
    }

    match read(schema, column, record)? {
        Some(Value::Timestamp(instant)) => unit
            .from_datetime(&instant)
            .map(Some)
            .ok_or_else(|| EncodingError::TimeOutOfRange {
                type_name: schema.type_name(),
                column: column.name().to_string(),
            }),
        _ => Ok(None),
    }
}
