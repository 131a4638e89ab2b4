// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! [`QueryResult`] to record decoding.
//!
//! Output order is series order, then row order within each series; the
//! decoder never reorders. Each series is planned once (column name to row
//! index, or to a series-level tag) and the plan is reused for every row.
//!
//! Conversion of raw values by declared kind:
//!
//! | kind      | accepted raw values                                   |
//! |-----------|-------------------------------------------------------|
//! | bool      | JSON bool, `"true"`/`"false"`                         |
//! | int64     | JSON integer, integral float, decimal string          |
//! | float64   | JSON number, numeric string                           |
//! | string    | JSON string, number or bool (natural string form)     |
//! | timestamp | epoch number in the query precision, RFC 3339 string  |
//!
//! `null` leaves the attribute at its default value.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;

use crate::error::DecodingError;
use crate::result::{QueryResult, Series};
use crate::schema::{Binding, ColumnDescriptor, Measurement, MeasurementSchema};
use crate::time::TimeUnit;
use crate::value::{Value, ValueKind};

/// Where a schema column reads its value from within one series.
enum Source<'s> {
    Row(usize),
    SeriesTag(&'s str),
}

/// Decode `result` into records of `T`.
///
/// Series named after another measurement are skipped; epoch timestamps
/// are read in the schema's time unit.
pub fn decode<T: Measurement>(
    schema: &MeasurementSchema<T>,
    result: &QueryResult,
) -> Result<Vec<T>, DecodingError> {
    decode_measurement(schema, result, schema.measurement(), schema.time_unit())
}

/// Decode `result` into records of `T`, reading only series named
/// `measurement` (or unnamed) and epoch timestamps in `precision`.
pub fn decode_measurement<T: Measurement>(
    schema: &MeasurementSchema<T>,
    result: &QueryResult,
    measurement: &str,
    precision: TimeUnit,
) -> Result<Vec<T>, DecodingError> {
    if let Some(message) = result.first_error() {
        return Err(DecodingError::Query {
            type_name: schema.type_name(),
            message: message.to_string(),
        });
    }

    let mut records = Vec::new();
    for series in result.series() {
        if let Some(name) = series.name.as_deref() {
            if name != measurement {
                log::warn!(
                    "[decoder] skipping series '{}' while decoding '{}' into {}",
                    name,
                    measurement,
                    schema.type_name()
                );
                continue;
            }
        }
        decode_series(schema, series, precision, &mut records)?;
    }

    log::debug!(
        "[decoder] decoded {} {} record(s) from '{}'",
        records.len(),
        schema.type_name(),
        measurement
    );
    Ok(records)
}

fn decode_series<T: Measurement>(
    schema: &MeasurementSchema<T>,
    series: &Series,
    precision: TimeUnit,
    records: &mut Vec<T>,
) -> Result<(), DecodingError> {
    let plan = plan_series(schema, series)?;
    log::trace!(
        "[decoder] series '{}': {} of {} columns mapped, {} rows",
        series.display_name(),
        plan.len(),
        schema.columns().len(),
        series.values.len()
    );

    records.reserve(series.values.len());
    for (row_index, row) in series.values.iter().enumerate() {
        if row.len() != series.columns.len() {
            return Err(DecodingError::RowShape {
                type_name: schema.type_name(),
                series: series.display_name().to_string(),
                row: row_index,
                expected: series.columns.len(),
                actual: row.len(),
            });
        }

        let mut record = T::default();
        for (column, source) in &plan {
            match source {
                Source::Row(index) => {
                    apply(schema, column, &mut record, &row[*index], precision)?;
                }
                Source::SeriesTag(value) => {
                    let raw = JsonValue::String((*value).to_string());
                    apply(schema, column, &mut record, &raw, precision)?;
                }
            }
        }
        records.push(record);
    }
    Ok(())
}

/// Pair every schema column present in `series` with its source.
/// Row columns win over series tags of the same name.
fn plan_series<'a, T>(
    schema: &'a MeasurementSchema<T>,
    series: &'a Series,
) -> Result<Vec<(&'a ColumnDescriptor<T>, Source<'a>)>, DecodingError> {
    let index: HashMap<&str, usize> = series
        .columns
        .iter()
        .enumerate()
        .map(|(i, name)| (name.as_str(), i))
        .collect();

    let mut plan = Vec::with_capacity(schema.columns().len());
    for column in schema.columns() {
        let source = match index.get(column.name()) {
            Some(&i) => Source::Row(i),
            None => match series.tags.get(column.name()) {
                Some(value) => Source::SeriesTag(value),
                None => continue,
            },
        };
        if let Binding::Unsupported = column.binding() {
            return Err(DecodingError::UnsupportedType {
                type_name: schema.type_name(),
                column: column.name().to_string(),
                rust_type: column.rust_type(),
            });
        }
        plan.push((column, source));
    }
    Ok(plan)
}

fn apply<T>(
    schema: &MeasurementSchema<T>,
    column: &ColumnDescriptor<T>,
    record: &mut T,
    raw: &JsonValue,
    precision: TimeUnit,
) -> Result<(), DecodingError> {
    if raw.is_null() {
        return Ok(());
    }
    let Binding::Typed { kind, set, .. } = column.binding() else {
        return Err(DecodingError::UnsupportedType {
            type_name: schema.type_name(),
            column: column.name().to_string(),
            rust_type: column.rust_type(),
        });
    };

    let conversion_error = || DecodingError::Conversion {
        type_name: schema.type_name(),
        column: column.name().to_string(),
        expected: kind,
        raw: raw.to_string(),
    };

    let value = coerce(raw, kind, precision).ok_or_else(conversion_error)?;
    set(record, value).map_err(|_| conversion_error())
}

/// Convert a raw result value to `kind`, `None` when it does not fit.
fn coerce(raw: &JsonValue, kind: ValueKind, precision: TimeUnit) -> Option<Value> {
    match kind {
        ValueKind::Bool => match raw {
            JsonValue::Bool(b) => Some(Value::Bool(*b)),
            JsonValue::String(s) => s.parse().ok().map(Value::Bool),
            _ => None,
        },
        ValueKind::Int64 => integer(raw).map(Value::Int64),
        ValueKind::Float64 => match raw {
            JsonValue::Number(n) => n.as_f64().map(Value::Float64),
            JsonValue::String(s) => s.parse().ok().map(Value::Float64),
            _ => None,
        },
        ValueKind::String => match raw {
            JsonValue::String(s) => Some(Value::String(s.clone())),
            JsonValue::Number(n) => Some(Value::String(n.to_string())),
            JsonValue::Bool(b) => Some(Value::String(b.to_string())),
            _ => None,
        },
        ValueKind::Timestamp => match raw {
            JsonValue::String(s) => DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|t| t.with_timezone(&Utc))
                .or_else(|| s.parse().ok().and_then(|v| precision.to_datetime(v)))
                .map(Value::Timestamp),
            _ => integer(raw)
                .and_then(|v| precision.to_datetime(v))
                .map(Value::Timestamp),
        },
    }
}

/// Integral value of a JSON number or decimal string.
fn integer(raw: &JsonValue) -> Option<i64> {
    match raw {
        JsonValue::Number(n) => n.as_i64().or_else(|| {
            let f = n.as_f64()?;
            // 2^63 is exact in f64; anything at or beyond it does not fit.
            let in_range = f >= -9_223_372_036_854_775_808.0 && f < 9_223_372_036_854_775_808.0;
            (f.fract() == 0.0 && in_range).then_some(f as i64)
        }),
        JsonValue::String(s) => s.parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::StatementResult;
    use crate::schema::{ColumnDef, TypeMetadata};
    use crate::value::ColumnValue;
    use serde_json::json;

    #[derive(Debug, Default, PartialEq)]
    struct Cpu {
        host: String,
        core: i32,
        idle: f64,
        busy: bool,
        label: String,
        time: Option<DateTime<Utc>>,
    }

    impl Measurement for Cpu {
        fn describe() -> TypeMetadata<Self> {
            TypeMetadata::new("tests::Cpu")
                .measurement("cpu")
                .time_unit(TimeUnit::Millis)
                .column(ColumnDef::tag::<String>(
                    "host",
                    "host",
                    |c: &Cpu| c.host.to_value(),
                    |c, v| {
                        c.host = String::from_value(v)?;
                        Ok(())
                    },
                ))
                .column(ColumnDef::tag::<i32>(
                    "core",
                    "core",
                    |c| c.core.to_value(),
                    |c, v| {
                        c.core = i32::from_value(v)?;
                        Ok(())
                    },
                ))
                .column(ColumnDef::field::<f64>(
                    "idle",
                    "idle",
                    |c| c.idle.to_value(),
                    |c, v| {
                        c.idle = f64::from_value(v)?;
                        Ok(())
                    },
                ))
                .column(ColumnDef::field::<bool>(
                    "busy",
                    "busy",
                    |c| c.busy.to_value(),
                    |c, v| {
                        c.busy = bool::from_value(v)?;
                        Ok(())
                    },
                ))
                .column(ColumnDef::field::<String>(
                    "label",
                    "label",
                    |c| c.label.to_value(),
                    |c, v| {
                        c.label = String::from_value(v)?;
                        Ok(())
                    },
                ))
                .column(ColumnDef::field::<Option<DateTime<Utc>>>(
                    "time",
                    "time",
                    |c| c.time.to_value(),
                    |c, v| {
                        c.time = Option::<DateTime<Utc>>::from_value(v)?;
                        Ok(())
                    },
                ))
        }
    }

    fn schema() -> MeasurementSchema<Cpu> {
        MeasurementSchema::build(Cpu::describe()).expect("schema")
    }

    fn millis(ms: i64) -> Option<DateTime<Utc>> {
        TimeUnit::Millis.to_datetime(ms)
    }

    #[test]
    fn test_decode_rows_in_order() {
        let result = QueryResult::from_series(vec![Series::new(
            "cpu",
            ["time", "host", "core", "idle", "busy", "label"],
        )
        .with_row(vec![json!(3), json!("c"), json!("2"), json!(0.5), json!(false), json!("z")])
        .with_row(vec![json!(1), json!("a"), json!("0"), json!(9.0), json!(true), json!("y")])
        .with_row(vec![json!(2), json!("b"), json!("1"), json!(4.25), json!(false), json!("x")])]);

        let records = decode(&schema(), &result).expect("decode");
        let hosts: Vec<_> = records.iter().map(|r| r.host.as_str()).collect();
        assert_eq!(hosts, vec!["c", "a", "b"]);

        assert_eq!(
            records[1],
            Cpu {
                host: "a".into(),
                core: 0,
                idle: 9.0,
                busy: true,
                label: "y".into(),
                time: millis(1),
            }
        );
    }

    #[test]
    fn test_missing_columns_and_nulls_keep_defaults() {
        let result = QueryResult::from_series(vec![Series::new("cpu", ["time", "idle"])
            .with_row(vec![json!(5), json!(null)])
            .with_row(vec![json!(null), json!(1.5)])]);

        let records = decode(&schema(), &result).expect("decode");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].idle, 0.0);
        assert_eq!(records[0].time, millis(5));
        assert_eq!(records[0].host, "");
        assert_eq!(records[0].label, "");
        assert_eq!(records[1].time, None);
        assert_eq!(records[1].idle, 1.5);
    }

    #[test]
    fn test_series_tags_fill_grouped_buckets() {
        let result = QueryResult::from_series(vec![
            Series::new("cpu", ["time", "idle"])
                .with_tag("host", "a")
                .with_tag("core", "3")
                .with_row(vec![json!(1), json!(10.0)])
                .with_row(vec![json!(2), json!(11.0)]),
            Series::new("cpu", ["time", "idle"])
                .with_tag("host", "b")
                .with_row(vec![json!(1), json!(20.0)]),
        ]);

        let records = decode(&schema(), &result).expect("decode");
        let summary: Vec<_> = records
            .iter()
            .map(|r| (r.host.as_str(), r.core, r.idle))
            .collect();
        assert_eq!(
            summary,
            vec![("a", 3, 10.0), ("a", 3, 11.0), ("b", 0, 20.0)]
        );
    }

    #[test]
    fn test_series_across_statements_keep_order() {
        let result = QueryResult {
            results: vec![
                StatementResult {
                    statement_id: 0,
                    series: vec![Series::new("cpu", ["host"]).with_row(vec![json!("first")])],
                    error: None,
                },
                StatementResult {
                    statement_id: 1,
                    series: vec![Series::new("cpu", ["host"]).with_row(vec![json!("second")])],
                    error: None,
                },
            ],
            error: None,
        };

        let records = decode(&schema(), &result).expect("decode");
        let hosts: Vec<_> = records.iter().map(|r| r.host.as_str()).collect();
        assert_eq!(hosts, vec!["first", "second"]);
    }

    #[test]
    fn test_other_measurements_skipped() {
        let result = QueryResult::from_series(vec![
            Series::new("mem", ["host"]).with_row(vec![json!("m")]),
            Series::new("cpu", ["host"]).with_row(vec![json!("c")]),
        ]);

        let records = decode(&schema(), &result).expect("decode");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].host, "c");

        let records =
            decode_measurement(&schema(), &result, "mem", TimeUnit::Millis).expect("decode");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].host, "m");
    }

    #[test]
    fn test_query_error_aborts_whole_result() {
        let mut result = QueryResult::from_series(vec![
            Series::new("cpu", ["host"]).with_row(vec![json!("a")])
        ]);
        result.results.push(StatementResult {
            statement_id: 1,
            series: Vec::new(),
            error: Some("shard unavailable".into()),
        });

        assert_eq!(
            decode(&schema(), &result),
            Err(DecodingError::Query {
                type_name: "tests::Cpu",
                message: "shard unavailable".into(),
            })
        );
        assert!(matches!(
            decode(&schema(), &QueryResult::failed("bad query")),
            Err(DecodingError::Query { .. })
        ));
    }

    #[test]
    fn test_time_precision_and_rfc3339() {
        let result = QueryResult::from_series(vec![Series::new("cpu", ["time"])
            .with_row(vec![json!(1_700_000_000)])
            .with_row(vec![json!("2023-11-14T22:13:20.5Z")])]);

        let records = decode_measurement(&schema(), &result, "cpu", TimeUnit::Seconds)
            .expect("decode");
        assert_eq!(records[0].time, DateTime::from_timestamp(1_700_000_000, 0));
        assert_eq!(
            records[1].time,
            DateTime::from_timestamp(1_700_000_000, 500_000_000)
        );
    }

    #[test]
    fn test_numeric_narrowing() {
        let result = QueryResult::from_series(vec![Series::new("cpu", ["core", "idle"])
            .with_row(vec![json!(4.0), json!(3)])]);
        let records = decode(&schema(), &result).expect("decode");
        assert_eq!(records[0].core, 4);
        assert_eq!(records[0].idle, 3.0);

        let fractional = QueryResult::from_series(vec![
            Series::new("cpu", ["core"]).with_row(vec![json!(4.5)])
        ]);
        assert!(matches!(
            decode(&schema(), &fractional),
            Err(DecodingError::Conversion { expected: ValueKind::Int64, .. })
        ));

        let overflow = QueryResult::from_series(vec![
            Series::new("cpu", ["core"]).with_row(vec![json!(i64::from(i32::MAX) + 1)])
        ]);
        match decode(&schema(), &overflow) {
            Err(DecodingError::Conversion { column, raw, .. }) => {
                assert_eq!(column, "core");
                assert_eq!(raw, "2147483648");
            }
            other => panic!("expected Conversion, got {:?}", other),
        }
    }

    #[test]
    fn test_string_columns_accept_scalars() {
        let result = QueryResult::from_series(vec![Series::new("cpu", ["label", "busy"])
            .with_row(vec![json!(42), json!("true")])]);
        let records = decode(&schema(), &result).expect("decode");
        assert_eq!(records[0].label, "42");
        assert!(records[0].busy);
    }

    #[test]
    fn test_bad_value_names_column() {
        let result = QueryResult::from_series(vec![
            Series::new("cpu", ["idle"]).with_row(vec![json!("warm")])
        ]);
        assert_eq!(
            decode(&schema(), &result),
            Err(DecodingError::Conversion {
                type_name: "tests::Cpu",
                column: "idle".into(),
                expected: ValueKind::Float64,
                raw: "\"warm\"".into(),
            })
        );
    }

    #[test]
    fn test_ragged_row_rejected() {
        let result = QueryResult::from_series(vec![Series::new("cpu", ["time", "idle"])
            .with_row(vec![json!(1)])]);
        assert!(matches!(
            decode(&schema(), &result),
            Err(DecodingError::RowShape {
                row: 0,
                expected: 2,
                actual: 1,
                ..
            })
        ));
    }
}
