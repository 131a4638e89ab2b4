// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Write-ready points and their Line Protocol rendering.
//!
//! Line Protocol format:
//! ```text
//! measurement,tag1=val1,tag2=val2 field1=val1,field2=val2 timestamp
//! ```
//!
//! The timestamp is expressed in the point's [`TimeUnit`]; clients send it
//! with the matching `precision` parameter.
//!
//! See: <https://docs.influxdata.com/influxdb/v1/write_protocols/line_protocol_reference/>

use std::collections::BTreeMap;
use std::fmt;

use crate::time::TimeUnit;

/// A value that can be stored in an InfluxDB field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// 64-bit floating point.
    Float(f64),
    /// 64-bit signed integer.
    Integer(i64),
    /// UTF-8 string.
    String(String),
    /// Boolean value.
    Boolean(bool),
}

impl FieldValue {
    /// Format this value for Line Protocol.
    ///
    /// - Float: written as-is (e.g., `3.14`)
    /// - Integer: suffixed with `i` (e.g., `42i`)
    /// - String: quoted with double quotes, inner quotes escaped (e.g., `"hello"`)
    /// - Boolean: `true` or `false`
    pub fn to_line_protocol(&self) -> String {
        match self {
            FieldValue::Float(v) => format!("{}", v),
            FieldValue::Integer(v) => format!("{}i", v),
            FieldValue::String(v) => {
                let escaped = v.replace('\\', "\\\\").replace('"', "\\\"");
                format!("\"{}\"", escaped)
            }
            FieldValue::Boolean(v) => v.to_string(),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_line_protocol())
    }
}

/// A single time-series write unit.
///
/// Tags are kept sorted by key (canonical Line Protocol order); fields keep
/// the column order of the schema that produced them.
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    measurement: String,
    database: Option<String>,
    retention_policy: Option<String>,
    time: i64,
    precision: TimeUnit,
    tags: BTreeMap<String, String>,
    fields: Vec<(String, FieldValue)>,
}

impl Point {
    /// Create a point with no tags or fields.
    pub fn new(measurement: impl Into<String>, time: i64, precision: TimeUnit) -> Self {
        Self {
            measurement: measurement.into(),
            database: None,
            retention_policy: None,
            time,
            precision,
            tags: BTreeMap::new(),
            fields: Vec::new(),
        }
    }

    /// Set the destination. `None` means the client's default.
    pub fn with_destination(
        mut self,
        database: Option<String>,
        retention_policy: Option<String>,
    ) -> Self {
        self.database = database;
        self.retention_policy = retention_policy;
        self
    }

    /// Add or replace a tag.
    ///
    /// Line Protocol has no empty tag value: a tag whose value is empty is
    /// skipped.
    pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let value = value.into();
        if !value.is_empty() {
            self.tags.insert(key.into(), value);
        }
        self
    }

    /// Add or replace a field.
    pub fn field(mut self, key: impl Into<String>, value: FieldValue) -> Self {
        let key = key.into();
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((key, value)),
        }
        self
    }

    pub fn measurement(&self) -> &str {
        &self.measurement
    }

    pub fn database(&self) -> Option<&str> {
        self.database.as_deref()
    }

    pub fn retention_policy(&self) -> Option<&str> {
        self.retention_policy.as_deref()
    }

    /// Timestamp in [`Point::precision`] units since the Unix epoch.
    pub fn time(&self) -> i64 {
        self.time
    }

    pub fn precision(&self) -> TimeUnit {
        self.precision
    }

    pub fn tags(&self) -> &BTreeMap<String, String> {
        &self.tags
    }

    pub fn tag_value(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    pub fn fields(&self) -> &[(String, FieldValue)] {
        &self.fields
    }

    pub fn field_value(&self, key: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Render this point as one Line Protocol line.
    ///
    /// A point without fields renders with an empty field set, which
    /// InfluxDB rejects; the encoder never produces one.
    pub fn to_line_protocol(&self) -> String {
        let mut line = escape_measurement(&self.measurement);

        for (key, value) in &self.tags {
            line.push(',');
            line.push_str(&escape_key(key));
            line.push('=');
            line.push_str(&escape_key(value));
        }

        line.push(' ');

        for (i, (key, value)) in self.fields.iter().enumerate() {
            if i > 0 {
                line.push(',');
            }
            line.push_str(&escape_key(key));
            line.push('=');
            line.push_str(&value.to_line_protocol());
        }

        line.push(' ');
        line.push_str(&self.time.to_string());
        line
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_line_protocol())
    }
}

/// Spaces and commas must be escaped with backslash.
fn escape_measurement(s: &str) -> String {
    s.replace(',', "\\,").replace(' ', "\\ ")
}

/// Tag keys, tag values and field keys share one rule:
/// commas, equals signs, and spaces must be escaped.
fn escape_key(s: &str) -> String {
    s.replace(',', "\\,")
        .replace('=', "\\=")
        .replace(' ', "\\ ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_value_formats() {
        assert_eq!(FieldValue::Float(3.15).to_line_protocol(), "3.15");
        assert_eq!(FieldValue::Integer(42).to_line_protocol(), "42i");
        assert_eq!(
            FieldValue::String("say \"hi\"".to_string()).to_line_protocol(),
            "\"say \\\"hi\\\"\""
        );
        assert_eq!(FieldValue::Boolean(true).to_line_protocol(), "true");
    }

    #[test]
    fn test_line_protocol_simple_point() {
        let point = Point::new("temperature", 1_000_000_000, TimeUnit::Nanos)
            .field("value", FieldValue::Float(23.5));
        assert_eq!(point.to_line_protocol(), "temperature value=23.5 1000000000");
    }

    #[test]
    fn test_line_protocol_tags_sorted_fields_in_order() {
        let point = Point::new("weather", 2_000, TimeUnit::Seconds)
            .tag("station", "north")
            .tag("region", "eu")
            .field("temp", FieldValue::Float(22.1))
            .field("humidity", FieldValue::Integer(65))
            .field("ok", FieldValue::Boolean(true));

        assert_eq!(
            point.to_line_protocol(),
            "weather,region=eu,station=north temp=22.1,humidity=65i,ok=true 2000"
        );
    }

    #[test]
    fn test_empty_tag_value_skipped() {
        let point = Point::new("cpu", 1, TimeUnit::Seconds)
            .tag("host", "")
            .tag("region", "eu")
            .field("idle", FieldValue::Float(1.0));

        assert_eq!(point.tag_value("host"), None);
        assert_eq!(point.tags().len(), 1);
        assert_eq!(point.to_line_protocol(), "cpu,region=eu idle=1 1");
    }

    #[test]
    fn test_line_protocol_escape_special_chars() {
        let point = Point::new("my measurement", 3, TimeUnit::Millis)
            .tag("tag key", "tag,value")
            .field(
                "field=key",
                FieldValue::String("hello \"world\"".to_string()),
            );

        assert_eq!(
            point.to_line_protocol(),
            "my\\ measurement,tag\\ key=tag\\,value field\\=key=\"hello \\\"world\\\"\" 3"
        );
    }

    #[test]
    fn test_field_replaces_existing_key() {
        let point = Point::new("m", 0, TimeUnit::Millis)
            .field("a", FieldValue::Integer(1))
            .field("b", FieldValue::Integer(2))
            .field("a", FieldValue::Integer(3));

        assert_eq!(point.fields().len(), 2);
        assert_eq!(point.field_value("a"), Some(&FieldValue::Integer(3)));
        assert_eq!(point.fields()[0].0, "a");
    }

    #[test]
    fn test_destination_defaults_to_client() {
        let point = Point::new("m", 0, TimeUnit::Millis);
        assert_eq!(point.database(), None);
        assert_eq!(point.retention_policy(), None);

        let point = point.with_destination(Some("telegraf".into()), Some("autogen".into()));
        assert_eq!(point.database(), Some("telegraf"));
        assert_eq!(point.retention_policy(), Some("autogen"));
    }
}
