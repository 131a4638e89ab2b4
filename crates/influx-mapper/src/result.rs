// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Tabular query results, in the shape of the InfluxDB 1.x `/query` JSON response.
//!
//! ```json
//! {"results":[{"statement_id":0,"series":[
//!     {"name":"cpu","tags":{"host":"a"},"columns":["time","idle"],"values":[[1,12.5]]}
//! ]}]}
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Full response to a query request (one entry per statement).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    #[serde(default)]
    pub results: Vec<StatementResult>,
    /// Request-level error reported by the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Result of one statement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatementResult {
    #[serde(default)]
    pub statement_id: u32,
    #[serde(default)]
    pub series: Vec<Series>,
    /// Statement-level execution error.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// One series: column names and ordered rows.
///
/// A GROUP BY query yields one series per tag bucket, with the bucket's
/// tag values in `tags` rather than in the rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Series {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,
    #[serde(default)]
    pub columns: Vec<String>,
    /// Rows; `null` marks a missing value.
    #[serde(default)]
    pub values: Vec<Vec<JsonValue>>,
}

impl QueryResult {
    /// Parse a `/query` JSON response body.
    pub fn from_json(body: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(body)
    }

    /// A single-statement result holding `series`.
    pub fn from_series(series: Vec<Series>) -> Self {
        Self {
            results: vec![StatementResult {
                statement_id: 0,
                series,
                error: None,
            }],
            error: None,
        }
    }

    /// A result carrying a request-level error.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            results: Vec::new(),
            error: Some(message.into()),
        }
    }

    /// First non-empty error, request-level before statement-level.
    pub fn first_error(&self) -> Option<&str> {
        std::iter::once(&self.error)
            .chain(self.results.iter().map(|r| &r.error))
            .filter_map(|e| e.as_deref())
            .find(|e| !e.is_empty())
    }

    /// All series across statements, in response order.
    pub fn series(&self) -> impl Iterator<Item = &Series> {
        self.results.iter().flat_map(|r| r.series.iter())
    }
}

impl Series {
    pub fn new<I, S>(name: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: Some(name.into()),
            tags: BTreeMap::new(),
            columns: columns.into_iter().map(Into::into).collect(),
            values: Vec::new(),
        }
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    pub fn with_row(mut self, row: Vec<JsonValue>) -> Self {
        self.values.push(row);
        self
    }

    /// Display name, for diagnostics.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("<unnamed>")
    }
}
