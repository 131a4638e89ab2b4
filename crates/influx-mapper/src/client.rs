// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Client boundary: the operations the mapper needs from an InfluxDB client.
//!
//! Transport, authentication, retries and timeouts belong to the client.
//! [`MemoryClient`] is an in-process implementation that records writes and
//! replays queued results.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::point::Point;
use crate::result::QueryResult;
use crate::time::TimeUnit;

/// Error raised by a client implementation.
pub type ClientError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A query statement and where to run it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub command: String,
    /// None = the client's default database.
    pub database: Option<String>,
    /// Precision of epoch timestamps in the response. None = RFC 3339 strings.
    pub epoch: Option<TimeUnit>,
}

impl Query {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            database: None,
            epoch: None,
        }
    }

    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    pub fn epoch(mut self, epoch: TimeUnit) -> Self {
        self.epoch = Some(epoch);
        self
    }

    /// `SELECT * FROM "<measurement>"`.
    pub fn select_all(measurement: &str) -> Self {
        let quoted = measurement.replace('\\', "\\\\").replace('"', "\\\"");
        Self::new(format!("SELECT * FROM \"{}\"", quoted))
    }
}

/// Operations the mapper consumes from an InfluxDB client.
pub trait InfluxClient {
    /// Execute a query. Execution errors may be reported inside the result.
    fn query(&self, query: &Query) -> Result<QueryResult, ClientError>;

    /// Write to the client's default database and retention policy.
    fn write(&self, point: &Point) -> Result<(), ClientError>;

    /// Write to an explicit database. `None` retention policy = the database default.
    fn write_to(
        &self,
        database: &str,
        retention_policy: Option<&str>,
        point: &Point,
    ) -> Result<(), ClientError>;
}

impl<C: InfluxClient + ?Sized> InfluxClient for &C {
    fn query(&self, query: &Query) -> Result<QueryResult, ClientError> {
        (**self).query(query)
    }

    fn write(&self, point: &Point) -> Result<(), ClientError> {
        (**self).write(point)
    }

    fn write_to(
        &self,
        database: &str,
        retention_policy: Option<&str>,
        point: &Point,
    ) -> Result<(), ClientError> {
        (**self).write_to(database, retention_policy, point)
    }
}

impl<C: InfluxClient + ?Sized> InfluxClient for Arc<C> {
    fn query(&self, query: &Query) -> Result<QueryResult, ClientError> {
        (**self).query(query)
    }

    fn write(&self, point: &Point) -> Result<(), ClientError> {
        (**self).write(point)
    }

    fn write_to(
        &self,
        database: &str,
        retention_policy: Option<&str>,
        point: &Point,
    ) -> Result<(), ClientError> {
        (**self).write_to(database, retention_policy, point)
    }
}

// ---------------------------------------------------------------------------
// MemoryClient
// ---------------------------------------------------------------------------

/// Where a point was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    /// Client default database and retention policy.
    Default,
    Explicit {
        database: String,
        retention_policy: Option<String>,
    },
}

#[derive(Default)]
struct MemoryState {
    writes: Vec<(Destination, Point)>,
    queries: Vec<Query>,
    responses: VecDeque<QueryResult>,
}

/// In-process client: records writes and queries, replays queued results.
///
/// With no queued result a query returns an empty result.
#[derive(Default)]
pub struct MemoryClient {
    state: Mutex<MemoryState>,
}

impl MemoryClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the result returned by the next query.
    pub fn push_response(&self, result: QueryResult) {
        self.state.lock().responses.push_back(result);
    }

    /// All writes so far, in order.
    pub fn writes(&self) -> Vec<(Destination, Point)> {
        self.state.lock().writes.clone()
    }

    /// Written points rendered as Line Protocol, in order.
    pub fn lines(&self) -> Vec<String> {
        self.state
            .lock()
            .writes
            .iter()
            .map(|(_, point)| point.to_line_protocol())
            .collect()
    }

    /// All queries executed so far, in order.
    pub fn queries(&self) -> Vec<Query> {
        self.state.lock().queries.clone()
    }
}

impl InfluxClient for MemoryClient {
    fn query(&self, query: &Query) -> Result<QueryResult, ClientError> {
        let mut state = self.state.lock();
        state.queries.push(query.clone());
        Ok(state.responses.pop_front().unwrap_or_default())
    }

    fn write(&self, point: &Point) -> Result<(), ClientError> {
        self.state
            .lock()
            .writes
            .push((Destination::Default, point.clone()));
        Ok(())
    }

    fn write_to(
        &self,
        database: &str,
        retention_policy: Option<&str>,
        point: &Point,
    ) -> Result<(), ClientError> {
        let destination = Destination::Explicit {
            database: database.to_string(),
            retention_policy: retention_policy.map(str::to_string),
        };
        self.state.lock().writes.push((destination, point.clone()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::point::FieldValue;
    use crate::result::Series;

    #[test]
    fn test_select_all_quotes_measurement() {
        assert_eq!(Query::select_all("cpu").command, "SELECT * FROM \"cpu\"");
        assert_eq!(
            Query::select_all("my \"odd\" m").command,
            "SELECT * FROM \"my \\\"odd\\\" m\""
        );
    }

    #[test]
    fn test_query_builder() {
        let query = Query::new("SELECT idle FROM cpu")
            .database("telegraf")
            .epoch(TimeUnit::Seconds);
        assert_eq!(query.database.as_deref(), Some("telegraf"));
        assert_eq!(query.epoch, Some(TimeUnit::Seconds));
    }

    #[test]
    fn test_memory_client_records_destinations() {
        let client = MemoryClient::new();
        let point = Point::new("cpu", 1, TimeUnit::Seconds).field("idle", FieldValue::Float(1.0));

        client.write(&point).expect("write");
        client.write_to("telegraf", Some("autogen"), &point).expect("write_to");

        let writes = client.writes();
        assert_eq!(writes.len(), 2);
        assert_eq!(writes[0].0, Destination::Default);
        assert_eq!(
            writes[1].0,
            Destination::Explicit {
                database: "telegraf".into(),
                retention_policy: Some("autogen".into()),
            }
        );
        assert_eq!(client.lines(), vec!["cpu idle=1 1", "cpu idle=1 1"]);
    }

    #[test]
    fn test_memory_client_replays_responses_in_order() {
        let client = MemoryClient::new();
        client.push_response(QueryResult::from_series(vec![Series::new("a", ["x"])]));
        client.push_response(QueryResult::failed("boom"));

        let first = client.query(&Query::new("q1")).expect("query");
        let second = client.query(&Query::new("q2")).expect("query");
        let third = client.query(&Query::new("q3")).expect("query");

        assert_eq!(first.series().count(), 1);
        assert_eq!(second.first_error(), Some("boom"));
        assert_eq!(third, QueryResult::default());
        let commands: Vec<_> = client.queries().into_iter().map(|q| q.command).collect();
        assert_eq!(commands, vec!["q1", "q2", "q3"]);
    }

    #[test]
    fn test_shared_handles_delegate() {
        let client = Arc::new(MemoryClient::new());
        let point = Point::new("cpu", 1, TimeUnit::Seconds).field("idle", FieldValue::Float(1.0));

        let shared: Arc<MemoryClient> = Arc::clone(&client);
        shared.write(&point).expect("write through Arc");
        (&*client).write(&point).expect("write through ref");
        assert_eq!(client.writes().len(), 2);
    }
}
