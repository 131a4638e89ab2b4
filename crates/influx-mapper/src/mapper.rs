// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Mapper facade.
//!
//! Composes the schema cache, encoder and decoder with an [`InfluxClient`]:
//!
//! ```text
//! save(record)  = SchemaCache::resolve -> Encoder::encode -> client.write / write_to
//! query::<T>()  = SchemaCache::resolve -> client.query     -> decoder::decode
//! ```
//!
//! No lock is held across client calls; the only shared state is the
//! immutable cached schema.

use std::sync::Arc;

use chrono::Utc;

use crate::cache::SchemaCache;
use crate::client::{InfluxClient, Query};
use crate::config::MapperConfig;
use crate::decoder;
use crate::encoder::Encoder;
use crate::error::MapperError;
use crate::point::Point;
use crate::result::QueryResult;
use crate::schema::{Measurement, MeasurementSchema};

/// Wall-clock source, milliseconds since the Unix epoch.
pub type Clock = fn() -> i64;

fn system_clock() -> i64 {
    Utc::now().timestamp_millis()
}

/// Saves records as points and loads records from query results.
pub struct InfluxMapper<C> {
    client: C,
    cache: Arc<SchemaCache>,
    encoder: Encoder,
    config: MapperConfig,
    clock: Clock,
}

impl<C: InfluxClient> InfluxMapper<C> {
    /// Create a mapper with default configuration and its own schema cache.
    pub fn new(client: C) -> Self {
        Self::with_config(client, MapperConfig::default())
    }

    pub fn with_config(client: C, config: MapperConfig) -> Self {
        Self {
            client,
            cache: Arc::new(SchemaCache::new()),
            encoder: Encoder::new(config.null_tags),
            config,
            clock: system_clock,
        }
    }

    /// Share a schema cache with other mappers.
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<SchemaCache>) -> Self {
        self.cache = cache;
        self
    }

    /// Replace the wall clock used for records without a timestamp.
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn cache(&self) -> &Arc<SchemaCache> {
        &self.cache
    }

    pub fn config(&self) -> &MapperConfig {
        &self.config
    }

    /// Schema of `T`, resolved through the shared cache.
    pub fn schema<T: Measurement>(&self) -> Result<Arc<MeasurementSchema<T>>, MapperError> {
        Ok(self.cache.resolve::<T>()?)
    }

    /// Encode `record` and write it to its schema's destination.
    pub fn save<T: Measurement>(&self, record: &T) -> Result<(), MapperError> {
        let schema = self.cache.resolve::<T>()?;
        let point = self.encoder.encode(&schema, record, (self.clock)())?;
        self.write(&point)
    }

    /// Encode every record, then write them in order.
    ///
    /// Nothing is written if any record fails to encode.
    pub fn save_all<T: Measurement>(&self, records: &[T]) -> Result<usize, MapperError> {
        let schema = self.cache.resolve::<T>()?;
        let now = (self.clock)();
        let points = records
            .iter()
            .map(|record| self.encoder.encode(&schema, record, now))
            .collect::<Result<Vec<_>, _>>()?;
        for point in &points {
            self.write(point)?;
        }
        Ok(points.len())
    }

    /// `SELECT *` over the measurement of `T` in its declared database.
    ///
    /// Fails with `SchemaError::DatabaseRequired` before any client call when
    /// `T` leaves its database unassigned.
    pub fn query<T: Measurement>(&self) -> Result<Vec<T>, MapperError> {
        let schema = self.cache.resolve::<T>()?;
        let database = schema.require_database()?;
        let epoch = self.config.query_epoch.unwrap_or(schema.time_unit());
        let query = Query::select_all(schema.measurement())
            .database(database)
            .epoch(epoch);
        self.run(&schema, &query, schema.measurement())
    }

    /// Run `query` and decode series of `T`'s measurement.
    pub fn query_with<T: Measurement>(&self, query: &Query) -> Result<Vec<T>, MapperError> {
        let schema = self.cache.resolve::<T>()?;
        self.run(&schema, query, schema.measurement())
    }

    /// Run `query` and decode series named `measurement` into `T`.
    pub fn query_measurement<T: Measurement>(
        &self,
        query: &Query,
        measurement: &str,
    ) -> Result<Vec<T>, MapperError> {
        let schema = self.cache.resolve::<T>()?;
        self.run(&schema, query, measurement)
    }

    /// Decode an already executed result. Epochs are read in `T`'s time unit.
    pub fn to_records<T: Measurement>(&self, result: &QueryResult) -> Result<Vec<T>, MapperError> {
        let schema = self.cache.resolve::<T>()?;
        Ok(decoder::decode(&schema, result)?)
    }

    fn run<T: Measurement>(
        &self,
        schema: &MeasurementSchema<T>,
        query: &Query,
        measurement: &str,
    ) -> Result<Vec<T>, MapperError> {
        log::debug!(
            "[mapper] query for {}: {}",
            schema.type_name(),
            query.command
        );
        let result = self.client.query(query).map_err(MapperError::Client)?;
        let precision = query.epoch.unwrap_or(schema.time_unit());
        Ok(decoder::decode_measurement(
            schema,
            &result,
            measurement,
            precision,
        )?)
    }

    fn write(&self, point: &Point) -> Result<(), MapperError> {
        let outcome = match point.database() {
            None => self.client.write(point),
            Some(database) => self
                .client
                .write_to(database, point.retention_policy(), point),
        };
        outcome.map_err(MapperError::Client)?;
        log::debug!(
            "[mapper] wrote '{}' to {}",
            point.measurement(),
            point.database().unwrap_or("<default>")
        );
        Ok(())
    }
}
