// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Influx Mapper
//!
//! Maps strongly-typed Rust records to InfluxDB points and maps InfluxDB
//! query results back to records, without per-type conversion code.
//!
//! This crate provides:
//! - `#[derive(Measurement)]` for declaring the measurement layout of a type
//! - A concurrent, single-flight [`SchemaCache`] of per-type schemas
//! - An [`Encoder`] producing write-ready [`Point`]s (with Line Protocol rendering)
//! - A [`decoder`] turning tabular [`QueryResult`]s into ordered records
//! - The [`InfluxMapper`] facade composing the above with an [`InfluxClient`]
//!
//! # Overview
//!
//! The mapper does NOT talk to InfluxDB itself. Queries and writes go
//! through the [`InfluxClient`] trait, implemented by the caller's client.
//!
//! ```text
//! record type --> SchemaCache (once per type) --> Encoder --> Point --> InfluxClient::write
//! InfluxClient::query --> QueryResult --> Decoder --> Vec<record>
//! ```
//!
//! # Example
//!
//! ```ignore
//! use chrono::{DateTime, Utc};
//! use influx_mapper::{InfluxMapper, Measurement, MemoryClient};
//!
//! #[derive(Debug, Default, Measurement)]
//! #[measurement(name = "cpu", database = "telegraf", time_unit = "millis")]
//! struct Cpu {
//!     #[column(tag)]
//!     host: String,
//!     #[column]
//!     idle: f64,
//!     #[column]
//!     time: Option<DateTime<Utc>>,
//! }
//!
//! let mapper = InfluxMapper::new(MemoryClient::new());
//! mapper.save(&Cpu { host: "srv1".into(), idle: 12.5, time: None })?;
//! let rows: Vec<Cpu> = mapper.query()?;
//! ```

// Lets the derive's `::influx_mapper::` paths resolve inside this crate's own tests.
extern crate self as influx_mapper;

pub mod cache;
pub mod client;
pub mod config;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod mapper;
pub mod point;
pub mod result;
pub mod schema;
pub mod time;
pub mod value;

pub use cache::SchemaCache;
pub use client::{ClientError, Destination, InfluxClient, MemoryClient, Query};
pub use config::{MapperConfig, NullTagPolicy};
pub use encoder::Encoder;
pub use error::{DecodingError, EncodingError, MapperError, SchemaError};
pub use influx_mapper_codegen::Measurement;
pub use mapper::InfluxMapper;
pub use point::{FieldValue, Point};
pub use result::{QueryResult, Series, StatementResult};
pub use schema::{
    Binding, ColumnDef, ColumnDescriptor, Measurement, MeasurementSchema, Role, TypeMetadata,
    UNASSIGNED_DATABASE,
};
pub use time::TimeUnit;
pub use value::{ColumnValue, Value, ValueKind};
