// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Per-type schema cache.
//!
//! # Concurrency
//!
//! - **Hits**: `DashMap` shard read guard, no global lock
//! - **Misses**: the schema is built while holding the entry's write guard
//!   (`or_try_insert_with`), so concurrent first resolutions of a type
//!   perform exactly one build and all observe the same `Arc`
//! - **No eviction**: record types are a small static set
//!
//! A failed build installs nothing; the next resolution retries it and
//! fails the same way.

use std::any::{Any, TypeId};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use dashmap::DashMap;

use crate::error::SchemaError;
use crate::schema::{Measurement, MeasurementSchema};

type Entry = Arc<dyn Any + Send + Sync>;

/// Concurrent, memoizing map from record type to its [`MeasurementSchema`].
pub struct SchemaCache {
    schemas: DashMap<TypeId, Entry>,
    builds: AtomicUsize,
}

impl SchemaCache {
    #[must_use]
    pub fn new() -> Self {
        Self {
            schemas: DashMap::new(),
            builds: AtomicUsize::new(0),
        }
    }

    /// Schema of `T`, built from `T::describe()` on first use.
    pub fn resolve<T: Measurement>(&self) -> Result<Arc<MeasurementSchema<T>>, SchemaError> {
        let key = TypeId::of::<T>();

        if let Some(entry) = self.schemas.get(&key) {
            return downcast::<T>(entry.value());
        }

        let entry = self.schemas.entry(key).or_try_insert_with(|| {
            let schema = MeasurementSchema::build(T::describe())?;
            self.builds.fetch_add(1, Ordering::Relaxed);
            log::debug!(
                "[schema] built {} -> measurement '{}' ({} columns, unit {})",
                schema.type_name(),
                schema.measurement(),
                schema.columns().len(),
                schema.time_unit()
            );
            Ok::<Entry, SchemaError>(Arc::new(schema))
        })?;

        downcast::<T>(entry.value())
    }

    /// Whether `T` has already been resolved successfully.
    #[must_use]
    pub fn contains<T: Measurement>(&self) -> bool {
        self.schemas.contains_key(&TypeId::of::<T>())
    }

    /// Number of schema builds completed since creation.
    #[must_use]
    pub fn builds(&self) -> usize {
        self.builds.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

impl Default for SchemaCache {
    fn default() -> Self {
        Self::new()
    }
}

fn downcast<T: Measurement>(entry: &Entry) -> Result<Arc<MeasurementSchema<T>>, SchemaError> {
    Arc::clone(entry)
        .downcast::<MeasurementSchema<T>>()
        .map_err(|_| SchemaError::CacheEntryMismatch {
            type_name: std::any::type_name::<T>(),
        })
}
