// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Measurement schemas: the mapping between a record type and the
//! measurement, tag, field and time columns of a series.
//!
//! # Architecture
//!
//! ```text
//! #[derive(Measurement)] / manual impl
//!        |
//!        v
//!   TypeMetadata<T>      (raw declarations, unvalidated)
//!        |
//!        v  MeasurementSchema::build
//!   MeasurementSchema<T> (validated, roles assigned, immutable)
//! ```
//!
//! Accessors are plain function pointers, so a schema is `Send + Sync`
//! whatever the record type and can be shared through the cache.

use std::any::type_name;
use std::fmt;

use crate::error::SchemaError;
use crate::time::TimeUnit;
use crate::value::{ColumnValue, Value, ValueKind};

/// Database value meaning "write to the client's default database".
pub const UNASSIGNED_DATABASE: &str = "[unassigned]";

/// Column name reserved for the point timestamp.
pub const TIME_COLUMN: &str = "time";

/// Reads the current value of an attribute.
pub type Getter<T> = fn(&T) -> Option<Value>;

/// Stores a value into an attribute, handing it back if it cannot be represented.
pub type Setter<T> = fn(&mut T, Value) -> Result<(), Value>;

// ---------------------------------------------------------------------------
// Declarations
// ---------------------------------------------------------------------------

/// How an attribute is accessed.
pub enum Binding<T> {
    /// Attribute of a supported type, with its declared kind.
    Typed {
        kind: ValueKind,
        get: Getter<T>,
        set: Setter<T>,
    },
    /// Attribute whose type has no coercion rule. Kept in the schema so the
    /// encoder and decoder can reject it by name instead of dropping it.
    Unsupported,
}

impl<T> Binding<T> {
    /// Bind an attribute of type `V`.
    pub fn of<V: ColumnValue>(get: Getter<T>, set: Setter<T>) -> Self {
        Binding::Typed {
            kind: V::KIND,
            get,
            set,
        }
    }

    pub fn kind(&self) -> Option<ValueKind> {
        match self {
            Binding::Typed { kind, .. } => Some(*kind),
            Binding::Unsupported => None,
        }
    }
}

impl<T> Clone for Binding<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Binding<T> {}

/// One `#[column]` declaration.
pub struct ColumnDef<T> {
    pub name: &'static str,
    pub attribute: &'static str,
    pub rust_type: &'static str,
    pub tag: bool,
    pub binding: Binding<T>,
}

impl<T> ColumnDef<T> {
    /// Declare a field (or the `time` column) backed by an attribute of type `V`.
    pub fn field<V: ColumnValue>(
        name: &'static str,
        attribute: &'static str,
        get: Getter<T>,
        set: Setter<T>,
    ) -> Self {
        ColumnDef {
            name,
            attribute,
            rust_type: type_name::<V>(),
            tag: false,
            binding: Binding::of::<V>(get, set),
        }
    }

    /// Declare a tag backed by an attribute of type `V`.
    pub fn tag<V: ColumnValue>(
        name: &'static str,
        attribute: &'static str,
        get: Getter<T>,
        set: Setter<T>,
    ) -> Self {
        ColumnDef {
            tag: true,
            ..Self::field::<V>(name, attribute, get, set)
        }
    }

    /// Declare a column whose attribute type has no coercion rule.
    pub fn unsupported(
        name: &'static str,
        attribute: &'static str,
        rust_type: &'static str,
        tag: bool,
    ) -> Self {
        ColumnDef {
            name,
            attribute,
            rust_type,
            tag,
            binding: Binding::Unsupported,
        }
    }
}

/// Raw per-type declarations, as produced by `#[derive(Measurement)]`.
pub struct TypeMetadata<T> {
    pub type_name: &'static str,
    pub measurement: Option<&'static str>,
    pub database: Option<&'static str>,
    pub retention_policy: Option<&'static str>,
    pub time_unit: TimeUnit,
    pub columns: Vec<ColumnDef<T>>,
}

impl<T> TypeMetadata<T> {
    pub fn new(type_name: &'static str) -> Self {
        TypeMetadata {
            type_name,
            measurement: None,
            database: None,
            retention_policy: None,
            time_unit: TimeUnit::default(),
            columns: Vec::new(),
        }
    }

    pub fn measurement(mut self, name: &'static str) -> Self {
        self.measurement = Some(name);
        self
    }

    pub fn database(mut self, database: &'static str) -> Self {
        self.database = Some(database);
        self
    }

    pub fn retention_policy(mut self, policy: &'static str) -> Self {
        self.retention_policy = Some(policy);
        self
    }

    pub fn time_unit(mut self, unit: TimeUnit) -> Self {
        self.time_unit = unit;
        self
    }

    pub fn column(mut self, column: ColumnDef<T>) -> Self {
        self.columns.push(column);
        self
    }
}

/// A record type mapped to a measurement.
///
/// Usually derived:
///
/// ```ignore
/// #[derive(Default, Measurement)]
/// #[measurement(name = "cpu", database = "telegraf")]
/// struct Cpu {
///     #[column(tag)]
///     host: String,
///     #[column(name = "usage_idle")]
///     idle: f64,
///     #[column]
///     time: Option<DateTime<Utc>>,
/// }
/// ```
///
/// `Default` supplies the record that decoding populates; columns missing
/// from a result keep their default value.
pub trait Measurement: Default + 'static {
    fn describe() -> TypeMetadata<Self>;
}

// ---------------------------------------------------------------------------
// MeasurementSchema
// ---------------------------------------------------------------------------

/// Role of a column in a point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Tag,
    Field,
    Timestamp,
}

/// A validated column of a schema.
pub struct ColumnDescriptor<T> {
    name: String,
    attribute: &'static str,
    rust_type: &'static str,
    role: Role,
    binding: Binding<T>,
}

impl<T> ColumnDescriptor<T> {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rust attribute the column is bound to.
    pub fn attribute(&self) -> &'static str {
        self.attribute
    }

    pub fn rust_type(&self) -> &'static str {
        self.rust_type
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn binding(&self) -> Binding<T> {
        self.binding
    }

    /// Declared kind, `None` for an unsupported attribute type.
    pub fn kind(&self) -> Option<ValueKind> {
        self.binding.kind()
    }
}

impl<T> fmt::Debug for ColumnDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnDescriptor")
            .field("name", &self.name)
            .field("attribute", &self.attribute)
            .field("rust_type", &self.rust_type)
            .field("role", &self.role)
            .field("kind", &self.kind())
            .finish()
    }
}

/// Compares declarations only; accessors are identified by attribute name.
impl<T> PartialEq for ColumnDescriptor<T> {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.attribute == other.attribute
            && self.rust_type == other.rust_type
            && self.role == other.role
            && self.kind() == other.kind()
    }
}

/// Column layout and destination of one record type. Immutable once built.
pub struct MeasurementSchema<T> {
    type_name: &'static str,
    measurement: String,
    database: Option<String>,
    retention_policy: Option<String>,
    time_unit: TimeUnit,
    columns: Vec<ColumnDescriptor<T>>,
}

impl<T> MeasurementSchema<T> {
    /// Validate raw declarations and assign column roles.
    ///
    /// Role is decided by name: `time` is the timestamp column, every other
    /// column is a tag or a field according to its declaration.
    pub fn build(metadata: TypeMetadata<T>) -> Result<Self, SchemaError> {
        let type_name = metadata.type_name;
        let measurement = metadata
            .measurement
            .filter(|name| !name.is_empty())
            .ok_or(SchemaError::MissingMeasurement { type_name })?;

        let mut columns: Vec<ColumnDescriptor<T>> = Vec::with_capacity(metadata.columns.len());
        for def in metadata.columns {
            if def.name.is_empty() {
                return Err(SchemaError::EmptyColumnName {
                    type_name,
                    attribute: def.attribute,
                });
            }
            if let Some(existing) = columns.iter().find(|c| c.name == def.name) {
                return Err(SchemaError::DuplicateColumn {
                    type_name,
                    column: def.name.to_string(),
                    first: existing.attribute,
                    second: def.attribute,
                });
            }

            let role = if def.name == TIME_COLUMN {
                if def.tag {
                    return Err(SchemaError::TaggedTime {
                        type_name,
                        attribute: def.attribute,
                    });
                }
                Role::Timestamp
            } else if def.tag {
                Role::Tag
            } else {
                Role::Field
            };

            columns.push(ColumnDescriptor {
                name: def.name.to_string(),
                attribute: def.attribute,
                rust_type: def.rust_type,
                role,
                binding: def.binding,
            });
        }

        let database = metadata
            .database
            .filter(|db| !db.is_empty() && *db != UNASSIGNED_DATABASE)
            .map(str::to_string);
        let retention_policy = metadata
            .retention_policy
            .filter(|rp| !rp.is_empty())
            .map(str::to_string);

        Ok(MeasurementSchema {
            type_name,
            measurement: measurement.to_string(),
            database,
            retention_policy,
            time_unit: metadata.time_unit,
            columns,
        })
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn measurement(&self) -> &str {
        &self.measurement
    }

    /// Target database, `None` when unassigned (client default).
    pub fn database(&self) -> Option<&str> {
        self.database.as_deref()
    }

    /// Target retention policy, `None` for the client default.
    pub fn retention_policy(&self) -> Option<&str> {
        self.retention_policy.as_deref()
    }

    pub fn time_unit(&self) -> TimeUnit {
        self.time_unit
    }

    /// Columns in declaration order.
    pub fn columns(&self) -> &[ColumnDescriptor<T>] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&ColumnDescriptor<T>> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn time_column(&self) -> Option<&ColumnDescriptor<T>> {
        self.columns.iter().find(|c| c.role == Role::Timestamp)
    }

    /// Database, or `DatabaseRequired` when the schema leaves it unassigned.
    pub fn require_database(&self) -> Result<&str, SchemaError> {
        self.database().ok_or_else(|| SchemaError::DatabaseRequired {
            type_name: self.type_name,
            measurement: self.measurement.clone(),
        })
    }
}

impl<T> fmt::Debug for MeasurementSchema<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MeasurementSchema")
            .field("type_name", &self.type_name)
            .field("measurement", &self.measurement)
            .field("database", &self.database)
            .field("retention_policy", &self.retention_policy)
            .field("time_unit", &self.time_unit)
            .field("columns", &self.columns)
            .finish()
    }
}

impl<T> PartialEq for MeasurementSchema<T> {
    fn eq(&self, other: &Self) -> bool {
        self.type_name == other.type_name
            && self.measurement == other.measurement
            && self.database == other.database
            && self.retention_policy == other.retention_policy
            && self.time_unit == other.time_unit
            && self.columns == other.columns
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
