//! Schema traits for type-safe table and column definitions.
//!
//! This module provides traits that are implemented by the `#[derive(Table)]`
//! macro. The static metadata is turned into runtime names by the
//! [`catalog`] using the database's naming strategy and default schema.

pub mod catalog;
pub mod naming;

use std::any::TypeId;

use crate::error::Result;
use crate::row::RowReader;
use crate::value::FromSqlValue;

pub use catalog::{ColumnMeta, ForeignKeyMeta, TableMeta};
pub use naming::NamingStrategy;

/// Static description of one column, as declared on the row struct.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSchema {
    /// The Rust field name; the property token used by column references.
    pub property: &'static str,
    /// Explicit SQL column name from `#[column(name = "...")]`.
    pub name: Option<&'static str>,
    /// Whether this column is nullable.
    pub nullable: bool,
    /// Whether this column is part of the primary key.
    pub primary_key: bool,
}

/// Static description of one foreign key declared on a child table.
#[derive(Debug, Clone, Copy)]
pub struct ForeignKeySchema {
    /// Key name from `#[column(foreign_key = "...")]`, if given.
    pub name: Option<&'static str>,
    /// Type name of the referenced table, for messages.
    pub parent_name: &'static str,
    /// Identity of the referenced table.
    pub parent: fn() -> TypeId,
    /// `(child property, parent property)` pairs in declaration order.
    pub columns: &'static [(&'static str, &'static str)],
}

/// Trait for table metadata.
///
/// Implemented on the row struct by `#[derive(Table)]`.
pub trait Table: Sized + Send + Sync + 'static {
    /// The Rust type name, used by naming strategies.
    const TYPE_NAME: &'static str;

    /// Explicit SQL table name from `#[table(name = "...")]`.
    const NAME: Option<&'static str>;

    /// Explicit schema from `#[table(schema = "...")]`.
    const SCHEMA: Option<&'static str>;

    /// Columns in declaration order.
    const COLUMNS: &'static [ColumnSchema];

    /// Foreign keys referencing other tables.
    const FOREIGN_KEYS: &'static [ForeignKeySchema];

    /// Builds a row from a result row.
    ///
    /// # Errors
    ///
    /// Returns an error if a column is missing or cannot be converted.
    fn from_row(reader: &RowReader<'_>) -> Result<Self>;
}

/// Trait for column metadata.
///
/// Implemented by the zero-sized column types generated from
/// `#[derive(Table)]`; these are the property tokens that column references
/// carry.
pub trait Column: Copy + Send + Sync + 'static {
    /// The table this column belongs to.
    type Table: Table;

    /// The Rust type of this column.
    type Type: FromSqlValue + Send + Sync + 'static;

    /// The Rust field name.
    const PROPERTY: &'static str;

    /// Explicit SQL column name, if any.
    const NAME: Option<&'static str>;

    /// Whether this column is nullable.
    const NULLABLE: bool;

    /// Whether this column is part of the primary key.
    const PRIMARY_KEY: bool;
}

/// Row type for statements that select from no table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dual;
