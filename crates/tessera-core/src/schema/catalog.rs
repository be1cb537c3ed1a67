//! Runtime table metadata.
//!
//! A [`TableMeta`] is the static [`Table`] description with the database's
//! naming strategy, default schema and dialect applied.

use std::any::TypeId;

use crate::database::Database;
use crate::error::{Error, Result};

use super::Table;

/// A column with its resolved SQL name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMeta {
    /// Rust field name.
    pub property: &'static str,
    /// SQL column name.
    pub name: String,
    /// Whether the column is nullable.
    pub nullable: bool,
    /// Whether the column is part of the primary key.
    pub primary_key: bool,
}

/// A foreign key from this table to a parent table.
#[derive(Debug, Clone)]
pub struct ForeignKeyMeta {
    /// Key name, if declared.
    pub name: Option<&'static str>,
    /// Type name of the parent table.
    pub parent_name: &'static str,
    /// Identity of the parent table.
    pub parent: TypeId,
    /// `(child property, parent property)` pairs.
    pub columns: &'static [(&'static str, &'static str)],
}

/// Resolved metadata for one table.
#[derive(Debug, Clone)]
pub struct TableMeta {
    type_id: TypeId,
    type_name: &'static str,
    name: String,
    qualified_name: String,
    columns: Vec<ColumnMeta>,
    foreign_keys: Vec<ForeignKeyMeta>,
}

impl TableMeta {
    /// Resolves the metadata of `T` against a database.
    #[must_use]
    pub fn of<T: Table>(database: &Database) -> Self {
        let naming = database.naming_strategy();
        let name = T::NAME.map_or_else(|| naming.table_name(T::TYPE_NAME), str::to_string);
        let schema = T::SCHEMA.or_else(|| database.default_schema());
        let qualified_name = database.dialect().qualified_table_name(schema, &name);
        let columns = T::COLUMNS
            .iter()
            .map(|c| ColumnMeta {
                property: c.property,
                name: c.name.map_or_else(|| naming.column_name(c.property), str::to_string),
                nullable: c.nullable,
                primary_key: c.primary_key,
            })
            .collect();
        let foreign_keys = T::FOREIGN_KEYS
            .iter()
            .map(|fk| ForeignKeyMeta {
                name: fk.name,
                parent_name: fk.parent_name,
                parent: (fk.parent)(),
                columns: fk.columns,
            })
            .collect();

        Self {
            type_id: TypeId::of::<T>(),
            type_name: T::TYPE_NAME,
            name,
            qualified_name,
            columns,
            foreign_keys,
        }
    }

    /// Identity of the row type.
    #[must_use]
    pub const fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Rust type name of the row type.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Unqualified SQL table name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Schema-qualified SQL table name as spelled by the dialect.
    #[must_use]
    pub fn qualified_name(&self) -> &str {
        &self.qualified_name
    }

    /// Columns in declaration order.
    #[must_use]
    pub fn columns(&self) -> &[ColumnMeta] {
        &self.columns
    }

    /// Returns the SQL column name for a property.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoSuchColumn`] for an unknown property.
    pub fn column_name_for(&self, property: &str) -> Result<&str> {
        self.columns
            .iter()
            .find(|c| c.property == property)
            .map(|c| c.name.as_str())
            .ok_or_else(|| Error::NoSuchColumn {
                source_name: self.type_name.to_string(),
                column: property.to_string(),
            })
    }

    /// Returns the property for a SQL column name, ignoring ASCII case.
    #[must_use]
    pub fn property_name_for(&self, column_name: &str) -> Option<&'static str> {
        self.columns
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(column_name))
            .map(|c| c.property)
    }

    /// Finds the foreign key from this table to `parent`.
    ///
    /// Without a name the key must be the only one linking the two tables.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoForeignKey`] or [`Error::AmbiguousForeignKey`].
    pub fn foreign_key_to(&self, parent: &Self, name: Option<&str>) -> Result<&ForeignKeyMeta> {
        let candidates: Vec<&ForeignKeyMeta> = self
            .foreign_keys
            .iter()
            .filter(|fk| fk.parent == parent.type_id)
            .filter(|fk| name.is_none_or(|n| fk.name == Some(n)))
            .collect();

        match candidates.as_slice() {
            [single] => Ok(single),
            [] => Err(Error::NoForeignKey {
                child: self.type_name.to_string(),
                parent: parent.type_name.to_string(),
                name: name.map(str::to_string),
            }),
            _ => Err(Error::AmbiguousForeignKey {
                child: self.type_name.to_string(),
                parent: parent.type_name.to_string(),
            }),
        }
    }
}
