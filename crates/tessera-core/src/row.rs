//! Result rows and row mappers.
//!
//! Executors hand each result row to a [`RowMapper`] as a [`ResultRow`].
//! Mappers are produced by a [`RowMapperFactory`] once the prefix and label of
//! the columns they read are known, so a projection can compose them one
//! column at a time.

use std::fmt;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::value::{FromSqlValue, SqlValue, ToSqlValue};

/// A row of a query result, addressed by column label.
pub trait ResultRow: Send + Sync {
    /// Returns the value of the column with the given label.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingColumn`] when no column has that label.
    fn get(&self, label: &str) -> Result<SqlValue>;
}

/// A materialized result row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValueRow {
    columns: Vec<(String, SqlValue)>,
}

impl ValueRow {
    /// Creates an empty row.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            columns: Vec::new(),
        }
    }

    /// Adds a column, builder style.
    #[must_use]
    pub fn with(mut self, label: impl Into<String>, value: impl ToSqlValue) -> Self {
        self.push(label, value);
        self
    }

    /// Adds a column.
    pub fn push(&mut self, label: impl Into<String>, value: impl ToSqlValue) {
        self.columns.push((label.into(), value.to_sql_value()));
    }

    /// Number of columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Returns true if the row has no columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl FromIterator<(String, SqlValue)> for ValueRow {
    fn from_iter<I: IntoIterator<Item = (String, SqlValue)>>(iter: I) -> Self {
        Self {
            columns: iter.into_iter().collect(),
        }
    }
}

impl ResultRow for ValueRow {
    fn get(&self, label: &str) -> Result<SqlValue> {
        self.columns
            .iter()
            .find(|(l, _)| l == label)
            // Databases may fold unquoted labels to either case
            .or_else(|| self.columns.iter().find(|(l, _)| l.eq_ignore_ascii_case(label)))
            .map(|(_, v)| v.clone())
            .ok_or_else(|| Error::MissingColumn(label.to_string()))
    }
}

/// Reads the columns of one alias out of a result row by property name.
///
/// Passed to [`crate::Table::from_row`].
pub struct RowReader<'a> {
    row: &'a dyn ResultRow,
    labels: &'a [(&'static str, String)],
}

impl<'a> RowReader<'a> {
    /// Creates a reader over `row` where each property maps to a label.
    #[must_use]
    pub fn new(row: &'a dyn ResultRow, labels: &'a [(&'static str, String)]) -> Self {
        Self { row, labels }
    }

    /// Reads and converts the value of a property.
    ///
    /// # Errors
    ///
    /// Returns an error if the property is unknown, the row lacks the column
    /// or the value cannot be converted.
    pub fn get<V: FromSqlValue>(&self, property: &str) -> Result<V> {
        let label = self
            .labels
            .iter()
            .find(|(p, _)| *p == property)
            .map(|(_, l)| l.as_str())
            .ok_or_else(|| Error::MissingColumn(property.to_string()))?;
        V::from_sql_value(self.row.get(label)?)
    }
}

/// Converts one result row into a typed value.
pub struct RowMapper<T>(Arc<dyn Fn(&dyn ResultRow) -> Result<T> + Send + Sync>);

impl<T> RowMapper<T> {
    /// Wraps a mapping function.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&dyn ResultRow) -> Result<T> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Maps one row.
    ///
    /// # Errors
    ///
    /// Returns an error if a column is missing or cannot be converted.
    pub fn map_row(&self, row: &dyn ResultRow) -> Result<T> {
        (self.0)(row)
    }
}

impl<T> Clone for RowMapper<T> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<T> fmt::Debug for RowMapper<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RowMapper")
    }
}

/// Produces a [`RowMapper`] for a label prefix and an optional output label.
///
/// The prefix is non-empty when the values are read through a subquery alias,
/// whose outer projection relabels every column as `<alias>_<label>`.
pub struct RowMapperFactory<T>(Arc<dyn Fn(&str, Option<&str>) -> RowMapper<T> + Send + Sync>);

impl<T: 'static> RowMapperFactory<T> {
    /// Wraps a factory function.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&str, Option<&str>) -> RowMapper<T> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Creates a mapper.
    #[must_use]
    pub fn mapper(&self, prefix: &str, label: Option<&str>) -> RowMapper<T> {
        (self.0)(prefix, label)
    }

    /// Maps the output of every mapper this factory produces.
    #[must_use]
    pub fn map<U: 'static, F>(self, f: F) -> RowMapperFactory<U>
    where
        F: Fn(T) -> U + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        RowMapperFactory::new(move |prefix, label| {
            let inner = self.mapper(prefix, label);
            let f = Arc::clone(&f);
            RowMapper::new(move |row| inner.map_row(row).map(|v| f(v)))
        })
    }
}

impl<T: FromSqlValue + 'static> RowMapperFactory<T> {
    /// Factory for a single column, read from `prefix + label`, falling back
    /// to `default_label` when no label is given.
    #[must_use]
    pub fn scalar(default_label: String) -> Self {
        Self::new(move |prefix, label| {
            let label = format!("{prefix}{}", label.unwrap_or(&default_label));
            RowMapper::new(move |row| T::from_sql_value(row.get(&label)?))
        })
    }
}

impl<T> Clone for RowMapperFactory<T> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<T> fmt::Debug for RowMapperFactory<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RowMapperFactory")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_row_lookup_ignores_case() {
        let row = ValueRow::new()
            .with("p_FIRST_NAME", "James")
            .with("one", 1_i64);
        assert_eq!(
            row.get("p_first_name").unwrap(),
            SqlValue::Text(String::from("James"))
        );
        assert_eq!(row.get("ONE").unwrap(), SqlValue::Int(1));
        assert!(matches!(row.get("two"), Err(Error::MissingColumn(_))));
    }

    #[test]
    fn test_row_reader() {
        let row = ValueRow::new()
            .with("p_NAME", "Bob")
            .with("p_AGE", SqlValue::Null);
        let labels = [
            ("name", String::from("p_NAME")),
            ("age", String::from("p_AGE")),
        ];
        let reader = RowReader::new(&row, &labels);
        assert_eq!(reader.get::<String>("name").unwrap(), "Bob");
        assert_eq!(reader.get::<Option<i32>>("age").unwrap(), None);
        assert!(reader.get::<String>("height").is_err());
    }

    #[test]
    fn test_scalar_factory_uses_prefix_and_label() {
        let factory = RowMapperFactory::<i64>::scalar(String::from("value_1"));
        let row = ValueRow::new()
            .with("value_1", 1_i64)
            .with("n", 2_i64)
            .with("sub_n", 3_i64);

        assert_eq!(factory.mapper("", None).map_row(&row).unwrap(), 1);
        assert_eq!(factory.mapper("", Some("n")).map_row(&row).unwrap(), 2);
        assert_eq!(factory.mapper("sub_", Some("n")).map_row(&row).unwrap(), 3);
    }

    #[test]
    fn test_factory_map() {
        let factory = RowMapperFactory::<i64>::scalar(String::from("n")).map(|n| n * 10);
        let row = ValueRow::new().with("n", 4_i64);
        assert_eq!(factory.mapper("", None).map_row(&row).unwrap(), 40);
    }
}
