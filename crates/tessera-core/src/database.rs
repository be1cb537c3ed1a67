//! Database handle and configuration.
//!
//! A [`Database`] bundles the dialect, the default schema and the naming
//! strategy. It is the entry point for aliases, statements and common table
//! expressions.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};

use crate::alias::Alias;
use crate::dialect::{AnsiDialect, Dialect, DialectKind};
use crate::error::Result;
use crate::expr::IntoExpression;
use crate::schema::{Dual, NamingStrategy, Table, TableMeta};
use crate::scope::Scope;
use crate::select::{CteBuilder, Joining, Projecting, SelectBuilder};

/// Serializable database settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQL dialect to render.
    pub dialect: DialectKind,
    /// Schema applied to tables that do not declare one.
    pub default_schema: Option<String>,
    /// How table and column names are derived.
    pub naming: NamingStrategy,
}

impl DatabaseConfig {
    /// Parses a configuration from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Config`] if the document is invalid.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[derive(Debug)]
struct DatabaseInner {
    dialect: Arc<dyn Dialect>,
    default_schema: Option<String>,
    naming: NamingStrategy,
    tables: Mutex<HashMap<TypeId, Arc<TableMeta>>>,
}

/// A database description shared by every statement built against it.
///
/// Cheap to clone.
#[derive(Debug, Clone)]
pub struct Database {
    inner: Arc<DatabaseInner>,
}

impl Database {
    /// Creates a builder with the ANSI dialect and upper-case naming.
    #[must_use]
    pub fn builder() -> DatabaseBuilder {
        DatabaseBuilder::default()
    }

    /// Creates a database from its configuration.
    #[must_use]
    pub fn from_config(config: &DatabaseConfig) -> Self {
        let mut builder = Self::builder()
            .dialect_kind(config.dialect)
            .naming_strategy(config.naming);
        if let Some(schema) = &config.default_schema {
            builder = builder.default_schema(schema.clone());
        }
        builder.build()
    }

    /// The SQL dialect.
    #[must_use]
    pub fn dialect(&self) -> &dyn Dialect {
        self.inner.dialect.as_ref()
    }

    /// The schema applied to tables without their own.
    #[must_use]
    pub fn default_schema(&self) -> Option<&str> {
        self.inner.default_schema.as_deref()
    }

    /// The naming strategy.
    #[must_use]
    pub fn naming_strategy(&self) -> NamingStrategy {
        self.inner.naming
    }

    /// Resolved metadata of a table, computed once per database.
    #[must_use]
    pub fn table<T: Table>(&self) -> Arc<TableMeta> {
        let mut tables = self
            .inner
            .tables
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        Arc::clone(
            tables
                .entry(TypeId::of::<T>())
                .or_insert_with(|| Arc::new(TableMeta::of::<T>(self))),
        )
    }

    /// An outermost scope with no aliases.
    #[must_use]
    pub fn scope(&self) -> Scope {
        Scope::new(self)
    }

    /// An alias for a table with an explicit name.
    #[must_use]
    pub fn alias<T: Table>(&self, name: &str) -> Alias<T> {
        Alias::table(self.table::<T>(), Some(name))
    }

    /// An alias for a table that is referenced by its own name.
    #[must_use]
    pub fn unnamed_alias<T: Table>(&self) -> Alias<T> {
        Alias::table(self.table::<T>(), None)
    }

    /// Starts a select over an alias.
    #[must_use]
    pub fn from<R: 'static>(&self, alias: &Alias<R>) -> SelectBuilder<(R,), Joining> {
        SelectBuilder::from_alias(&self.scope(), alias)
    }

    /// Starts a select over an alias nested inside another statement's scope,
    /// so that it can reference the outer statement's aliases.
    #[must_use]
    pub fn from_within<R: 'static>(
        &self,
        scope: &Scope,
        alias: &Alias<R>,
    ) -> SelectBuilder<(R,), Joining> {
        SelectBuilder::from_alias(scope, alias)
    }

    /// Starts a select without a table.
    #[must_use]
    pub fn select<T, E>(&self, expression: E) -> SelectBuilder<(T,), Projecting>
    where
        T: 'static,
        E: IntoExpression<T>,
    {
        self.from(&Alias::<Dual>::dual()).select(expression)
    }

    /// Starts a select without a table, with an explicit output label.
    #[must_use]
    pub fn select_as<T, E>(&self, expression: E, label: &str) -> SelectBuilder<(T,), Projecting>
    where
        T: 'static,
        E: IntoExpression<T>,
    {
        self.from(&Alias::<Dual>::dual())
            .select_as(expression, label)
    }

    /// Starts a common table expression with the given name.
    #[must_use]
    pub fn with(&self, name: &str) -> CteBuilder {
        CteBuilder::new(self.clone(), name)
    }
}

/// Builder for [`Database`].
#[derive(Debug)]
pub struct DatabaseBuilder {
    dialect: Arc<dyn Dialect>,
    default_schema: Option<String>,
    naming: NamingStrategy,
}

impl Default for DatabaseBuilder {
    fn default() -> Self {
        Self {
            dialect: Arc::new(AnsiDialect::new()),
            default_schema: None,
            naming: NamingStrategy::default(),
        }
    }
}

impl DatabaseBuilder {
    /// Uses a dialect instance.
    #[must_use]
    pub fn dialect<D: Dialect + 'static>(mut self, dialect: D) -> Self {
        self.dialect = Arc::new(dialect);
        self
    }

    /// Uses one of the built-in dialects.
    #[must_use]
    pub fn dialect_kind(mut self, kind: DialectKind) -> Self {
        self.dialect = Arc::from(kind.create());
        self
    }

    /// Sets the default schema.
    #[must_use]
    pub fn default_schema(mut self, schema: impl Into<String>) -> Self {
        self.default_schema = Some(schema.into());
        self
    }

    /// Sets the naming strategy.
    #[must_use]
    pub const fn naming_strategy(mut self, naming: NamingStrategy) -> Self {
        self.naming = naming;
        self
    }

    /// Builds the database.
    #[must_use]
    pub fn build(self) -> Database {
        Database {
            inner: Arc::new(DatabaseInner {
                dialect: self.dialect,
                default_schema: self.default_schema,
                naming: self.naming,
                tables: Mutex::new(HashMap::new()),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let db = Database::builder().build();
        assert_eq!(db.dialect().name(), "ansi");
        assert_eq!(db.default_schema(), None);
        assert_eq!(db.naming_strategy(), NamingStrategy::UppercaseUnderscores);
    }

    #[test]
    fn test_from_json_config() {
        let config = DatabaseConfig::from_json(
            r#"{"dialect": "db2", "default_schema": "SIESTA", "naming": "lowercase_underscores"}"#,
        )
        .unwrap();
        let db = Database::from_config(&config);
        assert_eq!(db.dialect().name(), "db2");
        assert_eq!(db.default_schema(), Some("SIESTA"));
        assert_eq!(db.naming_strategy(), NamingStrategy::LowercaseUnderscores);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config = DatabaseConfig::from_json(r#"{"default_schema": "APP"}"#).unwrap();
        assert_eq!(config.dialect, DialectKind::Ansi);
        assert_eq!(config.naming, NamingStrategy::UppercaseUnderscores);
    }

    #[test]
    fn test_invalid_config() {
        let err = DatabaseConfig::from_json(r#"{"dialect": "oracle"}"#).unwrap_err();
        assert!(matches!(err, crate::Error::Config(_)));
    }

    #[test]
    fn test_config_round_trips_through_json() {
        let config = DatabaseConfig {
            dialect: DialectKind::Postgres,
            default_schema: None,
            naming: NamingStrategy::AsIs,
        };
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(DatabaseConfig::from_json(&json).unwrap(), config);
    }
}
