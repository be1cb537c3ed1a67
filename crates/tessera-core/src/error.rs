//! Error types for statement building, rendering and execution.

use thiserror::Error;

/// Errors raised while resolving names, rendering statements or mapping rows.
#[derive(Debug, Error)]
pub enum Error {
    /// No alias for the requested table is visible in the scope.
    #[error("no alias {} for {table} in scope", .alias.as_deref().unwrap_or("*"))]
    NoSuchAlias {
        /// Table the alias was requested for.
        table: String,
        /// Alias name that was required, if any.
        alias: Option<String>,
    },

    /// More than one alias matched in the same scope frame.
    #[error("more than one alias for {0} in scope")]
    AmbiguousAlias(String),

    /// An alias with the requested name exists but belongs to another table.
    #[error("alias {alias} is an alias for {actual} and not {expected}")]
    AliasTypeMismatch {
        /// Alias name.
        alias: String,
        /// Table the alias refers to.
        actual: String,
        /// Table that was requested.
        expected: String,
    },

    /// A column could not be found on the resolved alias.
    #[error("no column {column} in {source_name}")]
    NoSuchColumn {
        /// Table, CTE or subquery alias searched.
        source_name: String,
        /// Property or column label requested.
        column: String,
    },

    /// No foreign key links the two tables.
    #[error("no foreign key{} from {child} to {parent}", .name.as_deref().map(|n| format!(" {n}")).unwrap_or_default())]
    NoForeignKey {
        /// Referencing table.
        child: String,
        /// Referenced table.
        parent: String,
        /// Key name that was requested, if any.
        name: Option<String>,
    },

    /// More than one foreign key links the two tables and no name was given.
    #[error("more than one foreign key from {child} to {parent}, a key name is required")]
    AmbiguousForeignKey {
        /// Referencing table.
        child: String,
        /// Referenced table.
        parent: String,
    },

    /// A validated join whose ON clause never references the joined alias.
    #[error("join condition does not reference {0}")]
    InvalidJoin(String),

    /// Output shapes of combined statements disagree.
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    /// The dialect cannot express the requested construct.
    #[error("{dialect} does not support {feature}")]
    Unsupported {
        /// Dialect name.
        dialect: &'static str,
        /// What was requested.
        feature: String,
    },

    /// A result row lacks the requested column label.
    #[error("result row has no column {0}")]
    MissingColumn(String),

    /// A value has no SQL literal form.
    #[error("{0} cannot be written as a SQL literal")]
    InvalidLiteral(String),

    /// A result value cannot be converted to the requested Rust type.
    #[error("cannot convert {value} to {target}")]
    Conversion {
        /// Description of the offending value.
        value: String,
        /// Target Rust type.
        target: &'static str,
    },

    /// No row was returned when one was required.
    #[error("query returned no rows")]
    NoRows,

    /// More rows were returned than allowed.
    #[error("query returned {0} rows when at most one was expected")]
    TooManyRows(usize),

    /// Invalid configuration document.
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    /// Error raised by the database driver.
    #[error("database error: {0}")]
    Database(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
    /// Wraps a driver error.
    pub fn database<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Database(Box::new(err))
    }
}

/// Result type alias for tessera operations.
pub type Result<T> = std::result::Result<T, Error>;
