//! SQL Dialect support.
//!
//! Different databases have slightly different SQL syntax. This module provides
//! a trait for dialect-specific behavior: how a statement without a FROM
//! source is written, how row limits, isolation levels and lock levels are
//! spelled, how tables are qualified and how built-in functions are named.

mod ansi;
mod db2;
mod postgres;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::Result;

pub use ansi::AnsiDialect;
pub use db2::Db2Dialect;
pub use postgres::PostgresDialect;

/// Built-in functions whose spelling varies between dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionName {
    /// `upper(s)`
    Upper,
    /// `lower(s)`
    Lower,
    /// Character length of a string.
    Length,
    /// `abs(n)`
    Abs,
    /// `coalesce(a, b, ...)`
    Coalesce,
    /// `count(x)`
    Count,
    /// `count(distinct x)`
    CountDistinct,
    /// `max(x)`
    Max,
    /// `min(x)`
    Min,
    /// `sum(x)`
    Sum,
    /// `avg(x)`
    Avg,
    /// Current timestamp, no arguments.
    CurrentTimestamp,
    /// Year part of a date.
    Year,
    /// Date plus a number of days.
    AddDays,
    /// Substring from a 1-based start, with an optional length.
    Substr,
    /// `trim(s)`
    Trim,
    /// 1-based position of a search string within a string, 0 when absent.
    Instr,
}

impl FunctionName {
    /// Lowercase name, also used as the label prefix of function calls.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Upper => "upper",
            Self::Lower => "lower",
            Self::Length => "length",
            Self::Abs => "abs",
            Self::Coalesce => "coalesce",
            Self::Count | Self::CountDistinct => "count",
            Self::Max => "max",
            Self::Min => "min",
            Self::Sum => "sum",
            Self::Avg => "avg",
            Self::CurrentTimestamp => "current_timestamp",
            Self::Year => "year",
            Self::AddDays => "add_days",
            Self::Substr => "substr",
            Self::Trim => "trim",
            Self::Instr => "instr",
        }
    }

    /// Whether the function aggregates over groups.
    #[must_use]
    pub const fn is_aggregate(self) -> bool {
        matches!(
            self,
            Self::Count | Self::CountDistinct | Self::Max | Self::Min | Self::Sum | Self::Avg
        )
    }
}

impl fmt::Display for FunctionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transaction isolation requested for a single query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IsolationLevel {
    /// Leave the connection's isolation level alone.
    Unspecified,
    /// Dirty reads allowed.
    UncommittedRead,
    /// Read committed data only.
    ReadCommitted,
    /// Rows read stay stable.
    RepeatableRead,
    /// Full serializability.
    Serializable,
}

/// Lock level kept on rows read by a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockLevel {
    /// Shared locks.
    Share,
    /// Update locks.
    Update,
    /// Exclusive locks.
    Exclusive,
}

impl fmt::Display for LockLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Share => "SHARE",
            Self::Update => "UPDATE",
            Self::Exclusive => "EXCLUSIVE",
        })
    }
}

/// Trait for SQL dialect-specific behavior.
pub trait Dialect: fmt::Debug + Send + Sync {
    /// Returns the name of the dialect.
    fn name(&self) -> &'static str;

    /// Whether a statement without a table must still name a FROM source.
    fn requires_from_dual(&self) -> bool {
        true
    }

    /// The one-row table used when no FROM source is given.
    fn dual(&self) -> &'static str {
        "DUAL"
    }

    /// Returns `schema.name`, or `name` when there is no schema.
    fn qualified_table_name(&self, schema: Option<&str>, name: &str) -> String {
        match schema.filter(|s| !s.trim().is_empty()) {
            Some(schema) => format!("{schema}.{name}"),
            None => name.to_string(),
        }
    }

    /// Spelling of a type in `cast(x as <type>)`.
    fn type_sql(&self, sql_type: SqlType) -> String {
        standard_type_sql(sql_type)
    }

    /// Joins string expressions into one concatenation.
    fn concat(&self, parts: &[String]) -> String {
        parts.join(" || ")
    }

    /// Renders a built-in function call from its rendered arguments.
    ///
    /// Implementations must use every argument exactly once, in order, so
    /// that bound parameters keep their positions.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Unsupported`] for functions the dialect cannot
    /// express.
    fn function_sql(&self, name: FunctionName, args: &[String]) -> Result<String> {
        Ok(standard_function_sql(name, args))
    }

    /// Appends a row limit, with an optional offset, to a statement.
    fn fetch_first(&self, sql: String, n: u64, offset: Option<u64>) -> String {
        match offset {
            Some(offset) => format!("{sql} offset {offset} rows fetch next {n} rows only"),
            None => format!("{sql} fetch first {n} rows only"),
        }
    }

    /// Whether isolation and lock levels can be given per query.
    fn supports_isolation_level_in_query(&self) -> bool {
        false
    }

    /// Appends the isolation and keep-locks clauses to a statement.
    fn isolation_level_sql(
        &self,
        sql: String,
        _level: IsolationLevel,
        _keep_locks: Option<LockLevel>,
    ) -> String {
        sql
    }
}

/// Function spellings shared by most dialects.
///
/// Dialects overriding [`Dialect::function_sql`] fall back to this for the
/// functions they spell the standard way.
#[must_use]
pub fn standard_function_sql(name: FunctionName, args: &[String]) -> String {
    match name {
        FunctionName::CountDistinct => format!("count(distinct {})", args.join(", ")),
        FunctionName::CurrentTimestamp => String::from("current_timestamp"),
        FunctionName::Length => format!("char_length({})", args.join(", ")),
        FunctionName::Year => format!("extract(year from {})", args.join(", ")),
        FunctionName::AddDays => format!(
            "{} + interval '1' day * {}",
            arg(args, 0),
            arg(args, 1)
        ),
        FunctionName::Substr => match args {
            [string, start] => format!("substring({string} from {start})"),
            _ => format!(
                "substring({} from {} for {})",
                arg(args, 0),
                arg(args, 1),
                arg(args, 2)
            ),
        },
        other => format!("{}({})", other.as_str(), args.join(", ")),
    }
}

/// Type spellings shared by most dialects.
#[must_use]
pub fn standard_type_sql(sql_type: SqlType) -> String {
    match sql_type {
        SqlType::Integer => String::from("integer"),
        SqlType::BigInt => String::from("bigint"),
        SqlType::Double => String::from("double precision"),
        SqlType::Varchar(length) => format!("varchar({length})"),
        SqlType::Char(length) => format!("char({length})"),
        SqlType::Date => String::from("date"),
        SqlType::Timestamp => String::from("timestamp"),
    }
}

/// The rendered argument at `index`, or an empty string when there are fewer
/// arguments. For use by [`Dialect::function_sql`] implementations.
#[must_use]
pub fn arg(args: &[String], index: usize) -> &str {
    args.get(index).map_or("", String::as_str)
}

/// Target types of `cast`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SqlType {
    /// 32-bit integer.
    Integer,
    /// 64-bit integer.
    BigInt,
    /// Double precision float.
    Double,
    /// Variable length string of at most the given length.
    Varchar(u32),
    /// Fixed length string.
    Char(u32),
    /// Calendar date.
    Date,
    /// Date and time.
    Timestamp,
}

/// Dialects selectable from configuration.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DialectKind {
    /// [`AnsiDialect`]
    #[default]
    Ansi,
    /// [`Db2Dialect`]
    Db2,
    /// [`PostgresDialect`]
    Postgres,
}

impl DialectKind {
    /// Creates the dialect instance.
    #[must_use]
    pub fn create(self) -> Box<dyn Dialect> {
        match self {
            Self::Ansi => Box::new(AnsiDialect::new()),
            Self::Db2 => Box::new(Db2Dialect::new()),
            Self::Postgres => Box::new(PostgresDialect::new()),
        }
    }
}
