//! SQLite dialect implementation.

use tessera_core::dialect::{arg, standard_function_sql, Dialect, FunctionName, SqlType};
use tessera_core::Result;

/// SQLite dialect.
#[derive(Debug, Default, Clone, Copy)]
pub struct SqliteDialect;

impl SqliteDialect {
    /// Creates a new SQLite dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Dialect for SqliteDialect {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn requires_from_dual(&self) -> bool {
        false
    }

    fn function_sql(&self, name: FunctionName, args: &[String]) -> Result<String> {
        Ok(match name {
            FunctionName::Length => format!("length({})", args.join(", ")),
            FunctionName::Year => format!("cast(strftime('%Y', {}) as integer)", arg(args, 0)),
            FunctionName::AddDays => format!(
                "date({}, '+' || {} || ' days')",
                arg(args, 0),
                arg(args, 1)
            ),
            FunctionName::Substr => format!("substr({})", args.join(", ")),
            other => standard_function_sql(other, args),
        })
    }

    fn type_sql(&self, sql_type: SqlType) -> String {
        // Column affinities
        String::from(match sql_type {
            SqlType::Integer | SqlType::BigInt => "integer",
            SqlType::Double => "real",
            SqlType::Varchar(_) | SqlType::Char(_) | SqlType::Date | SqlType::Timestamp => "text",
        })
    }

    fn fetch_first(&self, sql: String, n: u64, offset: Option<u64>) -> String {
        match offset {
            Some(offset) => format!("{sql} limit {n} offset {offset}"),
            None => format!("{sql} limit {n}"),
        }
    }
}
