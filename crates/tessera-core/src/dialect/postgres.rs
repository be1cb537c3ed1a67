//! PostgreSQL dialect.

use crate::error::Result;

use super::{arg, standard_function_sql, Dialect, FunctionName};

/// PostgreSQL dialect: no one-row table is needed and limits are always
/// written with an explicit offset.
#[derive(Debug, Default, Clone, Copy)]
pub struct PostgresDialect;

impl PostgresDialect {
    /// Creates a new PostgreSQL dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Dialect for PostgresDialect {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn requires_from_dual(&self) -> bool {
        false
    }

    fn function_sql(&self, name: FunctionName, args: &[String]) -> Result<String> {
        Ok(match name {
            FunctionName::Length => format!("length({})", args.join(", ")),
            FunctionName::CurrentTimestamp => String::from("localtimestamp"),
            FunctionName::AddDays => format!("{} + {}", arg(args, 0), arg(args, 1)),
            FunctionName::Instr => format!("strpos({}, {})", arg(args, 0), arg(args, 1)),
            other => standard_function_sql(other, args),
        })
    }

    fn fetch_first(&self, sql: String, n: u64, offset: Option<u64>) -> String {
        format!(
            "{sql} offset {} rows fetch next {n} rows only",
            offset.unwrap_or(0)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_postgres_dialect() {
        let dialect = PostgresDialect::new();
        assert_eq!(dialect.name(), "postgres");
        assert!(!dialect.requires_from_dual());
        assert!(!dialect.supports_isolation_level_in_query());
    }

    #[test]
    fn test_postgres_fetch_first() {
        let dialect = PostgresDialect::new();
        assert_eq!(
            dialect.fetch_first(String::from("select 1"), 10, None),
            "select 1 offset 0 rows fetch next 10 rows only"
        );
        assert_eq!(
            dialect.fetch_first(String::from("select 1"), 10, Some(20)),
            "select 1 offset 20 rows fetch next 10 rows only"
        );
    }

    #[test]
    fn test_postgres_functions() {
        let dialect = PostgresDialect::new();
        assert_eq!(
            dialect
                .function_sql(FunctionName::CurrentTimestamp, &[])
                .unwrap(),
            "localtimestamp"
        );
        assert_eq!(
            dialect
                .function_sql(FunctionName::Year, &[String::from("d")])
                .unwrap(),
            "extract(year from d)"
        );
    }

    #[test]
    fn test_postgres_string_functions() {
        let dialect = PostgresDialect::new();
        let args = [String::from("p.NAME"), String::from("?")];
        assert_eq!(
            dialect.function_sql(FunctionName::Instr, &args).unwrap(),
            "strpos(p.NAME, ?)"
        );
        assert_eq!(
            dialect.function_sql(FunctionName::Substr, &args).unwrap(),
            "substring(p.NAME from ?)"
        );
    }
}
