//! ANSI SQL dialect.

use crate::error::{Error, Result};

use super::{standard_function_sql, Dialect, FunctionName};

/// A dialect following ANSI SQL: `DUAL` for table-less selects and
/// `fetch first n rows only` for limits.
#[derive(Debug, Default, Clone, Copy)]
pub struct AnsiDialect;

impl AnsiDialect {
    /// Creates a new ANSI dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Dialect for AnsiDialect {
    fn name(&self) -> &'static str {
        "ansi"
    }

    fn function_sql(&self, name: FunctionName, args: &[String]) -> Result<String> {
        match name {
            // position(search in string) reverses the argument order
            FunctionName::Instr => Err(Error::Unsupported {
                dialect: self.name(),
                feature: String::from("instr"),
            }),
            other => Ok(standard_function_sql(other, args)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{IsolationLevel, LockLevel};

    #[test]
    fn test_ansi_dialect() {
        let dialect = AnsiDialect::new();
        assert_eq!(dialect.name(), "ansi");
        assert!(dialect.requires_from_dual());
        assert_eq!(dialect.dual(), "DUAL");
        assert!(!dialect.supports_isolation_level_in_query());
    }

    #[test]
    fn test_ansi_qualified_name() {
        let dialect = AnsiDialect::new();
        assert_eq!(
            dialect.qualified_table_name(Some("SIESTA"), "SALESPERSON"),
            "SIESTA.SALESPERSON"
        );
        assert_eq!(dialect.qualified_table_name(None, "PART"), "PART");
        assert_eq!(dialect.qualified_table_name(Some(" "), "PART"), "PART");
    }

    #[test]
    fn test_ansi_fetch_first() {
        let dialect = AnsiDialect::new();
        assert_eq!(
            dialect.fetch_first(String::from("select 1"), 5, None),
            "select 1 fetch first 5 rows only"
        );
        assert_eq!(
            dialect.fetch_first(String::from("select 1"), 15, Some(30)),
            "select 1 offset 30 rows fetch next 15 rows only"
        );
    }

    #[test]
    fn test_ansi_ignores_isolation() {
        let dialect = AnsiDialect::new();
        assert_eq!(
            dialect.isolation_level_sql(
                String::from("select 1"),
                IsolationLevel::Serializable,
                Some(LockLevel::Share)
            ),
            "select 1"
        );
    }

    #[test]
    fn test_ansi_functions() {
        let dialect = AnsiDialect::new();
        let args = [String::from("p.HIRED"), String::from("?")];
        assert_eq!(
            dialect.function_sql(FunctionName::AddDays, &args).unwrap(),
            "p.HIRED + interval '1' day * ?"
        );
        assert_eq!(
            dialect.function_sql(FunctionName::Year, &args[..1]).unwrap(),
            "extract(year from p.HIRED)"
        );
        assert_eq!(
            dialect.concat(&[String::from("a"), String::from("b")]),
            "a || b"
        );
    }

    #[test]
    fn test_ansi_has_no_instr() {
        let dialect = AnsiDialect::new();
        let args = [String::from("p.NAME"), String::from("?")];
        let err = dialect.function_sql(FunctionName::Instr, &args).unwrap_err();
        assert!(matches!(
            err,
            Error::Unsupported { dialect: "ansi", ref feature } if feature == "instr"
        ));
        assert_eq!(err.to_string(), "ansi does not support instr");
    }
}
