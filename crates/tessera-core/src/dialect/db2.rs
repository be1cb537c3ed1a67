//! IBM Db2 dialect.

use crate::error::Result;

use super::{
    arg, standard_function_sql, standard_type_sql, Dialect, FunctionName, IsolationLevel,
    LockLevel, SqlType,
};

/// Db2 dialect: `SYSIBM.SYSDUMMY1` as the one-row table and per-query
/// isolation clauses (`with ur`, `with cs`, `with rs`, `with rr`).
#[derive(Debug, Default, Clone, Copy)]
pub struct Db2Dialect;

impl Db2Dialect {
    /// Creates a new Db2 dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Dialect for Db2Dialect {
    fn name(&self) -> &'static str {
        "db2"
    }

    fn dual(&self) -> &'static str {
        "SYSIBM.SYSDUMMY1"
    }

    fn function_sql(&self, name: FunctionName, args: &[String]) -> Result<String> {
        Ok(match name {
            FunctionName::Length => format!("length({})", args.join(", ")),
            FunctionName::Year => format!("year({})", arg(args, 0)),
            FunctionName::AddDays => format!("{} + {} days", arg(args, 0), arg(args, 1)),
            FunctionName::Substr => format!("substr({})", args.join(", ")),
            FunctionName::Instr => format!("locate_in_string({})", args.join(", ")),
            other => standard_function_sql(other, args),
        })
    }

    fn type_sql(&self, sql_type: SqlType) -> String {
        match sql_type {
            SqlType::Double => String::from("double"),
            other => standard_type_sql(other),
        }
    }

    fn supports_isolation_level_in_query(&self) -> bool {
        true
    }

    fn isolation_level_sql(
        &self,
        sql: String,
        level: IsolationLevel,
        keep_locks: Option<LockLevel>,
    ) -> String {
        if let Some(locks) = keep_locks {
            let level = if level <= IsolationLevel::RepeatableRead {
                "rs"
            } else {
                "rr"
            };
            return format!("{sql} for read only with {level} use and keep {locks} locks");
        }
        match level {
            IsolationLevel::Unspecified => sql,
            IsolationLevel::UncommittedRead => format!("{sql} with ur"),
            IsolationLevel::ReadCommitted => format!("{sql} with cs"),
            IsolationLevel::RepeatableRead => format!("{sql} with rs"),
            IsolationLevel::Serializable => format!("{sql} with rr"),
        }
    }
}
