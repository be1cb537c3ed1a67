//! # tessera-core
//!
//! A compositional, type-checked SQL statement builder.
//!
//! This crate provides:
//! - Chained scopes resolving column references across joins, subqueries and
//!   common table expressions
//! - Typed expressions that render their text and their bound values in the
//!   same traversal order
//! - Projections that grow one tuple element per selected column
//! - A typestate builder enforcing clause order at compile time
//!
//! ## Building Statements
//!
//! ```rust
//! use tessera_core::{literal, value, Database, Order};
//!
//! let db = Database::builder().build();
//! let two = db.select_as(literal(2_i64), "two").build()?;
//! let three = db.select_as(value(3_i64), "three").build()?;
//! let select = db
//!     .select_as(value(1_i64), "one")
//!     .union(&two)
//!     .union_all(&three)
//!     .order_by_position(1, Order::Asc)
//!     .build()?;
//!
//! assert_eq!(
//!     select.sql()?,
//!     "select ? as one from DUAL union select 2 as two from DUAL \
//!      union all select ? as three from DUAL order by 1 asc"
//! );
//! assert_eq!(select.args()?.len(), 2);
//! # Ok::<(), tessera_core::Error>(())
//! ```
//!
//! ## Tables
//!
//! Row types are declared with `#[derive(Table)]` from `tessera-derive`, which
//! generates the table metadata, one column type per field and an accessor
//! returning a column reference:
//!
//! ```ignore
//! #[derive(Table)]
//! #[table(schema = "SIESTA")]
//! struct Salesperson {
//!     #[column(primary_key)]
//!     id: i64,
//!     first_name: String,
//! }
//!
//! let p = db.alias::<Salesperson>("p");
//! let select = db
//!     .from(&p)
//!     .select(p.col(Salesperson::first_name()))
//!     .where_clause(p.col(Salesperson::first_name()).eq("James"))
//!     .build()?;
//! // select p.FIRST_NAME as p_FIRST_NAME from SIESTA.SALESPERSON p
//! //     where p.FIRST_NAME = ?
//! ```

extern crate self as tessera_core;

pub mod alias;
pub mod database;
pub mod dialect;
pub mod error;
pub mod executor;
pub mod expr;
pub mod from;
mod label;
mod projection;
pub mod row;
pub mod schema;
pub mod scope;
pub mod select;
pub mod tuple;
pub mod value;

pub use alias::{Alias, AnyAlias};
pub use database::{Database, DatabaseBuilder, DatabaseConfig};
pub use dialect::{
    standard_function_sql, standard_type_sql, AnsiDialect, Db2Dialect, Dialect, DialectKind,
    FunctionName, IsolationLevel, LockLevel, PostgresDialect, SqlType,
};
pub use error::{Error, Result};
pub use executor::Executor;
pub use expr::{
    abs, add_days, avg, case_when, cast, coalesce, count, count_distinct, current_timestamp,
    exists, first_value, instr, lag, last_value, lead, length, literal, lower, max, min, not,
    not_exists, row_number, substr, substr_for, sum, sum_over, trim, upper, value, year,
    ColumnRef, Condition, Expression, ExpressionExt, ForeignKeyJoin, IntoExpression,
    TypedExpression,
};
pub use from::JoinType;
pub use row::{ResultRow, RowMapper, RowMapperFactory, RowReader, ValueRow};
pub use schema::{
    Column, ColumnMeta, ColumnSchema, Dual, ForeignKeyMeta, ForeignKeySchema, NamingStrategy,
    Table, TableMeta,
};
pub use scope::Scope;
pub use select::{CommonTableExpression, CteBuilder, Order, Select, SelectBuilder, UnionType};
pub use tuple::{Append, Flatten};
pub use value::{FromSqlValue, SqlValue, ToSqlValue};
