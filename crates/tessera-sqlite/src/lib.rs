//! # tessera-sqlite
//!
//! SQLite support for `tessera-core`.
//!
//! # How SQLite differs from other dialects
//!
//! - **No one-row table**: a select without a table is written without a
//!   FROM clause.
//! - **[LIMIT]**: row limits are written `limit n offset m` rather than
//!   `fetch first n rows only`.
//! - **[Date functions]**: the year of a date is taken with `strftime`, and
//!   days are added with `date(x, '+n days')`.
//! - **Isolation**: SQLite has no per-query isolation or lock clauses, so
//!   requested levels are skipped with a warning.
//!
//! [LIMIT]: https://www.sqlite.org/lang_select.html#limitoffset
//! [Date functions]: https://www.sqlite.org/lang_datefunc.html
//!
//! ## Example
//!
//! ```rust
//! use tessera_core::{value, Database};
//! use tessera_sqlite::SqliteDialect;
//!
//! let db = Database::builder().dialect(SqliteDialect::new()).build();
//! let select = db.select_as(value(1_i64), "one").fetch_first(1).build()?;
//! assert_eq!(select.sql()?, "select ? as one limit 1");
//! # Ok::<(), tessera_core::Error>(())
//! ```

mod dialect;
mod executor;

pub use dialect::SqliteDialect;
pub use executor::SqliteExecutor;
