//! Statement execution.
//!
//! The core never talks to a database itself. An [`Executor`] receives the
//! rendered text, the bound values and the row mapper of a statement and
//! returns the mapped rows.

use std::future::Future;

use crate::error::{Error, Result};
use crate::row::RowMapper;
use crate::value::SqlValue;

/// Runs rendered statements against a database.
pub trait Executor: Send + Sync {
    /// Runs a query and maps every result row.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Database`] for driver failures, or the mapper's error
    /// for rows that cannot be mapped.
    fn query<T: Send + 'static>(
        &self,
        sql: &str,
        args: &[SqlValue],
        mapper: &RowMapper<T>,
    ) -> impl Future<Output = Result<Vec<T>>> + Send;
}

/// Returns the only row, failing for zero or several rows.
pub(crate) fn expect_single<T>(mut rows: Vec<T>) -> Result<T> {
    match rows.len() {
        0 => Err(Error::NoRows),
        1 => rows.pop().ok_or(Error::NoRows),
        n => Err(Error::TooManyRows(n)),
    }
}

/// Returns the row if there is one, failing for several rows.
pub(crate) fn expect_optional<T>(mut rows: Vec<T>) -> Result<Option<T>> {
    match rows.len() {
        0 | 1 => Ok(rows.pop()),
        n => Err(Error::TooManyRows(n)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expect_single() {
        assert_eq!(expect_single(vec![1]).unwrap(), 1);
        assert!(matches!(expect_single::<i32>(vec![]), Err(Error::NoRows)));
        assert!(matches!(
            expect_single(vec![1, 2]),
            Err(Error::TooManyRows(2))
        ));
    }

    #[test]
    fn test_expect_optional() {
        assert_eq!(expect_optional::<i32>(vec![]).unwrap(), None);
        assert_eq!(expect_optional(vec![3]).unwrap(), Some(3));
        assert!(matches!(
            expect_optional(vec![1, 2, 3]),
            Err(Error::TooManyRows(3))
        ));
    }
}
