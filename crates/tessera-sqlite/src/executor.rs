//! Executor running statements on a SQLite connection pool.

use futures::stream::{BoxStream, StreamExt};
use sqlx::sqlite::{SqliteArguments, SqlitePool, SqliteRow};
use sqlx::{Column as _, Row, Sqlite, ValueRef};
use tracing::debug;

use tessera_core::{Error, Executor, Result, RowMapper, SqlValue, ValueRow};

type SqliteQuery<'q> = sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>;

/// Runs tessera statements through sqlx.
#[derive(Debug, Clone)]
pub struct SqliteExecutor {
    pool: SqlitePool,
}

impl SqliteExecutor {
    /// Creates an executor over an existing pool.
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Opens a pool for the given connection URL.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Database`] if the connection fails.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(url).await.map_err(Error::database)?;
        Ok(Self::new(pool))
    }

    /// The underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Runs a statement that returns no rows and reports the rows affected.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Database`] if the statement fails.
    pub async fn execute(&self, sql: &str, args: &[SqlValue]) -> Result<u64> {
        debug!(sql = %sql, args = args.len(), "Executing statement");
        let result = bind_all(sqlx::query(sql), args)
            .execute(&self.pool)
            .await
            .map_err(Error::database)?;
        Ok(result.rows_affected())
    }

    /// Runs a query and maps rows as they arrive.
    pub fn stream<'a, T: Send + 'a>(
        &'a self,
        sql: &'a str,
        args: &[SqlValue],
        mapper: &RowMapper<T>,
    ) -> BoxStream<'a, Result<T>> {
        debug!(sql = %sql, args = args.len(), "Streaming query");
        let mapper = mapper.clone();
        bind_all(sqlx::query(sql), args)
            .fetch(&self.pool)
            .map(move |row| {
                let row = to_value_row(&row.map_err(Error::database)?)?;
                mapper.map_row(&row)
            })
            .boxed()
    }
}

impl Executor for SqliteExecutor {
    async fn query<T: Send + 'static>(
        &self,
        sql: &str,
        args: &[SqlValue],
        mapper: &RowMapper<T>,
    ) -> Result<Vec<T>> {
        let rows = bind_all(sqlx::query(sql), args)
            .fetch_all(&self.pool)
            .await
            .map_err(Error::database)?;
        debug!(rows = rows.len(), "Query returned");
        rows.iter()
            .map(|row| mapper.map_row(&to_value_row(row)?))
            .collect()
    }
}

fn bind_all<'q>(query: SqliteQuery<'q>, args: &[SqlValue]) -> SqliteQuery<'q> {
    args.iter().cloned().fold(query, bind_param)
}

/// Binds a SqlValue parameter to a raw query.
fn bind_param(query: SqliteQuery<'_>, value: SqlValue) -> SqliteQuery<'_> {
    match value {
        SqlValue::Null => query.bind(Option::<i64>::None),
        SqlValue::Bool(b) => query.bind(b),
        SqlValue::Int(i) => query.bind(i),
        SqlValue::Float(f) => query.bind(f),
        SqlValue::Text(s) => query.bind(s),
        SqlValue::Blob(b) => query.bind(b),
    }
}

/// Copies a driver row into a label-addressed row.
fn to_value_row(row: &SqliteRow) -> Result<ValueRow> {
    let mut values = ValueRow::new();
    for column in row.columns() {
        let index = column.ordinal();
        let raw = row.try_get_raw(index).map_err(Error::database)?;
        let value = if raw.is_null() {
            SqlValue::Null
        } else if let Ok(n) = row.try_get::<i64, _>(index) {
            SqlValue::Int(n)
        } else if let Ok(f) = row.try_get::<f64, _>(index) {
            SqlValue::Float(f)
        } else if let Ok(s) = row.try_get::<String, _>(index) {
            SqlValue::Text(s)
        } else {
            SqlValue::Blob(row.try_get::<Vec<u8>, _>(index).map_err(Error::database)?)
        };
        values.push(column.name(), value);
    }
    Ok(values)
}
