#![allow(dead_code)]

use std::sync::Mutex;

use tessera_core::{Database, Executor, Result, RowMapper, SqlValue, ValueRow};
use tessera_derive::Table;

#[derive(Debug, Clone, PartialEq, Table)]
pub struct Salesperson {
    #[column(primary_key)]
    pub id: i64,
    pub first_name: String,
    pub surname: String,
}

#[derive(Debug, Clone, PartialEq, Table)]
pub struct Manufacturer {
    #[column(primary_key)]
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Table)]
pub struct Part {
    #[column(primary_key)]
    pub id: i64,
    pub name: String,
    #[column(references = "Manufacturer::id")]
    pub manufacturer_id: i64,
}

/// Two keys to the same parent, told apart by name.
#[derive(Debug, Clone, PartialEq, Table)]
pub struct Contract {
    #[column(primary_key)]
    pub id: i64,
    #[column(references = "Manufacturer::id", foreign_key = "FK_BUYER")]
    pub buyer_id: i64,
    #[column(references = "Manufacturer::id", foreign_key = "FK_SELLER")]
    pub seller_id: i64,
}

/// Row type of the `top` common table expression.
#[derive(Debug, Clone, PartialEq, Table)]
pub struct TopSeller {
    pub id: i64,
    pub first_name: String,
}

pub fn siesta() -> Database {
    Database::builder().default_schema("SIESTA").build()
}

pub fn placeholders(sql: &str) -> usize {
    sql.matches('?').count()
}

/// Executor answering every query with the same rows.
#[derive(Default)]
pub struct MockExecutor {
    rows: Vec<ValueRow>,
    queries: Mutex<Vec<(String, Vec<SqlValue>)>>,
}

impl MockExecutor {
    pub fn returning(rows: Vec<ValueRow>) -> Self {
        Self {
            rows,
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn queries(&self) -> Vec<(String, Vec<SqlValue>)> {
        self.queries.lock().unwrap().clone()
    }
}

impl Executor for MockExecutor {
    async fn query<T: Send + 'static>(
        &self,
        sql: &str,
        args: &[SqlValue],
        mapper: &RowMapper<T>,
    ) -> Result<Vec<T>> {
        self.queries
            .lock()
            .unwrap()
            .push((sql.to_string(), args.to_vec()));
        self.rows.iter().map(|row| mapper.map_row(row)).collect()
    }
}
