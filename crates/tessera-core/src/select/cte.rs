//! Common table expressions.
//!
//! A CTE pairs a name and a row type with the select that produces its rows.
//! Statements that read from one of its aliases carry it in their CTE list;
//! only the outermost statement writes the `with` prefix.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use tracing::debug;

use crate::alias::Alias;
use crate::database::Database;
use crate::error::{Error, Result};
use crate::schema::{Table, TableMeta};
use crate::scope::Scope;
use crate::value::SqlValue;

use super::statement::{Select, SelectNode};

pub(crate) struct CteNode {
    name: String,
    meta: Arc<TableMeta>,
    select: Arc<SelectNode>,
}

impl CteNode {
    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn meta(&self) -> &TableMeta {
        &self.meta
    }

    pub(crate) fn select(&self) -> &Arc<SelectNode> {
        &self.select
    }

    /// `name(COL, ...) as (select ...)`
    pub(crate) fn sql(&self, scope: &Scope) -> Result<String> {
        let columns: Vec<&str> = self.meta.columns().iter().map(|c| c.name.as_str()).collect();
        Ok(format!(
            "{}({}) as ({})",
            self.name,
            columns.join(", "),
            self.select.sql_impl(scope)?
        ))
    }

    pub(crate) fn args(&self, scope: &Scope) -> Result<Vec<SqlValue>> {
        self.select.args(scope)
    }
}

impl fmt::Debug for CteNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CteNode")
            .field("name", &self.name)
            .field("select", &self.select)
            .finish_non_exhaustive()
    }
}

/// Starts a common table expression; created by [`Database::with`].
#[derive(Debug, Clone)]
pub struct CteBuilder {
    database: Database,
    name: String,
}

impl CteBuilder {
    pub(crate) fn new(database: Database, name: &str) -> Self {
        Self {
            database,
            name: name.to_string(),
        }
    }

    /// Defines the CTE's rows as the result of `select`, read back as rows of
    /// table type `T`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ShapeMismatch`] when the select's projection does not
    /// have one column per column of `T`.
    pub fn as_select<T: Table, RT>(self, select: &Select<RT>) -> Result<CommonTableExpression<T>> {
        let meta = self.database.table::<T>();
        let width = select.node().width();
        if width != meta.columns().len() {
            return Err(Error::ShapeMismatch(format!(
                "{} has {} columns but its select has {width}",
                self.name,
                meta.columns().len()
            )));
        }
        debug!(cte = %self.name, table = T::TYPE_NAME, "Defined common table expression");
        Ok(CommonTableExpression {
            node: Arc::new(CteNode {
                name: self.name,
                meta,
                select: Arc::clone(select.node()),
            }),
            _row: PhantomData,
        })
    }
}

/// A named select whose rows are read as `T`.
pub struct CommonTableExpression<T> {
    node: Arc<CteNode>,
    _row: PhantomData<fn() -> T>,
}

impl<T> Clone for CommonTableExpression<T> {
    fn clone(&self) -> Self {
        Self {
            node: Arc::clone(&self.node),
            _row: PhantomData,
        }
    }
}

impl<T> fmt::Debug for CommonTableExpression<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CommonTableExpression")
            .field(&self.node)
            .finish()
    }
}

impl<T> CommonTableExpression<T> {
    /// The CTE name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.node.name()
    }

    pub(crate) fn node(&self) -> &Arc<CteNode> {
        &self.node
    }
}

impl<T: Table> CommonTableExpression<T> {
    /// An alias referencing the CTE by its own name.
    #[must_use]
    pub fn alias(&self) -> Alias<T> {
        Alias::cte(Arc::clone(&self.node), None)
    }

    /// An alias with an explicit name: `cte name`.
    #[must_use]
    pub fn as_alias(&self, name: &str) -> Alias<T> {
        Alias::cte(Arc::clone(&self.node), Some(name))
    }
}
