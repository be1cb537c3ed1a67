//! Built select statements.
//!
//! A [`SelectNode`] is the immutable, untyped statement tree. [`Select<RT>`]
//! pairs it with the row mapper of its projection.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::alias::Alias;
use crate::dialect::{IsolationLevel, LockLevel};
use crate::error::Result;
use crate::executor::{expect_optional, expect_single, Executor};
use crate::expr::{BooleanChain, Expression, IntoExpression, TypedExpression};
use crate::from::FromClause;
use crate::projection::{Columns, MapperFn};
use crate::row::{RowMapper, RowMapperFactory};
use crate::scope::Scope;
use crate::value::{FromSqlValue, SqlValue};

use super::cte::CteNode;
use super::ordering::{Fetch, OrderBy};

/// Set operations chaining statements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnionType {
    /// `union`
    Union,
    /// `union all`
    UnionAll,
}

impl UnionType {
    /// Returns the SQL keywords for this set operation.
    #[must_use]
    pub const fn as_sql(&self) -> &'static str {
        match self {
            Self::Union => "union",
            Self::UnionAll => "union all",
        }
    }
}

/// The clauses of one select statement.
pub(crate) struct SelectNode {
    /// Aliases of the FROM clause, plus the frames the statement was built in.
    pub(crate) scope: Scope,
    pub(crate) label: String,
    pub(crate) columns: Columns,
    pub(crate) from: FromClause,
    pub(crate) where_clause: BooleanChain,
    pub(crate) group_by: Vec<Arc<dyn Expression>>,
    pub(crate) having: BooleanChain,
    pub(crate) unions: Vec<(UnionType, Arc<SelectNode>)>,
    pub(crate) order_by: Vec<OrderBy>,
    pub(crate) fetch: Option<Fetch>,
    pub(crate) isolation: IsolationLevel,
    pub(crate) lock: Option<LockLevel>,
    pub(crate) ctes: Vec<Arc<CteNode>>,
}

impl SelectNode {
    pub(crate) fn scope(&self) -> &Scope {
        &self.scope
    }

    fn inner_scope(&self, outer: &Scope) -> Scope {
        outer.plus_scope(&self.scope)
    }

    /// Text of the statement nested in `outer`, parenthesized.
    pub(crate) fn sql(&self, outer: &Scope) -> Result<String> {
        Ok(format!("({})", self.sql_impl(outer)?))
    }

    /// Text of the statement rendered in `outer`.
    ///
    /// Common table expressions are only written when `outer` is outermost;
    /// nested statements rely on the enclosing statement having hoisted them.
    pub(crate) fn sql_impl(&self, outer: &Scope) -> Result<String> {
        let scope = self.inner_scope(outer);
        let mut sql = String::new();

        if outer.is_outermost() && !self.ctes.is_empty() {
            let cte_scope = outer.enter();
            let ctes = self
                .ctes
                .iter()
                .map(|cte| cte.sql(&cte_scope))
                .collect::<Result<Vec<_>>>()?;
            sql.push_str("with ");
            sql.push_str(&ctes.join(", "));
            sql.push(' ');
        }

        sql.push_str("select ");
        sql.push_str(&self.columns.sql(&scope)?);
        sql.push_str(&self.from.sql(&scope)?);

        if !self.where_clause.is_empty() {
            sql.push_str(" where ");
            sql.push_str(&self.where_clause.sql(&scope)?);
        }

        if !self.group_by.is_empty() {
            let group_by = self
                .group_by
                .iter()
                .map(|e| e.sql(&scope))
                .collect::<Result<Vec<_>>>()?;
            sql.push_str(" group by ");
            sql.push_str(&group_by.join(", "));
        }

        if !self.having.is_empty() {
            sql.push_str(" having ");
            sql.push_str(&self.having.sql(&scope)?);
        }

        let sibling_scope = outer.enter();
        for (union_type, sibling) in &self.unions {
            sql.push(' ');
            sql.push_str(union_type.as_sql());
            sql.push(' ');
            sql.push_str(&sibling.sql_impl(&sibling_scope)?);
        }

        if !self.order_by.is_empty() {
            let labels = self.columns.labels(&scope)?;
            let order_by = self
                .order_by
                .iter()
                .map(|o| o.sql(&scope, &labels))
                .collect::<Result<Vec<_>>>()?;
            sql.push_str(" order by ");
            sql.push_str(&order_by.join(", "));
        }

        let dialect = scope.dialect();
        if let Some(fetch) = self.fetch {
            sql = dialect.fetch_first(sql, fetch.rows, fetch.offset);
        }

        if self.isolation != IsolationLevel::Unspecified || self.lock.is_some() {
            if dialect.supports_isolation_level_in_query() {
                sql = dialect.isolation_level_sql(sql, self.isolation, self.lock);
            } else {
                warn!(
                    dialect = dialect.name(),
                    isolation = ?self.isolation,
                    "Isolation level ignored by dialect"
                );
            }
        }

        Ok(sql)
    }

    /// Bound values, in the order of [`Self::sql_impl`].
    pub(crate) fn args(&self, outer: &Scope) -> Result<Vec<SqlValue>> {
        let scope = self.inner_scope(outer);
        let mut args = Vec::new();

        if outer.is_outermost() {
            let cte_scope = outer.enter();
            for cte in &self.ctes {
                args.extend(cte.args(&cte_scope)?);
            }
        }

        args.extend(self.columns.args(&scope)?);
        args.extend(self.from.args(&scope)?);
        args.extend(self.where_clause.args(&scope)?);
        for expression in &self.group_by {
            args.extend(expression.args(&scope)?);
        }
        args.extend(self.having.args(&scope)?);

        let sibling_scope = outer.enter();
        for (_, sibling) in &self.unions {
            args.extend(sibling.args(&sibling_scope)?);
        }

        for order in &self.order_by {
            args.extend(order.args(&scope)?);
        }
        Ok(args)
    }

    /// Output labels of the projection.
    pub(crate) fn labels(&self, outer: &Scope) -> Result<Vec<String>> {
        self.columns.labels(&self.inner_scope(outer))
    }

    /// Number of output columns.
    pub(crate) fn width(&self) -> usize {
        self.columns.width()
    }
}

impl fmt::Debug for SelectNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectNode")
            .field("label", &self.label)
            .field("scope", &self.scope)
            .field("width", &self.width())
            .finish_non_exhaustive()
    }
}

/// A built select statement producing rows of type `RT`.
pub struct Select<RT> {
    node: Arc<SelectNode>,
    mapper: MapperFn<RT>,
}

impl<RT> Clone for Select<RT> {
    fn clone(&self) -> Self {
        Self {
            node: Arc::clone(&self.node),
            mapper: Arc::clone(&self.mapper),
        }
    }
}

impl<RT> fmt::Debug for Select<RT> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Select").field(&self.node).finish()
    }
}

impl<RT> Select<RT> {
    pub(crate) fn new(node: SelectNode, mapper: MapperFn<RT>) -> Self {
        Self {
            node: Arc::new(node),
            mapper,
        }
    }

    pub(crate) fn node(&self) -> &Arc<SelectNode> {
        &self.node
    }

    fn outermost(&self) -> Scope {
        self.node.scope.empty()
    }

    /// Renders the statement as a top-level query.
    ///
    /// # Errors
    ///
    /// Returns a resolution error if a reference cannot be resolved.
    pub fn sql(&self) -> Result<String> {
        self.node.sql_impl(&self.outermost())
    }

    /// Bound values, one per placeholder of [`Self::sql`].
    ///
    /// # Errors
    ///
    /// Returns a resolution error if a reference cannot be resolved.
    pub fn args(&self) -> Result<Vec<SqlValue>> {
        self.node.args(&self.outermost())
    }

    /// Output labels of the projection.
    ///
    /// # Errors
    ///
    /// Returns a resolution error if a reference cannot be resolved.
    pub fn labels(&self) -> Result<Vec<String>> {
        self.node.labels(&self.outermost())
    }

    /// The synthetic label used when the statement is a scalar subquery.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.node.label
    }

    /// The statement's own scope.
    #[must_use]
    pub fn scope(&self) -> &Scope {
        &self.node.scope
    }
}

impl<RT: 'static> Select<RT> {
    /// Mapper turning one result row of this statement into an `RT`.
    ///
    /// # Errors
    ///
    /// Returns a resolution error if a column label cannot be derived.
    pub fn row_mapper(&self) -> Result<RowMapper<RT>> {
        let scope = self.outermost().plus_scope(&self.node.scope);
        Ok((self.mapper)(&scope)?.mapper("", None))
    }

    /// Uses the statement as a FROM or JOIN source named `name`.
    ///
    /// Its output columns are addressed by label with [`Alias::column`].
    #[must_use]
    pub fn as_alias(&self, name: &str) -> Alias<RT> {
        Alias::subselect(Arc::clone(&self.node), Arc::clone(&self.mapper), name)
    }
}

impl<RT: Send + 'static> Select<RT> {
    /// Runs the statement and maps every row.
    ///
    /// # Errors
    ///
    /// Returns resolution, database and mapping errors.
    pub async fn list<E: Executor>(&self, executor: &E) -> Result<Vec<RT>> {
        let sql = self.sql()?;
        let args = self.args()?;
        let mapper = self.row_mapper()?;
        debug!(sql = %sql, args = args.len(), "Executing select");
        executor.query(&sql, &args, &mapper).await
    }

    /// Runs the statement and returns its only row.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::NoRows`] or [`crate::Error::TooManyRows`] when
    /// the statement does not return exactly one row.
    pub async fn single<E: Executor>(&self, executor: &E) -> Result<RT> {
        expect_single(self.list(executor).await?)
    }

    /// Runs the statement and returns its row, if any.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::TooManyRows`] when the statement returns more
    /// than one row.
    pub async fn optional<E: Executor>(&self, executor: &E) -> Result<Option<RT>> {
        expect_optional(self.list(executor).await?)
    }
}

impl<RT> Expression for Select<RT> {
    fn sql(&self, scope: &Scope) -> Result<String> {
        self.node.sql(scope)
    }

    fn args(&self, scope: &Scope) -> Result<Vec<SqlValue>> {
        self.node.args(scope)
    }

    fn label(&self, _scope: &Scope) -> Result<String> {
        Ok(self.node.label.clone())
    }
}

impl<RT: FromSqlValue + 'static> TypedExpression<RT> for Select<RT> {
    fn row_mapper_factory(&self, _scope: &Scope) -> Result<RowMapperFactory<RT>> {
        Ok(RowMapperFactory::scalar(self.node.label.clone()))
    }
}

impl<RT: FromSqlValue + 'static> IntoExpression<RT> for Select<RT> {
    type Expr = Self;

    fn into_expression(self) -> Self::Expr {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_union_keywords() {
        assert_eq!(UnionType::Union.as_sql(), "union");
        assert_eq!(UnionType::UnionAll.as_sql(), "union all");
    }
}
