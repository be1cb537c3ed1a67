//! ORDER BY and row limit clauses.

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::expr::Expression;
use crate::scope::Scope;
use crate::value::SqlValue;

/// Sort direction and null placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Order {
    /// `asc`
    #[default]
    Asc,
    /// `desc`
    Desc,
    /// `asc nulls first`
    AscNullsFirst,
    /// `asc nulls last`
    AscNullsLast,
    /// `desc nulls first`
    DescNullsFirst,
    /// `desc nulls last`
    DescNullsLast,
}

impl Order {
    /// Returns the SQL keywords for this order.
    #[must_use]
    pub const fn as_sql(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
            Self::AscNullsFirst => "asc nulls first",
            Self::AscNullsLast => "asc nulls last",
            Self::DescNullsFirst => "desc nulls first",
            Self::DescNullsLast => "desc nulls last",
        }
    }
}

#[derive(Clone)]
pub(crate) enum OrderTarget {
    Expression(Arc<dyn Expression>),
    /// 1-based position in the projection.
    Position(usize),
    /// Output label of the projection.
    Column(String),
}

/// One ORDER BY term, resolved when the statement is rendered.
#[derive(Clone)]
pub(crate) struct OrderBy {
    target: OrderTarget,
    order: Order,
}

impl OrderBy {
    pub(crate) const fn new(target: OrderTarget, order: Order) -> Self {
        Self { target, order }
    }

    pub(crate) fn sql(&self, scope: &Scope, labels: &[String]) -> Result<String> {
        let target = match &self.target {
            OrderTarget::Expression(expression) => expression.sql(scope)?,
            OrderTarget::Position(position) => {
                if *position == 0 || *position > labels.len() {
                    return Err(Error::NoSuchColumn {
                        source_name: String::from("projection"),
                        column: position.to_string(),
                    });
                }
                position.to_string()
            }
            OrderTarget::Column(label) => labels
                .iter()
                .find(|l| l.eq_ignore_ascii_case(label))
                .cloned()
                .ok_or_else(|| Error::NoSuchColumn {
                    source_name: String::from("projection"),
                    column: label.clone(),
                })?,
        };
        Ok(format!("{target} {}", self.order.as_sql()))
    }

    pub(crate) fn args(&self, scope: &Scope) -> Result<Vec<SqlValue>> {
        match &self.target {
            OrderTarget::Expression(expression) => expression.args(scope),
            OrderTarget::Position(_) | OrderTarget::Column(_) => Ok(Vec::new()),
        }
    }
}

/// A row limit with an optional offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Fetch {
    pub(crate) rows: u64,
    pub(crate) offset: Option<u64>,
}

impl Fetch {
    pub(crate) const fn first(rows: u64) -> Self {
        Self { rows, offset: None }
    }

    /// The `index`-th page (0-based) of `size` rows. Offsets past `u64::MAX`
    /// saturate.
    pub(crate) const fn page(index: u64, size: u64) -> Self {
        Self {
            rows: size,
            offset: Some(index.saturating_mul(size)),
        }
    }
}
