//! Window functions: `name(args) over (partition by ... order by ...)`.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::error::Result;
use crate::label::next_label;
use crate::row::RowMapperFactory;
use crate::scope::Scope;
use crate::select::Order;
use crate::value::{FromSqlValue, SqlValue};

use super::{precedence, Expression, IntoExpression, TypedExpression};

/// A window function call. The window starts empty, `over ()`, and is
/// narrowed with [`WindowFunction::partition_by`] and
/// [`WindowFunction::order_by`].
///
/// Bound values follow the text: arguments, partition terms, order terms.
#[must_use]
pub struct WindowFunction<T> {
    name: &'static str,
    args: Vec<Arc<dyn Expression>>,
    partition_by: Vec<Arc<dyn Expression>>,
    order_by: Vec<(Arc<dyn Expression>, Order)>,
    label: String,
    _type: PhantomData<fn() -> T>,
}

impl<T> WindowFunction<T> {
    fn new(name: &'static str, args: Vec<Arc<dyn Expression>>) -> Self {
        Self {
            name,
            args,
            partition_by: Vec::new(),
            order_by: Vec::new(),
            label: next_label(name),
            _type: PhantomData,
        }
    }

    /// Adds a `partition by` term.
    pub fn partition_by<U, E: IntoExpression<U>>(mut self, expression: E) -> Self {
        self.partition_by.push(Arc::new(expression.into_expression()));
        self
    }

    /// Adds an `order by` term.
    pub fn order_by<U, E: IntoExpression<U>>(mut self, expression: E, order: Order) -> Self {
        let expression: Arc<dyn Expression> = Arc::new(expression.into_expression());
        self.order_by.push((expression, order));
        self
    }

    fn window_sql(&self, scope: &Scope) -> Result<String> {
        let mut clauses = Vec::new();
        if !self.partition_by.is_empty() {
            let terms = self
                .partition_by
                .iter()
                .map(|e| e.sql(scope))
                .collect::<Result<Vec<_>>>()?;
            clauses.push(format!("partition by {}", terms.join(", ")));
        }
        if !self.order_by.is_empty() {
            let terms = self
                .order_by
                .iter()
                .map(|(e, order)| Ok(format!("{} {}", e.sql(scope)?, order.as_sql())))
                .collect::<Result<Vec<_>>>()?;
            clauses.push(format!("order by {}", terms.join(", ")));
        }
        Ok(clauses.join(" "))
    }
}

impl<T> Clone for WindowFunction<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            args: self.args.clone(),
            partition_by: self.partition_by.clone(),
            order_by: self.order_by.clone(),
            label: self.label.clone(),
            _type: PhantomData,
        }
    }
}

impl<T> fmt::Debug for WindowFunction<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WindowFunction")
            .field("name", &self.name)
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

impl<T> Expression for WindowFunction<T> {
    fn sql(&self, scope: &Scope) -> Result<String> {
        let args = self
            .args
            .iter()
            .map(|a| a.sql(scope))
            .collect::<Result<Vec<_>>>()?;
        Ok(format!(
            "{}({}) over ({})",
            self.name,
            args.join(", "),
            self.window_sql(scope)?
        ))
    }

    fn args(&self, scope: &Scope) -> Result<Vec<SqlValue>> {
        let mut args = Vec::new();
        for expression in self.args.iter().chain(&self.partition_by) {
            args.extend(expression.args(scope)?);
        }
        for (expression, _) in &self.order_by {
            args.extend(expression.args(scope)?);
        }
        Ok(args)
    }

    fn label(&self, _scope: &Scope) -> Result<String> {
        Ok(self.label.clone())
    }

    fn precedence(&self) -> u8 {
        precedence::UNARY
    }
}

impl<T: FromSqlValue + 'static> TypedExpression<T> for WindowFunction<T> {
    fn row_mapper_factory(&self, _scope: &Scope) -> Result<RowMapperFactory<T>> {
        Ok(RowMapperFactory::scalar(self.label.clone()))
    }
}

impl<T: FromSqlValue + 'static> IntoExpression<T> for WindowFunction<T> {
    type Expr = Self;

    fn into_expression(self) -> Self::Expr {
        self
    }
}

fn arg<T, E: IntoExpression<T>>(expression: E) -> Arc<dyn Expression> {
    Arc::new(expression.into_expression())
}

/// `row_number() over (...)`
pub fn row_number() -> WindowFunction<i64> {
    WindowFunction::new("row_number", Vec::new())
}

/// `sum(x) over (...)`
pub fn sum_over<T, E: IntoExpression<T>>(x: E) -> WindowFunction<T> {
    WindowFunction::new("sum", vec![arg(x)])
}

/// `first_value(x) over (...)`
pub fn first_value<T, E: IntoExpression<T>>(x: E) -> WindowFunction<T> {
    WindowFunction::new("first_value", vec![arg(x)])
}

/// `last_value(x) over (...)`
pub fn last_value<T, E: IntoExpression<T>>(x: E) -> WindowFunction<T> {
    WindowFunction::new("last_value", vec![arg(x)])
}

/// `lag(x) over (...)`: the value of the previous row, NULL on the first.
pub fn lag<T, E: IntoExpression<T>>(x: E) -> WindowFunction<Option<T>> {
    WindowFunction::new("lag", vec![arg(x)])
}

/// `lead(x) over (...)`: the value of the next row, NULL on the last.
pub fn lead<T, E: IntoExpression<T>>(x: E) -> WindowFunction<Option<T>> {
    WindowFunction::new("lead", vec![arg(x)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Database;
    use crate::expr::{literal, upper, value};

    #[test]
    fn test_empty_window() {
        let scope = Database::builder().build().scope();
        let r = row_number();
        assert_eq!(r.sql(&scope).unwrap(), "row_number() over ()");
        assert!(r.args(&scope).unwrap().is_empty());
        assert!(r.label(&scope).unwrap().starts_with("row_number_"));
        assert_eq!(r.precedence(), precedence::UNARY);
    }

    #[test]
    fn test_window_args_follow_text_order() {
        let scope = Database::builder().build().scope();
        let s = sum_over(value(3_i64))
            .partition_by(upper(value(String::from("a"))))
            .partition_by(literal(1_i64))
            .order_by(value(2_i64), Order::Desc)
            .order_by(literal(String::from("x")), Order::Asc);

        assert_eq!(
            s.sql(&scope).unwrap(),
            "sum(?) over (partition by upper(?), 1 order by ? desc, 'x' asc)"
        );
        assert_eq!(
            s.args(&scope).unwrap(),
            vec![
                SqlValue::Int(3),
                SqlValue::Text(String::from("a")),
                SqlValue::Int(2),
            ]
        );
    }

    #[test]
    fn test_order_only_window() {
        let scope = Database::builder().build().scope();
        let l = lag(literal(5_i64)).order_by(literal(1_i64), Order::Asc);
        assert_eq!(l.sql(&scope).unwrap(), "lag(5) over (order by 1 asc)");
    }
}
