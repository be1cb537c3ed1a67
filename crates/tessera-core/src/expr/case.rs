//! Searched `case` expressions.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::error::Result;
use crate::label::next_label;
use crate::row::RowMapperFactory;
use crate::scope::Scope;
use crate::value::{FromSqlValue, SqlValue};

use super::{precedence, Condition, Expression, IntoExpression, TypedExpression};

/// `case when c1 then v1 [when c2 then v2 ...] [else e] end`
///
/// Bound values follow the text: each condition then its result, then the
/// `else` result.
#[must_use]
pub struct CaseExpression<T> {
    branches: Vec<(Condition, Arc<dyn Expression>)>,
    otherwise: Option<Arc<dyn Expression>>,
    label: String,
    _type: PhantomData<fn() -> T>,
}

impl<T> CaseExpression<T> {
    /// Adds a `when condition then result` branch.
    #[must_use]
    pub fn when<E: IntoExpression<T>>(mut self, condition: Condition, result: E) -> Self {
        let result: Arc<dyn Expression> = Arc::new(result.into_expression());
        self.branches.push((condition, result));
        self
    }

    /// Sets the `else` result. Without one, unmatched rows yield NULL.
    #[must_use]
    pub fn otherwise<E: IntoExpression<T>>(mut self, result: E) -> Self {
        self.otherwise = Some(Arc::new(result.into_expression()));
        self
    }
}

/// Starts a `case` expression with its first branch.
pub fn case_when<T, E: IntoExpression<T>>(condition: Condition, result: E) -> CaseExpression<T> {
    CaseExpression {
        branches: Vec::new(),
        otherwise: None,
        label: next_label("case"),
        _type: PhantomData,
    }
    .when(condition, result)
}

impl<T> Clone for CaseExpression<T> {
    fn clone(&self) -> Self {
        Self {
            branches: self.branches.clone(),
            otherwise: self.otherwise.clone(),
            label: self.label.clone(),
            _type: PhantomData,
        }
    }
}

impl<T> fmt::Debug for CaseExpression<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CaseExpression")
            .field("branches", &self.branches.len())
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

impl<T> Expression for CaseExpression<T> {
    fn sql(&self, scope: &Scope) -> Result<String> {
        let mut sql = String::from("case");
        for (condition, result) in &self.branches {
            sql.push_str(&format!(
                " when {} then {}",
                condition.sql(scope)?,
                result.sql(scope)?
            ));
        }
        if let Some(otherwise) = &self.otherwise {
            sql.push_str(&format!(" else {}", otherwise.sql(scope)?));
        }
        sql.push_str(" end");
        Ok(sql)
    }

    fn args(&self, scope: &Scope) -> Result<Vec<SqlValue>> {
        let mut args = Vec::new();
        for (condition, result) in &self.branches {
            args.extend(condition.args(scope)?);
            args.extend(result.args(scope)?);
        }
        if let Some(otherwise) = &self.otherwise {
            args.extend(otherwise.args(scope)?);
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

impl<T: FromSqlValue + 'static> TypedExpression<T> for CaseExpression<T> {
    fn row_mapper_factory(&self, _scope: &Scope) -> Result<RowMapperFactory<T>> {
        Ok(RowMapperFactory::scalar(self.label.clone()))
    }
}

impl<T: FromSqlValue + 'static> IntoExpression<T> for CaseExpression<T> {
    type Expr = Self;

    fn into_expression(self) -> Self::Expr {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Database;
    use crate::expr::{literal, value, ExpressionExt};

    #[test]
    fn test_case_args_follow_text_order() {
        let scope = Database::builder().build().scope();
        let size = value(5_i64);
        let case = case_when(size.clone().lt(10_i64), value(String::from("small")))
            .when(size.lt(literal(100_i64)), literal(String::from("medium")))
            .otherwise(value(String::from("large")));

        assert_eq!(
            case.sql(&scope).unwrap(),
            "case when ? < ? then ? when ? < 100 then 'medium' else ? end"
        );
        assert_eq!(
            case.args(&scope).unwrap(),
            vec![
                SqlValue::Int(5),
                SqlValue::Int(10),
                SqlValue::Text(String::from("small")),
                SqlValue::Int(5),
                SqlValue::Text(String::from("large")),
            ]
        );
        assert!(case.label(&scope).unwrap().starts_with("case_"));
        assert_eq!(case.precedence(), precedence::UNARY);
    }

    #[test]
    fn test_case_without_else() {
        let scope = Database::builder().build().scope();
        let case: CaseExpression<i64> = case_when(literal(1_i64).eq(1_i64), literal(2_i64));
        assert_eq!(case.sql(&scope).unwrap(), "case when 1 = ? then 2 end");
        assert_eq!(case.args(&scope).unwrap(), vec![SqlValue::Int(1)]);
    }
}
