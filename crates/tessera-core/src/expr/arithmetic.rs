//! Arithmetic and string concatenation.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::error::Result;
use crate::label::next_label;
use crate::row::RowMapperFactory;
use crate::scope::Scope;
use crate::value::{FromSqlValue, SqlValue};

use super::{collect_args, operand_sql, precedence, Expression, IntoExpression, TypedExpression};

/// Binary arithmetic operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticOp {
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Times,
    /// `/`
    DividedBy,
}

impl ArithmeticOp {
    const fn symbol(self) -> &'static str {
        match self {
            Self::Plus => "+",
            Self::Minus => "-",
            Self::Times => "*",
            Self::DividedBy => "/",
        }
    }

    const fn name(self) -> &'static str {
        match self {
            Self::Plus => "plus",
            Self::Minus => "minus",
            Self::Times => "times",
            Self::DividedBy => "divided_by",
        }
    }

    const fn precedence(self) -> u8 {
        match self {
            Self::Plus | Self::Minus => precedence::ADDITIVE,
            Self::Times | Self::DividedBy => precedence::MULTIPLICATIVE,
        }
    }
}

/// `lhs <op> rhs`
pub struct Arithmetic<T> {
    lhs: Arc<dyn Expression>,
    op: ArithmeticOp,
    rhs: Arc<dyn Expression>,
    label: String,
    _type: PhantomData<fn() -> T>,
}

impl<T> Arithmetic<T> {
    pub(crate) fn new<L, R>(lhs: L, op: ArithmeticOp, rhs: R) -> Self
    where
        L: Expression + 'static,
        R: Expression + 'static,
    {
        Self {
            lhs: Arc::new(lhs),
            op,
            rhs: Arc::new(rhs),
            label: next_label(op.name()),
            _type: PhantomData,
        }
    }
}

impl<T> Clone for Arithmetic<T> {
    fn clone(&self) -> Self {
        Self {
            lhs: Arc::clone(&self.lhs),
            op: self.op,
            rhs: Arc::clone(&self.rhs),
            label: self.label.clone(),
            _type: PhantomData,
        }
    }
}

impl<T> fmt::Debug for Arithmetic<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arithmetic")
            .field("op", &self.op)
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

impl<T> Expression for Arithmetic<T> {
    fn sql(&self, scope: &Scope) -> Result<String> {
        let own = self.op.precedence();
        // The right operand needs parentheses at equal precedence: a - (b - c)
        Ok(format!(
            "{} {} {}",
            operand_sql(&*self.lhs, scope, own)?,
            self.op.symbol(),
            operand_sql(&*self.rhs, scope, own + 1)?
        ))
    }

    fn args(&self, scope: &Scope) -> Result<Vec<SqlValue>> {
        collect_args([&*self.lhs, &*self.rhs], scope)
    }

    fn label(&self, _scope: &Scope) -> Result<String> {
        Ok(self.label.clone())
    }

    fn precedence(&self) -> u8 {
        self.op.precedence()
    }
}

impl<T: FromSqlValue + 'static> TypedExpression<T> for Arithmetic<T> {
    fn row_mapper_factory(&self, _scope: &Scope) -> Result<RowMapperFactory<T>> {
        Ok(RowMapperFactory::scalar(self.label.clone()))
    }
}

impl<T: FromSqlValue + 'static> IntoExpression<T> for Arithmetic<T> {
    type Expr = Self;

    fn into_expression(self) -> Self::Expr {
        self
    }
}

/// String concatenation of two or more expressions.
#[derive(Clone)]
pub struct Concat {
    parts: Vec<Arc<dyn Expression>>,
    label: String,
}

impl Concat {
    pub(crate) fn new<L, R>(lhs: L, rhs: R) -> Self
    where
        L: Expression + 'static,
        R: Expression + 'static,
    {
        Self {
            parts: vec![Arc::new(lhs), Arc::new(rhs)],
            label: next_label("concat"),
        }
    }

    /// Appends another part.
    #[must_use]
    pub fn concat<E: IntoExpression<String>>(mut self, part: E) -> Self {
        self.parts.push(Arc::new(part.into_expression()));
        self
    }
}

impl fmt::Debug for Concat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Concat")
            .field("parts", &self.parts.len())
            .field("label", &self.label)
            .finish()
    }
}

impl Expression for Concat {
    fn sql(&self, scope: &Scope) -> Result<String> {
        let parts = self
            .parts
            .iter()
            .map(|p| operand_sql(&**p, scope, precedence::ADDITIVE + 1))
            .collect::<Result<Vec<_>>>()?;
        Ok(scope.dialect().concat(&parts))
    }

    fn args(&self, scope: &Scope) -> Result<Vec<SqlValue>> {
        collect_args(self.parts.iter().map(|p| &**p), scope)
    }

    fn label(&self, _scope: &Scope) -> Result<String> {
        Ok(self.label.clone())
    }

    fn precedence(&self) -> u8 {
        precedence::ADDITIVE
    }
}

impl TypedExpression<String> for Concat {
    fn row_mapper_factory(&self, _scope: &Scope) -> Result<RowMapperFactory<String>> {
        Ok(RowMapperFactory::scalar(self.label.clone()))
    }
}

impl IntoExpression<String> for Concat {
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
    fn test_arithmetic_precedence() {
        let scope = Database::builder().build().scope();
        let sum = value(1_i64).plus(literal(2_i64));
        assert_eq!(sum.sql(&scope).unwrap(), "? + 2");

        let product = sum.times(value(3_i64));
        assert_eq!(product.sql(&scope).unwrap(), "(? + 2) * ?");
        assert_eq!(
            product.args(&scope).unwrap(),
            vec![SqlValue::Int(1), SqlValue::Int(3)]
        );
    }

    #[test]
    fn test_right_operand_grouping() {
        let scope = Database::builder().build().scope();
        let inner = literal(2_i64).minus(literal(3_i64));
        let outer = literal(1_i64).minus(inner);
        assert_eq!(outer.sql(&scope).unwrap(), "1 - (2 - 3)");
    }

    #[test]
    fn test_concat_uses_dialect() {
        let scope = Database::builder().build().scope();
        let c = value(String::from("a"))
            .concat(literal(String::from("b")))
            .concat("c");
        assert_eq!(c.sql(&scope).unwrap(), "? || 'b' || ?");
        assert_eq!(c.args(&scope).unwrap().len(), 2);
        assert!(c.label(&scope).unwrap().starts_with("concat_"));
    }
}
