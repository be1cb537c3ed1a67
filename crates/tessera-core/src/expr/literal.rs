//! Bound values and inline literals.

use std::fmt;
use std::marker::PhantomData;

use crate::error::Result;
use crate::label::next_label;
use crate::row::RowMapperFactory;
use crate::scope::Scope;
use crate::value::{FromSqlValue, SqlValue, ToSqlValue};

use super::{Expression, IntoExpression, TypedExpression};

/// A value rendered as a `?` placeholder and bound as a parameter.
pub struct ValueExpression<T> {
    value: SqlValue,
    label: String,
    _type: PhantomData<fn() -> T>,
}

impl<T> ValueExpression<T> {
    /// Wraps a value.
    pub fn new(value: T) -> Self
    where
        T: ToSqlValue,
    {
        Self {
            value: value.to_sql_value(),
            label: next_label("value"),
            _type: PhantomData,
        }
    }
}

impl<T> Clone for ValueExpression<T> {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
            label: self.label.clone(),
            _type: PhantomData,
        }
    }
}

impl<T> fmt::Debug for ValueExpression<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ValueExpression").field(&self.value).finish()
    }
}

impl<T> Expression for ValueExpression<T> {
    fn sql(&self, _scope: &Scope) -> Result<String> {
        Ok(String::from("?"))
    }

    fn args(&self, _scope: &Scope) -> Result<Vec<SqlValue>> {
        Ok(vec![self.value.clone()])
    }

    fn label(&self, _scope: &Scope) -> Result<String> {
        Ok(self.label.clone())
    }
}

impl<T: FromSqlValue + 'static> TypedExpression<T> for ValueExpression<T> {
    fn row_mapper_factory(&self, _scope: &Scope) -> Result<RowMapperFactory<T>> {
        Ok(RowMapperFactory::scalar(self.label.clone()))
    }
}

impl<T: FromSqlValue + 'static> IntoExpression<T> for ValueExpression<T> {
    type Expr = Self;

    fn into_expression(self) -> Self::Expr {
        self
    }
}

/// A value rendered inline into the SQL text.
pub struct LiteralExpression<T> {
    value: SqlValue,
    label: String,
    _type: PhantomData<fn() -> T>,
}

impl<T> LiteralExpression<T> {
    /// Wraps a value.
    pub fn new(value: T) -> Self
    where
        T: ToSqlValue,
    {
        Self {
            value: value.to_sql_value(),
            label: next_label("literal"),
            _type: PhantomData,
        }
    }
}

impl<T> Clone for LiteralExpression<T> {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
            label: self.label.clone(),
            _type: PhantomData,
        }
    }
}

impl<T> fmt::Debug for LiteralExpression<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("LiteralExpression")
            .field(&self.value)
            .finish()
    }
}

impl<T> Expression for LiteralExpression<T> {
    fn sql(&self, _scope: &Scope) -> Result<String> {
        self.value.to_sql_inline()
    }

    fn args(&self, _scope: &Scope) -> Result<Vec<SqlValue>> {
        Ok(Vec::new())
    }

    fn label(&self, _scope: &Scope) -> Result<String> {
        Ok(self.label.clone())
    }
}

impl<T: FromSqlValue + 'static> TypedExpression<T> for LiteralExpression<T> {
    fn row_mapper_factory(&self, _scope: &Scope) -> Result<RowMapperFactory<T>> {
        Ok(RowMapperFactory::scalar(self.label.clone()))
    }
}

impl<T: FromSqlValue + 'static> IntoExpression<T> for LiteralExpression<T> {
    type Expr = Self;

    fn into_expression(self) -> Self::Expr {
        self
    }
}

/// A bound parameter.
pub fn value<T: ToSqlValue>(value: T) -> ValueExpression<T> {
    ValueExpression::new(value)
}

/// An inline literal.
pub fn literal<T: ToSqlValue>(value: T) -> LiteralExpression<T> {
    LiteralExpression::new(value)
}

macro_rules! impl_into_value_expression {
    ($($ty:ty),+) => {
        $(
            impl IntoExpression<$ty> for $ty {
                type Expr = ValueExpression<$ty>;

                fn into_expression(self) -> Self::Expr {
                    ValueExpression::new(self)
                }
            }

            impl IntoExpression<Option<$ty>> for $ty {
                type Expr = ValueExpression<Option<$ty>>;

                fn into_expression(self) -> Self::Expr {
                    ValueExpression::new(Some(self))
                }
            }

            impl IntoExpression<Option<$ty>> for Option<$ty> {
                type Expr = ValueExpression<Option<$ty>>;

                fn into_expression(self) -> Self::Expr {
                    ValueExpression::new(self)
                }
            }
        )+
    };
}

impl_into_value_expression!(bool, i64, i32, i16, i8, u32, u16, u8, f64, String, Vec<u8>);

impl IntoExpression<String> for &str {
    type Expr = ValueExpression<String>;

    fn into_expression(self) -> Self::Expr {
        ValueExpression::new(self.to_string())
    }
}

impl IntoExpression<Option<String>> for &str {
    type Expr = ValueExpression<Option<String>>;

    fn into_expression(self) -> Self::Expr {
        ValueExpression::new(Some(self.to_string()))
    }
}
