//! Type conversions with `cast`.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::dialect::SqlType;
use crate::error::Result;
use crate::label::next_label;
use crate::row::RowMapperFactory;
use crate::scope::Scope;
use crate::value::{FromSqlValue, SqlValue};

use super::{precedence, Expression, IntoExpression, TypedExpression};

/// An expression awaiting its target type.
///
/// ```ignore
/// let id_text = cast(p.col(Salesperson::id())).as_varchar(10);
/// // cast(p.ID as varchar(10))
/// ```
#[must_use]
pub struct CastBuilder {
    operand: Arc<dyn Expression>,
}

/// Starts a `cast(x as <type>)` expression.
pub fn cast<S, E: IntoExpression<S>>(operand: E) -> CastBuilder {
    CastBuilder {
        operand: Arc::new(operand.into_expression()),
    }
}

impl CastBuilder {
    fn to<T>(&self, target: SqlType) -> Cast<T> {
        Cast {
            operand: Arc::clone(&self.operand),
            target,
            label: next_label("cast"),
            _type: PhantomData,
        }
    }

    /// `cast(x as integer)`
    pub fn as_integer(&self) -> Cast<i32> {
        self.to(SqlType::Integer)
    }

    /// `cast(x as bigint)`
    pub fn as_bigint(&self) -> Cast<i64> {
        self.to(SqlType::BigInt)
    }

    /// `cast(x as double precision)`
    pub fn as_double(&self) -> Cast<f64> {
        self.to(SqlType::Double)
    }

    /// `cast(x as varchar(length))`
    pub fn as_varchar(&self, length: u32) -> Cast<String> {
        self.to(SqlType::Varchar(length))
    }

    /// `cast(x as char(length))`
    pub fn as_char(&self, length: u32) -> Cast<String> {
        self.to(SqlType::Char(length))
    }

    /// `cast(x as date)`, read back as text.
    pub fn as_date(&self) -> Cast<String> {
        self.to(SqlType::Date)
    }

    /// `cast(x as timestamp)`, read back as text.
    pub fn as_timestamp(&self) -> Cast<String> {
        self.to(SqlType::Timestamp)
    }
}

impl fmt::Debug for CastBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CastBuilder").finish_non_exhaustive()
    }
}

/// `cast(x as <type>)`, with the type spelled by the dialect.
#[must_use]
pub struct Cast<T> {
    operand: Arc<dyn Expression>,
    target: SqlType,
    label: String,
    _type: PhantomData<fn() -> T>,
}

impl<T> Cast<T> {
    /// The target type.
    #[must_use]
    pub const fn target(&self) -> SqlType {
        self.target
    }
}

impl<T> Clone for Cast<T> {
    fn clone(&self) -> Self {
        Self {
            operand: Arc::clone(&self.operand),
            target: self.target,
            label: self.label.clone(),
            _type: PhantomData,
        }
    }
}

impl<T> fmt::Debug for Cast<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cast")
            .field("target", &self.target)
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

impl<T> Expression for Cast<T> {
    fn sql(&self, scope: &Scope) -> Result<String> {
        Ok(format!(
            "cast({} as {})",
            self.operand.sql(scope)?,
            scope.dialect().type_sql(self.target)
        ))
    }

    fn args(&self, scope: &Scope) -> Result<Vec<SqlValue>> {
        self.operand.args(scope)
    }

    fn label(&self, _scope: &Scope) -> Result<String> {
        Ok(self.label.clone())
    }

    fn precedence(&self) -> u8 {
        precedence::UNARY
    }
}

impl<T: FromSqlValue + 'static> TypedExpression<T> for Cast<T> {
    fn row_mapper_factory(&self, _scope: &Scope) -> Result<RowMapperFactory<T>> {
        Ok(RowMapperFactory::scalar(self.label.clone()))
    }
}

impl<T: FromSqlValue + 'static> IntoExpression<T> for Cast<T> {
    type Expr = Self;

    fn into_expression(self) -> Self::Expr {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Database;
    use crate::dialect::Db2Dialect;
    use crate::expr::{value, ExpressionExt};

    #[test]
    fn test_cast_renders_dialect_type() {
        let ansi = Database::builder().build().scope();
        let db2 = Database::builder().dialect(Db2Dialect::new()).build().scope();

        let c = cast(value(String::from("2.5"))).as_double();
        assert_eq!(c.sql(&ansi).unwrap(), "cast(? as double precision)");
        assert_eq!(c.sql(&db2).unwrap(), "cast(? as double)");
        assert_eq!(
            c.args(&ansi).unwrap(),
            vec![SqlValue::Text(String::from("2.5"))]
        );
        assert!(c.label(&ansi).unwrap().starts_with("cast_"));
        assert_eq!(c.target(), SqlType::Double);
    }

    #[test]
    fn test_cast_operand_keeps_its_args() {
        let scope = Database::builder().build().scope();
        let c = cast(value(4_i64).plus(1_i64)).as_varchar(5);
        assert_eq!(c.sql(&scope).unwrap(), "cast(? + ? as varchar(5))");
        assert_eq!(
            c.args(&scope).unwrap(),
            vec![SqlValue::Int(4), SqlValue::Int(1)]
        );
    }
}
