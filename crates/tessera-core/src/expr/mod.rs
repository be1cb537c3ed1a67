//! Typed SQL expressions.
//!
//! Every node renders its text and its bound values against a [`Scope`], in
//! the same left-to-right order, so that the i-th `?` in the text always
//! matches the i-th value.

mod arithmetic;
mod case;
mod cast;
mod column;
mod condition;
mod function;
mod literal;
mod window;

use std::sync::Arc;

use crate::error::Result;
use crate::row::RowMapperFactory;
use crate::scope::Scope;
use crate::select::Select;
use crate::value::SqlValue;

pub use arithmetic::{Arithmetic, ArithmeticOp, Concat};
pub use case::{case_when, CaseExpression};
pub use cast::{cast, Cast, CastBuilder};
pub use column::{ColumnRef, LabelColumn};
pub use condition::{exists, not, not_exists, Condition, ForeignKeyJoin};
pub use function::{
    abs, add_days, avg, coalesce, count, count_distinct, current_timestamp, instr, length, lower,
    max, min, substr, substr_for, sum, trim, upper, year, FunctionCall,
};
pub use literal::{literal, value, LiteralExpression, ValueExpression};
pub use window::{first_value, lag, last_value, lead, row_number, sum_over, WindowFunction};

pub(crate) use condition::{BoolOp, BooleanChain, ForeignKeyCondition};

/// Binding strength of rendered operators; higher binds tighter.
pub mod precedence {
    /// `or`
    pub const OR: u8 = 10;
    /// `and`
    pub const AND: u8 = 20;
    /// `not`
    pub const NOT: u8 = 30;
    /// Comparisons, `like`, `between`, `in`, `is null`.
    pub const COMPARISON: u8 = 40;
    /// `+`, `-` and concatenation.
    pub const ADDITIVE: u8 = 50;
    /// `*` and `/`.
    pub const MULTIPLICATIVE: u8 = 60;
    /// Unary operators.
    pub const UNARY: u8 = 70;
    /// Columns, values, function calls and parenthesized subqueries.
    pub const ATOM: u8 = 100;
}

/// A node that renders SQL text and its bound values.
pub trait Expression: Send + Sync {
    /// Renders the SQL text.
    ///
    /// # Errors
    ///
    /// Returns an error if a reference cannot be resolved in `scope`.
    fn sql(&self, scope: &Scope) -> Result<String>;

    /// Bound values, in the order their placeholders appear in [`Self::sql`].
    ///
    /// # Errors
    ///
    /// Returns an error if a reference cannot be resolved in `scope`.
    fn args(&self, scope: &Scope) -> Result<Vec<SqlValue>>;

    /// Default output label when selected without an explicit one.
    ///
    /// # Errors
    ///
    /// Returns an error if a reference cannot be resolved in `scope`.
    fn label(&self, scope: &Scope) -> Result<String>;

    /// Binding strength of the outermost operator.
    fn precedence(&self) -> u8 {
        precedence::ATOM
    }
}

/// An expression producing values of type `T`.
pub trait TypedExpression<T>: Expression {
    /// Factory for mappers reading this expression's column from a row.
    ///
    /// # Errors
    ///
    /// Returns an error if the default label cannot be derived.
    fn row_mapper_factory(&self, scope: &Scope) -> Result<RowMapperFactory<T>>;
}

/// Conversion into a typed expression: plain values become bound parameters,
/// expressions convert to themselves.
pub trait IntoExpression<T> {
    /// The resulting expression.
    type Expr: TypedExpression<T> + 'static;

    /// Performs the conversion.
    fn into_expression(self) -> Self::Expr;
}

/// Renders `expr`, parenthesized when it binds looser than `min`.
pub(crate) fn operand_sql(expr: &dyn Expression, scope: &Scope, min: u8) -> Result<String> {
    let sql = expr.sql(scope)?;
    if expr.precedence() < min {
        Ok(format!("({sql})"))
    } else {
        Ok(sql)
    }
}

/// Concatenates the bound values of several expressions, in order.
pub(crate) fn collect_args<'a, I>(exprs: I, scope: &Scope) -> Result<Vec<SqlValue>>
where
    I: IntoIterator<Item = &'a dyn Expression>,
{
    let mut args = Vec::new();
    for expr in exprs {
        args.extend(expr.args(scope)?);
    }
    Ok(args)
}

/// Predicates and operators available on every typed expression.
pub trait ExpressionExt<T>: TypedExpression<T> + Sized + 'static {
    /// `self = rhs`
    fn eq<E: IntoExpression<T>>(self, rhs: E) -> Condition {
        Condition::comparison(self, "=", rhs.into_expression())
    }

    /// `self <> rhs`
    fn ne<E: IntoExpression<T>>(self, rhs: E) -> Condition {
        Condition::comparison(self, "<>", rhs.into_expression())
    }

    /// `self < rhs`
    fn lt<E: IntoExpression<T>>(self, rhs: E) -> Condition {
        Condition::comparison(self, "<", rhs.into_expression())
    }

    /// `self <= rhs`
    fn le<E: IntoExpression<T>>(self, rhs: E) -> Condition {
        Condition::comparison(self, "<=", rhs.into_expression())
    }

    /// `self > rhs`
    fn gt<E: IntoExpression<T>>(self, rhs: E) -> Condition {
        Condition::comparison(self, ">", rhs.into_expression())
    }

    /// `self >= rhs`
    fn ge<E: IntoExpression<T>>(self, rhs: E) -> Condition {
        Condition::comparison(self, ">=", rhs.into_expression())
    }

    /// `self like pattern`
    fn like<E: IntoExpression<T>>(self, pattern: E) -> Condition {
        Condition::comparison(self, "like", pattern.into_expression())
    }

    /// `self between low and high`
    fn between<L: IntoExpression<T>, H: IntoExpression<T>>(self, low: L, high: H) -> Condition {
        Condition::between(self, low.into_expression(), high.into_expression())
    }

    /// `self in (a, b, ...)`
    fn in_list<E, I>(self, items: I) -> Condition
    where
        E: IntoExpression<T>,
        I: IntoIterator<Item = E>,
    {
        Condition::in_list(
            self,
            items
                .into_iter()
                .map(|e| -> Arc<dyn Expression> { Arc::new(e.into_expression()) })
                .collect(),
        )
    }

    /// `self in (select ...)`
    fn in_select(self, select: &Select<T>) -> Condition {
        Condition::in_select(self, select)
    }

    /// `self is null`
    fn is_null(self) -> Condition {
        Condition::is_null(self, false)
    }

    /// `self is not null`
    fn is_not_null(self) -> Condition {
        Condition::is_null(self, true)
    }

    /// `self + rhs`
    fn plus<E: IntoExpression<T>>(self, rhs: E) -> Arithmetic<T> {
        Arithmetic::new(self, ArithmeticOp::Plus, rhs.into_expression())
    }

    /// `self - rhs`
    fn minus<E: IntoExpression<T>>(self, rhs: E) -> Arithmetic<T> {
        Arithmetic::new(self, ArithmeticOp::Minus, rhs.into_expression())
    }

    /// `self * rhs`
    fn times<E: IntoExpression<T>>(self, rhs: E) -> Arithmetic<T> {
        Arithmetic::new(self, ArithmeticOp::Times, rhs.into_expression())
    }

    /// `self / rhs`
    fn divided_by<E: IntoExpression<T>>(self, rhs: E) -> Arithmetic<T> {
        Arithmetic::new(self, ArithmeticOp::DividedBy, rhs.into_expression())
    }

    /// String concatenation, spelled by the dialect.
    fn concat<E: IntoExpression<String>>(self, rhs: E) -> Concat {
        Concat::new(self, rhs.into_expression())
    }
}

impl<T, E> ExpressionExt<T> for E where E: TypedExpression<T> + 'static {}
