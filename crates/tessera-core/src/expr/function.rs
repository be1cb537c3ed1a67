//! Built-in function calls.
//!
//! The spelling of each call comes from the dialect; arguments are rendered
//! and bound in the order they are given.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::dialect::FunctionName;
use crate::error::Result;
use crate::label::next_label;
use crate::row::RowMapperFactory;
use crate::scope::Scope;
use crate::value::{FromSqlValue, SqlValue};

use super::{collect_args, Expression, IntoExpression, TypedExpression};

/// A call to a built-in function returning `T`.
pub struct FunctionCall<T> {
    name: FunctionName,
    args: Vec<Arc<dyn Expression>>,
    label: String,
    _type: PhantomData<fn() -> T>,
}

impl<T> FunctionCall<T> {
    fn new(name: FunctionName, args: Vec<Arc<dyn Expression>>) -> Self {
        Self {
            name,
            args,
            label: next_label(name.as_str()),
            _type: PhantomData,
        }
    }

    /// The function being called.
    #[must_use]
    pub const fn name(&self) -> FunctionName {
        self.name
    }
}

impl<T> Clone for FunctionCall<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            args: self.args.clone(),
            label: self.label.clone(),
            _type: PhantomData,
        }
    }
}

impl<T> fmt::Debug for FunctionCall<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionCall")
            .field("name", &self.name)
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

impl<T> Expression for FunctionCall<T> {
    fn sql(&self, scope: &Scope) -> Result<String> {
        let args = self
            .args
            .iter()
            .map(|a| a.sql(scope))
            .collect::<Result<Vec<_>>>()?;
        scope.dialect().function_sql(self.name, &args)
    }

    fn args(&self, scope: &Scope) -> Result<Vec<SqlValue>> {
        collect_args(self.args.iter().map(|a| &**a), scope)
    }

    fn label(&self, _scope: &Scope) -> Result<String> {
        Ok(self.label.clone())
    }
}

impl<T: FromSqlValue + 'static> TypedExpression<T> for FunctionCall<T> {
    fn row_mapper_factory(&self, _scope: &Scope) -> Result<RowMapperFactory<T>> {
        Ok(RowMapperFactory::scalar(self.label.clone()))
    }
}

impl<T: FromSqlValue + 'static> IntoExpression<T> for FunctionCall<T> {
    type Expr = Self;

    fn into_expression(self) -> Self::Expr {
        self
    }
}

fn arg<T, E: IntoExpression<T>>(expression: E) -> Arc<dyn Expression> {
    Arc::new(expression.into_expression())
}

/// `upper(s)`
pub fn upper<E: IntoExpression<String>>(s: E) -> FunctionCall<String> {
    FunctionCall::new(FunctionName::Upper, vec![arg(s)])
}

/// `lower(s)`
pub fn lower<E: IntoExpression<String>>(s: E) -> FunctionCall<String> {
    FunctionCall::new(FunctionName::Lower, vec![arg(s)])
}

/// Character length of a string.
pub fn length<E: IntoExpression<String>>(s: E) -> FunctionCall<i64> {
    FunctionCall::new(FunctionName::Length, vec![arg(s)])
}

/// `abs(n)`
pub fn abs<T, E: IntoExpression<T>>(n: E) -> FunctionCall<T> {
    FunctionCall::new(FunctionName::Abs, vec![arg(n)])
}

/// `coalesce(value, fallback)`: the first non-null of the two.
pub fn coalesce<T, E, F>(value: E, fallback: F) -> FunctionCall<T>
where
    E: IntoExpression<Option<T>>,
    F: IntoExpression<T>,
{
    FunctionCall::new(FunctionName::Coalesce, vec![arg(value), arg(fallback)])
}

/// `count(x)`
pub fn count<T, E: IntoExpression<T>>(x: E) -> FunctionCall<i64> {
    FunctionCall::new(FunctionName::Count, vec![arg(x)])
}

/// `count(distinct x)`
pub fn count_distinct<T, E: IntoExpression<T>>(x: E) -> FunctionCall<i64> {
    FunctionCall::new(FunctionName::CountDistinct, vec![arg(x)])
}

/// `max(x)`
pub fn max<T, E: IntoExpression<T>>(x: E) -> FunctionCall<T> {
    FunctionCall::new(FunctionName::Max, vec![arg(x)])
}

/// `min(x)`
pub fn min<T, E: IntoExpression<T>>(x: E) -> FunctionCall<T> {
    FunctionCall::new(FunctionName::Min, vec![arg(x)])
}

/// `sum(x)`
pub fn sum<T, E: IntoExpression<T>>(x: E) -> FunctionCall<T> {
    FunctionCall::new(FunctionName::Sum, vec![arg(x)])
}

/// `avg(x)`
pub fn avg<T, E: IntoExpression<T>>(x: E) -> FunctionCall<f64> {
    FunctionCall::new(FunctionName::Avg, vec![arg(x)])
}

/// The current timestamp as text.
#[must_use]
pub fn current_timestamp() -> FunctionCall<String> {
    FunctionCall::new(FunctionName::CurrentTimestamp, Vec::new())
}

/// Year part of a date.
pub fn year<T, E: IntoExpression<T>>(date: E) -> FunctionCall<i32> {
    FunctionCall::new(FunctionName::Year, vec![arg(date)])
}

/// A date plus a number of days.
pub fn add_days<T, E, N>(date: E, days: N) -> FunctionCall<T>
where
    E: IntoExpression<T>,
    N: IntoExpression<i32>,
{
    FunctionCall::new(FunctionName::AddDays, vec![arg(date), arg(days)])
}

/// The rest of `s` from the 1-based position `start`.
pub fn substr<E, S>(s: E, start: S) -> FunctionCall<String>
where
    E: IntoExpression<String>,
    S: IntoExpression<i32>,
{
    FunctionCall::new(FunctionName::Substr, vec![arg(s), arg(start)])
}

/// At most `length` characters of `s` from the 1-based position `start`.
pub fn substr_for<E, S, L>(s: E, start: S, length: L) -> FunctionCall<String>
where
    E: IntoExpression<String>,
    S: IntoExpression<i32>,
    L: IntoExpression<i32>,
{
    FunctionCall::new(FunctionName::Substr, vec![arg(s), arg(start), arg(length)])
}

/// `trim(s)`
pub fn trim<E: IntoExpression<String>>(s: E) -> FunctionCall<String> {
    FunctionCall::new(FunctionName::Trim, vec![arg(s)])
}

/// 1-based position of `search` in `s`, 0 when it does not occur.
pub fn instr<E, F>(s: E, search: F) -> FunctionCall<i32>
where
    E: IntoExpression<String>,
    F: IntoExpression<String>,
{
    FunctionCall::new(FunctionName::Instr, vec![arg(s), arg(search)])
}
