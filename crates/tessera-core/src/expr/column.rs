//! Column references.

use std::any::TypeId;
use std::fmt;
use std::marker::PhantomData;

use crate::alias::AnyAlias;
use crate::error::Result;
use crate::row::RowMapperFactory;
use crate::schema::{Column, Table};
use crate::scope::Scope;
use crate::value::{FromSqlValue, SqlValue};

use super::{Expression, IntoExpression, TypedExpression};

#[derive(Clone)]
enum Binding {
    /// Looked up in the scope at render time, by table and optionally by
    /// alias name.
    Unresolved(Option<String>),
    Resolved(AnyAlias),
}

/// A reference to a column of a table.
///
/// `#[derive(Table)]` generates one accessor per field returning an
/// unresolved reference; it is bound to an alias when rendered, so the same
/// value can be reused in different statements.
pub struct ColumnRef<C> {
    binding: Binding,
    _column: PhantomData<C>,
}

impl<C> Clone for ColumnRef<C> {
    fn clone(&self) -> Self {
        Self {
            binding: self.binding.clone(),
            _column: PhantomData,
        }
    }
}

impl<C: Column> fmt::Debug for ColumnRef<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let alias = match &self.binding {
            Binding::Unresolved(name) => name.clone(),
            Binding::Resolved(alias) => Some(alias.name().to_string()),
        };
        f.debug_struct("ColumnRef")
            .field("table", &<C::Table as Table>::TYPE_NAME)
            .field("property", &C::PROPERTY)
            .field("alias", &alias)
            .finish()
    }
}

impl<C: Column> Default for ColumnRef<C> {
    fn default() -> Self {
        Self::unresolved()
    }
}

impl<C: Column> ColumnRef<C> {
    /// A reference resolved against whichever alias of the table is in scope.
    #[must_use]
    pub const fn unresolved() -> Self {
        Self {
            binding: Binding::Unresolved(None),
            _column: PhantomData,
        }
    }

    /// A reference resolved against the alias with the given name.
    #[must_use]
    pub fn of(self, alias: &str) -> Self {
        Self {
            binding: Binding::Unresolved(Some(alias.to_string())),
            _column: PhantomData,
        }
    }

    pub(crate) fn resolved(self, alias: AnyAlias) -> Self {
        Self {
            binding: Binding::Resolved(alias),
            _column: PhantomData,
        }
    }

    /// The Rust field name of the column.
    #[must_use]
    pub const fn property(&self) -> &'static str {
        C::PROPERTY
    }

    fn alias(&self, scope: &Scope) -> Result<AnyAlias> {
        match &self.binding {
            Binding::Unresolved(name) => scope.find_alias_of(
                TypeId::of::<C::Table>(),
                <C::Table as Table>::TYPE_NAME,
                name.as_deref(),
            ),
            Binding::Resolved(alias) => {
                scope.note_usage(alias);
                Ok(alias.clone())
            }
        }
    }
}

impl<C: Column> Expression for ColumnRef<C> {
    fn sql(&self, scope: &Scope) -> Result<String> {
        let alias = self.alias(scope)?;
        Ok(format!("{}.{}", alias.name(), alias.column_name(C::PROPERTY)?))
    }

    fn args(&self, _scope: &Scope) -> Result<Vec<SqlValue>> {
        Ok(Vec::new())
    }

    fn label(&self, scope: &Scope) -> Result<String> {
        let alias = self.alias(scope)?;
        Ok(format!("{}_{}", alias.name(), alias.column_name(C::PROPERTY)?))
    }
}

impl<C: Column> TypedExpression<C::Type> for ColumnRef<C> {
    fn row_mapper_factory(&self, scope: &Scope) -> Result<RowMapperFactory<C::Type>> {
        Ok(RowMapperFactory::scalar(self.label(scope)?))
    }
}

impl<C: Column> IntoExpression<C::Type> for ColumnRef<C> {
    type Expr = Self;

    fn into_expression(self) -> Self::Expr {
        self
    }
}

/// An output column of a subquery or CTE alias, addressed by its label.
pub struct LabelColumn<T> {
    alias: AnyAlias,
    label: String,
    _type: PhantomData<fn() -> T>,
}

impl<T> LabelColumn<T> {
    pub(crate) fn new(alias: AnyAlias, label: &str) -> Self {
        Self {
            alias,
            label: label.to_string(),
            _type: PhantomData,
        }
    }
}

impl<T> Clone for LabelColumn<T> {
    fn clone(&self) -> Self {
        Self {
            alias: self.alias.clone(),
            label: self.label.clone(),
            _type: PhantomData,
        }
    }
}

impl<T> fmt::Debug for LabelColumn<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LabelColumn")
            .field("alias", &self.alias.name())
            .field("label", &self.label)
            .finish()
    }
}

impl<T> Expression for LabelColumn<T> {
    fn sql(&self, scope: &Scope) -> Result<String> {
        scope.note_usage(&self.alias);
        self.alias.label_sql(scope, &self.label)
    }

    fn args(&self, _scope: &Scope) -> Result<Vec<SqlValue>> {
        Ok(Vec::new())
    }

    fn label(&self, _scope: &Scope) -> Result<String> {
        Ok(format!("{}_{}", self.alias.name(), self.label))
    }
}

impl<T: FromSqlValue + 'static> TypedExpression<T> for LabelColumn<T> {
    fn row_mapper_factory(&self, scope: &Scope) -> Result<RowMapperFactory<T>> {
        Ok(RowMapperFactory::scalar(self.label(scope)?))
    }
}

impl<T: FromSqlValue + 'static> IntoExpression<T> for LabelColumn<T> {
    type Expr = Self;

    fn into_expression(self) -> Self::Expr {
        self
    }
}
