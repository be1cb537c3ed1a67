//! Aliases: named references to tables, subqueries and common table
//! expressions.
//!
//! [`AnyAlias`] is the untyped handle stored in scopes and FROM clauses.
//! [`Alias<R>`] adds the row type and knows how to map its columns back into
//! an `R`.

use std::any::{type_name, TypeId};
use std::fmt;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::expr::{ColumnRef, LabelColumn};
use crate::row::{RowMapper, RowMapperFactory, RowReader};
use crate::schema::{Column, Dual, Table, TableMeta};
use crate::scope::Scope;
use crate::select::{CteNode, SelectNode};
use crate::value::{FromSqlValue, SqlValue};

pub(crate) enum AliasSource {
    Table(Arc<TableMeta>),
    Cte(Arc<CteNode>),
    Subselect(Arc<SelectNode>),
    Dual,
}

struct AliasInner {
    name: String,
    explicit: bool,
    row_type: TypeId,
    row_type_name: &'static str,
    source: AliasSource,
}

/// An alias without its row type.
///
/// Two handles are equal when they come from the same alias creation.
#[derive(Clone)]
pub struct AnyAlias {
    inner: Arc<AliasInner>,
}

impl AnyAlias {
    fn new(
        name: String,
        explicit: bool,
        row_type: TypeId,
        row_type_name: &'static str,
        source: AliasSource,
    ) -> Self {
        Self {
            inner: Arc::new(AliasInner {
                name,
                explicit,
                row_type,
                row_type_name,
                source,
            }),
        }
    }

    /// The alias name. Unnamed aliases use the table or CTE name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Whether the name was given explicitly.
    #[must_use]
    pub fn is_explicit(&self) -> bool {
        self.inner.explicit
    }

    /// Identity of the row type.
    #[must_use]
    pub fn row_type(&self) -> TypeId {
        self.inner.row_type
    }

    /// Name of the row type, for messages.
    #[must_use]
    pub fn row_type_name(&self) -> &'static str {
        self.inner.row_type_name
    }

    pub(crate) fn source(&self) -> &AliasSource {
        &self.inner.source
    }

    /// Returns true for the one-row placeholder table.
    #[must_use]
    pub fn is_dual(&self) -> bool {
        matches!(self.inner.source, AliasSource::Dual)
    }

    pub(crate) fn table_meta(&self) -> Option<&TableMeta> {
        match &self.inner.source {
            AliasSource::Table(meta) => Some(meta),
            AliasSource::Cte(cte) => Some(cte.meta()),
            AliasSource::Subselect(_) | AliasSource::Dual => None,
        }
    }

    /// SQL column name of a property of the aliased table.
    pub(crate) fn column_name(&self, property: &str) -> Result<&str> {
        self.table_meta()
            .ok_or_else(|| Error::NoSuchColumn {
                source_name: self.name().to_string(),
                column: property.to_string(),
            })?
            .column_name_for(property)
    }

    /// Text of this alias in a FROM clause.
    pub(crate) fn from_sql(&self, scope: &Scope) -> Result<String> {
        Ok(match &self.inner.source {
            AliasSource::Table(meta) => format!("{} {}", meta.qualified_name(), self.name()),
            AliasSource::Cte(cte) => {
                if self.is_explicit() {
                    format!("{} {}", cte.name(), self.name())
                } else {
                    cte.name().to_string()
                }
            }
            AliasSource::Subselect(node) => format!("{} {}", node.sql(scope)?, self.name()),
            AliasSource::Dual => scope.dialect().dual().to_string(),
        })
    }

    /// Bound values of this alias in a FROM clause.
    pub(crate) fn from_args(&self, scope: &Scope) -> Result<Vec<SqlValue>> {
        match &self.inner.source {
            AliasSource::Subselect(node) => node.args(scope),
            _ => Ok(Vec::new()),
        }
    }

    /// `(column, output label)` pairs for selecting every column of the alias.
    fn projection_columns(&self, scope: &Scope) -> Result<Vec<(String, String)>> {
        let name = self.name();
        Ok(match &self.inner.source {
            AliasSource::Table(_) | AliasSource::Cte(_) => self
                .table_meta()
                .map(TableMeta::columns)
                .unwrap_or_default()
                .iter()
                .map(|c| (c.name.clone(), format!("{name}_{}", c.name)))
                .collect(),
            AliasSource::Subselect(node) => node
                .labels(scope)?
                .into_iter()
                .map(|l| {
                    let label = format!("{name}_{l}");
                    (l, label)
                })
                .collect(),
            AliasSource::Dual => Vec::new(),
        })
    }

    /// Text of this alias in a projection: every column, labelled.
    pub(crate) fn projection_sql(&self, scope: &Scope) -> Result<String> {
        let name = self.name();
        Ok(self
            .projection_columns(scope)?
            .iter()
            .map(|(column, label)| format!("{name}.{column} as {label}"))
            .collect::<Vec<_>>()
            .join(", "))
    }

    /// Output labels of this alias in a projection.
    pub(crate) fn projection_labels(&self, scope: &Scope) -> Result<Vec<String>> {
        Ok(self
            .projection_columns(scope)?
            .into_iter()
            .map(|(_, label)| label)
            .collect())
    }

    /// Number of columns this alias contributes to a projection.
    pub(crate) fn width(&self) -> usize {
        match &self.inner.source {
            AliasSource::Table(_) | AliasSource::Cte(_) => {
                self.table_meta().map_or(0, |m| m.columns().len())
            }
            AliasSource::Subselect(node) => node.width(),
            AliasSource::Dual => 0,
        }
    }

    /// Text of a subquery column addressed by its label.
    pub(crate) fn label_sql(&self, scope: &Scope, label: &str) -> Result<String> {
        let known = match &self.inner.source {
            AliasSource::Subselect(node) => node
                .labels(scope)?
                .iter()
                .any(|l| l.eq_ignore_ascii_case(label)),
            AliasSource::Table(_) | AliasSource::Cte(_) => self
                .table_meta()
                .is_some_and(|m| m.columns().iter().any(|c| c.name.eq_ignore_ascii_case(label))),
            AliasSource::Dual => false,
        };
        if !known {
            return Err(Error::NoSuchColumn {
                source_name: self.name().to_string(),
                column: label.to_string(),
            });
        }
        Ok(format!("{}.{label}", self.name()))
    }
}

impl PartialEq for AnyAlias {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for AnyAlias {}

impl fmt::Debug for AnyAlias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnyAlias")
            .field("name", &self.inner.name)
            .field("row_type", &self.inner.row_type_name)
            .finish_non_exhaustive()
    }
}

pub(crate) type AliasMapper<R> = Arc<dyn Fn(&Scope) -> Result<RowMapperFactory<R>> + Send + Sync>;

/// A typed alias for rows of type `R`.
pub struct Alias<R> {
    any: AnyAlias,
    mapper: AliasMapper<R>,
}

impl<R> Clone for Alias<R> {
    fn clone(&self) -> Self {
        Self {
            any: self.any.clone(),
            mapper: Arc::clone(&self.mapper),
        }
    }
}

impl<R> fmt::Debug for Alias<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Alias").field(&self.any).finish()
    }
}

pub(crate) fn table_mapper<R: Table>(alias_name: &str, meta: &TableMeta) -> AliasMapper<R> {
    let columns: Vec<(&'static str, String)> = meta
        .columns()
        .iter()
        .map(|c| (c.property, format!("{alias_name}_{}", c.name)))
        .collect();
    Arc::new(move |_: &Scope| {
        let columns = columns.clone();
        Ok(RowMapperFactory::new(move |prefix, _| {
            let labels: Vec<(&'static str, String)> = columns
                .iter()
                .map(|(property, label)| (*property, format!("{prefix}{label}")))
                .collect();
            RowMapper::new(move |row| R::from_row(&RowReader::new(row, &labels)))
        }))
    })
}

impl<R: Table> Alias<R> {
    pub(crate) fn table(meta: Arc<TableMeta>, name: Option<&str>) -> Self {
        let alias_name = name.unwrap_or_else(|| meta.name()).to_string();
        let mapper = table_mapper::<R>(&alias_name, &meta);
        Self {
            any: AnyAlias::new(
                alias_name,
                name.is_some(),
                TypeId::of::<R>(),
                R::TYPE_NAME,
                AliasSource::Table(meta),
            ),
            mapper,
        }
    }

    pub(crate) fn cte(cte: Arc<CteNode>, name: Option<&str>) -> Self {
        let alias_name = name.unwrap_or_else(|| cte.name()).to_string();
        let mapper = table_mapper::<R>(&alias_name, cte.meta());
        Self {
            any: AnyAlias::new(
                alias_name,
                name.is_some(),
                TypeId::of::<R>(),
                R::TYPE_NAME,
                AliasSource::Cte(cte),
            ),
            mapper,
        }
    }

    /// Reference to a column of this alias.
    ///
    /// ```ignore
    /// let p = db.alias::<Salesperson>("p");
    /// let first_name = p.col(Salesperson::first_name());
    /// ```
    #[must_use]
    pub fn col<C: Column<Table = R>>(&self, column: ColumnRef<C>) -> ColumnRef<C> {
        column.resolved(self.any.clone())
    }
}

impl Alias<Dual> {
    pub(crate) fn dual() -> Self {
        Self {
            any: AnyAlias::new(
                String::from("DUAL"),
                false,
                TypeId::of::<Dual>(),
                "Dual",
                AliasSource::Dual,
            ),
            mapper: Arc::new(|_: &Scope| {
                Ok(RowMapperFactory::new(|_, _| RowMapper::new(|_| Ok(Dual))))
            }),
        }
    }
}

impl<R: 'static> Alias<R> {
    pub(crate) fn subselect(
        node: Arc<SelectNode>,
        rows: Arc<dyn Fn(&Scope) -> Result<RowMapperFactory<R>> + Send + Sync>,
        name: &str,
    ) -> Self {
        let own_scope = node.scope().clone();
        let prefix = format!("{name}_");
        let mapper: AliasMapper<R> = Arc::new(move |scope: &Scope| {
            let rows = rows(&scope.plus_scope(&own_scope))?;
            let prefix = prefix.clone();
            Ok(RowMapperFactory::new(move |outer_prefix, _| {
                rows.mapper(&format!("{outer_prefix}{prefix}"), None)
            }))
        });
        Self {
            any: AnyAlias::new(
                name.to_string(),
                true,
                TypeId::of::<R>(),
                type_name::<R>(),
                AliasSource::Subselect(node),
            ),
            mapper,
        }
    }

    /// The untyped handle.
    #[must_use]
    pub fn any(&self) -> &AnyAlias {
        &self.any
    }

    /// The alias name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.any.name()
    }

    /// Reference to an output column of a subquery or CTE alias by label.
    #[must_use]
    pub fn column<T>(&self, label: &str) -> LabelColumn<T>
    where
        T: FromSqlValue + Send + Sync + 'static,
    {
        LabelColumn::new(self.any.clone(), label)
    }

    pub(crate) fn row_mapper_factory(&self, scope: &Scope) -> Result<RowMapperFactory<R>> {
        (self.mapper)(scope)
    }

    /// Mapper for the nullable side of an outer join: `None` when every
    /// column of the alias is NULL.
    pub(crate) fn optional_row_mapper_factory(
        &self,
        scope: &Scope,
    ) -> Result<RowMapperFactory<Option<R>>> {
        let rows = self.row_mapper_factory(scope)?;
        let labels = self.any.projection_labels(scope)?;
        Ok(RowMapperFactory::new(move |prefix, label| {
            let rows = rows.mapper(prefix, label);
            let labels: Vec<String> = labels.iter().map(|l| format!("{prefix}{l}")).collect();
            RowMapper::new(move |row| {
                for label in &labels {
                    if !row.get(label)?.is_null() {
                        return rows.map_row(row).map(Some);
                    }
                }
                Ok(None)
            })
        }))
    }
}
