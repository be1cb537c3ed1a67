//! Projections: the labelled output columns of a select.
//!
//! A [`Projection<Acc>`] is built one column at a time. Each append extends
//! the rendered column list and composes one more row-mapper slot onto the
//! accumulated tuple `Acc`.

use std::sync::Arc;

use crate::alias::{table_mapper, Alias, AnyAlias};
use crate::error::{Error, Result};
use crate::expr::{Expression, TypedExpression};
use crate::row::{ResultRow, RowMapper, RowMapperFactory};
use crate::schema::Table;
use crate::scope::Scope;
use crate::tuple::Append;
use crate::value::SqlValue;

/// One output column, or every column of an alias.
#[derive(Clone)]
pub(crate) enum ProjectionItem {
    Expression {
        expression: Arc<dyn Expression>,
        label: Option<String>,
    },
    Alias(AnyAlias),
}

impl ProjectionItem {
    fn sql(&self, scope: &Scope) -> Result<String> {
        match self {
            Self::Expression { expression, label } => {
                let label = match label {
                    Some(label) => label.clone(),
                    None => expression.label(scope)?,
                };
                Ok(format!("{} as {label}", expression.sql(scope)?))
            }
            Self::Alias(alias) => alias.projection_sql(scope),
        }
    }

    fn args(&self, scope: &Scope) -> Result<Vec<SqlValue>> {
        match self {
            Self::Expression { expression, .. } => expression.args(scope),
            Self::Alias(_) => Ok(Vec::new()),
        }
    }

    fn labels(&self, scope: &Scope) -> Result<Vec<String>> {
        match self {
            Self::Expression { expression, label } => Ok(vec![match label {
                Some(label) => label.clone(),
                None => expression.label(scope)?,
            }]),
            Self::Alias(alias) => alias.projection_labels(scope),
        }
    }

    fn width(&self) -> usize {
        match self {
            Self::Expression { .. } => 1,
            Self::Alias(alias) => alias.width(),
        }
    }
}

/// The untyped column list of a projection.
#[derive(Clone, Default)]
pub(crate) struct Columns {
    pub(crate) distinct: bool,
    pub(crate) items: Vec<ProjectionItem>,
    /// Alias whose row the columns are assembled into, for `select_into`.
    pub(crate) into: Option<AnyAlias>,
}

impl Columns {
    pub(crate) fn sql(&self, scope: &Scope) -> Result<String> {
        let items = self
            .items
            .iter()
            .map(|i| i.sql(scope))
            .collect::<Result<Vec<_>>>()?;
        let distinct = if self.distinct { "distinct " } else { "" };
        Ok(format!("{distinct}{}", items.join(", ")))
    }

    pub(crate) fn args(&self, scope: &Scope) -> Result<Vec<SqlValue>> {
        let mut args = Vec::new();
        for item in &self.items {
            args.extend(item.args(scope)?);
        }
        Ok(args)
    }

    pub(crate) fn labels(&self, scope: &Scope) -> Result<Vec<String>> {
        let mut labels = Vec::new();
        for item in &self.items {
            labels.extend(item.labels(scope)?);
        }
        Ok(labels)
    }

    pub(crate) fn width(&self) -> usize {
        self.items.iter().map(ProjectionItem::width).sum()
    }
}

pub(crate) type MapperFn<T> = Arc<dyn Fn(&Scope) -> Result<RowMapperFactory<T>> + Send + Sync>;

/// A typed projection producing rows of the tuple `Acc`.
pub(crate) struct Projection<Acc> {
    pub(crate) columns: Columns,
    pub(crate) mapper: MapperFn<Acc>,
}

impl Projection<()> {
    pub(crate) fn empty(distinct: bool) -> Self {
        Self {
            columns: Columns {
                distinct,
                items: Vec::new(),
                into: None,
            },
            mapper: Arc::new(|_: &Scope| Ok(RowMapperFactory::new(|_, _| RowMapper::new(|_| Ok(()))))),
        }
    }
}

impl<Acc: 'static> Projection<Acc> {
    fn compose<T, Out>(prior: MapperFn<Acc>, next: MapperFn<T>, label: Option<String>) -> MapperFn<Out>
    where
        Acc: Append<T, Output = Out>,
        T: 'static,
        Out: 'static,
    {
        Arc::new(move |scope: &Scope| {
            let prior = prior(scope)?;
            let next = next(scope)?;
            let label = label.clone();
            Ok(RowMapperFactory::new(move |prefix, _| {
                let prior = prior.mapper(prefix, None);
                let next = next.mapper(prefix, label.as_deref());
                RowMapper::new(move |row| Ok(prior.map_row(row)?.append(next.map_row(row)?)))
            }))
        })
    }

    /// Appends an expression with an optional explicit label.
    pub(crate) fn append<T, E>(self, expression: E, label: Option<String>) -> Projection<Acc::Output>
    where
        Acc: Append<T>,
        Acc::Output: 'static,
        T: 'static,
        E: TypedExpression<T> + 'static,
    {
        let expression = Arc::new(expression);
        let mut columns = self.columns;
        columns.items.push(ProjectionItem::Expression {
            expression: Arc::clone(&expression) as Arc<dyn Expression>,
            label: label.clone(),
        });

        // The mapper reads the same label the projection renders
        let fixed = label;
        let next: MapperFn<T> = Arc::new(move |scope: &Scope| {
            let factory = expression.row_mapper_factory(scope)?;
            let label = match &fixed {
                Some(label) => label.clone(),
                None => expression.label(scope)?,
            };
            Ok(RowMapperFactory::new(move |prefix, _| {
                factory.mapper(prefix, Some(&label))
            }))
        });

        Projection {
            columns,
            mapper: Self::compose(self.mapper, next, None),
        }
    }

    /// Appends every column of an alias.
    pub(crate) fn append_alias<R>(self, alias: &Alias<R>) -> Projection<Acc::Output>
    where
        Acc: Append<R>,
        Acc::Output: 'static,
        R: 'static,
    {
        let mut columns = self.columns;
        columns.items.push(ProjectionItem::Alias(alias.any().clone()));
        let alias = alias.clone();
        let next: MapperFn<R> = Arc::new(move |scope: &Scope| alias.row_mapper_factory(scope));
        Projection {
            columns,
            mapper: Self::compose(self.mapper, next, None),
        }
    }

    /// Appends every column of the nullable side of an outer join.
    pub(crate) fn append_optional_alias<R>(self, alias: &Alias<R>) -> Projection<Acc::Output>
    where
        Acc: Append<Option<R>>,
        Acc::Output: 'static,
        R: 'static,
    {
        let mut columns = self.columns;
        columns.items.push(ProjectionItem::Alias(alias.any().clone()));
        let alias = alias.clone();
        let next: MapperFn<Option<R>> =
            Arc::new(move |scope: &Scope| alias.optional_row_mapper_factory(scope));
        Projection {
            columns,
            mapper: Self::compose(self.mapper, next, None),
        }
    }

    /// Maps the accumulated tuple into another type.
    pub(crate) fn map<U, F>(self, f: F) -> Projection<U>
    where
        U: 'static,
        F: Fn(Acc) -> U + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        let mapper = self.mapper;
        Projection {
            columns: self.columns,
            mapper: Arc::new(move |scope: &Scope| {
                let f = Arc::clone(&f);
                Ok(mapper(scope)?.map(move |acc| f(acc)))
            }),
        }
    }
}

/// A row of an assembled projection. Columns of the target that were never
/// assigned read as NULL.
struct AssignedRow<'a> {
    row: &'a dyn ResultRow,
    assigned: &'a [String],
}

impl ResultRow for AssignedRow<'_> {
    fn get(&self, label: &str) -> Result<SqlValue> {
        if self.assigned.iter().any(|l| l.eq_ignore_ascii_case(label)) {
            self.row.get(label)
        } else {
            Ok(SqlValue::Null)
        }
    }
}

impl<R: Table> Projection<(R,)> {
    /// An empty projection assembling rows of the target alias's table.
    pub(crate) fn into_row(target: &Alias<R>) -> Self {
        let target = target.any().clone();
        Self {
            mapper: assembled_mapper::<R>(target.clone(), Vec::new()),
            columns: Columns {
                distinct: false,
                items: Vec::new(),
                into: Some(target),
            },
        }
    }

    /// Selects `expression` as the target column named by `property`.
    pub(crate) fn assign(
        &mut self,
        property: &'static str,
        expression: Arc<dyn Expression>,
    ) -> Result<()> {
        let target = self.columns.into.clone().ok_or_else(|| Error::NoSuchAlias {
            table: R::TYPE_NAME.to_string(),
            alias: None,
        })?;
        let label = format!("{}_{}", target.name(), target.column_name(property)?);
        self.columns.items.push(ProjectionItem::Expression {
            expression,
            label: Some(label),
        });
        let assigned = self
            .columns
            .items
            .iter()
            .filter_map(|item| match item {
                ProjectionItem::Expression { label, .. } => label.clone(),
                ProjectionItem::Alias(_) => None,
            })
            .collect();
        self.mapper = assembled_mapper::<R>(target, assigned);
        Ok(())
    }
}

fn assembled_mapper<R: Table>(target: AnyAlias, assigned: Vec<String>) -> MapperFn<(R,)> {
    let assigned = Arc::new(assigned);
    Arc::new(move |scope: &Scope| {
        let meta = target.table_meta().ok_or_else(|| Error::NoSuchAlias {
            table: R::TYPE_NAME.to_string(),
            alias: Some(target.name().to_string()),
        })?;
        let rows = table_mapper::<R>(target.name(), meta)(scope)?;
        let assigned = Arc::clone(&assigned);
        Ok(RowMapperFactory::new(move |prefix, _| {
            let rows = rows.mapper(prefix, None);
            let assigned: Vec<String> = assigned.iter().map(|l| format!("{prefix}{l}")).collect();
            RowMapper::new(move |row| {
                let row = AssignedRow {
                    row,
                    assigned: &assigned,
                };
                Ok((rows.map_row(&row)?,))
            })
        }))
    })
}
