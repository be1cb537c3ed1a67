//! Typestate builder for select statements.
//!
//! The stage parameter records the clause written last, so clauses can only
//! be added in grammar order:
//! `from -> join/on -> select/comma -> where/and/or -> group by -> having ->
//! union -> order by -> build`.
//!
//! The accumulator parameter is the projection tuple. Starting from an alias
//! it holds that alias's row; every join appends the joined row, and
//! `select` restarts it with one column.

use std::marker::PhantomData;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::alias::{Alias, AliasSource, AnyAlias};
use crate::dialect::{IsolationLevel, LockLevel};
use crate::error::{Error, Result};
use crate::expr::{
    BoolOp, BooleanChain, ColumnRef, Condition, Expression, ForeignKeyCondition, ForeignKeyJoin,
    IntoExpression,
};
use crate::from::{FromClause, JoinType};
use crate::label::next_label;
use crate::projection::Projection;
use crate::schema::{Column, Table};
use crate::scope::Scope;
use crate::tuple::{Append, Flatten};

use super::cte::{CommonTableExpression, CteNode};
use super::ordering::{Fetch, Order, OrderBy, OrderTarget};
use super::statement::{Select, SelectNode, UnionType};

// Typestate markers
/// Marker: FROM source given, no join pending.
pub struct Joining;
/// Marker: a join was completed; `and`/`or` extend its ON clause.
pub struct Joined;
/// Marker: columns selected.
pub struct Projecting;
/// Marker: columns are being assigned to the row of a `select_into` target.
pub struct Assigning;
/// Marker: WHERE clause started; `and`/`or` extend it.
pub struct Filtering;
/// Marker: GROUP BY clause started.
pub struct Grouping;
/// Marker: HAVING clause started; `and`/`or` extend it.
pub struct Having;
/// Marker: a set operation was appended.
pub struct Unioned;
/// Marker: ORDER BY clause started.
pub struct Ordering;

mod sealed {
    pub trait Sealed {}

    impl Sealed for super::Joining {}
    impl Sealed for super::Joined {}
    impl Sealed for super::Projecting {}
    impl Sealed for super::Assigning {}
    impl Sealed for super::Filtering {}
    impl Sealed for super::Grouping {}
    impl Sealed for super::Having {}
    impl Sealed for super::Unioned {}
    impl Sealed for super::Ordering {}
}

/// Stages where joins may be added and the projection restarted.
pub trait CanJoin: sealed::Sealed {}
impl CanJoin for Joining {}
impl CanJoin for Joined {}

/// Stages where columns may be appended to the projection.
pub trait CanProject: sealed::Sealed {}
impl CanProject for Joining {}
impl CanProject for Joined {}
impl CanProject for Projecting {}

/// Stages where a WHERE clause may be started.
pub trait CanFilter: sealed::Sealed {}
impl CanFilter for Joining {}
impl CanFilter for Joined {}
impl CanFilter for Projecting {}
impl CanFilter for Assigning {}

/// Stages where GROUP BY terms may be added.
pub trait CanGroup: sealed::Sealed {}
impl CanGroup for Joining {}
impl CanGroup for Joined {}
impl CanGroup for Projecting {}
impl CanGroup for Assigning {}
impl CanGroup for Filtering {}
impl CanGroup for Grouping {}

/// Stages where set operations may be appended.
pub trait CanUnion: sealed::Sealed {}
impl CanUnion for Joining {}
impl CanUnion for Joined {}
impl CanUnion for Projecting {}
impl CanUnion for Assigning {}
impl CanUnion for Filtering {}
impl CanUnion for Grouping {}
impl CanUnion for Having {}
impl CanUnion for Unioned {}

/// Every clause except the projection.
struct Clauses {
    scope: Scope,
    from: FromClause,
    where_clause: BooleanChain,
    group_by: Vec<Arc<dyn Expression>>,
    having: BooleanChain,
    unions: Vec<(UnionType, Arc<SelectNode>)>,
    order_by: Vec<OrderBy>,
    fetch: Option<Fetch>,
    isolation: IsolationLevel,
    lock: Option<LockLevel>,
    ctes: Vec<Arc<CteNode>>,
    /// First failure seen while building, reported by `build`.
    error: Option<Error>,
}

impl Clauses {
    fn new(scope: Scope, from: FromClause) -> Self {
        Self {
            scope,
            from,
            where_clause: BooleanChain::default(),
            group_by: Vec::new(),
            having: BooleanChain::default(),
            unions: Vec::new(),
            order_by: Vec::new(),
            fetch: None,
            isolation: IsolationLevel::Unspecified,
            lock: None,
            ctes: Vec::new(),
            error: None,
        }
    }

    fn record(&mut self, error: Error) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }
}

/// Builds a select statement producing rows of the projection tuple `Acc`.
///
/// ```ignore
/// let p = db.alias::<Salesperson>("p");
/// let select = db
///     .from(&p)
///     .select(p.col(Salesperson::first_name()))
///     .where_clause(p.col(Salesperson::first_name()).eq("James"))
///     .build()?;
/// ```
pub struct SelectBuilder<Acc, Stage> {
    clauses: Clauses,
    projection: Projection<Acc>,
    _stage: PhantomData<fn() -> Stage>,
}

impl<R: 'static> SelectBuilder<(R,), Joining> {
    /// Starts a statement over `alias`, nested inside `scope` unless `scope`
    /// is an empty outermost scope.
    pub(crate) fn from_alias(scope: &Scope, alias: &Alias<R>) -> Self {
        let any = alias.any();
        let scope = if scope.is_outermost() && scope.aliases().is_empty() {
            Scope::with_aliases(scope.database(), vec![any.clone()])
        } else {
            scope.plus(any)
        };
        Self {
            clauses: Clauses::new(scope, FromClause::Alias(any.clone())),
            projection: Projection::empty(false).append_alias(alias),
            _stage: PhantomData,
        }
    }
}

impl<Acc, S> SelectBuilder<Acc, S> {
    fn into_stage<Next>(self) -> SelectBuilder<Acc, Next> {
        SelectBuilder {
            clauses: self.clauses,
            projection: self.projection,
            _stage: PhantomData,
        }
    }

    /// The statement's scope, for building statements nested inside it.
    #[must_use]
    pub fn scope(&self) -> &Scope {
        &self.clauses.scope
    }

    /// Adds an ORDER BY term on an expression.
    #[must_use]
    pub fn order_by<T, E: IntoExpression<T>>(
        mut self,
        expression: E,
        order: Order,
    ) -> SelectBuilder<Acc, Ordering> {
        self.clauses.order_by.push(OrderBy::new(
            OrderTarget::Expression(Arc::new(expression.into_expression())),
            order,
        ));
        self.into_stage()
    }

    /// Adds an ORDER BY term on an output label of the projection.
    #[must_use]
    pub fn order_by_column(mut self, label: &str, order: Order) -> SelectBuilder<Acc, Ordering> {
        self.clauses
            .order_by
            .push(OrderBy::new(OrderTarget::Column(label.to_string()), order));
        self.into_stage()
    }

    /// Adds an ORDER BY term on a 1-based projection position.
    #[must_use]
    pub fn order_by_position(
        mut self,
        position: usize,
        order: Order,
    ) -> SelectBuilder<Acc, Ordering> {
        self.clauses
            .order_by
            .push(OrderBy::new(OrderTarget::Position(position), order));
        self.into_stage()
    }

    /// Limits the result to the first `rows` rows.
    #[must_use]
    pub fn fetch_first(mut self, rows: u64) -> Self {
        self.clauses.fetch = Some(Fetch::first(rows));
        self
    }

    /// Limits the result to page `index` (0-based) of `size` rows.
    #[must_use]
    pub fn page(mut self, index: u64, size: u64) -> Self {
        self.clauses.fetch = Some(Fetch::page(index, size));
        self
    }

    /// Sets the isolation level of the statement.
    #[must_use]
    pub fn isolation(mut self, level: IsolationLevel) -> Self {
        self.clauses.isolation = level;
        self
    }

    /// Keeps locks of the given level on the rows read.
    #[must_use]
    pub fn keep_locks(mut self, level: LockLevel) -> Self {
        self.clauses.lock = Some(level);
        self
    }

    /// Adds a CTE to the statement's `with` list.
    ///
    /// CTEs read through a FROM or JOIN alias are added automatically; this is
    /// for CTEs only referenced from nested statements.
    #[must_use]
    pub fn with<T>(mut self, cte: &CommonTableExpression<T>) -> Self {
        self.clauses.ctes.push(Arc::clone(cte.node()));
        self
    }
}

impl<Acc, S> SelectBuilder<Acc, S>
where
    Acc: Flatten + 'static,
    Acc::Output: 'static,
{
    /// Finishes the statement.
    ///
    /// # Errors
    ///
    /// Returns the first error recorded while building: an unknown or
    /// ambiguous foreign key, or a set operation whose width differs.
    pub fn build(self) -> Result<Select<Acc::Output>> {
        let Self {
            mut clauses,
            projection,
            ..
        } = self;
        if let Some(error) = clauses.error.take() {
            return Err(error);
        }

        let ctes = hoist_ctes(&clauses);
        let projection = projection.map(Flatten::flatten);
        let node = SelectNode {
            scope: clauses.scope,
            label: next_label("select"),
            columns: projection.columns,
            from: clauses.from,
            where_clause: clauses.where_clause,
            group_by: clauses.group_by,
            having: clauses.having,
            unions: clauses.unions,
            order_by: clauses.order_by,
            fetch: clauses.fetch,
            isolation: clauses.isolation,
            lock: clauses.lock,
            ctes,
        };
        debug!(
            label = %node.label,
            columns = node.width(),
            ctes = node.ctes.len(),
            "Built select"
        );
        Ok(Select::new(node, projection.mapper))
    }
}

/// Collects every CTE the statement reads, dependencies first.
fn hoist_ctes(clauses: &Clauses) -> Vec<Arc<CteNode>> {
    fn add(ctes: &mut Vec<Arc<CteNode>>, cte: &Arc<CteNode>) {
        if !ctes.iter().any(|c| Arc::ptr_eq(c, cte)) {
            ctes.push(Arc::clone(cte));
        }
    }

    fn add_with_dependencies(ctes: &mut Vec<Arc<CteNode>>, cte: &Arc<CteNode>) {
        for dependency in &cte.select().ctes {
            add(ctes, dependency);
        }
        add(ctes, cte);
    }

    let mut ctes = Vec::new();
    for alias in clauses.from.aliases() {
        match alias.source() {
            AliasSource::Cte(cte) => add_with_dependencies(&mut ctes, cte),
            AliasSource::Subselect(node) => {
                for cte in &node.ctes {
                    add(&mut ctes, cte);
                }
            }
            AliasSource::Table(_) | AliasSource::Dual => {}
        }
    }
    for (_, sibling) in &clauses.unions {
        for cte in &sibling.ctes {
            add(&mut ctes, cte);
        }
    }
    for cte in &clauses.ctes {
        add_with_dependencies(&mut ctes, cte);
    }
    ctes
}

impl<Acc: 'static, S: CanJoin> SelectBuilder<Acc, S> {
    /// Starts an inner join.
    #[must_use]
    pub fn join<R: 'static>(self, alias: &Alias<R>) -> JoinClause<Acc::Output>
    where
        Acc: Append<R>,
        Acc::Output: 'static,
    {
        let projection = self.projection.append_alias(alias);
        JoinClause::new(self.clauses, projection, JoinType::Inner, alias.any())
    }

    /// Starts a left outer join; the joined row is `None` when unmatched.
    #[must_use]
    pub fn left_join<R: 'static>(
        self,
        alias: &Alias<R>,
    ) -> JoinClause<<Acc as Append<Option<R>>>::Output>
    where
        Acc: Append<Option<R>>,
        <Acc as Append<Option<R>>>::Output: 'static,
    {
        let projection = self.projection.append_optional_alias(alias);
        JoinClause::new(self.clauses, projection, JoinType::LeftOuter, alias.any())
    }

    /// Starts a right outer join.
    ///
    /// Rows already in the projection are mapped as they are; select
    /// nullable columns explicitly when they may be unmatched.
    #[must_use]
    pub fn right_join<R: 'static>(self, alias: &Alias<R>) -> JoinClause<Acc::Output>
    where
        Acc: Append<R>,
        Acc::Output: 'static,
    {
        let projection = self.projection.append_alias(alias);
        JoinClause::new(self.clauses, projection, JoinType::RightOuter, alias.any())
    }

    /// Starts a full outer join; the joined row is `None` when unmatched.
    #[must_use]
    pub fn full_join<R: 'static>(
        self,
        alias: &Alias<R>,
    ) -> JoinClause<<Acc as Append<Option<R>>>::Output>
    where
        Acc: Append<Option<R>>,
        <Acc as Append<Option<R>>>::Output: 'static,
    {
        let projection = self.projection.append_optional_alias(alias);
        JoinClause::new(self.clauses, projection, JoinType::FullOuter, alias.any())
    }

    /// Replaces the projection with one expression.
    #[must_use]
    pub fn select<T: 'static, E: IntoExpression<T>>(
        self,
        expression: E,
    ) -> SelectBuilder<(T,), Projecting> {
        self.project(false, expression, None)
    }

    /// Replaces the projection with one expression under an explicit label.
    #[must_use]
    pub fn select_as<T: 'static, E: IntoExpression<T>>(
        self,
        expression: E,
        label: &str,
    ) -> SelectBuilder<(T,), Projecting> {
        self.project(false, expression, Some(label.to_string()))
    }

    /// Replaces the projection with one expression, selecting distinct rows.
    #[must_use]
    pub fn select_distinct<T: 'static, E: IntoExpression<T>>(
        self,
        expression: E,
    ) -> SelectBuilder<(T,), Projecting> {
        self.project(true, expression, None)
    }

    /// Replaces the projection with rows of the target's table, assembled
    /// from the columns given to [`SelectBuilder::assign`].
    ///
    /// Each assigned column is labelled `<target>_<COLUMN>`; columns never
    /// assigned read as NULL.
    ///
    /// ```ignore
    /// let v = db.alias::<PartView>("v");
    /// let select = db
    ///     .from(&pt)
    ///     .join(&m)
    ///     .on_foreign_key(ForeignKeyJoin::from::<Part>())
    ///     .select_into(&v)
    ///     .assign(PartView::part_name(), pt.col(Part::name()))
    ///     .assign(PartView::manufacturer_name(), m.col(Manufacturer::name()))
    ///     .build()?;
    /// // select pt.NAME as v_PART_NAME, m.NAME as v_MANUFACTURER_NAME from ...
    /// ```
    #[must_use]
    pub fn select_into<R: Table>(self, target: &Alias<R>) -> SelectBuilder<(R,), Assigning> {
        let mut clauses = self.clauses;
        if target.any().table_meta().is_none() {
            clauses.record(Error::NoSuchAlias {
                table: R::TYPE_NAME.to_string(),
                alias: Some(target.name().to_string()),
            });
        }
        SelectBuilder {
            clauses,
            projection: Projection::into_row(target),
            _stage: PhantomData,
        }
    }

    fn project<T: 'static, E: IntoExpression<T>>(
        self,
        distinct: bool,
        expression: E,
        label: Option<String>,
    ) -> SelectBuilder<(T,), Projecting> {
        SelectBuilder {
            clauses: self.clauses,
            projection: Projection::empty(distinct).append(expression.into_expression(), label),
            _stage: PhantomData,
        }
    }
}

impl<Acc: 'static, S: CanProject> SelectBuilder<Acc, S> {
    /// Appends a column to the projection.
    #[must_use]
    pub fn comma<T: 'static, E: IntoExpression<T>>(
        self,
        expression: E,
    ) -> SelectBuilder<Acc::Output, Projecting>
    where
        Acc: Append<T>,
        Acc::Output: 'static,
    {
        SelectBuilder {
            clauses: self.clauses,
            projection: self.projection.append(expression.into_expression(), None),
            _stage: PhantomData,
        }
    }

    /// Appends a column to the projection under an explicit label.
    #[must_use]
    pub fn comma_as<T: 'static, E: IntoExpression<T>>(
        self,
        expression: E,
        label: &str,
    ) -> SelectBuilder<Acc::Output, Projecting>
    where
        Acc: Append<T>,
        Acc::Output: 'static,
    {
        SelectBuilder {
            clauses: self.clauses,
            projection: self
                .projection
                .append(expression.into_expression(), Some(label.to_string())),
            _stage: PhantomData,
        }
    }
}

impl<Acc> SelectBuilder<Acc, Joined> {
    /// Extends the last join's ON clause with `and`.
    #[must_use]
    pub fn and(mut self, condition: Condition) -> Self {
        self.extend_on(BoolOp::And, condition);
        self
    }

    /// Extends the last join's ON clause with `or`.
    #[must_use]
    pub fn or(mut self, condition: Condition) -> Self {
        self.extend_on(BoolOp::Or, condition);
        self
    }

    fn extend_on(&mut self, op: BoolOp, condition: Condition) {
        if let Some(on) = self.clauses.from.last_on_mut() {
            on.push(op, condition);
        }
    }
}

impl<R: Table> SelectBuilder<(R,), Assigning> {
    /// Selects `source` as the `target` column of the `select_into` row.
    #[must_use]
    pub fn assign<C, E>(mut self, target: ColumnRef<C>, source: E) -> Self
    where
        C: Column<Table = R>,
        E: IntoExpression<C::Type>,
    {
        let source: Arc<dyn Expression> = Arc::new(source.into_expression());
        if let Err(error) = self.projection.assign(target.property(), source) {
            self.clauses.record(error);
        }
        self
    }
}

impl<Acc, S: CanFilter> SelectBuilder<Acc, S> {
    /// Starts the WHERE clause.
    #[must_use]
    pub fn where_clause(mut self, condition: Condition) -> SelectBuilder<Acc, Filtering> {
        self.clauses.where_clause.push(BoolOp::And, condition);
        self.into_stage()
    }
}

impl<Acc> SelectBuilder<Acc, Filtering> {
    /// Extends the WHERE clause with `and`.
    #[must_use]
    pub fn and(mut self, condition: Condition) -> Self {
        self.clauses.where_clause.push(BoolOp::And, condition);
        self
    }

    /// Extends the WHERE clause with `or`.
    #[must_use]
    pub fn or(mut self, condition: Condition) -> Self {
        self.clauses.where_clause.push(BoolOp::Or, condition);
        self
    }
}

impl<Acc, S: CanGroup> SelectBuilder<Acc, S> {
    /// Adds a GROUP BY term.
    #[must_use]
    pub fn group_by<T, E: IntoExpression<T>>(mut self, expression: E) -> SelectBuilder<Acc, Grouping> {
        self.clauses
            .group_by
            .push(Arc::new(expression.into_expression()));
        self.into_stage()
    }
}

impl<Acc> SelectBuilder<Acc, Grouping> {
    /// Starts the HAVING clause.
    #[must_use]
    pub fn having(mut self, condition: Condition) -> SelectBuilder<Acc, Having> {
        self.clauses.having.push(BoolOp::And, condition);
        self.into_stage()
    }
}

impl<Acc> SelectBuilder<Acc, Having> {
    /// Extends the HAVING clause with `and`.
    #[must_use]
    pub fn and(mut self, condition: Condition) -> Self {
        self.clauses.having.push(BoolOp::And, condition);
        self
    }

    /// Extends the HAVING clause with `or`.
    #[must_use]
    pub fn or(mut self, condition: Condition) -> Self {
        self.clauses.having.push(BoolOp::Or, condition);
        self
    }
}

impl<Acc: Flatten, S: CanUnion> SelectBuilder<Acc, S> {
    /// Appends `union <other>`.
    #[must_use]
    pub fn union(self, other: &Select<Acc::Output>) -> SelectBuilder<Acc, Unioned> {
        self.set_operation(UnionType::Union, other)
    }

    /// Appends `union all <other>`.
    #[must_use]
    pub fn union_all(self, other: &Select<Acc::Output>) -> SelectBuilder<Acc, Unioned> {
        self.set_operation(UnionType::UnionAll, other)
    }

    fn set_operation(
        mut self,
        union_type: UnionType,
        other: &Select<Acc::Output>,
    ) -> SelectBuilder<Acc, Unioned> {
        let width = self.projection.columns.width();
        let other_width = other.node().width();
        if width != other_width {
            self.clauses.record(Error::ShapeMismatch(format!(
                "{} of {width} columns with {other_width} columns",
                union_type.as_sql()
            )));
        }
        self.clauses
            .unions
            .push((union_type, Arc::clone(other.node())));
        self.into_stage()
    }
}

/// A join waiting for its ON condition.
pub struct JoinClause<Acc> {
    builder: SelectBuilder<Acc, Joined>,
    join_type: JoinType,
    alias: AnyAlias,
    validate: bool,
}

impl<Acc> JoinClause<Acc> {
    fn new(
        mut clauses: Clauses,
        projection: Projection<Acc>,
        join_type: JoinType,
        alias: &AnyAlias,
    ) -> Self {
        if clauses.scope.aliases().iter().any(|a| a.name() == alias.name()) {
            clauses.record(Error::AmbiguousAlias(alias.name().to_string()));
        }
        // Joined aliases share the frame of the statement's FROM source
        clauses.scope = clauses.scope.extend(alias);
        Self {
            builder: SelectBuilder {
                clauses,
                projection,
                _stage: PhantomData,
            },
            join_type,
            alias: alias.clone(),
            validate: true,
        }
    }

    /// Whether the ON clause is checked to reference the joined alias, and
    /// foreign keys resolved when the join is built. Defaults to `true`.
    #[must_use]
    pub const fn validate(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }

    /// Completes the join with an explicit condition.
    #[must_use]
    pub fn on(self, condition: Condition) -> SelectBuilder<Acc, Joined> {
        let Self {
            mut builder,
            join_type,
            alias,
            validate,
        } = self;
        if !validate {
            warn!(alias = alias.name(), join = join_type.as_sql(), "Join built without validation");
        }
        let mut on = BooleanChain::default();
        on.push(BoolOp::And, condition);
        builder.clauses.from = builder.clauses.from.join(join_type, alias, on, validate);
        builder
    }

    /// Completes the join with a condition derived from a foreign key.
    #[must_use]
    pub fn on_foreign_key(mut self, join: ForeignKeyJoin) -> SelectBuilder<Acc, Joined> {
        let condition = if self.validate {
            match ForeignKeyCondition::eager(
                self.alias.clone(),
                join.clone(),
                &self.builder.clauses.scope,
            ) {
                Ok(condition) => condition,
                Err(error) => {
                    self.builder.clauses.record(error);
                    ForeignKeyCondition::deferred(self.alias.clone(), join)
                }
            }
        } else {
            ForeignKeyCondition::deferred(self.alias.clone(), join)
        };
        self.on(Condition::foreign_key(condition))
    }
}
