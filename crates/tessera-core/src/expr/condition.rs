//! Boolean conditions for WHERE, HAVING and ON clauses.

use std::any::TypeId;
use std::fmt;
use std::sync::Arc;

use crate::alias::AnyAlias;
use crate::error::{Error, Result};
use crate::label::next_label;
use crate::schema::Table;
use crate::scope::Scope;
use crate::select::{Select, SelectNode};
use crate::value::SqlValue;

use super::{collect_args, operand_sql, precedence, Expression};

enum Node {
    Comparison {
        lhs: Arc<dyn Expression>,
        op: &'static str,
        rhs: Arc<dyn Expression>,
    },
    Between {
        expr: Arc<dyn Expression>,
        low: Arc<dyn Expression>,
        high: Arc<dyn Expression>,
    },
    InList {
        expr: Arc<dyn Expression>,
        items: Vec<Arc<dyn Expression>>,
    },
    InSelect {
        expr: Arc<dyn Expression>,
        select: Arc<SelectNode>,
    },
    IsNull {
        expr: Arc<dyn Expression>,
        negated: bool,
    },
    Exists {
        select: Arc<SelectNode>,
        negated: bool,
    },
    Not(Condition),
    And(Condition, Condition),
    Or(Condition, Condition),
    ForeignKey(ForeignKeyCondition),
}

/// A boolean predicate.
///
/// Combining with [`Condition::and`] and [`Condition::or`] builds a tree that
/// is parenthesized by operator precedence, so `a.or(b).and(c)` renders as
/// `(a or b) and c`.
#[derive(Clone)]
pub struct Condition {
    node: Arc<Node>,
    label: String,
}

impl fmt::Debug for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Condition")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

impl Condition {
    fn new(node: Node) -> Self {
        Self {
            node: Arc::new(node),
            label: next_label("condition"),
        }
    }

    pub(crate) fn comparison<L, R>(lhs: L, op: &'static str, rhs: R) -> Self
    where
        L: Expression + 'static,
        R: Expression + 'static,
    {
        Self::new(Node::Comparison {
            lhs: Arc::new(lhs),
            op,
            rhs: Arc::new(rhs),
        })
    }

    pub(crate) fn between<E, L, H>(expr: E, low: L, high: H) -> Self
    where
        E: Expression + 'static,
        L: Expression + 'static,
        H: Expression + 'static,
    {
        Self::new(Node::Between {
            expr: Arc::new(expr),
            low: Arc::new(low),
            high: Arc::new(high),
        })
    }

    pub(crate) fn in_list<E: Expression + 'static>(
        expr: E,
        items: Vec<Arc<dyn Expression>>,
    ) -> Self {
        Self::new(Node::InList {
            expr: Arc::new(expr),
            items,
        })
    }

    pub(crate) fn in_select<E: Expression + 'static, RT>(expr: E, select: &Select<RT>) -> Self {
        Self::new(Node::InSelect {
            expr: Arc::new(expr),
            select: Arc::clone(select.node()),
        })
    }

    pub(crate) fn is_null<E: Expression + 'static>(expr: E, negated: bool) -> Self {
        Self::new(Node::IsNull {
            expr: Arc::new(expr),
            negated,
        })
    }

    pub(crate) fn foreign_key(condition: ForeignKeyCondition) -> Self {
        Self::new(Node::ForeignKey(condition))
    }

    /// `self and other`
    #[must_use]
    pub fn and(self, other: Self) -> Self {
        Self::new(Node::And(self, other))
    }

    /// `self or other`
    #[must_use]
    pub fn or(self, other: Self) -> Self {
        Self::new(Node::Or(self, other))
    }
}

/// `not condition`
#[must_use]
pub fn not(condition: Condition) -> Condition {
    Condition::new(Node::Not(condition))
}

/// `exists (select ...)`
#[must_use]
pub fn exists<RT>(select: &Select<RT>) -> Condition {
    Condition::new(Node::Exists {
        select: Arc::clone(select.node()),
        negated: false,
    })
}

/// `not exists (select ...)`
#[must_use]
pub fn not_exists<RT>(select: &Select<RT>) -> Condition {
    Condition::new(Node::Exists {
        select: Arc::clone(select.node()),
        negated: true,
    })
}

impl Expression for Condition {
    fn sql(&self, scope: &Scope) -> Result<String> {
        let cmp = precedence::COMPARISON;
        Ok(match self.node.as_ref() {
            Node::Comparison { lhs, op, rhs } => format!(
                "{} {op} {}",
                operand_sql(&**lhs, scope, cmp)?,
                operand_sql(&**rhs, scope, cmp)?
            ),
            Node::Between { expr, low, high } => format!(
                "{} between {} and {}",
                operand_sql(&**expr, scope, cmp)?,
                operand_sql(&**low, scope, cmp)?,
                operand_sql(&**high, scope, cmp)?
            ),
            Node::InList { expr, items } => {
                let items = items
                    .iter()
                    .map(|i| i.sql(scope))
                    .collect::<Result<Vec<_>>>()?;
                format!(
                    "{} in ({})",
                    operand_sql(&**expr, scope, cmp)?,
                    items.join(", ")
                )
            }
            Node::InSelect { expr, select } => format!(
                "{} in {}",
                operand_sql(&**expr, scope, cmp)?,
                select.sql(scope)?
            ),
            Node::IsNull { expr, negated } => format!(
                "{} is {}null",
                operand_sql(&**expr, scope, cmp)?,
                if *negated { "not " } else { "" }
            ),
            Node::Exists { select, negated } => format!(
                "{}exists {}",
                if *negated { "not " } else { "" },
                select.sql(scope)?
            ),
            Node::Not(inner) => format!("not {}", operand_sql(inner, scope, precedence::ATOM)?),
            Node::And(lhs, rhs) => format!(
                "{} and {}",
                operand_sql(lhs, scope, precedence::AND)?,
                operand_sql(rhs, scope, precedence::AND)?
            ),
            Node::Or(lhs, rhs) => format!(
                "{} or {}",
                operand_sql(lhs, scope, precedence::OR)?,
                operand_sql(rhs, scope, precedence::OR)?
            ),
            Node::ForeignKey(fk) => fk.sql(scope)?,
        })
    }

    fn args(&self, scope: &Scope) -> Result<Vec<SqlValue>> {
        match self.node.as_ref() {
            Node::Comparison { lhs, rhs, .. } => collect_args([&**lhs, &**rhs], scope),
            Node::Between { expr, low, high } => {
                collect_args([&**expr, &**low, &**high], scope)
            }
            Node::InList { expr, items } => collect_args(
                std::iter::once(&**expr).chain(items.iter().map(|i| &**i)),
                scope,
            ),
            Node::InSelect { expr, select } => {
                let mut args = expr.args(scope)?;
                args.extend(select.args(scope)?);
                Ok(args)
            }
            Node::IsNull { expr, .. } => expr.args(scope),
            Node::Exists { select, .. } => select.args(scope),
            Node::Not(inner) => inner.args(scope),
            Node::And(lhs, rhs) | Node::Or(lhs, rhs) => {
                collect_args([lhs as &dyn Expression, rhs as &dyn Expression], scope)
            }
            Node::ForeignKey(_) => Ok(Vec::new()),
        }
    }

    fn label(&self, _scope: &Scope) -> Result<String> {
        Ok(self.label.clone())
    }

    fn precedence(&self) -> u8 {
        match self.node.as_ref() {
            Node::Comparison { .. }
            | Node::Between { .. }
            | Node::InList { .. }
            | Node::InSelect { .. }
            | Node::IsNull { .. }
            | Node::Exists { .. }
            | Node::ForeignKey(_) => precedence::COMPARISON,
            Node::Not(_) => precedence::NOT,
            Node::And(..) => precedence::AND,
            Node::Or(..) => precedence::OR,
        }
    }
}

/// How conditions are appended to a WHERE, HAVING or ON chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BoolOp {
    And,
    Or,
}

/// A flat chain of conditions built by `where`/`and`/`or` calls.
///
/// Rendered left to right without regrouping: `a or b and c`. Compound
/// operands are parenthesized.
#[derive(Clone, Default)]
pub(crate) struct BooleanChain {
    terms: Vec<(BoolOp, Condition)>,
}

impl BooleanChain {
    pub(crate) fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub(crate) fn push(&mut self, op: BoolOp, condition: Condition) {
        self.terms.push((op, condition));
    }

    pub(crate) fn sql(&self, scope: &Scope) -> Result<String> {
        let mut sql = String::new();
        for (i, (op, condition)) in self.terms.iter().enumerate() {
            if i > 0 {
                sql.push_str(match op {
                    BoolOp::And => " and ",
                    BoolOp::Or => " or ",
                });
            }
            sql.push_str(&operand_sql(condition, scope, precedence::AND + 1)?);
        }
        Ok(sql)
    }

    pub(crate) fn args(&self, scope: &Scope) -> Result<Vec<SqlValue>> {
        collect_args(self.terms.iter().map(|(_, c)| c as &dyn Expression), scope)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    /// The joined alias is the parent; the child is already in scope.
    ChildToParent,
    /// The joined alias is the child; the parent is already in scope.
    ParentToChild,
}

/// Describes a join condition derived from a declared foreign key.
///
/// ```ignore
/// db.from(&part)
///     .join(&manufacturer)
///     .on_foreign_key(ForeignKeyJoin::from::<Part>())
/// ```
#[derive(Debug, Clone)]
pub struct ForeignKeyJoin {
    direction: Direction,
    other_type: TypeId,
    other_type_name: &'static str,
    other_alias: Option<String>,
    key_name: Option<String>,
}

impl ForeignKeyJoin {
    /// Joins a parent table from the child table `C` already in scope.
    #[must_use]
    pub fn from<C: Table>() -> Self {
        Self {
            direction: Direction::ChildToParent,
            other_type: TypeId::of::<C>(),
            other_type_name: C::TYPE_NAME,
            other_alias: None,
            key_name: None,
        }
    }

    /// Joins a child table from the parent table `P` already in scope.
    #[must_use]
    pub fn to<P: Table>() -> Self {
        Self {
            direction: Direction::ParentToChild,
            other_type: TypeId::of::<P>(),
            other_type_name: P::TYPE_NAME,
            other_alias: None,
            key_name: None,
        }
    }

    /// Selects the foreign key by name.
    #[must_use]
    pub fn named(mut self, key_name: &str) -> Self {
        self.key_name = Some(key_name.to_string());
        self
    }

    /// Selects the alias already in scope by name.
    #[must_use]
    pub fn alias(mut self, alias: &str) -> Self {
        self.other_alias = Some(alias.to_string());
        self
    }

    /// Resolves the key into `(joined column, other column)` pairs.
    fn resolve(&self, joined: &AnyAlias, scope: &Scope) -> Result<ResolvedKey> {
        let other =
            scope.find_alias_of(self.other_type, self.other_type_name, self.other_alias.as_deref())?;
        let no_key = || Error::NoForeignKey {
            child: joined.row_type_name().to_string(),
            parent: other.row_type_name().to_string(),
            name: self.key_name.clone(),
        };
        let joined_meta = joined.table_meta().ok_or_else(no_key)?;
        let other_meta = other.table_meta().ok_or_else(no_key)?;
        let (child, parent) = match self.direction {
            Direction::ChildToParent => (other_meta, joined_meta),
            Direction::ParentToChild => (joined_meta, other_meta),
        };

        let key = child.foreign_key_to(parent, self.key_name.as_deref())?;
        let mut pairs = Vec::with_capacity(key.columns.len());
        for (child_property, parent_property) in key.columns {
            let child_column = child.column_name_for(child_property)?.to_string();
            let parent_column = parent.column_name_for(parent_property)?.to_string();
            pairs.push(match self.direction {
                Direction::ChildToParent => (parent_column, child_column),
                Direction::ParentToChild => (child_column, parent_column),
            });
        }
        Ok(ResolvedKey { other, pairs })
    }
}

#[derive(Clone)]
struct ResolvedKey {
    other: AnyAlias,
    pairs: Vec<(String, String)>,
}

/// A join condition on a foreign key, resolved eagerly when the join is
/// validated and at render time otherwise.
#[derive(Clone)]
pub(crate) struct ForeignKeyCondition {
    joined: AnyAlias,
    join: ForeignKeyJoin,
    resolved: Option<ResolvedKey>,
}

impl ForeignKeyCondition {
    pub(crate) fn eager(joined: AnyAlias, join: ForeignKeyJoin, scope: &Scope) -> Result<Self> {
        let resolved = join.resolve(&joined, scope)?;
        Ok(Self {
            joined,
            join,
            resolved: Some(resolved),
        })
    }

    pub(crate) const fn deferred(joined: AnyAlias, join: ForeignKeyJoin) -> Self {
        Self {
            joined,
            join,
            resolved: None,
        }
    }

    fn sql(&self, scope: &Scope) -> Result<String> {
        let key = match &self.resolved {
            Some(key) => key.clone(),
            None => self.join.resolve(&self.joined, scope)?,
        };
        scope.note_usage(&self.joined);
        scope.note_usage(&key.other);
        let joined = self.joined.name();
        let other = key.other.name();
        let pairs = key
            .pairs
            .iter()
            .map(|(joined_column, other_column)| {
                format!("{joined}.{joined_column} = {other}.{other_column}")
            })
            .collect::<Vec<_>>();
        // Composite keys parenthesize themselves so the text does not depend
        // on whether the key was resolved eagerly.
        Ok(match pairs.as_slice() {
            [single] => single.clone(),
            _ => format!("({})", pairs.join(" and ")),
        })
    }
}
