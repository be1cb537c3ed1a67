//! FROM clauses: a single alias, or a left-associative chain of joins.

use std::sync::atomic::Ordering;

use crate::alias::AnyAlias;
use crate::error::{Error, Result};
use crate::expr::BooleanChain;
use crate::scope::Scope;
use crate::value::SqlValue;

/// Join types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JoinType {
    /// `join`
    Inner,
    /// `left join`
    LeftOuter,
    /// `right join`
    RightOuter,
    /// `full outer join`
    FullOuter,
}

impl JoinType {
    /// Returns the SQL keyword for this join type.
    #[must_use]
    pub const fn as_sql(&self) -> &'static str {
        match self {
            Self::Inner => "join",
            Self::LeftOuter => "left join",
            Self::RightOuter => "right join",
            Self::FullOuter => "full outer join",
        }
    }
}

#[derive(Clone)]
pub(crate) enum FromClause {
    Alias(AnyAlias),
    Join {
        lhs: Box<FromClause>,
        join_type: JoinType,
        alias: AnyAlias,
        on: BooleanChain,
        validate: bool,
    },
}

impl FromClause {
    pub(crate) fn join(
        self,
        join_type: JoinType,
        alias: AnyAlias,
        on: BooleanChain,
        validate: bool,
    ) -> Self {
        Self::Join {
            lhs: Box::new(self),
            join_type,
            alias,
            on,
            validate,
        }
    }

    /// The ON chain of the last join, if any.
    pub(crate) fn last_on_mut(&mut self) -> Option<&mut BooleanChain> {
        match self {
            Self::Alias(_) => None,
            Self::Join { on, .. } => Some(on),
        }
    }

    /// Every alias in the clause, left to right.
    pub(crate) fn aliases(&self) -> Vec<&AnyAlias> {
        match self {
            Self::Alias(alias) => vec![alias],
            Self::Join { lhs, alias, .. } => {
                let mut aliases = lhs.aliases();
                aliases.push(alias);
                aliases
            }
        }
    }

    /// The clause text, with its leading space.
    pub(crate) fn sql(&self, scope: &Scope) -> Result<String> {
        match self {
            Self::Alias(alias) => {
                if alias.is_dual() && !scope.dialect().requires_from_dual() {
                    Ok(String::new())
                } else {
                    Ok(format!(" from {}", alias.from_sql(scope)?))
                }
            }
            Self::Join {
                lhs,
                join_type,
                alias,
                on,
                validate,
            } => {
                let lhs = lhs.sql(scope)?;
                let target = alias.from_sql(scope)?;
                let on = if *validate {
                    // The condition must reference the alias it joins
                    let (tracked, used) = scope.tracking(alias);
                    let on = on.sql(&tracked)?;
                    if !used.load(Ordering::Relaxed) {
                        return Err(Error::InvalidJoin(alias.name().to_string()));
                    }
                    on
                } else {
                    on.sql(scope)?
                };
                Ok(format!("{lhs} {} {target} on {on}", join_type.as_sql()))
            }
        }
    }

    pub(crate) fn args(&self, scope: &Scope) -> Result<Vec<SqlValue>> {
        match self {
            Self::Alias(alias) => alias.from_args(scope),
            Self::Join { lhs, alias, on, .. } => {
                let mut args = lhs.args(scope)?;
                args.extend(alias.from_args(scope)?);
                args.extend(on.args(scope)?);
                Ok(args)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_keywords() {
        assert_eq!(JoinType::Inner.as_sql(), "join");
        assert_eq!(JoinType::LeftOuter.as_sql(), "left join");
        assert_eq!(JoinType::RightOuter.as_sql(), "right join");
        assert_eq!(JoinType::FullOuter.as_sql(), "full outer join");
    }
}
