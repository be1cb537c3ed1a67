//! Name resolution.
//!
//! A [`Scope`] is a chain of frames, innermost first. Each frame holds the
//! aliases visible at one nesting level: the tables of a statement's FROM
//! clause, then those of the statement it is nested in, and so on outward.
//! Scopes are immutable; every extension returns a new scope that shares the
//! frames it extends.

use std::any::TypeId;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::trace;

use crate::alias::AnyAlias;
use crate::database::Database;
use crate::dialect::Dialect;
use crate::error::{Error, Result};
use crate::schema::Table;

struct Tracker {
    target: AnyAlias,
    used: Arc<AtomicBool>,
}

struct Frame {
    database: Database,
    aliases: Vec<AnyAlias>,
    outer: Option<Scope>,
    tracker: Option<Tracker>,
}

/// A chained name-resolution context.
#[derive(Clone)]
pub struct Scope {
    frame: Arc<Frame>,
}

impl Scope {
    /// An outermost scope with no aliases.
    #[must_use]
    pub fn new(database: &Database) -> Self {
        Self::with_aliases(database, Vec::new())
    }

    /// An outermost scope holding `aliases` in one frame.
    #[must_use]
    pub fn with_aliases(database: &Database, aliases: Vec<AnyAlias>) -> Self {
        Self {
            frame: Arc::new(Frame {
                database: database.clone(),
                aliases,
                outer: None,
                tracker: None,
            }),
        }
    }

    fn nested(outer: &Self, aliases: Vec<AnyAlias>) -> Self {
        Self {
            frame: Arc::new(Frame {
                database: outer.frame.database.clone(),
                aliases,
                outer: Some(outer.clone()),
                tracker: None,
            }),
        }
    }

    /// The database this scope renders for.
    #[must_use]
    pub fn database(&self) -> &Database {
        &self.frame.database
    }

    /// The dialect this scope renders for.
    #[must_use]
    pub fn dialect(&self) -> &dyn Dialect {
        self.frame.database.dialect()
    }

    /// An outermost scope on the same database.
    #[must_use]
    pub fn empty(&self) -> Self {
        Self::new(&self.frame.database)
    }

    /// Returns a new scope with `alias` in a frame of its own, inside this one.
    #[must_use]
    pub fn plus(&self, alias: &AnyAlias) -> Self {
        Self::nested(self, vec![alias.clone()])
    }

    /// Returns a new scope with `alias` added to the innermost frame.
    ///
    /// Used for the tables of one FROM clause, which share a frame.
    #[must_use]
    pub fn extend(&self, alias: &AnyAlias) -> Self {
        let mut aliases = self.frame.aliases.clone();
        aliases.push(alias.clone());
        Self {
            frame: Arc::new(Frame {
                database: self.frame.database.clone(),
                aliases,
                outer: self.frame.outer.clone(),
                tracker: None,
            }),
        }
    }

    /// Grafts the frames of `inner` inside this scope.
    #[must_use]
    pub fn plus_scope(&self, inner: &Self) -> Self {
        let outer = match &inner.frame.outer {
            Some(inner_outer) => self.plus_scope(inner_outer),
            None => self.clone(),
        };
        Self::nested(&outer, inner.frame.aliases.clone())
    }

    /// Returns a new scope with an empty frame inside this one.
    #[must_use]
    pub fn enter(&self) -> Self {
        Self::nested(self, Vec::new())
    }

    /// Returns true if no frame encloses this one.
    #[must_use]
    pub fn is_outermost(&self) -> bool {
        self.frame.outer.is_none()
    }

    /// Aliases of the innermost frame.
    #[must_use]
    pub fn aliases(&self) -> &[AnyAlias] {
        &self.frame.aliases
    }

    /// Finds the alias of row type `R`, optionally by name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AmbiguousAlias`] when one frame holds several
    /// candidates, [`Error::AliasTypeMismatch`] when the named alias belongs to
    /// another table and [`Error::NoSuchAlias`] otherwise.
    pub fn find_alias<R: Table>(&self, name: Option<&str>) -> Result<AnyAlias> {
        self.find_alias_of(TypeId::of::<R>(), R::TYPE_NAME, name)
    }

    pub(crate) fn find_alias_of(
        &self,
        row_type: TypeId,
        row_type_name: &'static str,
        name: Option<&str>,
    ) -> Result<AnyAlias> {
        let mut current = Some(self);
        while let Some(scope) = current {
            if let Some(name) = name {
                let same_name = scope.frame.aliases.iter().filter(|a| a.name() == name);
                if same_name.count() > 1 {
                    return Err(Error::AmbiguousAlias(name.to_string()));
                }
            }
            let found: Vec<&AnyAlias> = scope
                .frame
                .aliases
                .iter()
                .filter(|a| a.row_type() == row_type)
                .filter(|a| name.is_none_or(|n| a.name() == n))
                .collect();
            match found.as_slice() {
                [alias] => {
                    trace!(alias = alias.name(), table = row_type_name, "Resolved alias");
                    let alias = (*alias).clone();
                    self.note_usage(&alias);
                    return Ok(alias);
                }
                [] => current = scope.frame.outer.as_ref(),
                _ => {
                    return Err(Error::AmbiguousAlias(
                        name.unwrap_or(row_type_name).to_string(),
                    ))
                }
            }
        }

        if let Some(name) = name {
            if let Some(other) = self.all_aliases().find(|a| a.name() == name) {
                return Err(Error::AliasTypeMismatch {
                    alias: name.to_string(),
                    actual: other.row_type_name().to_string(),
                    expected: row_type_name.to_string(),
                });
            }
        }
        Err(Error::NoSuchAlias {
            table: row_type_name.to_string(),
            alias: name.map(str::to_string),
        })
    }

    /// Finds an alias by name alone, innermost frame first.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AmbiguousAlias`] or [`Error::NoSuchAlias`].
    pub fn find_alias_named(&self, name: &str) -> Result<AnyAlias> {
        let mut current = Some(self);
        while let Some(scope) = current {
            let found: Vec<&AnyAlias> = scope
                .frame
                .aliases
                .iter()
                .filter(|a| a.name() == name)
                .collect();
            match found.as_slice() {
                [alias] => {
                    let alias = (*alias).clone();
                    self.note_usage(&alias);
                    return Ok(alias);
                }
                [] => current = scope.frame.outer.as_ref(),
                _ => return Err(Error::AmbiguousAlias(name.to_string())),
            }
        }
        Err(Error::NoSuchAlias {
            table: String::from("*"),
            alias: Some(name.to_string()),
        })
    }

    fn all_aliases(&self) -> impl Iterator<Item = &AnyAlias> {
        let mut frames = Vec::new();
        let mut current = Some(self);
        while let Some(scope) = current {
            frames.push(scope);
            current = scope.frame.outer.as_ref();
        }
        frames.into_iter().flat_map(|s| s.frame.aliases.iter())
    }

    /// Returns a scope that records whether `target` is resolved through it,
    /// and the flag it records into.
    pub(crate) fn tracking(&self, target: &AnyAlias) -> (Self, Arc<AtomicBool>) {
        let used = Arc::new(AtomicBool::new(false));
        let scope = Self {
            frame: Arc::new(Frame {
                database: self.frame.database.clone(),
                aliases: Vec::new(),
                outer: Some(self.clone()),
                tracker: Some(Tracker {
                    target: target.clone(),
                    used: Arc::clone(&used),
                }),
            }),
        };
        (scope, used)
    }

    /// Tells every tracker in the chain that `alias` was resolved.
    pub(crate) fn note_usage(&self, alias: &AnyAlias) {
        let mut current = Some(self);
        while let Some(scope) = current {
            if let Some(tracker) = &scope.frame.tracker {
                if tracker.target == *alias {
                    tracker.used.store(true, Ordering::Relaxed);
                }
            }
            current = scope.frame.outer.as_ref();
        }
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut frames = Vec::new();
        let mut current = Some(self);
        while let Some(scope) = current {
            let names: Vec<&str> = scope.frame.aliases.iter().map(AnyAlias::name).collect();
            frames.push(names);
            current = scope.frame.outer.as_ref();
        }
        f.debug_struct("Scope").field("frames", &frames).finish()
    }
}
