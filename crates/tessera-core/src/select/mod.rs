//! Select statements: the typestate builder, the built statement and common
//! table expressions.

mod builder;
mod cte;
mod ordering;
mod statement;

pub use builder::{
    Assigning, CanFilter, CanGroup, CanJoin, CanProject, CanUnion, Filtering, Grouping, Having,
    JoinClause, Joined, Joining, Ordering, Projecting, SelectBuilder, Unioned,
};
pub use cte::{CommonTableExpression, CteBuilder};
pub use ordering::Order;
pub use statement::{Select, UnionType};

pub(crate) use cte::CteNode;
pub(crate) use statement::SelectNode;
