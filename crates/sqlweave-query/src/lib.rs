//! Expression-tree-to-SQL compiler for sqlweave.
//!
//! `sqlweave-query` is the **translation layer**. It turns a typed
//! [`QueryNode`] tree plus entity metadata into parameterized SQL text for
//! one of five dialects.
//!
//! # Role In The Architecture
//!
//! - **Expression tree**: [`QueryNode`] and its fluent constructors describe
//!   predicates, projections, assignments and ordering.
//! - **Translation**: [`translate`] walks a node for one [`Clause`],
//!   writing SQL and bound parameters into a [`SqlBuildContext`].
//! - **Statements**: `select!`, `insert!`, `update!`, `delete!` build the
//!   four statement kinds; [`paginate`] rewrites a query into a page plus
//!   its count query.
//!
//! Nothing here executes SQL. Most users access these types via the
//! `sqlweave` facade crate.

pub mod builder;
pub mod clause;
pub mod context;
pub mod dialect;
pub mod methods;
pub mod node;
pub mod options;
pub mod pagination;
pub mod translate;

pub use builder::{CompiledQuery, Delete, Insert, Select, Update};
pub use clause::{Clause, JoinType, OrderDirection, has_direction};
pub use context::{SqlBuildContext, SqlParameter};
pub use dialect::Dialect;
pub use methods::Method;
pub use node::{BinaryOperator, NodeKind, QueryNode, UnaryOperator};
pub use options::CompileOptions;
pub use pagination::{PageRequest, PagedQuery, ROW_NUMBER_COLUMN, paginate};
pub use translate::translate;

/// Create a SELECT query for an entity.
///
/// # Example
///
/// ```ignore
/// let query = select!(User)
///     .filter(QueryNode::column::<User>("Age").gt(18))
///     .order_by(QueryNode::column::<User>("Name"), [OrderDirection::Asc])
///     .build()?;
/// ```
#[macro_export]
macro_rules! select {
    ($entity:ty) => {
        $crate::Select::<$entity>::new()
    };
}

/// Create an INSERT query for an entity, optionally seeded with one row.
///
/// # Example
///
/// ```ignore
/// let query = insert!(User, &user)
///     .returning_identity()?
///     .build()?;
/// ```
#[macro_export]
macro_rules! insert {
    ($entity:ty) => {
        $crate::Insert::<$entity>::new()
    };
    ($entity:ty, $value:expr) => {
        $crate::Insert::<$entity>::new().entity($value)
    };
}

/// Create an UPDATE query for an entity.
///
/// # Example
///
/// ```ignore
/// let query = update!(User)
///     .set(QueryNode::construct_for::<User>([("Name", QueryNode::constant("n"))]))
///     .filter(QueryNode::column::<User>("Id").eq(7))
///     .build()?;
/// ```
#[macro_export]
macro_rules! update {
    ($entity:ty) => {
        $crate::Update::<$entity>::new()
    };
}

/// Create a DELETE query for an entity.
///
/// # Example
///
/// ```ignore
/// let query = delete!(User)
///     .filter(QueryNode::column::<User>("Age").lt(18))
///     .build()?;
/// ```
#[macro_export]
macro_rules! delete {
    ($entity:ty) => {
        $crate::Delete::<$entity>::new()
    };
}
