//! sqlweave - compile typed expression trees into parameterized SQL.
//!
//! sqlweave is the query-compiler core of a data-access library, providing:
//!
//! - Entity metadata from a derive macro, resolved once and cached
//! - A typed expression tree for predicates, projections and assignments
//! - Translation to SQL Server, MySQL, PostgreSQL, Oracle and SQLite
//! - Pagination rewriting, including pre-2012 SQL Server and pre-12c Oracle
//!
//! It never talks to a database: the output is SQL text plus an ordered list
//! of bound parameters, ready for whatever driver the caller uses.
//!
//! # Quick Start
//!
//! ```ignore
//! use sqlweave::prelude::*;
//!
//! #[derive(Entity, Debug)]
//! #[sqlweave(table = "Users")]
//! struct User {
//!     #[sqlweave(primary_key, identity)]
//!     id: Option<i64>,
//!     name: String,
//!     age: Option<i32>,
//! }
//!
//! fn main_example() -> Result<()> {
//!     let options = CompileOptions::new(Dialect::PostgreSql);
//!
//!     // Insert, reading back the generated key
//!     let user = User { id: None, name: "Ada".to_string(), age: Some(36) };
//!     let insert = insert!(User, &user)
//!         .with_options(options.clone())
//!         .returning_identity()?
//!         .build()?;
//!
//!     // Query
//!     let adults = select!(User)
//!         .with_options(options.clone())
//!         .filter(QueryNode::column::<User>("age").gt(18))
//!         .order_by(QueryNode::column::<User>("name"), [OrderDirection::Asc])
//!         .page(1, 20)?;
//!
//!     // Delete
//!     let delete = delete!(User).with_options(options).by_key([1_i64])?.build()?;
//!     Ok(())
//! }
//! ```
//!
//! # Features
//!
//! - **No runtime reflection**: column metadata is generated at compile time
//! - **Flag-based negation**: `NOT` is pushed down into operators, never emitted
//! - **Deterministic output**: equal trees and options give equal SQL
//! - **Strategy objects**: replica selection is injected, with no global state

// Re-export all public types from sub-crates
pub use sqlweave_core::{
    ColumnInfo,
    ColumnMetadata,
    ConfigError,
    Entity,
    EntityMetadata,
    Error,
    // Replica selection
    LoadBalancer,
    MetadataError,
    MetadataErrorKind,
    Result,
    RoundRobin,
    TranslationError,
    TranslationErrorKind,
    Value,
    WeightedRandom,
    resolve,
};

pub use sqlweave_macros::Entity;

pub use sqlweave_query::{
    BinaryOperator, Clause, CompileOptions, CompiledQuery, Delete, Dialect, Insert, JoinType,
    Method, NodeKind, OrderDirection, PageRequest, PagedQuery, QueryNode, ROW_NUMBER_COLUMN,
    Select, SqlBuildContext, SqlParameter, UnaryOperator, Update, delete, insert, paginate,
    select, translate, update,
};

/// Compile a single node for one clause with a fresh context.
///
/// The default entity gives unowned members and constant keys a table to
/// resolve against.
///
/// # Example
///
/// ```ignore
/// let (sql, params) = sqlweave::compile_fragment::<User>(
///     &QueryNode::column::<User>("name").eq(QueryNode::null()),
///     Clause::Where,
///     &CompileOptions::default(),
/// )?;
/// assert_eq!(sql, "name IS NULL");
/// ```
pub fn compile_fragment<E: Entity>(
    node: &QueryNode,
    clause: Clause<'_>,
    options: &CompileOptions,
) -> Result<(String, Vec<SqlParameter>)> {
    let mut ctx = SqlBuildContext::new(options.clone()).with_default_entity(resolve::<E>());
    translate(node, clause, &mut ctx)?;
    let (sql, parameters) = ctx.into_parts();
    tracing::debug!(sql = %sql, params = parameters.len(), clause = clause.name(), "Compiled fragment");
    Ok((sql, parameters))
}

/// Prelude module for convenient imports.
///
/// ```ignore
/// use sqlweave::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        Clause,
        CompileOptions,
        CompiledQuery,
        // Statements
        Delete,
        Dialect,
        // Core types (Entity is both the trait and the derive)
        Entity,
        Error,
        Insert,
        JoinType,
        Method,
        OrderDirection,
        PagedQuery,
        // Expression tree
        QueryNode,
        Result,
        Select,
        SqlParameter,
        Update,
        Value,
        compile_fragment,
        // Macros
        delete,
        insert,
        select,
        update,
    };
}
