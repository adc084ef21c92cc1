//! Entity trait for struct-to-table mapping.
//!
//! The `Entity` trait is the static registration point for table metadata.
//! It is typically derived using `#[derive(Entity)]` from `sqlweave-macros`.

use crate::field::ColumnInfo;
use crate::value::Value;

/// Trait for types that can be mapped to database tables.
///
/// # Example
///
/// ```ignore
/// use sqlweave::Entity;
///
/// #[derive(Entity)]
/// #[sqlweave(table = "Users")]
/// struct User {
///     #[sqlweave(primary_key, identity)]
///     id: Option<i64>,
///     name: String,
///     age: Option<i32>,
/// }
/// ```
pub trait Entity: Sized + Send + Sync + 'static {
    /// The Rust type name.
    const TYPE_NAME: &'static str;

    /// Explicit table name override (`None` uses the type name).
    const TABLE_NAME: Option<&'static str> = None;

    /// Optional schema qualifier.
    const SCHEMA: Option<&'static str> = None;

    /// Column declarations in property declaration order.
    fn columns() -> &'static [ColumnInfo];

    /// Property values of this instance, in declaration order.
    fn to_row(&self) -> Vec<(&'static str, Value)>;
}
