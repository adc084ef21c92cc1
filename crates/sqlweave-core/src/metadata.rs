//! Resolved entity metadata and its process-wide cache.
//!
//! [`resolve`] turns an [`Entity`]'s static declarations into an
//! [`EntityMetadata`] with all defaults applied. Results are cached per type;
//! concurrent first callers may both compute, the first to publish wins and
//! the other copy is discarded.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, LazyLock, PoisonError, RwLock};

use crate::entity::Entity;
use crate::error::{Error, MetadataError, MetadataErrorKind, Result};
use crate::field::ColumnInfo;

/// A column with defaults resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMetadata {
    /// Rust property name
    pub property: String,
    /// Database column name
    pub column: String,
    pub insertable: bool,
    pub updatable: bool,
    pub primary_key: bool,
    pub identity: bool,
    /// Sequence feeding the identity value
    pub sequence: Option<String>,
    /// Explicit database type
    pub db_type: Option<String>,
}

impl From<&ColumnInfo> for ColumnMetadata {
    fn from(info: &ColumnInfo) -> Self {
        Self {
            property: info.property.to_string(),
            column: info.column.unwrap_or(info.property).to_string(),
            insertable: info.insertable,
            updatable: info.updatable,
            primary_key: info.primary_key,
            identity: info.identity,
            sequence: info.sequence.map(str::to_string),
            db_type: info.db_type.map(str::to_string),
        }
    }
}

/// Table mapping for one entity type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityMetadata {
    /// Rust type name
    pub type_name: String,
    /// Database table name
    pub table_name: String,
    /// Optional schema qualifier
    pub schema: Option<String>,
    /// Columns in declaration order
    pub columns: Vec<ColumnMetadata>,
}

impl EntityMetadata {
    /// Build metadata from raw declarations.
    pub fn from_declarations(
        type_name: &str,
        table_name: Option<&str>,
        schema: Option<&str>,
        columns: &[ColumnInfo],
    ) -> Self {
        Self {
            type_name: type_name.to_string(),
            table_name: table_name.unwrap_or(type_name).to_string(),
            schema: schema.map(str::to_string),
            columns: columns.iter().map(ColumnMetadata::from).collect(),
        }
    }

    /// Find the column mapped to a property.
    pub fn column_for_property(&self, property: &str) -> Option<&ColumnMetadata> {
        self.columns.iter().find(|c| c.property == property)
    }

    /// Resolve a property to its column name.
    pub fn require_column(&self, property: &str) -> Result<&ColumnMetadata> {
        self.column_for_property(property).ok_or_else(|| {
            Error::Metadata(MetadataError {
                kind: MetadataErrorKind::UnknownProperty,
                entity: self.type_name.clone(),
                message: format!("{} has no mapped property '{}'", self.type_name, property),
            })
        })
    }

    /// Primary key columns in declaration order (possibly empty).
    pub fn primary_keys(&self) -> Vec<&ColumnMetadata> {
        self.columns.iter().filter(|c| c.primary_key).collect()
    }

    /// Primary key columns, or `MissingPrimaryKey` if there are none.
    pub fn require_primary_key(&self, operation: &str) -> Result<Vec<&ColumnMetadata>> {
        let keys = self.primary_keys();
        if keys.is_empty() {
            return Err(Error::missing_primary_key(&self.type_name, operation));
        }
        Ok(keys)
    }

    /// The identity column, if any.
    pub fn identity_column(&self) -> Option<&ColumnMetadata> {
        self.columns.iter().find(|c| c.identity)
    }
}

type MetadataCache = RwLock<HashMap<TypeId, Arc<EntityMetadata>>>;

static CACHE: LazyLock<MetadataCache> = LazyLock::new(|| RwLock::new(HashMap::new()));

/// Resolve (and cache) the metadata for an entity type.
pub fn resolve<E: Entity>() -> Arc<EntityMetadata> {
    let key = TypeId::of::<E>();
    {
        let cache = CACHE.read().unwrap_or_else(PoisonError::into_inner);
        if let Some(found) = cache.get(&key) {
            return Arc::clone(found);
        }
    }

    let computed = Arc::new(EntityMetadata::from_declarations(
        E::TYPE_NAME,
        E::TABLE_NAME,
        E::SCHEMA,
        E::columns(),
    ));
    tracing::trace!(
        entity = E::TYPE_NAME,
        table = %computed.table_name,
        columns = computed.columns.len(),
        "Resolved entity metadata"
    );

    let mut cache = CACHE.write().unwrap_or_else(PoisonError::into_inner);
    Arc::clone(cache.entry(key).or_insert(computed))
}
