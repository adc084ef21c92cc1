//! Static column declarations.
//!
//! `ColumnInfo` is what an `Entity` impl declares about each mapped property.
//! The metadata resolver turns these declarations into resolved
//! [`ColumnMetadata`](crate::metadata::ColumnMetadata) with defaults applied.

/// Declared metadata about an entity property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnInfo {
    /// Rust property name
    pub property: &'static str,
    /// Explicit column name override; `None` means "same as property"
    pub column: Option<&'static str>,
    /// Whether the column may appear in INSERT statements
    pub insertable: bool,
    /// Whether the column may appear in UPDATE ... SET
    pub updatable: bool,
    /// Whether this is (part of) the primary key
    pub primary_key: bool,
    /// Whether the database generates the value
    pub identity: bool,
    /// Sequence feeding the identity value (Oracle)
    pub sequence: Option<&'static str>,
    /// Explicit database type name (e.g. `"NVARCHAR(50)"`)
    pub db_type: Option<&'static str>,
}

impl ColumnInfo {
    /// Declare a plain insertable/updatable column for a property.
    pub const fn new(property: &'static str) -> Self {
        Self {
            property,
            column: None,
            insertable: true,
            updatable: true,
            primary_key: false,
            identity: false,
            sequence: None,
            db_type: None,
        }
    }

    /// Override the database column name.
    pub const fn column(mut self, name: &'static str) -> Self {
        self.column = Some(name);
        self
    }

    /// Mark as primary key. Key columns are not updatable.
    pub const fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.updatable = false;
        self
    }

    /// Mark as database-generated. Identity columns are not insertable.
    pub const fn identity(mut self) -> Self {
        self.identity = true;
        self.insertable = false;
        self
    }

    /// Set the sequence that feeds this column.
    pub const fn sequence(mut self, name: &'static str) -> Self {
        self.sequence = Some(name);
        self
    }

    /// Set the explicit database type.
    pub const fn db_type_opt(mut self, db_type: Option<&'static str>) -> Self {
        self.db_type = db_type;
        self
    }

    /// Set insert eligibility.
    pub const fn insertable(mut self, value: bool) -> Self {
        self.insertable = value;
        self
    }

    /// Set update eligibility.
    pub const fn updatable(mut self, value: bool) -> Self {
        self.updatable = value;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_and_identity_defaults() {
        let id = ColumnInfo::new("id").primary_key().identity();
        assert!(!id.insertable);
        assert!(!id.updatable);

        let code = ColumnInfo::new("code").primary_key();
        assert!(code.insertable);
        assert!(!code.updatable);

        let forced = ColumnInfo::new("code").primary_key().updatable(true);
        assert!(forced.updatable);
    }

    #[test]
    fn test_column_override() {
        let col = ColumnInfo::new("user_name").column("UserName");
        assert_eq!(col.column, Some("UserName"));
        assert_eq!(ColumnInfo::new("age").column, None);
    }
}
