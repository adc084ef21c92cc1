//! Compile options.

use serde::{Deserialize, Serialize};
use sqlweave_core::Result;

use crate::dialect::Dialect;

/// Options for one compilation.
///
/// # Example
///
/// ```
/// use sqlweave_query::{CompileOptions, Dialect};
///
/// let options = CompileOptions::new(Dialect::PostgreSql)
///     .enable_format(true)
///     .server_version(15);
/// assert!(options.enable_format);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompileOptions {
    /// Target dialect
    pub dialect: Dialect,
    /// Quote table and column identifiers
    pub enable_format: bool,
    /// Write `NULL` for absent values instead of omitting the column
    pub enable_null_value_persistence: bool,
    /// Major server version, used to pick legacy pagination
    pub server_version: Option<u32>,
}

impl CompileOptions {
    /// Create options for a dialect with everything else at its default.
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            ..Self::default()
        }
    }

    /// Set the dialect.
    pub fn dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    /// Enable or disable identifier quoting.
    pub fn enable_format(mut self, enabled: bool) -> Self {
        self.enable_format = enabled;
        self
    }

    /// Enable or disable writing `NULL` for absent values.
    pub fn enable_null_value_persistence(mut self, enabled: bool) -> Self {
        self.enable_null_value_persistence = enabled;
        self
    }

    /// Set the major server version.
    pub fn server_version(mut self, version: u32) -> Self {
        self.server_version = Some(version);
        self
    }

    /// Load options from JSON. Missing keys keep their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Whether pagination must use the pre-OFFSET/FETCH idiom.
    pub fn legacy_pagination(&self) -> bool {
        self.dialect.is_legacy(self.server_version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlweave_core::Error;

    #[test]
    fn test_defaults() {
        let options = CompileOptions::default();
        assert_eq!(options.dialect, Dialect::SqlServer);
        assert!(!options.enable_format);
        assert!(!options.enable_null_value_persistence);
        assert!(options.server_version.is_none());
    }

    #[test]
    fn test_chained_setters() {
        let options = CompileOptions::new(Dialect::Oracle)
            .enable_null_value_persistence(true)
            .server_version(11);
        assert_eq!(options.dialect, Dialect::Oracle);
        assert!(options.enable_null_value_persistence);
        assert!(options.legacy_pagination());
    }

    #[test]
    fn test_from_json_partial() {
        let options = CompileOptions::from_json(r#"{"dialect":"postgres","enable_format":true}"#)
            .unwrap();
        assert_eq!(options.dialect, Dialect::PostgreSql);
        assert!(options.enable_format);
        assert!(!options.enable_null_value_persistence);
    }

    #[test]
    fn test_from_json_round_trips_variant_name() {
        let json = serde_json::to_string(&CompileOptions::new(Dialect::MySql)).unwrap();
        assert!(json.contains("\"MySql\""));
        assert_eq!(
            CompileOptions::from_json(&json).unwrap().dialect,
            Dialect::MySql
        );
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        let err = CompileOptions::from_json(r#"{"dialect":"db2"}"#).unwrap_err();
        assert!(matches!(err, Error::Serde(_)));
    }
}
