//! Error types for sqlweave operations.

use std::fmt;

/// The primary error type for all compile operations.
#[derive(Debug)]
pub enum Error {
    /// A query tree could not be translated to SQL
    Translation(TranslationError),
    /// Entity metadata cannot support the requested operation
    Metadata(MetadataError),
    /// Invalid compile options or builder arguments
    Config(ConfigError),
    /// Serialization/deserialization errors
    Serde(String),
    /// Custom error with message
    Custom(String),
}

#[derive(Debug)]
pub struct TranslationError {
    pub kind: TranslationErrorKind,
    /// Node kind being translated (e.g. `"Constant"`)
    pub node: Option<&'static str>,
    /// Clause context being compiled for (e.g. `"Select"`)
    pub clause: Option<&'static str>,
    /// Method name for method-call failures
    pub method: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranslationErrorKind {
    /// No handler exists for the (node kind, clause) pair
    UnsupportedTranslation,
    /// Method is not in the fragment table (or not valid where it was used)
    UnsupportedMethod,
    /// A node has the right kind but an operand it cannot use
    InvalidOperand,
}

#[derive(Debug)]
pub struct MetadataError {
    pub kind: MetadataErrorKind,
    /// Entity type name
    pub entity: String,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataErrorKind {
    /// Operation requires a primary key but the entity declares none
    MissingPrimaryKey,
    /// Property name does not map to any column
    UnknownProperty,
    /// Key values do not match the declared key columns
    KeyMismatch,
}

#[derive(Debug)]
pub struct ConfigError {
    pub message: String,
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl Error {
    /// Build an `UnsupportedTranslation` error for a (node, clause) pair.
    pub fn unsupported_translation(node: &'static str, clause: &'static str) -> Self {
        Error::Translation(TranslationError {
            kind: TranslationErrorKind::UnsupportedTranslation,
            node: Some(node),
            clause: Some(clause),
            method: None,
            message: format!("{node} nodes cannot be translated in a {clause} clause"),
        })
    }

    /// Build an `UnsupportedMethod` error naming the method.
    pub fn unsupported_method(method: impl Into<String>, clause: Option<&'static str>) -> Self {
        let method = method.into();
        let message = match clause {
            Some(clause) => format!("method '{method}' is not supported in a {clause} clause"),
            None => format!("method '{method}' is not supported"),
        };
        Error::Translation(TranslationError {
            kind: TranslationErrorKind::UnsupportedMethod,
            node: Some("MethodCall"),
            clause,
            method: Some(method),
            message,
        })
    }

    /// Build an `InvalidOperand` error for a node.
    pub fn invalid_operand(node: &'static str, message: impl Into<String>) -> Self {
        Error::Translation(TranslationError {
            kind: TranslationErrorKind::InvalidOperand,
            node: Some(node),
            clause: None,
            method: None,
            message: message.into(),
        })
    }

    /// Build a `MissingPrimaryKey` metadata error.
    pub fn missing_primary_key(entity: impl Into<String>, operation: &str) -> Self {
        let entity = entity.into();
        Error::Metadata(MetadataError {
            kind: MetadataErrorKind::MissingPrimaryKey,
            message: format!("{operation} requires a primary key but {entity} declares none"),
            entity,
        })
    }

    /// Build a `KeyMismatch` metadata error.
    pub fn key_mismatch(entity: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Metadata(MetadataError {
            kind: MetadataErrorKind::KeyMismatch,
            entity: entity.into(),
            message: message.into(),
        })
    }

    /// Build a config error from a message.
    pub fn config(message: impl Into<String>) -> Self {
        Error::Config(ConfigError {
            message: message.into(),
            source: None,
        })
    }

    /// Get the translation error kind, if this is a translation error.
    pub fn translation_kind(&self) -> Option<TranslationErrorKind> {
        match self {
            Error::Translation(t) => Some(t.kind),
            _ => None,
        }
    }

    /// Get the metadata error kind, if this is a metadata error.
    pub fn metadata_kind(&self) -> Option<MetadataErrorKind> {
        match self {
            Error::Metadata(m) => Some(m.kind),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Translation(e) => write!(f, "Translation error: {}", e),
            Error::Metadata(e) => write!(f, "Metadata error: {}", e),
            Error::Config(e) => write!(f, "Configuration error: {}", e.message),
            Error::Serde(msg) => write!(f, "Serialization error: {}", msg),
            Error::Custom(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Config(e) => e
                .source
                .as_deref()
                .map(|err| err as &(dyn std::error::Error + 'static)),
            _ => None,
        }
    }
}

impl fmt::Display for TranslationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Display for MetadataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl From<TranslationError> for Error {
    fn from(err: TranslationError) -> Self {
        Error::Translation(err)
    }
}

impl From<MetadataError> for Error {
    fn from(err: MetadataError) -> Self {
        Error::Metadata(err)
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Error::Config(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serde(err.to_string())
    }
}

/// Result type alias for sqlweave operations.
pub type Result<T> = std::result::Result<T, Error>;
