//! SQL dialects and their syntax differences.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlweave_core::{Error, Result};

/// Target database syntax.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dialect {
    /// SQL Server (uses `@p0` placeholders and `[x]` quoting)
    #[default]
    #[serde(alias = "sqlserver", alias = "mssql")]
    SqlServer,
    /// MySQL (uses `?p0` placeholders and `` `x` `` quoting)
    #[serde(alias = "mysql")]
    MySql,
    /// PostgreSQL (uses `:p0` placeholders)
    #[serde(alias = "postgresql", alias = "postgres")]
    PostgreSql,
    /// Oracle (uses `:p0` placeholders, no multi-row VALUES)
    #[serde(alias = "oracle")]
    Oracle,
    /// SQLite (uses `@p0` placeholders)
    #[serde(alias = "sqlite")]
    Sqlite,
}

impl Dialect {
    /// All supported dialects.
    pub const ALL: [Dialect; 5] = [
        Dialect::SqlServer,
        Dialect::MySql,
        Dialect::PostgreSql,
        Dialect::Oracle,
        Dialect::Sqlite,
    ];

    /// Display name of this dialect.
    pub const fn name(self) -> &'static str {
        match self {
            Dialect::SqlServer => "SqlServer",
            Dialect::MySql => "MySql",
            Dialect::PostgreSql => "PostgreSql",
            Dialect::Oracle => "Oracle",
            Dialect::Sqlite => "Sqlite",
        }
    }

    /// Prefix placed before a parameter name in SQL text.
    pub const fn parameter_prefix(self) -> &'static str {
        match self {
            Dialect::SqlServer | Dialect::Sqlite => "@",
            Dialect::MySql => "?",
            Dialect::PostgreSql | Dialect::Oracle => ":",
        }
    }

    /// Placeholder text for a named parameter.
    pub fn placeholder(self, name: &str) -> String {
        format!("{}{}", self.parameter_prefix(), name)
    }

    /// Quote an identifier for this dialect.
    ///
    /// Embedded closing quote characters are doubled.
    pub fn quote_identifier(self, name: &str) -> String {
        match self {
            Dialect::SqlServer => format!("[{}]", name.replace(']', "]]")),
            Dialect::MySql => format!("`{}`", name.replace('`', "``")),
            Dialect::PostgreSql | Dialect::Oracle | Dialect::Sqlite => {
                format!("\"{}\"", name.replace('"', "\"\""))
            }
        }
    }

    /// Concatenate string fragments.
    pub fn concat(self, parts: &[&str]) -> String {
        match self {
            Dialect::SqlServer => parts.join(" + "),
            Dialect::MySql => format!("CONCAT({})", parts.join(",")),
            Dialect::PostgreSql | Dialect::Oracle | Dialect::Sqlite => parts.join(" || "),
        }
    }

    /// Whether `INSERT ... VALUES (..),(..)` is accepted.
    pub const fn supports_multi_row_values(self) -> bool {
        !matches!(self, Dialect::Oracle)
    }

    /// Text placed between a table reference and its alias.
    pub const fn alias_separator(self) -> &'static str {
        match self {
            Dialect::Oracle => " ",
            _ => " AS ",
        }
    }

    /// Full trim of both ends.
    pub fn trim(self, operand: &str) -> String {
        match self {
            Dialect::SqlServer => format!("LTRIM(RTRIM({operand}))"),
            _ => format!("TRIM({operand})"),
        }
    }

    /// Text appended to an INSERT to read back the generated key.
    pub fn identity_suffix(self, key_column: &str) -> String {
        match self {
            Dialect::SqlServer => ";SELECT SCOPE_IDENTITY()".to_string(),
            Dialect::MySql => ";SELECT LAST_INSERT_ID()".to_string(),
            Dialect::Sqlite => ";SELECT LAST_INSERT_ROWID()".to_string(),
            Dialect::PostgreSql => format!(" RETURNING {key_column}"),
            Dialect::Oracle => format!(" RETURNING {key_column} INTO :identity"),
        }
    }

    /// Whether this server version predates OFFSET/FETCH support.
    ///
    /// SQL Server gained it in 11 (2012), Oracle in 12c. An unknown version
    /// is treated as modern.
    pub fn is_legacy(self, server_version: Option<u32>) -> bool {
        match (self, server_version) {
            (Dialect::SqlServer, Some(v)) => v < 11,
            (Dialect::Oracle, Some(v)) => v < 12,
            _ => false,
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Dialect {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "sqlserver" | "mssql" => Ok(Dialect::SqlServer),
            "mysql" => Ok(Dialect::MySql),
            "postgresql" | "postgres" => Ok(Dialect::PostgreSql),
            "oracle" => Ok(Dialect::Oracle),
            "sqlite" => Ok(Dialect::Sqlite),
            _ => Err(Error::config(format!("unknown SQL dialect '{s}'"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholders() {
        assert_eq!(Dialect::SqlServer.placeholder("p0"), "@p0");
        assert_eq!(Dialect::MySql.placeholder("p0"), "?p0");
        assert_eq!(Dialect::PostgreSql.placeholder("p0"), ":p0");
        assert_eq!(Dialect::Oracle.placeholder("p0"), ":p0");
        assert_eq!(Dialect::Sqlite.placeholder("p0"), "@p0");
    }

    #[test]
    fn test_quote_identifier_escapes() {
        assert_eq!(Dialect::SqlServer.quote_identifier("a]b"), "[a]]b]");
        assert_eq!(Dialect::MySql.quote_identifier("a`b"), "`a``b`");
        assert_eq!(Dialect::PostgreSql.quote_identifier("a\"b"), "\"a\"\"b\"");
    }

    #[test]
    fn test_concat() {
        let parts = ["'%'", "@p0", "'%'"];
        assert_eq!(Dialect::SqlServer.concat(&parts), "'%' + @p0 + '%'");
        assert_eq!(Dialect::MySql.concat(&parts), "CONCAT('%',@p0,'%')");
        assert_eq!(Dialect::Sqlite.concat(&parts), "'%' || @p0 || '%'");
    }

    #[test]
    fn test_trim() {
        assert_eq!(Dialect::SqlServer.trim("Name"), "LTRIM(RTRIM(Name))");
        assert_eq!(Dialect::PostgreSql.trim("Name"), "TRIM(Name)");
    }

    #[test]
    fn test_legacy_versions() {
        assert!(Dialect::SqlServer.is_legacy(Some(10)));
        assert!(!Dialect::SqlServer.is_legacy(Some(11)));
        assert!(Dialect::Oracle.is_legacy(Some(11)));
        assert!(!Dialect::Oracle.is_legacy(None));
        assert!(!Dialect::MySql.is_legacy(Some(5)));
    }

    #[test]
    fn test_from_str() {
        assert_eq!("postgres".parse::<Dialect>().unwrap(), Dialect::PostgreSql);
        assert_eq!("MSSQL".parse::<Dialect>().unwrap(), Dialect::SqlServer);
        assert!("db2".parse::<Dialect>().is_err());
    }
}
