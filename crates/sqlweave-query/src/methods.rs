//! Recognized method calls and their SQL fragments.
//!
//! The set is closed: a name that does not parse into a [`Method`] is an
//! `UnsupportedMethod` error, reported before any SQL is produced.

use std::fmt;
use std::str::FromStr;

use sqlweave_core::{Error, Result};

use crate::dialect::Dialect;

/// A method the compiler knows how to translate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// `col LIKE '%' + v + '%'`
    Like,
    /// `col LIKE '%' + v`
    LikeLeft,
    /// `col LIKE v + '%'`
    LikeRight,
    /// `col NOT LIKE '%' + v + '%'`
    NotLike,
    /// `col IN (...)`
    In,
    /// `col NOT IN (...)`
    NotIn,
    /// Substring match on a string, or membership test on a collection
    Contains,
    /// `(col IS NULL OR col = '')`
    IsNullOrEmpty,
    /// Null-aware equality
    Equals,
    ToUpper,
    ToLower,
    Trim,
    TrimStart,
    TrimEnd,
    /// Collection materializer, transparent in Insert and In
    ToArray,
    /// Collection materializer, transparent in Insert and In
    ToList,
}

impl Method {
    pub const fn name(self) -> &'static str {
        match self {
            Method::Like => "Like",
            Method::LikeLeft => "LikeLeft",
            Method::LikeRight => "LikeRight",
            Method::NotLike => "NotLike",
            Method::In => "In",
            Method::NotIn => "NotIn",
            Method::Contains => "Contains",
            Method::IsNullOrEmpty => "IsNullOrEmpty",
            Method::Equals => "Equals",
            Method::ToUpper => "ToUpper",
            Method::ToLower => "ToLower",
            Method::Trim => "Trim",
            Method::TrimStart => "TrimStart",
            Method::TrimEnd => "TrimEnd",
            Method::ToArray => "ToArray",
            Method::ToList => "ToList",
        }
    }

    /// Methods that produce a boolean condition.
    pub const fn is_predicate(self) -> bool {
        matches!(
            self,
            Method::Like
                | Method::LikeLeft
                | Method::LikeRight
                | Method::NotLike
                | Method::In
                | Method::NotIn
                | Method::Contains
                | Method::IsNullOrEmpty
                | Method::Equals
        )
    }

    /// Methods that map to a scalar SQL function.
    pub const fn is_function(self) -> bool {
        matches!(
            self,
            Method::ToUpper | Method::ToLower | Method::Trim | Method::TrimStart | Method::TrimEnd
        )
    }

    /// `ToArray` / `ToList`.
    pub const fn is_materializer(self) -> bool {
        matches!(self, Method::ToArray | Method::ToList)
    }

    /// Wrap an operand in this method's scalar function.
    pub fn apply_function(self, dialect: Dialect, operand: &str) -> Option<String> {
        match self {
            Method::ToUpper => Some(format!("UPPER({operand})")),
            Method::ToLower => Some(format!("LOWER({operand})")),
            Method::Trim => Some(dialect.trim(operand)),
            Method::TrimStart => Some(format!("LTRIM({operand})")),
            Method::TrimEnd => Some(format!("RTRIM({operand})")),
            _ => None,
        }
    }

    /// Wrap a bound value in the wildcards of a LIKE-family method.
    pub fn like_pattern(self, dialect: Dialect, value: &str) -> Option<String> {
        match self {
            Method::Like | Method::NotLike | Method::Contains => {
                Some(dialect.concat(&["'%'", value, "'%'"]))
            }
            Method::LikeLeft => Some(dialect.concat(&["'%'", value])),
            Method::LikeRight => Some(dialect.concat(&[value, "'%'"])),
            _ => None,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Method {
    type Err = Error;

    /// Parse a method name. Generic arity suffixes (`` In`1 ``) are ignored.
    fn from_str(s: &str) -> Result<Self> {
        let base = s.split('`').next().unwrap_or(s);
        let method = match base {
            "Like" => Method::Like,
            "LikeLeft" => Method::LikeLeft,
            "LikeRight" => Method::LikeRight,
            "NotLike" => Method::NotLike,
            "In" => Method::In,
            "NotIn" => Method::NotIn,
            "Contains" => Method::Contains,
            "IsNullOrEmpty" => Method::IsNullOrEmpty,
            "Equals" => Method::Equals,
            "ToUpper" => Method::ToUpper,
            "ToLower" => Method::ToLower,
            "Trim" => Method::Trim,
            "TrimStart" => Method::TrimStart,
            "TrimEnd" => Method::TrimEnd,
            "ToArray" => Method::ToArray,
            "ToList" => Method::ToList,
            _ => return Err(Error::unsupported_method(s, None)),
        };
        Ok(method)
    }
}
