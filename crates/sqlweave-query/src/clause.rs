//! Clause contexts a node can be translated for.

use std::sync::LazyLock;

use regex::Regex;

static DIRECTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(ASC|DESC)\s*$").expect("valid direction regex"));

/// Whether an ordering key already ends in `ASC` or `DESC`.
pub fn has_direction(key: &str) -> bool {
    DIRECTION.is_match(key)
}

/// The syntactic position a node is being compiled for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Clause<'a> {
    Select,
    Insert,
    Update,
    Where,
    Join,
    GroupBy,
    /// Ordering keys, with directions matched to keys by position.
    OrderBy(&'a [OrderDirection]),
    /// Items of an `IN (...)` list.
    In,
    Max,
    Min,
    Avg,
    Count,
    Sum,
}

impl<'a> Clause<'a> {
    /// Name used in error messages.
    pub const fn name(&self) -> &'static str {
        match self {
            Clause::Select => "Select",
            Clause::Insert => "Insert",
            Clause::Update => "Update",
            Clause::Where => "Where",
            Clause::Join => "Join",
            Clause::GroupBy => "GroupBy",
            Clause::OrderBy(_) => "OrderBy",
            Clause::In => "In",
            Clause::Max => "Max",
            Clause::Min => "Min",
            Clause::Avg => "Avg",
            Clause::Count => "Count",
            Clause::Sum => "Sum",
        }
    }

    /// SQL aggregate function for aggregate clauses.
    pub const fn aggregate_function(&self) -> Option<&'static str> {
        match self {
            Clause::Max => Some("MAX"),
            Clause::Min => Some("MIN"),
            Clause::Avg => Some("AVG"),
            Clause::Count => Some("COUNT"),
            Clause::Sum => Some("SUM"),
            _ => None,
        }
    }

    /// Directions left for the key at `index` and the keys after it.
    pub fn directions_from(&self, index: usize) -> Clause<'a> {
        match *self {
            Clause::OrderBy(dirs) => Clause::OrderBy(dirs.get(index..).unwrap_or(&[])),
            other => other,
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OrderDirection {
    #[default]
    Asc,
    Desc,
}

impl OrderDirection {
    pub const fn as_str(self) -> &'static str {
        match self {
            OrderDirection::Asc => "ASC",
            OrderDirection::Desc => "DESC",
        }
    }
}

/// Types of SQL joins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    Inner,
    Left,
    Right,
    Full,
}

impl JoinType {
    /// Get the SQL keyword for this join type.
    pub const fn as_str(&self) -> &'static str {
        match self {
            JoinType::Inner => "INNER JOIN",
            JoinType::Left => "LEFT JOIN",
            JoinType::Right => "RIGHT JOIN",
            JoinType::Full => "FULL JOIN",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregate_functions() {
        assert_eq!(Clause::Max.aggregate_function(), Some("MAX"));
        assert_eq!(Clause::Count.aggregate_function(), Some("COUNT"));
        assert_eq!(Clause::Where.aggregate_function(), None);
    }

    #[test]
    fn test_has_direction() {
        assert!(has_direction("Name DESC"));
        assert!(has_direction("u.Age asc"));
        assert!(!has_direction("Description"));
        assert!(!has_direction("Name"));
    }

    #[test]
    fn test_directions_from() {
        let dirs = [OrderDirection::Desc, OrderDirection::Asc];
        let clause = Clause::OrderBy(&dirs);
        assert_eq!(
            clause.directions_from(1),
            Clause::OrderBy(&[OrderDirection::Asc])
        );
        assert_eq!(clause.directions_from(5), Clause::OrderBy(&[]));
        assert_eq!(Clause::GroupBy.directions_from(1), Clause::GroupBy);
    }
}
