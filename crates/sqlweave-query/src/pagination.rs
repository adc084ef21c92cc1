//! Paged query generation.
//!
//! Wraps an already compiled SELECT so it returns one page of rows, and
//! builds the matching row-count query. Pages are 1-based: page `k` of size
//! `n` covers rows `[(k-1)*n, k*n)`.
//!
//! Modern servers use `OFFSET ... FETCH` (SQL Server 2012+, Oracle 12c+) or
//! `LIMIT ... OFFSET`. Older SQL Server and Oracle versions number the rows
//! in a `PAGED` common table expression and filter on the injected
//! `ROWNUMBER` column.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlweave_core::{Error, Result};

use crate::clause::has_direction;
use crate::context::SqlParameter;
use crate::dialect::Dialect;
use crate::options::CompileOptions;

/// Column added to each row by the legacy windowing forms.
pub const ROW_NUMBER_COLUMN: &str = "ROWNUMBER";

static LEADING_WITH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*WITH\s").expect("valid WITH regex"));

/// A request for one page of a query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageRequest {
    /// The SELECT to page, without ORDER BY
    pub sql: String,
    /// Ordering key; may already carry `ASC`/`DESC`
    pub order_field: Option<String>,
    pub ascending: bool,
    pub page_size: u64,
    /// 1-based
    pub page_index: u64,
    /// Fetch one extra row to detect a following page instead of counting
    pub has_next_page: bool,
    /// Values bound by `sql`, carried through to the paged statements
    #[serde(default)]
    pub parameters: Vec<SqlParameter>,
}

impl PageRequest {
    pub fn new(sql: impl Into<String>, page_index: u64, page_size: u64) -> Self {
        Self {
            sql: sql.into(),
            order_field: None,
            ascending: true,
            page_size,
            page_index,
            has_next_page: false,
            parameters: Vec::new(),
        }
    }

    /// Attach the values bound by the wrapped SELECT.
    pub fn parameters(mut self, parameters: Vec<SqlParameter>) -> Self {
        self.parameters = parameters;
        self
    }

    /// Order the page by `field`.
    pub fn order_by(mut self, field: impl Into<String>, ascending: bool) -> Self {
        self.order_field = Some(field.into());
        self.ascending = ascending;
        self
    }

    /// Fetch `page_size + 1` rows and skip the count query.
    pub fn has_next_page(mut self, enabled: bool) -> Self {
        self.has_next_page = enabled;
        self
    }

    /// Rows skipped before this page.
    pub fn offset(&self) -> Result<u64> {
        if self.page_index == 0 {
            return Err(Error::config("page index is 1-based; got 0"));
        }
        if self.page_size == 0 {
            return Err(Error::config("page size must be positive"));
        }
        (self.page_index - 1)
            .checked_mul(self.page_size)
            .ok_or_else(|| Error::config("page offset overflows"))
    }

    /// Rows requested for this page.
    pub fn fetch(&self) -> Result<u64> {
        if self.has_next_page {
            self.page_size
                .checked_add(1)
                .ok_or_else(|| Error::config("page size overflows"))
        } else {
            Ok(self.page_size)
        }
    }

    fn order_clause(&self) -> Option<String> {
        let field = self.order_field.as_deref().map(str::trim)?;
        if field.is_empty() {
            return None;
        }
        if has_direction(field) {
            Some(field.to_string())
        } else {
            let direction = if self.ascending { "ASC" } else { "DESC" };
            Some(format!("{field} {direction}"))
        }
    }
}

/// SQL for one page plus the optional count query.
#[derive(Debug, Clone, PartialEq)]
pub struct PagedQuery {
    /// `SELECT COUNT(*) AS TOTAL ...`; `None` in has-next-page mode
    pub count_sql: Option<String>,
    pub data_sql: String,
    /// Extra column present in `data_sql` rows, for callers to drop
    pub injected_column: Option<&'static str>,
    pub offset: u64,
    pub fetch: u64,
    /// Parameters shared by both statements
    pub parameters: Vec<SqlParameter>,
}

/// Build the paged data query and its count query.
pub fn paginate(request: &PageRequest, options: &CompileOptions) -> Result<PagedQuery> {
    let offset = request.offset()?;
    let fetch = request.fetch()?;
    let last = offset
        .checked_add(fetch)
        .ok_or_else(|| Error::config("page window overflows"))?;
    let order = request.order_clause();
    let (prefix, main) = split_cte(&request.sql)?;
    let dialect = options.dialect;

    let (data_sql, injected_column) = if options.legacy_pagination() {
        let sql = match dialect {
            Dialect::Oracle => legacy_oracle(prefix, main, order.as_deref(), offset, last),
            _ => legacy_sql_server(prefix, main, order.as_deref(), offset, last),
        };
        (sql, Some(ROW_NUMBER_COLUMN))
    } else {
        (modern(dialect, &request.sql, order.as_deref(), offset, fetch), None)
    };

    let count_sql = (!request.has_next_page).then(|| count(dialect, prefix, main));

    tracing::debug!(
        dialect = %dialect,
        offset,
        fetch,
        legacy = injected_column.is_some(),
        "Built paged query"
    );

    Ok(PagedQuery {
        count_sql,
        data_sql,
        injected_column,
        offset,
        fetch,
        parameters: request.parameters.clone(),
    })
}

fn modern(dialect: Dialect, sql: &str, order: Option<&str>, offset: u64, fetch: u64) -> String {
    let sql = sql.trim_end();
    match (dialect, order) {
        (Dialect::SqlServer, order) => format!(
            "{sql} ORDER BY {} OFFSET {offset} ROWS FETCH NEXT {fetch} ROWS ONLY",
            order.unwrap_or("(SELECT 0)")
        ),
        (Dialect::Oracle, Some(order)) => {
            format!("{sql} ORDER BY {order} OFFSET {offset} ROWS FETCH NEXT {fetch} ROWS ONLY")
        }
        (Dialect::Oracle, None) => {
            format!("{sql} OFFSET {offset} ROWS FETCH NEXT {fetch} ROWS ONLY")
        }
        (_, Some(order)) => format!("{sql} ORDER BY {order} LIMIT {fetch} OFFSET {offset}"),
        (_, None) => format!("{sql} LIMIT {fetch} OFFSET {offset}"),
    }
}

fn with_paged(prefix: Option<&str>, paged: &str) -> String {
    match prefix {
        Some(prefix) => format!("{prefix}, {paged}"),
        None => format!("WITH {paged}"),
    }
}

fn legacy_sql_server(
    prefix: Option<&str>,
    main: &str,
    order: Option<&str>,
    offset: u64,
    last: u64,
) -> String {
    let paged = format!(
        "PAGED AS (SELECT ROW_NUMBER() OVER (ORDER BY {}) AS {ROW_NUMBER_COLUMN}, T.* FROM ({main}) AS T)",
        order.unwrap_or("(SELECT 0)")
    );
    format!(
        "{} SELECT * FROM PAGED WHERE {ROW_NUMBER_COLUMN} BETWEEN {} AND {last}",
        with_paged(prefix, &paged),
        offset + 1
    )
}

fn legacy_oracle(
    prefix: Option<&str>,
    main: &str,
    order: Option<&str>,
    offset: u64,
    last: u64,
) -> String {
    let ordered = match order {
        Some(order) => format!("{main} ORDER BY {order}"),
        None => main.to_string(),
    };
    let paged = format!(
        "PAGED AS (SELECT T.*, ROWNUM AS {ROW_NUMBER_COLUMN} FROM ({ordered}) T WHERE ROWNUM <= {last})"
    );
    format!(
        "{} SELECT * FROM PAGED WHERE {ROW_NUMBER_COLUMN} > {offset}",
        with_paged(prefix, &paged)
    )
}

fn count(dialect: Dialect, prefix: Option<&str>, main: &str) -> String {
    let alias = match dialect {
        Dialect::Oracle => " T",
        _ => " AS T",
    };
    let count = format!("SELECT COUNT(*) AS TOTAL FROM ({main}){alias}");
    match prefix {
        Some(prefix) => format!("{prefix} {count}"),
        None => count,
    }
}

/// Split a query into its `WITH ...` prefix and the main statement.
///
/// The prefix ends just past the closing parenthesis of the last CTE body.
/// Quoted strings and identifiers are skipped while matching parentheses.
fn split_cte(sql: &str) -> Result<(Option<&str>, &str)> {
    if !LEADING_WITH.is_match(sql) {
        return Ok((None, sql.trim()));
    }

    let mut depth = 0usize;
    let mut quote: Option<u8> = None;
    for (i, byte) in sql.bytes().enumerate() {
        if let Some(open) = quote {
            if byte == open {
                quote = None;
            }
            continue;
        }
        match byte {
            b'\'' | b'"' | b'`' => quote = Some(byte),
            b'[' => quote = Some(b']'),
            b'(' => depth += 1,
            b')' => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| Error::config("unbalanced parentheses in WITH clause"))?;
                if depth > 0 {
                    continue;
                }
                let rest = sql[i + 1..].trim_start();
                // Another CTE follows, or this was a column list before `AS (`.
                if rest.starts_with(',') || starts_with_keyword(rest, "AS") {
                    continue;
                }
                return Ok((Some(sql[..=i].trim()), rest.trim_end()));
            }
            _ => {}
        }
    }
    Err(Error::config("WITH clause is not followed by a statement"))
}

fn starts_with_keyword(text: &str, keyword: &str) -> bool {
    text.get(..keyword.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(keyword))
        && text[keyword.len()..]
            .chars()
            .next()
            .is_none_or(|c| !c.is_alphanumeric() && c != '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    const SQL: &str = "SELECT Id,Name FROM User WHERE Age > @p0";

    fn page(index: u64, size: u64) -> PageRequest {
        PageRequest::new(SQL, index, size).order_by("Name", true)
    }

    fn options(dialect: Dialect) -> CompileOptions {
        CompileOptions::new(dialect)
    }

    #[test]
    fn test_modern_sql_server() {
        let paged = paginate(&page(3, 10), &options(Dialect::SqlServer)).unwrap();
        assert_eq!(
            paged.data_sql,
            "SELECT Id,Name FROM User WHERE Age > @p0 ORDER BY Name ASC OFFSET 20 ROWS FETCH NEXT 10 ROWS ONLY"
        );
        assert_eq!(
            paged.count_sql.as_deref(),
            Some("SELECT COUNT(*) AS TOTAL FROM (SELECT Id,Name FROM User WHERE Age > @p0) AS T")
        );
        assert!(paged.injected_column.is_none());
    }

    #[test]
    fn test_sql_server_without_order_uses_constant_order() {
        let paged = paginate(&PageRequest::new(SQL, 1, 5), &options(Dialect::SqlServer)).unwrap();
        assert!(paged.data_sql.ends_with("ORDER BY (SELECT 0) OFFSET 0 ROWS FETCH NEXT 5 ROWS ONLY"));
    }

    #[test]
    fn test_limit_offset_dialects() {
        for dialect in [Dialect::MySql, Dialect::PostgreSql, Dialect::Sqlite] {
            let request = page(2, 25).order_by("Age", false);
            let paged = paginate(&request, &options(dialect)).unwrap();
            assert_eq!(
                paged.data_sql,
                format!("{SQL} ORDER BY Age DESC LIMIT 25 OFFSET 25")
            );
        }
    }

    #[test]
    fn test_modern_oracle() {
        let paged = paginate(&page(1, 10), &options(Dialect::Oracle).server_version(19)).unwrap();
        assert_eq!(
            paged.data_sql,
            format!("{SQL} ORDER BY Name ASC OFFSET 0 ROWS FETCH NEXT 10 ROWS ONLY")
        );
        assert_eq!(
            paged.count_sql.as_deref(),
            Some(format!("SELECT COUNT(*) AS TOTAL FROM ({SQL}) T").as_str())
        );
        let unordered = paginate(&PageRequest::new(SQL, 1, 10), &options(Dialect::Oracle)).unwrap();
        assert_eq!(
            unordered.data_sql,
            format!("{SQL} OFFSET 0 ROWS FETCH NEXT 10 ROWS ONLY")
        );
    }

    #[test]
    fn test_legacy_sql_server_row_number() {
        let paged = paginate(&page(3, 10), &options(Dialect::SqlServer).server_version(10)).unwrap();
        assert_eq!(
            paged.data_sql,
            format!(
                "WITH PAGED AS (SELECT ROW_NUMBER() OVER (ORDER BY Name ASC) AS ROWNUMBER, T.* \
                 FROM ({SQL}) AS T) SELECT * FROM PAGED WHERE ROWNUMBER BETWEEN 21 AND 30"
            )
        );
        assert_eq!(paged.injected_column, Some("ROWNUMBER"));
    }

    #[test]
    fn test_legacy_oracle_rownum() {
        let paged = paginate(&page(2, 10), &options(Dialect::Oracle).server_version(11)).unwrap();
        assert_eq!(
            paged.data_sql,
            format!(
                "WITH PAGED AS (SELECT T.*, ROWNUM AS ROWNUMBER FROM ({SQL} ORDER BY Name ASC) T \
                 WHERE ROWNUM <= 20) SELECT * FROM PAGED WHERE ROWNUMBER > 10"
            )
        );
        assert_eq!(paged.injected_column, Some("ROWNUMBER"));
    }

    #[test]
    fn test_cte_split_keeps_prefix() {
        let sql = "WITH a AS (SELECT Id FROM User WHERE Name = ')'), b (Id) AS (SELECT Id FROM a) \
                   SELECT * FROM b";
        let (prefix, main) = split_cte(sql).unwrap();
        assert_eq!(
            prefix,
            Some("WITH a AS (SELECT Id FROM User WHERE Name = ')'), b (Id) AS (SELECT Id FROM a)")
        );
        assert_eq!(main, "SELECT * FROM b");

        let request = PageRequest::new(sql, 2, 5).order_by("Id DESC", true);
        let paged = paginate(&request, &options(Dialect::SqlServer).server_version(9)).unwrap();
        assert!(paged.data_sql.starts_with(
            "WITH a AS (SELECT Id FROM User WHERE Name = ')'), b (Id) AS (SELECT Id FROM a), \
             PAGED AS (SELECT ROW_NUMBER() OVER (ORDER BY Id DESC)"
        ));
        assert!(paged.data_sql.contains("FROM (SELECT * FROM b) AS T)"));
        assert_eq!(
            paged.count_sql.unwrap(),
            "WITH a AS (SELECT Id FROM User WHERE Name = ')'), b (Id) AS (SELECT Id FROM a) \
             SELECT COUNT(*) AS TOTAL FROM (SELECT * FROM b) AS T"
        );
    }

    #[test]
    fn test_unbalanced_cte_is_rejected() {
        assert!(split_cte("WITH a AS (SELECT 1").is_err());
        assert!(split_cte("WITH a AS SELECT 1)").is_err());
    }

    #[test]
    fn test_has_next_page_fetches_extra_row() {
        let request = page(2, 10).has_next_page(true);
        let paged = paginate(&request, &options(Dialect::PostgreSql)).unwrap();
        assert!(paged.count_sql.is_none());
        assert_eq!(paged.fetch, 11);
        assert!(paged.data_sql.ends_with("LIMIT 11 OFFSET 10"));
    }

    #[test]
    fn test_window_is_k_minus_one_times_n() {
        for dialect in Dialect::ALL {
            for (index, size) in [(1u64, 1u64), (4, 7), (10, 100)] {
                let paged = paginate(&page(index, size), &options(dialect)).unwrap();
                assert_eq!(paged.offset, (index - 1) * size);
                assert_eq!(paged.fetch, size);
            }
        }
    }

    #[test]
    fn test_invalid_page_arguments() {
        let opts = options(Dialect::MySql);
        assert!(matches!(paginate(&page(0, 10), &opts), Err(Error::Config(_))));
        assert!(matches!(paginate(&page(1, 0), &opts), Err(Error::Config(_))));
        assert!(matches!(paginate(&page(u64::MAX, 2), &opts), Err(Error::Config(_))));
    }

    #[test]
    fn test_request_parameters_reach_paged_query() {
        let bound = vec![SqlParameter {
            name: "p0".to_string(),
            value: sqlweave_core::Value::Int(18),
        }];
        let request = page(2, 10).parameters(bound.clone());
        for dialect in Dialect::ALL {
            let paged = paginate(&request, &options(dialect)).unwrap();
            assert_eq!(paged.parameters, bound);
        }
        let paged = paginate(&page(2, 10), &options(Dialect::Sqlite)).unwrap();
        assert!(paged.parameters.is_empty());
    }
}
