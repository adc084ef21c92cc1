//! Statement builders for SELECT, INSERT, UPDATE and DELETE.
//!
//! Each `build` call is one compilation unit: a fresh [`SqlBuildContext`]
//! is created, every clause is translated into it in statement order, and
//! the text plus bound parameters come out as a [`CompiledQuery`].

use std::marker::PhantomData;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sqlweave_core::{Entity, EntityMetadata, Error, Result, Value, resolve};

use crate::clause::{Clause, JoinType, OrderDirection};
use crate::context::{SqlBuildContext, SqlParameter};
use crate::dialect::Dialect;
use crate::node::QueryNode;
use crate::options::CompileOptions;
use crate::pagination::{PageRequest, PagedQuery, paginate};
use crate::translate::translate;

/// SQL text and its bound parameters, ready for execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompiledQuery {
    pub sql: String,
    pub parameters: Vec<SqlParameter>,
}

impl CompiledQuery {
    fn finish(statement: &'static str, ctx: SqlBuildContext) -> Self {
        let (sql, parameters) = ctx.into_parts();
        Self::from_parts(statement, sql, parameters)
    }

    fn from_parts(statement: &'static str, sql: String, parameters: Vec<SqlParameter>) -> Self {
        tracing::debug!(
            statement,
            sql = %sql,
            params = parameters.len(),
            "Compiled statement"
        );
        Self { sql, parameters }
    }

    /// Parameter values in binding order.
    pub fn values(&self) -> Vec<Value> {
        self.parameters.iter().map(|p| p.value.clone()).collect()
    }
}

fn combine(existing: Option<QueryNode>, node: QueryNode, or: bool) -> Option<QueryNode> {
    Some(match existing {
        Some(existing) if or => existing.or(node),
        Some(existing) => existing.and(node),
        None => node,
    })
}

fn row_of(entity: &Arc<EntityMetadata>) -> QueryNode {
    QueryNode::Parameter {
        entity: Arc::clone(entity),
        name: None,
    }
}

/// `key1 = v1 AND key2 = v2 ...` over the primary key columns.
fn key_filter(entity: &Arc<EntityMetadata>, operation: &str, values: Vec<Value>) -> Result<QueryNode> {
    let keys = entity.require_primary_key(operation)?;
    if keys.len() != values.len() {
        return Err(Error::key_mismatch(
            &entity.type_name,
            format!(
                "{} has {} key column(s) but {} value(s) were given",
                entity.type_name,
                keys.len(),
                values.len()
            ),
        ));
    }
    keys.iter()
        .zip(values)
        .map(|(key, value)| {
            row_of(entity)
                .member(key.property.clone())
                .eq(QueryNode::Constant(value))
        })
        .reduce(|left, right| left.and(right))
        .ok_or_else(|| Error::missing_primary_key(&entity.type_name, operation))
}

/// Key values of an entity instance, in key declaration order.
fn key_values<E: Entity>(entity: &EntityMetadata, value: &E, operation: &str) -> Result<Vec<Value>> {
    let row = value.to_row();
    entity
        .require_primary_key(operation)?
        .into_iter()
        .map(|key| {
            row.iter()
                .find(|(property, _)| *property == key.property)
                .map(|(_, value)| value.clone())
                .ok_or_else(|| {
                    Error::key_mismatch(
                        &entity.type_name,
                        format!("row of {} has no value for key '{}'", entity.type_name, key.property),
                    )
                })
        })
        .collect()
}

// ==================== SELECT ====================

struct JoinSpec {
    kind: JoinType,
    entity: Arc<EntityMetadata>,
    on: QueryNode,
}

/// SELECT builder.
///
/// # Example
///
/// ```ignore
/// let query = Select::<User>::new()
///     .filter(QueryNode::column::<User>("Age").gt(18))
///     .order_by(QueryNode::column::<User>("Name"), [OrderDirection::Asc])
///     .build()?;
/// ```
pub struct Select<E: Entity> {
    entity: Arc<EntityMetadata>,
    options: CompileOptions,
    columns: Option<QueryNode>,
    filter: Option<QueryNode>,
    joins: Vec<JoinSpec>,
    group_by: Option<QueryNode>,
    having: Option<QueryNode>,
    order_by: Vec<(QueryNode, Vec<OrderDirection>)>,
    distinct: bool,
    top: Option<u64>,
    aggregate: Option<(Clause<'static>, QueryNode)>,
    _marker: PhantomData<fn() -> E>,
}

impl<E: Entity> Select<E> {
    pub fn new() -> Self {
        Self {
            entity: resolve::<E>(),
            options: CompileOptions::default(),
            columns: None,
            filter: None,
            joins: Vec::new(),
            group_by: None,
            having: None,
            order_by: Vec::new(),
            distinct: false,
            top: None,
            aggregate: None,
            _marker: PhantomData,
        }
    }

    pub fn with_options(mut self, options: CompileOptions) -> Self {
        self.options = options;
        self
    }

    /// Project a member, a construct, or a whole row.
    pub fn columns(mut self, projection: QueryNode) -> Self {
        self.columns = Some(projection);
        self
    }

    /// Add a WHERE condition, AND-ed with any existing one.
    pub fn filter(mut self, condition: QueryNode) -> Self {
        self.filter = combine(self.filter.take(), condition, false);
        self
    }

    /// Add a WHERE condition, OR-ed with any existing one.
    pub fn or_filter(mut self, condition: QueryNode) -> Self {
        self.filter = combine(self.filter.take(), condition, true);
        self
    }

    /// Join another entity's table. Joined queries get generated aliases.
    pub fn join<J: Entity>(mut self, kind: JoinType, on: QueryNode) -> Self {
        self.joins.push(JoinSpec {
            kind,
            entity: resolve::<J>(),
            on,
        });
        self
    }

    pub fn group_by(mut self, keys: QueryNode) -> Self {
        self.group_by = Some(keys);
        self
    }

    pub fn having(mut self, condition: QueryNode) -> Self {
        self.having = combine(self.having.take(), condition, false);
        self
    }

    /// Order by `keys`; directions are matched to keys by position.
    pub fn order_by(
        mut self,
        keys: QueryNode,
        directions: impl IntoIterator<Item = OrderDirection>,
    ) -> Self {
        self.order_by.push((keys, directions.into_iter().collect()));
        self
    }

    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    /// Return at most `n` rows.
    pub fn top(mut self, n: u64) -> Self {
        self.top = Some(n);
        self
    }

    pub fn max(self, value: QueryNode) -> Self {
        self.aggregate(Clause::Max, value)
    }

    pub fn min(self, value: QueryNode) -> Self {
        self.aggregate(Clause::Min, value)
    }

    pub fn avg(self, value: QueryNode) -> Self {
        self.aggregate(Clause::Avg, value)
    }

    pub fn sum(self, value: QueryNode) -> Self {
        self.aggregate(Clause::Sum, value)
    }

    /// `COUNT(*)`.
    pub fn count(self) -> Self {
        let row = row_of(&self.entity);
        self.aggregate(Clause::Count, row)
    }

    fn aggregate(mut self, clause: Clause<'static>, value: QueryNode) -> Self {
        self.aggregate = Some((clause, value));
        self
    }

    fn nodes(&self) -> impl Iterator<Item = &QueryNode> {
        self.columns
            .iter()
            .chain(self.aggregate.iter().map(|(_, node)| node))
            .chain(self.joins.iter().map(|join| &join.on))
            .chain(self.filter.iter())
            .chain(self.group_by.iter())
            .chain(self.having.iter())
            .chain(self.order_by.iter().map(|(node, _)| node))
    }

    /// Fresh context with every table's alias fixed up front, base table
    /// first, so numbering never depends on clause order.
    fn context(&self) -> SqlBuildContext {
        let mut ctx = SqlBuildContext::new(self.options.clone())
            .with_default_entity(Arc::clone(&self.entity))
            .with_auto_alias(!self.joins.is_empty());
        let tables = std::iter::once(&self.entity).chain(self.joins.iter().map(|j| &j.entity));
        for entity in tables {
            let name = self
                .nodes()
                .find_map(|node| node.parameter_name_for(&entity.table_name));
            ctx.alias_for(entity, name);
        }
        ctx
    }

    /// Everything up to (not including) ORDER BY.
    fn write_body(&self, ctx: &mut SqlBuildContext, with_top: bool) -> Result<()> {
        ctx.push("SELECT ");
        if self.distinct {
            ctx.push("DISTINCT ");
        }
        if with_top && ctx.dialect() == Dialect::SqlServer {
            if let Some(n) = self.top {
                ctx.push(&format!("TOP {n} "));
            }
        }
        match (&self.aggregate, &self.columns) {
            (Some((clause, value)), _) => translate(value, *clause, ctx)?,
            (None, Some(columns)) => translate(columns, Clause::Select, ctx)?,
            (None, None) => translate(&row_of(&self.entity), Clause::Select, ctx)?,
        }

        let table = ctx.aliased_table(&self.entity);
        ctx.push(" FROM ");
        ctx.push(&table);
        for join in &self.joins {
            let table = ctx.aliased_table(&join.entity);
            ctx.push(" ");
            ctx.push(join.kind.as_str());
            ctx.push(" ");
            ctx.push(&table);
            ctx.push(" ON ");
            translate(&join.on, Clause::Join, ctx)?;
        }
        if let Some(filter) = &self.filter {
            ctx.push(" WHERE ");
            translate(filter, Clause::Where, ctx)?;
        }
        if let Some(keys) = &self.group_by {
            ctx.push(" GROUP BY ");
            translate(keys, Clause::GroupBy, ctx)?;
        }
        if let Some(having) = &self.having {
            ctx.push(" HAVING ");
            translate(having, Clause::Where, ctx)?;
        }
        Ok(())
    }

    fn write_order(&self, ctx: &mut SqlBuildContext) -> Result<()> {
        for (index, (keys, directions)) in self.order_by.iter().enumerate() {
            if index > 0 {
                ctx.push(",");
            }
            translate(keys, Clause::OrderBy(directions), ctx)?;
        }
        Ok(())
    }

    #[tracing::instrument(level = "trace", skip(self))]
    pub fn build(&self) -> Result<CompiledQuery> {
        let mut ctx = self.context();
        self.write_body(&mut ctx, true)?;
        if !self.order_by.is_empty() {
            ctx.push(" ORDER BY ");
            self.write_order(&mut ctx)?;
        }
        if let Some(n) = self.top {
            match ctx.dialect() {
                Dialect::SqlServer => {}
                Dialect::Oracle => ctx.push(&format!(" FETCH FIRST {n} ROWS ONLY")),
                Dialect::MySql | Dialect::PostgreSql | Dialect::Sqlite => {
                    ctx.push(&format!(" LIMIT {n}"));
                }
            }
        }
        Ok(CompiledQuery::finish("SELECT", ctx))
    }

    /// One page of results plus the total-count query. `index` is 1-based.
    pub fn page(&self, index: u64, size: u64) -> Result<PagedQuery> {
        self.paged(PageRequest::new(String::new(), index, size))
    }

    /// One page fetched with an extra row to detect whether another page
    /// follows; no count query is produced.
    pub fn page_with_lookahead(&self, index: u64, size: u64) -> Result<PagedQuery> {
        self.paged(PageRequest::new(String::new(), index, size).has_next_page(true))
    }

    #[tracing::instrument(level = "trace", skip(self))]
    fn paged(&self, mut request: PageRequest) -> Result<PagedQuery> {
        let mut ctx = self.context();
        self.write_body(&mut ctx, false)?;
        request.sql = ctx.take_since(0);
        if !self.order_by.is_empty() {
            request.order_field = Some(ctx.capture(|ctx| self.write_order(ctx))?);
        }
        let (_, parameters) = ctx.into_parts();
        request.parameters = parameters;
        paginate(&request, &self.options)
    }
}

impl<E: Entity> Default for Select<E> {
    fn default() -> Self {
        Self::new()
    }
}

// ==================== INSERT ====================

/// INSERT builder. Rows are constructs (or collections of them); every row
/// shares one column list.
pub struct Insert<E: Entity> {
    entity: Arc<EntityMetadata>,
    options: CompileOptions,
    rows: Vec<QueryNode>,
    returning_identity: bool,
    _marker: PhantomData<fn() -> E>,
}

impl<E: Entity> Insert<E> {
    pub fn new() -> Self {
        Self {
            entity: resolve::<E>(),
            options: CompileOptions::default(),
            rows: Vec::new(),
            returning_identity: false,
            _marker: PhantomData,
        }
    }

    pub fn with_options(mut self, options: CompileOptions) -> Self {
        self.options = options;
        self
    }

    /// Insert a construct, or an array/list of them.
    pub fn values(mut self, rows: QueryNode) -> Self {
        self.rows.push(rows);
        self
    }

    pub fn entity(self, value: &E) -> Self {
        self.values(QueryNode::entity(value))
    }

    pub fn entities(self, values: &[E]) -> Self {
        self.values(QueryNode::entities(values))
    }

    /// Append the dialect's idiom for reading back the generated key.
    pub fn returning_identity(mut self) -> Result<Self> {
        self.entity.require_primary_key("returning the identity")?;
        self.returning_identity = true;
        Ok(self)
    }

    #[tracing::instrument(level = "trace", skip(self))]
    pub fn build(&self) -> Result<CompiledQuery> {
        let mut ctx = SqlBuildContext::new(self.options.clone())
            .with_default_entity(Arc::clone(&self.entity));
        for rows in &self.rows {
            translate(rows, Clause::Insert, &mut ctx)?;
        }
        if ctx.insert_rows.is_empty() {
            return Err(Error::invalid_operand(
                "Construct",
                format!("nothing to insert into {}", self.entity.table_name),
            ));
        }

        let dialect = ctx.dialect();
        let table = ctx.table_reference(&self.entity);
        let columns = ctx.insert_rows.column_list();
        let rows = ctx.insert_rows.value_lists();

        let mut sql = format!("INSERT INTO {table} ({columns}) ");
        if rows.len() > 1 && !dialect.supports_multi_row_values() {
            let selects: Vec<String> = rows
                .iter()
                .map(|row| format!("SELECT {row} FROM DUAL"))
                .collect();
            sql.push_str(&selects.join(" UNION ALL "));
        } else {
            let tuples: Vec<String> = rows.iter().map(|row| format!("({row})")).collect();
            sql.push_str("VALUES ");
            sql.push_str(&tuples.join(","));
        }

        if self.returning_identity {
            let keys = self.entity.require_primary_key("returning the identity")?;
            let key = self.entity.identity_column().or(keys.first().copied());
            if let Some(key) = key {
                sql.push_str(&dialect.identity_suffix(&ctx.quote(&key.column)));
            }
        }

        let (_, parameters) = ctx.into_parts();
        Ok(CompiledQuery::from_parts("INSERT", sql, parameters))
    }
}

impl<E: Entity> Default for Insert<E> {
    fn default() -> Self {
        Self::new()
    }
}

// ==================== UPDATE ====================

/// UPDATE builder. Columns are never qualified.
pub struct Update<E: Entity> {
    entity: Arc<EntityMetadata>,
    options: CompileOptions,
    assignments: Option<QueryNode>,
    filter: Option<QueryNode>,
    _marker: PhantomData<fn() -> E>,
}

impl<E: Entity> Update<E> {
    pub fn new() -> Self {
        Self {
            entity: resolve::<E>(),
            options: CompileOptions::default(),
            assignments: None,
            filter: None,
            _marker: PhantomData,
        }
    }

    pub fn with_options(mut self, options: CompileOptions) -> Self {
        self.options = options;
        self
    }

    /// Assignments as a construct of `E`: constants or expressions.
    pub fn set(mut self, assignments: QueryNode) -> Self {
        self.assignments = Some(assignments);
        self
    }

    /// Write every updatable column of `value`, matching rows by its key.
    pub fn entity(mut self, value: &E) -> Result<Self> {
        let keys = key_values(&self.entity, value, "update by entity")?;
        let condition = key_filter(&self.entity, "update by entity", keys)?;
        self.assignments = Some(QueryNode::entity(value));
        self.filter = combine(self.filter.take(), condition, false);
        Ok(self)
    }

    pub fn filter(mut self, condition: QueryNode) -> Self {
        self.filter = combine(self.filter.take(), condition, false);
        self
    }

    #[tracing::instrument(level = "trace", skip(self))]
    pub fn build(&self) -> Result<CompiledQuery> {
        let assignments = self.assignments.as_ref().ok_or_else(|| {
            Error::invalid_operand(
                "Construct",
                format!("update of {} has no assignments", self.entity.table_name),
            )
        })?;
        let mut ctx = SqlBuildContext::new(self.options.clone())
            .with_default_entity(Arc::clone(&self.entity));
        ctx.register_alias(&self.entity.table_name, "");

        let table = ctx.table_reference(&self.entity);
        ctx.push("UPDATE ");
        ctx.push(&table);
        ctx.push(" SET ");
        translate(assignments, Clause::Update, &mut ctx)?;
        if let Some(filter) = &self.filter {
            ctx.push(" WHERE ");
            translate(filter, Clause::Where, &mut ctx)?;
        }
        Ok(CompiledQuery::finish("UPDATE", ctx))
    }
}

impl<E: Entity> Default for Update<E> {
    fn default() -> Self {
        Self::new()
    }
}

// ==================== DELETE ====================

/// DELETE builder.
pub struct Delete<E: Entity> {
    entity: Arc<EntityMetadata>,
    options: CompileOptions,
    filter: Option<QueryNode>,
    _marker: PhantomData<fn() -> E>,
}

impl<E: Entity> Delete<E> {
    pub fn new() -> Self {
        Self {
            entity: resolve::<E>(),
            options: CompileOptions::default(),
            filter: None,
            _marker: PhantomData,
        }
    }

    pub fn with_options(mut self, options: CompileOptions) -> Self {
        self.options = options;
        self
    }

    pub fn filter(mut self, condition: QueryNode) -> Self {
        self.filter = combine(self.filter.take(), condition, false);
        self
    }

    /// Match rows by primary key values, in key declaration order.
    pub fn by_key(mut self, values: impl IntoIterator<Item = impl Into<Value>>) -> Result<Self> {
        let values = values.into_iter().map(Into::into).collect();
        let condition = key_filter(&self.entity, "delete by key", values)?;
        self.filter = combine(self.filter.take(), condition, false);
        Ok(self)
    }

    /// Match the row holding `value`'s key.
    pub fn entity(self, value: &E) -> Result<Self> {
        let keys = key_values(&self.entity, value, "delete by entity")?;
        self.by_key(keys)
    }

    #[tracing::instrument(level = "trace", skip(self))]
    pub fn build(&self) -> Result<CompiledQuery> {
        let mut ctx = SqlBuildContext::new(self.options.clone())
            .with_default_entity(Arc::clone(&self.entity));
        ctx.register_alias(&self.entity.table_name, "");

        let table = ctx.table_reference(&self.entity);
        ctx.push("DELETE FROM ");
        ctx.push(&table);
        if let Some(filter) = &self.filter {
            ctx.push(" WHERE ");
            translate(filter, Clause::Where, &mut ctx)?;
        }
        Ok(CompiledQuery::finish("DELETE", ctx))
    }
}

impl<E: Entity> Default for Delete<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translate::fixtures::{Order, Ticket, User};
    use sqlweave_core::{ColumnInfo, MetadataErrorKind, TranslationErrorKind};

    fn user(member: &str) -> QueryNode {
        QueryNode::column::<User>(member)
    }

    fn opts(dialect: Dialect) -> CompileOptions {
        CompileOptions::new(dialect)
    }

    struct Log;

    impl Entity for Log {
        const TYPE_NAME: &'static str = "Log";

        fn columns() -> &'static [ColumnInfo] {
            static COLUMNS: &[ColumnInfo] = &[ColumnInfo::new("Message")];
            COLUMNS
        }

        fn to_row(&self) -> Vec<(&'static str, Value)> {
            vec![("Message", Value::from("m"))]
        }
    }

    #[test]
    fn test_select_with_filter_and_order() {
        let query = Select::<User>::new()
            .filter(user("Age").gt(18))
            .filter(user("Name").ne(QueryNode::null()))
            .order_by(user("Name"), [OrderDirection::Desc])
            .build()
            .unwrap();
        assert_eq!(
            query.sql,
            "SELECT * FROM User WHERE (Age > @p0 AND Name IS NOT NULL) ORDER BY Name DESC"
        );
        assert_eq!(query.values(), [Value::Int(18)]);
    }

    #[test]
    fn test_chained_filters_keep_their_grouping() {
        let query = Select::<User>::new()
            .filter(user("Age").gt(1))
            .or_filter(user("IsActive"))
            .filter(user("Name").eq("x"))
            .build()
            .unwrap();
        assert_eq!(
            query.sql,
            "SELECT * FROM User WHERE ((Age > @p0 OR IsActive = @p1) AND Name = @p2)"
        );
    }

    #[test]
    fn test_select_projection_and_named_alias() {
        let u = QueryNode::named_parameter::<User>("u");
        let query = Select::<User>::new()
            .columns(QueryNode::construct([
                ("Id", u.clone().member("Id")),
                ("Mail", u.clone().member("Email")),
            ]))
            .filter(u.member("IsActive"))
            .with_options(opts(Dialect::PostgreSql).enable_format(true))
            .build()
            .unwrap();
        assert_eq!(
            query.sql,
            "SELECT u.\"Id\",u.\"EmailAddress\" AS \"Mail\" FROM \"User\" AS u WHERE u.\"IsActive\" = :p0"
        );
        assert_eq!(query.values(), [Value::Bool(true)]);
    }

    #[test]
    fn test_join_uses_generated_aliases() {
        let on = QueryNode::column::<Order>("UserId").eq(user("Id"));
        let query = Select::<User>::new()
            .join::<Order>(JoinType::Left, on)
            .filter(QueryNode::column::<Order>("Total").ge(100))
            .build()
            .unwrap();
        assert_eq!(
            query.sql,
            "SELECT t1.* FROM User AS t1 LEFT JOIN Orders AS t2 ON t2.UserId = t1.Id WHERE t2.Total >= @p0"
        );
    }

    #[test]
    fn test_oracle_alias_has_no_as() {
        let on = QueryNode::column::<Order>("UserId").eq(user("Id"));
        let query = Select::<User>::new()
            .join::<Order>(JoinType::Inner, on)
            .with_options(opts(Dialect::Oracle))
            .build()
            .unwrap();
        assert_eq!(
            query.sql,
            "SELECT t1.* FROM User t1 INNER JOIN Orders t2 ON t2.UserId = t1.Id"
        );
    }

    #[test]
    fn test_top_per_dialect() {
        let build = |dialect| {
            Select::<User>::new()
                .top(5)
                .with_options(opts(dialect))
                .build()
                .unwrap()
                .sql
        };
        assert_eq!(build(Dialect::SqlServer), "SELECT TOP 5 * FROM User");
        assert_eq!(build(Dialect::MySql), "SELECT * FROM User LIMIT 5");
        assert_eq!(
            build(Dialect::Oracle),
            "SELECT * FROM User FETCH FIRST 5 ROWS ONLY"
        );
    }

    #[test]
    fn test_aggregates_group_and_having() {
        let query = Select::<User>::new()
            .max(user("Age"))
            .build()
            .unwrap();
        assert_eq!(query.sql, "SELECT MAX(Age) FROM User");

        let query = Select::<User>::new()
            .count()
            .distinct()
            .group_by(QueryNode::constant("Name"))
            .having(user("Name").ne(""))
            .build()
            .unwrap();
        assert_eq!(
            query.sql,
            "SELECT DISTINCT COUNT(*) FROM User GROUP BY Name HAVING Name <> @p0"
        );
    }

    #[test]
    fn test_page_wraps_body_and_keeps_parameters() {
        let paged = Select::<User>::new()
            .filter(user("Age").gt(18))
            .order_by(user("Name"), [])
            .with_options(opts(Dialect::Sqlite))
            .page(2, 10)
            .unwrap();
        assert_eq!(
            paged.data_sql,
            "SELECT * FROM User WHERE Age > @p0 ORDER BY Name ASC LIMIT 10 OFFSET 10"
        );
        assert_eq!(
            paged.count_sql.as_deref(),
            Some("SELECT COUNT(*) AS TOTAL FROM (SELECT * FROM User WHERE Age > @p0) AS T")
        );
        assert_eq!(paged.parameters.len(), 1);

        let ahead = Select::<User>::new().page_with_lookahead(1, 3).unwrap();
        assert_eq!(ahead.fetch, 4);
        assert!(ahead.count_sql.is_none());
    }

    #[test]
    fn test_insert_two_rows() {
        let query = Insert::<User>::new()
            .entities(&[
                User {
                    id: 1,
                    name: Some("a".into()),
                    age: Some(20),
                },
                User {
                    id: 2,
                    name: Some("b".into()),
                    age: None,
                },
            ])
            .build()
            .unwrap();
        assert_eq!(
            query.sql,
            "INSERT INTO User (Name,Age) VALUES (@p0,@p1),(@p2,NULL)"
        );
        assert_eq!(query.parameters.len(), 3);
    }

    #[test]
    fn test_oracle_multi_row_insert_uses_dual() {
        let query = Insert::<Ticket>::new()
            .entities(&[Ticket { title: "a" }, Ticket { title: "b" }])
            .with_options(opts(Dialect::Oracle))
            .build()
            .unwrap();
        assert_eq!(
            query.sql,
            "INSERT INTO Ticket (Id,Title) SELECT SEQ_TICKET.NEXTVAL,:p0 FROM DUAL \
             UNION ALL SELECT SEQ_TICKET.NEXTVAL,:p1 FROM DUAL"
        );
    }

    #[test]
    fn test_insert_returning_identity() {
        let row = User {
            id: 0,
            name: Some("a".into()),
            age: None,
        };
        let expected = [
            (Dialect::SqlServer, "INSERT INTO User (Name) VALUES (@p0);SELECT SCOPE_IDENTITY()"),
            (Dialect::MySql, "INSERT INTO User (Name) VALUES (?p0);SELECT LAST_INSERT_ID()"),
            (Dialect::Sqlite, "INSERT INTO User (Name) VALUES (@p0);SELECT LAST_INSERT_ROWID()"),
            (Dialect::PostgreSql, "INSERT INTO User (Name) VALUES (:p0) RETURNING Id"),
            (Dialect::Oracle, "INSERT INTO User (Name) VALUES (:p0) RETURNING Id INTO :identity"),
        ];
        for (dialect, sql) in expected {
            let query = Insert::<User>::new()
                .entity(&row)
                .with_options(opts(dialect))
                .returning_identity()
                .unwrap()
                .build()
                .unwrap();
            assert_eq!(query.sql, sql);
        }
    }

    #[test]
    fn test_insert_errors() {
        let err = Insert::<Log>::new().returning_identity().err().unwrap();
        assert_eq!(
            err.metadata_kind(),
            Some(MetadataErrorKind::MissingPrimaryKey)
        );
        let err = Insert::<User>::new().build().unwrap_err();
        assert_eq!(
            err.translation_kind(),
            Some(TranslationErrorKind::InvalidOperand)
        );
    }

    #[test]
    fn test_update_by_entity() {
        let row = User {
            id: 7,
            name: Some("n".into()),
            age: Some(30),
        };
        let query = Update::<User>::new().entity(&row).unwrap().build().unwrap();
        assert_eq!(query.sql, "UPDATE User SET Name = @p0,Age = @p1 WHERE Id = @p2");
        assert_eq!(
            query.values(),
            [Value::from("n"), Value::Int(30), Value::Int(7)]
        );
    }

    #[test]
    fn test_update_expression_with_filter() {
        let query = Update::<User>::new()
            .set(QueryNode::construct_for::<User>([(
                "Visits",
                user("Visits").add(1),
            )]))
            .filter(user("Id").eq(3))
            .with_options(opts(Dialect::MySql).enable_format(true))
            .build()
            .unwrap();
        assert_eq!(
            query.sql,
            "UPDATE `User` SET `Visits` = `Visits` + ?p0 WHERE `Id` = ?p1"
        );
    }

    #[test]
    fn test_update_without_assignments_fails() {
        assert!(Update::<User>::new().build().is_err());
        assert!(Update::<Log>::new().entity(&Log).is_err());
    }

    #[test]
    fn test_delete_by_key_and_filter() {
        let query = Delete::<User>::new().by_key([5]).unwrap().build().unwrap();
        assert_eq!(query.sql, "DELETE FROM User WHERE Id = @p0");

        let query = Delete::<User>::new()
            .filter(user("Age").lt(18))
            .with_options(opts(Dialect::PostgreSql))
            .build()
            .unwrap();
        assert_eq!(query.sql, "DELETE FROM User WHERE Age < :p0");

        let query = Delete::<Log>::new().build().unwrap();
        assert_eq!(query.sql, "DELETE FROM Log");
    }

    #[test]
    fn test_delete_key_errors() {
        let err = Delete::<User>::new().by_key([1, 2]).err().unwrap();
        assert_eq!(err.metadata_kind(), Some(MetadataErrorKind::KeyMismatch));
        let err = Delete::<Log>::new().entity(&Log).err().unwrap();
        assert_eq!(
            err.metadata_kind(),
            Some(MetadataErrorKind::MissingPrimaryKey)
        );
    }
}
