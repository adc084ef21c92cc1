//! Object construction: projections, insert rows and assignment lists.

use std::sync::Arc;

use sqlweave_core::{EntityMetadata, Error, Result, Value};

use super::{ClauseTranslator, each_separated, operand, translate};
use crate::clause::{Clause, OrderDirection};
use crate::context::SqlBuildContext;
use crate::dialect::Dialect;
use crate::node::{NodeKind, QueryNode};

pub(crate) struct ConstructNode<'n> {
    pub entity: Option<&'n Arc<EntityMetadata>>,
    pub members: &'n [(String, QueryNode)],
}

impl ConstructNode<'_> {
    fn target_entity(&self, ctx: &SqlBuildContext) -> Result<Arc<EntityMetadata>> {
        self.entity
            .or_else(|| ctx.default_entity())
            .cloned()
            .ok_or_else(|| {
                Error::invalid_operand("Construct", "no entity to map construct members onto")
            })
    }

    fn value_of(&self, property: &str) -> Option<&QueryNode> {
        self.members
            .iter()
            .find(|(member, _)| member == property)
            .map(|(_, value)| value)
    }

    fn warn_unmapped(&self, entity: &EntityMetadata) {
        for (member, _) in self.members {
            if entity.column_for_property(member).is_none() {
                tracing::warn!(
                    entity = %entity.type_name,
                    member = %member,
                    "Ignoring construct member with no mapped column"
                );
            }
        }
    }

    fn values(&self) -> impl Iterator<Item = &QueryNode> {
        self.members.iter().map(|(_, value)| value)
    }
}

impl ClauseTranslator for ConstructNode<'_> {
    fn kind(&self) -> NodeKind {
        NodeKind::Construct
    }

    /// `source AS target` per member; the alias is dropped when a column is
    /// projected under its own name.
    fn select(&self, ctx: &mut SqlBuildContext) -> Result<()> {
        for (index, (target, value)) in self.members.iter().enumerate() {
            if index > 0 {
                ctx.push(",");
            }
            translate(value, Clause::Select, ctx)?;
            let same_name = match value.unwrapped() {
                QueryNode::Member { member, .. } => member == target,
                QueryNode::Parameter { .. } => true,
                _ => false,
            };
            if !same_name {
                let alias = ctx.quote(target).into_owned();
                ctx.push(" AS ");
                ctx.push(&alias);
            }
        }
        Ok(())
    }

    /// One row for the pending INSERT, in metadata order.
    fn insert(&self, ctx: &mut SqlBuildContext) -> Result<()> {
        let entity = self.target_entity(ctx)?;
        self.warn_unmapped(&entity);
        let persist_nulls = ctx.options().enable_null_value_persistence;
        let dialect = ctx.dialect();

        let mut row = Vec::new();
        for (position, column) in entity.columns.iter().enumerate() {
            let name = ctx.quote(&column.column).into_owned();
            if dialect == Dialect::Oracle {
                if let Some(sequence) = &column.sequence {
                    row.push((position, name, format!("{sequence}.NEXTVAL")));
                    continue;
                }
            }
            if !column.insertable {
                continue;
            }
            let Some(value) = self.value_of(&column.property) else {
                continue;
            };
            let fragment = match value.unwrapped() {
                QueryNode::Constant(Value::Null) if !persist_nulls => continue,
                QueryNode::Constant(Value::Null) => "NULL".to_string(),
                QueryNode::Constant(constant) => ctx.add_parameter(constant.clone()),
                expression => ctx.capture(|ctx| operand(expression, ctx))?,
            };
            row.push((position, name, fragment));
        }

        if row.is_empty() {
            tracing::trace!(entity = %entity.type_name, "Insert row has no columns; skipped");
        } else {
            ctx.insert_rows.push_row(row);
        }
        Ok(())
    }

    /// `col = value` for every updatable column the construct binds.
    fn update(&self, ctx: &mut SqlBuildContext) -> Result<()> {
        let entity = self.target_entity(ctx)?;
        self.warn_unmapped(&entity);
        let persist_nulls = ctx.options().enable_null_value_persistence;

        let mut written = 0;
        for column in entity.columns.iter().filter(|c| c.updatable) {
            let Some(value) = self.value_of(&column.property) else {
                continue;
            };
            if value.is_null_constant() && !persist_nulls {
                continue;
            }
            if written > 0 {
                ctx.push(",");
            }
            let name = ctx.quote(&column.column).into_owned();
            ctx.push(&name);
            ctx.push(" = ");
            match value.unwrapped() {
                QueryNode::Constant(Value::Null) => ctx.push("NULL"),
                QueryNode::Constant(constant) => ctx.push_parameter(constant.clone()),
                expression => translate(expression, Clause::Update, ctx)?,
            }
            written += 1;
        }

        if written == 0 {
            return Err(Error::invalid_operand(
                "Construct",
                format!("nothing to assign on {}", entity.type_name),
            ));
        }
        Ok(())
    }

    fn group_by(&self, ctx: &mut SqlBuildContext) -> Result<()> {
        each_separated(self.values(), ctx, |_, value, ctx| {
            translate(value, Clause::GroupBy, ctx)
        })
    }

    fn order_by(&self, directions: &[OrderDirection], ctx: &mut SqlBuildContext) -> Result<()> {
        let clause = Clause::OrderBy(directions);
        each_separated(self.values(), ctx, |index, value, ctx| {
            translate(value, clause.directions_from(index), ctx)
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::clause::{Clause, OrderDirection};
    use crate::context::SqlBuildContext;
    use crate::dialect::Dialect;
    use crate::node::QueryNode;
    use crate::options::CompileOptions;
    use crate::translate::fixtures::*;
    use crate::translate::translate;
    use sqlweave_core::{Value, resolve};

    fn insert_rows(node: &QueryNode, options: CompileOptions) -> (String, Vec<String>, usize) {
        let mut ctx = SqlBuildContext::new(options).with_default_entity(resolve::<User>());
        translate(node, Clause::Insert, &mut ctx).unwrap();
        let columns = ctx.insert_rows.column_list();
        let rows = ctx.insert_rows.value_lists();
        (columns, rows, ctx.parameters().len())
    }

    #[test]
    fn test_projection_aliases_only_renamed_members() {
        let node = QueryNode::construct([
            ("Name", col("Name")),
            ("Mail", col("Email")),
            ("Shout", col("Name").to_upper()),
        ]);
        let (sql, _) = compile(&node, Clause::Select, Dialect::SqlServer).unwrap();
        assert_eq!(sql, "Name,EmailAddress AS Mail,UPPER(Name) AS Shout");
    }

    #[test]
    fn test_two_rows_share_column_list() {
        let rows = QueryNode::entities(&[
            User {
                id: 1,
                name: Some("a".into()),
                age: Some(3),
            },
            User {
                id: 2,
                name: Some("b".into()),
                age: None,
            },
        ]);
        let (columns, values, params) = insert_rows(&rows, CompileOptions::default());
        assert_eq!(columns, "Name,Age");
        assert_eq!(values, ["@p0,@p1", "@p2,NULL"]);
        assert_eq!(params, 3);
    }

    #[test]
    fn test_null_persistence_writes_null() {
        let row = QueryNode::entity(&User {
            id: 1,
            name: None,
            age: Some(4),
        });
        let options = CompileOptions::default().enable_null_value_persistence(true);
        let (columns, values, params) = insert_rows(&row, options);
        assert_eq!(columns, "Name,Age");
        assert_eq!(values, ["NULL,@p0"]);
        assert_eq!(params, 1);
    }

    #[test]
    fn test_oracle_sequence_column() {
        let row = QueryNode::entity(&Ticket { title: "t" });
        let options = CompileOptions::new(Dialect::Oracle);
        let (columns, values, _) = insert_rows(&row, options);
        assert_eq!(columns, "Id,Title");
        assert_eq!(values, ["SEQ_TICKET.NEXTVAL,:p0"]);

        let (columns, values, _) = insert_rows(&row, CompileOptions::new(Dialect::PostgreSql));
        assert_eq!(columns, "Title");
        assert_eq!(values, [":p0"]);
    }

    #[test]
    fn test_update_skips_keys_and_read_only_columns() {
        let node = QueryNode::construct_for::<User>([
            ("Id", QueryNode::constant(9)),
            ("CreatedAt", QueryNode::constant(0)),
            ("Name", QueryNode::constant("n")),
            ("Visits", col("Visits").add(1)),
            ("Age", QueryNode::null()),
        ]);
        let (sql, params) = compile(&node, Clause::Update, Dialect::SqlServer).unwrap();
        assert_eq!(sql, "Name = @p0,Visits = Visits + @p1");
        assert_eq!(values(&params), [Value::from("n"), Value::Int(1)]);

        let options = CompileOptions::default().enable_null_value_persistence(true);
        let (sql, _) = compile_with(&node, Clause::Update, options).unwrap();
        assert_eq!(sql, "Name = @p0,Age = NULL,Visits = Visits + @p1");
    }

    #[test]
    fn test_update_with_nothing_to_assign_fails() {
        let node = QueryNode::construct_for::<User>([("Id", QueryNode::constant(1))]);
        assert!(compile(&node, Clause::Update, Dialect::SqlServer).is_err());
    }

    #[test]
    fn test_ordering_by_construct_members() {
        let node = QueryNode::construct([("a", col("Age")), ("b", col("Name"))]);
        let dirs = [OrderDirection::Asc, OrderDirection::Desc];
        let (sql, _) = compile(&node, Clause::OrderBy(&dirs), Dialect::MySql).unwrap();
        assert_eq!(sql, "Age ASC,Name DESC");
    }
}
