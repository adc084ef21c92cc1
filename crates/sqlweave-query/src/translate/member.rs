//! Column references.

use std::sync::Arc;

use sqlweave_core::{EntityMetadata, Error, Result, Value};

use super::{ClauseTranslator, push_order_key};
use crate::clause::{Clause, OrderDirection};
use crate::context::SqlBuildContext;
use crate::node::{NodeKind, QueryNode};

pub(crate) struct MemberNode<'n> {
    pub owner: &'n QueryNode,
    pub member: &'n str,
}

impl<'n> MemberNode<'n> {
    /// The entity owning the column and the alias its parameter asked for.
    ///
    /// A parameter owner wins; otherwise the context's default entity.
    fn owner_entity(
        &self,
        ctx: &SqlBuildContext,
    ) -> Result<(Arc<EntityMetadata>, Option<&'n str>)> {
        let owner: &'n QueryNode = self.owner;
        match owner.unwrapped() {
            QueryNode::Parameter { entity, name } => Ok((Arc::clone(entity), name.as_deref())),
            _ => ctx
                .default_entity()
                .map(|entity| (Arc::clone(entity), None))
                .ok_or_else(|| {
                    Error::invalid_operand(
                        "Member",
                        format!("cannot resolve the table owning '{}'", self.member),
                    )
                }),
        }
    }

    /// `alias.column`.
    fn qualified(&self, ctx: &mut SqlBuildContext) -> Result<String> {
        let (entity, name) = self.owner_entity(ctx)?;
        let column = entity.require_column(self.member)?.column.clone();
        let alias = ctx.alias_for(&entity, name);
        Ok(ctx.qualified_column(&alias, &column))
    }
}

impl ClauseTranslator for MemberNode<'_> {
    fn kind(&self) -> NodeKind {
        NodeKind::Member
    }

    fn select(&self, ctx: &mut SqlBuildContext) -> Result<()> {
        let column = self.qualified(ctx)?;
        ctx.push(&column);
        Ok(())
    }

    /// Insert column lists are never qualified.
    fn insert(&self, ctx: &mut SqlBuildContext) -> Result<()> {
        let (entity, _) = self.owner_entity(ctx)?;
        let column = ctx.quote(&entity.require_column(self.member)?.column).into_owned();
        ctx.push(&column);
        Ok(())
    }

    fn update(&self, ctx: &mut SqlBuildContext) -> Result<()> {
        self.select(ctx)
    }

    /// A value inside an operand; a boolean column test in predicate
    /// position.
    fn where_clause(&self, ctx: &mut SqlBuildContext) -> Result<()> {
        let column = self.qualified(ctx)?;
        ctx.push(&column);
        if !ctx.in_operand() {
            let value = !ctx.negated();
            ctx.push(" = ");
            ctx.push_parameter(Value::Bool(value));
        }
        Ok(())
    }

    fn join(&self, ctx: &mut SqlBuildContext) -> Result<()> {
        self.where_clause(ctx)
    }

    fn group_by(&self, ctx: &mut SqlBuildContext) -> Result<()> {
        self.select(ctx)
    }

    fn order_by(&self, directions: &[OrderDirection], ctx: &mut SqlBuildContext) -> Result<()> {
        let column = self.qualified(ctx)?;
        push_order_key(&column, directions, ctx);
        Ok(())
    }

    fn in_list(&self, ctx: &mut SqlBuildContext) -> Result<()> {
        self.select(ctx)
    }

    fn aggregate(&self, clause: Clause<'_>, ctx: &mut SqlBuildContext) -> Result<()> {
        let Some(function) = clause.aggregate_function() else {
            return Err(self.unsupported(clause));
        };
        let column = self.qualified(ctx)?;
        ctx.push(function);
        ctx.push("(");
        ctx.push(&column);
        ctx.push(")");
        Ok(())
    }
}
