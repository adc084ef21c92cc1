use std::sync::Arc;

use sqlweave_core::{EntityMetadata, Result};

use super::ClauseTranslator;
use crate::clause::Clause;
use crate::context::SqlBuildContext;
use crate::node::NodeKind;

/// A whole row of an entity's table.
pub(crate) struct ParameterNode<'n> {
    pub entity: &'n Arc<EntityMetadata>,
    pub name: Option<&'n str>,
}

impl ClauseTranslator for ParameterNode<'_> {
    fn kind(&self) -> NodeKind {
        NodeKind::Parameter
    }

    fn select(&self, ctx: &mut SqlBuildContext) -> Result<()> {
        let alias = ctx.alias_for(self.entity, self.name);
        if alias.is_empty() {
            ctx.push("*");
        } else {
            ctx.push(&alias);
            ctx.push(".*");
        }
        Ok(())
    }

    fn aggregate(&self, clause: Clause<'_>, ctx: &mut SqlBuildContext) -> Result<()> {
        match clause {
            Clause::Count => {
                ctx.push("COUNT(*)");
                Ok(())
            }
            other => Err(self.unsupported(other)),
        }
    }
}
