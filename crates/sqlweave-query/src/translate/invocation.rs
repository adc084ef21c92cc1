use sqlweave_core::Result;

use super::{ClauseTranslator, translate};
use crate::clause::Clause;
use crate::context::SqlBuildContext;
use crate::node::{NodeKind, QueryNode};

/// Invocation of a nested expression: translated as the expression.
pub(crate) struct InvocationNode<'n> {
    pub inner: &'n QueryNode,
}

impl ClauseTranslator for InvocationNode<'_> {
    fn kind(&self) -> NodeKind {
        NodeKind::Invocation
    }

    fn translate(&self, clause: Clause<'_>, ctx: &mut SqlBuildContext) -> Result<()> {
        translate(self.inner, clause, ctx)
    }
}
