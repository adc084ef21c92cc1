//! `NOT`, arithmetic negation and transparent conversions.

use sqlweave_core::Result;

use super::{ClauseTranslator, dispatch, operand, predicate, translate};
use crate::clause::Clause;
use crate::context::SqlBuildContext;
use crate::node::{NodeKind, QueryNode, UnaryOperator};

pub(crate) struct UnaryNode<'n> {
    pub op: UnaryOperator,
    pub operand: &'n QueryNode,
}

impl ClauseTranslator for UnaryNode<'_> {
    fn kind(&self) -> NodeKind {
        NodeKind::Unary
    }

    fn translate(&self, clause: Clause<'_>, ctx: &mut SqlBuildContext) -> Result<()> {
        match self.op {
            UnaryOperator::Convert => translate(self.operand, clause, ctx),
            UnaryOperator::Not | UnaryOperator::Negate => dispatch(self, clause, ctx),
        }
    }

    fn where_clause(&self, ctx: &mut SqlBuildContext) -> Result<()> {
        match self.op {
            UnaryOperator::Not => predicate(self.operand, !ctx.negated(), ctx),
            UnaryOperator::Negate => {
                let parens = matches!(self.operand.unwrapped(), QueryNode::Binary { .. });
                ctx.push("-");
                if parens {
                    ctx.push("(");
                }
                operand(self.operand, ctx)?;
                if parens {
                    ctx.push(")");
                }
                Ok(())
            }
            UnaryOperator::Convert => operand(self.operand, ctx),
        }
    }

    fn join(&self, ctx: &mut SqlBuildContext) -> Result<()> {
        self.where_clause(ctx)
    }
}

#[cfg(test)]
mod tests {
    use crate::clause::Clause;
    use crate::dialect::Dialect;
    use crate::translate::fixtures::*;
    use sqlweave_core::Value;

    #[test]
    fn test_not_member_binds_false() {
        let (sql, params) =
            compile(&col("IsActive").not(), Clause::Where, Dialect::Sqlite).unwrap();
        assert_eq!(sql, "IsActive = @p0");
        assert_eq!(values(&params), [Value::Bool(false)]);
    }

    #[test]
    fn test_negate_wraps_binary_operand() {
        assert_eq!(
            where_sql(&col("Age").add(1).negate().lt(0)),
            "-(Age + @p0) < @p1"
        );
        assert_eq!(where_sql(&col("Age").negate().lt(0)), "-Age < @p0");
    }

    #[test]
    fn test_convert_is_transparent_in_every_clause() {
        let (sql, _) =
            compile(&col("Name").convert(), Clause::Select, Dialect::SqlServer).unwrap();
        assert_eq!(sql, "Name");
        assert_eq!(where_sql(&col("Age").convert().ge(21)), "Age >= @p0");
    }

    #[test]
    fn test_not_in_select_is_unsupported() {
        let err =
            compile(&col("IsActive").not(), Clause::Select, Dialect::SqlServer).unwrap_err();
        assert!(err.to_string().contains("Unary"));
    }
}
