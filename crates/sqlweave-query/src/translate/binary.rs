//! Comparisons, connectives and arithmetic.

use sqlweave_core::Result;

use super::{ClauseTranslator, operand, predicate};
use crate::clause::Clause;
use crate::context::SqlBuildContext;
use crate::node::{BinaryOperator, NodeKind, QueryNode};

pub(crate) struct BinaryNode<'n> {
    pub left: &'n QueryNode,
    pub op: BinaryOperator,
    pub right: &'n QueryNode,
}

impl BinaryNode<'_> {
    fn wraps(&self) -> bool {
        self.left.is_predicate() && self.right.is_predicate()
    }

    /// Connectives always parenthesize themselves; a bare boolean column on
    /// either side is emitted as a comparison.
    fn logical(&self, ctx: &mut SqlBuildContext) -> Result<()> {
        let negated = ctx.negated();

        // Identity elements fold away: `true AND p` is `p`, `false OR p` is `p`.
        let identity = self.op == BinaryOperator::AndAlso;
        if self.left.as_bool_constant() == Some(identity) {
            return predicate(self.right, negated, ctx);
        }
        if self.right.as_bool_constant() == Some(identity) {
            return predicate(self.left, negated, ctx);
        }

        let op = if negated { self.op.negate() } else { self.op };
        ctx.push("(");
        predicate(self.left, negated, ctx)?;
        ctx.push(" ");
        ctx.push(op.as_str());
        ctx.push(" ");
        predicate(self.right, negated, ctx)?;
        ctx.push(")");
        Ok(())
    }

    fn comparison(&self, ctx: &mut SqlBuildContext) -> Result<()> {
        let negated = ctx.negated();
        let equality = matches!(self.op, BinaryOperator::Equal | BinaryOperator::NotEqual);

        if equality {
            for (subject, other) in [(self.left, self.right), (self.right, self.left)] {
                // `p == true` is `p`, `p == false` is `NOT p`.
                if let Some(value) = other.as_bool_constant() {
                    if subject.is_predicate() {
                        let keep = (self.op == BinaryOperator::Equal) == value;
                        return predicate(subject, negated ^ !keep, ctx);
                    }
                }
                if other.is_null_constant() && !subject.is_null_constant() {
                    operand(subject, ctx)?;
                    let is_null = (self.op == BinaryOperator::Equal) != negated;
                    ctx.push(if is_null { " IS NULL" } else { " IS NOT NULL" });
                    return Ok(());
                }
            }
        }

        let op = if negated { self.op.negate() } else { self.op };
        let wrap = self.wraps();
        if wrap {
            ctx.push("(");
        }
        operand(self.left, ctx)?;
        ctx.push(" ");
        ctx.push(op.as_str());
        ctx.push(" ");
        operand(self.right, ctx)?;
        if wrap {
            ctx.push(")");
        }
        Ok(())
    }

    /// Arithmetic; both children are values.
    fn arithmetic(&self, ctx: &mut SqlBuildContext) -> Result<()> {
        self.arithmetic_side(self.left, false, ctx)?;
        ctx.push(" ");
        ctx.push(self.op.as_str());
        ctx.push(" ");
        self.arithmetic_side(self.right, true, ctx)
    }

    fn arithmetic_side(
        &self,
        child: &QueryNode,
        is_right: bool,
        ctx: &mut SqlBuildContext,
    ) -> Result<()> {
        let parens = match child.unwrapped() {
            QueryNode::Binary { op, .. } => {
                op.precedence() < self.op.precedence()
                    || (is_right
                        && op.precedence() == self.op.precedence()
                        && self.op.is_left_associative_only())
            }
            _ => false,
        };
        if parens {
            ctx.push("(");
        }
        operand(child, ctx)?;
        if parens {
            ctx.push(")");
        }
        Ok(())
    }
}

impl ClauseTranslator for BinaryNode<'_> {
    fn kind(&self) -> NodeKind {
        NodeKind::Binary
    }

    fn where_clause(&self, ctx: &mut SqlBuildContext) -> Result<()> {
        if self.op.is_logical() {
            self.logical(ctx)
        } else if self.op.is_comparison() {
            self.comparison(ctx)
        } else {
            self.arithmetic(ctx)
        }
    }

    fn join(&self, ctx: &mut SqlBuildContext) -> Result<()> {
        self.where_clause(ctx)
    }

    /// Assignment values such as `Visits + 1`.
    fn update(&self, ctx: &mut SqlBuildContext) -> Result<()> {
        if !self.op.is_arithmetic() {
            return Err(self.unsupported(Clause::Update));
        }
        self.arithmetic(ctx)
    }

    fn aggregate(&self, clause: Clause<'_>, ctx: &mut SqlBuildContext) -> Result<()> {
        let Some(function) = clause.aggregate_function() else {
            return Err(self.unsupported(clause));
        };
        if !self.op.is_arithmetic() {
            return Err(self.unsupported(clause));
        }
        ctx.push(function);
        ctx.push("(");
        self.arithmetic(ctx)?;
        ctx.push(")");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::clause::Clause;
    use crate::dialect::Dialect;
    use crate::node::QueryNode;
    use crate::translate::fixtures::*;
    use sqlweave_core::Value;

    #[test]
    fn test_null_equality_binds_nothing() {
        let node = col("Name").eq(QueryNode::null());
        let (sql, params) = compile(&node, Clause::Where, Dialect::SqlServer).unwrap();
        assert_eq!(sql, "Name IS NULL");
        assert!(params.is_empty());
        assert_eq!(
            where_sql(&col("Name").ne(QueryNode::null())),
            "Name IS NOT NULL"
        );
        assert_eq!(
            where_sql(&QueryNode::null().eq(col("Name"))),
            "Name IS NULL"
        );
    }

    #[test]
    fn test_negated_conjunction_applies_de_morgan() {
        let node = col("Age").gt(18).and(col("Age").lt(65)).not();
        let (sql, params) = compile(&node, Clause::Where, Dialect::SqlServer).unwrap();
        assert_eq!(sql, "(Age <= @p0 OR Age >= @p1)");
        assert_eq!(values(&params), [Value::Int(18), Value::Int(65)]);
    }

    #[test]
    fn test_double_negation_restores_operators() {
        let node = col("Age").gt(18).and(col("Name").eq(QueryNode::null()));
        assert_eq!(where_sql(&node.clone().not().not()), where_sql(&node));
        assert_eq!(where_sql(&node), "(Age > @p0 AND Name IS NULL)");
    }

    #[test]
    fn test_negation_stays_inside_operand() {
        let node = col("Age").gt(18).not().and(col("Age").lt(65));
        assert_eq!(where_sql(&node), "(Age <= @p0 AND Age < @p1)");
    }

    #[test]
    fn test_boolean_constant_folding() {
        let p = col("Age").gt(1);
        assert_eq!(
            where_sql(&QueryNode::constant(true).and(p.clone())),
            "Age > @p0"
        );
        assert_eq!(where_sql(&p.clone().eq(false)), "Age <= @p0");
        assert_eq!(where_sql(&p.clone().ne(true)), "Age <= @p0");
        assert_eq!(where_sql(&p.clone().eq(true)), "Age > @p0");
        assert_eq!(where_sql(&p.ne(false).not()), "Age <= @p0");
    }

    #[test]
    fn test_connectives_are_parenthesized() {
        let node = col("Name").eq("a").or(col("Name").eq("b"));
        assert_eq!(where_sql(&node), "(Name = @p0 OR Name = @p1)");
        assert_eq!(where_sql(&col("Age").eq(30)), "Age = @p0");
    }

    #[test]
    fn test_boolean_column_under_other_connective_keeps_grouping() {
        let node = col("Age")
            .gt(1)
            .or(col("IsActive"))
            .and(col("Name").eq("x"));
        let (sql, params) = compile(&node, Clause::Where, Dialect::SqlServer).unwrap();
        assert_eq!(sql, "((Age > @p0 OR IsActive = @p1) AND Name = @p2)");
        assert_eq!(
            values(&params),
            [Value::Int(1), Value::Bool(true), Value::from("x")]
        );
    }

    #[test]
    fn test_negated_inner_conjunction_keeps_grouping() {
        let node = col("Name")
            .eq("x")
            .and(col("IsActive").and(col("Age").gt(1)).not());
        let (sql, params) = compile(&node, Clause::Where, Dialect::SqlServer).unwrap();
        assert_eq!(sql, "(Name = @p0 AND (IsActive = @p1 OR Age <= @p2))");
        assert_eq!(
            values(&params),
            [Value::from("x"), Value::Bool(false), Value::Int(1)]
        );
    }

    #[test]
    fn test_arithmetic_precedence() {
        let node = col("Age")
            .add(1)
            .mul(2)
            .gt(col("Visits").sub(col("Age").sub(3)));
        assert_eq!(
            where_sql(&node),
            "(Age + @p0) * @p1 > Visits - (Age - @p2)"
        );
        let left_assoc = col("Age").sub(1).sub(2).eq(0);
        assert_eq!(where_sql(&left_assoc), "Age - @p0 - @p1 = @p2");
    }

    #[test]
    fn test_arithmetic_negation_does_not_flip() {
        let node = col("Age").add(1).gt(10).not();
        assert_eq!(where_sql(&node), "Age + @p0 <= @p1");
    }

    #[test]
    fn test_update_assignment_expression() {
        let (sql, _) = compile(&col("Visits").add(1), Clause::Update, Dialect::MySql).unwrap();
        assert_eq!(sql, "Visits + ?p0");
        assert!(compile(&col("Visits").gt(1), Clause::Update, Dialect::MySql).is_err());
    }

    #[test]
    fn test_aggregate_over_expression() {
        let (sql, _) = compile(&col("Age").mul(2), Clause::Sum, Dialect::Oracle).unwrap();
        assert_eq!(sql, "SUM(Age * :p0)");
    }

    #[test]
    fn test_binary_in_select_is_unsupported() {
        assert!(compile(&col("Age").add(1), Clause::Select, Dialect::Sqlite).is_err());
    }
}
