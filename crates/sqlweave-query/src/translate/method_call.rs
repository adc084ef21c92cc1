//! Recognized method calls.
//!
//! Predicate methods (`Like`, `In`, `Contains`, ...) are conditions and honor
//! the negation flag. Function methods (`ToUpper`, `Trim`, ...) wrap their
//! receiver in a scalar function. `ToArray`/`ToList` are transparent where a
//! collection is expected and rejected everywhere else.

use sqlweave_core::{Error, Result};

use super::{BinaryNode, ClauseTranslator, always, operand, push_order_key, translate};
use crate::clause::{Clause, OrderDirection};
use crate::context::SqlBuildContext;
use crate::methods::Method;
use crate::node::{BinaryOperator, NodeKind, QueryNode};

pub(crate) struct MethodCallNode<'n> {
    pub target: Option<&'n QueryNode>,
    pub method: Method,
    pub args: &'n [QueryNode],
}

impl<'n> MethodCallNode<'n> {
    /// Receiver and remaining arguments. Static calls take the receiver from
    /// the first argument.
    fn receiver(&self) -> Result<(&'n QueryNode, &'n [QueryNode])> {
        let args: &'n [QueryNode] = self.args;
        match self.target {
            Some(target) => Ok((target, args)),
            None => args.split_first().ok_or_else(|| {
                Error::invalid_operand(
                    "MethodCall",
                    format!("{} called without a receiver", self.method),
                )
            }),
        }
    }

    /// Receiver plus exactly the first argument.
    fn receiver_and_argument(&self) -> Result<(&'n QueryNode, &'n QueryNode)> {
        let (receiver, rest) = self.receiver()?;
        let argument = rest.first().ok_or_else(|| {
            Error::invalid_operand("MethodCall", format!("{} expects an argument", self.method))
        })?;
        Ok((receiver, argument))
    }

    fn unsupported_method(&self, clause: Clause<'_>) -> Error {
        Error::unsupported_method(self.method.name(), Some(clause.name()))
    }

    fn predicate_method(&self, ctx: &mut SqlBuildContext) -> Result<()> {
        let negated = ctx.negated();
        match self.method {
            Method::Like | Method::LikeLeft | Method::LikeRight | Method::NotLike => {
                let (column, pattern) = self.receiver_and_argument()?;
                let negated = negated ^ (self.method == Method::NotLike);
                self.like(column, pattern, negated, ctx)
            }
            Method::Contains => {
                let (receiver, item) = self.receiver_and_argument()?;
                // A column argument means membership: `item IN (receiver)`.
                if item.is_member() {
                    membership(item, receiver, negated, ctx)
                } else {
                    self.like(receiver, item, negated, ctx)
                }
            }
            Method::In | Method::NotIn => {
                let (item, rest) = self.receiver()?;
                let negated = negated ^ (self.method == Method::NotIn);
                match rest {
                    [] => Err(Error::invalid_operand(
                        "MethodCall",
                        format!("{} expects a collection", self.method),
                    )),
                    [collection] => membership(item, collection, negated, ctx),
                    values => membership(item, &QueryNode::Array(values.to_vec()), negated, ctx),
                }
            }
            Method::IsNullOrEmpty => {
                let (receiver, _) = self.receiver()?;
                let column = ctx.capture(|ctx| operand(receiver, ctx))?;
                let sql = if negated {
                    format!("({column} IS NOT NULL AND {column} <> '')")
                } else {
                    format!("({column} IS NULL OR {column} = '')")
                };
                ctx.push(&sql);
                Ok(())
            }
            Method::Equals => {
                let (left, right) = self.receiver_and_argument()?;
                BinaryNode {
                    left,
                    op: BinaryOperator::Equal,
                    right,
                }
                .where_clause(ctx)
            }
            _ => Err(self.unsupported_method(Clause::Where)),
        }
    }

    fn like(
        &self,
        column: &QueryNode,
        pattern: &QueryNode,
        negated: bool,
        ctx: &mut SqlBuildContext,
    ) -> Result<()> {
        operand(column, ctx)?;
        ctx.push(if negated { " NOT LIKE " } else { " LIKE " });
        let value = ctx.capture(|ctx| operand(pattern, ctx))?;
        let wrapped = self
            .method
            .like_pattern(ctx.dialect(), &value)
            .ok_or_else(|| self.unsupported_method(Clause::Where))?;
        ctx.push(&wrapped);
        Ok(())
    }

    /// Scalar function over the receiver, translated for `clause`.
    fn function(&self, clause: Clause<'_>, ctx: &mut SqlBuildContext) -> Result<String> {
        let (receiver, _) = self.receiver()?;
        let inner = match clause {
            Clause::Where | Clause::Join => ctx.capture(|ctx| operand(receiver, ctx))?,
            other => ctx.capture(|ctx| translate(receiver, other, ctx))?,
        };
        self.method
            .apply_function(ctx.dialect(), &inner)
            .ok_or_else(|| self.unsupported_method(clause))
    }

    fn materialized(&self, clause: Clause<'_>, ctx: &mut SqlBuildContext) -> Result<()> {
        if !self.method.is_materializer() {
            return Err(self.unsupported_method(clause));
        }
        let (receiver, _) = self.receiver()?;
        translate(receiver, clause, ctx)
    }
}

/// `item [NOT] IN (collection)`; an empty collection folds to a constant.
fn membership(
    item: &QueryNode,
    collection: &QueryNode,
    negated: bool,
    ctx: &mut SqlBuildContext,
) -> Result<()> {
    if collection.collection_len() == Some(0) {
        always(ctx, negated);
        return Ok(());
    }
    operand(item, ctx)?;
    ctx.push(if negated { " NOT IN (" } else { " IN (" });
    ctx.scoped(false, true, |ctx| translate(collection, Clause::In, ctx))?;
    ctx.push(")");
    Ok(())
}

impl ClauseTranslator for MethodCallNode<'_> {
    fn kind(&self) -> NodeKind {
        NodeKind::MethodCall
    }

    fn where_clause(&self, ctx: &mut SqlBuildContext) -> Result<()> {
        if self.method.is_predicate() {
            self.predicate_method(ctx)
        } else if self.method.is_function() {
            let sql = self.function(Clause::Where, ctx)?;
            ctx.push(&sql);
            Ok(())
        } else {
            Err(self.unsupported_method(Clause::Where))
        }
    }

    fn join(&self, ctx: &mut SqlBuildContext) -> Result<()> {
        self.where_clause(ctx)
    }

    fn select(&self, ctx: &mut SqlBuildContext) -> Result<()> {
        if !self.method.is_function() {
            return Err(self.unsupported_method(Clause::Select));
        }
        let sql = self.function(Clause::Select, ctx)?;
        ctx.push(&sql);
        Ok(())
    }

    fn insert(&self, ctx: &mut SqlBuildContext) -> Result<()> {
        self.materialized(Clause::Insert, ctx)
    }

    fn in_list(&self, ctx: &mut SqlBuildContext) -> Result<()> {
        self.materialized(Clause::In, ctx)
    }

    fn group_by(&self, ctx: &mut SqlBuildContext) -> Result<()> {
        if !self.method.is_function() {
            return Err(self.unsupported_method(Clause::GroupBy));
        }
        let sql = self.function(Clause::GroupBy, ctx)?;
        ctx.push(&sql);
        Ok(())
    }

    fn order_by(&self, directions: &[OrderDirection], ctx: &mut SqlBuildContext) -> Result<()> {
        if !self.method.is_function() {
            return Err(self.unsupported_method(Clause::OrderBy(directions)));
        }
        let sql = self.function(Clause::GroupBy, ctx)?;
        push_order_key(&sql, directions, ctx);
        Ok(())
    }
}
