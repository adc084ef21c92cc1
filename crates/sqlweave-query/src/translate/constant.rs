//! Literal values.
//!
//! Constants are always bound as parameters except `NULL`, which is written
//! inline, and boolean literals in predicate position, which fold to
//! `1 = 1` / `1 = 0`.

use sqlweave_core::{Error, Result, Value};

use super::{ClauseTranslator, always, push_order_key, resolve_key};
use crate::clause::OrderDirection;
use crate::context::SqlBuildContext;
use crate::node::NodeKind;

pub(crate) struct ConstantNode<'n> {
    pub value: &'n Value,
}

impl ConstantNode<'_> {
    /// Textual grouping keys carried by this constant.
    fn keys(&self) -> Result<Vec<&str>> {
        match self.value {
            Value::Text(key) => Ok(vec![key.as_str()]),
            Value::Array(items) => items
                .iter()
                .map(|item| {
                    item.as_str().ok_or_else(|| {
                        Error::invalid_operand(
                            "Constant",
                            format!("grouping keys must be text, got {}", item.type_name()),
                        )
                    })
                })
                .collect(),
            other => Err(Error::invalid_operand(
                "Constant",
                format!("grouping keys must be text, got {}", other.type_name()),
            )),
        }
    }
}

impl ClauseTranslator for ConstantNode<'_> {
    fn kind(&self) -> NodeKind {
        NodeKind::Constant
    }

    fn where_clause(&self, ctx: &mut SqlBuildContext) -> Result<()> {
        if ctx.in_operand() {
            if self.value.is_null() {
                ctx.push("NULL");
            } else {
                ctx.push_parameter(self.value.clone());
            }
            return Ok(());
        }
        match self.value.as_bool() {
            Some(value) => {
                let truth = value != ctx.negated();
                always(ctx, truth);
                Ok(())
            }
            None => Err(Error::invalid_operand(
                "Constant",
                format!(
                    "a {} constant cannot stand alone as a condition",
                    self.value.type_name()
                ),
            )),
        }
    }

    fn join(&self, ctx: &mut SqlBuildContext) -> Result<()> {
        self.where_clause(ctx)
    }

    fn in_list(&self, ctx: &mut SqlBuildContext) -> Result<()> {
        match self.value {
            Value::Null => ctx.push("NULL"),
            Value::Array(items) => {
                for (index, item) in items.iter().enumerate() {
                    if index > 0 {
                        ctx.push(",");
                    }
                    ctx.push_parameter(item.clone());
                }
            }
            scalar => ctx.push_parameter(scalar.clone()),
        }
        Ok(())
    }

    fn group_by(&self, ctx: &mut SqlBuildContext) -> Result<()> {
        for (index, key) in self.keys()?.into_iter().enumerate() {
            if index > 0 {
                ctx.push(",");
            }
            let resolved = resolve_key(key, ctx);
            ctx.push(&resolved);
        }
        Ok(())
    }

    fn order_by(&self, directions: &[OrderDirection], ctx: &mut SqlBuildContext) -> Result<()> {
        for (index, key) in self.keys()?.into_iter().enumerate() {
            if index > 0 {
                ctx.push(",");
            }
            let resolved = resolve_key(key, ctx);
            push_order_key(&resolved, directions.get(index..).unwrap_or(&[]), ctx);
        }
        Ok(())
    }
}
