//! Node dispatcher.
//!
//! [`translate`] is the single entry point: it borrows the matching node
//! struct for a [`QueryNode`] variant and routes the clause to it through
//! [`ClauseTranslator`]. A node kind implements only the clauses it
//! supports; every other (node, clause) pair falls through to the default
//! methods and fails with `UnsupportedTranslation`.
//!
//! Predicates are written with the build context's negation flag applied,
//! so `NOT` never appears in output for comparisons, connectives, `LIKE`,
//! `IN` or null checks. Operands (comparison sides, function arguments,
//! arithmetic) are written with the flag cleared.

mod binary;
mod collection;
mod constant;
mod construct;
mod invocation;
mod member;
mod method_call;
mod parameter;
mod unary;

use sqlweave_core::{Error, Result};

use crate::clause::{Clause, OrderDirection, has_direction};
use crate::context::SqlBuildContext;
use crate::node::{NodeKind, QueryNode};

use binary::BinaryNode;
use collection::CollectionNode;
use constant::ConstantNode;
use construct::ConstructNode;
use invocation::InvocationNode;
use member::MemberNode;
use method_call::MethodCallNode;
use parameter::ParameterNode;
use unary::UnaryNode;

/// Translate `node` for `clause`, appending SQL and parameters to `ctx`.
pub fn translate(node: &QueryNode, clause: Clause<'_>, ctx: &mut SqlBuildContext) -> Result<()> {
    tracing::trace!(
        node = node.kind().as_str(),
        clause = clause.name(),
        negated = ctx.negated(),
        "Translating node"
    );
    match node {
        QueryNode::Binary { left, op, right } => BinaryNode {
            left,
            op: *op,
            right,
        }
        .translate(clause, ctx),
        QueryNode::Unary { op, operand } => UnaryNode { op: *op, operand }.translate(clause, ctx),
        QueryNode::Member { owner, member } => MemberNode { owner, member }.translate(clause, ctx),
        QueryNode::MethodCall {
            target,
            method,
            args,
        } => MethodCallNode {
            target: target.as_deref(),
            method: *method,
            args,
        }
        .translate(clause, ctx),
        QueryNode::Constant(value) => ConstantNode { value }.translate(clause, ctx),
        QueryNode::Construct { entity, members } => ConstructNode {
            entity: entity.as_ref(),
            members,
        }
        .translate(clause, ctx),
        QueryNode::Array(items) => CollectionNode {
            kind: NodeKind::Array,
            items,
        }
        .translate(clause, ctx),
        QueryNode::List(items) => CollectionNode {
            kind: NodeKind::List,
            items,
        }
        .translate(clause, ctx),
        QueryNode::Parameter { entity, name } => ParameterNode {
            entity,
            name: name.as_deref(),
        }
        .translate(clause, ctx),
        QueryNode::Invocation(inner) => InvocationNode { inner }.translate(clause, ctx),
    }
}

/// Per-clause translation for one node kind.
pub(crate) trait ClauseTranslator {
    fn kind(&self) -> NodeKind;

    fn translate(&self, clause: Clause<'_>, ctx: &mut SqlBuildContext) -> Result<()> {
        dispatch(self, clause, ctx)
    }

    fn unsupported(&self, clause: Clause<'_>) -> Error {
        Error::unsupported_translation(self.kind().as_str(), clause.name())
    }

    fn select(&self, _ctx: &mut SqlBuildContext) -> Result<()> {
        Err(self.unsupported(Clause::Select))
    }

    fn insert(&self, _ctx: &mut SqlBuildContext) -> Result<()> {
        Err(self.unsupported(Clause::Insert))
    }

    fn update(&self, _ctx: &mut SqlBuildContext) -> Result<()> {
        Err(self.unsupported(Clause::Update))
    }

    fn where_clause(&self, _ctx: &mut SqlBuildContext) -> Result<()> {
        Err(self.unsupported(Clause::Where))
    }

    fn join(&self, _ctx: &mut SqlBuildContext) -> Result<()> {
        Err(self.unsupported(Clause::Join))
    }

    fn group_by(&self, _ctx: &mut SqlBuildContext) -> Result<()> {
        Err(self.unsupported(Clause::GroupBy))
    }

    fn order_by(&self, _directions: &[OrderDirection], _ctx: &mut SqlBuildContext) -> Result<()> {
        Err(self.unsupported(Clause::OrderBy(&[])))
    }

    fn in_list(&self, _ctx: &mut SqlBuildContext) -> Result<()> {
        Err(self.unsupported(Clause::In))
    }

    /// `Max`, `Min`, `Avg`, `Count` and `Sum`.
    fn aggregate(&self, clause: Clause<'_>, _ctx: &mut SqlBuildContext) -> Result<()> {
        Err(self.unsupported(clause))
    }
}

fn dispatch<T: ClauseTranslator + ?Sized>(
    node: &T,
    clause: Clause<'_>,
    ctx: &mut SqlBuildContext,
) -> Result<()> {
    match clause {
        Clause::Select => node.select(ctx),
        Clause::Insert => node.insert(ctx),
        Clause::Update => node.update(ctx),
        Clause::Where => node.where_clause(ctx),
        Clause::Join => node.join(ctx),
        Clause::GroupBy => node.group_by(ctx),
        Clause::OrderBy(directions) => node.order_by(directions, ctx),
        Clause::In => node.in_list(ctx),
        Clause::Max | Clause::Min | Clause::Avg | Clause::Count | Clause::Sum => {
            node.aggregate(clause, ctx)
        }
    }
}

// ==================== Helpers ====================

/// Write `node` as a condition, negated if asked.
pub(crate) fn predicate(
    node: &QueryNode,
    negated: bool,
    ctx: &mut SqlBuildContext,
) -> Result<()> {
    ctx.scoped(negated, false, |ctx| translate(node, Clause::Where, ctx))
}

/// Write `node` as a value.
pub(crate) fn operand(node: &QueryNode, ctx: &mut SqlBuildContext) -> Result<()> {
    ctx.scoped(false, true, |ctx| translate(node, Clause::Where, ctx))
}

/// Constant condition.
pub(crate) fn always(ctx: &mut SqlBuildContext, truth: bool) {
    ctx.push(if truth { "1 = 1" } else { "1 = 0" });
}

/// Write each item, comma separated.
pub(crate) fn each_separated<'n>(
    items: impl IntoIterator<Item = &'n QueryNode>,
    ctx: &mut SqlBuildContext,
    mut f: impl FnMut(usize, &'n QueryNode, &mut SqlBuildContext) -> Result<()>,
) -> Result<()> {
    for (index, item) in items.into_iter().enumerate() {
        if index > 0 {
            ctx.push(",");
        }
        f(index, item, ctx)?;
    }
    Ok(())
}

/// Write an ordering key followed by its direction.
///
/// Keys that already end in `ASC`/`DESC` are written as given.
pub(crate) fn push_order_key(key: &str, directions: &[OrderDirection], ctx: &mut SqlBuildContext) {
    ctx.push(key);
    if !has_direction(key) {
        ctx.push(" ");
        ctx.push(directions.first().copied().unwrap_or_default().as_str());
    }
}

/// Resolve a textual grouping or ordering key against the default entity.
///
/// A property name becomes its qualified column; anything else is raw SQL.
pub(crate) fn resolve_key(key: &str, ctx: &mut SqlBuildContext) -> String {
    if has_direction(key) {
        return key.to_string();
    }
    let Some(entity) = ctx.default_entity().cloned() else {
        return key.to_string();
    };
    match entity.column_for_property(key.trim()) {
        Some(column) => {
            let alias = ctx.alias_for(&entity, None);
            ctx.qualified_column(&alias, &column.column)
        }
        None => key.to_string(),
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use crate::dialect::Dialect;
    use sqlweave_core::TranslationErrorKind;

    #[test]
    fn test_unsupported_pair_names_node_and_clause() {
        let err = compile(&QueryNode::constant(1), Clause::Select, Dialect::SqlServer)
            .unwrap_err();
        assert_eq!(
            err.translation_kind(),
            Some(TranslationErrorKind::UnsupportedTranslation)
        );
        assert_eq!(
            err.to_string(),
            "Translation error: Constant nodes cannot be translated in a Select clause"
        );
    }

    #[test]
    fn test_parameter_in_where_is_unsupported() {
        let err = compile(
            &QueryNode::parameter::<User>(),
            Clause::Where,
            Dialect::SqlServer,
        )
        .unwrap_err();
        assert!(err.to_string().contains("Parameter"));
    }

    #[test]
    fn test_order_key_keeps_explicit_direction() {
        let mut ctx = SqlBuildContext::new(crate::options::CompileOptions::default());
        push_order_key("Name DESC", &[OrderDirection::Asc], &mut ctx);
        ctx.push(",");
        push_order_key("Age", &[], &mut ctx);
        assert_eq!(ctx.sql(), "Name DESC,Age ASC");
    }

    #[test]
    fn test_resolve_key_maps_properties() {
        let mut ctx = SqlBuildContext::new(crate::options::CompileOptions::default())
            .with_default_entity(sqlweave_core::resolve::<User>());
        assert_eq!(resolve_key("Email", &mut ctx), "EmailAddress");
        assert_eq!(resolve_key("LEN(Name)", &mut ctx), "LEN(Name)");
    }

    #[test]
    fn test_compilation_is_deterministic() {
        let node = col("Age")
            .gt(18)
            .and(col("Name").like("ann"))
            .or(col("Id").is_in(QueryNode::array([1, 2])));
        let first = compile(&node, Clause::Where, Dialect::PostgreSql).unwrap();
        let second = compile(&node, Clause::Where, Dialect::PostgreSql).unwrap();
        assert_eq!(first, second);
    }
}
