use sqlweave_core::Result;

use super::{ClauseTranslator, each_separated, translate};
use crate::clause::{Clause, OrderDirection};
use crate::context::SqlBuildContext;
use crate::node::{NodeKind, QueryNode};

/// Array and list literals.
pub(crate) struct CollectionNode<'n> {
    pub kind: NodeKind,
    pub items: &'n [QueryNode],
}

impl ClauseTranslator for CollectionNode<'_> {
    fn kind(&self) -> NodeKind {
        self.kind
    }

    /// One row per item.
    fn insert(&self, ctx: &mut SqlBuildContext) -> Result<()> {
        for item in self.items {
            translate(item, Clause::Insert, ctx)?;
        }
        Ok(())
    }

    fn in_list(&self, ctx: &mut SqlBuildContext) -> Result<()> {
        each_separated(self.items, ctx, |_, item, ctx| {
            translate(item, Clause::In, ctx)
        })
    }

    fn group_by(&self, ctx: &mut SqlBuildContext) -> Result<()> {
        each_separated(self.items, ctx, |_, item, ctx| {
            translate(item, Clause::GroupBy, ctx)
        })
    }

    fn order_by(&self, directions: &[OrderDirection], ctx: &mut SqlBuildContext) -> Result<()> {
        let clause = Clause::OrderBy(directions);
        each_separated(self.items, ctx, |index, item, ctx| {
            translate(item, clause.directions_from(index), ctx)
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::clause::{Clause, OrderDirection};
    use crate::dialect::Dialect;
    use crate::node::QueryNode;
    use crate::translate::fixtures::*;

    #[test]
    fn test_in_items_are_comma_joined() {
        let node = QueryNode::list([QueryNode::constant(1), col("Visits")]);
        let (sql, params) = compile(&node, Clause::In, Dialect::MySql).unwrap();
        assert_eq!(sql, "?p0,Visits");
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn test_order_directions_follow_position() {
        let node = QueryNode::array([col("Name"), col("Age"), col("Id")]);
        let dirs = [OrderDirection::Desc, OrderDirection::Asc];
        let (sql, _) = compile(&node, Clause::OrderBy(&dirs), Dialect::SqlServer).unwrap();
        assert_eq!(sql, "Name DESC,Age ASC,Id ASC");
    }

    #[test]
    fn test_group_by_mixes_members_and_names() {
        let node = QueryNode::array([col("Name"), QueryNode::constant("Email")]);
        let (sql, _) = compile(&node, Clause::GroupBy, Dialect::Sqlite).unwrap();
        assert_eq!(sql, "Name,EmailAddress");
    }

    #[test]
    fn test_array_in_where_is_unsupported() {
        let err = compile(&QueryNode::array([1]), Clause::Where, Dialect::Sqlite).unwrap_err();
        assert!(err.to_string().contains("Array"));
        let err = compile(&QueryNode::list([1]), Clause::Select, Dialect::Sqlite).unwrap_err();
        assert!(err.to_string().contains("List"));
    }
}
