use quarry_sql::analysis::visit_mut::{walk_from_item, VisitorMut};
use quarry_sql::ast::{FromItem, QueryModel, RelationBinding, VariableRef};

struct RenumberRelations {
    slot: usize,
}

impl<'ast> VisitorMut<'ast> for RenumberRelations {
    type Error = ();

    fn visit_variable_ref(&mut self, var: &'ast mut VariableRef) -> Result<(), ()> {
        var.slot = self.slot;
        Ok(())
    }

    fn visit_relation_binding(&mut self, rel: &'ast mut RelationBinding) -> Result<(), ()> {
        rel.slot = self.slot;
        Ok(())
    }

    fn visit_from_item(&mut self, item: &'ast mut FromItem) -> Result<(), ()> {
        if let FromItem::Relation(slot) = item {
            *slot = self.slot;
        }
        walk_from_item(self, item)
    }
}

/// Rewrite every relation slot in `query` (relation bindings, join-tree
/// references and variable references) to `slot`.
///
/// Discarding a view's maintenance-only image bindings leaves the one real
/// relation at whatever position it happened to occupy; the sole remaining
/// relation is canonicalized (to slot 1 in practice) so expressions from the
/// view can be compared against expressions from the outer query.
pub fn renumber_relations(query: &mut QueryModel, slot: usize) {
    let _ = RenumberRelations { slot }.visit_query_model(query);
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use quarry_sql::ast::{Expr, FunctionExpr, Literal, ProjectionItem};

    use super::*;

    #[test]
    fn renumbers_bindings_from_items_and_variables() {
        let mut query = QueryModel::select_from(RelationBinding::base_table(3, "t1"));
        query.projection = vec![
            ProjectionItem::new(1, "c1", Expr::Variable(VariableRef::new(3, 1))),
            ProjectionItem::new(
                2,
                "c2",
                Expr::Call(FunctionExpr::immutable(
                    "abs",
                    vec![Expr::Variable(VariableRef::new(3, 2))],
                )),
            ),
        ];
        query.predicate.push(Expr::equals(
            Expr::Variable(VariableRef::new(3, 1)),
            Expr::Literal(Literal::Integer(1)),
        ));

        let expected = query.clone();
        renumber_relations(&mut query, 1);

        assert_eq!(query.relations[0].slot, 1);
        assert_eq!(query.from, vec![FromItem::Relation(1)]);
        assert_eq!(
            query.projection[0].expr,
            Expr::Variable(VariableRef::new(1, 1))
        );
        assert_eq!(
            query.predicate.iter().next().unwrap(),
            &Expr::equals(
                Expr::Variable(VariableRef::new(1, 1)),
                Expr::Literal(Literal::Integer(1)),
            )
        );

        // Renumbering back restores the original model exactly: nothing but
        // slots is touched.
        renumber_relations(&mut query, 3);
        assert_eq!(query, expected);
    }

    #[test]
    fn column_positions_are_untouched() {
        let mut query = QueryModel::select_from(RelationBinding::base_table(2, "t1"));
        query.projection = vec![ProjectionItem::new(
            1,
            "c5",
            Expr::Variable(VariableRef::new(2, 5)),
        )];
        renumber_relations(&mut query, 1);
        assert_eq!(
            query.projection[0].expr,
            Expr::Variable(VariableRef::new(1, 5))
        );
    }
}
