use quarry_sql::analysis::contains_mutable_functions;
use quarry_sql::ast::{FromItem, QueryKind, QueryModel, QueryOrigin, RelationBinding, RelationKind};

/// Returns the relation a query reads from, if and only if its top-level
/// join tree is exactly one unadorned base-table reference (no joins, no
/// subquery sources).
pub fn single_plain_relation(query: &QueryModel) -> Option<&RelationBinding> {
    match query.from.as_slice() {
        [FromItem::Relation(slot)] => query
            .binding(*slot)
            .filter(|rel| rel.kind == RelationKind::BaseTable),
        _ => None,
    }
}

/// Fast structural go/no-go for the incoming query, before any candidate
/// view is even looked at.
///
/// Group By without aggregates is allowed; everything else that would make
/// the substitution observable (ordering, locking, windows, DISTINCT ON,
/// HAVING, nested subqueries, non-SELECT contexts) bails out.
pub fn is_eligible_outer_query(query: &QueryModel) -> bool {
    let shape_blocks_rewrite = query.kind != QueryKind::Select
        || query.origin != QueryOrigin::Direct
        || query.has_row_locks
        || query.has_window_calls
        || query.has_distinct_on
        || query.having.is_some()
        || query.has_modifying_ctes
        || query.has_ordering
        || query.has_sublinks;
    if shape_blocks_rewrite {
        return false;
    }

    let Some(rel) = single_plain_relation(query) else {
        return false;
    };
    // Catalog relations and inheritance/partition parents or children are
    // out: matching would have to be partition-aware.
    !(rel.is_system || rel.has_ancestors || rel.has_descendants)
}

/// Structural go/no-go for a view's defining query, which must read the same
/// single relation as the outer query.
///
/// A view may carry an ORDER BY; its declared order is not a semantic
/// guarantee of the stored data, so it neither helps nor blocks matching.
/// Any non-immutable function call anywhere in the definition blocks the
/// candidate: rewriting changes when the function would run relative to the
/// original plan.
pub fn is_eligible_view_query(view: &QueryModel, outer_relation: &RelationBinding) -> bool {
    let shape_blocks_rewrite = view.has_aggregates
        || view.has_window_calls
        || view.has_distinct_on
        || view.has_modifying_ctes
        || view.has_sublinks;
    if shape_blocks_rewrite {
        return false;
    }

    let Some(rel) = single_plain_relation(view) else {
        return false;
    };
    if rel.table != outer_relation.table {
        return false;
    }
    !contains_mutable_functions(view)
}

#[cfg(test)]
mod tests {
    use quarry_sql::ast::{
        Expr, FunctionExpr, Literal, ProjectionItem, Relation, VariableRef, Volatility,
    };

    use super::*;

    fn plain_select(table: &str) -> QueryModel {
        let mut query = QueryModel::select_from(RelationBinding::base_table(1, table));
        query.projection = vec![ProjectionItem::new(
            1,
            "c1",
            Expr::Variable(VariableRef::new(1, 1)),
        )];
        query
    }

    #[test]
    fn plain_single_table_select_is_eligible() {
        assert!(is_eligible_outer_query(&plain_select("t1")));
    }

    #[test]
    fn each_blocking_flag_rejects() {
        let checks: Vec<(&str, Box<dyn Fn(&mut QueryModel)>)> = vec![
            ("update", Box::new(|q| q.kind = QueryKind::Update)),
            ("refresh", Box::new(|q| q.origin = QueryOrigin::RefreshView)),
            ("ctas", Box::new(|q| q.origin = QueryOrigin::CreateTableAs)),
            ("locks", Box::new(|q| q.has_row_locks = true)),
            ("window", Box::new(|q| q.has_window_calls = true)),
            ("distinct on", Box::new(|q| q.has_distinct_on = true)),
            (
                "having",
                Box::new(|q| q.having = Some(Expr::Literal(Literal::Boolean(true)))),
            ),
            ("modifying cte", Box::new(|q| q.has_modifying_ctes = true)),
            ("order by", Box::new(|q| q.has_ordering = true)),
            ("sublink", Box::new(|q| q.has_sublinks = true)),
        ];
        for (reason, poison) in checks {
            let mut query = plain_select("t1");
            poison(&mut query);
            assert!(!is_eligible_outer_query(&query), "{reason} should reject");
        }
    }

    #[test]
    fn group_by_without_aggregates_is_allowed() {
        let mut query = plain_select("t1");
        query.group_by = vec![1];
        assert!(is_eligible_outer_query(&query));
    }

    #[test]
    fn multiple_relations_reject() {
        let mut query = plain_select("t1");
        query.relations.push(RelationBinding::base_table(2, "t2"));
        query.from.push(FromItem::Relation(2));
        assert!(!is_eligible_outer_query(&query));
    }

    #[test]
    fn join_tree_rejects() {
        let mut query = plain_select("t1");
        query.relations.push(RelationBinding::base_table(2, "t2"));
        query.from = vec![FromItem::Join(vec![
            FromItem::Relation(1),
            FromItem::Relation(2),
        ])];
        assert!(!is_eligible_outer_query(&query));
    }

    #[test]
    fn catalog_and_inheritance_reject() {
        for poison in [
            |rel: &mut RelationBinding| rel.is_system = true,
            |rel: &mut RelationBinding| rel.has_ancestors = true,
            |rel: &mut RelationBinding| rel.has_descendants = true,
        ] {
            let mut query = plain_select("t1");
            poison(&mut query.relations[0]);
            assert!(!is_eligible_outer_query(&query));
        }
    }

    #[test]
    fn view_must_read_same_relation() {
        let outer = plain_select("t1");
        let outer_rel = single_plain_relation(&outer).unwrap();
        assert!(is_eligible_view_query(&plain_select("t1"), outer_rel));
        assert!(!is_eligible_view_query(&plain_select("t2"), outer_rel));
    }

    #[test]
    fn view_with_aggregates_rejects() {
        let outer = plain_select("t1");
        let mut view = plain_select("t1");
        view.has_aggregates = true;
        assert!(!is_eligible_view_query(
            &view,
            single_plain_relation(&outer).unwrap()
        ));
    }

    #[test]
    fn view_with_order_by_is_still_eligible() {
        let outer = plain_select("t1");
        let mut view = plain_select("t1");
        view.has_ordering = true;
        assert!(is_eligible_view_query(
            &view,
            single_plain_relation(&outer).unwrap()
        ));
    }

    #[test]
    fn view_with_volatile_function_rejects() {
        let outer = plain_select("t1");
        let mut view = plain_select("t1");
        view.predicate.push(Expr::binary(
            quarry_sql::ast::BinaryOperator::Greater,
            Expr::Variable(VariableRef::new(1, 1)),
            Expr::Call(FunctionExpr::new("random", vec![], Volatility::Volatile)),
        ));
        assert!(!is_eligible_view_query(
            &view,
            single_plain_relation(&outer).unwrap()
        ));
    }

    #[test]
    fn schema_qualification_distinguishes_relations() {
        let outer = plain_select("t1");
        let mut view = plain_select("t1");
        view.relations[0].table = Relation {
            schema: Some("other".into()),
            name: "t1".into(),
        };
        assert!(!is_eligible_view_query(
            &view,
            single_plain_relation(&outer).unwrap()
        ));
    }
}
