use quarry_sql::ast::Predicate;

/// Check that a view's predicate is contained in the query's, and compute
/// the residual ("post") predicate the rewritten query must still apply.
///
/// Both predicates are treated as unordered conjunct sets and membership is
/// *structural* equality only, with no operand-order canonicalization and
/// no algebraic subsumption, so `c1 = 1` and `1 = c1` are different conjuncts
/// unless an upstream normalizer already canonicalized them. The rules:
///
/// * view predicate empty → accept; the view stores every row, and the post
///   predicate is the entire query predicate (possibly empty too);
/// * view predicate non-empty, query predicate empty → reject; the view is
///   more restrictive than the query and rows would silently go missing;
/// * otherwise accept iff every view conjunct appears among the query's
///   conjuncts, with post predicate = query conjuncts minus view conjuncts.
///
/// The returned post predicate still references base-table columns and must
/// be rewritten over the view's output before use. `None` means the
/// candidate is rejected.
pub fn check_containment(outer: &Predicate, view: &Predicate) -> Option<Predicate> {
    if view.is_empty() {
        return Some(outer.clone());
    }
    if outer.is_empty() {
        return None;
    }
    if !view.is_subset_of(outer) {
        return None;
    }
    Some(outer.difference(view))
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use quarry_sql::ast::{Expr, Literal, VariableRef};

    use super::*;

    fn var_eq(column: usize, value: i64) -> Expr {
        Expr::equals(
            Expr::Variable(VariableRef::new(1, column)),
            Expr::Literal(Literal::Integer(value)),
        )
    }

    fn pred(conjuncts: Vec<Expr>) -> Predicate {
        conjuncts.into_iter().collect()
    }

    #[test]
    fn both_empty_accepts_with_empty_post() {
        let post = check_containment(&Predicate::none(), &Predicate::none()).unwrap();
        assert!(post.is_empty());
    }

    #[test]
    fn empty_view_accepts_whole_outer_as_post() {
        let outer = pred(vec![var_eq(1, 1), var_eq(2, 2)]);
        let post = check_containment(&outer, &Predicate::none()).unwrap();
        assert_eq!(post, outer);
    }

    #[test]
    fn restrictive_view_against_unfiltered_query_rejects() {
        let view = pred(vec![var_eq(1, 1)]);
        assert_eq!(check_containment(&Predicate::none(), &view), None);
    }

    #[test]
    fn subset_accepts_with_difference_as_post() {
        let outer = pred(vec![var_eq(1, 1), var_eq(2, 2)]);
        let view = pred(vec![var_eq(1, 1)]);
        let post = check_containment(&outer, &view).unwrap();
        assert_eq!(post, pred(vec![var_eq(2, 2)]));
    }

    #[test]
    fn non_subset_rejects() {
        let outer = pred(vec![var_eq(1, 1)]);
        let view = pred(vec![var_eq(1, 1), var_eq(3, 5)]);
        assert_eq!(check_containment(&outer, &view), None);
    }

    #[test]
    fn containment_is_syntactic_not_semantic() {
        // c1 = 1 vs 1 = c1: logically equivalent, structurally different.
        let outer = pred(vec![Expr::equals(
            Expr::Literal(Literal::Integer(1)),
            Expr::Variable(VariableRef::new(1, 1)),
        )]);
        let view = pred(vec![var_eq(1, 1)]);
        assert_eq!(check_containment(&outer, &view), None);
    }

    #[test]
    fn conjunct_order_does_not_matter() {
        let outer = pred(vec![var_eq(2, 2), var_eq(1, 1)]);
        let view = pred(vec![var_eq(1, 1), var_eq(2, 2)]);
        let post = check_containment(&outer, &view).unwrap();
        assert!(post.is_empty());
    }

    proptest! {
        /// If containment accepts, view ∪ post is set-equal to outer ∪ view:
        /// no conjunct is lost and none is invented.
        #[test]
        fn accepted_containment_is_sound(
            outer in proptest::collection::vec(any::<Expr>(), 0..5),
            view in proptest::collection::vec(any::<Expr>(), 0..5),
        ) {
            let outer = pred(outer);
            let view = pred(view);
            if let Some(post) = check_containment(&outer, &view) {
                for conjunct in outer.iter() {
                    prop_assert!(view.contains(conjunct) || post.contains(conjunct));
                }
                for conjunct in post.iter() {
                    prop_assert!(outer.contains(conjunct));
                    prop_assert!(!view.contains(conjunct));
                }
                for conjunct in view.iter() {
                    prop_assert!(outer.is_empty() || outer.contains(conjunct));
                }
            }
        }
    }
}
