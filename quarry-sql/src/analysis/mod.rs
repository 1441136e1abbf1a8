//! Whole-tree analysis over the query model: visitor infrastructure plus
//! the scans the rewrite engine needs.

pub mod visit;
pub mod visit_mut;

use crate::analysis::visit::{walk_expr, walk_function_expr, Visitor};
use crate::ast::{Expr, FunctionExpr, QueryModel, VariableRef, Volatility};

/// Collect every not-yet-resolved variable reference inside an expression,
/// in traversal order. References already repointed at a view's output
/// ([`Expr::Resolved`]) are not included.
pub fn referred_variables(expr: &Expr) -> Vec<VariableRef> {
    struct CollectVariables(Vec<VariableRef>);

    impl<'ast> Visitor<'ast> for CollectVariables {
        type Error = ();

        fn visit_variable_ref(&mut self, var: &'ast VariableRef) -> Result<(), ()> {
            self.0.push(*var);
            Ok(())
        }
    }

    let mut collector = CollectVariables(Vec::new());
    let _ = collector.visit_expr(expr);
    collector.0
}

/// Structural complexity of an expression: the total number of nodes in its
/// subtree. Used only to order greedy matching attempts, so the absolute
/// scale does not matter as long as a strict subexpression always counts
/// strictly less than its parent.
pub fn subtree_size(expr: &Expr) -> usize {
    struct CountNodes(usize);

    impl<'ast> Visitor<'ast> for CountNodes {
        type Error = ();

        fn visit_expr(&mut self, expr: &'ast Expr) -> Result<(), ()> {
            self.0 += 1;
            walk_expr(self, expr)
        }
    }

    let mut counter = CountNodes(0);
    let _ = counter.visit_expr(expr);
    counter.0
}

/// True if any function call anywhere in the query model is not
/// [`Volatility::Immutable`]. Stable functions count as mutable here: the
/// rewrite turns the query into a different statement, which voids the
/// within-one-statement guarantee `Stable` gives.
pub fn contains_mutable_functions(query: &QueryModel) -> bool {
    struct FindMutable;

    impl<'ast> Visitor<'ast> for FindMutable {
        type Error = ();

        fn visit_function_expr(&mut self, call: &'ast FunctionExpr) -> Result<(), ()> {
            if call.volatility != Volatility::Immutable {
                return Err(());
            }
            walk_function_expr(self, call)
        }
    }

    FindMutable.visit_query_model(query).is_err()
}
