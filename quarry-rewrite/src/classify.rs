use std::cmp::Reverse;

use quarry_errors::{internal, invariant, QuarryResult};
use quarry_sql::analysis::subtree_size;
use quarry_sql::ast::{Expr, ProjectionItem, VariableRef};

/// Matching state for one (outer query, candidate view) pairing.
///
/// Built fresh per candidate and discarded once the candidate is accepted or
/// rejected. The view's defining projection is partitioned into *pure*
/// entries (bare column references) and *nonpure* entries (anything
/// computed), each addressed by its 1-based position, which doubles as the
/// column position in the view's own output.
pub struct MatchContext<'a> {
    /// Bare column references in the defining projection, in order.
    pub(crate) pure_vars: Vec<VariableRef>,
    /// Position of each `pure_vars` entry; parallel to it.
    pub(crate) pure_positions: Vec<usize>,
    /// Positions of computed entries, ranked by
    /// [`rank_nonpure_by_complexity`](Self::rank_nonpure_by_complexity).
    pub(crate) nonpure_positions: Vec<usize>,
    pub(crate) view_defining_projection: &'a [ProjectionItem],
    /// The view's own result columns ("select every column of the view").
    pub(crate) view_output: &'a [ProjectionItem],
    /// Sticky: once a rewrite fails to match, every later call is a no-op.
    pub(crate) unmatched: bool,
}

impl<'a> MatchContext<'a> {
    pub fn new(
        view_output: &'a [ProjectionItem],
        view_defining_projection: &'a [ProjectionItem],
    ) -> Self {
        let mut pure_vars = Vec::new();
        let mut pure_positions = Vec::new();
        let mut nonpure_positions = Vec::new();

        for (idx, item) in view_defining_projection.iter().enumerate() {
            let position = idx + 1;
            if item.internal {
                continue;
            }
            match &item.expr {
                Expr::Variable(var) => {
                    pure_vars.push(*var);
                    pure_positions.push(position);
                }
                _ => nonpure_positions.push(position),
            }
        }

        MatchContext {
            pure_vars,
            pure_positions,
            nonpure_positions,
            view_defining_projection,
            view_output,
            unmatched: false,
        }
    }

    /// Order the nonpure positions so the largest expressions are tried
    /// first. A smaller expression matching first would consume part of a
    /// larger one that should have matched whole (`c2` inside `abs(c2)`).
    /// The sort is stable, so equal-complexity entries keep their original
    /// relative order and matching stays deterministic.
    pub fn rank_nonpure_by_complexity(&mut self) {
        let projection = self.view_defining_projection;
        self.nonpure_positions
            .sort_by_key(|&position| Reverse(subtree_size(&projection[position - 1].expr)));
    }

    /// True once any expression has failed to match; the candidate view must
    /// be discarded and no partial rewrite used.
    pub fn unmatched(&self) -> bool {
        self.unmatched
    }

    pub(crate) fn defining_expr(&self, position: usize) -> QuarryResult<&Expr> {
        invariant!(
            position >= 1 && position <= self.view_defining_projection.len(),
            "defining projection position {position} out of range 1..={}",
            self.view_defining_projection.len()
        );
        Ok(&self.view_defining_projection[position - 1].expr)
    }

    /// The view output column at `position`, as a variable reference. The
    /// output projection of a view is bare columns by construction; anything
    /// else there is a broken contract, not a failed match.
    pub(crate) fn output_var(&self, position: usize) -> QuarryResult<VariableRef> {
        invariant!(
            position >= 1 && position <= self.view_output.len(),
            "view output position {position} out of range 1..={}",
            self.view_output.len()
        );
        match &self.view_output[position - 1].expr {
            Expr::Variable(var) => Ok(*var),
            other => internal!("view output column {position} is not a bare column: {other}"),
        }
    }
}
