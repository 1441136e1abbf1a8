//! Rewrites expressions from the outer query into equivalent expressions
//! over a view's output columns.
//!
//! Rewriting never mutates its input: every step returns freshly built
//! nodes, and the identical input is only handed back when no change is
//! needed. Match failure is not an error: it sets the sticky `unmatched`
//! flag on the [`MatchContext`] and the caller discards the whole attempt.

use itertools::Itertools;
use quarry_errors::QuarryResult;
use quarry_sql::analysis::referred_variables;
use quarry_sql::ast::{AggregateExpr, Expr, FunctionExpr, Predicate, ProjectionItem};

use crate::classify::MatchContext;

impl MatchContext<'_> {
    /// Rewrite one expression over the view's output columns.
    ///
    /// Callers must check [`unmatched`](MatchContext::unmatched) afterwards:
    /// when it is set the returned expression is meaningless and the whole
    /// candidate must be abandoned. `Err` is reserved for broken internal
    /// contracts (out-of-range view positions), never for a failed match.
    pub fn rewrite_expr(&mut self, expr: &Expr) -> QuarryResult<Expr> {
        if self.unmatched {
            return Ok(expr.clone());
        }

        // Constants are valid standalone results no matter which relation
        // they are evaluated against; references the engine itself produced
        // already point at the view.
        if matches!(expr, Expr::Literal(_) | Expr::Resolved(_)) {
            return Ok(expr.clone());
        }

        // Whole-expression match against the view's computed columns,
        // largest first, so e.g. abs(c2) is consumed as a unit before its
        // operand c2 could match alone.
        for idx in 0..self.nonpure_positions.len() {
            let position = self.nonpure_positions[idx];
            if expr == self.defining_expr(position)? {
                return Ok(Expr::Resolved(self.output_var(position)?));
            }
        }

        let variables = referred_variables(expr);
        if variables.is_empty() && !matches!(expr, Expr::Variable(_)) {
            // Self-contained computation (count(*), 1 + 1): evaluable on
            // either side, leave it alone.
            return Ok(expr.clone());
        }

        if let Expr::Variable(var) = expr {
            if let Some(idx) = self.pure_vars.iter().position(|pure| pure == var) {
                let position = self.pure_positions[idx];
                return Ok(Expr::Variable(self.output_var(position)?));
            }
            // A column the view does not expose: the candidate is dead.
            self.unmatched = true;
            return Ok(expr.clone());
        }

        self.rewrite_children(expr)
    }

    /// Rebuild a computed node with each child rewritten.
    fn rewrite_children(&mut self, expr: &Expr) -> QuarryResult<Expr> {
        Ok(match expr {
            Expr::BinaryOp { op, lhs, rhs } => Expr::BinaryOp {
                op: *op,
                lhs: Box::new(self.rewrite_expr(lhs)?),
                rhs: Box::new(self.rewrite_expr(rhs)?),
            },
            Expr::UnaryOp { op, rhs } => Expr::UnaryOp {
                op: *op,
                rhs: Box::new(self.rewrite_expr(rhs)?),
            },
            Expr::Cast { expr: inner, ty } => Expr::Cast {
                expr: Box::new(self.rewrite_expr(inner)?),
                ty: *ty,
            },
            Expr::Call(call) => Expr::Call(FunctionExpr {
                name: call.name.clone(),
                args: call
                    .args
                    .iter()
                    .map(|arg| self.rewrite_expr(arg))
                    .try_collect()?,
                volatility: call.volatility,
            }),
            Expr::Aggregate(agg) => Expr::Aggregate(AggregateExpr {
                func: agg.func,
                args: agg
                    .args
                    .iter()
                    .map(|arg| self.rewrite_expr(arg))
                    .try_collect()?,
                distinct: agg.distinct,
            }),
            Expr::WindowCall(call) => Expr::WindowCall(FunctionExpr {
                name: call.name.clone(),
                args: call
                    .args
                    .iter()
                    .map(|arg| self.rewrite_expr(arg))
                    .try_collect()?,
                volatility: call.volatility,
            }),
            Expr::Literal(_) | Expr::Variable(_) | Expr::Resolved(_) => expr.clone(),
        })
    }

    /// Rewrite one projection entry, preserving its output position, name
    /// and internal flag.
    pub fn rewrite_projection_item(
        &mut self,
        item: &ProjectionItem,
    ) -> QuarryResult<ProjectionItem> {
        Ok(ProjectionItem {
            expr: self.rewrite_expr(&item.expr)?,
            position: item.position,
            name: item.name.clone(),
            internal: item.internal,
        })
    }

    /// Rewrite a whole projection list. Returns `None` if any entry fails
    /// to match, in which case the caller must discard the candidate.
    pub fn rewrite_projection(
        &mut self,
        projection: &[ProjectionItem],
    ) -> QuarryResult<Option<Vec<ProjectionItem>>> {
        let mut rewritten = Vec::with_capacity(projection.len());
        for item in projection {
            rewritten.push(self.rewrite_projection_item(item)?);
        }
        Ok((!self.unmatched).then_some(rewritten))
    }

    /// Rewrite every conjunct of a predicate. Returns `None` if any conjunct
    /// fails to match.
    pub fn rewrite_predicate(&mut self, predicate: &Predicate) -> QuarryResult<Option<Predicate>> {
        let mut rewritten = Predicate::none();
        for conjunct in predicate.iter() {
            rewritten.push(self.rewrite_expr(conjunct)?);
        }
        Ok((!self.unmatched).then_some(rewritten))
    }
}
