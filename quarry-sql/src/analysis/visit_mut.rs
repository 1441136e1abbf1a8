//! AST walker over mutable references.
//!
//! For the equivalent walker over **shared references**, see
//! [`crate::analysis::visit`].

// NOTE: this file is effectively duplicated to `visit.rs` - any changes made
// here should be mirrored there.

use crate::ast::{
    AggregateExpr, Expr, FromItem, FunctionExpr, Literal, Predicate, ProjectionItem, QueryModel,
    RelationBinding, VariableRef,
};

/// Mutable-reference twin of [`crate::analysis::visit::Visitor`]: every hook
/// receives `&mut` and may edit the node in place before (or instead of)
/// walking its substructure.
pub trait VisitorMut<'ast>: Sized {
    /// Errors that can be thrown during execution of this visitor.
    type Error;

    fn visit_literal(&mut self, _literal: &'ast mut Literal) -> Result<(), Self::Error> {
        Ok(())
    }

    fn visit_variable_ref(&mut self, _var: &'ast mut VariableRef) -> Result<(), Self::Error> {
        Ok(())
    }

    fn visit_resolved_ref(&mut self, _var: &'ast mut VariableRef) -> Result<(), Self::Error> {
        Ok(())
    }

    fn visit_function_expr(&mut self, call: &'ast mut FunctionExpr) -> Result<(), Self::Error> {
        walk_function_expr(self, call)
    }

    fn visit_aggregate_expr(&mut self, agg: &'ast mut AggregateExpr) -> Result<(), Self::Error> {
        walk_aggregate_expr(self, agg)
    }

    fn visit_expr(&mut self, expr: &'ast mut Expr) -> Result<(), Self::Error> {
        walk_expr(self, expr)
    }

    fn visit_projection_item(
        &mut self,
        item: &'ast mut ProjectionItem,
    ) -> Result<(), Self::Error> {
        walk_projection_item(self, item)
    }

    fn visit_predicate(&mut self, predicate: &'ast mut Predicate) -> Result<(), Self::Error> {
        walk_predicate(self, predicate)
    }

    fn visit_relation_binding(
        &mut self,
        _rel: &'ast mut RelationBinding,
    ) -> Result<(), Self::Error> {
        Ok(())
    }

    fn visit_from_item(&mut self, item: &'ast mut FromItem) -> Result<(), Self::Error> {
        walk_from_item(self, item)
    }

    fn visit_query_model(&mut self, query: &'ast mut QueryModel) -> Result<(), Self::Error> {
        walk_query_model(self, query)
    }
}

pub fn walk_expr<'ast, V: VisitorMut<'ast>>(
    visitor: &mut V,
    expr: &'ast mut Expr,
) -> Result<(), V::Error> {
    match expr {
        Expr::Literal(lit) => visitor.visit_literal(lit),
        Expr::Variable(var) => visitor.visit_variable_ref(var),
        Expr::Resolved(var) => visitor.visit_resolved_ref(var),
        Expr::BinaryOp { lhs, rhs, .. } => {
            visitor.visit_expr(lhs.as_mut())?;
            visitor.visit_expr(rhs.as_mut())
        }
        Expr::UnaryOp { rhs, .. } => visitor.visit_expr(rhs.as_mut()),
        Expr::Cast { expr, .. } => visitor.visit_expr(expr.as_mut()),
        Expr::Call(call) | Expr::WindowCall(call) => visitor.visit_function_expr(call),
        Expr::Aggregate(agg) => visitor.visit_aggregate_expr(agg),
    }
}

pub fn walk_function_expr<'ast, V: VisitorMut<'ast>>(
    visitor: &mut V,
    call: &'ast mut FunctionExpr,
) -> Result<(), V::Error> {
    for arg in &mut call.args {
        visitor.visit_expr(arg)?;
    }
    Ok(())
}

pub fn walk_aggregate_expr<'ast, V: VisitorMut<'ast>>(
    visitor: &mut V,
    agg: &'ast mut AggregateExpr,
) -> Result<(), V::Error> {
    for arg in &mut agg.args {
        visitor.visit_expr(arg)?;
    }
    Ok(())
}

pub fn walk_projection_item<'ast, V: VisitorMut<'ast>>(
    visitor: &mut V,
    item: &'ast mut ProjectionItem,
) -> Result<(), V::Error> {
    visitor.visit_expr(&mut item.expr)
}

pub fn walk_predicate<'ast, V: VisitorMut<'ast>>(
    visitor: &mut V,
    predicate: &'ast mut Predicate,
) -> Result<(), V::Error> {
    for conjunct in predicate.iter_mut() {
        visitor.visit_expr(conjunct)?;
    }
    Ok(())
}

pub fn walk_from_item<'ast, V: VisitorMut<'ast>>(
    visitor: &mut V,
    item: &'ast mut FromItem,
) -> Result<(), V::Error> {
    match item {
        FromItem::Relation(_) => Ok(()),
        FromItem::Join(items) => {
            for item in items {
                visitor.visit_from_item(item)?;
            }
            Ok(())
        }
        FromItem::Subquery(query) => visitor.visit_query_model(query.as_mut()),
    }
}

pub fn walk_query_model<'ast, V: VisitorMut<'ast>>(
    visitor: &mut V,
    query: &'ast mut QueryModel,
) -> Result<(), V::Error> {
    for rel in &mut query.relations {
        visitor.visit_relation_binding(rel)?;
    }
    for item in &mut query.from {
        visitor.visit_from_item(item)?;
    }
    for item in &mut query.projection {
        visitor.visit_projection_item(item)?;
    }
    visitor.visit_predicate(&mut query.predicate)?;
    if let Some(having) = &mut query.having {
        visitor.visit_expr(having)?;
    }
    Ok(())
}
