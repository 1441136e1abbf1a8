//! AST walker over shared references, inspired by [rustc's AST
//! visitor][rustc-ast-visit].
//!
//! [rustc-ast-visit]: https://doc.rust-lang.org/stable/nightly-rustc/rustc_ast/visit/index.html
//!
//! For the equivalent walker over **mutable references**, see
//! [`crate::analysis::visit_mut`].

// NOTE: this file is effectively duplicated to `visit_mut.rs` - any changes
// made here should be mirrored there.

use crate::ast::{
    AggregateExpr, Expr, FromItem, FunctionExpr, Literal, Predicate, ProjectionItem, QueryModel,
    RelationBinding, VariableRef,
};

/// Each method of the `Visitor` trait is a hook to be potentially overridden
/// when recursively traversing a query model. The default implementation of
/// each method recursively visits the substructure of the input via the
/// corresponding `walk` method, eg `visit_expr` by default calls
/// `visit::walk_expr`.
///
/// Scans that want to stop early can return `Err` from a hook; the walk
/// short-circuits out.
pub trait Visitor<'ast>: Sized {
    /// Errors that can be thrown during execution of this visitor.
    type Error;

    fn visit_literal(&mut self, _literal: &'ast Literal) -> Result<(), Self::Error> {
        Ok(())
    }

    fn visit_variable_ref(&mut self, _var: &'ast VariableRef) -> Result<(), Self::Error> {
        Ok(())
    }

    fn visit_resolved_ref(&mut self, _var: &'ast VariableRef) -> Result<(), Self::Error> {
        Ok(())
    }

    fn visit_function_expr(&mut self, call: &'ast FunctionExpr) -> Result<(), Self::Error> {
        walk_function_expr(self, call)
    }

    fn visit_aggregate_expr(&mut self, agg: &'ast AggregateExpr) -> Result<(), Self::Error> {
        walk_aggregate_expr(self, agg)
    }

    fn visit_expr(&mut self, expr: &'ast Expr) -> Result<(), Self::Error> {
        walk_expr(self, expr)
    }

    fn visit_projection_item(&mut self, item: &'ast ProjectionItem) -> Result<(), Self::Error> {
        walk_projection_item(self, item)
    }

    fn visit_predicate(&mut self, predicate: &'ast Predicate) -> Result<(), Self::Error> {
        walk_predicate(self, predicate)
    }

    fn visit_relation_binding(&mut self, _rel: &'ast RelationBinding) -> Result<(), Self::Error> {
        Ok(())
    }

    fn visit_from_item(&mut self, item: &'ast FromItem) -> Result<(), Self::Error> {
        walk_from_item(self, item)
    }

    fn visit_query_model(&mut self, query: &'ast QueryModel) -> Result<(), Self::Error> {
        walk_query_model(self, query)
    }
}

pub fn walk_expr<'ast, V: Visitor<'ast>>(
    visitor: &mut V,
    expr: &'ast Expr,
) -> Result<(), V::Error> {
    match expr {
        Expr::Literal(lit) => visitor.visit_literal(lit),
        Expr::Variable(var) => visitor.visit_variable_ref(var),
        Expr::Resolved(var) => visitor.visit_resolved_ref(var),
        Expr::BinaryOp { lhs, rhs, .. } => {
            visitor.visit_expr(lhs.as_ref())?;
            visitor.visit_expr(rhs.as_ref())
        }
        Expr::UnaryOp { rhs, .. } => visitor.visit_expr(rhs.as_ref()),
        Expr::Cast { expr, .. } => visitor.visit_expr(expr.as_ref()),
        Expr::Call(call) | Expr::WindowCall(call) => visitor.visit_function_expr(call),
        Expr::Aggregate(agg) => visitor.visit_aggregate_expr(agg),
    }
}

pub fn walk_function_expr<'ast, V: Visitor<'ast>>(
    visitor: &mut V,
    call: &'ast FunctionExpr,
) -> Result<(), V::Error> {
    for arg in &call.args {
        visitor.visit_expr(arg)?;
    }
    Ok(())
}

pub fn walk_aggregate_expr<'ast, V: Visitor<'ast>>(
    visitor: &mut V,
    agg: &'ast AggregateExpr,
) -> Result<(), V::Error> {
    for arg in &agg.args {
        visitor.visit_expr(arg)?;
    }
    Ok(())
}

pub fn walk_projection_item<'ast, V: Visitor<'ast>>(
    visitor: &mut V,
    item: &'ast ProjectionItem,
) -> Result<(), V::Error> {
    visitor.visit_expr(&item.expr)
}

pub fn walk_predicate<'ast, V: Visitor<'ast>>(
    visitor: &mut V,
    predicate: &'ast Predicate,
) -> Result<(), V::Error> {
    for conjunct in predicate.iter() {
        visitor.visit_expr(conjunct)?;
    }
    Ok(())
}

pub fn walk_from_item<'ast, V: Visitor<'ast>>(
    visitor: &mut V,
    item: &'ast FromItem,
) -> Result<(), V::Error> {
    match item {
        FromItem::Relation(_) => Ok(()),
        FromItem::Join(items) => {
            for item in items {
                visitor.visit_from_item(item)?;
            }
            Ok(())
        }
        FromItem::Subquery(query) => visitor.visit_query_model(query.as_ref()),
    }
}

pub fn walk_query_model<'ast, V: Visitor<'ast>>(
    visitor: &mut V,
    query: &'ast QueryModel,
) -> Result<(), V::Error> {
    for rel in &query.relations {
        visitor.visit_relation_binding(rel)?;
    }
    for item in &query.from {
        visitor.visit_from_item(item)?;
    }
    for item in &query.projection {
        visitor.visit_projection_item(item)?;
    }
    visitor.visit_predicate(&query.predicate)?;
    if let Some(having) = &query.having {
        visitor.visit_expr(having)?;
    }
    Ok(())
}
