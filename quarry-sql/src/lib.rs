//! Query model and expression AST for quarry.
//!
//! Both the incoming query and every materialized view's defining query are
//! represented with the same [`ast::QueryModel`] / [`ast::Expr`] types, so
//! the rewrite engine can compare and splice them structurally. The
//! [`analysis`] module provides the visitor infrastructure and the handful
//! of whole-tree scans the engine needs (referred variables, subtree size,
//! volatile-function detection).

pub mod analysis;
pub mod ast;
