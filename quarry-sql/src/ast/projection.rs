use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ast::{Expr, SqlIdentifier};

/// One entry of a query's projection list.
///
/// `internal` marks bookkeeping columns that are not part of the
/// user-visible result; they survive rewriting like any other entry but are
/// skipped when classifying a view's output columns.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProjectionItem {
    pub expr: Expr,
    /// 1-based output position.
    pub position: usize,
    pub name: Option<SqlIdentifier>,
    pub internal: bool,
}

impl ProjectionItem {
    pub fn new(position: usize, name: impl Into<SqlIdentifier>, expr: Expr) -> Self {
        ProjectionItem {
            expr,
            position,
            name: Some(name.into()),
            internal: false,
        }
    }

    /// An unnamed bookkeeping entry.
    pub fn internal(position: usize, expr: Expr) -> Self {
        ProjectionItem {
            expr,
            position,
            name: None,
            internal: true,
        }
    }
}

impl fmt::Display for ProjectionItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{} AS {}", self.expr, name),
            None => write!(f, "{}", self.expr),
        }
    }
}
