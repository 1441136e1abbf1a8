use std::fmt;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::ast::{BinaryOperator, Expr};

/// A predicate: the conjunction of a collection of boolean-valued
/// expressions.
///
/// The conjuncts are logically unordered (all set-style operations here
/// compare members by structural equality), but the stored order is
/// preserved so results stay deterministic. An empty predicate means "no
/// filter" (semantically TRUE) and is distinct from a predicate holding a
/// single always-true conjunct.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Predicate {
    conjuncts: Vec<Expr>,
}

impl Predicate {
    pub fn none() -> Self {
        Predicate::default()
    }

    /// Build a predicate from a boolean expression, splitting top-level ANDs
    /// into individual conjuncts.
    pub fn from_expr(expr: Expr) -> Self {
        let mut conjuncts = Vec::new();
        flatten_and(&expr, &mut conjuncts);
        Predicate { conjuncts }
    }

    pub fn is_empty(&self) -> bool {
        self.conjuncts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.conjuncts.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Expr> {
        self.conjuncts.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Expr> {
        self.conjuncts.iter_mut()
    }

    pub fn push(&mut self, conjunct: Expr) {
        self.conjuncts.push(conjunct);
    }

    /// Re-split every conjunct so that no stored conjunct is itself a
    /// top-level AND. Conjunct order is preserved left to right.
    pub fn normalized(&self) -> Predicate {
        let mut conjuncts = Vec::with_capacity(self.conjuncts.len());
        for conjunct in &self.conjuncts {
            flatten_and(conjunct, &mut conjuncts);
        }
        Predicate { conjuncts }
    }

    pub fn contains(&self, conjunct: &Expr) -> bool {
        self.conjuncts.contains(conjunct)
    }

    /// True if every conjunct of `self` appears (structurally) in `other`.
    pub fn is_subset_of(&self, other: &Predicate) -> bool {
        self.conjuncts.iter().all(|c| other.contains(c))
    }

    /// The conjuncts of `self` that do not appear (structurally) in `other`.
    pub fn difference(&self, other: &Predicate) -> Predicate {
        Predicate {
            conjuncts: self
                .conjuncts
                .iter()
                .filter(|c| !other.contains(c))
                .cloned()
                .collect(),
        }
    }
}

fn flatten_and(expr: &Expr, out: &mut Vec<Expr>) {
    match expr {
        Expr::BinaryOp {
            op: BinaryOperator::And,
            lhs,
            rhs,
        } => {
            flatten_and(lhs, out);
            flatten_and(rhs, out);
        }
        _ => out.push(expr.clone()),
    }
}

impl FromIterator<Expr> for Predicate {
    fn from_iter<I: IntoIterator<Item = Expr>>(iter: I) -> Self {
        Predicate {
            conjuncts: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Predicate {
    type Item = Expr;
    type IntoIter = std::vec::IntoIter<Expr>;

    fn into_iter(self) -> Self::IntoIter {
        self.conjuncts.into_iter()
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.conjuncts.is_empty() {
            return write!(f, "TRUE");
        }
        write!(
            f,
            "{}",
            self.conjuncts.iter().map(|c| c.to_string()).join(" AND ")
        )
    }
}
