use std::fmt;

use itertools::Itertools;
use proptest::prelude::*;
use serde::{Deserialize, Serialize};
use test_strategy::Arbitrary;

use crate::ast::{Literal, SqlIdentifier};

/// A reference to one column of a relation binding: 1-based relation slot
/// and 1-based column position within that relation's output.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Arbitrary,
)]
pub struct VariableRef {
    #[strategy(1usize..=2)]
    pub slot: usize,
    #[strategy(1usize..=6)]
    pub column: usize,
}

impl VariableRef {
    pub fn new(slot: usize, column: usize) -> Self {
        VariableRef { slot, column }
    }
}

impl fmt::Display for VariableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}.{}", self.slot, self.column)
    }
}

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Arbitrary,
)]
pub enum BinaryOperator {
    And,
    Or,
    Equal,
    NotEqual,
    Greater,
    GreaterOrEqual,
    Less,
    LessOrEqual,
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match *self {
            Self::And => "AND",
            Self::Or => "OR",
            Self::Equal => "=",
            Self::NotEqual => "!=",
            Self::Greater => ">",
            Self::GreaterOrEqual => ">=",
            Self::Less => "<",
            Self::LessOrEqual => "<=",
            Self::Add => "+",
            Self::Subtract => "-",
            Self::Multiply => "*",
            Self::Divide => "/",
        };
        f.write_str(op)
    }
}

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Arbitrary,
)]
pub enum UnaryOperator {
    Neg,
    Not,
}

impl fmt::Display for UnaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnaryOperator::Neg => write!(f, "-"),
            UnaryOperator::Not => write!(f, "NOT"),
        }
    }
}

/// Volatility class of a function, as recorded by the upstream parser from
/// the catalog. Only `Immutable` functions may appear in a view definition
/// used to answer other queries: rewriting changes *when* the function runs
/// relative to the original plan, and for `Stable` that is already not
/// guaranteed equivalent.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Arbitrary,
)]
pub enum Volatility {
    Immutable,
    Stable,
    Volatile,
}

/// A scalar function call.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FunctionExpr {
    pub name: SqlIdentifier,
    pub args: Vec<Expr>,
    pub volatility: Volatility,
}

impl FunctionExpr {
    pub fn new(name: impl Into<SqlIdentifier>, args: Vec<Expr>, volatility: Volatility) -> Self {
        FunctionExpr {
            name: name.into(),
            args,
            volatility,
        }
    }

    pub fn immutable(name: impl Into<SqlIdentifier>, args: Vec<Expr>) -> Self {
        Self::new(name, args, Volatility::Immutable)
    }
}

impl fmt::Display for FunctionExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}({})",
            self.name,
            self.args.iter().map(|arg| arg.to_string()).join(", ")
        )
    }
}

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Arbitrary,
)]
pub enum AggregateFunc {
    Avg,
    Count,
    CountStar,
    Max,
    Min,
    Sum,
}

impl fmt::Display for AggregateFunc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AggregateFunc::Avg => "avg",
            AggregateFunc::Count | AggregateFunc::CountStar => "count",
            AggregateFunc::Max => "max",
            AggregateFunc::Min => "min",
            AggregateFunc::Sum => "sum",
        };
        f.write_str(name)
    }
}

/// An aggregate application. `CountStar` takes no arguments.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AggregateExpr {
    pub func: AggregateFunc,
    pub args: Vec<Expr>,
    pub distinct: bool,
}

impl AggregateExpr {
    pub fn new(func: AggregateFunc, args: Vec<Expr>) -> Self {
        AggregateExpr {
            func,
            args,
            distinct: false,
        }
    }
}

impl fmt::Display for AggregateExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.func == AggregateFunc::CountStar {
            return write!(f, "count(*)");
        }
        write!(
            f,
            "{}({}{})",
            self.func,
            if self.distinct { "DISTINCT " } else { "" },
            self.args.iter().map(|arg| arg.to_string()).join(", ")
        )
    }
}

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Arbitrary,
)]
pub enum SqlType {
    Bool,
    Int,
    BigInt,
    Double,
    Numeric,
    Text,
    Timestamp,
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ty = match self {
            SqlType::Bool => "BOOLEAN",
            SqlType::Int => "INTEGER",
            SqlType::BigInt => "BIGINT",
            SqlType::Double => "DOUBLE PRECISION",
            SqlType::Numeric => "NUMERIC",
            SqlType::Text => "TEXT",
            SqlType::Timestamp => "TIMESTAMP",
        };
        f.write_str(ty)
    }
}

/// Expression tree shared by queries and view definitions.
///
/// Two expressions are equal iff they are structurally equal: constants by
/// value, variable references by slot and column, computed nodes by operator
/// identity and equal children in order (the derived `PartialEq`).
/// Expressions are immutable once built: rewriting produces new nodes
/// rather than patching shared subtrees, since the same subtree may be
/// referenced from several places in a model.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Expr {
    /// A literal value.
    Literal(Literal),

    /// A reference to a column of a base relation.
    Variable(VariableRef),

    /// A reference the rewrite engine has already repointed at a view's
    /// output column. A distinct variant rather than a flag so that no later
    /// matching pass can ever capture it again.
    Resolved(VariableRef),

    /// Binary operator application.
    BinaryOp {
        op: BinaryOperator,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },

    /// Unary operator application.
    UnaryOp { op: UnaryOperator, rhs: Box<Expr> },

    /// `CAST(expr AS type)`.
    Cast { expr: Box<Expr>, ty: SqlType },

    /// Scalar function call.
    Call(FunctionExpr),

    /// Aggregate application.
    Aggregate(AggregateExpr),

    /// Window function application. Representable so the model is closed
    /// under what the parser may hand us, but any query containing one is
    /// rejected by the eligibility gate before matching.
    WindowCall(FunctionExpr),
}

impl Expr {
    pub fn binary(op: BinaryOperator, lhs: Expr, rhs: Expr) -> Expr {
        Expr::BinaryOp {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn and(lhs: Expr, rhs: Expr) -> Expr {
        Expr::binary(BinaryOperator::And, lhs, rhs)
    }

    pub fn equals(lhs: Expr, rhs: Expr) -> Expr {
        Expr::binary(BinaryOperator::Equal, lhs, rhs)
    }
}

impl From<Literal> for Expr {
    fn from(lit: Literal) -> Self {
        Expr::Literal(lit)
    }
}

impl From<VariableRef> for Expr {
    fn from(var: VariableRef) -> Self {
        Expr::Variable(var)
    }
}

impl From<FunctionExpr> for Expr {
    fn from(call: FunctionExpr) -> Self {
        Expr::Call(call)
    }
}

impl From<AggregateExpr> for Expr {
    fn from(agg: AggregateExpr) -> Self {
        Expr::Aggregate(agg)
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Literal(lit) => write!(f, "{lit}"),
            Expr::Variable(var) | Expr::Resolved(var) => write!(f, "{var}"),
            Expr::BinaryOp { op, lhs, rhs } => write!(f, "({lhs} {op} {rhs})"),
            Expr::UnaryOp { op, rhs } => write!(f, "{op} ({rhs})"),
            Expr::Cast { expr, ty } => write!(f, "CAST({expr} AS {ty})"),
            Expr::Call(call) => write!(f, "{call}"),
            Expr::Aggregate(agg) => write!(f, "{agg}"),
            Expr::WindowCall(call) => write!(f, "{call} OVER ()"),
        }
    }
}

impl Arbitrary for Expr {
    type Parameters = ();

    type Strategy = BoxedStrategy<Expr>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        prop_oneof![
            any::<Literal>().prop_map(Expr::Literal),
            any::<VariableRef>().prop_map(Expr::Variable),
        ]
        .prop_recursive(3, 12, 3, |element| {
            let boxed = element.clone().prop_map(Box::new);
            prop_oneof![
                (any::<BinaryOperator>(), boxed.clone(), boxed.clone())
                    .prop_map(|(op, lhs, rhs)| Expr::BinaryOp { op, lhs, rhs }),
                (any::<UnaryOperator>(), boxed.clone())
                    .prop_map(|(op, rhs)| Expr::UnaryOp { op, rhs }),
                (boxed.clone(), any::<SqlType>()).prop_map(|(expr, ty)| Expr::Cast { expr, ty }),
                (
                    any::<SqlIdentifier>(),
                    proptest::collection::vec(element.clone(), 1..3)
                )
                    .prop_map(|(name, args)| Expr::Call(FunctionExpr::immutable(name, args))),
            ]
        })
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structural_equality_is_order_sensitive() {
        let c1 = Expr::Variable(VariableRef::new(1, 1));
        let one = Expr::Literal(Literal::Integer(1));
        assert_eq!(
            Expr::equals(c1.clone(), one.clone()),
            Expr::equals(c1.clone(), one.clone()),
        );
        assert_ne!(Expr::equals(c1.clone(), one.clone()), Expr::equals(one, c1));
    }

    #[test]
    fn resolved_never_equals_variable() {
        let var = VariableRef::new(1, 2);
        assert_ne!(Expr::Variable(var), Expr::Resolved(var));
    }

    #[test]
    fn display_reads_like_sql() {
        let expr = Expr::equals(
            Expr::Call(FunctionExpr::immutable(
                "abs",
                vec![Expr::Variable(VariableRef::new(1, 2))],
            )),
            Expr::Literal(Literal::Integer(51)),
        );
        assert_eq!(expr.to_string(), "(abs(@1.2) = 51)");
    }
}
