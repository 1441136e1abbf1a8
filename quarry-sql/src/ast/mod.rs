use std::fmt;
use std::ops::Deref;

use serde::{Deserialize, Serialize};
use test_strategy::Arbitrary;

mod expression;
mod literal;
mod predicate;
mod projection;
mod query;

pub use expression::{
    AggregateExpr, AggregateFunc, BinaryOperator, Expr, FunctionExpr, SqlType, UnaryOperator,
    VariableRef, Volatility,
};
pub use literal::Literal;
pub use predicate::Predicate;
pub use projection::ProjectionItem;
pub use query::{
    FromItem, QueryKind, QueryModel, QueryOrigin, Relation, RelationBinding, RelationKind,
};

/// An identifier (column name, function name, alias, relation name).
#[derive(
    Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Arbitrary,
)]
pub struct SqlIdentifier(#[strategy("[a-z][a-z0-9_]{0,7}")] String);

impl SqlIdentifier {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Deref for SqlIdentifier {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for SqlIdentifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SqlIdentifier {
    fn from(s: &str) -> Self {
        SqlIdentifier(s.to_owned())
    }
}

impl From<String> for SqlIdentifier {
    fn from(s: String) -> Self {
        SqlIdentifier(s)
    }
}

impl PartialEq<str> for SqlIdentifier {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for SqlIdentifier {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl fmt::Display for SqlIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
