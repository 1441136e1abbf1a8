use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ast::{Expr, Predicate, ProjectionItem, SqlIdentifier};

/// A named relation identity, optionally schema-qualified.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Relation {
    pub schema: Option<SqlIdentifier>,
    pub name: SqlIdentifier,
}

impl From<&str> for Relation {
    fn from(name: &str) -> Self {
        Relation {
            schema: None,
            name: name.into(),
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(schema) = &self.schema {
            write!(f, "{schema}.")?;
        }
        write!(f, "{}", self.name)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelationKind {
    BaseTable,
    MaterializedView,
    Subquery,
}

/// A logical relation slot of a query model.
///
/// Every variable reference in the model names a binding by its `slot`. The
/// `alias` field carries source-level aliases; incremental-maintenance image
/// bindings arrive aliased `old`/`new` and are discarded before matching.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationBinding {
    /// 1-based logical slot index.
    pub slot: usize,
    pub table: Relation,
    pub kind: RelationKind,
    pub alias: Option<SqlIdentifier>,
    /// True for system catalog relations.
    pub is_system: bool,
    /// True if the relation inherits from a parent table.
    pub has_ancestors: bool,
    /// True if other tables inherit from (or partition) this relation.
    pub has_descendants: bool,
    /// True if a scan of this binding also scans descendant tables.
    pub inherits_descendants: bool,
}

impl RelationBinding {
    pub fn base_table(slot: usize, table: impl Into<Relation>) -> Self {
        RelationBinding {
            slot,
            table: table.into(),
            kind: RelationKind::BaseTable,
            alias: None,
            is_system: false,
            has_ancestors: false,
            has_descendants: false,
            inherits_descendants: false,
        }
    }

    pub fn materialized_view(slot: usize, table: impl Into<Relation>) -> Self {
        RelationBinding {
            kind: RelationKind::MaterializedView,
            ..Self::base_table(slot, table)
        }
    }

    pub fn aliased(self, alias: impl Into<SqlIdentifier>) -> Self {
        RelationBinding {
            alias: Some(alias.into()),
            ..self
        }
    }
}

/// One entry of a query's top-level join tree.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FromItem {
    /// A plain reference to a relation binding, by slot.
    Relation(usize),
    /// A join between nested items.
    Join(Vec<FromItem>),
    /// A subquery source.
    Subquery(Box<QueryModel>),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QueryKind {
    #[default]
    Select,
    Insert,
    Update,
    Delete,
}

/// The statement context a query arrived in. Queries planned on behalf of a
/// view refresh or a CREATE TABLE AS must not themselves be answered from a
/// view.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QueryOrigin {
    #[default]
    Direct,
    RefreshView,
    CreateTableAs,
}

/// The query model shared by incoming queries and view definitions.
///
/// The `has_*` flags mirror what the upstream parser knows about the
/// statement; the rewrite engine trusts them the way the planner does and
/// never re-derives them from the tree.
///
/// Contract: every relation slot referenced by any expression in the model
/// has a corresponding entry in `relations`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryModel {
    pub kind: QueryKind,
    pub origin: QueryOrigin,
    pub relations: Vec<RelationBinding>,
    pub from: Vec<FromItem>,
    pub projection: Vec<ProjectionItem>,
    pub predicate: Predicate,
    /// Grouping columns as 1-based projection output positions, so the
    /// clause stays valid when the projection expressions are rewritten in
    /// place.
    pub group_by: Vec<usize>,
    pub grouping_sets: bool,
    pub having: Option<Expr>,
    pub has_aggregates: bool,
    pub has_window_calls: bool,
    pub has_distinct_on: bool,
    pub has_modifying_ctes: bool,
    pub has_sublinks: bool,
    pub has_row_locks: bool,
    pub has_ordering: bool,
}

impl QueryModel {
    /// A plain `SELECT` reading from a single relation binding.
    pub fn select_from(binding: RelationBinding) -> Self {
        QueryModel {
            from: vec![FromItem::Relation(binding.slot)],
            relations: vec![binding],
            ..Default::default()
        }
    }

    pub fn binding(&self, slot: usize) -> Option<&RelationBinding> {
        self.relations.iter().find(|rel| rel.slot == slot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_from_wires_slot_into_join_tree() {
        let query = QueryModel::select_from(RelationBinding::base_table(7, "t1"));
        assert_eq!(query.from, vec![FromItem::Relation(7)]);
        assert_eq!(query.binding(7).unwrap().table, Relation::from("t1"));
        assert!(query.binding(1).is_none());
    }
}
