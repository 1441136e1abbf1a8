use quarry_errors::QuarryResult;
use quarry_sql::ast::{
    FromItem, ProjectionItem, QueryModel, Relation, RelationBinding, RelationKind,
};
use tracing::{debug, trace, trace_span};

use crate::classify::MatchContext;
use crate::containment::check_containment;
use crate::eligibility::{is_eligible_outer_query, is_eligible_view_query, single_plain_relation};
use crate::renumber::renumber_relations;

/// A physical plan produced by the external planner, exposing only what the
/// rewrite scan needs: its estimated total cost.
pub trait CostedPlan {
    fn total_cost(&self) -> f64;
}

/// One materialized view offered by the catalog.
///
/// `lease` is the scoped read-guard protecting the view against a concurrent
/// drop or redefinition. It is dropped (released) as soon as the candidate
/// is rejected; for an accepted candidate it is handed off inside
/// [`Rewritten`] and lives as long as the plan does.
#[derive(Debug)]
pub struct ViewCandidate<L> {
    pub table: Relation,
    pub defining_query: QueryModel,
    /// True when the view's stored data exists and is up to date.
    pub populated: bool,
    pub lease: L,
}

/// The collaborators the rewrite scan needs from the surrounding system.
///
/// `candidate_views` is expected to be pre-filtered to materialized views
/// whose definition is a single unconditional select action. `view_output`
/// resolves a view's own result columns (what a select of every column of
/// the view would produce); failures there skip the candidate.
pub trait AnswerContext {
    type Plan: CostedPlan;
    type Lease;

    fn candidate_views(&self) -> Vec<ViewCandidate<Self::Lease>>;

    fn view_output(&self, view: &Relation) -> QuarryResult<Vec<ProjectionItem>>;

    fn plan(&self, query: &QueryModel) -> QuarryResult<Self::Plan>;
}

impl<C: AnswerContext> AnswerContext for &C {
    type Plan = C::Plan;
    type Lease = C::Lease;

    fn candidate_views(&self) -> Vec<ViewCandidate<Self::Lease>> {
        (*self).candidate_views()
    }

    fn view_output(&self, view: &Relation) -> QuarryResult<Vec<ProjectionItem>> {
        (*self).view_output(view)
    }

    fn plan(&self, query: &QueryModel) -> QuarryResult<Self::Plan> {
        (*self).plan(query)
    }
}

/// The outcome of a rewrite scan: always usable. `final_query` is the
/// original query untouched when no rewrite qualified, otherwise the
/// cheapest rewritten query, with the accepted candidate's catalog lease
/// carried alongside.
#[derive(Debug)]
pub struct Rewritten<P, L> {
    pub final_query: QueryModel,
    pub plan: P,
    pub lease: Option<L>,
}

impl<P, L> Rewritten<P, L> {
    pub fn was_rewritten(&self) -> bool {
        self.lease.is_some()
    }
}

/// Try to answer `query` from each candidate materialized view, keeping the
/// cheapest plan found; the original query and its plan are the baseline.
///
/// Per-candidate failures of any kind (ineligible shape, unmatched
/// expression, containment miss, catalog or planner trouble) abandon that
/// candidate only. The single fatal condition is a broken internal
/// invariant, which surfaces as `Err`; planning the *original* query must
/// also succeed, since without it there is no usable fallback.
pub fn answer_query_using_materialized_views<C: AnswerContext>(
    ctx: &C,
    query: &QueryModel,
) -> QuarryResult<Rewritten<C::Plan, C::Lease>> {
    let mut best_plan = ctx.plan(query)?;
    let mut best_query = query.clone();
    let mut best_lease = None;

    if !is_eligible_outer_query(query) {
        trace!("query shape not eligible for view matching");
        return Ok(Rewritten {
            final_query: best_query,
            plan: best_plan,
            lease: None,
        });
    }
    let Some(outer_relation) = single_plain_relation(query) else {
        // is_eligible_outer_query just proved this exists.
        quarry_errors::internal!("eligible query has no plain relation");
    };

    for candidate in ctx.candidate_views() {
        let span = trace_span!("candidate", view = %candidate.table);
        let _entered = span.enter();

        if !candidate.populated {
            trace!("skipping: view data not populated");
            continue;
        }

        let mut view_query = candidate.defining_query.clone();
        discard_maintenance_bindings(&mut view_query);

        if !is_eligible_view_query(&view_query, outer_relation) {
            trace!("skipping: defining query not eligible");
            continue;
        }

        // The discarded image bindings leave the real relation at an
        // arbitrary slot; expressions can only be compared against the outer
        // query's once everything points at one canonical slot.
        renumber_relations(&mut view_query, 1);

        let view_output = match ctx.view_output(&candidate.table) {
            Ok(output) => output,
            Err(error) if error.is_internal() => return Err(error),
            Err(error) => {
                debug!(%error, "skipping: view output unavailable");
                continue;
            }
        };

        let mut context = MatchContext::new(&view_output, &view_query.projection);
        context.rank_nonpure_by_complexity();

        let Some(projection) = context.rewrite_projection(&query.projection)? else {
            trace!("skipping: projection does not match");
            continue;
        };

        // The projection rewrite proved every aggregated or grouped input
        // derivable from the view, so the outer query's aggregate state can
        // be carried over onto the trial shell.
        view_query.has_aggregates = query.has_aggregates;
        view_query.group_by = query.group_by.clone();
        view_query.grouping_sets = query.grouping_sets;

        let outer_predicate = query.predicate.normalized();
        let view_predicate = view_query.predicate.normalized();
        let Some(post_predicate) = check_containment(&outer_predicate, &view_predicate) else {
            trace!("skipping: view predicate not contained in query predicate");
            continue;
        };
        let Some(post_predicate) = context.rewrite_predicate(&post_predicate)? else {
            trace!("skipping: residual predicate does not match");
            continue;
        };

        // The trial reads the view itself: one binding, canonical slot.
        // Whatever derived-equality knowledge the view's own predicate
        // carried is dropped with it, not reconstructed.
        view_query.relations = vec![RelationBinding::materialized_view(
            1,
            candidate.table.clone(),
        )];
        view_query.from = vec![FromItem::Relation(1)];
        view_query.projection = projection;
        view_query.predicate = post_predicate;

        let trial_plan = match ctx.plan(&view_query) {
            Ok(plan) => plan,
            Err(error) if error.is_internal() => return Err(error),
            Err(error) => {
                debug!(%error, "skipping: trial query could not be planned");
                continue;
            }
        };

        // Strictly cheaper or nothing; no fuzz margin, since only one best
        // plan is ever held on each side of the comparison.
        if trial_plan.total_cost() < best_plan.total_cost() {
            debug!(
                view = %candidate.table,
                cost = trial_plan.total_cost(),
                "rewrite accepted as new best plan"
            );
            best_plan = trial_plan;
            best_query = view_query;
            best_lease = Some(candidate.lease);
        }
    }

    Ok(Rewritten {
        final_query: best_query,
        plan: best_plan,
        lease: best_lease,
    })
}

/// Drop the incremental-maintenance-only "before"/"after" image bindings
/// from a view's raw defining query. They are artifacts of how the refresh
/// logic is expressed, not part of the logical view query; the join tree
/// never references them.
fn discard_maintenance_bindings(query: &mut QueryModel) {
    query.relations.retain(|rel| {
        !(rel.kind == RelationKind::MaterializedView
            && rel
                .alias
                .as_ref()
                .is_some_and(|alias| alias == "old" || alias == "new"))
    });
}

#[cfg(test)]
mod tests {
    use quarry_sql::ast::{Expr, VariableRef};

    use super::*;

    #[test]
    fn maintenance_images_are_discarded_by_kind_and_alias() {
        let mut query = QueryModel {
            relations: vec![
                RelationBinding::materialized_view(1, "mv0").aliased("old"),
                RelationBinding::materialized_view(2, "mv0").aliased("new"),
                RelationBinding::base_table(3, "t1"),
            ],
            from: vec![FromItem::Relation(3)],
            ..Default::default()
        };
        query.projection = vec![ProjectionItem::new(
            1,
            "c1",
            Expr::Variable(VariableRef::new(3, 1)),
        )];

        discard_maintenance_bindings(&mut query);
        assert_eq!(query.relations.len(), 1);
        assert_eq!(query.relations[0].table, Relation::from("t1"));

        // A base table that happens to be aliased "old" is kept.
        let mut query = QueryModel::select_from(RelationBinding::base_table(1, "t1").aliased("old"));
        discard_maintenance_bindings(&mut query);
        assert_eq!(query.relations.len(), 1);
    }
}
