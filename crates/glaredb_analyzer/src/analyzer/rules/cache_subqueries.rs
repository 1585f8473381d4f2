//! Result caching for nested queries.

use tracing::trace;

use super::within_query;
use crate::analyzer::Analyzer;
use crate::analyzer::rule::{AnalyzerRule, RuleId, RuleSelector};
use crate::analyzer::scope::Scope;
use crate::context::AnalysisContext;
use crate::errors::Result;
use crate::expr::Expression;
use crate::logical::logical_cached_results::LogicalCachedResults;
use crate::logical::operator::{LogicalOperator, Node};
use crate::transform::inspect::{Recursion, inspect_expr, inspect_plan, inspect_plan_expressions};
use crate::transform::plan::{
    SelectorContext,
    transform_node_expressions_up,
    transform_with_context,
};
use crate::transform::Transformed;

/// Marks subquery expressions that produce the same results for every row of
/// the query containing them.
#[derive(Debug, Clone, Copy)]
pub struct CacheSubqueryResults;

impl AnalyzerRule for CacheSubqueryResults {
    fn id(&self) -> RuleId {
        RuleId::CacheSubqueryResults
    }

    fn apply(
        &self,
        _analyzer: &Analyzer,
        _ctx: &AnalysisContext,
        plan: LogicalOperator,
        scope: &Scope,
        _selector: &RuleSelector,
    ) -> Result<Transformed<LogicalOperator>> {
        // Trigger bodies run once per triggering row with that row in scope.
        if matches!(plan, LogicalOperator::TriggerBlock(_)) {
            return Ok(Transformed::same(plan));
        }

        transform_with_context(plan, &mut within_query_outside_triggers, &mut |_, node| {
            transform_node_expressions_up(node, &mut |owner, expr| match expr {
                Expression::Subquery(subquery) if !subquery.cacheable && subquery.resolved() => {
                    let boundary = scope.new_scope(owner).len();
                    if node_is_cacheable(&subquery.query, boundary) {
                        trace!(boundary, "caching subquery results");
                        Ok(Transformed::new_tree(Expression::Subquery(
                            subquery.with_cached_results(),
                        )))
                    } else {
                        Ok(Transformed::same(Expression::Subquery(subquery)))
                    }
                }
                other => Ok(Transformed::same(other)),
            })
        })
    }
}

fn within_query_outside_triggers(ctx: &SelectorContext) -> bool {
    within_query(ctx) && !matches!(ctx.node, LogicalOperator::TriggerBlock(_))
}

/// If the results of a query analyzed in a scope of length
/// `lowest_allowed_idx` don't depend on the row of the enclosing query.
///
/// The query must not reference columns below `lowest_allowed_idx`, must be
/// deterministic, and must not contain derived tables that can see outer
/// scopes. Nested subqueries are checked as part of the query.
pub fn node_is_cacheable(plan: &LogicalOperator, lowest_allowed_idx: usize) -> bool {
    is_deterministic(plan)
        && !has_outer_visible_derived_table(plan)
        && !references_outer_columns(plan, lowest_allowed_idx)
}

/// If every expression in the plan, including in nested subqueries, is
/// deterministic.
pub fn is_deterministic(plan: &LogicalOperator) -> bool {
    let walk = inspect_plan_expressions(plan, &mut |expr| match expr {
        expr if expr.is_non_deterministic() => Recursion::Stop,
        Expression::Subquery(subquery) if !is_deterministic(&subquery.query) => Recursion::Stop,
        _ => Recursion::Continue,
    });
    walk != Recursion::Stop
}

fn has_outer_visible_derived_table(plan: &LogicalOperator) -> bool {
    let walk = inspect_plan(plan, &mut |node| match node {
        LogicalOperator::SubqueryAlias(sqa) if sqa.node.outer_scope_visibility => {
            Recursion::Stop
        }
        node if node_subqueries_have_outer_visible_derived_table(node) => Recursion::Stop,
        _ => Recursion::Continue,
    });
    walk == Recursion::Stop
}

fn node_subqueries_have_outer_visible_derived_table(node: &LogicalOperator) -> bool {
    node.expressions()
        .unwrap_or_default()
        .into_iter()
        .any(|expr| {
            expr_has(expr, &mut |e| match e {
                Expression::Subquery(subquery) => {
                    has_outer_visible_derived_table(&subquery.query)
                }
                _ => false,
            })
        })
}

/// Check for column references below `lowest_allowed_idx`.
///
/// Derived tables that can't see outer scopes have a layout of their own and
/// are not entered.
fn references_outer_columns(plan: &LogicalOperator, lowest_allowed_idx: usize) -> bool {
    let walk = inspect_plan(plan, &mut |node| {
        if matches!(node, LogicalOperator::SubqueryAlias(sqa) if !sqa.node.outer_scope_visibility) {
            return Recursion::Jump;
        }
        let outer = node
            .expressions()
            .unwrap_or_default()
            .into_iter()
            .any(|expr| {
                expr_has(expr, &mut |e| match e {
                    Expression::Column(col) => col.index < lowest_allowed_idx,
                    Expression::Subquery(subquery) => {
                        references_outer_columns(&subquery.query, lowest_allowed_idx)
                    }
                    _ => false,
                })
            });
        if outer {
            Recursion::Stop
        } else {
            Recursion::Continue
        }
    });
    walk == Recursion::Stop
}

/// If any expression in the tree satisfies `pred`.
fn expr_has<P>(expr: &Expression, pred: &mut P) -> bool
where
    P: FnMut(&Expression) -> bool,
{
    inspect_expr(expr, &mut |e| {
        if pred(e) {
            Recursion::Stop
        } else {
            Recursion::Continue
        }
    }) == Recursion::Stop
}

/// Caches the results of derived tables read repeatedly by joins.
///
/// The non-primary side of a join is read once per row of the primary side,
/// so derived tables there are wrapped in a caching node. A top level query
/// reads its most primary input exactly once, so caching along that path is
/// removed again.
#[derive(Debug, Clone, Copy)]
pub struct CacheSubqueryAliasesInJoins;

impl AnalyzerRule for CacheSubqueryAliasesInJoins {
    fn id(&self) -> RuleId {
        RuleId::CacheSubqueryAliasesInJoins
    }

    fn apply(
        &self,
        _analyzer: &Analyzer,
        _ctx: &AnalysisContext,
        plan: LogicalOperator,
        scope: &Scope,
        _selector: &RuleSelector,
    ) -> Result<Transformed<LogicalOperator>> {
        let wrapped = transform_with_context(plan, &mut |_| true, &mut |ctx, node| {
            match (ctx.parent, node) {
                (Some(LogicalOperator::Join(_)), LogicalOperator::SubqueryAlias(sqa)) => {
                    Ok(Transformed::new_tree(LogicalOperator::CachedResults(Node::new(
                        LogicalCachedResults,
                        vec![LogicalOperator::SubqueryAlias(sqa)],
                    ))))
                }
                (_, node) => Ok(Transformed::same(node)),
            }
        })?;

        if !scope.is_empty() {
            return Ok(wrapped);
        }

        let identity = wrapped.identity;
        let unwrapped = remove_primary_path_caching(wrapped.data)?;
        Ok(Transformed::new(
            unwrapped.data,
            identity.and(unwrapped.identity),
        ))
    }
}

/// Remove caching nodes along the path of primary join inputs from the root.
fn remove_primary_path_caching(plan: LogicalOperator) -> Result<Transformed<LogicalOperator>> {
    transform_with_context(plan, &mut on_primary_path, &mut |_, node| match node {
        LogicalOperator::CachedResults(mut cached) => {
            Ok(Transformed::new_tree(cached.take_one_child_exact()?))
        }
        other => Ok(Transformed::same(other)),
    })
}

fn on_primary_path(ctx: &SelectorContext) -> bool {
    match ctx.parent {
        LogicalOperator::Join(join) => ctx.child_index == join.node.join_type.primary_child(),
        _ => true,
    }
}
