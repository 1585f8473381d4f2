//! Analysis of nested queries.
//!
//! Subquery expressions and derived tables are analyzed as queries of their
//! own with a scope extended by the query containing them. Resolution happens
//! in two phases. While the containing query is still being resolved, nested
//! queries are analyzed tentatively: errors that may go away once more of the
//! containing query is resolved are swallowed and the partial progress is
//! kept. Once the containing query is resolved, nested queries are finalized
//! and every error is fatal.

use tracing::debug;

use super::within_query;
use crate::analyzer::passthrough::strip_passthrough_nodes;
use crate::analyzer::rule::{AnalyzerRule, RuleId, RuleSelector};
use crate::analyzer::scope::Scope;
use crate::analyzer::{Analyzer, BatchSelector, DEFAULT_RULES, PartialAnalysis};
use crate::context::AnalysisContext;
use crate::errors::{AnalyzerError, Result};
use crate::expr::Expression;
use crate::expr::subquery_expr::SubqueryExpr;
use crate::logical::logical_subquery_alias::LogicalSubqueryAlias;
use crate::logical::operator::{LogicalOperator, Node};
use crate::transform::plan::{transform_node_expressions_up, transform_with_context};
use crate::transform::{Transformed, TreeIdentity};

/// Tentatively analyzes nested queries.
#[derive(Debug, Clone, Copy)]
pub struct ResolveSubqueries;

impl AnalyzerRule for ResolveSubqueries {
    fn id(&self) -> RuleId {
        RuleId::ResolveSubqueries
    }

    fn apply(
        &self,
        analyzer: &Analyzer,
        ctx: &AnalysisContext,
        plan: LogicalOperator,
        scope: &Scope,
        selector: &RuleSelector,
    ) -> Result<Transformed<LogicalOperator>> {
        resolve_subqueries(analyzer, ctx, plan, scope, selector, false)
    }
}

/// Analyzes nested queries a final time with every rule enabled.
#[derive(Debug, Clone, Copy)]
pub struct FinalizeSubqueries;

impl AnalyzerRule for FinalizeSubqueries {
    fn id(&self) -> RuleId {
        RuleId::FinalizeSubqueries
    }

    fn apply(
        &self,
        analyzer: &Analyzer,
        ctx: &AnalysisContext,
        plan: LogicalOperator,
        scope: &Scope,
        selector: &RuleSelector,
    ) -> Result<Transformed<LogicalOperator>> {
        resolve_subqueries(analyzer, ctx, plan, scope, selector, true)
    }
}

fn resolve_subqueries(
    analyzer: &Analyzer,
    ctx: &AnalysisContext,
    plan: LogicalOperator,
    scope: &Scope,
    selector: &RuleSelector,
    finalize: bool,
) -> Result<Transformed<LogicalOperator>> {
    transform_with_context(plan, &mut within_query, &mut |_, node| match node {
        LogicalOperator::SubqueryAlias(sqa) => {
            analyze_derived_table(analyzer, ctx, sqa, scope, selector, finalize)
        }
        node => transform_node_expressions_up(node, &mut |owner, expr| match expr {
            Expression::Subquery(subquery) => analyze_subquery_expression(
                analyzer, ctx, owner, subquery, scope, selector, finalize,
            ),
            other => Ok(Transformed::same(other)),
        }),
    })
}

/// Analyze the query of a subquery expression found in `owner`.
///
/// Always reported as a new tree. Convergence is left to the batch comparing
/// plans.
fn analyze_subquery_expression(
    analyzer: &Analyzer,
    ctx: &AnalysisContext,
    owner: &LogicalOperator,
    mut subquery: SubqueryExpr,
    scope: &Scope,
    selector: &RuleSelector,
    finalize: bool,
) -> Result<Transformed<Expression>> {
    let (sub_ctx, _guard) = ctx.new_sub_context();
    let sub_scope = scope.new_scope(owner);
    let query = subquery.query.take();

    let result = if finalize {
        analyzer.analyze_with_selector(&sub_ctx, query, &sub_scope, BatchSelector::All, selector)
    } else {
        let selector = selector.for_subquery_resolution();
        analyzer.analyze_with_selector(&sub_ctx, query, &sub_scope, BatchSelector::All, &selector)
    };

    let query = match result {
        Ok(analyzed) => strip_passthrough_nodes(analyzed.data),
        Err(PartialAnalysis { plan, error }) if !finalize && error.is_deferrable() => {
            debug!(
                %error,
                scope = ?sub_scope.inner_to_outer(),
                "deferring subquery resolution"
            );
            plan
        }
        Err(partial) => return Err(partial.error),
    };

    Ok(Transformed::new_tree(Expression::Subquery(
        subquery.with_query(query),
    )))
}

/// Analyze the input of a derived table one level deeper than `scope`.
fn analyze_derived_table(
    analyzer: &Analyzer,
    ctx: &AnalysisContext,
    mut sqa: Node<LogicalSubqueryAlias>,
    scope: &Scope,
    selector: &RuleSelector,
    finalize: bool,
) -> Result<Transformed<LogicalOperator>> {
    let (sub_ctx, _guard) = ctx.new_sub_context();
    let sub_scope = scope.for_derived_table();

    let mut identity = TreeIdentity::SameTree;
    if !scope.is_empty() && !sqa.node.outer_scope_visibility {
        sqa.node.outer_scope_visibility = true;
        identity = TreeIdentity::NewTree;
    }

    let input = sqa.take_one_child_exact()?;
    let result = if finalize {
        analyzer.analyze_starting_at_batch(&sub_ctx, input, &sub_scope, DEFAULT_RULES, selector)
    } else {
        analyzer.analyze_through_batch(&sub_ctx, input, &sub_scope, DEFAULT_RULES, selector)
    };

    let analyzed = match result {
        Ok(analyzed) => analyzed,
        Err(PartialAnalysis { plan, error }) if !finalize && error.is_deferrable() => {
            debug!(
                %error,
                alias = %sqa.node.name,
                depth = sub_scope.depth(),
                "deferring derived table resolution"
            );
            sqa.children = vec![plan];
            return Ok(Transformed::new_tree(LogicalOperator::SubqueryAlias(sqa)));
        }
        Err(partial) => return Err(partial.error),
    };

    let input = strip_passthrough_nodes(analyzed.data);
    check_column_count(&sqa.node, &input)?;

    sqa.children = vec![input];
    Ok(Transformed::new(
        LogicalOperator::SubqueryAlias(sqa),
        identity.and(analyzed.identity),
    ))
}

fn check_column_count(sqa: &LogicalSubqueryAlias, input: &LogicalOperator) -> Result<()> {
    if sqa.columns.is_empty() {
        return Ok(());
    }
    let produced = input.schema().len();
    if produced != sqa.columns.len() {
        return Err(AnalyzerError::ColumnCountMismatch {
            alias: sqa.name.clone(),
            declared: sqa.columns.len(),
            produced,
        });
    }
    Ok(())
}
