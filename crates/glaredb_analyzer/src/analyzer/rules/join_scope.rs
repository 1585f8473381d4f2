use super::within_query;
use crate::analyzer::Analyzer;
use crate::analyzer::rule::{AnalyzerRule, RuleId, RuleSelector};
use crate::analyzer::scope::Scope;
use crate::context::AnalysisContext;
use crate::errors::Result;
use crate::logical::logical_strip_row::LogicalStripRow;
use crate::logical::operator::{LogicalOperator, Node};
use crate::transform::Transformed;
use crate::transform::plan::transform_with_context;

/// Tells joins in a nested query how many scope columns prefix their rows.
///
/// Each join input is wrapped in a node stripping the scope columns from the
/// rows it produces so the join can prefix them once.
#[derive(Debug, Clone, Copy)]
pub struct SetJoinScopeLen;

impl AnalyzerRule for SetJoinScopeLen {
    fn id(&self) -> RuleId {
        RuleId::SetJoinScopeLen
    }

    fn apply(
        &self,
        _analyzer: &Analyzer,
        _ctx: &AnalysisContext,
        plan: LogicalOperator,
        scope: &Scope,
        _selector: &RuleSelector,
    ) -> Result<Transformed<LogicalOperator>> {
        let scope_len = scope.len();
        if scope_len == 0 {
            return Ok(Transformed::same(plan));
        }

        transform_with_context(plan, &mut within_query, &mut |_, node| match node {
            LogicalOperator::Join(join) => {
                let wrapped = join
                    .children
                    .first()
                    .is_some_and(|c| matches!(c, LogicalOperator::StripRow(_)));
                if wrapped && join.node.scope_len == scope_len {
                    return Ok(Transformed::same(LogicalOperator::Join(join)));
                }

                let mut join = join.with_scope_len(scope_len);
                if !wrapped {
                    join.children = std::mem::take(&mut join.children)
                        .into_iter()
                        .map(|child| {
                            LogicalOperator::StripRow(Node::new(
                                LogicalStripRow {
                                    num_columns: scope_len,
                                },
                                vec![child],
                            ))
                        })
                        .collect();
                }
                Ok(Transformed::new_tree(LogicalOperator::Join(join)))
            }
            other => Ok(Transformed::same(other)),
        })
    }
}
