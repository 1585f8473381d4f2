use crate::analyzer::Analyzer;
use crate::analyzer::rule::{AnalyzerRule, RuleId, RuleSelector};
use crate::analyzer::scope::Scope;
use crate::context::AnalysisContext;
use crate::errors::Result;
use crate::logical::operator::LogicalOperator;
use crate::transform::Transformed;
use crate::transform::inspect::find_plan;

/// Describes the columns of a view's query for `SHOW COLUMNS`.
#[derive(Debug, Clone, Copy)]
pub struct SetViewTargetSchema;

impl AnalyzerRule for SetViewTargetSchema {
    fn id(&self) -> RuleId {
        RuleId::SetViewTargetSchema
    }

    fn apply(
        &self,
        _analyzer: &Analyzer,
        _ctx: &AnalysisContext,
        plan: LogicalOperator,
        _scope: &Scope,
        _selector: &RuleSelector,
    ) -> Result<Transformed<LogicalOperator>> {
        let LogicalOperator::ShowColumns(show) = plan else {
            return Ok(Transformed::same(plan));
        };

        let view = show.children.iter().find_map(|child| {
            find_plan(child, &mut |n| matches!(n, LogicalOperator::SubqueryAlias(_)))
        });
        let Some(view) = view else {
            return Ok(Transformed::same(LogicalOperator::ShowColumns(show)));
        };

        let schema = view.schema();
        if show.node.target_schema.as_ref() == Some(&schema) {
            return Ok(Transformed::same(LogicalOperator::ShowColumns(show)));
        }

        Ok(Transformed::new_tree(LogicalOperator::ShowColumns(
            show.with_target_schema(schema),
        )))
    }
}
