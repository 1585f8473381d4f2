use crate::analyzer::Analyzer;
use crate::analyzer::rule::{AnalyzerRule, RuleId, RuleSelector};
use crate::analyzer::scope::Scope;
use crate::context::AnalysisContext;
use crate::errors::{AnalyzerError, Result};
use crate::explain::explainable::{ExplainConfig, Explainable};
use crate::expr::Expression;
use crate::logical::operator::LogicalOperator;
use crate::transform::Transformed;

/// Fails analysis if anything in the plan is left unresolved.
///
/// Disabled with the `validate_resolved` setting.
#[derive(Debug, Clone, Copy)]
pub struct ValidateResolved;

impl AnalyzerRule for ValidateResolved {
    fn id(&self) -> RuleId {
        RuleId::ValidateResolved
    }

    fn apply(
        &self,
        analyzer: &Analyzer,
        _ctx: &AnalysisContext,
        plan: LogicalOperator,
        _scope: &Scope,
        _selector: &RuleSelector,
    ) -> Result<Transformed<LogicalOperator>> {
        if !analyzer.config().validate_resolved {
            return Ok(Transformed::same(plan));
        }

        match describe_unresolved(&plan) {
            Some(node) => Err(AnalyzerError::Unresolved { node }),
            None => Ok(Transformed::same(plan)),
        }
    }
}

/// Describe the first unresolved construct in the plan, top down. Subquery
/// plans are searched through the expression holding them.
fn describe_unresolved(plan: &LogicalOperator) -> Option<String> {
    if !plan.node_resolved() {
        let in_exprs = plan
            .expressions()
            .unwrap_or_default()
            .into_iter()
            .find_map(describe_unresolved_expr);
        return Some(in_exprs.unwrap_or_else(|| {
            plan.explain_entry(ExplainConfig::default()).to_string()
        }));
    }
    plan.children().iter().find_map(describe_unresolved)
}

fn describe_unresolved_expr(expr: &Expression) -> Option<String> {
    match expr {
        Expression::UnresolvedColumn(col) => Some(format!("column {col}")),
        Expression::Subquery(subquery) => describe_unresolved(&subquery.query),
        other => other.children().into_iter().find_map(describe_unresolved_expr),
    }
}
