use crate::analyzer::Analyzer;
use crate::analyzer::rule::{AnalyzerRule, RuleId, RuleSelector};
use crate::analyzer::scope::Scope;
use crate::context::AnalysisContext;
use crate::errors::Result;
use crate::logical::logical_passthrough::LogicalQueryProcess;
use crate::logical::operator::{LogicalOperator, Node};
use crate::transform::Transformed;

/// Wraps top level queries in a node tracking the running query.
#[derive(Debug, Clone, Copy)]
pub struct TrackProcess;

impl AnalyzerRule for TrackProcess {
    fn id(&self) -> RuleId {
        RuleId::TrackProcess
    }

    fn apply(
        &self,
        _analyzer: &Analyzer,
        _ctx: &AnalysisContext,
        plan: LogicalOperator,
        scope: &Scope,
        _selector: &RuleSelector,
    ) -> Result<Transformed<LogicalOperator>> {
        if !scope.is_empty() || matches!(plan, LogicalOperator::QueryProcess(_)) {
            return Ok(Transformed::same(plan));
        }

        Ok(Transformed::new_tree(LogicalOperator::QueryProcess(
            Node::new(LogicalQueryProcess, vec![plan]),
        )))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::catalog::MemoryCatalog;
    use crate::config::AnalyzerConfig;
    use crate::expr::lit;
    use crate::expr::scalar::DataType;
    use crate::logical::builder::PlanBuilder;
    use crate::transform::TreeIdentity;

    fn apply(plan: LogicalOperator, scope: &Scope) -> Transformed<LogicalOperator> {
        let analyzer = Analyzer::new(Arc::new(MemoryCatalog::new()), AnalyzerConfig::default());
        TrackProcess
            .apply(
                &analyzer,
                &AnalysisContext::new(),
                plan,
                scope,
                &RuleSelector::all(),
            )
            .unwrap()
    }

    #[test]
    fn wraps_top_level_once() {
        let plan = PlanBuilder::scan("t1", [("a", DataType::Int64)]).build();

        let out = apply(plan.clone(), &Scope::empty());
        assert_eq!(TreeIdentity::NewTree, out.identity);
        assert_eq!(PlanBuilder::from(plan).query_process().build(), out.data);

        let again = apply(out.data, &Scope::empty());
        assert_eq!(TreeIdentity::SameTree, again.identity);
    }

    #[test]
    fn nested_queries_not_tracked() {
        let plan = PlanBuilder::scan("t1", [("a", DataType::Int64)]).build();
        let outer = PlanBuilder::from(plan.clone()).filter(lit(true)).build();

        let out = apply(plan.clone(), &Scope::empty().new_scope(&outer));
        assert_eq!(TreeIdentity::SameTree, out.identity);
        assert_eq!(plan, out.data);
    }
}
