use crate::analyzer::Analyzer;
use crate::analyzer::rule::{AnalyzerRule, RuleId, RuleSelector};
use crate::analyzer::scope::Scope;
use crate::context::AnalysisContext;
use crate::errors::Result;
use crate::logical::operator::LogicalOperator;
use crate::transform::{Transformed, transform_up};

/// Folds table aliases into the node they alias where possible.
///
/// An alias over a derived table renames the derived table. An alias over
/// another alias replaces it.
#[derive(Debug, Clone, Copy)]
pub struct FlattenTableAliases;

impl AnalyzerRule for FlattenTableAliases {
    fn id(&self) -> RuleId {
        RuleId::FlattenTableAliases
    }

    fn apply(
        &self,
        _analyzer: &Analyzer,
        _ctx: &AnalysisContext,
        plan: LogicalOperator,
        _scope: &Scope,
        _selector: &RuleSelector,
    ) -> Result<Transformed<LogicalOperator>> {
        transform_up(plan, &mut |node| match node {
            LogicalOperator::TableAlias(mut alias) => match alias.take_one_child_exact()? {
                LogicalOperator::SubqueryAlias(sqa) => Ok(Transformed::new_tree(
                    LogicalOperator::SubqueryAlias(sqa.with_name(alias.node.name)),
                )),
                LogicalOperator::TableAlias(mut inner) => {
                    alias.children = vec![inner.take_one_child_exact()?];
                    Ok(Transformed::new_tree(LogicalOperator::TableAlias(alias)))
                }
                child => {
                    alias.children = vec![child];
                    Ok(Transformed::same(LogicalOperator::TableAlias(alias)))
                }
            },
            other => Ok(Transformed::same(other)),
        })
    }
}
