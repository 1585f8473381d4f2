use tracing::trace;

use super::within_query;
use crate::analyzer::Analyzer;
use crate::analyzer::rule::{AnalyzerRule, RuleId, RuleSelector};
use crate::analyzer::scope::Scope;
use crate::context::AnalysisContext;
use crate::errors::{AnalyzerError, Result};
use crate::logical::logical_scan::LogicalScan;
use crate::logical::operator::{LogicalOperator, Node};
use crate::transform::Transformed;
use crate::transform::plan::transform_with_context;

/// Replaces table references with scans of tables found in the catalog.
#[derive(Debug, Clone, Copy)]
pub struct ResolveTables;

impl AnalyzerRule for ResolveTables {
    fn id(&self) -> RuleId {
        RuleId::ResolveTables
    }

    fn apply(
        &self,
        analyzer: &Analyzer,
        _ctx: &AnalysisContext,
        plan: LogicalOperator,
        _scope: &Scope,
        _selector: &RuleSelector,
    ) -> Result<Transformed<LogicalOperator>> {
        transform_with_context(plan, &mut within_query, &mut |_, node| match node {
            LogicalOperator::UnresolvedTable(unresolved) => {
                let name = unresolved.node.name;
                let table = analyzer
                    .catalog()
                    .get_table(&name)
                    .ok_or(AnalyzerError::TableNotFound { table: name })?;
                trace!(table = %table.name, "resolved table");

                Ok(Transformed::new_tree(LogicalOperator::Scan(Node::new(
                    LogicalScan {
                        table: table.name,
                        columns: table.columns,
                    },
                    Vec::new(),
                ))))
            }
            other => Ok(Transformed::same(other)),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::catalog::MemoryCatalog;
    use crate::config::AnalyzerConfig;
    use crate::expr::scalar::DataType;
    use crate::logical::builder::PlanBuilder;
    use crate::transform::TreeIdentity;

    fn apply(plan: LogicalOperator) -> Result<Transformed<LogicalOperator>> {
        let catalog = MemoryCatalog::new();
        catalog.create_table("t1", [("a", DataType::Int64)]);
        let analyzer = Analyzer::new(Arc::new(catalog), AnalyzerConfig::default());

        ResolveTables.apply(
            &analyzer,
            &AnalysisContext::new(),
            plan,
            &Scope::empty(),
            &RuleSelector::all(),
        )
    }

    #[test]
    fn resolves_from_catalog() {
        let out = apply(PlanBuilder::unresolved_table("T1").alias("x").build()).unwrap();

        assert_eq!(TreeIdentity::NewTree, out.identity);
        let expected = PlanBuilder::scan("t1", [("a", DataType::Int64)])
            .alias("x")
            .build();
        assert_eq!(expected, out.data);
    }

    #[test]
    fn leaves_derived_tables_alone() {
        let plan = PlanBuilder::unresolved_table("t1")
            .subquery_alias("sq", ["a"])
            .build();

        let out = apply(plan.clone()).unwrap();
        assert_eq!(TreeIdentity::SameTree, out.identity);
        assert_eq!(plan, out.data);
    }

    #[test]
    fn unknown_table() {
        let err = apply(PlanBuilder::unresolved_table("t2").build()).unwrap_err();
        assert!(matches!(err, AnalyzerError::TableNotFound { table } if table == "t2"));
    }
}
