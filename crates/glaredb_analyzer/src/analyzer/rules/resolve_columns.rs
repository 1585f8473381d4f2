use tracing::trace;

use super::within_query;
use crate::analyzer::Analyzer;
use crate::analyzer::rule::{AnalyzerRule, RuleId, RuleSelector};
use crate::analyzer::scope::Scope;
use crate::context::AnalysisContext;
use crate::errors::{AnalyzerError, Result};
use crate::expr::Expression;
use crate::expr::column_expr::{ColumnExpr, UnresolvedColumnExpr};
use crate::logical::operator::LogicalOperator;
use crate::logical::schema::ColumnSchema;
use crate::transform::Transformed;
use crate::transform::plan::{transform_node_expressions_up, transform_with_context};

/// Binds column references to positions in the row layout.
///
/// References are looked up in the node's inputs first, then in the enclosing
/// scope from the innermost frame out. Nodes are skipped until all of their
/// inputs are resolved.
#[derive(Debug, Clone, Copy)]
pub struct ResolveColumns;

impl AnalyzerRule for ResolveColumns {
    fn id(&self) -> RuleId {
        RuleId::ResolveColumns
    }

    fn apply(
        &self,
        _analyzer: &Analyzer,
        _ctx: &AnalysisContext,
        plan: LogicalOperator,
        scope: &Scope,
        _selector: &RuleSelector,
    ) -> Result<Transformed<LogicalOperator>> {
        transform_with_context(plan, &mut within_query, &mut |_, node| {
            if node.expressions().is_none() || !node.children().iter().all(|c| c.resolved()) {
                return Ok(Transformed::same(node));
            }

            let inputs: Vec<ColumnSchema> =
                node.children().iter().flat_map(|c| c.schema()).collect();

            transform_node_expressions_up(node, &mut |_, expr| match expr {
                Expression::UnresolvedColumn(reference) => {
                    let column = resolve_column(&reference, &inputs, scope)?;
                    trace!(%reference, %column, "resolved column");
                    Ok(Transformed::new_tree(Expression::Column(column)))
                }
                other => Ok(Transformed::same(other)),
            })
        })
    }
}

fn resolve_column(
    reference: &UnresolvedColumnExpr,
    inputs: &[ColumnSchema],
    scope: &Scope,
) -> Result<ColumnExpr> {
    let found = inputs
        .iter()
        .enumerate()
        .find(|(_, col)| reference.matches(&col.source, &col.name));
    if let Some((idx, col)) = found {
        return Ok(ColumnExpr::new(
            scope.len() + idx,
            col.source.clone(),
            col.name.clone(),
            col.datatype,
        ));
    }

    if let Some(column) = scope.resolve_column(reference) {
        return Ok(column);
    }

    Err(match &reference.table {
        Some(table) => AnalyzerError::TableColumnNotFound {
            table: table.clone(),
            column: reference.name.clone(),
        },
        None => AnalyzerError::ColumnNotFound {
            column: reference.name.clone(),
        },
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::catalog::MemoryCatalog;
    use crate::config::AnalyzerConfig;
    use crate::expr::scalar::DataType;
    use crate::expr::{col, column, eq, lit, qualified_col};
    use crate::logical::builder::PlanBuilder;
    use crate::logical::logical_join::JoinType;
    use crate::transform::TreeIdentity;

    fn apply(plan: LogicalOperator, scope: &Scope) -> Result<Transformed<LogicalOperator>> {
        let analyzer = Analyzer::new(Arc::new(MemoryCatalog::new()), AnalyzerConfig::default());
        ResolveColumns.apply(
            &analyzer,
            &AnalysisContext::new(),
            plan,
            scope,
            &RuleSelector::all(),
        )
    }

    fn t1() -> PlanBuilder {
        PlanBuilder::scan("t1", [("a", DataType::Int64), ("b", DataType::Utf8)])
    }

    #[test]
    fn resolves_against_inputs() {
        let right = PlanBuilder::scan("t2", [("c", DataType::Int64)]).build();
        let plan = t1()
            .join(right, JoinType::Inner, Some(eq(col("a"), col("c"))))
            .build();

        let out = apply(plan, &Scope::empty()).unwrap();
        assert_eq!(TreeIdentity::NewTree, out.identity);

        let expected = t1()
            .join(
                PlanBuilder::scan("t2", [("c", DataType::Int64)]).build(),
                JoinType::Inner,
                Some(eq(
                    column(0, "t1", "a", DataType::Int64),
                    column(2, "t2", "c", DataType::Int64),
                )),
            )
            .build();
        assert_eq!(expected, out.data);
    }

    #[test]
    fn outer_references_come_from_scope() {
        let outer = t1().filter(lit(true)).build();
        let scope = Scope::empty().new_scope(&outer);

        let plan = PlanBuilder::scan("t2", [("c", DataType::Int64)])
            .filter(eq(col("c"), qualified_col("t1", "b")))
            .build();
        let out = apply(plan, &scope).unwrap();

        let expected = PlanBuilder::scan("t2", [("c", DataType::Int64)])
            .filter(eq(
                column(2, "t2", "c", DataType::Int64),
                column(1, "t1", "b", DataType::Utf8),
            ))
            .build();
        assert_eq!(expected, out.data);
    }

    #[test]
    fn missing_columns() {
        let err = apply(t1().project([col("z")]).build(), &Scope::empty()).unwrap_err();
        assert!(matches!(err, AnalyzerError::ColumnNotFound { column } if column == "z"));

        let err = apply(
            t1().project([qualified_col("t9", "a")]).build(),
            &Scope::empty(),
        )
        .unwrap_err();
        assert!(matches!(err, AnalyzerError::TableColumnNotFound { table, .. } if table == "t9"));
    }

    #[test]
    fn waits_for_unresolved_inputs() {
        let plan = PlanBuilder::unresolved_table("t1")
            .filter(eq(col("a"), lit(1)))
            .build();

        let out = apply(plan.clone(), &Scope::empty()).unwrap();
        assert_eq!(TreeIdentity::SameTree, out.identity);
        assert_eq!(plan, out.data);
    }

    #[test]
    fn derived_table_input_not_touched() {
        let plan = t1()
            .project([col("a")])
            .subquery_alias("sq", ["x"])
            .build();

        let out = apply(plan.clone(), &Scope::empty()).unwrap();
        assert_eq!(TreeIdentity::SameTree, out.identity);
        assert_eq!(plan, out.data);
    }
}
