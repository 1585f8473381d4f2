use super::operator::{ExpressionNode, LogicalNode, Node};
use super::schema::{ColumnSchema, ScopeColumn};
use crate::errors::{Result, internal};
use crate::explain::explainable::{ExplainConfig, ExplainEntry, Explainable};
use crate::expr::Expression;

#[derive(Debug, Clone, PartialEq)]
pub struct LogicalProject {
    pub projections: Vec<Expression>,
}

impl Explainable for LogicalProject {
    fn explain_entry(&self, _conf: ExplainConfig) -> ExplainEntry {
        ExplainEntry::new("Project").with_values("projections", &self.projections)
    }
}

impl Node<LogicalProject> {
    /// Columns defined by aliased expressions in the select list.
    ///
    /// Subqueries written in the same select list can reference these.
    pub fn alias_columns(&self) -> Vec<ScopeColumn> {
        self.node
            .projections
            .iter()
            .filter(|expr| matches!(expr, Expression::Alias(_)))
            .map(|expr| ScopeColumn {
                column: ColumnSchema::new(expr.output_name(), "", expr.datatype()),
                is_alias: true,
            })
            .collect()
    }
}

impl LogicalNode for Node<LogicalProject> {
    fn name(&self) -> &'static str {
        "Project"
    }

    fn node_resolved(&self) -> bool {
        self.node.projections.iter().all(|expr| expr.resolved())
    }

    fn output_schema(&self) -> Vec<ColumnSchema> {
        self.node
            .projections
            .iter()
            .map(|expr| {
                ColumnSchema::new(expr.output_name(), expr.output_source(), expr.datatype())
            })
            .collect()
    }
}

impl ExpressionNode for Node<LogicalProject> {
    fn expressions(&self) -> Vec<&Expression> {
        self.node.projections.iter().collect()
    }

    fn with_expressions(mut self, exprs: Vec<Expression>) -> Result<Self> {
        if exprs.len() != self.node.projections.len() {
            return Err(internal!(
                "Project expects {} expressions, got {}",
                self.node.projections.len(),
                exprs.len()
            ));
        }
        self.node.projections = exprs;
        Ok(self)
    }
}
