use super::operator::{ExpressionNode, LogicalNode, Node};
use super::schema::ColumnSchema;
use crate::errors::{Result, internal};
use crate::explain::explainable::{ExplainConfig, ExplainEntry, Explainable};
use crate::expr::Expression;

#[derive(Debug, Clone, PartialEq)]
pub struct LogicalFilter {
    pub filter: Expression,
}

impl Explainable for LogicalFilter {
    fn explain_entry(&self, _conf: ExplainConfig) -> ExplainEntry {
        ExplainEntry::new("Filter").with_value("predicate", &self.filter)
    }
}

impl LogicalNode for Node<LogicalFilter> {
    fn name(&self) -> &'static str {
        "Filter"
    }

    fn node_resolved(&self) -> bool {
        self.node.filter.resolved()
    }

    fn output_schema(&self) -> Vec<ColumnSchema> {
        self.get_children_schema()
    }
}

impl ExpressionNode for Node<LogicalFilter> {
    fn expressions(&self) -> Vec<&Expression> {
        vec![&self.node.filter]
    }

    fn with_expressions(mut self, mut exprs: Vec<Expression>) -> Result<Self> {
        if exprs.len() != 1 {
            return Err(internal!(
                "Filter expects 1 expression, got {}",
                exprs.len()
            ));
        }
        self.node.filter = exprs.swap_remove(0);
        Ok(self)
    }
}
