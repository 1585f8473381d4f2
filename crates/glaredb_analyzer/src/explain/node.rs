use std::fmt;

use serde::{Deserialize, Serialize};

use super::explainable::{ExplainConfig, ExplainEntry, Explainable};
use crate::logical::operator::LogicalOperator;
use crate::transform::inspect::subqueries_in_expr;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ExplainNode {
    pub entry: ExplainEntry,
    pub children: Vec<ExplainNode>,
}

impl ExplainNode {
    pub fn new_from_logical_plan(verbose: bool, root: &LogicalOperator) -> Self {
        let config = ExplainConfig { verbose };
        Self::walk_logical(config, root)
    }

    fn walk_logical(config: ExplainConfig, plan: &LogicalOperator) -> Self {
        let entry = plan.explain_entry(config);

        let mut children: Vec<_> = plan
            .children()
            .iter()
            .map(|c| Self::walk_logical(config, c))
            .collect();

        // Subquery plans hang off the node owning the expression.
        if let Some(exprs) = plan.expressions() {
            for expr in exprs {
                for subquery in subqueries_in_expr(expr) {
                    children.push(ExplainNode {
                        entry: ExplainEntry::new("Subquery")
                            .with_value("cacheable", subquery.cacheable),
                        children: vec![Self::walk_logical(config, &subquery.query)],
                    });
                }
            }
        }

        ExplainNode { entry, children }
    }

    /// Render the tree as indented text, one node per line.
    pub fn render(&self) -> String {
        self.to_string()
    }

    fn fmt_indented(&self, indent: usize, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:indent$}{}", "", self.entry, indent = indent * 2)?;
        for child in &self.children {
            child.fmt_indented(indent + 1, f)?;
        }
        Ok(())
    }
}

impl fmt::Display for ExplainNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_indented(0, f)
    }
}
