use std::fmt;

use super::operator::{ExpressionNode, LogicalNode, Node};
use super::schema::ColumnSchema;
use crate::errors::{Result, internal};
use crate::explain::explainable::{ExplainConfig, ExplainEntry, Explainable};
use crate::expr::Expression;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    /// Standard INNER join.
    Inner,
    /// Standard LEFT join.
    Left,
    /// Standard RIGHT join.
    Right,
    /// Cartesian product, no condition.
    Cross,
}

impl JoinType {
    /// Index of the child that drives the join.
    ///
    /// Every row of the primary side is read once, the other side may be read
    /// once per primary row.
    pub const fn primary_child(&self) -> usize {
        match self {
            JoinType::Right => 1,
            JoinType::Inner | JoinType::Left | JoinType::Cross => 0,
        }
    }
}

impl fmt::Display for JoinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inner => write!(f, "INNER"),
            Self::Left => write!(f, "LEFT"),
            Self::Right => write!(f, "RIGHT"),
            Self::Cross => write!(f, "CROSS"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogicalJoin {
    pub join_type: JoinType,
    pub condition: Option<Expression>,
    /// Number of columns from enclosing scopes prefixed to every row the join
    /// sees. Zero for joins at the top level of a query.
    pub scope_len: usize,
}

impl Explainable for LogicalJoin {
    fn explain_entry(&self, conf: ExplainConfig) -> ExplainEntry {
        let mut ent = ExplainEntry::new("Join").with_value("join_type", self.join_type);
        if let Some(condition) = &self.condition {
            ent = ent.with_value("condition", condition);
        }
        ent.with_verbose_value(conf, "scope_len", self.scope_len)
    }
}

impl Node<LogicalJoin> {
    pub fn with_scope_len(mut self, scope_len: usize) -> Self {
        self.node.scope_len = scope_len;
        self
    }
}

impl LogicalNode for Node<LogicalJoin> {
    fn name(&self) -> &'static str {
        "Join"
    }

    fn node_resolved(&self) -> bool {
        self.node
            .condition
            .as_ref()
            .map(|condition| condition.resolved())
            .unwrap_or(true)
    }

    fn output_schema(&self) -> Vec<ColumnSchema> {
        self.get_children_schema()
    }
}

impl ExpressionNode for Node<LogicalJoin> {
    fn expressions(&self) -> Vec<&Expression> {
        self.node.condition.iter().collect()
    }

    fn with_expressions(mut self, mut exprs: Vec<Expression>) -> Result<Self> {
        let expected = usize::from(self.node.condition.is_some());
        if exprs.len() != expected {
            return Err(internal!(
                "Join expects {expected} expressions, got {}",
                exprs.len()
            ));
        }
        self.node.condition = exprs.pop();
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primary_child_follows_join_type() {
        assert_eq!(0, JoinType::Inner.primary_child());
        assert_eq!(0, JoinType::Left.primary_child());
        assert_eq!(1, JoinType::Right.primary_child());
        assert_eq!(0, JoinType::Cross.primary_child());
    }
}
