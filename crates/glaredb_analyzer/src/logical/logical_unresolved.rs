use super::operator::{LogicalNode, Node};
use super::schema::ColumnSchema;
use crate::explain::explainable::{ExplainConfig, ExplainEntry, Explainable};

/// Table referenced by name that hasn't been looked up in the catalog yet.
#[derive(Debug, Clone, PartialEq)]
pub struct LogicalUnresolvedTable {
    pub name: String,
}

impl Explainable for LogicalUnresolvedTable {
    fn explain_entry(&self, _conf: ExplainConfig) -> ExplainEntry {
        ExplainEntry::new("UnresolvedTable").with_value("name", &self.name)
    }
}

impl LogicalNode for Node<LogicalUnresolvedTable> {
    fn name(&self) -> &'static str {
        "UnresolvedTable"
    }

    fn node_resolved(&self) -> bool {
        false
    }

    fn output_schema(&self) -> Vec<ColumnSchema> {
        Vec::new()
    }
}
