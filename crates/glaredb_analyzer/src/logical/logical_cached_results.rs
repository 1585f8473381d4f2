use super::operator::{LogicalNode, Node};
use super::schema::ColumnSchema;
use crate::explain::explainable::{ExplainConfig, ExplainEntry, Explainable};

/// Materializes the output of its input on first execution and replays it on
/// every later execution within the same query.
#[derive(Debug, Clone, PartialEq)]
pub struct LogicalCachedResults;

impl Explainable for LogicalCachedResults {
    fn explain_entry(&self, _conf: ExplainConfig) -> ExplainEntry {
        ExplainEntry::new("CachedResults")
    }
}

impl LogicalNode for Node<LogicalCachedResults> {
    fn name(&self) -> &'static str {
        "CachedResults"
    }

    fn output_schema(&self) -> Vec<ColumnSchema> {
        self.get_children_schema()
    }
}
