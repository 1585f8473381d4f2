use super::operator::{LogicalNode, Node};
use super::schema::ColumnSchema;
use crate::explain::explainable::{ExplainConfig, ExplainEntry, Explainable};

/// Removes the leading scope columns from rows flowing out of its input.
#[derive(Debug, Clone, PartialEq)]
pub struct LogicalStripRow {
    pub num_columns: usize,
}

impl Explainable for LogicalStripRow {
    fn explain_entry(&self, _conf: ExplainConfig) -> ExplainEntry {
        ExplainEntry::new("StripRow").with_value("num_columns", self.num_columns)
    }
}

impl LogicalNode for Node<LogicalStripRow> {
    fn name(&self) -> &'static str {
        "StripRow"
    }

    fn output_schema(&self) -> Vec<ColumnSchema> {
        self.get_children_schema()
    }
}
