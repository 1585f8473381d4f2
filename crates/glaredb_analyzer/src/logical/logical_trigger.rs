use super::operator::{LogicalNode, Node};
use super::schema::ColumnSchema;
use crate::explain::explainable::{ExplainConfig, ExplainEntry, Explainable};

/// Body of a trigger, a sequence of statements run for every affected row.
///
/// Each child is one statement. Trigger bodies are analyzed on their own, so
/// analysis of the enclosing statement leaves them alone.
#[derive(Debug, Clone, PartialEq)]
pub struct LogicalTriggerBlock {
    pub name: String,
}

impl Explainable for LogicalTriggerBlock {
    fn explain_entry(&self, _conf: ExplainConfig) -> ExplainEntry {
        ExplainEntry::new("TriggerBlock").with_value("name", &self.name)
    }
}

impl LogicalNode for Node<LogicalTriggerBlock> {
    fn name(&self) -> &'static str {
        "TriggerBlock"
    }

    fn output_schema(&self) -> Vec<ColumnSchema> {
        Vec::new()
    }
}
