use super::operator::{LogicalNode, Node};
use super::schema::ColumnSchema;
use crate::explain::explainable::{ExplainConfig, ExplainEntry, Explainable};

/// `<table> AS <name>`, requalifies the columns of its input.
#[derive(Debug, Clone, PartialEq)]
pub struct LogicalTableAlias {
    pub name: String,
}

impl Explainable for LogicalTableAlias {
    fn explain_entry(&self, _conf: ExplainConfig) -> ExplainEntry {
        ExplainEntry::new("TableAlias").with_value("name", &self.name)
    }
}

impl LogicalNode for Node<LogicalTableAlias> {
    fn name(&self) -> &'static str {
        "TableAlias"
    }

    fn output_schema(&self) -> Vec<ColumnSchema> {
        self.get_children_schema()
            .into_iter()
            .map(|mut col| {
                col.source = self.node.name.clone();
                col
            })
            .collect()
    }
}
