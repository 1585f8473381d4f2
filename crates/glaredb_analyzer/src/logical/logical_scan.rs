use super::operator::{LogicalNode, Node};
use super::schema::ColumnSchema;
use crate::catalog::TableColumn;
use crate::explain::explainable::{ExplainConfig, ExplainEntry, Explainable};

/// Scan of a table found in the catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct LogicalScan {
    pub table: String,
    pub columns: Vec<TableColumn>,
}

impl Explainable for LogicalScan {
    fn explain_entry(&self, conf: ExplainConfig) -> ExplainEntry {
        let ent = ExplainEntry::new("Scan").with_value("table", &self.table);
        if conf.verbose {
            ent.with_values("columns", self.columns.iter().map(|c| &c.name))
        } else {
            ent
        }
    }
}

impl LogicalNode for Node<LogicalScan> {
    fn name(&self) -> &'static str {
        "Scan"
    }

    fn output_schema(&self) -> Vec<ColumnSchema> {
        self.node
            .columns
            .iter()
            .map(|c| ColumnSchema::new(&c.name, &self.node.table, c.datatype))
            .collect()
    }
}
