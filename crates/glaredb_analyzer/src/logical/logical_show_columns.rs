use super::operator::{LogicalNode, Node};
use super::schema::ColumnSchema;
use crate::explain::explainable::{ExplainConfig, ExplainEntry, Explainable};
use crate::expr::scalar::DataType;

/// `SHOW COLUMNS` for a table or view.
#[derive(Debug, Clone, PartialEq)]
pub struct LogicalShowColumns {
    /// Schema to describe.
    ///
    /// Set during analysis for views, whose schema is only known once the
    /// view's query is resolved. When None, the schema of the input is used.
    pub target_schema: Option<Vec<ColumnSchema>>,
}

impl Explainable for LogicalShowColumns {
    fn explain_entry(&self, _conf: ExplainConfig) -> ExplainEntry {
        let ent = ExplainEntry::new("ShowColumns");
        match &self.target_schema {
            Some(schema) => ent.with_values("target_schema", schema),
            None => ent,
        }
    }
}

impl Node<LogicalShowColumns> {
    pub fn with_target_schema(mut self, schema: Vec<ColumnSchema>) -> Self {
        self.node.target_schema = Some(schema);
        self
    }

    /// The schema that will be described.
    pub fn described_schema(&self) -> Vec<ColumnSchema> {
        match &self.node.target_schema {
            Some(schema) => schema.clone(),
            None => self.get_children_schema(),
        }
    }
}

impl LogicalNode for Node<LogicalShowColumns> {
    fn name(&self) -> &'static str {
        "ShowColumns"
    }

    fn output_schema(&self) -> Vec<ColumnSchema> {
        vec![
            ColumnSchema::new("Field", "", DataType::Utf8),
            ColumnSchema::new("Type", "", DataType::Utf8),
        ]
    }
}
