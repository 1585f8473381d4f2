use super::operator::{LogicalNode, Node};
use super::schema::ColumnSchema;
use crate::explain::explainable::{ExplainConfig, ExplainEntry, Explainable};

/// A derived table, `(SELECT ...) AS name (col, ...)`.
///
/// The input is analyzed as its own query one level deeper than the query
/// containing it.
#[derive(Debug, Clone, PartialEq)]
pub struct LogicalSubqueryAlias {
    pub name: String,
    /// Column names declared with the alias, empty if none were given.
    pub columns: Vec<String>,
    /// If the subquery may reference columns of the queries enclosing the one
    /// it's defined in. Set during analysis.
    pub outer_scope_visibility: bool,
}

impl Explainable for LogicalSubqueryAlias {
    fn explain_entry(&self, conf: ExplainConfig) -> ExplainEntry {
        let mut ent = ExplainEntry::new("SubqueryAlias").with_value("name", &self.name);
        if !self.columns.is_empty() {
            ent = ent.with_values("columns", &self.columns);
        }
        ent.with_verbose_value(conf, "outer_scope_visibility", self.outer_scope_visibility)
    }
}

impl Node<LogicalSubqueryAlias> {
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.node.name = name.into();
        self
    }
}

impl LogicalNode for Node<LogicalSubqueryAlias> {
    fn name(&self) -> &'static str {
        "SubqueryAlias"
    }

    fn output_schema(&self) -> Vec<ColumnSchema> {
        let mut schema = self.get_children_schema();
        // A mismatched column count is reported during analysis, keep the
        // input names until then.
        let rename = schema.len() == self.node.columns.len();
        for (idx, col) in schema.iter_mut().enumerate() {
            col.source = self.node.name.clone();
            if rename {
                col.name = self.node.columns[idx].clone();
            }
        }
        schema
    }
}
