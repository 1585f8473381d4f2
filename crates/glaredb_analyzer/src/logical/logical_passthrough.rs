//! Wrappers that only matter at the top of a query.
//!
//! None of these change the rows produced by their input. They are stripped
//! from the plans of subqueries after analysis.

use super::operator::{LogicalNode, Node};
use super::schema::ColumnSchema;
use crate::explain::explainable::{ExplainConfig, ExplainEntry, Explainable};

/// Tracks the query in the process list.
#[derive(Debug, Clone, PartialEq)]
pub struct LogicalQueryProcess;

impl Explainable for LogicalQueryProcess {
    fn explain_entry(&self, _conf: ExplainConfig) -> ExplainEntry {
        ExplainEntry::new("QueryProcess")
    }
}

impl LogicalNode for Node<LogicalQueryProcess> {
    fn name(&self) -> &'static str {
        "QueryProcess"
    }

    fn output_schema(&self) -> Vec<ColumnSchema> {
        self.get_children_schema()
    }
}

/// Begins a transaction before running its input.
#[derive(Debug, Clone, PartialEq)]
pub struct LogicalStartTransaction;

impl Explainable for LogicalStartTransaction {
    fn explain_entry(&self, _conf: ExplainConfig) -> ExplainEntry {
        ExplainEntry::new("StartTransaction")
    }
}

impl LogicalNode for Node<LogicalStartTransaction> {
    fn name(&self) -> &'static str {
        "StartTransaction"
    }

    fn output_schema(&self) -> Vec<ColumnSchema> {
        self.get_children_schema()
    }
}

/// Commits the implicit transaction once its input completes.
#[derive(Debug, Clone, PartialEq)]
pub struct LogicalTransactionCommit;

impl Explainable for LogicalTransactionCommit {
    fn explain_entry(&self, _conf: ExplainConfig) -> ExplainEntry {
        ExplainEntry::new("TransactionCommit")
    }
}

impl LogicalNode for Node<LogicalTransactionCommit> {
    fn name(&self) -> &'static str {
        "TransactionCommit"
    }

    fn output_schema(&self) -> Vec<ColumnSchema> {
        self.get_children_schema()
    }
}
