use super::logical_cached_results::LogicalCachedResults;
use super::logical_filter::LogicalFilter;
use super::logical_join::{JoinType, LogicalJoin};
use super::logical_passthrough::{
    LogicalQueryProcess,
    LogicalStartTransaction,
    LogicalTransactionCommit,
};
use super::logical_project::LogicalProject;
use super::logical_scan::LogicalScan;
use super::logical_show_columns::LogicalShowColumns;
use super::logical_strip_row::LogicalStripRow;
use super::logical_subquery_alias::LogicalSubqueryAlias;
use super::logical_table_alias::LogicalTableAlias;
use super::logical_trigger::LogicalTriggerBlock;
use super::logical_unresolved::LogicalUnresolvedTable;
use super::operator::{LogicalOperator, Node};
use crate::catalog::TableColumn;
use crate::expr::Expression;
use crate::expr::scalar::DataType;

/// Builds plans bottom up.
///
/// Every method wraps the plan built so far as the (only) input of a new
/// operator.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanBuilder {
    plan: LogicalOperator,
}

impl From<LogicalOperator> for PlanBuilder {
    fn from(plan: LogicalOperator) -> Self {
        PlanBuilder { plan }
    }
}

impl PlanBuilder {
    /// Start from a scan of a table with known columns.
    pub fn scan<'a>(
        table: impl Into<String>,
        columns: impl IntoIterator<Item = (&'a str, DataType)>,
    ) -> Self {
        LogicalOperator::Scan(Node::new(
            LogicalScan {
                table: table.into(),
                columns: columns
                    .into_iter()
                    .map(|(name, datatype)| TableColumn::new(name, datatype))
                    .collect(),
            },
            Vec::new(),
        ))
        .into()
    }

    /// Start from a table that still needs to be looked up in the catalog.
    pub fn unresolved_table(name: impl Into<String>) -> Self {
        LogicalOperator::UnresolvedTable(Node::new(
            LogicalUnresolvedTable { name: name.into() },
            Vec::new(),
        ))
        .into()
    }

    /// A trigger body made up of the given statements.
    pub fn trigger_block(
        name: impl Into<String>,
        statements: impl IntoIterator<Item = LogicalOperator>,
    ) -> Self {
        LogicalOperator::TriggerBlock(Node::new(
            LogicalTriggerBlock { name: name.into() },
            statements.into_iter().collect(),
        ))
        .into()
    }

    pub fn filter(self, filter: Expression) -> Self {
        LogicalOperator::Filter(Node::new(LogicalFilter { filter }, vec![self.plan])).into()
    }

    pub fn project(self, projections: impl IntoIterator<Item = Expression>) -> Self {
        LogicalOperator::Project(Node::new(
            LogicalProject {
                projections: projections.into_iter().collect(),
            },
            vec![self.plan],
        ))
        .into()
    }

    /// Join the current plan (left) with `right`.
    pub fn join(
        self,
        right: LogicalOperator,
        join_type: JoinType,
        condition: Option<Expression>,
    ) -> Self {
        LogicalOperator::Join(Node::new(
            LogicalJoin {
                join_type,
                condition,
                scope_len: 0,
            },
            vec![self.plan, right],
        ))
        .into()
    }

    /// `<plan> AS <name>`
    pub fn alias(self, name: impl Into<String>) -> Self {
        LogicalOperator::TableAlias(Node::new(
            LogicalTableAlias { name: name.into() },
            vec![self.plan],
        ))
        .into()
    }

    /// Wrap the current plan as a derived table.
    pub fn subquery_alias<'a>(
        self,
        name: impl Into<String>,
        columns: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        LogicalOperator::SubqueryAlias(Node::new(
            LogicalSubqueryAlias {
                name: name.into(),
                columns: columns.into_iter().map(|c| c.to_string()).collect(),
                outer_scope_visibility: false,
            },
            vec![self.plan],
        ))
        .into()
    }

    pub fn cached(self) -> Self {
        LogicalOperator::CachedResults(Node::new(LogicalCachedResults, vec![self.plan])).into()
    }

    pub fn strip_row(self, num_columns: usize) -> Self {
        LogicalOperator::StripRow(Node::new(LogicalStripRow { num_columns }, vec![self.plan]))
            .into()
    }

    pub fn query_process(self) -> Self {
        LogicalOperator::QueryProcess(Node::new(LogicalQueryProcess, vec![self.plan])).into()
    }

    pub fn start_transaction(self) -> Self {
        LogicalOperator::StartTransaction(Node::new(LogicalStartTransaction, vec![self.plan]))
            .into()
    }

    pub fn transaction_commit(self) -> Self {
        LogicalOperator::TransactionCommit(Node::new(LogicalTransactionCommit, vec![self.plan]))
            .into()
    }

    /// `SHOW COLUMNS` over the current plan.
    pub fn show_columns(self) -> Self {
        LogicalOperator::ShowColumns(Node::new(
            LogicalShowColumns {
                target_schema: None,
            },
            vec![self.plan],
        ))
        .into()
    }

    pub fn build(self) -> LogicalOperator {
        self.plan
    }
}
