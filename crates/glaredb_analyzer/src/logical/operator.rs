use super::logical_cached_results::LogicalCachedResults;
use super::logical_filter::LogicalFilter;
use super::logical_join::LogicalJoin;
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
use super::schema::{ColumnSchema, ScopeColumn};
use crate::errors::{AnalyzerError, Result, internal};
use crate::explain::explainable::{ExplainConfig, ExplainEntry, Explainable};
use crate::expr::Expression;

/// Common operations across all logical nodes in a plan.
///
/// For individual operators, this should be implemented on `Node<T>` and not
/// `T`.
pub trait LogicalNode {
    /// Name of the operator.
    fn name(&self) -> &'static str;

    /// If the node itself is resolved. Children are not checked.
    fn node_resolved(&self) -> bool {
        true
    }

    /// Columns produced by this operator.
    fn output_schema(&self) -> Vec<ColumnSchema>;
}

/// Operators that hold scalar expressions.
pub trait ExpressionNode: Sized {
    /// Expressions of this node, in a stable order.
    fn expressions(&self) -> Vec<&Expression>;

    /// Replace the expressions of this node.
    ///
    /// `exprs` must be the same length and in the same order as returned by
    /// `expressions`.
    fn with_expressions(self, exprs: Vec<Expression>) -> Result<Self>;
}

/// Wrapper around nodes in the logical plan.
#[derive(Debug, Clone, PartialEq)]
pub struct Node<N> {
    /// Node specific logic.
    pub node: N,
    /// Inputs to this node.
    pub children: Vec<LogicalOperator>,
}

impl<N> Node<N> {
    pub fn new(node: N, children: Vec<LogicalOperator>) -> Self {
        Node { node, children }
    }

    pub fn take_one_child_exact(&mut self) -> Result<LogicalOperator> {
        if self.children.len() != 1 {
            return Err(internal!(
                "Expected 1 child to operator, have {}",
                self.children.len()
            ));
        }
        self.children
            .pop()
            .ok_or_else(|| internal!("Missing child for operator"))
    }

    /// Output columns of every child, in child order.
    pub fn get_children_schema(&self) -> Vec<ColumnSchema> {
        self.children.iter().flat_map(|c| c.schema()).collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LogicalOperator {
    /// Placeholder left behind when an operator is taken out of a tree.
    Invalid,
    UnresolvedTable(Node<LogicalUnresolvedTable>),
    Scan(Node<LogicalScan>),
    TableAlias(Node<LogicalTableAlias>),
    SubqueryAlias(Node<LogicalSubqueryAlias>),
    Filter(Node<LogicalFilter>),
    Project(Node<LogicalProject>),
    Join(Node<LogicalJoin>),
    CachedResults(Node<LogicalCachedResults>),
    StripRow(Node<LogicalStripRow>),
    QueryProcess(Node<LogicalQueryProcess>),
    StartTransaction(Node<LogicalStartTransaction>),
    TransactionCommit(Node<LogicalTransactionCommit>),
    TriggerBlock(Node<LogicalTriggerBlock>),
    ShowColumns(Node<LogicalShowColumns>),
}

impl LogicalOperator {
    /// Take the operator, leaving an invalid placeholder in its place.
    pub fn take(&mut self) -> Self {
        std::mem::replace(self, Self::Invalid)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Invalid => "Invalid",
            Self::UnresolvedTable(n) => n.name(),
            Self::Scan(n) => n.name(),
            Self::TableAlias(n) => n.name(),
            Self::SubqueryAlias(n) => n.name(),
            Self::Filter(n) => n.name(),
            Self::Project(n) => n.name(),
            Self::Join(n) => n.name(),
            Self::CachedResults(n) => n.name(),
            Self::StripRow(n) => n.name(),
            Self::QueryProcess(n) => n.name(),
            Self::StartTransaction(n) => n.name(),
            Self::TransactionCommit(n) => n.name(),
            Self::TriggerBlock(n) => n.name(),
            Self::ShowColumns(n) => n.name(),
        }
    }

    fn children_vec(&self) -> Option<&Vec<LogicalOperator>> {
        Some(match self {
            Self::Invalid => return None,
            Self::UnresolvedTable(n) => &n.children,
            Self::Scan(n) => &n.children,
            Self::TableAlias(n) => &n.children,
            Self::SubqueryAlias(n) => &n.children,
            Self::Filter(n) => &n.children,
            Self::Project(n) => &n.children,
            Self::Join(n) => &n.children,
            Self::CachedResults(n) => &n.children,
            Self::StripRow(n) => &n.children,
            Self::QueryProcess(n) => &n.children,
            Self::StartTransaction(n) => &n.children,
            Self::TransactionCommit(n) => &n.children,
            Self::TriggerBlock(n) => &n.children,
            Self::ShowColumns(n) => &n.children,
        })
    }

    fn children_vec_mut(&mut self) -> Option<&mut Vec<LogicalOperator>> {
        Some(match self {
            Self::Invalid => return None,
            Self::UnresolvedTable(n) => &mut n.children,
            Self::Scan(n) => &mut n.children,
            Self::TableAlias(n) => &mut n.children,
            Self::SubqueryAlias(n) => &mut n.children,
            Self::Filter(n) => &mut n.children,
            Self::Project(n) => &mut n.children,
            Self::Join(n) => &mut n.children,
            Self::CachedResults(n) => &mut n.children,
            Self::StripRow(n) => &mut n.children,
            Self::QueryProcess(n) => &mut n.children,
            Self::StartTransaction(n) => &mut n.children,
            Self::TransactionCommit(n) => &mut n.children,
            Self::TriggerBlock(n) => &mut n.children,
            Self::ShowColumns(n) => &mut n.children,
        })
    }

    pub fn children(&self) -> &[LogicalOperator] {
        match self.children_vec() {
            Some(children) => children.as_slice(),
            None => &[],
        }
    }

    pub fn children_mut(&mut self) -> &mut [LogicalOperator] {
        match self.children_vec_mut() {
            Some(children) => children.as_mut_slice(),
            None => &mut [],
        }
    }

    /// Take all children out of this operator, leaving it with none.
    ///
    /// Must be followed up with `with_new_children`.
    pub fn take_children(&mut self) -> Vec<LogicalOperator> {
        self.children_vec_mut()
            .map(std::mem::take)
            .unwrap_or_default()
    }

    /// Number of children this operator requires, None if variable.
    fn expected_children(&self) -> Option<usize> {
        match self {
            Self::Invalid | Self::UnresolvedTable(_) | Self::Scan(_) => Some(0),
            Self::Join(_) => Some(2),
            Self::TriggerBlock(_) => None,
            Self::TableAlias(_)
            | Self::SubqueryAlias(_)
            | Self::Filter(_)
            | Self::Project(_)
            | Self::CachedResults(_)
            | Self::StripRow(_)
            | Self::QueryProcess(_)
            | Self::StartTransaction(_)
            | Self::TransactionCommit(_)
            | Self::ShowColumns(_) => Some(1),
        }
    }

    /// Rebuild this operator with a new set of children.
    pub fn with_new_children(mut self, children: Vec<LogicalOperator>) -> Result<Self> {
        if let Some(expected) = self.expected_children() {
            if expected != children.len() {
                return Err(internal!(
                    "{} expects {expected} children, got {}",
                    self.name(),
                    children.len()
                ));
            }
        }

        match self.children_vec_mut() {
            Some(existing) => *existing = children,
            None if children.is_empty() => (),
            None => return Err(internal!("Cannot set children on an invalid operator")),
        }

        Ok(self)
    }

    /// If this operator by itself is resolved, ignoring children.
    pub fn node_resolved(&self) -> bool {
        match self {
            Self::Invalid => false,
            Self::UnresolvedTable(n) => n.node_resolved(),
            Self::Scan(n) => n.node_resolved(),
            Self::TableAlias(n) => n.node_resolved(),
            Self::SubqueryAlias(n) => n.node_resolved(),
            Self::Filter(n) => n.node_resolved(),
            Self::Project(n) => n.node_resolved(),
            Self::Join(n) => n.node_resolved(),
            Self::CachedResults(n) => n.node_resolved(),
            Self::StripRow(n) => n.node_resolved(),
            Self::QueryProcess(n) => n.node_resolved(),
            Self::StartTransaction(n) => n.node_resolved(),
            Self::TransactionCommit(n) => n.node_resolved(),
            Self::TriggerBlock(n) => n.node_resolved(),
            Self::ShowColumns(n) => n.node_resolved(),
        }
    }

    /// If this operator and everything below it is resolved.
    pub fn resolved(&self) -> bool {
        self.node_resolved() && self.children().iter().all(|c| c.resolved())
    }

    /// Columns produced by this operator.
    pub fn schema(&self) -> Vec<ColumnSchema> {
        match self {
            Self::Invalid => Vec::new(),
            Self::UnresolvedTable(n) => n.output_schema(),
            Self::Scan(n) => n.output_schema(),
            Self::TableAlias(n) => n.output_schema(),
            Self::SubqueryAlias(n) => n.output_schema(),
            Self::Filter(n) => n.output_schema(),
            Self::Project(n) => n.output_schema(),
            Self::Join(n) => n.output_schema(),
            Self::CachedResults(n) => n.output_schema(),
            Self::StripRow(n) => n.output_schema(),
            Self::QueryProcess(n) => n.output_schema(),
            Self::StartTransaction(n) => n.output_schema(),
            Self::TransactionCommit(n) => n.output_schema(),
            Self::TriggerBlock(n) => n.output_schema(),
            Self::ShowColumns(n) => n.output_schema(),
        }
    }

    /// Columns this operator contributes to the scope of a subquery expression
    /// written in one of its expressions.
    ///
    /// These are the columns of the operator's inputs followed by any
    /// expression aliases the operator defines.
    pub fn scope_columns(&self) -> Vec<ScopeColumn> {
        let mut cols: Vec<_> = self
            .children()
            .iter()
            .flat_map(|c| c.schema())
            .map(|column| ScopeColumn {
                column,
                is_alias: false,
            })
            .collect();
        if let Self::Project(project) = self {
            cols.extend(project.alias_columns());
        }
        cols
    }

    /// If this operator is only meaningful at the top of a query.
    pub fn is_passthrough(&self) -> bool {
        matches!(
            self,
            Self::QueryProcess(_) | Self::StartTransaction(_) | Self::TransactionCommit(_)
        )
    }

    /// Expressions held by this operator, None if the operator can't hold
    /// expressions.
    pub fn expressions(&self) -> Option<Vec<&Expression>> {
        match self {
            Self::Filter(n) => Some(n.expressions()),
            Self::Project(n) => Some(n.expressions()),
            Self::Join(n) => Some(n.expressions()),
            _ => None,
        }
    }

    /// Rebuild this operator with new expressions.
    pub fn with_expressions(self, exprs: Vec<Expression>) -> Result<Self> {
        Ok(match self {
            Self::Filter(n) => Self::Filter(n.with_expressions(exprs)?),
            Self::Project(n) => Self::Project(n.with_expressions(exprs)?),
            Self::Join(n) => Self::Join(n.with_expressions(exprs)?),
            other => {
                return Err(AnalyzerError::Unsupported(format!(
                    "{} does not hold expressions",
                    other.name()
                )));
            }
        })
    }
}

impl Explainable for LogicalOperator {
    fn explain_entry(&self, conf: ExplainConfig) -> ExplainEntry {
        match self {
            Self::Invalid => ExplainEntry::new("Invalid"),
            Self::UnresolvedTable(n) => n.node.explain_entry(conf),
            Self::Scan(n) => n.node.explain_entry(conf),
            Self::TableAlias(n) => n.node.explain_entry(conf),
            Self::SubqueryAlias(n) => n.node.explain_entry(conf),
            Self::Filter(n) => n.node.explain_entry(conf),
            Self::Project(n) => n.node.explain_entry(conf),
            Self::Join(n) => n.node.explain_entry(conf),
            Self::CachedResults(n) => n.node.explain_entry(conf),
            Self::StripRow(n) => n.node.explain_entry(conf),
            Self::QueryProcess(n) => n.node.explain_entry(conf),
            Self::StartTransaction(n) => n.node.explain_entry(conf),
            Self::TransactionCommit(n) => n.node.explain_entry(conf),
            Self::TriggerBlock(n) => n.node.explain_entry(conf),
            Self::ShowColumns(n) => n.node.explain_entry(conf),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::scalar::DataType;
    use crate::expr::{alias, col, column, eq, lit};
    use crate::logical::builder::PlanBuilder;
    use crate::logical::logical_join::JoinType;

    #[test]
    fn join_schema_concatenates_children() {
        let plan = PlanBuilder::scan("t1", [("a", DataType::Int64)])
            .join(
                PlanBuilder::scan("t2", [("b", DataType::Utf8)]).build(),
                JoinType::Inner,
                None,
            )
            .build();

        assert_eq!(
            vec![
                ColumnSchema::new("a", "t1", DataType::Int64),
                ColumnSchema::new("b", "t2", DataType::Utf8),
            ],
            plan.schema()
        );
    }

    #[test]
    fn table_alias_requalifies() {
        let plan = PlanBuilder::scan("t1", [("a", DataType::Int64)])
            .alias("x")
            .build();
        assert_eq!(vec![ColumnSchema::new("a", "x", DataType::Int64)], plan.schema());
    }

    #[test]
    fn subquery_alias_renames_columns() {
        let plan = PlanBuilder::scan("t1", [("a", DataType::Int64)])
            .project([column(0, "t1", "a", DataType::Int64)])
            .subquery_alias("sq", ["z"])
            .build();
        assert_eq!(vec![ColumnSchema::new("z", "sq", DataType::Int64)], plan.schema());
    }

    #[test]
    fn with_new_children_checks_arity() {
        let plan = PlanBuilder::scan("t1", [("a", DataType::Int64)])
            .filter(eq(col("a"), lit(1)))
            .build();
        let err = plan.with_new_children(Vec::new()).unwrap_err();
        assert!(matches!(err, AnalyzerError::Internal(_)));
    }

    #[test]
    fn take_children_then_rebuild() {
        let mut plan = PlanBuilder::scan("t1", [("a", DataType::Int64)])
            .filter(eq(col("a"), lit(1)))
            .build();
        let expected = plan.clone();

        let children = plan.take_children();
        assert_eq!(1, children.len());
        assert!(plan.children().is_empty());

        let plan = plan.with_new_children(children).unwrap();
        assert_eq!(expected, plan);
    }

    #[test]
    fn take_leaves_invalid() {
        let mut plan = PlanBuilder::scan("t1", [("a", DataType::Int64)]).build();
        let taken = plan.take();
        assert_eq!("Scan", taken.name());
        assert_eq!(LogicalOperator::Invalid, plan);
        assert!(plan.children().is_empty());
        assert!(!plan.resolved());
    }

    #[test]
    fn resolution_is_recursive() {
        let plan = PlanBuilder::unresolved_table("t1")
            .filter(eq(lit(1), lit(1)))
            .build();
        assert!(plan.node_resolved());
        assert!(!plan.resolved());
    }

    #[test]
    fn scope_columns_include_aliases() {
        let plan = PlanBuilder::scan("t1", [("a", DataType::Int64)])
            .project([
                column(0, "t1", "a", DataType::Int64),
                alias(lit(1), "one"),
            ])
            .build();

        let cols = plan.scope_columns();
        assert_eq!(2, cols.len());
        assert!(!cols[0].is_alias);
        assert_eq!("a", cols[0].column.name);
        assert!(cols[1].is_alias);
        assert_eq!("one", cols[1].column.name);
    }

    #[test]
    fn only_expression_nodes_hold_expressions() {
        let scan = PlanBuilder::scan("t1", [("a", DataType::Int64)]).build();
        assert!(scan.expressions().is_none());
        assert!(matches!(
            scan.with_expressions(vec![lit(1)]),
            Err(AnalyzerError::Unsupported(_))
        ));

        let cross = PlanBuilder::scan("t1", [("a", DataType::Int64)])
            .join(
                PlanBuilder::scan("t2", [("b", DataType::Int64)]).build(),
                JoinType::Cross,
                None,
            )
            .build();
        assert_eq!(Some(0), cross.expressions().map(|e| e.len()));
    }
}
