//! Rules run by the default batches.

pub mod cache_subqueries;
pub mod flatten_table_aliases;
pub mod join_scope;
pub mod resolve_columns;
pub mod resolve_subqueries;
pub mod resolve_tables;
pub mod track_process;
pub mod validate;
pub mod view_target_schema;

pub use cache_subqueries::{CacheSubqueryAliasesInJoins, CacheSubqueryResults};
pub use flatten_table_aliases::FlattenTableAliases;
pub use join_scope::SetJoinScopeLen;
pub use resolve_columns::ResolveColumns;
pub use resolve_subqueries::{FinalizeSubqueries, ResolveSubqueries};
pub use resolve_tables::ResolveTables;
pub use track_process::TrackProcess;
pub use validate::ValidateResolved;
pub use view_target_schema::SetViewTargetSchema;

use crate::logical::operator::LogicalOperator;
use crate::transform::plan::SelectorContext;

/// Selector for walks that stay within a single query.
///
/// The input of a derived table is a query of its own, analyzed with its own
/// scope.
pub(crate) fn within_query(ctx: &SelectorContext) -> bool {
    !matches!(ctx.parent, LogicalOperator::SubqueryAlias(_))
}
