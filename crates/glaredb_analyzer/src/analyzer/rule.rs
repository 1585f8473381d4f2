use std::fmt::{self, Debug};
use std::sync::Arc;

use super::Analyzer;
use super::scope::Scope;
use crate::context::AnalysisContext;
use crate::errors::Result;
use crate::logical::operator::LogicalOperator;
use crate::transform::Transformed;

/// Identifies a rule for selection and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleId {
    ResolveTables,
    FlattenTableAliases,
    ResolveColumns,
    ResolveSubqueries,
    FinalizeSubqueries,
    SetViewTargetSchema,
    CacheSubqueryResults,
    CacheSubqueryAliasesInJoins,
    SetJoinScopeLen,
    ValidateResolved,
    TrackProcess,
}

impl RuleId {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::ResolveTables => "resolve_tables",
            Self::FlattenTableAliases => "flatten_table_aliases",
            Self::ResolveColumns => "resolve_columns",
            Self::ResolveSubqueries => "resolve_subqueries",
            Self::FinalizeSubqueries => "finalize_subqueries",
            Self::SetViewTargetSchema => "set_view_target_schema",
            Self::CacheSubqueryResults => "cache_subquery_results",
            Self::CacheSubqueryAliasesInJoins => "cache_subquery_aliases_in_joins",
            Self::SetJoinScopeLen => "set_join_scope_len",
            Self::ValidateResolved => "validate_resolved",
            Self::TrackProcess => "track_process",
        }
    }

    /// Rules that only make sense once the plan they run on is final.
    ///
    /// These are skipped while a subquery is analyzed tentatively.
    pub const fn runs_after_resolution(&self) -> bool {
        matches!(
            self,
            Self::FinalizeSubqueries
                | Self::SetViewTargetSchema
                | Self::CacheSubqueryResults
                | Self::CacheSubqueryAliasesInJoins
                | Self::SetJoinScopeLen
                | Self::TrackProcess
        )
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A single rewrite applied to a plan by the analyzer.
///
/// Rules that run into nested queries analyze them through `analyzer` with an
/// extended scope, passing `selector` down.
pub trait AnalyzerRule: Debug + Sync + Send {
    fn id(&self) -> RuleId;

    fn apply(
        &self,
        analyzer: &Analyzer,
        ctx: &AnalysisContext,
        plan: LogicalOperator,
        scope: &Scope,
        selector: &RuleSelector,
    ) -> Result<Transformed<LogicalOperator>>;
}

/// Predicate deciding which rules run.
#[derive(Clone)]
pub struct RuleSelector {
    pred: Arc<dyn Fn(RuleId) -> bool + Sync + Send>,
}

impl Debug for RuleSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleSelector").finish_non_exhaustive()
    }
}

impl Default for RuleSelector {
    fn default() -> Self {
        Self::all()
    }
}

impl RuleSelector {
    pub fn new<F>(pred: F) -> Self
    where
        F: Fn(RuleId) -> bool + Sync + Send + 'static,
    {
        RuleSelector {
            pred: Arc::new(pred),
        }
    }

    /// Select every rule.
    pub fn all() -> Self {
        Self::new(|_| true)
    }

    /// Select only the given rules.
    pub fn only(ids: impl IntoIterator<Item = RuleId>) -> Self {
        let ids: Vec<_> = ids.into_iter().collect();
        Self::new(move |id| ids.contains(&id))
    }

    pub fn selects(&self, id: RuleId) -> bool {
        (self.pred)(id)
    }

    /// Narrow this selector by dropping the given rules.
    pub fn excluding(&self, ids: impl IntoIterator<Item = RuleId>) -> Self {
        let ids: Vec<_> = ids.into_iter().collect();
        let inner = self.pred.clone();
        Self::new(move |id| !ids.contains(&id) && inner(id))
    }

    /// Narrow this selector for tentatively analyzing a subquery expression.
    ///
    /// Finalizing, caching, join scope, and process tracking rules are
    /// disabled. The subquery is analyzed again with those once the outer
    /// query is resolved.
    pub fn for_subquery_resolution(&self) -> Self {
        let inner = self.pred.clone();
        Self::new(move |id| !id.runs_after_resolution() && inner(id))
    }
}
