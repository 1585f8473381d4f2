//! Rule based analysis of logical plans.
//!
//! The analyzer runs ordered batches of rules over a plan until it's fully
//! resolved. Rules that run into nested queries (subquery expressions and
//! derived tables) analyze those recursively through the same analyzer with an
//! extended scope.

pub mod batch;
pub mod passthrough;
pub mod rule;
pub mod rules;
pub mod scope;

use std::sync::Arc;

use batch::{Batch, BatchPolicy};
use rule::{AnalyzerRule, RuleSelector};
use scope::Scope;
use tracing::{debug, trace};

use crate::catalog::Catalog;
use crate::config::AnalyzerConfig;
use crate::context::AnalysisContext;
use crate::errors::{AnalyzerError, Result};
use crate::logical::operator::LogicalOperator;
use crate::transform::{Transformed, TreeIdentity};

pub const DEFAULT_RULES: &str = "default-rules";
pub const ONCE_AFTER: &str = "once-after";
pub const VALIDATION: &str = "validation";
pub const AFTER_ALL: &str = "after-all";

/// Failed analysis along with the plan as it was before the failing rule.
#[derive(Debug)]
pub struct PartialAnalysis {
    pub plan: LogicalOperator,
    pub error: AnalyzerError,
}

impl From<PartialAnalysis> for AnalyzerError {
    fn from(partial: PartialAnalysis) -> Self {
        partial.error
    }
}

/// Which batches to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchSelector {
    All,
    /// Every batch up to and including the named one.
    Through(&'static str),
    /// The named batch and every batch after it.
    StartingAt(&'static str),
}

impl BatchSelector {
    fn select<'a>(&self, batches: &'a [Batch]) -> &'a [Batch] {
        let position = |name: &str| batches.iter().position(|b| b.name == name);
        match self {
            Self::All => batches,
            Self::Through(name) => match position(name) {
                Some(idx) => &batches[..=idx],
                None => batches,
            },
            Self::StartingAt(name) => match position(name) {
                Some(idx) => &batches[idx..],
                None => &[],
            },
        }
    }
}

/// The default batches, in the order they run.
pub fn default_batches() -> Vec<Batch> {
    use rules::*;

    vec![
        Batch::new(DEFAULT_RULES, BatchPolicy::Fixpoint, [
            Arc::new(ResolveTables) as Arc<dyn AnalyzerRule>,
            Arc::new(FlattenTableAliases),
            Arc::new(ResolveColumns),
            Arc::new(ResolveSubqueries),
        ]),
        Batch::new(ONCE_AFTER, BatchPolicy::Once, [
            Arc::new(FinalizeSubqueries) as Arc<dyn AnalyzerRule>,
            Arc::new(SetViewTargetSchema),
            Arc::new(CacheSubqueryResults),
            Arc::new(CacheSubqueryAliasesInJoins),
            Arc::new(SetJoinScopeLen),
        ]),
        Batch::new(VALIDATION, BatchPolicy::Once, [
            Arc::new(ValidateResolved) as Arc<dyn AnalyzerRule>,
        ]),
        Batch::new(AFTER_ALL, BatchPolicy::Once, [
            Arc::new(TrackProcess) as Arc<dyn AnalyzerRule>,
        ]),
    ]
}

#[derive(Debug)]
pub struct Analyzer {
    catalog: Arc<dyn Catalog>,
    config: AnalyzerConfig,
    batches: Vec<Batch>,
}

impl Analyzer {
    pub fn new(catalog: Arc<dyn Catalog>, config: AnalyzerConfig) -> Self {
        Self::with_batches(catalog, config, default_batches())
    }

    pub fn with_batches(
        catalog: Arc<dyn Catalog>,
        config: AnalyzerConfig,
        batches: Vec<Batch>,
    ) -> Self {
        Analyzer {
            catalog,
            config,
            batches,
        }
    }

    pub fn catalog(&self) -> &dyn Catalog {
        self.catalog.as_ref()
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Fully analyze a top level plan.
    pub fn analyze(&self, plan: LogicalOperator) -> Result<LogicalOperator> {
        self.analyze_with_context(&AnalysisContext::new(), plan)
    }

    /// Fully analyze a top level plan, stopping early if `ctx` is canceled.
    pub fn analyze_with_context(
        &self,
        ctx: &AnalysisContext,
        plan: LogicalOperator,
    ) -> Result<LogicalOperator> {
        let analyzed = self.analyze_with_selector(
            ctx,
            plan,
            &Scope::empty(),
            BatchSelector::All,
            &RuleSelector::all(),
        )?;
        Ok(analyzed.data)
    }

    /// Run the selected rules of the selected batches over a plan analyzed in
    /// `scope`.
    ///
    /// On failure the plan is returned as it was before the failing rule so
    /// callers can keep partial progress.
    pub fn analyze_with_selector(
        &self,
        ctx: &AnalysisContext,
        plan: LogicalOperator,
        scope: &Scope,
        batches: BatchSelector,
        selector: &RuleSelector,
    ) -> Result<Transformed<LogicalOperator>, PartialAnalysis> {
        trace!(
            depth = scope.depth(),
            scope = ?scope.inner_to_outer(),
            ?batches,
            "analyzing plan"
        );

        let mut plan = plan;
        let mut identity = TreeIdentity::SameTree;

        for batch in batches.select(&self.batches) {
            let transformed = batch.eval(self, ctx, plan, scope, selector)?;
            if transformed.is_new() {
                debug!(batch = batch.name, depth = scope.depth(), "batch changed plan");
            }
            identity = identity.and(transformed.identity);
            plan = transformed.data;
        }

        Ok(Transformed::new(plan, identity))
    }

    /// Run batches in order, stopping after the named batch.
    pub fn analyze_through_batch(
        &self,
        ctx: &AnalysisContext,
        plan: LogicalOperator,
        scope: &Scope,
        until: &'static str,
        selector: &RuleSelector,
    ) -> Result<Transformed<LogicalOperator>, PartialAnalysis> {
        self.analyze_with_selector(ctx, plan, scope, BatchSelector::Through(until), selector)
    }

    /// Run batches in order, starting at the named batch.
    pub fn analyze_starting_at_batch(
        &self,
        ctx: &AnalysisContext,
        plan: LogicalOperator,
        scope: &Scope,
        start: &'static str,
        selector: &RuleSelector,
    ) -> Result<Transformed<LogicalOperator>, PartialAnalysis> {
        self.analyze_with_selector(ctx, plan, scope, BatchSelector::StartingAt(start), selector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::MemoryCatalog;
    use crate::expr::scalar::DataType;
    use crate::expr::{col, eq, lit};
    use crate::logical::builder::PlanBuilder;

    fn analyzer() -> Analyzer {
        let catalog = MemoryCatalog::new();
        catalog.create_table("t1", [("a", DataType::Int64), ("b", DataType::Utf8)]);
        Analyzer::new(Arc::new(catalog), AnalyzerConfig::default())
    }

    #[test]
    fn batch_selection() {
        let batches = default_batches();
        let names = |sel: BatchSelector| -> Vec<&'static str> {
            sel.select(&batches).iter().map(|b| b.name).collect()
        };

        assert_eq!(
            vec![DEFAULT_RULES, ONCE_AFTER, VALIDATION, AFTER_ALL],
            names(BatchSelector::All)
        );
        assert_eq!(vec![DEFAULT_RULES], names(BatchSelector::Through(DEFAULT_RULES)));
        assert_eq!(
            vec![ONCE_AFTER, VALIDATION, AFTER_ALL],
            names(BatchSelector::StartingAt(ONCE_AFTER))
        );
        assert!(names(BatchSelector::StartingAt("missing")).is_empty());
    }

    #[test]
    fn analyze_simple_query() {
        let plan = PlanBuilder::unresolved_table("T1")
            .filter(eq(col("a"), lit(1)))
            .project([col("b")])
            .build();

        let analyzed = analyzer().analyze(plan).unwrap();
        assert!(analyzed.resolved());
        assert!(matches!(analyzed, LogicalOperator::QueryProcess(_)));
    }

    #[test]
    fn through_default_rules_skips_tracking() {
        let plan = PlanBuilder::unresolved_table("t1").build();
        let analyzed = analyzer()
            .analyze_through_batch(
                &AnalysisContext::new(),
                plan,
                &Scope::empty(),
                DEFAULT_RULES,
                &RuleSelector::all(),
            )
            .unwrap();

        assert_eq!(TreeIdentity::NewTree, analyzed.identity);
        assert!(matches!(analyzed.data, LogicalOperator::Scan(_)));
    }

    #[test]
    fn missing_table_is_fatal() {
        let plan = PlanBuilder::unresolved_table("nope").build();
        let err = analyzer().analyze(plan).unwrap_err();
        assert!(matches!(err, AnalyzerError::TableNotFound { .. }));
    }

    #[test]
    fn canceled_before_start() {
        let ctx = AnalysisContext::new();
        ctx.cancel();

        let plan = PlanBuilder::unresolved_table("t1").build();
        let err = analyzer().analyze_with_context(&ctx, plan).unwrap_err();
        assert!(matches!(err, AnalyzerError::Canceled));
    }
}
