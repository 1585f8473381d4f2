use std::fmt;
use std::sync::Arc;

use tracing::{debug, debug_span, trace, warn};

use super::rule::{AnalyzerRule, RuleSelector};
use super::scope::Scope;
use super::{Analyzer, PartialAnalysis};
use crate::context::AnalysisContext;
use crate::errors::AnalyzerError;
use crate::explain::node::ExplainNode;
use crate::logical::operator::LogicalOperator;
use crate::transform::{Transformed, TreeIdentity};

/// How many times a batch runs its rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchPolicy {
    /// Run every rule a single time.
    Once,
    /// Run the rules repeatedly until the plan stops changing, bounded by the
    /// configured max iterations.
    Fixpoint,
}

/// An ordered group of rules run together.
#[derive(Debug, Clone)]
pub struct Batch {
    pub name: &'static str,
    pub policy: BatchPolicy,
    pub rules: Vec<Arc<dyn AnalyzerRule>>,
}

impl fmt::Display for Batch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rules: Vec<_> = self.rules.iter().map(|r| r.id().name()).collect();
        write!(f, "{} ({:?}): {}", self.name, self.policy, rules.join(", "))
    }
}

impl Batch {
    pub fn new(
        name: &'static str,
        policy: BatchPolicy,
        rules: impl IntoIterator<Item = Arc<dyn AnalyzerRule>>,
    ) -> Self {
        Batch {
            name,
            policy,
            rules: rules.into_iter().collect(),
        }
    }

    /// Run this batch over a plan.
    ///
    /// A pass counts as a change only if some rule reported a new tree and the
    /// plan is structurally different from the start of the pass. A fixpoint
    /// batch that's still changing after the max number of passes fails.
    pub fn eval(
        &self,
        analyzer: &Analyzer,
        ctx: &AnalysisContext,
        plan: LogicalOperator,
        scope: &Scope,
        selector: &RuleSelector,
    ) -> Result<Transformed<LogicalOperator>, PartialAnalysis> {
        let max_iterations = match self.policy {
            BatchPolicy::Once => 1,
            BatchPolicy::Fixpoint => analyzer.config().max_iterations,
        };

        let mut plan = plan;
        let mut identity = TreeIdentity::SameTree;

        for iteration in 0..max_iterations {
            let pass = self.eval_once(analyzer, ctx, plan, scope, selector)?;
            let changed =
                pass.identity.is_new() && pass.start.is_some_and(|start| start != pass.plan);
            plan = pass.plan;

            trace!(batch = self.name, iteration, changed, "batch pass");
            if !changed {
                return Ok(Transformed::new(plan, identity));
            }
            identity = TreeIdentity::NewTree;

            if self.policy == BatchPolicy::Once {
                return Ok(Transformed::new(plan, identity));
            }
        }

        warn!(batch = self.name, max_iterations, "batch did not converge");
        Err(PartialAnalysis {
            plan,
            error: AnalyzerError::MaxIterations {
                batch: self.name,
                iterations: max_iterations,
            },
        })
    }

    /// Run every selected rule once, in order.
    ///
    /// The plan as it was before each rule is kept as the partial result if
    /// that rule fails. The copy taken before the first rule doubles as the
    /// start of the pass.
    fn eval_once(
        &self,
        analyzer: &Analyzer,
        ctx: &AnalysisContext,
        mut plan: LogicalOperator,
        scope: &Scope,
        selector: &RuleSelector,
    ) -> Result<Pass, PartialAnalysis> {
        let mut identity = TreeIdentity::SameTree;
        let mut start = None;

        for rule in &self.rules {
            let id = rule.id();
            if !selector.selects(id) {
                continue;
            }
            if let Err(error) = ctx.check_canceled() {
                return Err(PartialAnalysis { plan, error });
            }

            let _span = debug_span!("rule", name = id.name(), depth = scope.depth()).entered();

            let before = plan.clone();
            let transformed = match rule.apply(analyzer, ctx, plan, scope, selector) {
                Ok(transformed) => transformed,
                Err(error) => {
                    debug!(%error, "rule failed");
                    return Err(PartialAnalysis {
                        plan: before,
                        error,
                    });
                }
            };
            if start.is_none() {
                start = Some(before);
            }

            if transformed.is_new() && analyzer.config().log_plan_changes {
                let explain = ExplainNode::new_from_logical_plan(true, &transformed.data);
                debug!(plan = %explain, "rule changed plan");
            }

            identity = identity.and(transformed.identity);
            plan = transformed.data;
        }

        Ok(Pass {
            plan,
            identity,
            start,
        })
    }
}

/// Outcome of a single pass over a batch's rules.
struct Pass {
    plan: LogicalOperator,
    identity: TreeIdentity,
    /// Plan before the first selected rule ran, `None` if no rule ran.
    start: Option<LogicalOperator>,
}
