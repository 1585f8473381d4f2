//! Read-only, top down walks over plans and expressions.

use crate::expr::Expression;
use crate::expr::subquery_expr::SubqueryExpr;
use crate::logical::operator::LogicalOperator;

/// Controls how a walk continues after visiting a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recursion {
    /// Continue into the node's children.
    Continue,
    /// Skip the node's children, continue with its siblings.
    Jump,
    /// Stop the walk.
    Stop,
}

/// Walk a plan top down.
///
/// Returns `Recursion::Stop` if the walk was stopped early.
pub fn inspect_plan<F>(plan: &LogicalOperator, f: &mut F) -> Recursion
where
    F: FnMut(&LogicalOperator) -> Recursion,
{
    match f(plan) {
        Recursion::Stop => return Recursion::Stop,
        Recursion::Jump => return Recursion::Continue,
        Recursion::Continue => (),
    }

    for child in plan.children() {
        if inspect_plan(child, f) == Recursion::Stop {
            return Recursion::Stop;
        }
    }

    Recursion::Continue
}

/// Walk an expression top down. Subquery plans are not entered.
pub fn inspect_expr<F>(expr: &Expression, f: &mut F) -> Recursion
where
    F: FnMut(&Expression) -> Recursion,
{
    match f(expr) {
        Recursion::Stop => return Recursion::Stop,
        Recursion::Jump => return Recursion::Continue,
        Recursion::Continue => (),
    }

    for child in expr.children() {
        if inspect_expr(child, f) == Recursion::Stop {
            return Recursion::Stop;
        }
    }

    Recursion::Continue
}

/// Walk every expression of every node in the plan.
pub fn inspect_plan_expressions<F>(plan: &LogicalOperator, f: &mut F) -> Recursion
where
    F: FnMut(&Expression) -> Recursion,
{
    inspect_plan(plan, &mut |node| {
        for expr in node.expressions().unwrap_or_default() {
            if inspect_expr(expr, &mut *f) == Recursion::Stop {
                return Recursion::Stop;
            }
        }
        Recursion::Continue
    })
}

/// Find the first node in the plan (top down) matching the predicate.
pub fn find_plan<'a, P>(plan: &'a LogicalOperator, pred: &mut P) -> Option<&'a LogicalOperator>
where
    P: FnMut(&LogicalOperator) -> bool,
{
    if pred(plan) {
        return Some(plan);
    }
    for child in plan.children() {
        if let Some(found) = find_plan(child, pred) {
            return Some(found);
        }
    }
    None
}

/// Collect the subquery expressions in an expression. Subqueries nested inside
/// those subqueries are not included.
pub fn subqueries_in_expr(expr: &Expression) -> Vec<&SubqueryExpr> {
    fn collect<'a>(expr: &'a Expression, out: &mut Vec<&'a SubqueryExpr>) {
        if let Expression::Subquery(subquery) = expr {
            out.push(subquery);
            return;
        }
        for child in expr.children() {
            collect(child, out);
        }
    }

    let mut out = Vec::new();
    collect(expr, &mut out);
    out
}

/// Collect all subquery expressions directly in the expressions of the plan.
/// Nested subqueries inside those subqueries are not included.
pub fn subqueries_in_plan(plan: &LogicalOperator) -> Vec<&SubqueryExpr> {
    fn walk<'a>(plan: &'a LogicalOperator, out: &mut Vec<&'a SubqueryExpr>) {
        for expr in plan.expressions().unwrap_or_default() {
            out.extend(subqueries_in_expr(expr));
        }
        for child in plan.children() {
            walk(child, out);
        }
    }

    let mut out = Vec::new();
    walk(plan, &mut out);
    out
}
