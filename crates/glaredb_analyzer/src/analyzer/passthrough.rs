use crate::logical::operator::LogicalOperator;

/// Remove passthrough wrappers from the top of a plan.
///
/// Nested queries are executed as part of the query containing them, so
/// process tracking and transaction wrappers added while analyzing them on
/// their own are dropped.
pub fn strip_passthrough_nodes(mut plan: LogicalOperator) -> LogicalOperator {
    while plan.is_passthrough() && plan.children().len() == 1 {
        plan = match plan.take_children().pop() {
            Some(child) => child,
            None => break,
        };
    }
    plan
}
