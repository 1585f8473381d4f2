use super::{Transformed, TreeIdentity, TreeNode, map_list, transform_up};
use crate::errors::Result;
use crate::expr::Expression;
use crate::logical::operator::LogicalOperator;

impl TreeNode for LogicalOperator {
    fn map_children<F>(mut self, f: F) -> Result<Transformed<Self>>
    where
        F: FnMut(Self) -> Result<Transformed<Self>>,
    {
        if self.children().is_empty() {
            return Ok(Transformed::same(self));
        }

        let children = map_list(self.take_children(), f)?;
        let identity = children.identity;

        Ok(Transformed::new(
            self.with_new_children(children.data)?,
            identity,
        ))
    }
}

/// Context provided to the rewrite function of a context aware transform.
#[derive(Debug, Clone, Copy)]
pub struct TransformContext<'a> {
    /// Parent of the node being rewritten, None for the root.
    ///
    /// The slot of the node currently being rewritten holds an invalid
    /// placeholder while the rewrite is in progress. Siblings are intact.
    pub parent: Option<&'a LogicalOperator>,
    /// Position of the node among its parent's children.
    pub child_index: Option<usize>,
}

impl TransformContext<'static> {
    pub const ROOT: Self = TransformContext {
        parent: None,
        child_index: None,
    };
}

/// Context provided to the selector before descending into a child.
#[derive(Debug, Clone, Copy)]
pub struct SelectorContext<'a> {
    pub node: &'a LogicalOperator,
    pub parent: &'a LogicalOperator,
    pub child_index: usize,
}

/// Rewrite a plan bottom up, giving the rewrite function access to the parent
/// of the node and the node's position under that parent.
///
/// `selector` is consulted before descending into each child. Returning false
/// skips the entire subtree rooted at that child, neither the child nor
/// anything below it is handed to `f`. The root is always visited.
pub fn transform_with_context<S, F>(
    plan: LogicalOperator,
    selector: &mut S,
    f: &mut F,
) -> Result<Transformed<LogicalOperator>>
where
    S: FnMut(&SelectorContext) -> bool,
    F: FnMut(TransformContext, LogicalOperator) -> Result<Transformed<LogicalOperator>>,
{
    transform_with_context_inner(plan, TransformContext::ROOT, selector, f)
}

fn transform_with_context_inner<S, F>(
    mut node: LogicalOperator,
    context: TransformContext,
    selector: &mut S,
    f: &mut F,
) -> Result<Transformed<LogicalOperator>>
where
    S: FnMut(&SelectorContext) -> bool,
    F: FnMut(TransformContext, LogicalOperator) -> Result<Transformed<LogicalOperator>>,
{
    let mut identity = TreeIdentity::SameTree;

    for idx in 0..node.children().len() {
        let descend = selector(&SelectorContext {
            node: &node.children()[idx],
            parent: &node,
            child_index: idx,
        });
        if !descend {
            continue;
        }

        let child = node.children_mut()[idx].take();
        let child_context = TransformContext {
            parent: Some(&node),
            child_index: Some(idx),
        };
        let transformed = transform_with_context_inner(child, child_context, selector, f)?;
        identity = identity.and(transformed.identity);
        node.children_mut()[idx] = transformed.data;
    }

    Ok(f(context, node)?.with_identity(identity))
}

/// Rewrite each expression of a single node with `f`.
///
/// Expressions are rewritten independently. If any changed, the node is
/// rebuilt once with the full list of new expressions, otherwise the original
/// node is returned. Nodes without expressions are returned as is.
///
/// `f` is given the (unmodified) node owning the expression.
pub fn transform_node_expressions<F>(
    node: LogicalOperator,
    mut f: F,
) -> Result<Transformed<LogicalOperator>>
where
    F: FnMut(&LogicalOperator, Expression) -> Result<Transformed<Expression>>,
{
    let exprs: Vec<Expression> = match node.expressions() {
        Some(exprs) if !exprs.is_empty() => exprs.into_iter().cloned().collect(),
        _ => return Ok(Transformed::same(node)),
    };

    let transformed = map_list(exprs, |expr| f(&node, expr))?;
    if transformed.identity.is_same() {
        return Ok(Transformed::same(node));
    }

    Ok(Transformed::new_tree(node.with_expressions(transformed.data)?))
}

/// Same as `transform_node_expressions` but walks each expression bottom up.
pub fn transform_node_expressions_up<F>(
    node: LogicalOperator,
    f: &mut F,
) -> Result<Transformed<LogicalOperator>>
where
    F: FnMut(&LogicalOperator, Expression) -> Result<Transformed<Expression>>,
{
    transform_node_expressions(node, |node, expr| {
        transform_up(expr, &mut |expr| f(node, expr))
    })
}

/// Rewrite every expression in every node of the plan, bottom up. `f` is
/// given the node owning the expression.
pub fn transform_plan_expressions<F>(
    plan: LogicalOperator,
    f: &mut F,
) -> Result<Transformed<LogicalOperator>>
where
    F: FnMut(&LogicalOperator, Expression) -> Result<Transformed<Expression>>,
{
    transform_up(plan, &mut |node| transform_node_expressions_up(node, f))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::scalar::DataType;
    use crate::expr::{col, column, eq, lit};
    use crate::logical::builder::PlanBuilder;
    use crate::logical::logical_join::JoinType;

    fn two_way_join() -> LogicalOperator {
        let left = PlanBuilder::scan("t1", [("a", DataType::Int64)])
            .filter(eq(col("a"), lit(1)))
            .build();
        let right = PlanBuilder::scan("t2", [("b", DataType::Int64)]).build();
        PlanBuilder::from(left)
            .join(right, JoinType::Inner, Some(eq(col("a"), col("b"))))
            .project([col("a")])
            .build()
    }

    #[test]
    fn identity_stability() {
        let plan = two_way_join();
        let expected = plan.clone();

        let got = transform_up(plan, &mut |n| Ok(Transformed::same(n))).unwrap();
        assert_eq!(TreeIdentity::SameTree, got.identity);
        assert_eq!(expected, got.data);

        let got = transform_with_context(got.data, &mut |_| true, &mut |_, n| {
            Ok(Transformed::same(n))
        })
        .unwrap();
        assert_eq!(TreeIdentity::SameTree, got.identity);
        assert_eq!(expected, got.data);
    }

    #[test]
    fn change_propagates_to_every_ancestor() {
        let plan = two_way_join();

        // Rewrite only the right scan, record identities reported for each
        // node on the way up.
        let mut seen = Vec::new();
        let got = transform_up(plan, &mut |node| {
            let out = match node {
                LogicalOperator::Scan(mut scan) if scan.node.table == "t2" => {
                    scan.node.table = "t3".to_string();
                    Transformed::new_tree(LogicalOperator::Scan(scan))
                }
                other => Transformed::same(other),
            };
            seen.push((out.data.name(), out.identity));
            Ok(out)
        })
        .unwrap();

        assert_eq!(TreeIdentity::NewTree, got.identity);
        // The rewrite function itself only reported a change for the scan, but
        // the join and project above it are new trees too.
        assert_eq!(
            vec![
                ("Scan", TreeIdentity::SameTree),
                ("Filter", TreeIdentity::SameTree),
                ("Scan", TreeIdentity::NewTree),
                ("Join", TreeIdentity::SameTree),
                ("Project", TreeIdentity::SameTree),
            ],
            seen
        );
    }

    #[test]
    fn selector_prunes_subtree() {
        let plan = two_way_join();

        let mut visited = Vec::new();
        transform_with_context(
            plan,
            &mut |ctx| !matches!(ctx.parent, LogicalOperator::Join(_)) || ctx.child_index == 0,
            &mut |ctx, node| {
                visited.push((node.name(), ctx.child_index));
                Ok(Transformed::same(node))
            },
        )
        .unwrap();

        assert_eq!(
            vec![
                ("Scan", Some(0)),
                ("Filter", Some(0)),
                ("Join", Some(0)),
                ("Project", None),
            ],
            visited
        );
    }

    #[test]
    fn context_has_parent() {
        let plan = two_way_join();

        let mut parents = Vec::new();
        transform_with_context(plan, &mut |_| true, &mut |ctx, node| {
            parents.push((node.name(), ctx.parent.map(|p| p.name())));
            Ok(Transformed::same(node))
        })
        .unwrap();

        assert!(parents.contains(&("Filter", Some("Join"))));
        assert!(parents.contains(&("Scan", Some("Filter"))));
        assert!(parents.contains(&("Project", None)));
    }

    #[test]
    fn node_expressions_rebuilt_once() {
        let plan = PlanBuilder::scan("t1", [("a", DataType::Int64), ("b", DataType::Int64)])
            .project([col("a"), col("b"), lit(1)])
            .build();

        let got = transform_node_expressions(plan, |_, expr| match expr {
            Expression::UnresolvedColumn(c) if c.name == "b" => {
                Ok(Transformed::new_tree(column(1, "t1", "b", DataType::Int64)))
            }
            other => Ok(Transformed::same(other)),
        })
        .unwrap();

        assert_eq!(TreeIdentity::NewTree, got.identity);
        let exprs: Vec<_> = got.data.expressions().unwrap().into_iter().cloned().collect();
        assert_eq!(
            vec![col("a"), column(1, "t1", "b", DataType::Int64), lit(1)],
            exprs
        );
    }

    #[test]
    fn node_without_expressions_untouched() {
        let plan = PlanBuilder::scan("t1", [("a", DataType::Int64)]).build();
        let got = transform_node_expressions(plan.clone(), |_, _| {
            panic!("scan has no expressions")
        })
        .unwrap();
        assert_eq!(TreeIdentity::SameTree, got.identity);
        assert_eq!(plan, got.data);
    }
}
