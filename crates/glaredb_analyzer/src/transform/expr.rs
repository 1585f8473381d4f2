use super::{Transformed, TreeNode, map_list};
use crate::errors::Result;
use crate::expr::Expression;
use crate::expr::alias_expr::AliasExpr;
use crate::expr::comparison_expr::ComparisonExpr;
use crate::expr::conjunction_expr::ConjunctionExpr;

impl TreeNode for Expression {
    fn map_children<F>(self, mut f: F) -> Result<Transformed<Self>>
    where
        F: FnMut(Self) -> Result<Transformed<Self>>,
    {
        Ok(match self {
            leaf @ (Expression::Literal(_)
            | Expression::UnresolvedColumn(_)
            | Expression::Column(_)
            | Expression::Subquery(_)) => Transformed::same(leaf),
            Expression::Alias(AliasExpr { expr, alias }) => f(*expr)?.map_data(|expr| {
                Expression::Alias(AliasExpr {
                    expr: Box::new(expr),
                    alias,
                })
            }),
            Expression::Comparison(ComparisonExpr { left, right, op }) => {
                let left = f(*left)?;
                let right = f(*right)?;
                let identity = left.identity.and(right.identity);
                Transformed::new(
                    Expression::Comparison(ComparisonExpr {
                        left: Box::new(left.data),
                        right: Box::new(right.data),
                        op,
                    }),
                    identity,
                )
            }
            Expression::Conjunction(ConjunctionExpr { op, expressions }) => {
                map_list(expressions, &mut f)?
                    .map_data(|expressions| {
                        Expression::Conjunction(ConjunctionExpr { op, expressions })
                    })
            }
            Expression::ScalarFunction(mut func) => {
                let inputs = std::mem::take(&mut func.inputs);
                map_list(inputs, &mut f)?.map_data(|inputs| {
                    func.inputs = inputs;
                    Expression::ScalarFunction(func)
                })
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::scalar::DataType;
    use crate::expr::{and, col, column, eq, lit, scalar_function};
    use crate::transform::{TreeIdentity, transform_up};

    #[test]
    fn no_change_is_same_tree() {
        let expr = and([eq(col("a"), lit(1)), scalar_function("abs", [col("b")], DataType::Int64)]);
        let expected = expr.clone();

        let got = transform_up(expr, &mut |e| Ok(Transformed::same(e))).unwrap();
        assert_eq!(TreeIdentity::SameTree, got.identity);
        assert_eq!(expected, got.data);
    }

    #[test]
    fn leaf_change_propagates_to_root() {
        let expr = and([eq(col("a"), lit(1)), eq(lit(2), lit(3))]);

        let mut visited = Vec::new();
        let got = transform_up(expr, &mut |e| {
            visited.push(e.to_string());
            match e {
                Expression::UnresolvedColumn(c) if c.name == "a" => Ok(Transformed::new_tree(
                    column(0, "t1", "a", DataType::Int64),
                )),
                other => Ok(Transformed::same(other)),
            }
        })
        .unwrap();

        assert_eq!(TreeIdentity::NewTree, got.identity);
        assert_eq!(
            and([eq(column(0, "t1", "a", DataType::Int64), lit(1)), eq(lit(2), lit(3))]),
            got.data
        );
        // Children before parents.
        assert_eq!("a", visited[0]);
        assert_eq!("(t1.a#0 = 1) AND (2 = 3)", visited.last().unwrap());
    }
}
