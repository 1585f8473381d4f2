pub mod alias_expr;
pub mod column_expr;
pub mod comparison_expr;
pub mod conjunction_expr;
pub mod literal_expr;
pub mod scalar;
pub mod scalar_function_expr;
pub mod subquery_expr;

use std::fmt;

use alias_expr::AliasExpr;
use column_expr::{ColumnExpr, UnresolvedColumnExpr};
use comparison_expr::{ComparisonExpr, ComparisonOperator};
use conjunction_expr::{ConjunctionExpr, ConjunctionOperator};
use literal_expr::LiteralExpr;
use scalar::{DataType, ScalarValue};
use scalar_function_expr::ScalarFunctionExpr;
use subquery_expr::SubqueryExpr;

use crate::logical::operator::LogicalOperator;

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Literal(LiteralExpr),
    UnresolvedColumn(UnresolvedColumnExpr),
    Column(ColumnExpr),
    Alias(AliasExpr),
    Comparison(ComparisonExpr),
    Conjunction(ConjunctionExpr),
    ScalarFunction(ScalarFunctionExpr),
    Subquery(SubqueryExpr),
}

impl Expression {
    /// If this expression and everything under it is bound.
    ///
    /// Subqueries are resolved once their entire inner plan is resolved.
    pub fn resolved(&self) -> bool {
        match self {
            Self::UnresolvedColumn(_) => false,
            Self::Subquery(subquery) => subquery.resolved(),
            other => other.children().into_iter().all(|child| child.resolved()),
        }
    }

    /// If this expression by itself may produce different results across
    /// evaluations. Children are not checked.
    pub fn is_non_deterministic(&self) -> bool {
        match self {
            Self::ScalarFunction(func) => func.non_deterministic,
            _ => false,
        }
    }

    pub fn datatype(&self) -> DataType {
        match self {
            Self::Literal(lit) => lit.literal.datatype(),
            Self::UnresolvedColumn(_) => DataType::Null,
            Self::Column(col) => col.datatype,
            Self::Alias(alias) => alias.expr.datatype(),
            Self::Comparison(_) | Self::Conjunction(_) => DataType::Boolean,
            Self::ScalarFunction(func) => func.return_type,
            Self::Subquery(subquery) => subquery
                .query
                .schema()
                .first()
                .map(|col| col.datatype)
                .unwrap_or(DataType::Null),
        }
    }

    /// Name of the column this expression produces when used in a select list.
    pub fn output_name(&self) -> String {
        match self {
            Self::Alias(alias) => alias.alias.clone(),
            Self::Column(col) => col.name.clone(),
            Self::UnresolvedColumn(col) => col.name.clone(),
            other => other.to_string(),
        }
    }

    /// Table the output column of this expression originates from, empty if
    /// it doesn't come directly from a table.
    pub fn output_source(&self) -> String {
        match self {
            Self::Column(col) => col.table.clone(),
            Self::UnresolvedColumn(col) => col.table.clone().unwrap_or_default(),
            _ => String::new(),
        }
    }

    /// Direct children of this expression.
    ///
    /// The plan inside a subquery is not an expression child.
    pub fn children(&self) -> Vec<&Expression> {
        match self {
            Self::Literal(_) | Self::UnresolvedColumn(_) | Self::Column(_) | Self::Subquery(_) => {
                Vec::new()
            }
            Self::Alias(alias) => vec![alias.expr.as_ref()],
            Self::Comparison(cmp) => vec![cmp.left.as_ref(), cmp.right.as_ref()],
            Self::Conjunction(conj) => conj.expressions.iter().collect(),
            Self::ScalarFunction(func) => func.inputs.iter().collect(),
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(expr) => write!(f, "{expr}"),
            Self::UnresolvedColumn(expr) => write!(f, "{expr}"),
            Self::Column(expr) => write!(f, "{expr}"),
            Self::Alias(expr) => write!(f, "{expr}"),
            Self::Comparison(expr) => write!(f, "{expr}"),
            Self::Conjunction(expr) => write!(f, "{expr}"),
            Self::ScalarFunction(expr) => write!(f, "{expr}"),
            Self::Subquery(expr) => write!(f, "{expr}"),
        }
    }
}

pub fn lit(literal: impl Into<ScalarValue>) -> Expression {
    Expression::Literal(LiteralExpr {
        literal: literal.into(),
    })
}

/// Unqualified column reference.
pub fn col(name: impl Into<String>) -> Expression {
    Expression::UnresolvedColumn(UnresolvedColumnExpr {
        table: None,
        name: name.into(),
    })
}

/// Table qualified column reference.
pub fn qualified_col(table: impl Into<String>, name: impl Into<String>) -> Expression {
    Expression::UnresolvedColumn(UnresolvedColumnExpr {
        table: Some(table.into()),
        name: name.into(),
    })
}

/// Column already bound to a position in the row.
pub fn column(
    index: usize,
    table: impl Into<String>,
    name: impl Into<String>,
    datatype: DataType,
) -> Expression {
    Expression::Column(ColumnExpr::new(index, table, name, datatype))
}

pub fn alias(expr: Expression, alias: impl Into<String>) -> Expression {
    Expression::Alias(AliasExpr {
        expr: Box::new(expr),
        alias: alias.into(),
    })
}

pub fn compare(op: ComparisonOperator, left: Expression, right: Expression) -> Expression {
    Expression::Comparison(ComparisonExpr {
        left: Box::new(left),
        right: Box::new(right),
        op,
    })
}

pub fn eq(left: Expression, right: Expression) -> Expression {
    compare(ComparisonOperator::Eq, left, right)
}

pub fn and(exprs: impl IntoIterator<Item = Expression>) -> Expression {
    Expression::Conjunction(ConjunctionExpr {
        op: ConjunctionOperator::And,
        expressions: exprs.into_iter().collect(),
    })
}

pub fn or(exprs: impl IntoIterator<Item = Expression>) -> Expression {
    Expression::Conjunction(ConjunctionExpr {
        op: ConjunctionOperator::Or,
        expressions: exprs.into_iter().collect(),
    })
}

pub fn scalar_function(
    name: impl Into<String>,
    inputs: impl IntoIterator<Item = Expression>,
    return_type: DataType,
) -> Expression {
    Expression::ScalarFunction(ScalarFunctionExpr {
        name: name.into(),
        inputs: inputs.into_iter().collect(),
        return_type,
        non_deterministic: false,
    })
}

/// Function call whose result may change between evaluations.
pub fn volatile_function(
    name: impl Into<String>,
    inputs: impl IntoIterator<Item = Expression>,
    return_type: DataType,
) -> Expression {
    Expression::ScalarFunction(ScalarFunctionExpr {
        name: name.into(),
        inputs: inputs.into_iter().collect(),
        return_type,
        non_deterministic: true,
    })
}

pub fn subquery(query: LogicalOperator) -> Expression {
    Expression::Subquery(SubqueryExpr::new(query))
}
