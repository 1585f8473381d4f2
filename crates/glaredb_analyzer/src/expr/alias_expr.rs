use std::fmt;

use super::Expression;

/// `<expr> AS <alias>` in a select list.
///
/// Aliases are visible to scalar subqueries written next to them (lateral
/// visibility), but not to derived tables.
#[derive(Debug, Clone, PartialEq)]
pub struct AliasExpr {
    pub expr: Box<Expression>,
    pub alias: String,
}

impl fmt::Display for AliasExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} AS {}", self.expr, self.alias)
    }
}
