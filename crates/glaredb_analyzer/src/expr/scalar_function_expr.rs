use std::fmt;

use super::Expression;
use super::scalar::DataType;

/// A call to a scalar function.
///
/// Function resolution happens outside of this crate, expressions arrive with
/// their return type and volatility already known.
#[derive(Debug, Clone, PartialEq)]
pub struct ScalarFunctionExpr {
    pub name: String,
    pub inputs: Vec<Expression>,
    pub return_type: DataType,
    /// If calling the function twice with the same inputs may produce
    /// different results (e.g. `random()`, `now()`).
    pub non_deterministic: bool,
}

impl fmt::Display for ScalarFunctionExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        for (idx, input) in self.inputs.iter().enumerate() {
            if idx > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{input}")?;
        }
        write!(f, ")")
    }
}
