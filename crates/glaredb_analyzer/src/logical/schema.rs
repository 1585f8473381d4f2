use std::fmt;

use serde::{Deserialize, Serialize};

use crate::expr::scalar::DataType;

/// A single output column of an operator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnSchema {
    pub name: String,
    /// Table or alias the column is qualified by, empty if none.
    pub source: String,
    pub datatype: DataType,
}

impl ColumnSchema {
    pub fn new(name: impl Into<String>, source: impl Into<String>, datatype: DataType) -> Self {
        ColumnSchema {
            name: name.into(),
            source: source.into(),
            datatype,
        }
    }
}

impl fmt::Display for ColumnSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.source.is_empty() {
            write!(f, "{} {}", self.name, self.datatype)
        } else {
            write!(f, "{}.{} {}", self.source, self.name, self.datatype)
        }
    }
}

/// Column contributed to a scope by an enclosing node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeColumn {
    pub column: ColumnSchema,
    /// Column is an expression alias defined by the node rather than a column
    /// produced by one of its inputs.
    pub is_alias: bool,
}
