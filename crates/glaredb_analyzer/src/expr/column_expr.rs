use std::fmt;

use super::scalar::DataType;

/// Reference to a resolved column in the input row.
///
/// Rows seen by an operator are laid out as the columns of every enclosing
/// scope (outermost first) followed by the columns of the operator's children.
/// An index lower than the scope length is an outer reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnExpr {
    /// Position in the row.
    pub index: usize,
    /// Name of the table (or table alias) the column came from.
    pub table: String,
    pub name: String,
    pub datatype: DataType,
}

impl ColumnExpr {
    pub fn new(
        index: usize,
        table: impl Into<String>,
        name: impl Into<String>,
        datatype: DataType,
    ) -> Self {
        ColumnExpr {
            index,
            table: table.into(),
            name: name.into(),
            datatype,
        }
    }
}

impl fmt::Display for ColumnExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.table.is_empty() {
            write!(f, "{}#{}", self.name, self.index)
        } else {
            write!(f, "{}.{}#{}", self.table, self.name, self.index)
        }
    }
}

/// Column reference as written by the user, not yet bound to a position.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UnresolvedColumnExpr {
    /// Optional table qualifier.
    pub table: Option<String>,
    pub name: String,
}

impl UnresolvedColumnExpr {
    /// Check if a column with the given name from the given table satisfies
    /// this reference.
    pub fn matches(&self, table: &str, name: &str) -> bool {
        if !self.name.eq_ignore_ascii_case(name) {
            return false;
        }
        match &self.table {
            Some(qualifier) => qualifier.eq_ignore_ascii_case(table),
            None => true,
        }
    }
}

impl fmt::Display for UnresolvedColumnExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.table {
            Some(table) => write!(f, "{table}.{}", self.name),
            None => write!(f, "{}", self.name),
        }
    }
}
