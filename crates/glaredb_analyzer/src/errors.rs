#[derive(Debug, thiserror::Error)]
pub enum AnalyzerError {
    #[error("plan is not resolved because of node {node}")]
    Unresolved { node: String },

    #[error("table \"{table}\" does not have column \"{column}\"")]
    TableColumnNotFound { table: String, column: String },

    #[error("column \"{column}\" could not be found in any table in scope")]
    ColumnNotFound { column: String },

    #[error("table not found: {table}")]
    TableNotFound { table: String },

    #[error(
        "column count mismatch for \"{alias}\": {declared} column names declared, subquery produces {produced}"
    )]
    ColumnCountMismatch {
        alias: String,
        declared: usize,
        produced: usize,
    },

    #[error("exceeded max analysis iterations ({iterations}) for batch \"{batch}\"")]
    MaxIterations {
        batch: &'static str,
        iterations: usize,
    },

    #[error("unsupported: {0}")]
    Unsupported(String),

    #[error("analysis canceled")]
    Canceled,

    #[error("unknown setting: {0}")]
    UnknownSetting(String),

    #[error("invalid value for setting \"{name}\": {reason}")]
    InvalidSetting { name: &'static str, reason: String },

    #[error(transparent)]
    Config(#[from] serde_json::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AnalyzerError {
    /// Errors that may go away once more of the plan is resolved.
    ///
    /// Tentative subquery analysis keeps its partial progress when it hits one
    /// of these and tries again on the next pass.
    pub fn is_deferrable(&self) -> bool {
        matches!(
            self,
            Self::Unresolved { .. } | Self::TableColumnNotFound { .. } | Self::ColumnNotFound { .. }
        )
    }
}

pub type Result<T, E = AnalyzerError> = std::result::Result<T, E>;

macro_rules! internal {
    ($($arg:tt)*) => {
        crate::errors::AnalyzerError::Internal(std::format!($($arg)*))
    };
}
pub(crate) use internal;
