//! Error types for the factorstats library.
//!
//! Every failure is a variant of [`Error`]. Variants fall into three
//! categories (see [`ErrorCategory`]):
//!
//! - **Input** errors are fatal and abort the whole run.
//! - **Computation** errors are scoped to a single post-hoc group; the engine
//!   records them and carries on.
//! - **Persistence** errors surface while the report workbook is assembled or
//!   saved.

use thiserror::Error;

/// The main error type for the factorstats library.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // ============ Input Errors ============
    /// A named column does not exist in the table.
    #[error("column '{name}' not found in table")]
    MissingColumn {
        /// The requested column name.
        name: String,
    },

    /// A column exists but holds the wrong kind of data.
    #[error("column '{name}' is {actual}, expected {expected}")]
    ColumnType {
        /// The column name.
        name: String,
        /// The kind of column that was required.
        expected: &'static str,
        /// The kind of column that was found.
        actual: &'static str,
    },

    /// A column name appears twice in the same table.
    #[error("duplicate column '{0}'")]
    DuplicateColumn(String),

    /// At least one factor is required but none was given.
    #[error("at least one factor column is required")]
    NoFactors,

    /// The same factor was listed twice.
    #[error("factor '{0}' listed more than once")]
    DuplicateFactor(String),

    /// Columns of the same table have different lengths.
    #[error("column '{name}' has {actual} rows, expected {expected}")]
    LengthMismatch {
        /// The offending column.
        name: String,
        /// Row count of the table.
        expected: usize,
        /// Row count of the column.
        actual: usize,
    },

    /// A cell could not be parsed while loading a table.
    #[error("line {line}, column '{column}': cannot parse '{value}' as a number")]
    Parse {
        /// 1-based line number in the source file.
        line: usize,
        /// Column name.
        column: String,
        /// The raw cell contents.
        value: String,
    },

    /// Invalid parameters.
    #[error("invalid parameters: {message}")]
    InvalidParams {
        /// Description of what is invalid.
        message: String,
    },

    // ============ Computation Errors ============
    /// Fewer than two levels of the compared factor are present.
    #[error("factor '{factor}' has {levels} level(s) in this subset, need at least 2")]
    TooFewLevels {
        /// The factor whose levels are compared.
        factor: String,
        /// Number of distinct levels observed.
        levels: usize,
    },

    /// Not enough observations to estimate the error variance.
    #[error("{observations} observation(s) across {levels} level(s) leave no error degrees of freedom")]
    InsufficientDf {
        /// Number of observations.
        observations: usize,
        /// Number of levels.
        levels: usize,
    },

    /// All observations within every level are identical.
    #[error("zero within-group variance for '{dv}'")]
    ZeroVariance {
        /// Name of the dependent variable.
        dv: String,
    },

    /// The design cannot be analysed for another reason.
    #[error("degenerate design: {message}")]
    Degenerate {
        /// Description of the problem.
        message: String,
    },

    // ============ Persistence Errors ============
    /// Two sheets would end up with the same name.
    #[error("sheet name '{sheet}' is used by both '{first}' and '{second}'")]
    SheetNameCollision {
        /// The sanitized sheet name.
        sheet: String,
        /// Parameter that claimed the name first.
        first: String,
        /// Parameter that collided with it.
        second: String,
    },

    /// Writing or saving the workbook failed.
    #[error("cannot write report: {message}")]
    Persistence {
        /// Description of the failure.
        message: String,
    },
}

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Bad caller input; aborts the run.
    Input,
    /// A statistical test could not be computed for one group.
    Computation,
    /// The report could not be assembled or written.
    Persistence,
}

/// A specialized `Result` type for factorstats operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    /// Create a new `InvalidParams` error.
    #[must_use]
    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::InvalidParams {
            message: message.into(),
        }
    }

    /// Create a new `MissingColumn` error.
    #[must_use]
    pub fn missing_column(name: impl Into<String>) -> Self {
        Self::MissingColumn { name: name.into() }
    }

    /// Create a new `Degenerate` error.
    #[must_use]
    pub fn degenerate(message: impl Into<String>) -> Self {
        Self::Degenerate {
            message: message.into(),
        }
    }

    /// Create a new `Persistence` error.
    #[must_use]
    pub fn persistence(message: impl Into<String>) -> Self {
        Self::Persistence {
            message: message.into(),
        }
    }

    /// The category this error belongs to.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::MissingColumn { .. }
            | Self::ColumnType { .. }
            | Self::DuplicateColumn(_)
            | Self::NoFactors
            | Self::DuplicateFactor(_)
            | Self::LengthMismatch { .. }
            | Self::Parse { .. }
            | Self::InvalidParams { .. } => ErrorCategory::Input,
            Self::TooFewLevels { .. }
            | Self::InsufficientDf { .. }
            | Self::ZeroVariance { .. }
            | Self::Degenerate { .. } => ErrorCategory::Computation,
            Self::SheetNameCollision { .. } | Self::Persistence { .. } => {
                ErrorCategory::Persistence
            }
        }
    }

    /// Whether the engine may skip past this error and continue.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        self.category() == ErrorCategory::Computation
    }
}

impl From<rust_xlsxwriter::XlsxError> for Error {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        Self::persistence(err.to_string())
    }
}

impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
        Self::invalid_params(format!("csv: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::missing_column("Time");
        assert!(err.to_string().contains("Time"));
        assert!(err.to_string().contains("not found"));

        let err = Error::TooFewLevels {
            factor: "Group".into(),
            levels: 1,
        };
        assert!(err.to_string().contains("Group"));
        assert!(err.to_string().contains("1 level"));

        let err = Error::SheetNameCollision {
            sheet: "a_b_ANOVA".into(),
            first: "a/b".into(),
            second: "a_b".into(),
        };
        assert!(err.to_string().contains("a_b_ANOVA"));
        assert!(err.to_string().contains("a/b"));
    }

    #[test]
    fn test_error_categories() {
        assert_eq!(Error::NoFactors.category(), ErrorCategory::Input);
        assert_eq!(
            Error::missing_column("x").category(),
            ErrorCategory::Input
        );
        assert_eq!(
            Error::degenerate("singular").category(),
            ErrorCategory::Computation
        );
        assert_eq!(
            Error::persistence("disk full").category(),
            ErrorCategory::Persistence
        );

        assert!(Error::ZeroVariance { dv: "X".into() }.is_recoverable());
        assert!(!Error::NoFactors.is_recoverable());
    }

    #[test]
    fn test_error_equality() {
        let err1 = Error::DuplicateFactor("Time".into());
        let err2 = Error::DuplicateFactor("Time".into());
        let err3 = Error::DuplicateFactor("Group".into());

        assert_eq!(err1, err2);
        assert_ne!(err1, err3);
    }
}
