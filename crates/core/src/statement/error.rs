//! Statement error types.

use chrono::NaiveDate;
use thiserror::Error;

use super::types::GenerationState;

/// Failure reported by a repository implementation.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct DataAccessError {
    /// Driver or store message.
    pub message: String,
}

impl DataAccessError {
    /// Creates a data access error.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Failure reported by a renderer.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct RenderError(pub String);

/// Errors that can occur while generating or reading a statement.
#[derive(Debug, Error)]
pub enum StatementError {
    // ========== Request Validation ==========
    /// Report type is missing.
    #[error("Report type is required")]
    MissingReportType,

    /// Owner is missing.
    #[error("Owner is required")]
    MissingOwner,

    /// Company is not a plain schema identifier.
    #[error("Invalid company schema: {0:?}")]
    InvalidCompany(String),

    /// Accounting book code is blank.
    #[error("Accounting book codes must not be blank")]
    BlankBook,

    /// Comparison date lies after the report date.
    #[error("Comparison date {comparison} is after report date {as_of}")]
    ComparisonAfterReportDate {
        /// Report date.
        as_of: NaiveDate,
        /// Requested comparison date.
        comparison: NaiveDate,
    },

    /// The comparison date cannot be represented.
    #[error("Cannot derive a comparison date from {0}")]
    ComparisonOutOfRange(NaiveDate),

    // ========== Reference Data ==========
    /// A classification points at a family without a position.
    #[error("Account {account} maps to family {family} which has no position in report type {report_type}")]
    UnresolvedFamily {
        /// Ledger account code.
        account: String,
        /// Family without position.
        family: String,
        /// Balance-sheet variant.
        report_type: String,
    },

    /// The same account is classified twice for one report type.
    #[error("Account {account} is classified more than once in report type {report_type}")]
    DuplicateClassification {
        /// Ledger account code.
        account: String,
        /// Balance-sheet variant.
        report_type: String,
    },

    // ========== Runtime ==========
    /// The ledger store failed during a stage.
    #[error("Data access failed while {stage}: {source}")]
    DataAccess {
        /// Stage that was running.
        stage: GenerationState,
        /// Underlying failure.
        #[source]
        source: DataAccessError,
    },

    /// The generation task ended without reporting a result.
    #[error("Statement generation aborted: {0}")]
    Aborted(String),

    /// The renderer failed.
    #[error("Rendering failed: {0}")]
    Render(#[from] RenderError),
}

impl StatementError {
    /// Wraps a repository failure with the stage it interrupted.
    #[must_use]
    pub fn data_access(stage: GenerationState, source: DataAccessError) -> Self {
        Self::DataAccess { stage, source }
    }

    /// Returns `true` for errors raised before the workspace is touched.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::MissingReportType
                | Self::MissingOwner
                | Self::InvalidCompany(_)
                | Self::BlankBook
                | Self::ComparisonAfterReportDate { .. }
                | Self::ComparisonOutOfRange(_)
        )
    }
}
